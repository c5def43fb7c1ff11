//! Pointer Visibility Controller: hides the pointer after an idle delay
//! while it rests over an active player, restores it on motion, leave, or
//! pause. One binding per discovered player node, each with its own hide
//! timer; every visibility-forcing event cancels the pending timer so the
//! cursor can never end up stuck hidden.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use kuchiki::{NodeRef, Selectors};
use tokio::time::Duration;

use crate::config::CursorConfig;
use crate::page::{EventKind, HostPage, PageError};
use crate::schedule::{after, Delayed};
use crate::style::compile_selectors;
use crate::watch::watch;

/// Marker attribute guarding against double-binding on rediscovery.
/// Attribute writes do not feed the mutation channel, so marking a player
/// cannot retrigger discovery.
const BOUND_MARKER: &str = "data-cursor-bound";

struct PlayerBinding {
    node: NodeRef,
    active: Cell<bool>,
    hide_timer: RefCell<Option<Delayed>>,
    // Bumped on every schedule and on every visibility-forcing event, so a
    // delayed hide that already lost its slot stands down instead of
    // stealing the handle a rearm just installed.
    hide_generation: Cell<u64>,
}

pub struct PointerCursorController {
    page: Rc<HostPage>,
    selectors: Vec<Selectors>,
    hide_delay: Duration,
}

impl PointerCursorController {
    pub fn new(page: Rc<HostPage>, config: &CursorConfig) -> Result<Self, PageError> {
        let selectors = config
            .player_selectors
            .iter()
            .map(|pattern| compile_selectors(pattern))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            page,
            selectors,
            hide_delay: config.hide_delay(),
        })
    }

    pub fn start(self: &Rc<Self>) {
        self.discover();
        let this = Rc::clone(self);
        watch(&self.page, move || this.discover());
        tracing::debug!(target: "matinee", "pointer cursor controller started");
    }

    fn discover(&self) {
        for selectors in &self.selectors {
            let Some(player) = self.page.query_first(selectors) else {
                continue;
            };
            if self.page.has_attribute(&player, BOUND_MARKER) {
                continue;
            }
            self.bind(player);
        }
    }

    fn bind(&self, player: NodeRef) {
        let binding = Rc::new(PlayerBinding {
            node: player.clone(),
            active: Cell::new(false),
            hide_timer: RefCell::new(None),
            hide_generation: Cell::new(0),
        });
        let page = Rc::downgrade(&self.page);
        let delay = self.hide_delay;

        {
            let b = Rc::clone(&binding);
            let page = page.clone();
            self.page.add_event_listener(
                &player,
                EventKind::MouseEnter,
                Rc::new(move || {
                    b.active.set(true);
                    if let Some(page) = page.upgrade() {
                        schedule_hide(&page, &b, delay);
                    }
                }),
            );
        }
        {
            let b = Rc::clone(&binding);
            let page = page.clone();
            self.page.add_event_listener(
                &player,
                EventKind::MouseMove,
                Rc::new(move || {
                    if !b.active.get() {
                        return;
                    }
                    if let Some(page) = page.upgrade() {
                        show_cursor(&page, &b);
                        schedule_hide(&page, &b, delay);
                    }
                }),
            );
        }
        {
            let b = Rc::clone(&binding);
            let page = page.clone();
            self.page.add_event_listener(
                &player,
                EventKind::MouseLeave,
                Rc::new(move || {
                    b.active.set(false);
                    if let Some(page) = page.upgrade() {
                        show_cursor(&page, &b);
                    }
                }),
            );
        }
        // Pause forces the cursor visible independent of the active flag;
        // the next motion rearms idle hiding as usual.
        if let Ok(video) = player.select_first("video") {
            let b = Rc::clone(&binding);
            let page = page.clone();
            self.page.add_event_listener(
                video.as_node(),
                EventKind::Pause,
                Rc::new(move || {
                    if let Some(page) = page.upgrade() {
                        show_cursor(&page, &b);
                    }
                }),
            );
        }

        self.page.set_attribute(&player, BOUND_MARKER, "true");
        tracing::debug!(target: "matinee", "player bound for cursor management");
    }
}

/// Cancel-and-reschedule: at most one pending hide per binding. The delayed
/// action re-checks the active flag and the node's attachment before acting.
fn schedule_hide(page: &Rc<HostPage>, binding: &Rc<PlayerBinding>, delay: Duration) {
    if let Some(previous) = binding.hide_timer.borrow_mut().take() {
        previous.cancel();
    }
    let generation = binding.hide_generation.get().wrapping_add(1);
    binding.hide_generation.set(generation);
    let b = Rc::clone(binding);
    let page = Rc::downgrade(page);
    let handle = after(delay, move || {
        if b.hide_generation.get() != generation {
            return;
        }
        b.hide_timer.borrow_mut().take();
        let Some(page) = page.upgrade() else {
            return;
        };
        if b.active.get() && page.is_attached(&b.node) {
            page.set_inline_style(&b.node, "cursor", "none");
            tracing::debug!(target: "matinee", "cursor hidden after idle delay");
        }
    });
    *binding.hide_timer.borrow_mut() = Some(handle);
}

fn show_cursor(page: &Rc<HostPage>, binding: &Rc<PlayerBinding>) {
    binding
        .hide_generation
        .set(binding.hide_generation.get().wrapping_add(1));
    if let Some(pending) = binding.hide_timer.borrow_mut().take() {
        pending.cancel();
    }
    page.set_inline_style(&binding.node, "cursor", "default");
}
