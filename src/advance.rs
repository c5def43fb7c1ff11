//! Auto-Advance Trigger: when a visible "next item" control appears, invoke
//! it after a fixed grace delay so the viewer keeps a cancel window. The
//! timer re-verifies attachment at fire time; a control removed in the
//! meantime means the viewer cancelled and the action silently stands down.

use std::rc::Rc;

use kuchiki::Selectors;
use tokio::time::Duration;

use crate::config::AutoAdvanceConfig;
use crate::page::{HostPage, PageError};
use crate::schedule::after;
use crate::style::compile_selectors;
use crate::watch::watch;

pub struct AutoAdvanceTrigger {
    page: Rc<HostPage>,
    selectors: Vec<Selectors>,
    grace: Duration,
}

impl AutoAdvanceTrigger {
    pub fn new(page: Rc<HostPage>, config: &AutoAdvanceConfig) -> Result<Self, PageError> {
        let selectors = config
            .selectors
            .iter()
            .map(|pattern| compile_selectors(pattern))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            page,
            selectors,
            grace: config.grace_delay(),
        })
    }

    pub fn start(self: &Rc<Self>) {
        self.check();
        let this = Rc::clone(self);
        watch(&self.page, move || this.check());
        tracing::debug!(target: "matinee", "auto-advance trigger started");
    }

    /// First match across the ordered patterns wins; it is only acted on if
    /// visible. No dedup: a control rediscovered on a later batch schedules
    /// another timer, and duplicates aimed at a removed node are harmless
    /// because each one re-checks attachment.
    fn check(&self) {
        for selectors in &self.selectors {
            let Some(control) = self.page.query_first(selectors) else {
                continue;
            };
            if self.page.is_visible(&control) {
                self.schedule_advance(control);
            }
            return;
        }
    }

    fn schedule_advance(&self, control: kuchiki::NodeRef) {
        let page = Rc::downgrade(&self.page);
        // Detached handle: the grace timer fires on its own, nobody cancels
        // it by replacement.
        let _ = after(self.grace, move || {
            let Some(page) = page.upgrade() else {
                return;
            };
            if !page.is_attached(&control) {
                tracing::debug!(target: "matinee", "next control removed before grace delay");
                return;
            }
            match page.click(&control) {
                Ok(()) => {
                    tracing::info!(target: "matinee", "advanced to next item");
                }
                Err(err) => {
                    tracing::warn!(target: "matinee", error = %err, "failed to activate next control");
                }
            }
        });
    }
}
