//! Keyboard chords for on-page controls: Ctrl+H opens the settings control,
//! Ctrl+F toggles fullscreen. Interception claims the event before the page's
//! own handling, then invokes the control if present; a missing control is
//! not an error.

use std::rc::Rc;

use kuchiki::Selectors;

use crate::config::ShortcutsConfig;
use crate::page::{HostPage, KeyEvent, PageError};
use crate::style::compile_selectors;

pub struct KeyboardShortcuts {
    page: Rc<HostPage>,
    video: Selectors,
    settings: Vec<Selectors>,
    fullscreen: Vec<Selectors>,
}

impl KeyboardShortcuts {
    pub fn new(page: Rc<HostPage>, config: &ShortcutsConfig) -> Result<Self, PageError> {
        Ok(Self {
            page,
            video: compile_selectors("video")?,
            settings: config
                .settings_selectors
                .iter()
                .map(|pattern| compile_selectors(pattern))
                .collect::<Result<Vec<_>, _>>()?,
            fullscreen: config
                .fullscreen_selectors
                .iter()
                .map(|pattern| compile_selectors(pattern))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    pub fn start(self: &Rc<Self>) {
        let this = Rc::clone(self);
        self.page
            .add_keydown_listener(Rc::new(move |event| this.on_keydown(event)));
        tracing::debug!(target: "matinee", "keyboard shortcuts installed");
    }

    fn on_keydown(&self, event: &KeyEvent) {
        // Chords only apply on playback pages.
        if self.page.query_first(&self.video).is_none() {
            return;
        }
        if !event.ctrl {
            return;
        }
        match event.key.to_ascii_lowercase().as_str() {
            "h" => {
                event.prevent_default();
                self.activate(&self.settings, "settings");
            }
            "f" => {
                event.prevent_default();
                self.activate(&self.fullscreen, "fullscreen");
            }
            _ => {}
        }
    }

    fn activate(&self, selectors: &[Selectors], control: &str) {
        for candidate in selectors {
            if let Some(node) = self.page.query_first(candidate) {
                match self.page.click(&node) {
                    Ok(()) => {
                        tracing::debug!(target: "matinee", control, "shortcut control activated");
                    }
                    Err(err) => {
                        tracing::warn!(
                            target: "matinee",
                            control,
                            error = %err,
                            "failed to activate shortcut control"
                        );
                    }
                }
                return;
            }
        }
        tracing::debug!(target: "matinee", control, "no matching control on this page");
    }
}
