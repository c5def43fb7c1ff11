//! Prompt Dismisser: clicks "skip" controls as soon as they become
//! interactable. Two triggering channels feed the scan: debounced mutation
//! batches, and network settle for prompts toggled visible on pre-existing
//! nodes with no child-list change to observe.

use std::rc::Rc;

use kuchiki::Selectors;
use tokio::time::Duration;

use crate::config::AdSkipConfig;
use crate::net::SettleFeed;
use crate::page::{HostPage, PageError};
use crate::schedule::Debouncer;
use crate::style::compile_selectors;
use crate::watch::watch;

pub struct PromptDismisser {
    page: Rc<HostPage>,
    selectors: Vec<(String, Selectors)>,
    window: Duration,
}

impl PromptDismisser {
    pub fn new(page: Rc<HostPage>, config: &AdSkipConfig) -> Result<Self, PageError> {
        let selectors = config
            .selectors
            .iter()
            .map(|pattern| Ok((pattern.clone(), compile_selectors(pattern)?)))
            .collect::<Result<Vec<_>, PageError>>()?;
        Ok(Self {
            page,
            selectors,
            window: config.debounce(),
        })
    }

    pub fn start(self: &Rc<Self>, settle: Option<SettleFeed>) {
        self.scan();

        let this = Rc::clone(self);
        let debouncer = Debouncer::new(self.window, move || this.scan());
        watch(&self.page, move || debouncer.trigger());

        if let Some(mut feed) = settle {
            let this = Rc::clone(self);
            tokio::task::spawn_local(async move {
                while feed.settled().await {
                    this.scan();
                }
            });
        }
        tracing::debug!(target: "matinee", "prompt dismisser started");
    }

    /// One pass over the configured patterns: first match per pattern,
    /// activated only if actually rendered. A failed activation is logged
    /// and must not disable future scans.
    fn scan(&self) {
        for (pattern, selectors) in &self.selectors {
            let Some(control) = self.page.query_first(selectors) else {
                continue;
            };
            if !self.page.is_visible(&control) {
                continue;
            }
            match self.page.click(&control) {
                Ok(()) => {
                    tracing::info!(target: "matinee", selector = %pattern, "ad prompt dismissed");
                }
                Err(err) => {
                    tracing::warn!(
                        target: "matinee",
                        selector = %pattern,
                        error = %err,
                        "failed to activate skip control"
                    );
                }
            }
        }
    }
}
