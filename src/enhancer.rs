//! Orchestrator: waits for the document to become interactive, then starts
//! every enabled component. Failures are isolated per component: one broken
//! selector pattern in config degrades that one enhancement, never its
//! siblings and never the host page.

use std::rc::Rc;

use anyhow::Result;

use crate::advance::AutoAdvanceTrigger;
use crate::config::Config;
use crate::cursor::PointerCursorController;
use crate::dismisser::PromptDismisser;
use crate::net::SettleFeed;
use crate::page::HostPage;
use crate::shortcuts::KeyboardShortcuts;
use crate::suppressor::PanelSuppressor;

pub struct Enhancer {
    page: Rc<HostPage>,
    config: Config,
}

impl Enhancer {
    pub fn new(page: Rc<HostPage>, config: Config) -> Self {
        Self { page, config }
    }

    /// Starts all enabled components once the document is interactive. Never
    /// fails: component initialization errors are logged and swallowed so
    /// the rest still come up.
    pub async fn start(&self, settle: Option<SettleFeed>) {
        self.page.ready().await;

        let page = &self.page;
        let config = &self.config;

        start_component("panel-suppressor", config.panel.enabled, || {
            let suppressor = Rc::new(PanelSuppressor::new(Rc::clone(page), &config.panel)?);
            suppressor.start()?;
            Ok(())
        });

        let mut settle = settle;
        start_component("prompt-dismisser", config.ad_skip.enabled, || {
            let dismisser = Rc::new(PromptDismisser::new(Rc::clone(page), &config.ad_skip)?);
            dismisser.start(settle.take());
            Ok(())
        });

        start_component("cursor-controller", config.cursor.enabled, || {
            let controller = Rc::new(PointerCursorController::new(
                Rc::clone(page),
                &config.cursor,
            )?);
            controller.start();
            Ok(())
        });

        start_component("auto-advance", config.auto_advance.enabled, || {
            let trigger = Rc::new(AutoAdvanceTrigger::new(
                Rc::clone(page),
                &config.auto_advance,
            )?);
            trigger.start();
            Ok(())
        });

        start_component("keyboard-shortcuts", config.shortcuts.enabled, || {
            let shortcuts = Rc::new(KeyboardShortcuts::new(Rc::clone(page), &config.shortcuts)?);
            shortcuts.start();
            Ok(())
        });

        tracing::info!(target: "matinee", "enhancements initialized");
    }
}

fn start_component<F>(name: &str, enabled: bool, init: F)
where
    F: FnOnce() -> Result<()>,
{
    if !enabled {
        tracing::debug!(target: "matinee", component = name, "feature disabled");
        return;
    }
    if let Err(err) = init() {
        tracing::error!(
            target: "matinee",
            component = name,
            error = %err,
            "component failed to initialize; continuing with the rest"
        );
    }
}
