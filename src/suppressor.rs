//! Panel Suppressor: keeps spoiler panels off-screen. One persistent injected
//! rule handles elements present at load and any future match declaratively;
//! a reactive sweep re-asserts inline overrides on every mutation batch, in
//! case the host's own inline styles would otherwise win the race against
//! the stylesheet.

use std::cell::Cell;
use std::rc::Rc;

use kuchiki::{NodeRef, Selectors};

use crate::config::PanelConfig;
use crate::page::{HostPage, PageError};
use crate::style::{compile_selectors, Declaration, StyleRule};
use crate::watch::watch;

pub struct PanelSuppressor {
    page: Rc<HostPage>,
    selectors: Vec<Selectors>,
    selector_list: String,
    style_injected: Cell<bool>,
}

impl PanelSuppressor {
    pub fn new(page: Rc<HostPage>, config: &PanelConfig) -> Result<Self, PageError> {
        let selectors = config
            .selectors
            .iter()
            .map(|pattern| compile_selectors(pattern))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            page,
            selectors,
            selector_list: config.selectors.join(", "),
            style_injected: Cell::new(false),
        })
    }

    pub fn start(self: &Rc<Self>) -> Result<(), PageError> {
        self.install_persistent_hiding()?;
        self.sweep();
        let this = Rc::clone(self);
        watch(&self.page, move || this.sweep());
        tracing::debug!(target: "matinee", "panel suppressor started");
        Ok(())
    }

    /// Inserts the one global rule covering every configured pattern.
    /// Idempotent: the guard flag prevents duplicate insertion.
    fn install_persistent_hiding(&self) -> Result<(), PageError> {
        if self.style_injected.get() {
            return Ok(());
        }
        let rule = StyleRule::new(
            &self.selector_list,
            vec![
                Declaration::important("visibility", "hidden"),
                Declaration::important("opacity", "0"),
                Declaration::important("pointer-events", "none"),
            ],
        )?;
        self.page.insert_style_rule(rule);
        self.style_injected.set(true);
        tracing::debug!(target: "matinee", selectors = %self.selector_list, "panel hiding rule injected");
        Ok(())
    }

    /// Re-scans the document and forces the overrides inline on every match,
    /// so a host reset of the node's own style is undone on rediscovery.
    fn sweep(&self) {
        for selectors in &self.selectors {
            for node in self.page.query_all(selectors) {
                self.hide_node(&node);
            }
        }
    }

    fn hide_node(&self, node: &NodeRef) {
        let already_hidden = self
            .page
            .inline_style(node, "visibility")
            .map(|decl| decl.value == "hidden" && decl.important)
            .unwrap_or(false);
        self.page
            .set_inline_style_important(node, "visibility", "hidden");
        self.page.set_inline_style_important(node, "opacity", "0");
        self.page
            .set_inline_style_important(node, "pointer-events", "none");
        if !already_hidden {
            tracing::debug!(target: "matinee", "panel element hidden");
        }
    }
}
