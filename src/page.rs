//! The host-document capability: a live DOM tree plus the hooks a browser
//! page provides around it. Child-list mutation notification, layout boxes,
//! injected style rules, synthetic activation, event listeners, and a
//! readiness signal. Components never touch the tree except through this
//! surface, so delayed actions can always re-validate their targets.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use kuchiki::traits::*;
use kuchiki::{NodeRef, Selectors};
use thiserror::Error;
use tokio::sync::{mpsc, watch};

use crate::style::{self, Declaration, StyleRule};
use crate::watch::MutationFeed;

#[derive(Debug, Error)]
pub enum PageError {
    #[error("invalid selector pattern: {0}")]
    InvalidSelector(String),
    #[error("node is no longer attached to the document")]
    Detached,
    #[error("node is not interactable")]
    NotInteractable,
    #[error("fragment contains no nodes")]
    EmptyFragment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    MouseEnter,
    MouseLeave,
    MouseMove,
    Pause,
    Click,
}

/// A keyboard event delivered to document-level listeners. Listeners may
/// claim it via [`KeyEvent::prevent_default`] to stop the page's own
/// handling.
pub struct KeyEvent {
    pub key: String,
    pub ctrl: bool,
    prevented: Cell<bool>,
}

impl KeyEvent {
    pub fn new(key: &str, ctrl: bool) -> Self {
        Self {
            key: key.to_string(),
            ctrl,
            prevented: Cell::new(false),
        }
    }

    pub fn ctrl(key: &str) -> Self {
        Self::new(key, true)
    }

    pub fn prevent_default(&self) {
        self.prevented.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.prevented.get()
    }
}

/// Properties resolved through ancestors when the node has no value of its
/// own. Enough of the CSS inheritance table for this engine's needs.
const INHERITED: &[&str] = &["visibility", "cursor", "pointer-events"];

pub type Listener = Rc<dyn Fn()>;
pub type KeyListener = Rc<dyn Fn(&KeyEvent)>;

pub struct HostPage {
    document: NodeRef,
    subscribers: RefCell<Vec<mpsc::UnboundedSender<()>>>,
    listeners: RefCell<HashMap<(usize, EventKind), Vec<Listener>>>,
    key_listeners: RefCell<Vec<KeyListener>>,
    rules: RefCell<Vec<StyleRule>>,
    layout: RefCell<HashMap<usize, (f32, f32)>>,
    activations: RefCell<Vec<NodeRef>>,
    ready_tx: watch::Sender<bool>,
    ready_rx: watch::Receiver<bool>,
}

pub(crate) fn node_key(node: &NodeRef) -> usize {
    Rc::as_ptr(&node.0) as usize
}

impl HostPage {
    /// Builds a page from already-parsed markup; the document counts as
    /// interactive immediately.
    pub fn from_html(html: &str) -> Rc<Self> {
        Self::build(html, true)
    }

    /// Builds a page that is still loading; the orchestrator waits until the
    /// host calls [`HostPage::mark_ready`].
    pub fn loading(html: &str) -> Rc<Self> {
        Self::build(html, false)
    }

    fn build(html: &str, ready: bool) -> Rc<Self> {
        let (ready_tx, ready_rx) = watch::channel(ready);
        Rc::new(Self {
            document: kuchiki::parse_html().one(html),
            subscribers: RefCell::new(Vec::new()),
            listeners: RefCell::new(HashMap::new()),
            key_listeners: RefCell::new(Vec::new()),
            rules: RefCell::new(Vec::new()),
            layout: RefCell::new(HashMap::new()),
            activations: RefCell::new(Vec::new()),
            ready_tx,
            ready_rx,
        })
    }

    pub fn document(&self) -> &NodeRef {
        &self.document
    }

    pub fn body(&self) -> Option<NodeRef> {
        self.document
            .select_first("body")
            .ok()
            .map(|el| el.as_node().clone())
    }

    pub fn is_ready(&self) -> bool {
        *self.ready_rx.borrow()
    }

    pub fn mark_ready(&self) {
        let _ = self.ready_tx.send(true);
    }

    /// Resolves once the document is interactive.
    pub async fn ready(&self) {
        let mut rx = self.ready_rx.clone();
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    // ---- queries ------------------------------------------------------

    pub fn query_first(&self, selectors: &Selectors) -> Option<NodeRef> {
        self.matching_in_subtree(&self.document, selectors)
            .into_iter()
            .next()
    }

    pub fn query_all(&self, selectors: &Selectors) -> Vec<NodeRef> {
        self.matching_in_subtree(&self.document, selectors)
    }

    /// Matches within `root` and its descendants, since mutation batches
    /// report subtree roots rather than individual deep nodes.
    pub fn matching_in_subtree(&self, root: &NodeRef, selectors: &Selectors) -> Vec<NodeRef> {
        root.inclusive_descendants()
            .filter_map(|node| node.into_element_ref())
            .filter(|element| selectors.matches(element))
            .map(|element| element.as_node().clone())
            .collect()
    }

    pub fn is_attached(&self, node: &NodeRef) -> bool {
        node.inclusive_ancestors().any(|a| a == self.document)
    }

    // ---- layout & visibility ------------------------------------------

    /// Records the layout box a real renderer would have computed. Nodes
    /// without a box are not rendered and never count as visible.
    pub fn set_layout_box(&self, node: &NodeRef, width: f32, height: f32) {
        self.layout.borrow_mut().insert(node_key(node), (width, height));
    }

    /// The visibility predicate: attached, not display-none anywhere up the
    /// chain, and rendered with a non-zero box. Presence in the tree alone is
    /// not enough, since hidden controls must never be clicked.
    pub fn is_visible(&self, node: &NodeRef) -> bool {
        if !self.is_attached(node) {
            return false;
        }
        let mut current = Some(node.clone());
        while let Some(n) = current {
            if n.as_element().is_some() && self.cascaded_style(&n, "display").as_deref() == Some("none")
            {
                return false;
            }
            current = n.parent();
        }
        match self.layout.borrow().get(&node_key(node)) {
            Some(&(width, height)) => width > 0.0 && height > 0.0,
            None => false,
        }
    }

    // ---- mutations ----------------------------------------------------

    /// Parses `fragment` and appends its top-level nodes to `parent`,
    /// notifying mutation subscribers once for the whole batch. Returns the
    /// appended element nodes.
    pub fn append_html(&self, parent: &NodeRef, fragment: &str) -> Result<Vec<NodeRef>, PageError> {
        let parsed = kuchiki::parse_html().one(fragment);
        let body = parsed
            .select_first("body")
            .map_err(|_| PageError::EmptyFragment)?;
        let children: Vec<NodeRef> = body.as_node().children().collect();
        if children.is_empty() {
            return Err(PageError::EmptyFragment);
        }
        let mut elements = Vec::new();
        for child in children {
            child.detach();
            parent.append(child.clone());
            if child.as_element().is_some() {
                elements.push(child);
            }
        }
        self.notify_mutation();
        Ok(elements)
    }

    pub fn remove(&self, node: &NodeRef) {
        node.detach();
        // The detached descendants can never be laid out again; drop their
        // entries too so the table does not grow without bound.
        let mut layout = self.layout.borrow_mut();
        for descendant in node.inclusive_descendants() {
            layout.remove(&node_key(&descendant));
        }
        drop(layout);
        self.notify_mutation();
    }

    /// Attribute writes mirror `childList`-only observation: they do not
    /// notify mutation subscribers.
    pub fn set_attribute(&self, node: &NodeRef, name: &str, value: &str) {
        if let Some(element) = node.as_element() {
            element
                .attributes
                .borrow_mut()
                .insert(name, value.to_string());
        }
    }

    pub fn attribute(&self, node: &NodeRef, name: &str) -> Option<String> {
        let element = node.as_element()?;
        let value = element.attributes.borrow().get(name).map(str::to_string);
        value
    }

    pub fn has_attribute(&self, node: &NodeRef, name: &str) -> bool {
        node.as_element()
            .map(|element| element.attributes.borrow().contains(name))
            .unwrap_or(false)
    }

    // ---- styles -------------------------------------------------------

    pub fn set_inline_style(&self, node: &NodeRef, property: &str, value: &str) {
        self.write_inline(node, property, value, false);
    }

    pub fn set_inline_style_important(&self, node: &NodeRef, property: &str, value: &str) {
        self.write_inline(node, property, value, true);
    }

    fn write_inline(&self, node: &NodeRef, property: &str, value: &str, important: bool) {
        let Some(element) = node.as_element() else {
            return;
        };
        let mut attributes = element.attributes.borrow_mut();
        let mut declarations = attributes
            .get("style")
            .map(style::parse_declarations)
            .unwrap_or_default();
        style::set_declaration(&mut declarations, property, value, important);
        attributes.insert("style", style::serialize_declarations(&declarations));
    }

    pub fn inline_style(&self, node: &NodeRef, property: &str) -> Option<Declaration> {
        let element = node.as_element()?;
        let declarations = element
            .attributes
            .borrow()
            .get("style")
            .map(style::parse_declarations)
            .unwrap_or_default();
        declarations
            .into_iter()
            .rev()
            .find(|decl| decl.property == property)
    }

    pub fn insert_style_rule(&self, rule: StyleRule) {
        self.rules.borrow_mut().push(rule);
    }

    pub fn style_rule_count(&self) -> usize {
        self.rules.borrow().len()
    }

    /// Resolves a property the way a renderer would: inline `!important`
    /// beats rule `!important` beats inline beats rules, later rules winning,
    /// with ancestor lookup for the few inherited properties this engine
    /// cares about.
    pub fn computed_style(&self, node: &NodeRef, property: &str) -> Option<String> {
        if let Some(value) = self.cascaded_style(node, property) {
            return Some(value);
        }
        if INHERITED.contains(&property) {
            let mut current = node.parent();
            while let Some(ancestor) = current {
                if ancestor.as_element().is_some() {
                    if let Some(value) = self.cascaded_style(&ancestor, property) {
                        return Some(value);
                    }
                }
                current = ancestor.parent();
            }
        }
        None
    }

    fn cascaded_style(&self, node: &NodeRef, property: &str) -> Option<String> {
        let element = node.clone().into_element_ref()?;
        let inline = element
            .attributes
            .borrow()
            .get("style")
            .map(style::parse_declarations)
            .unwrap_or_default();

        if let Some(decl) = inline
            .iter()
            .rev()
            .find(|d| d.property == property && d.important)
        {
            return Some(decl.value.clone());
        }
        let rules = self.rules.borrow();
        if let Some(decl) = rules
            .iter()
            .rev()
            .filter(|rule| rule.matches(&element))
            .find_map(|rule| rule.declaration(property, true))
        {
            return Some(decl.value.clone());
        }
        if let Some(decl) = inline.iter().rev().find(|d| d.property == property) {
            return Some(decl.value.clone());
        }
        rules
            .iter()
            .rev()
            .filter(|rule| rule.matches(&element))
            .find_map(|rule| rule.declaration(property, false))
            .map(|decl| decl.value.clone())
    }

    // ---- events -------------------------------------------------------

    pub fn add_event_listener(&self, node: &NodeRef, kind: EventKind, listener: Listener) {
        self.listeners
            .borrow_mut()
            .entry((node_key(node), kind))
            .or_default()
            .push(listener);
    }

    pub fn dispatch(&self, node: &NodeRef, kind: EventKind) {
        let listeners: Vec<Listener> = self
            .listeners
            .borrow()
            .get(&(node_key(node), kind))
            .cloned()
            .unwrap_or_default();
        for listener in listeners {
            listener();
        }
    }

    pub fn add_keydown_listener(&self, listener: KeyListener) {
        self.key_listeners.borrow_mut().push(listener);
    }

    pub fn dispatch_keydown(&self, event: &KeyEvent) {
        let listeners: Vec<KeyListener> = self.key_listeners.borrow().clone();
        for listener in listeners {
            listener(event);
        }
    }

    /// Synthetic activation of a control, as if triggered by a human action.
    /// Fails on detached targets and on nodes a renderer would not let the
    /// pointer reach.
    pub fn click(&self, node: &NodeRef) -> Result<(), PageError> {
        if !self.is_attached(node) {
            return Err(PageError::Detached);
        }
        if self.computed_style(node, "pointer-events").as_deref() == Some("none") {
            return Err(PageError::NotInteractable);
        }
        self.activations.borrow_mut().push(node.clone());
        self.dispatch(node, EventKind::Click);
        Ok(())
    }

    pub fn activation_count(&self, node: &NodeRef) -> usize {
        let key = node_key(node);
        self.activations
            .borrow()
            .iter()
            .filter(|n| node_key(n) == key)
            .count()
    }

    pub fn total_activations(&self) -> usize {
        self.activations.borrow().len()
    }

    // ---- mutation subscription ----------------------------------------

    pub fn subscribe_mutations(&self) -> MutationFeed {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.borrow_mut().push(tx);
        MutationFeed::new(rx)
    }

    fn notify_mutation(&self) {
        self.subscribers
            .borrow_mut()
            .retain(|tx| tx.send(()).is_ok());
    }
}
