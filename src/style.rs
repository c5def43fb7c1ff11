use kuchiki::{ElementData, NodeDataRef, Selectors};

use crate::page::PageError;

/// One `property: value` pair from an inline style attribute or an injected
/// rule, with its `!important` flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
    pub important: bool,
}

impl Declaration {
    pub fn new(property: &str, value: &str) -> Self {
        Self {
            property: property.to_string(),
            value: value.to_string(),
            important: false,
        }
    }

    pub fn important(property: &str, value: &str) -> Self {
        Self {
            important: true,
            ..Self::new(property, value)
        }
    }
}

/// A style rule injected into the page: a selector list plus declarations.
/// Selector patterns are opaque configuration; compiling them here is the
/// only point where they are validated.
pub struct StyleRule {
    selectors: Selectors,
    selector_list: String,
    declarations: Vec<Declaration>,
}

impl StyleRule {
    pub fn new(selector_list: &str, declarations: Vec<Declaration>) -> Result<Self, PageError> {
        let selectors = compile_selectors(selector_list)?;
        Ok(Self {
            selectors,
            selector_list: selector_list.to_string(),
            declarations,
        })
    }

    pub fn selector_list(&self) -> &str {
        &self.selector_list
    }

    pub(crate) fn matches(&self, element: &NodeDataRef<ElementData>) -> bool {
        self.selectors.matches(element)
    }

    pub(crate) fn declaration(&self, property: &str, important: bool) -> Option<&Declaration> {
        self.declarations
            .iter()
            .rev()
            .find(|decl| decl.property == property && decl.important == important)
    }
}

pub fn compile_selectors(pattern: &str) -> Result<Selectors, PageError> {
    Selectors::compile(pattern).map_err(|_| PageError::InvalidSelector(pattern.to_string()))
}

pub fn parse_declarations(text: &str) -> Vec<Declaration> {
    text.split(';')
        .filter_map(|chunk| {
            let (property, rest) = chunk.split_once(':')?;
            let property = property.trim();
            if property.is_empty() {
                return None;
            }
            let rest = rest.trim();
            let (value, important) = match rest.strip_suffix("!important") {
                Some(value) => (value.trim_end(), true),
                None => (rest, false),
            };
            if value.is_empty() {
                return None;
            }
            Some(Declaration {
                property: property.to_string(),
                value: value.to_string(),
                important,
            })
        })
        .collect()
}

pub fn serialize_declarations(declarations: &[Declaration]) -> String {
    declarations
        .iter()
        .map(|decl| {
            if decl.important {
                format!("{}: {} !important", decl.property, decl.value)
            } else {
                format!("{}: {}", decl.property, decl.value)
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Replaces any existing declaration for `property`, keeping the rest intact.
pub fn set_declaration(
    declarations: &mut Vec<Declaration>,
    property: &str,
    value: &str,
    important: bool,
) {
    declarations.retain(|decl| decl.property != property);
    declarations.push(Declaration {
        property: property.to_string(),
        value: value.to_string(),
        important,
    });
}
