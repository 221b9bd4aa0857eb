//! Simple selectors - the subset components actually use.
//!
//! One compound selector: optional tag, then any mix of `#id` and `.class`
//! segments (`li`, `#files`, `.item`, `input#filter`, `li.item.selected`).
//! No combinators, no attribute selectors.

use super::document::{Document, NodeId};

pub(crate) struct Selector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl Selector {
    pub(crate) fn parse(source: &str) -> Self {
        let mut tag = None;
        let mut id = None;
        let mut classes = Vec::new();

        let mut rest = source.trim();
        if !rest.starts_with(['#', '.']) && !rest.is_empty() {
            let end = rest.find(['#', '.']).unwrap_or(rest.len());
            tag = Some(rest[..end].to_ascii_lowercase());
            rest = &rest[end..];
        }
        while !rest.is_empty() {
            let marker = rest.as_bytes()[0];
            let body = &rest[1..];
            let end = body.find(['#', '.']).unwrap_or(body.len());
            let segment = body[..end].to_string();
            match marker {
                b'#' => id = Some(segment),
                b'.' => classes.push(segment),
                _ => {}
            }
            rest = &body[end..];
        }

        Self { tag, id, classes }
    }

    pub(crate) fn matches(&self, document: &Document, node: NodeId) -> bool {
        let Some(tag) = document.tag(node) else { return false };
        if let Some(expected) = &self.tag {
            if tag != *expected {
                return false;
            }
        }
        if let Some(expected) = &self.id {
            if document.attribute(node, "id").as_deref() != Some(expected) {
                return false;
            }
        }
        self.classes.iter().all(|class| document.has_class(node, class))
    }
}
