//! Templating - literal markup plus interpolated values into a fragment.
//!
//! [`html`] is the rendering primitive components build their output with:
//! it interleaves literal parts with interpolated values and parses the
//! result into a detached [`Fragment`].
//!
//! Interpolated values are escaped by default, so externally sourced strings
//! cannot inject markup. [`raw`] is the explicit opt-in for values that are
//! markup on purpose - the caller owns sanitizing those.
//!
//! # Example
//!
//! ```
//! use pulse_ui::template::{html, raw};
//!
//! let name = "<b>alex</b>";
//! // Escaped: renders the literal text "<b>alex</b>".
//! let safe = html(&["<p>", "</p>"], &[name.into()]);
//! // Raw: actually nests a <b> element.
//! let markup = html(&["<p>", "</p>"], &[raw(name)]);
//! # let _ = (safe, markup);
//! ```

pub mod parser;

pub use parser::{parse_fragment, TemplateError};

use crate::types::Value;

// =============================================================================
// Fragment
// =============================================================================

/// A detached tree of parsed markup, ready to instantiate into a document.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Fragment {
    pub nodes: Vec<TemplateNode>,
}

/// One node of a detached fragment.
#[derive(Clone, Debug, PartialEq)]
pub enum TemplateNode {
    Element {
        tag: String,
        /// Insertion-ordered; marker attributes survive until event binding.
        attributes: Vec<(String, String)>,
        children: Vec<TemplateNode>,
    },
    Text(String),
}

// =============================================================================
// Interpolation
// =============================================================================

/// A value interpolated into a template.
#[derive(Clone, Debug, PartialEq)]
pub enum TemplateValue {
    /// Escaped before parsing (the default conversion).
    Text(String),
    /// Inserted verbatim. Can introduce elements; caller must trust it.
    Raw(String),
}

/// Opt into unescaped interpolation.
pub fn raw(markup: impl Into<String>) -> TemplateValue {
    TemplateValue::Raw(markup.into())
}

impl From<Value> for TemplateValue {
    fn from(v: Value) -> Self {
        TemplateValue::Text(v.to_string())
    }
}

impl From<&str> for TemplateValue {
    fn from(v: &str) -> Self {
        TemplateValue::Text(v.to_string())
    }
}

impl From<String> for TemplateValue {
    fn from(v: String) -> Self {
        TemplateValue::Text(v)
    }
}

impl From<bool> for TemplateValue {
    fn from(v: bool) -> Self {
        TemplateValue::Text(v.to_string())
    }
}

impl From<i64> for TemplateValue {
    fn from(v: i64) -> Self {
        TemplateValue::Text(v.to_string())
    }
}

impl From<i32> for TemplateValue {
    fn from(v: i32) -> Self {
        TemplateValue::Text(v.to_string())
    }
}

impl From<f64> for TemplateValue {
    fn from(v: f64) -> Self {
        TemplateValue::Text(v.to_string())
    }
}

/// Escape text for safe embedding in markup (text or attribute position).
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

// =============================================================================
// html
// =============================================================================

/// Build a fragment from literal parts interleaved with interpolated values.
///
/// Mirrors a tagged template: `parts` has one more entry than `values`
/// conceptually, but trailing parts or values may simply be absent - missing
/// slots contribute nothing.
///
/// # Panics
///
/// Malformed markup is a programmer error in the component's template, not a
/// runtime condition; this panics with the parse diagnostic. Use [`try_html`]
/// when markup comes from anywhere other than a source literal.
pub fn html(parts: &[&str], values: &[TemplateValue]) -> Fragment {
    match try_html(parts, values) {
        Ok(fragment) => fragment,
        Err(err) => panic!("malformed template: {err}"),
    }
}

/// Fallible form of [`html`].
pub fn try_html(parts: &[&str], values: &[TemplateValue]) -> Result<Fragment, TemplateError> {
    let mut source = String::new();
    let slots = parts.len().max(values.len());
    for i in 0..slots {
        if let Some(part) = parts.get(i) {
            source.push_str(part);
        }
        match values.get(i) {
            Some(TemplateValue::Text(text)) => source.push_str(&escape(text)),
            Some(TemplateValue::Raw(markup)) => source.push_str(markup),
            None => {}
        }
    }
    parse_fragment(&source)
}

// =============================================================================
// Tests
// =============================================================================
