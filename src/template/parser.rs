//! Markup parser - literal text into a detached fragment tree.
//!
//! A deliberately small subset of HTML syntax, enough for component
//! templates: elements with quoted attributes, bare (valueless) attributes,
//! text, comments, self-closing tags and the usual void elements. Entities
//! produced by the escaper (`&amp;` etc.) are decoded back into text nodes,
//! so escaped interpolation round-trips to plain characters.

use thiserror::Error;

use super::{Fragment, TemplateNode};

/// Tags that never take children and need no closing tag.
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Markup that could not be parsed into a fragment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("tag <{0}> is never closed")]
    UnclosedTag(String),
    #[error("closing tag </{found}> does not match open <{expected}>")]
    MismatchedTag { expected: String, found: String },
    #[error("closing tag </{0}> has no matching open tag")]
    UnexpectedClose(String),
    #[error("malformed tag at byte {0}")]
    MalformedTag(usize),
    #[error("attribute value for `{0}` is not terminated")]
    UnterminatedAttribute(String),
    #[error("comment starting at byte {0} is not terminated")]
    UnterminatedComment(usize),
}

/// Parse markup into a detached fragment.
pub fn parse_fragment(source: &str) -> Result<Fragment, TemplateError> {
    Parser::new(source).parse()
}

/// Decode the entities the escaper emits.
pub(crate) fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        let mut matched = false;
        for (entity, ch) in [
            ("&amp;", '&'),
            ("&lt;", '<'),
            ("&gt;", '>'),
            ("&quot;", '"'),
            ("&#39;", '\''),
        ] {
            if let Some(tail) = rest.strip_prefix(entity) {
                out.push(ch);
                rest = tail;
                matched = true;
                break;
            }
        }
        if !matched {
            out.push('&');
            rest = &rest[1..];
        }
    }
    out.push_str(rest);
    out
}

// =============================================================================
// Parser
// =============================================================================

struct Parser<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

/// An element still waiting for its closing tag.
struct OpenElement {
    tag: String,
    attributes: Vec<(String, String)>,
    children: Vec<TemplateNode>,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self { source, bytes: source.as_bytes(), pos: 0 }
    }

    fn parse(mut self) -> Result<Fragment, TemplateError> {
        let mut stack: Vec<OpenElement> = Vec::new();
        let mut roots: Vec<TemplateNode> = Vec::new();

        while self.pos < self.bytes.len() {
            if self.peek() == b'<' {
                if self.source[self.pos..].starts_with("<!--") {
                    self.skip_comment()?;
                } else if self.peek_at(1) == Some(b'/') {
                    let tag = self.read_closing_tag()?;
                    let Some(open) = stack.pop() else {
                        return Err(TemplateError::UnexpectedClose(tag));
                    };
                    if open.tag != tag {
                        return Err(TemplateError::MismatchedTag { expected: open.tag, found: tag });
                    }
                    let node = TemplateNode::Element {
                        tag: open.tag,
                        attributes: open.attributes,
                        children: open.children,
                    };
                    Self::emit(&mut stack, &mut roots, node);
                } else {
                    let (tag, attributes, self_closed) = self.read_opening_tag()?;
                    if self_closed || VOID_TAGS.contains(&tag.as_str()) {
                        let node = TemplateNode::Element { tag, attributes, children: Vec::new() };
                        Self::emit(&mut stack, &mut roots, node);
                    } else {
                        stack.push(OpenElement { tag, attributes, children: Vec::new() });
                    }
                }
            } else {
                let text = self.read_text();
                // Whitespace between tags is layout noise, not content.
                if !text.trim().is_empty() {
                    let node = TemplateNode::Text(decode_entities(text.trim()));
                    Self::emit(&mut stack, &mut roots, node);
                }
            }
        }

        if let Some(open) = stack.pop() {
            return Err(TemplateError::UnclosedTag(open.tag));
        }
        Ok(Fragment { nodes: roots })
    }

    fn emit(stack: &mut [OpenElement], roots: &mut Vec<TemplateNode>, node: TemplateNode) {
        match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => roots.push(node),
        }
    }

    fn peek(&self) -> u8 {
        self.bytes[self.pos]
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn skip_comment(&mut self) -> Result<(), TemplateError> {
        let start = self.pos;
        match self.source[self.pos..].find("-->") {
            Some(end) => {
                self.pos += end + 3;
                Ok(())
            }
            None => Err(TemplateError::UnterminatedComment(start)),
        }
    }

    fn read_text(&mut self) -> &'a str {
        let start = self.pos;
        while self.pos < self.bytes.len() && self.peek() != b'<' {
            self.pos += 1;
        }
        &self.source[start..self.pos]
    }

    fn read_closing_tag(&mut self) -> Result<String, TemplateError> {
        let start = self.pos;
        self.pos += 2; // "</"
        let tag = self.read_name();
        if tag.is_empty() {
            return Err(TemplateError::MalformedTag(start));
        }
        self.skip_whitespace();
        if self.peek_at(0) != Some(b'>') {
            return Err(TemplateError::MalformedTag(start));
        }
        self.pos += 1;
        Ok(tag)
    }

    fn read_opening_tag(
        &mut self,
    ) -> Result<(String, Vec<(String, String)>, bool), TemplateError> {
        let start = self.pos;
        self.pos += 1; // "<"
        let tag = self.read_name();
        if tag.is_empty() {
            return Err(TemplateError::MalformedTag(start));
        }

        let mut attributes = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek_at(0) {
                None => return Err(TemplateError::UnclosedTag(tag)),
                Some(b'>') => {
                    self.pos += 1;
                    return Ok((tag, attributes, false));
                }
                Some(b'/') => {
                    if self.peek_at(1) != Some(b'>') {
                        return Err(TemplateError::MalformedTag(start));
                    }
                    self.pos += 2;
                    return Ok((tag, attributes, true));
                }
                Some(_) => {
                    let (name, value) = self.read_attribute()?;
                    attributes.push((name, value));
                }
            }
        }
    }

    fn read_attribute(&mut self) -> Result<(String, String), TemplateError> {
        let name = self.read_attribute_name();
        if name.is_empty() {
            return Err(TemplateError::MalformedTag(self.pos));
        }
        if self.peek_at(0) != Some(b'=') {
            // Bare attribute: present, empty value.
            return Ok((name, String::new()));
        }
        self.pos += 1; // "="
        let quote = match self.peek_at(0) {
            Some(q @ (b'"' | b'\'')) => q,
            _ => return Err(TemplateError::UnterminatedAttribute(name)),
        };
        self.pos += 1;
        let start = self.pos;
        while self.pos < self.bytes.len() && self.peek() != quote {
            self.pos += 1;
        }
        if self.pos >= self.bytes.len() {
            return Err(TemplateError::UnterminatedAttribute(name));
        }
        let value = decode_entities(&self.source[start..self.pos]);
        self.pos += 1; // closing quote
        Ok((name, value))
    }

    /// Tag names: ascii alphanumerics and dashes.
    fn read_name(&mut self) -> String {
        let start = self.pos;
        while self.pos < self.bytes.len()
            && (self.peek().is_ascii_alphanumeric() || self.peek() == b'-')
        {
            self.pos += 1;
        }
        self.source[start..self.pos].to_ascii_lowercase()
    }

    /// Attribute names additionally allow the event marker and colons/underscores.
    fn read_attribute_name(&mut self) -> String {
        let start = self.pos;
        while self.pos < self.bytes.len() {
            let b = self.peek();
            if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'@' | b':' | b'_') {
                self.pos += 1;
            } else {
                break;
            }
        }
        self.source[start..self.pos].to_string()
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.bytes.len() && self.peek().is_ascii_whitespace() {
            self.pos += 1;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn element(tag: &str, attrs: &[(&str, &str)], children: Vec<TemplateNode>) -> TemplateNode {
        TemplateNode::Element {
            tag: tag.into(),
            attributes: attrs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            children,
        }
    }

    #[test]
    fn test_parse_nested_elements() {
        let fragment = parse_fragment(r#"<div id="toolbar"><ul class="primary"><li>Save</li></ul></div>"#).unwrap();
        assert_eq!(
            fragment.nodes,
            vec![element(
                "div",
                &[("id", "toolbar")],
                vec![element(
                    "ul",
                    &[("class", "primary")],
                    vec![element("li", &[], vec![TemplateNode::Text("Save".into())])],
                )],
            )]
        );
    }

    #[test]
    fn test_parse_marker_attributes() {
        let fragment = parse_fragment(r#"<button @click="toggle" type="button">Close</button>"#).unwrap();
        let TemplateNode::Element { attributes, .. } = &fragment.nodes[0] else {
            panic!("expected element");
        };
        assert_eq!(
            attributes,
            &vec![("@click".to_string(), "toggle".to_string()), ("type".to_string(), "button".to_string())]
        );
    }

    #[test]
    fn test_void_and_self_closing() {
        let fragment = parse_fragment(r#"<div><input id="filter" type="text"><span/></div>"#).unwrap();
        assert_eq!(
            fragment.nodes,
            vec![element(
                "div",
                &[],
                vec![
                    element("input", &[("id", "filter"), ("type", "text")], vec![]),
                    element("span", &[], vec![]),
                ],
            )]
        );
    }

    #[test]
    fn test_bare_attribute_and_comment() {
        let fragment = parse_fragment("<div hidden><!-- note --></div>").unwrap();
        assert_eq!(fragment.nodes, vec![element("div", &[("hidden", "")], vec![])]);
    }

    #[test]
    fn test_entities_decoded() {
        let fragment = parse_fragment("<p>a &lt;b&gt; &amp; c</p>").unwrap();
        assert_eq!(
            fragment.nodes,
            vec![element("p", &[], vec![TemplateNode::Text("a <b> & c".into())])]
        );
    }

    #[test]
    fn test_multiple_roots_and_whitespace() {
        let fragment = parse_fragment("\n  <aside></aside>\n  <main></main>\n").unwrap();
        assert_eq!(fragment.nodes.len(), 2);
    }

    #[test]
    fn test_unclosed_tag() {
        assert_eq!(parse_fragment("<div><p></div>"), Err(TemplateError::MismatchedTag {
            expected: "p".into(),
            found: "div".into(),
        }));
        assert_eq!(parse_fragment("<div>"), Err(TemplateError::UnclosedTag("div".into())));
    }

    #[test]
    fn test_unexpected_close() {
        assert_eq!(parse_fragment("</div>"), Err(TemplateError::UnexpectedClose("div".into())));
    }

    #[test]
    fn test_unterminated_attribute() {
        assert_eq!(
            parse_fragment(r#"<div id="x"#),
            Err(TemplateError::UnterminatedAttribute("id".into()))
        );
    }

    #[test]
    fn test_decode_unknown_entity_left_alone() {
        assert_eq!(decode_entities("&copy; &amp;"), "&copy; &");
    }
}
