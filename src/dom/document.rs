//! Document - arena-backed element tree.
//!
//! Nodes are indices into a slot vector with a free pool for reuse, in the
//! same shape as a component registry: O(1) allocation, recursive release,
//! and stable ids while a node is alive.
//!
//! `Document` is a cheap-clone handle (`Rc` inside); effect closures and
//! event handlers capture clones freely. All operations take `&self` -
//! interior mutability, single-threaded.

use std::cell::RefCell;
use std::rc::Rc;

use crate::template::{escape, Fragment, TemplateNode};

use super::event::{Event, EventHandler, ListenerId};
use super::selector::Selector;

// =============================================================================
// Node types
// =============================================================================

/// Stable identifier of a live node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

bitflags::bitflags! {
    /// Per-node state bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct NodeFlags: u8 {
        /// Node is reachable from the document root.
        const CONNECTED = 1 << 0;
        /// Node is present but not shown (filtering, overlays).
        const HIDDEN = 1 << 1;
    }
}

#[derive(Clone, Debug, PartialEq)]
enum NodeKind {
    Element { tag: String },
    Text { text: String },
}

struct ListenerEntry {
    id: usize,
    event: String,
    handler: EventHandler,
}

struct NodeData {
    kind: NodeKind,
    /// Insertion-ordered attribute pairs.
    attributes: Vec<(String, String)>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    listeners: Vec<ListenerEntry>,
    flags: NodeFlags,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            attributes: Vec::new(),
            children: Vec::new(),
            parent: None,
            listeners: Vec::new(),
            flags: NodeFlags::empty(),
        }
    }
}

// =============================================================================
// Document
// =============================================================================

struct DocumentInner {
    nodes: Vec<Option<NodeData>>,
    free: Vec<usize>,
    root: NodeId,
    next_listener_id: usize,
}

/// Cheap-clone handle over the node arena.
#[derive(Clone)]
pub struct Document {
    inner: Rc<RefCell<DocumentInner>>,
}

impl Document {
    /// Create a document with a connected root element.
    pub fn new() -> Self {
        let mut root_data = NodeData::new(NodeKind::Element { tag: "root".to_string() });
        root_data.flags.insert(NodeFlags::CONNECTED);
        Self {
            inner: Rc::new(RefCell::new(DocumentInner {
                nodes: vec![Some(root_data)],
                free: Vec::new(),
                root: NodeId(0),
                next_listener_id: 0,
            })),
        }
    }

    pub fn root(&self) -> NodeId {
        self.inner.borrow().root
    }

    // -------------------------------------------------------------------------
    // Allocation
    // -------------------------------------------------------------------------

    fn allocate(&self, data: NodeData) -> NodeId {
        let mut inner = self.inner.borrow_mut();
        match inner.free.pop() {
            Some(slot) => {
                inner.nodes[slot] = Some(data);
                NodeId(slot)
            }
            None => {
                inner.nodes.push(Some(data));
                NodeId(inner.nodes.len() - 1)
            }
        }
    }

    /// Create a detached element.
    pub fn create_element(&self, tag: impl Into<String>) -> NodeId {
        self.allocate(NodeData::new(NodeKind::Element { tag: tag.into() }))
    }

    /// Create a detached text node.
    pub fn create_text(&self, text: impl Into<String>) -> NodeId {
        self.allocate(NodeData::new(NodeKind::Text { text: text.into() }))
    }

    /// Whether the id refers to a live node.
    pub fn contains(&self, node: NodeId) -> bool {
        self.inner
            .borrow()
            .nodes
            .get(node.0)
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }

    /// Release a subtree back to the pool. The nodes' ids become invalid.
    pub fn remove(&self, node: NodeId) {
        self.detach(node);
        let descendants = self.collect_subtree(node);
        let mut inner = self.inner.borrow_mut();
        for NodeId(slot) in descendants {
            inner.nodes[slot] = None;
            inner.free.push(slot);
        }
    }

    // -------------------------------------------------------------------------
    // Tree structure
    // -------------------------------------------------------------------------

    /// Append `child` as the last child of `parent`, detaching it from any
    /// previous parent. Connectivity propagates through the subtree.
    pub fn append_child(&self, parent: NodeId, child: NodeId) {
        self.detach(child);
        let parent_connected = {
            let mut inner = self.inner.borrow_mut();
            if let Some(data) = inner.nodes[child.0].as_mut() {
                data.parent = Some(parent);
            }
            if let Some(data) = inner.nodes[parent.0].as_mut() {
                data.children.push(child);
                data.flags.contains(NodeFlags::CONNECTED)
            } else {
                false
            }
        };
        if parent_connected {
            self.set_connected(child, true);
        }
    }

    /// Detach a node from its parent, leaving the subtree alive for
    /// re-attachment. The subtree loses its CONNECTED flag.
    pub fn detach(&self, node: NodeId) {
        let parent = {
            let mut inner = self.inner.borrow_mut();
            let Some(data) = inner.nodes.get_mut(node.0).and_then(Option::as_mut) else {
                return;
            };
            data.parent.take()
        };
        if let Some(parent) = parent {
            let mut inner = self.inner.borrow_mut();
            if let Some(data) = inner.nodes[parent.0].as_mut() {
                data.children.retain(|c| *c != node);
            }
        }
        self.set_connected(node, false);
    }

    fn set_connected(&self, node: NodeId, connected: bool) {
        for id in self.collect_subtree(node) {
            let mut inner = self.inner.borrow_mut();
            if let Some(data) = inner.nodes[id.0].as_mut() {
                data.flags.set(NodeFlags::CONNECTED, connected);
            }
        }
    }

    pub fn is_connected(&self, node: NodeId) -> bool {
        self.flags(node).contains(NodeFlags::CONNECTED)
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.inner.borrow().nodes.get(node.0)?.as_ref()?.parent
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.inner
            .borrow()
            .nodes
            .get(node.0)
            .and_then(Option::as_ref)
            .map(|data| data.children.clone())
            .unwrap_or_default()
    }

    /// The subtree rooted at `node`, pre-order, including `node` itself.
    pub fn collect_subtree(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if !self.contains(id) {
                continue;
            }
            out.push(id);
            let children = self.children(id);
            for child in children.into_iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// Descendants of `node`, pre-order, excluding `node` itself.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut subtree = self.collect_subtree(node);
        if !subtree.is_empty() {
            subtree.remove(0);
        }
        subtree
    }

    // -------------------------------------------------------------------------
    // Node content
    // -------------------------------------------------------------------------

    /// Element tag, lowercase. `None` for text nodes and dead ids.
    pub fn tag(&self, node: NodeId) -> Option<String> {
        match &self.inner.borrow().nodes.get(node.0)?.as_ref()?.kind {
            NodeKind::Element { tag } => Some(tag.clone()),
            NodeKind::Text { .. } => None,
        }
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        self.tag(node).is_some()
    }

    /// Text of a text node.
    pub fn text(&self, node: NodeId) -> Option<String> {
        match &self.inner.borrow().nodes.get(node.0)?.as_ref()?.kind {
            NodeKind::Text { text } => Some(text.clone()),
            NodeKind::Element { .. } => None,
        }
    }

    pub fn set_text(&self, node: NodeId, text: impl Into<String>) {
        let mut inner = self.inner.borrow_mut();
        if let Some(data) = inner.nodes.get_mut(node.0).and_then(Option::as_mut) {
            if let NodeKind::Text { text: t } = &mut data.kind {
                *t = text.into();
            }
        }
    }

    /// Concatenated text of the subtree (elements contribute their text
    /// descendants, text nodes contribute themselves).
    pub fn text_content(&self, node: NodeId) -> String {
        self.collect_subtree(node)
            .into_iter()
            .filter_map(|id| self.text(id))
            .collect()
    }

    /// Replace an element's children with text, removing the old subtree.
    pub fn set_text_content(&self, node: NodeId, text: impl Into<String>) {
        for child in self.children(node) {
            self.remove(child);
        }
        let text_node = self.create_text(text);
        self.append_child(node, text_node);
    }

    // -------------------------------------------------------------------------
    // Attributes
    // -------------------------------------------------------------------------

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.inner
            .borrow()
            .nodes
            .get(node.0)?
            .as_ref()?
            .attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    pub fn set_attribute(&self, node: NodeId, name: impl Into<String>, value: impl Into<String>) {
        let (name, value) = (name.into(), value.into());
        let mut inner = self.inner.borrow_mut();
        let Some(data) = inner.nodes.get_mut(node.0).and_then(Option::as_mut) else {
            return;
        };
        match data.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => data.attributes.push((name, value)),
        }
    }

    pub fn remove_attribute(&self, node: NodeId, name: &str) {
        let mut inner = self.inner.borrow_mut();
        if let Some(data) = inner.nodes.get_mut(node.0).and_then(Option::as_mut) {
            data.attributes.retain(|(n, _)| n != name);
        }
    }

    /// Attribute pairs in insertion order.
    pub fn attributes(&self, node: NodeId) -> Vec<(String, String)> {
        self.inner
            .borrow()
            .nodes
            .get(node.0)
            .and_then(Option::as_ref)
            .map(|data| data.attributes.clone())
            .unwrap_or_default()
    }

    // -------------------------------------------------------------------------
    // Class helpers
    // -------------------------------------------------------------------------

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.attribute(node, "class")
            .map(|v| v.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn add_class(&self, node: NodeId, class: &str) {
        if self.has_class(node, class) {
            return;
        }
        let current = self.attribute(node, "class").unwrap_or_default();
        let joined = if current.is_empty() {
            class.to_string()
        } else {
            format!("{current} {class}")
        };
        self.set_attribute(node, "class", joined);
    }

    pub fn remove_class(&self, node: NodeId, class: &str) {
        let Some(current) = self.attribute(node, "class") else { return };
        let remaining: Vec<&str> = current.split_whitespace().filter(|c| *c != class).collect();
        self.set_attribute(node, "class", remaining.join(" "));
    }

    pub fn toggle_class(&self, node: NodeId, class: &str, on: bool) {
        if on {
            self.add_class(node, class);
        } else {
            self.remove_class(node, class);
        }
    }

    // -------------------------------------------------------------------------
    // Flags
    // -------------------------------------------------------------------------

    pub fn flags(&self, node: NodeId) -> NodeFlags {
        self.inner
            .borrow()
            .nodes
            .get(node.0)
            .and_then(Option::as_ref)
            .map(|data| data.flags)
            .unwrap_or_default()
    }

    pub fn set_hidden(&self, node: NodeId, hidden: bool) {
        let mut inner = self.inner.borrow_mut();
        if let Some(data) = inner.nodes.get_mut(node.0).and_then(Option::as_mut) {
            data.flags.set(NodeFlags::HIDDEN, hidden);
        }
    }

    pub fn is_hidden(&self, node: NodeId) -> bool {
        self.flags(node).contains(NodeFlags::HIDDEN)
    }

    // -------------------------------------------------------------------------
    // Events
    // -------------------------------------------------------------------------

    /// Attach a listener for `event` on `node`.
    pub fn add_listener(
        &self,
        node: NodeId,
        event: impl Into<String>,
        handler: EventHandler,
    ) -> ListenerId {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_listener_id;
        inner.next_listener_id += 1;
        if let Some(data) = inner.nodes.get_mut(node.0).and_then(Option::as_mut) {
            data.listeners.push(ListenerEntry { id, event: event.into(), handler });
        }
        ListenerId(id)
    }

    pub fn remove_listener(&self, node: NodeId, listener: ListenerId) {
        let mut inner = self.inner.borrow_mut();
        if let Some(data) = inner.nodes.get_mut(node.0).and_then(Option::as_mut) {
            data.listeners.retain(|entry| entry.id != listener.0);
        }
    }

    pub fn listener_count(&self, node: NodeId) -> usize {
        self.inner
            .borrow()
            .nodes
            .get(node.0)
            .and_then(Option::as_ref)
            .map(|data| data.listeners.len())
            .unwrap_or(0)
    }

    /// Dispatch an event: listeners on the target fire first, then each
    /// ancestor's, root-most last. Returns how many handlers ran.
    ///
    /// The handler list is snapshotted up front, so handlers may mutate the
    /// tree (including removing listeners) without re-entrancy issues.
    pub fn dispatch(&self, event: &Event) -> usize {
        let mut handlers: Vec<EventHandler> = Vec::new();
        {
            let inner = self.inner.borrow();
            let mut current = Some(event.target);
            while let Some(id) = current {
                let Some(data) = inner.nodes.get(id.0).and_then(Option::as_ref) else { break };
                for entry in &data.listeners {
                    if entry.event == event.name {
                        handlers.push(Rc::clone(&entry.handler));
                    }
                }
                current = data.parent;
            }
        }
        for handler in &handlers {
            handler(event);
        }
        handlers.len()
    }

    // -------------------------------------------------------------------------
    // Fragment instantiation
    // -------------------------------------------------------------------------

    fn instantiate(&self, template: &TemplateNode) -> NodeId {
        match template {
            TemplateNode::Text(text) => self.create_text(text.clone()),
            TemplateNode::Element { tag, attributes, children } => {
                let node = self.create_element(tag.clone());
                for (name, value) in attributes {
                    self.set_attribute(node, name.clone(), value.clone());
                }
                for child in children {
                    let child_node = self.instantiate(child);
                    self.append_child(node, child_node);
                }
                node
            }
        }
    }

    /// Instantiate a fragment and append its roots under `parent`.
    pub fn append_fragment(&self, parent: NodeId, fragment: &Fragment) -> Vec<NodeId> {
        fragment
            .nodes
            .iter()
            .map(|template| {
                let node = self.instantiate(template);
                self.append_child(parent, node);
                node
            })
            .collect()
    }

    /// Wholesale content replacement: remove `parent`'s current children,
    /// then instantiate the fragment in their place.
    pub fn replace_children(&self, parent: NodeId, fragment: &Fragment) -> Vec<NodeId> {
        for child in self.children(parent) {
            self.remove(child);
        }
        self.append_fragment(parent, fragment)
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// First descendant of `root` matching a simple selector
    /// (`tag`, `#id`, `.class`, or a compound like `li.item`).
    pub fn query(&self, root: NodeId, selector: &str) -> Option<NodeId> {
        let selector = Selector::parse(selector);
        self.descendants(root)
            .into_iter()
            .find(|node| selector.matches(self, *node))
    }

    /// Every descendant of `root` matching the selector, pre-order.
    pub fn query_all(&self, root: NodeId, selector: &str) -> Vec<NodeId> {
        let selector = Selector::parse(selector);
        self.descendants(root)
            .into_iter()
            .filter(|node| selector.matches(self, *node))
            .collect()
    }

    // -------------------------------------------------------------------------
    // Serialization
    // -------------------------------------------------------------------------

    /// Serialize a subtree to markup, escaping text and attribute values.
    pub fn to_markup(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_markup(node, &mut out);
        out
    }

    fn write_markup(&self, node: NodeId, out: &mut String) {
        if let Some(text) = self.text(node) {
            out.push_str(&escape(&text));
            return;
        }
        let Some(tag) = self.tag(node) else { return };
        out.push('<');
        out.push_str(&tag);
        for (name, value) in self.attributes(node) {
            out.push(' ');
            out.push_str(&name);
            if !value.is_empty() {
                out.push_str("=\"");
                out.push_str(&escape(&value));
                out.push('"');
            }
        }
        out.push('>');
        for child in self.children(node) {
            self.write_markup(child, out);
        }
        out.push_str("</");
        out.push_str(&tag);
        out.push('>');
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
