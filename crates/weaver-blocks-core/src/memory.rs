//! In-memory [`Dom`] implementation.
//!
//! Keeps an arena of nodes behind a shared handle so clones observe the same
//! tree, like browser node handles do. Every structural, text and attribute
//! change is appended to a mutation log that callers drain with
//! [`MemoryDom::take_mutations`], standing in for a `MutationObserver`.

use std::cell::RefCell;
use std::fmt::Write as _;
use std::rc::Rc;

use smol_str::SmolStr;

use crate::platform::{Dom, DomRange, MutationRecord, PlatformError};

/// Handle to a node in a [`MemoryDom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
enum NodeKind {
    Element(SmolStr),
    Text,
    Fragment,
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: Vec<(SmolStr, String)>,
    text: String,
    value: String,
}

#[derive(Debug, Default)]
struct DomState {
    nodes: Vec<NodeData>,
    selection: Option<DomRange<NodeId>>,
    active: Option<NodeId>,
    mutations: Vec<MutationRecord<NodeId>>,
}

impl DomState {
    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
            attributes: Vec::new(),
            text: String::new(),
            value: String::new(),
        });
        id
    }

    fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.0]
    }

    fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.node(child).parent else {
            return;
        };
        self.node_mut(parent).children.retain(|c| *c != child);
        self.node_mut(child).parent = None;
        self.mutations
            .push(MutationRecord::child_list(parent, Vec::new(), vec![child]));
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.node(n).parent;
        }
        false
    }

    fn insert(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), PlatformError> {
        if matches!(self.node(parent).kind, NodeKind::Text) {
            return Err("text nodes cannot have children".into());
        }
        if let NodeKind::Fragment = self.node(child).kind {
            let moved = self.node(child).children.clone();
            for node in moved {
                self.insert(parent, node, reference)?;
            }
            return Ok(());
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err("hierarchy request error: node would contain itself".into());
        }
        if reference == Some(child) {
            return Ok(());
        }
        self.detach(child);
        let index = match reference {
            Some(r) => self
                .node(parent)
                .children
                .iter()
                .position(|c| *c == r)
                .ok_or("reference node is not a child of parent")?,
            None => self.node(parent).children.len(),
        };
        self.node_mut(parent).children.insert(index, child);
        self.node_mut(child).parent = Some(parent);
        self.mutations
            .push(MutationRecord::child_list(parent, vec![child], Vec::new()));
        Ok(())
    }

    fn text_content(&self, id: NodeId) -> String {
        let node = self.node(id);
        match node.kind {
            NodeKind::Text => node.text.clone(),
            _ => node
                .children
                .iter()
                .map(|c| self.text_content(*c))
                .collect(),
        }
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        let node = self.node(id);
        match &node.kind {
            NodeKind::Text => out.push_str(&escape(&node.text, false)),
            NodeKind::Fragment => {
                for child in &node.children {
                    self.write_html(*child, out);
                }
            }
            NodeKind::Element(tag) => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in &node.attributes {
                    let _ = write!(out, " {}=\"{}\"", name, escape(value, true));
                }
                out.push('>');
                if is_void(tag) {
                    return;
                }
                for child in &node.children {
                    self.write_html(*child, out);
                }
                let _ = write!(out, "</{}>", tag);
            }
        }
    }
}

fn is_void(tag: &str) -> bool {
    matches!(
        tag,
        "area" | "br" | "col" | "embed" | "hr" | "img" | "input" | "link" | "meta" | "source" | "wbr"
    )
}

fn escape(text: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

/// A document tree held in memory.
///
/// Created with a `<body>` root. Text offsets count `char`s.
#[derive(Clone, Debug)]
pub struct MemoryDom {
    state: Rc<RefCell<DomState>>,
    body: NodeId,
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDom {
    pub fn new() -> Self {
        let mut state = DomState::default();
        let body = state.alloc(NodeKind::Element(SmolStr::new_static("body")));
        Self {
            state: Rc::new(RefCell::new(state)),
            body,
        }
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Create an element with attributes and children in one call.
    pub fn build(
        &self,
        tag: &str,
        attributes: &[(&str, &str)],
        children: &[NodeId],
    ) -> Result<NodeId, PlatformError> {
        let element = self.create_element(tag)?;
        for (name, value) in attributes {
            self.set_attribute(&element, name, value)?;
        }
        for child in children {
            self.append_child(&element, child)?;
        }
        Ok(element)
    }

    /// Serialize a subtree to HTML. Attributes keep insertion order.
    pub fn to_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.state.borrow().write_html(node, &mut out);
        out
    }

    /// Inner HTML of an element.
    pub fn inner_html(&self, node: NodeId) -> String {
        let state = self.state.borrow();
        let mut out = String::new();
        for child in &state.node(node).children {
            state.write_html(*child, &mut out);
        }
        out
    }

    /// Drain the mutation log.
    pub fn take_mutations(&self) -> Vec<MutationRecord<NodeId>> {
        std::mem::take(&mut self.state.borrow_mut().mutations)
    }

    /// Select a whole text node, or place a caret inside one.
    pub fn select_text(&self, node: NodeId, start: usize, end: usize) {
        self.state.borrow_mut().selection = Some(DomRange::new(node, start, node, end));
    }
}

impl Dom for MemoryDom {
    type Node = NodeId;

    fn create_element(&self, tag: &str) -> Result<NodeId, PlatformError> {
        if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(format!("invalid tag name `{}`", tag).into());
        }
        let tag = SmolStr::new(tag.to_ascii_lowercase());
        Ok(self.state.borrow_mut().alloc(NodeKind::Element(tag)))
    }

    fn create_text(&self, text: &str) -> NodeId {
        let mut state = self.state.borrow_mut();
        let id = state.alloc(NodeKind::Text);
        state.node_mut(id).text = text.to_string();
        id
    }

    fn create_fragment(&self) -> NodeId {
        self.state.borrow_mut().alloc(NodeKind::Fragment)
    }

    fn append_child(&self, parent: &NodeId, child: &NodeId) -> Result<(), PlatformError> {
        self.state.borrow_mut().insert(*parent, *child, None)
    }

    fn insert_before(
        &self,
        parent: &NodeId,
        child: &NodeId,
        reference: Option<&NodeId>,
    ) -> Result<(), PlatformError> {
        self.state
            .borrow_mut()
            .insert(*parent, *child, reference.copied())
    }

    fn remove(&self, node: &NodeId) {
        self.state.borrow_mut().detach(*node);
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.state.borrow().node(*node).parent
    }

    fn children(&self, node: &NodeId) -> Vec<NodeId> {
        self.state.borrow().node(*node).children.clone()
    }

    fn is_element(&self, node: &NodeId) -> bool {
        matches!(self.state.borrow().node(*node).kind, NodeKind::Element(_))
    }

    fn is_text(&self, node: &NodeId) -> bool {
        matches!(self.state.borrow().node(*node).kind, NodeKind::Text)
    }

    fn tag_name(&self, node: &NodeId) -> Option<String> {
        match &self.state.borrow().node(*node).kind {
            NodeKind::Element(tag) => Some(tag.to_ascii_uppercase()),
            _ => None,
        }
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.state
            .borrow()
            .node(*node)
            .attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    fn set_attribute(&self, node: &NodeId, name: &str, value: &str) -> Result<(), PlatformError> {
        let mut state = self.state.borrow_mut();
        if !matches!(state.node(*node).kind, NodeKind::Element(_)) {
            return Err("attributes can only be set on elements".into());
        }
        let attributes = &mut state.node_mut(*node).attributes;
        match attributes.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => attributes.push((SmolStr::new(name), value.to_string())),
        }
        state.mutations.push(MutationRecord::attributes(*node));
        Ok(())
    }

    fn remove_attribute(&self, node: &NodeId, name: &str) {
        let mut state = self.state.borrow_mut();
        let before = state.node(*node).attributes.len();
        state.node_mut(*node).attributes.retain(|(n, _)| n != name);
        if state.node(*node).attributes.len() != before {
            state.mutations.push(MutationRecord::attributes(*node));
        }
    }

    fn text_content(&self, node: &NodeId) -> String {
        self.state.borrow().text_content(*node)
    }

    fn set_text_content(&self, node: &NodeId, text: &str) {
        if self.is_text(node) {
            let mut state = self.state.borrow_mut();
            state.node_mut(*node).text = text.to_string();
            state.mutations.push(MutationRecord::character_data(*node));
            return;
        }
        for child in self.children(node) {
            self.remove(&child);
        }
        if !text.is_empty() {
            let text = self.create_text(text);
            if let Err(e) = self.append_child(node, &text) {
                tracing::warn!(target: "weaver::dom", error = %e, "set_text_content failed");
            }
        }
    }

    fn split_text(&self, node: &NodeId, offset: usize) -> Result<NodeId, PlatformError> {
        if !self.is_text(node) {
            return Err("split_text on a non-text node".into());
        }
        let full = self.text_content(node);
        let len = full.chars().count();
        if offset > len {
            return Err(format!("split offset {} > text length {}", offset, len).into());
        }
        let byte = full
            .char_indices()
            .nth(offset)
            .map(|(i, _)| i)
            .unwrap_or(full.len());
        let (head, tail) = full.split_at(byte);
        let tail_node = self.create_text(tail);
        self.set_text_content(node, head);
        if let Some(parent) = self.parent(node) {
            let next = self
                .index_in_parent(node)
                .and_then(|i| self.children(&parent).get(i + 1).copied());
            self.insert_before(&parent, &tail_node, next.as_ref())?;
        }
        Ok(tail_node)
    }

    fn input_value(&self, node: &NodeId) -> Option<String> {
        if !self.is_native_input(node) {
            return None;
        }
        Some(self.state.borrow().node(*node).value.clone())
    }

    fn set_input_value(&self, node: &NodeId, value: &str) {
        if self.is_native_input(node) {
            self.state.borrow_mut().node_mut(*node).value = value.to_string();
        }
    }

    fn selection(&self) -> Option<DomRange<NodeId>> {
        self.state.borrow().selection.clone()
    }

    fn set_selection(&self, range: Option<&DomRange<NodeId>>) -> Result<(), PlatformError> {
        self.state.borrow_mut().selection = range.cloned();
        Ok(())
    }

    fn active_element(&self) -> Option<NodeId> {
        self.state.borrow().active
    }

    /// Focusing a native input moves the document selection into the
    /// control, which is modelled as clearing it.
    fn focus(&self, node: &NodeId) {
        let native = self.is_native_input(node);
        let mut state = self.state.borrow_mut();
        state.active = Some(*node);
        if native {
            state.selection = None;
        }
    }
}
