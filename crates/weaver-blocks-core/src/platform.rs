//! Platform abstraction traits for DOM access.
//!
//! [`Dom`] is the interface between block logic and a concrete document tree.
//! The browser implementation wraps `web-sys` handles, [`MemoryDom`] keeps the
//! tree in memory for headless use and tests. Block, selection and inline tool
//! logic is written once against this trait.
//!
//! [`MemoryDom`]: crate::MemoryDom

use std::cmp::Ordering;
use std::fmt;

/// Attribute marking editor-internal decoration that change detection ignores.
pub const MUTATION_FREE_ATTR: &str = "data-mutation-free";

/// Error type for platform operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformError(pub String);

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for PlatformError {}

impl From<&str> for PlatformError {
    fn from(s: &str) -> Self {
        PlatformError(s.to_string())
    }
}

impl From<String> for PlatformError {
    fn from(s: String) -> Self {
        PlatformError(s)
    }
}

/// One end of a [`DomRange`].
///
/// For text nodes `offset` counts characters in the platform's text unit
/// (UTF-16 code units in browsers), for elements it counts children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boundary<N> {
    pub node: N,
    pub offset: usize,
}

impl<N> Boundary<N> {
    pub fn new(node: N, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// A range between two boundary points, start before end in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomRange<N> {
    pub start: Boundary<N>,
    pub end: Boundary<N>,
}

impl<N: Clone + PartialEq> DomRange<N> {
    pub fn new(start_node: N, start_offset: usize, end_node: N, end_offset: usize) -> Self {
        Self {
            start: Boundary::new(start_node, start_offset),
            end: Boundary::new(end_node, end_offset),
        }
    }

    /// A collapsed range (caret) at the given position.
    pub fn caret(node: N, offset: usize) -> Self {
        Self::new(node.clone(), offset, node, offset)
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// Collapse onto the end boundary.
    pub fn collapsed_to_end(&self) -> Self {
        Self {
            start: self.end.clone(),
            end: self.end.clone(),
        }
    }
}

/// The kind of change a [`MutationRecord`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    ChildList,
    CharacterData,
    Attributes,
}

/// A single observed DOM change, mirroring the browser `MutationRecord`.
#[derive(Debug, Clone)]
pub struct MutationRecord<N> {
    pub kind: MutationKind,
    pub target: N,
    pub added: Vec<N>,
    pub removed: Vec<N>,
}

impl<N> MutationRecord<N> {
    pub fn child_list(target: N, added: Vec<N>, removed: Vec<N>) -> Self {
        Self {
            kind: MutationKind::ChildList,
            target,
            added,
            removed,
        }
    }

    pub fn character_data(target: N) -> Self {
        Self {
            kind: MutationKind::CharacterData,
            target,
            added: Vec::new(),
            removed: Vec::new(),
        }
    }

    pub fn attributes(target: N) -> Self {
        Self {
            kind: MutationKind::Attributes,
            target,
            added: Vec::new(),
            removed: Vec::new(),
        }
    }
}

/// The part of one text node covered by a range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSegment<N> {
    pub node: N,
    pub start: usize,
    pub end: usize,
}

/// Document tree, selection and focus access.
///
/// Node handles are cheap to clone and compare by identity. Required methods
/// map one-to-one onto DOM primitives; the provided methods build the tree
/// walks the editor needs on top of them.
pub trait Dom: Clone + 'static {
    type Node: Clone + PartialEq + fmt::Debug + 'static;

    fn create_element(&self, tag: &str) -> Result<Self::Node, PlatformError>;
    fn create_text(&self, text: &str) -> Self::Node;
    fn create_fragment(&self) -> Self::Node;

    /// Append `child`, detaching it from its current parent first.
    /// Appending a fragment moves the fragment's children.
    fn append_child(&self, parent: &Self::Node, child: &Self::Node) -> Result<(), PlatformError>;

    /// Insert `child` before `reference`, or append when `reference` is `None`.
    fn insert_before(
        &self,
        parent: &Self::Node,
        child: &Self::Node,
        reference: Option<&Self::Node>,
    ) -> Result<(), PlatformError>;

    /// Detach a node from its parent. No-op for detached nodes.
    fn remove(&self, node: &Self::Node);

    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;
    fn children(&self, node: &Self::Node) -> Vec<Self::Node>;

    fn is_element(&self, node: &Self::Node) -> bool;
    fn is_text(&self, node: &Self::Node) -> bool;

    /// Upper-case tag name for elements, `None` otherwise.
    fn tag_name(&self, node: &Self::Node) -> Option<String>;

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;
    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str)
    -> Result<(), PlatformError>;
    fn remove_attribute(&self, node: &Self::Node, name: &str);

    fn text_content(&self, node: &Self::Node) -> String;
    fn set_text_content(&self, node: &Self::Node, text: &str);

    /// Split a text node at `offset`, returning the new node holding the tail.
    fn split_text(&self, node: &Self::Node, offset: usize) -> Result<Self::Node, PlatformError>;

    /// Value of a native `<input>`/`<textarea>`, `None` for other nodes.
    fn input_value(&self, node: &Self::Node) -> Option<String>;
    fn set_input_value(&self, node: &Self::Node, value: &str);

    /// The live document selection.
    fn selection(&self) -> Option<DomRange<Self::Node>>;

    /// Replace the live selection, or clear it with `None`.
    fn set_selection(&self, range: Option<&DomRange<Self::Node>>) -> Result<(), PlatformError>;

    fn active_element(&self) -> Option<Self::Node>;
    fn focus(&self, node: &Self::Node);

    /// Length of a text node in boundary offset units.
    fn text_length(&self, node: &Self::Node) -> usize {
        self.text_content(node).chars().count()
    }

    fn has_class(&self, node: &Self::Node, class: &str) -> bool {
        self.attribute(node, "class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    fn add_class(&self, node: &Self::Node, class: &str) {
        self.toggle_class(node, class, true);
    }

    fn remove_class(&self, node: &Self::Node, class: &str) {
        self.toggle_class(node, class, false);
    }

    /// Add or remove a class so that its presence matches `on`.
    fn toggle_class(&self, node: &Self::Node, class: &str, on: bool) {
        if self.has_class(node, class) == on {
            return;
        }
        let current = self.attribute(node, "class").unwrap_or_default();
        let mut classes: Vec<&str> = current
            .split_whitespace()
            .filter(|c| *c != class)
            .collect();
        if on {
            classes.push(class);
        }
        if let Err(e) = self.set_attribute(node, "class", &classes.join(" ")) {
            tracing::warn!(target: "weaver::dom", class, error = %e, "toggle_class failed");
        }
    }

    /// Inclusive containment: a node contains itself.
    fn contains(&self, ancestor: &Self::Node, node: &Self::Node) -> bool {
        let mut current = Some(node.clone());
        while let Some(n) = current {
            if &n == ancestor {
                return true;
            }
            current = self.parent(&n);
        }
        false
    }

    /// Nearest inclusive ancestor satisfying `pred`.
    fn closest(
        &self,
        node: &Self::Node,
        pred: impl Fn(&Self::Node) -> bool,
    ) -> Option<Self::Node> {
        let mut current = Some(node.clone());
        while let Some(n) = current {
            if pred(&n) {
                return Some(n);
            }
            current = self.parent(&n);
        }
        None
    }

    /// Nearest inclusive ancestor element with the given tag (case-insensitive).
    fn closest_tag(&self, node: &Self::Node, tag: &str) -> Option<Self::Node> {
        self.closest(node, |n| {
            self.tag_name(n)
                .is_some_and(|t| t.eq_ignore_ascii_case(tag))
        })
    }

    /// All descendants in document order, excluding `root`.
    fn descendants(&self, root: &Self::Node) -> Vec<Self::Node> {
        let mut out = Vec::new();
        let mut stack: Vec<Self::Node> = self.children(root).into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            stack.extend(self.children(&node).into_iter().rev());
            out.push(node);
        }
        out
    }

    /// `<input>` and `<textarea>` elements.
    fn is_native_input(&self, node: &Self::Node) -> bool {
        matches!(self.tag_name(node).as_deref(), Some("INPUT" | "TEXTAREA"))
    }

    fn is_content_editable(&self, node: &Self::Node) -> bool {
        matches!(
            self.attribute(node, "contenteditable").as_deref(),
            Some("true" | "")
        )
    }

    /// Whether the node sits inside editor-internal decoration.
    fn is_mutation_free(&self, node: &Self::Node) -> bool {
        self.closest(node, |n| {
            self.is_element(n)
                && self.attribute(n, MUTATION_FREE_ATTR).as_deref() == Some("true")
        })
        .is_some()
    }

    fn index_in_parent(&self, node: &Self::Node) -> Option<usize> {
        let parent = self.parent(node)?;
        self.children(&parent).iter().position(|c| c == node)
    }

    /// Put `wrapper` where `node` is and move `node` inside it.
    fn wrap(&self, node: &Self::Node, wrapper: &Self::Node) -> Result<(), PlatformError> {
        let parent = self.parent(node).ok_or("cannot wrap a detached node")?;
        self.insert_before(&parent, wrapper, Some(node))?;
        self.append_child(wrapper, node)
    }

    /// Replace an element with its children, returning the moved children.
    fn unwrap(&self, node: &Self::Node) -> Result<Vec<Self::Node>, PlatformError> {
        let parent = self.parent(node).ok_or("cannot unwrap a detached node")?;
        let children = self.children(node);
        for child in &children {
            self.insert_before(&parent, child, Some(node))?;
        }
        self.remove(node);
        Ok(children)
    }

    /// Insert a node at a boundary point, splitting a text node if needed.
    fn insert_at(&self, at: &Boundary<Self::Node>, node: &Self::Node) -> Result<(), PlatformError> {
        if self.is_text(&at.node) {
            let parent = self
                .parent(&at.node)
                .ok_or("cannot insert next to a detached text node")?;
            if at.offset == 0 {
                return self.insert_before(&parent, node, Some(&at.node));
            }
            if at.offset >= self.text_length(&at.node) {
                let next = self
                    .index_in_parent(&at.node)
                    .and_then(|i| self.children(&parent).get(i + 1).cloned());
                return self.insert_before(&parent, node, next.as_ref());
            }
            let tail = self.split_text(&at.node, at.offset)?;
            return self.insert_before(&parent, node, Some(&tail));
        }
        let reference = self.children(&at.node).get(at.offset).cloned();
        self.insert_before(&at.node, node, reference.as_ref())
    }

    /// Child indexes from the tree root down to `node`.
    fn node_path(&self, node: &Self::Node) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = node.clone();
        while let Some(index) = self.index_in_parent(&current) {
            path.push(index);
            match self.parent(&current) {
                Some(parent) => current = parent,
                None => break,
            }
        }
        path.reverse();
        path
    }

    /// Document-order comparison of two boundary points.
    fn compare_boundaries(&self, a: &Boundary<Self::Node>, b: &Boundary<Self::Node>) -> Ordering {
        let mut pa = self.node_path(&a.node);
        pa.push(a.offset);
        let mut pb = self.node_path(&b.node);
        pb.push(b.offset);
        pa.cmp(&pb)
    }

    /// Deepest node containing both ends of the range.
    fn common_ancestor(&self, range: &DomRange<Self::Node>) -> Self::Node {
        let mut current = range.start.node.clone();
        loop {
            if self.contains(&current, &range.end.node) {
                return current;
            }
            match self.parent(&current) {
                Some(parent) => current = parent,
                None => return current,
            }
        }
    }

    /// Text nodes intersecting the range, with the covered offsets, in
    /// document order. Empty intersections are skipped.
    fn text_segments(&self, range: &DomRange<Self::Node>) -> Vec<TextSegment<Self::Node>> {
        let root = self.common_ancestor(range);
        let mut candidates = vec![root.clone()];
        candidates.extend(self.descendants(&root));

        let mut segments = Vec::new();
        for node in candidates.into_iter().filter(|n| self.is_text(n)) {
            let len = self.text_length(&node);
            let node_start = Boundary::new(node.clone(), 0);
            let node_end = Boundary::new(node.clone(), len);
            if self.compare_boundaries(&range.start, &node_end) != Ordering::Less
                || self.compare_boundaries(&range.end, &node_start) != Ordering::Greater
            {
                continue;
            }
            let start = if self.compare_boundaries(&range.start, &node_start) == Ordering::Greater {
                range.start.offset
            } else {
                0
            };
            let end = if self.compare_boundaries(&range.end, &node_end) == Ordering::Less {
                range.end.offset
            } else {
                len
            };
            if start < end {
                segments.push(TextSegment { node, start, end });
            }
        }
        segments
    }

    /// Split text so the segment occupies a whole text node, and return it.
    fn isolate_segment(&self, segment: &TextSegment<Self::Node>) -> Result<Self::Node, PlatformError> {
        if segment.end < self.text_length(&segment.node) {
            self.split_text(&segment.node, segment.end)?;
        }
        if segment.start > 0 {
            return self.split_text(&segment.node, segment.start);
        }
        Ok(segment.node.clone())
    }
}
