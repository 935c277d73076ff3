//! Rich-text formatting over ranges.
//!
//! Inline tools never touch formatting markup directly; they go through a
//! [`TextFormatter`]. The browser crate provides an adapter over the native
//! editing commands, [`StructuralFormatter`] edits the tree itself and works
//! with any [`Dom`].

use crate::platform::{Dom, DomRange, PlatformError, TextSegment};

/// A formatting style an inline tool can apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextStyle {
    Underline,
    Strikethrough,
    Link { href: String },
}

impl TextStyle {
    /// Tag used when the style is applied.
    pub fn tag(&self) -> &'static str {
        match self {
            TextStyle::Underline => "u",
            TextStyle::Strikethrough => "s",
            TextStyle::Link { .. } => "a",
        }
    }

    /// Whether an element with this (upper-case) tag carries the style.
    pub fn matches_tag(&self, tag: &str) -> bool {
        match self {
            TextStyle::Underline => tag == "U",
            TextStyle::Strikethrough => matches!(tag, "S" | "STRIKE" | "DEL"),
            TextStyle::Link { .. } => tag == "A",
        }
    }

    /// Name of the native editing command applying this style.
    pub fn command(&self) -> &'static str {
        match self {
            TextStyle::Underline => "underline",
            TextStyle::Strikethrough => "strikeThrough",
            TextStyle::Link { .. } => "createLink",
        }
    }
}

/// Applies, removes and queries formatting on ranges.
pub trait TextFormatter<D: Dom> {
    fn apply(&self, range: &DomRange<D::Node>, style: &TextStyle) -> Result<(), PlatformError>;
    fn remove(&self, range: &DomRange<D::Node>, style: &TextStyle) -> Result<(), PlatformError>;
    fn is_active(&self, selection: Option<&DomRange<D::Node>>, style: &TextStyle) -> bool;
}

/// Formatter that wraps and unwraps text by editing the tree.
///
/// Applying wraps every text segment in the range in its own element and
/// selects the result. Removing unwraps every matching element that
/// intersects the range, including ones extending past it.
#[derive(Clone)]
pub struct StructuralFormatter<D: Dom> {
    dom: D,
}

impl<D: Dom> StructuralFormatter<D> {
    pub fn new(dom: D) -> Self {
        Self { dom }
    }

    fn select_segments(&self, segments: &[TextSegment<D::Node>]) -> Result<(), PlatformError> {
        let (Some(first), Some(last)) = (segments.first(), segments.last()) else {
            return Ok(());
        };
        let range = DomRange::new(
            first.node.clone(),
            first.start,
            last.node.clone(),
            last.end,
        );
        self.dom.set_selection(Some(&range))
    }

    fn intersects(&self, range: &DomRange<D::Node>, node: &D::Node) -> bool {
        use std::cmp::Ordering;
        use crate::platform::Boundary;

        let (Some(parent), Some(index)) = (self.dom.parent(node), self.dom.index_in_parent(node))
        else {
            return false;
        };
        let before = Boundary::new(parent.clone(), index);
        let after = Boundary::new(parent, index + 1);
        self.dom.compare_boundaries(&range.start, &after) == Ordering::Less
            && self.dom.compare_boundaries(&range.end, &before) == Ordering::Greater
    }

    fn matching_elements(&self, range: &DomRange<D::Node>, style: &TextStyle) -> Vec<D::Node> {
        let matches = |n: &D::Node| {
            self.dom
                .tag_name(n)
                .is_some_and(|tag| style.matches_tag(&tag))
        };
        let mut found: Vec<D::Node> = Vec::new();
        for end in [&range.start.node, &range.end.node] {
            if let Some(el) = self.dom.closest(end, matches) {
                if !found.contains(&el) {
                    found.push(el);
                }
            }
        }
        let root = self.dom.common_ancestor(range);
        for node in self.dom.descendants(&root) {
            if matches(&node) && !found.contains(&node) && self.intersects(range, &node) {
                found.push(node);
            }
        }
        found
    }
}

impl<D: Dom> TextFormatter<D> for StructuralFormatter<D> {
    fn apply(&self, range: &DomRange<D::Node>, style: &TextStyle) -> Result<(), PlatformError> {
        let segments = self.dom.text_segments(range);
        // Links replace links instead of nesting.
        if let TextStyle::Link { .. } = style {
            for anchor in self.matching_elements(range, style) {
                self.dom.unwrap(&anchor)?;
            }
        }
        let mut wrapped = Vec::with_capacity(segments.len());
        for segment in &segments {
            let text = self.dom.isolate_segment(segment)?;
            let wrapper = self.dom.create_element(style.tag())?;
            if let TextStyle::Link { href } = style {
                self.dom.set_attribute(&wrapper, "href", href)?;
            }
            self.dom.wrap(&text, &wrapper)?;
            let len = self.dom.text_length(&text);
            wrapped.push(TextSegment {
                node: text,
                start: 0,
                end: len,
            });
        }
        tracing::trace!(
            target: "weaver::format",
            style = style.tag(),
            segments = wrapped.len(),
            "applied style"
        );
        self.select_segments(&wrapped)
    }

    fn remove(&self, range: &DomRange<D::Node>, style: &TextStyle) -> Result<(), PlatformError> {
        let segments = self.dom.text_segments(range);
        let elements = self.matching_elements(range, style);
        for element in &elements {
            self.dom.unwrap(element)?;
        }
        tracing::trace!(
            target: "weaver::format",
            style = style.tag(),
            removed = elements.len(),
            "removed style"
        );
        self.select_segments(&segments)
    }

    fn is_active(&self, selection: Option<&DomRange<D::Node>>, style: &TextStyle) -> bool {
        let Some(range) = selection else {
            return false;
        };
        self.dom
            .closest(&range.start.node, |n| {
                self.dom
                    .tag_name(n)
                    .is_some_and(|tag| style.matches_tag(&tag))
            })
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryDom, NodeId};

    fn setup(text: &str) -> (MemoryDom, NodeId, NodeId) {
        let dom = MemoryDom::new();
        let t = dom.create_text(text);
        let p = dom.build("p", &[], &[t]).unwrap();
        dom.append_child(&dom.body(), &p).unwrap();
        (dom, p, t)
    }

    #[test]
    fn test_apply_wraps_middle_of_text() {
        let (dom, p, t) = setup("hello world");
        let f = StructuralFormatter::new(dom.clone());
        f.apply(&DomRange::new(t, 6, t, 11), &TextStyle::Strikethrough)
            .unwrap();
        assert_eq!(dom.inner_html(p), "hello <s>world</s>");
        let sel = dom.selection().unwrap();
        assert_eq!(dom.text_content(&sel.start.node), "world");
        assert!(f.is_active(Some(&sel), &TextStyle::Strikethrough));
        assert!(!f.is_active(Some(&sel), &TextStyle::Underline));
    }

    #[test]
    fn test_apply_link_sets_href() {
        let (dom, p, t) = setup("go here now");
        let f = StructuralFormatter::new(dom.clone());
        let style = TextStyle::Link {
            href: "https://example.com".into(),
        };
        f.apply(&DomRange::new(t, 3, t, 7), &style).unwrap();
        assert_eq!(
            dom.inner_html(p),
            r#"go <a href="https://example.com">here</a> now"#
        );
    }

    #[test]
    fn test_link_over_link_replaces_href() {
        let (dom, p, t) = setup("go here now");
        let f = StructuralFormatter::new(dom.clone());
        let old = TextStyle::Link {
            href: "https://old.example".into(),
        };
        f.apply(&DomRange::new(t, 3, t, 7), &old).unwrap();
        let anchor = dom.children(&p)[1];
        let count = dom.children(&anchor).len();
        let new = TextStyle::Link {
            href: "https://new.example".into(),
        };
        f.apply(&DomRange::new(anchor, 0, anchor, count), &new).unwrap();
        assert_eq!(
            dom.inner_html(p),
            r#"go <a href="https://new.example">here</a> now"#
        );
    }

    #[test]
    fn test_remove_unwraps_whole_element() {
        let (dom, p, t) = setup("a b c");
        let f = StructuralFormatter::new(dom.clone());
        f.apply(&DomRange::new(t, 0, t, 5), &TextStyle::Underline)
            .unwrap();
        assert_eq!(dom.inner_html(p), "<u>a b c</u>");

        // Caret inside the underline removes all of it.
        let inner = dom.children(&dom.children(&p)[0])[0];
        f.remove(&DomRange::caret(inner, 2), &TextStyle::Underline)
            .unwrap();
        assert_eq!(dom.inner_html(p), "a b c");
    }

    #[test]
    fn test_remove_without_match_is_noop() {
        let (dom, p, t) = setup("plain");
        let f = StructuralFormatter::new(dom.clone());
        f.remove(&DomRange::new(t, 0, t, 5), &TextStyle::Link { href: String::new() })
            .unwrap();
        assert_eq!(dom.inner_html(p), "plain");
    }

    #[test]
    fn test_is_active_without_selection() {
        let (dom, _, _) = setup("x");
        let f = StructuralFormatter::new(dom);
        assert!(!f.is_active(None, &TextStyle::Underline));
    }
}
