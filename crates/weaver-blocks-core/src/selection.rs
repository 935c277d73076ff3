//! Selection capture, restore and visual markers.
//!
//! The document has a single live selection. Anything that moves focus away
//! from the editable content (e.g. into the link input) captures it first and
//! applies it again before editing resumes. [`SelectionSnapshot`] is the
//! captured value; [`SelectionUtils`] adds the fake background marker that
//! keeps the selected text highlighted while the real selection is elsewhere.

use crate::platform::{Boundary, Dom, DomRange, MUTATION_FREE_ATTR, PlatformError};

pub const FAKE_BACKGROUND_CLASS: &str = "codex-editor__fake-background";
pub const FAKE_CURSOR_CLASS: &str = "codex-editor__fake-cursor";

/// How many ancestors `find_parent_tag` inspects by default.
pub const DEFAULT_SEARCH_DEPTH: usize = 10;

/// A captured selection. Must be applied or released.
#[must_use = "a captured selection must be applied or released"]
pub struct SelectionSnapshot<D: Dom> {
    dom: D,
    range: Option<DomRange<D::Node>>,
}

impl<D: Dom> SelectionSnapshot<D> {
    /// Capture the live selection (possibly none).
    pub fn capture(dom: &D) -> Self {
        Self {
            dom: dom.clone(),
            range: dom.selection(),
        }
    }

    pub fn range(&self) -> Option<&DomRange<D::Node>> {
        self.range.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_none()
    }

    /// Make the captured range the live selection. A snapshot of "no
    /// selection" leaves the live selection untouched.
    pub fn apply(self) -> Result<(), PlatformError> {
        match &self.range {
            Some(range) => self.dom.set_selection(Some(range)),
            None => Ok(()),
        }
    }

    /// Discard without touching the live selection.
    pub fn release(self) {}
}

/// Saved selection plus fake background state for one inline tool.
pub struct SelectionUtils<D: Dom> {
    dom: D,
    saved: Option<SelectionSnapshot<D>>,
    fake_background: Vec<D::Node>,
}

impl<D: Dom> SelectionUtils<D> {
    pub fn new(dom: D) -> Self {
        Self {
            dom,
            saved: None,
            fake_background: Vec::new(),
        }
    }

    /// Capture the live selection, replacing any earlier capture.
    pub fn save(&mut self) {
        if let Some(previous) = self.saved.replace(SelectionSnapshot::capture(&self.dom)) {
            previous.release();
        }
    }

    /// Apply and consume the saved selection. No-op if nothing is saved.
    pub fn restore(&mut self) -> Result<(), PlatformError> {
        match self.saved.take() {
            Some(snapshot) => snapshot.apply(),
            None => Ok(()),
        }
    }

    /// Forget the saved selection without applying it.
    pub fn clear_saved(&mut self) {
        if let Some(snapshot) = self.saved.take() {
            snapshot.release();
        }
    }

    pub fn has_saved(&self) -> bool {
        self.saved.is_some()
    }

    pub fn is_fake_background_enabled(&self) -> bool {
        !self.fake_background.is_empty()
    }

    /// Wrap the selected text in highlight spans and select their contents.
    ///
    /// At most one marker is active: calling this again while enabled does
    /// nothing. Spans are flagged mutation-free so change detection skips them.
    pub fn set_fake_background(&mut self) -> Result<(), PlatformError> {
        if self.is_fake_background_enabled() {
            return Ok(());
        }
        let Some(range) = self.dom.selection() else {
            return Ok(());
        };
        let segments = self.dom.text_segments(&range);
        let mut first_last: Option<(D::Node, D::Node)> = None;
        for segment in &segments {
            let text = self.dom.isolate_segment(segment)?;
            let span = self.dom.create_element("span")?;
            self.dom.add_class(&span, FAKE_BACKGROUND_CLASS);
            self.dom.set_attribute(&span, "data-fake-background", "true")?;
            self.dom.set_attribute(&span, MUTATION_FREE_ATTR, "true")?;
            self.dom.wrap(&text, &span)?;
            self.fake_background.push(span);
            first_last = match first_last {
                None => Some((text.clone(), text)),
                Some((first, _)) => Some((first, text)),
            };
        }
        if let Some((first, last)) = first_last {
            let len = self.dom.text_length(&last);
            self.dom
                .set_selection(Some(&DomRange::new(first, 0, last, len)))?;
        }
        tracing::trace!(
            target: "weaver::selection",
            spans = self.fake_background.len(),
            "fake background set"
        );
        Ok(())
    }

    /// Unwrap the highlight spans and select exactly the text they held.
    ///
    /// Spans detached since the marker was set are skipped; every span still
    /// in the document is unwrapped and the selection covers those alone.
    pub fn remove_fake_background(&mut self) -> Result<(), PlatformError> {
        if !self.is_fake_background_enabled() {
            return Ok(());
        }
        let spans = std::mem::take(&mut self.fake_background);
        let mut first: Option<D::Node> = None;
        let mut last: Option<D::Node> = None;
        for span in &spans {
            if self.dom.parent(span).is_none() {
                tracing::warn!(target: "weaver::selection", "fake background span already detached");
                continue;
            }
            let moved = match self.dom.unwrap(span) {
                Ok(moved) => moved,
                Err(e) => {
                    tracing::warn!(target: "weaver::selection", error = %e, "fake background span not unwrapped");
                    continue;
                }
            };
            if first.is_none() {
                first = moved.first().cloned();
            }
            if let Some(node) = moved.last() {
                last = Some(node.clone());
            }
        }
        if let (Some(first), Some(last)) = (first, last) {
            let end = if self.dom.is_text(&last) {
                self.dom.text_length(&last)
            } else {
                self.dom.children(&last).len()
            };
            self.dom
                .set_selection(Some(&DomRange::new(first, 0, last, end)))?;
        }
        tracing::trace!(target: "weaver::selection", spans = spans.len(), "fake background removed");
        Ok(())
    }

    /// Nearest element with `tag` above either end of the live selection,
    /// optionally requiring a class, looking at most `search_depth` levels up.
    pub fn find_parent_tag(
        &self,
        tag: &str,
        class: Option<&str>,
        search_depth: usize,
    ) -> Option<D::Node> {
        let range = self.dom.selection()?;
        for start in [&range.start.node, &range.end.node] {
            let mut current = Some(start.clone());
            let mut depth = search_depth;
            while let Some(node) = current {
                if depth == 0 {
                    break;
                }
                let tag_matches = self
                    .dom
                    .tag_name(&node)
                    .is_some_and(|t| t.eq_ignore_ascii_case(tag));
                if tag_matches && class.is_none_or(|c| self.dom.has_class(&node, c)) {
                    return Some(node);
                }
                current = self.dom.parent(&node);
                depth -= 1;
            }
        }
        None
    }

    /// Select the whole contents of `element`.
    pub fn expand_to_tag(&self, element: &D::Node) -> Result<(), PlatformError> {
        let count = self.dom.children(element).len();
        self.dom.set_selection(Some(&DomRange::new(
            element.clone(),
            0,
            element.clone(),
            count,
        )))
    }

    /// Collapse the live selection onto its end.
    pub fn collapse_to_end(&self) -> Result<(), PlatformError> {
        match self.dom.selection() {
            Some(range) => self.dom.set_selection(Some(&range.collapsed_to_end())),
            None => Ok(()),
        }
    }

    /// Node where the live selection starts.
    pub fn anchor_node(dom: &D) -> Option<D::Node> {
        dom.selection().map(|r| r.start.node)
    }

    pub fn is_range_inside_container(dom: &D, container: &D::Node) -> bool {
        Self::anchor_node(dom).is_some_and(|anchor| dom.contains(container, &anchor))
    }

    /// Insert a caret marker at the start of the live selection.
    pub fn add_fake_cursor(dom: &D) -> Result<(), PlatformError> {
        let Some(range) = dom.selection() else {
            return Ok(());
        };
        let cursor = dom.create_element("span")?;
        dom.add_class(&cursor, FAKE_CURSOR_CLASS);
        dom.set_attribute(&cursor, MUTATION_FREE_ATTR, "true")?;
        dom.insert_at(&Boundary::new(range.start.node, range.start.offset), &cursor)
    }

    pub fn is_fake_cursor_inside_container(dom: &D, container: &D::Node) -> bool {
        dom.descendants(container)
            .iter()
            .any(|n| dom.has_class(n, FAKE_CURSOR_CLASS))
    }

    /// Remove every caret marker under `container`.
    pub fn remove_fake_cursor(dom: &D, container: &D::Node) {
        for node in dom.descendants(container) {
            if dom.has_class(&node, FAKE_CURSOR_CLASS) {
                dom.remove(&node);
            }
        }
    }
}
