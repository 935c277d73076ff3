//! `Dom` over the live browser document.
//!
//! Node handles are `web_sys::Node`, which compare by JS identity. Offsets
//! inside text nodes are UTF-16 code units, matching the Selection API.

use std::cmp::Ordering;

use wasm_bindgen::JsCast;
use weaver_blocks_core::{Boundary, Dom, DomRange, PlatformError};

fn js_err(what: &str, e: wasm_bindgen::JsValue) -> PlatformError {
    PlatformError(format!("{} failed: {:?}", what, e))
}

/// The browser document as a [`Dom`].
#[derive(Clone)]
pub struct BrowserDom {
    document: web_sys::Document,
}

impl BrowserDom {
    /// Wrap the document of the current window.
    pub fn new() -> Result<Self, PlatformError> {
        let document = web_sys::window()
            .ok_or("no window")?
            .document()
            .ok_or("no document")?;
        Ok(Self { document })
    }

    pub fn from_document(document: web_sys::Document) -> Self {
        Self { document }
    }

    pub fn document(&self) -> &web_sys::Document {
        &self.document
    }

    pub fn body(&self) -> Option<web_sys::Node> {
        self.document.body().map(Into::into)
    }

    fn native_selection(&self) -> Option<web_sys::Selection> {
        web_sys::window()?.get_selection().ok().flatten()
    }
}

impl Dom for BrowserDom {
    type Node = web_sys::Node;

    fn create_element(&self, tag: &str) -> Result<web_sys::Node, PlatformError> {
        self.document
            .create_element(tag)
            .map(Into::into)
            .map_err(|e| js_err("create_element", e))
    }

    fn create_text(&self, text: &str) -> web_sys::Node {
        self.document.create_text_node(text).into()
    }

    fn create_fragment(&self) -> web_sys::Node {
        self.document.create_document_fragment().into()
    }

    fn append_child(&self, parent: &web_sys::Node, child: &web_sys::Node) -> Result<(), PlatformError> {
        parent
            .append_child(child)
            .map(|_| ())
            .map_err(|e| js_err("append_child", e))
    }

    fn insert_before(
        &self,
        parent: &web_sys::Node,
        child: &web_sys::Node,
        reference: Option<&web_sys::Node>,
    ) -> Result<(), PlatformError> {
        parent
            .insert_before(child, reference)
            .map(|_| ())
            .map_err(|e| js_err("insert_before", e))
    }

    fn remove(&self, node: &web_sys::Node) {
        if let Some(parent) = node.parent_node() {
            if let Err(e) = parent.remove_child(node) {
                tracing::warn!(target: "weaver::dom", error = ?e, "remove_child failed");
            }
        }
    }

    fn parent(&self, node: &web_sys::Node) -> Option<web_sys::Node> {
        node.parent_node()
    }

    fn children(&self, node: &web_sys::Node) -> Vec<web_sys::Node> {
        let list = node.child_nodes();
        (0..list.length()).filter_map(|i| list.get(i)).collect()
    }

    fn is_element(&self, node: &web_sys::Node) -> bool {
        node.node_type() == web_sys::Node::ELEMENT_NODE
    }

    fn is_text(&self, node: &web_sys::Node) -> bool {
        node.node_type() == web_sys::Node::TEXT_NODE
    }

    fn tag_name(&self, node: &web_sys::Node) -> Option<String> {
        node.dyn_ref::<web_sys::Element>()
            .map(|el| el.tag_name().to_ascii_uppercase())
    }

    fn attribute(&self, node: &web_sys::Node, name: &str) -> Option<String> {
        node.dyn_ref::<web_sys::Element>()?.get_attribute(name)
    }

    fn set_attribute(&self, node: &web_sys::Node, name: &str, value: &str) -> Result<(), PlatformError> {
        let element = node
            .dyn_ref::<web_sys::Element>()
            .ok_or("set_attribute on a non-element")?;
        element
            .set_attribute(name, value)
            .map_err(|e| js_err("set_attribute", e))
    }

    fn remove_attribute(&self, node: &web_sys::Node, name: &str) {
        if let Some(element) = node.dyn_ref::<web_sys::Element>() {
            let _ = element.remove_attribute(name);
        }
    }

    fn text_content(&self, node: &web_sys::Node) -> String {
        node.text_content().unwrap_or_default()
    }

    fn set_text_content(&self, node: &web_sys::Node, text: &str) {
        node.set_text_content(Some(text));
    }

    fn split_text(&self, node: &web_sys::Node, offset: usize) -> Result<web_sys::Node, PlatformError> {
        let text = node
            .dyn_ref::<web_sys::Text>()
            .ok_or("split_text on a non-text node")?;
        text.split_text(offset as u32)
            .map(Into::into)
            .map_err(|e| js_err("split_text", e))
    }

    fn input_value(&self, node: &web_sys::Node) -> Option<String> {
        if let Some(input) = node.dyn_ref::<web_sys::HtmlInputElement>() {
            return Some(input.value());
        }
        node.dyn_ref::<web_sys::HtmlTextAreaElement>()
            .map(|area| area.value())
    }

    fn set_input_value(&self, node: &web_sys::Node, value: &str) {
        if let Some(input) = node.dyn_ref::<web_sys::HtmlInputElement>() {
            input.set_value(value);
        } else if let Some(area) = node.dyn_ref::<web_sys::HtmlTextAreaElement>() {
            area.set_value(value);
        }
    }

    fn selection(&self) -> Option<DomRange<web_sys::Node>> {
        let selection = self.native_selection()?;
        if selection.range_count() == 0 {
            return None;
        }
        let range = selection.get_range_at(0).ok()?;
        Some(DomRange::new(
            range.start_container().ok()?,
            range.start_offset().ok()? as usize,
            range.end_container().ok()?,
            range.end_offset().ok()? as usize,
        ))
    }

    fn set_selection(&self, range: Option<&DomRange<web_sys::Node>>) -> Result<(), PlatformError> {
        let selection = self.native_selection().ok_or("no selection object")?;
        selection
            .remove_all_ranges()
            .map_err(|e| js_err("remove_all_ranges", e))?;
        let Some(range) = range else {
            return Ok(());
        };
        let native = self
            .document
            .create_range()
            .map_err(|e| js_err("create_range", e))?;
        native
            .set_start(&range.start.node, range.start.offset as u32)
            .map_err(|e| js_err("set_start", e))?;
        native
            .set_end(&range.end.node, range.end.offset as u32)
            .map_err(|e| js_err("set_end", e))?;
        selection
            .add_range(&native)
            .map_err(|e| js_err("add_range", e))
    }

    fn active_element(&self) -> Option<web_sys::Node> {
        self.document.active_element().map(Into::into)
    }

    fn focus(&self, node: &web_sys::Node) {
        if let Some(element) = node.dyn_ref::<web_sys::HtmlElement>() {
            if let Err(e) = element.focus() {
                tracing::warn!(target: "weaver::dom", error = ?e, "focus failed");
            }
        }
    }

    fn text_length(&self, node: &web_sys::Node) -> usize {
        match node.dyn_ref::<web_sys::CharacterData>() {
            Some(data) => data.length() as usize,
            None => self.text_content(node).encode_utf16().count(),
        }
    }

    fn has_class(&self, node: &web_sys::Node, class: &str) -> bool {
        node.dyn_ref::<web_sys::Element>()
            .is_some_and(|el| el.class_list().contains(class))
    }

    fn toggle_class(&self, node: &web_sys::Node, class: &str, on: bool) {
        let Some(element) = node.dyn_ref::<web_sys::Element>() else {
            return;
        };
        let list = element.class_list();
        let result = if on { list.add_1(class) } else { list.remove_1(class) };
        if let Err(e) = result {
            tracing::warn!(target: "weaver::dom", class, error = ?e, "toggle_class failed");
        }
    }

    fn contains(&self, ancestor: &web_sys::Node, node: &web_sys::Node) -> bool {
        ancestor.contains(Some(node))
    }

    /// Uses `Range.comparePoint`, falling back to tree paths for points the
    /// browser refuses to compare (e.g. across documents).
    fn compare_boundaries(
        &self,
        a: &Boundary<web_sys::Node>,
        b: &Boundary<web_sys::Node>,
    ) -> Ordering {
        let compared = self.document.create_range().ok().and_then(|range| {
            range.set_start(&b.node, b.offset as u32).ok()?;
            range.collapse_with_to_start(true);
            range.compare_point(&a.node, a.offset as u32).ok()
        });
        match compared {
            Some(c) => c.cmp(&0),
            None => {
                let mut pa = self.node_path(&a.node);
                pa.push(a.offset);
                let mut pb = self.node_path(&b.node);
                pb.push(b.offset);
                pa.cmp(&pb)
            }
        }
    }
}
