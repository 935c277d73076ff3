//! Underline and strikethrough toggles driven by a [`TextFormatter`].

use std::rc::Rc;

use crate::error::ToolError;
use crate::format::{TextFormatter, TextStyle};
use crate::platform::{Dom, DomRange, PlatformError};
use crate::sanitize::SanitizeConfig;

use super::{BUTTON_ACTIVE_CLASS, InlineTool, toolbar_button};

/// A toggle button for one formatting style, backed entirely by the
/// formatter. Underline and strikethrough are built this way.
pub struct NativeInlineTool<D: Dom> {
    dom: D,
    formatter: Rc<dyn TextFormatter<D>>,
    style: TextStyle,
    name: &'static str,
    title: &'static str,
    shortcut: &'static str,
    button: D::Node,
}

impl<D: Dom> NativeInlineTool<D> {
    fn new(
        dom: D,
        formatter: Rc<dyn TextFormatter<D>>,
        style: TextStyle,
        name: &'static str,
        title: &'static str,
        shortcut: &'static str,
    ) -> Result<Self, PlatformError> {
        let button = toolbar_button(&dom, name, title)?;
        Ok(Self {
            dom,
            formatter,
            style,
            name,
            title,
            shortcut,
            button,
        })
    }

    pub fn underline(dom: D, formatter: Rc<dyn TextFormatter<D>>) -> Result<Self, PlatformError> {
        Self::new(
            dom,
            formatter,
            TextStyle::Underline,
            "underline",
            "Underline",
            "CMD+U",
        )
    }

    pub fn strikethrough(
        dom: D,
        formatter: Rc<dyn TextFormatter<D>>,
    ) -> Result<Self, PlatformError> {
        Self::new(
            dom,
            formatter,
            TextStyle::Strikethrough,
            "strikethrough",
            "Strikethrough",
            "CMD+SHIFT+X",
        )
    }

    pub fn style(&self) -> &TextStyle {
        &self.style
    }
}

impl<D: Dom> InlineTool<D> for NativeInlineTool<D> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn title(&self) -> &'static str {
        self.title
    }

    fn render(&self) -> D::Node {
        self.button.clone()
    }

    fn surround(&mut self, range: Option<&DomRange<D::Node>>) -> Result<(), ToolError> {
        let Some(range) = range else {
            return Ok(());
        };
        if self.formatter.is_active(Some(range), &self.style) {
            self.formatter.remove(range, &self.style)?;
        } else {
            self.formatter.apply(range, &self.style)?;
        }
        Ok(())
    }

    fn check_state(&mut self, selection: Option<&DomRange<D::Node>>) -> bool {
        let active = self.formatter.is_active(selection, &self.style);
        self.dom.toggle_class(&self.button, BUTTON_ACTIVE_CLASS, active);
        active
    }

    fn shortcut(&self) -> Option<&'static str> {
        Some(self.shortcut)
    }

    fn sanitize(&self) -> SanitizeConfig {
        SanitizeConfig::new().allow_tag(self.style.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::StructuralFormatter;
    use crate::memory::MemoryDom;

    fn tool(dom: &MemoryDom) -> NativeInlineTool<MemoryDom> {
        let formatter = Rc::new(StructuralFormatter::new(dom.clone()));
        NativeInlineTool::underline(dom.clone(), formatter).unwrap()
    }

    #[test]
    fn test_surround_toggles_and_button_follows() {
        let dom = MemoryDom::new();
        let t = dom.create_text("plain words");
        let p = dom.build("p", &[("contenteditable", "true")], &[t]).unwrap();
        dom.append_child(&dom.body(), &p).unwrap();
        let mut underline = tool(&dom);

        dom.select_text(t, 0, 5);
        let range = dom.selection();
        assert!(!underline.check_state(range.as_ref()));
        underline.surround(range.as_ref()).unwrap();
        insta::assert_snapshot!(dom.inner_html(p), @"<u>plain</u> words");

        let range = dom.selection();
        assert!(underline.check_state(range.as_ref()));
        assert!(dom.has_class(&underline.render(), BUTTON_ACTIVE_CLASS));

        underline.surround(range.as_ref()).unwrap();
        assert_eq!(dom.inner_html(p), "plain words");
        let range = dom.selection();
        assert!(!underline.check_state(range.as_ref()));
        assert!(!dom.has_class(&underline.render(), BUTTON_ACTIVE_CLASS));
    }

    #[test]
    fn test_metadata() {
        let dom = MemoryDom::new();
        let formatter = Rc::new(StructuralFormatter::new(dom.clone()));
        let strike = NativeInlineTool::strikethrough(dom.clone(), formatter).unwrap();
        assert_eq!(strike.shortcut(), Some("CMD+SHIFT+X"));
        assert!(strike.sanitize().allows("s"));
        assert!(!strike.sanitize().allows("u"));
        insta::assert_snapshot!(
            dom.to_html(strike.render()),
            @r#"<button type="button" class="ce-inline-tool ce-inline-tool--strikethrough" title="Strikethrough"></button>"#
        );
    }
}
