//! Formatting through the browser's native editing commands.

use wasm_bindgen::JsCast;
use weaver_blocks_core::{Dom, DomRange, PlatformError, TextFormatter, TextStyle};

use crate::dom::BrowserDom;

/// [`TextFormatter`] over `document.execCommand` / `queryCommandState`.
///
/// Commands act on the live selection, so `apply` and `remove` select the
/// range first. Underline and strikethrough commands toggle; removing a link
/// uses `unlink`.
#[derive(Clone)]
pub struct ExecCommandFormatter {
    dom: BrowserDom,
}

impl ExecCommandFormatter {
    pub fn new(dom: BrowserDom) -> Self {
        Self { dom }
    }

    fn html_document(&self) -> Result<&web_sys::HtmlDocument, PlatformError> {
        self.dom
            .document()
            .dyn_ref::<web_sys::HtmlDocument>()
            .ok_or_else(|| PlatformError::from("document is not an HTML document"))
    }

    fn select(&self, range: &DomRange<web_sys::Node>) -> Result<(), PlatformError> {
        if self.dom.selection().as_ref() != Some(range) {
            self.dom.set_selection(Some(range))?;
        }
        Ok(())
    }

    /// Run a command, returning whether the browser executed it.
    fn exec(&self, command: &str, value: Option<&str>) -> Result<bool, PlatformError> {
        let document = self.html_document()?;
        let result = match value {
            Some(value) => document.exec_command_with_show_ui_and_value(command, false, value),
            None => document.exec_command(command),
        };
        result.map_err(|e| PlatformError(format!("{} failed: {:?}", command, e)))
    }

    fn run(&self, command: &str, value: Option<&str>) -> Result<(), PlatformError> {
        if self.exec(command, value)? {
            Ok(())
        } else {
            Err(PlatformError(format!("{} was not executed", command)))
        }
    }
}

impl TextFormatter<BrowserDom> for ExecCommandFormatter {
    fn apply(&self, range: &DomRange<web_sys::Node>, style: &TextStyle) -> Result<(), PlatformError> {
        self.select(range)?;
        tracing::trace!(target: "weaver::format", command = style.command(), "execCommand");
        match style {
            TextStyle::Link { href } => self.run(style.command(), Some(href)),
            _ => self.run(style.command(), None),
        }
    }

    fn remove(&self, range: &DomRange<web_sys::Node>, style: &TextStyle) -> Result<(), PlatformError> {
        self.select(range)?;
        match style {
            // Disabled when there is no link under the selection.
            TextStyle::Link { .. } => {
                if !self.exec("unlink", None)? {
                    tracing::trace!(target: "weaver::format", "unlink disabled, nothing to remove");
                }
                Ok(())
            }
            _ if self.is_active(Some(range), style) => self.run(style.command(), None),
            _ => Ok(()),
        }
    }

    fn is_active(&self, selection: Option<&DomRange<web_sys::Node>>, style: &TextStyle) -> bool {
        if let TextStyle::Link { .. } = style {
            return selection
                .is_some_and(|range| self.dom.closest_tag(&range.start.node, "a").is_some());
        }
        self.html_document()
            .and_then(|document| {
                document
                    .query_command_state(style.command())
                    .map_err(|e| PlatformError(format!("queryCommandState failed: {:?}", e)))
            })
            .unwrap_or(false)
    }
}
