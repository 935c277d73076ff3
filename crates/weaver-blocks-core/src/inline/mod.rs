//! Inline tools: selection formatters shown in the floating toolbar.
//!
//! The toolbar asks every tool for [`check_state`](InlineTool::check_state)
//! whenever the selection changes and calls
//! [`surround`](InlineTool::surround) when the tool's button is pressed.
//! Tools re-derive their state from the document on every call.

pub mod link;
mod native;
pub mod url;

pub use link::{ConfirmOutcome, LinkTool};
pub use native::NativeInlineTool;

use crate::error::ToolError;
use crate::platform::{Dom, DomRange, PlatformError};
use crate::sanitize::SanitizeConfig;

pub const BUTTON_CLASS: &str = "ce-inline-tool";
pub const BUTTON_ACTIVE_CLASS: &str = "ce-inline-tool--active";

pub trait InlineTool<D: Dom> {
    /// Registered tool name.
    fn name(&self) -> &'static str;

    fn title(&self) -> &'static str;

    /// The toolbar button.
    fn render(&self) -> D::Node;

    /// Extra UI shown below the toolbar, e.g. the link input.
    fn render_actions(&self) -> Option<D::Node> {
        None
    }

    /// The button was pressed with `range` selected.
    fn surround(&mut self, range: Option<&DomRange<D::Node>>) -> Result<(), ToolError>;

    /// Refresh the button for `selection` and report whether the formatting
    /// is present there.
    fn check_state(&mut self, selection: Option<&DomRange<D::Node>>) -> bool;

    /// The toolbar is closing.
    fn clear(&mut self) {}

    fn shortcut(&self) -> Option<&'static str> {
        None
    }

    /// Tags and attributes this tool's output introduces.
    fn sanitize(&self) -> SanitizeConfig;
}

pub(crate) fn toolbar_button<D: Dom>(
    dom: &D,
    modifier: &str,
    title: &str,
) -> Result<D::Node, PlatformError> {
    let button = dom.create_element("button")?;
    dom.set_attribute(&button, "type", "button")?;
    dom.add_class(&button, BUTTON_CLASS);
    dom.add_class(&button, &format!("{}--{}", BUTTON_CLASS, modifier));
    dom.set_attribute(&button, "title", title)?;
    Ok(button)
}
