//! Link creation and removal.
//!
//! Pressing the button on plain text opens an input below the toolbar. The
//! selected text is marked with a fake background and the selection saved,
//! since focusing the input moves the live selection away. Confirming
//! restores it and links the text. Pressing the button inside an existing
//! link removes it at once.

use std::rc::Rc;
use std::time::Duration;

use crate::api::{EditorApi, TooltipPlacement};
use crate::config::LinkConfig;
use crate::error::ToolError;
use crate::format::{TextFormatter, TextStyle};
use crate::platform::{Dom, DomRange, PlatformError};
use crate::sanitize::{AttributeRule, SanitizeConfig};
use crate::selection::{DEFAULT_SEARCH_DEPTH, SelectionSnapshot, SelectionUtils};

use super::url::{is_valid_url, normalize_url};
use super::{BUTTON_ACTIVE_CLASS, InlineTool, toolbar_button};

pub const UNLINK_CLASS: &str = "ce-inline-tool--unlink";
pub const INPUT_CLASS: &str = "ce-inline-tool-input";
pub const INPUT_SHOWED_CLASS: &str = "ce-inline-tool-input--showed";
pub const ACTIONS_CLASS: &str = "ce-inline-tool-link-actions";

/// Result of confirming the link input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// The input was blank; any link under the selection was removed.
    Unlinked,
    /// The input did not hold a usable URL. Nothing changed.
    Invalid,
    Linked { href: String },
}

pub struct LinkTool<D: Dom> {
    dom: D,
    api: EditorApi<D>,
    formatter: Rc<dyn TextFormatter<D>>,
    config: LinkConfig,
    selection: SelectionUtils<D>,
    button: D::Node,
    actions: D::Node,
    input: D::Node,
    confirm_button: D::Node,
    clear_button: D::Node,
    input_opened: bool,
}

impl<D: Dom> LinkTool<D> {
    pub fn new(
        dom: D,
        api: EditorApi<D>,
        formatter: Rc<dyn TextFormatter<D>>,
        config: LinkConfig,
    ) -> Result<Self, PlatformError> {
        let button = toolbar_button(&dom, "link", &api.i18n.t("Link"))?;

        let input = dom.create_element("input")?;
        dom.add_class(&input, INPUT_CLASS);
        dom.set_attribute(&input, "placeholder", &api.i18n.t("Add a link"))?;
        dom.set_attribute(&input, "enterkeyhint", "done")?;

        let confirm_button = dom.create_element("button")?;
        dom.set_attribute(&confirm_button, "type", "button")?;
        dom.add_class(&confirm_button, &format!("{}__confirm", ACTIONS_CLASS));
        dom.set_attribute(&confirm_button, "title", &api.i18n.t("Save"))?;

        let clear_button = dom.create_element("button")?;
        dom.set_attribute(&clear_button, "type", "button")?;
        dom.add_class(&clear_button, &format!("{}__clear", ACTIONS_CLASS));
        dom.set_attribute(&clear_button, "title", &api.i18n.t("Clear"))?;

        let actions = dom.create_element("div")?;
        dom.add_class(&actions, ACTIONS_CLASS);
        dom.append_child(&actions, &input)?;
        dom.append_child(&actions, &confirm_button)?;
        dom.append_child(&actions, &clear_button)?;

        Ok(Self {
            selection: SelectionUtils::new(dom.clone()),
            dom,
            api,
            formatter,
            config,
            button,
            actions,
            input,
            confirm_button,
            clear_button,
            input_opened: false,
        })
    }

    pub fn is_open(&self) -> bool {
        self.input_opened
    }

    pub fn input(&self) -> &D::Node {
        &self.input
    }

    pub fn confirm_button(&self) -> &D::Node {
        &self.confirm_button
    }

    pub fn clear_button(&self) -> &D::Node {
        &self.clear_button
    }

    pub fn input_value(&self) -> String {
        self.dom.input_value(&self.input).unwrap_or_default()
    }

    pub fn set_input_value(&self, value: &str) {
        self.dom.set_input_value(&self.input, value);
    }

    /// Enter in the input, or the confirm button.
    pub fn confirm(&mut self) -> Result<ConfirmOutcome, ToolError> {
        let raw = self.input_value();
        let value = raw.trim();

        if value.is_empty() {
            self.restore_saved();
            let unlinked = self.unlink();
            self.close_actions(true)?;
            unlinked?;
            return Ok(ConfirmOutcome::Unlinked);
        }

        if !is_valid_url(value) {
            tracing::warn!(target: "weaver::inline", value, "incorrect link entered");
            self.show_invalid();
            return Ok(ConfirmOutcome::Invalid);
        }

        let href = normalize_url(value, &self.config.default_protocol);
        self.restore_saved();
        if let Err(e) = self.selection.remove_fake_background() {
            self.close_actions(true)?;
            return Err(e.into());
        }
        self.insert_link(&href)?;
        self.selection.collapse_to_end()?;
        self.api.inline_toolbar.close();
        self.close_actions(true)?;
        tracing::debug!(target: "weaver::inline", href = %href, "link inserted");
        Ok(ConfirmOutcome::Linked { href })
    }

    /// The clear button: empty the input and drop the link, input stays open.
    pub fn clear_input(&mut self) -> Result<(), ToolError> {
        self.set_input_value("");
        if self.selection.has_saved() {
            self.selection.restore()?;
            self.unlink()?;
            self.selection.save();
        }
        self.dom.remove_class(&self.button, UNLINK_CLASS);
        self.dom.remove_class(&self.button, BUTTON_ACTIVE_CLASS);
        Ok(())
    }

    /// A click landed somewhere in the document.
    pub fn handle_click(&mut self, target: &D::Node) -> Result<(), ToolError> {
        if !self.input_opened {
            return Ok(());
        }
        if self.dom.contains(&self.button, target) || self.dom.contains(&self.actions, target) {
            return Ok(());
        }
        if !self.selection.is_fake_background_enabled() {
            self.selection.restore()?;
        }
        self.close_actions(true)?;
        Ok(())
    }

    fn toggle_actions(&mut self) -> Result<(), PlatformError> {
        if self.input_opened {
            self.close_actions(false)
        } else {
            self.open_actions(true);
            Ok(())
        }
    }

    fn open_actions(&mut self, need_focus: bool) {
        self.dom.add_class(&self.input, INPUT_SHOWED_CLASS);
        if need_focus {
            // The toolbar click handler is still running; focus after it returns.
            let dom = self.dom.clone();
            let input = self.input.clone();
            self.api
                .timers
                .set_timeout(Duration::ZERO, Box::new(move || dom.focus(&input)));
        }
        self.input_opened = true;
    }

    /// Hides the input even when dropping the marker fails; that error is
    /// returned after the input is closed.
    fn close_actions(&mut self, clear_saved: bool) -> Result<(), PlatformError> {
        let mut result = Ok(());
        if self.selection.is_fake_background_enabled() {
            // Swap back the saved selection just long enough to drop the marker.
            let current = SelectionSnapshot::capture(&self.dom);
            self.restore_saved();
            result = self
                .selection
                .remove_fake_background()
                .and(current.apply());
        }
        self.dom.remove_class(&self.input, INPUT_SHOWED_CLASS);
        self.set_input_value("");
        if clear_saved {
            self.selection.clear_saved();
        }
        self.input_opened = false;
        result
    }

    /// Restore the saved selection, logging instead of failing. Removing the
    /// fake background reselects the marked text on its own.
    fn restore_saved(&mut self) {
        if let Err(e) = self.selection.restore() {
            tracing::warn!(target: "weaver::inline", error = %e, "saved selection not restored");
        }
    }

    fn show_invalid(&self) {
        let message = self.api.i18n.t("Pasted link is not valid.");
        self.api
            .tooltip
            .show(&self.input, &message, TooltipPlacement::Top);
        let tooltip = self.api.tooltip.clone();
        self.api.timers.set_timeout(
            self.config.validation_tooltip(),
            Box::new(move || tooltip.hide()),
        );
    }

    fn unlink(&self) -> Result<(), PlatformError> {
        match self.dom.selection() {
            Some(range) => self.formatter.remove(
                &range,
                &TextStyle::Link {
                    href: String::new(),
                },
            ),
            None => Ok(()),
        }
    }

    fn insert_link(&self, href: &str) -> Result<(), PlatformError> {
        if let Some(anchor) = self.selection.find_parent_tag("A", None, DEFAULT_SEARCH_DEPTH) {
            self.selection.expand_to_tag(&anchor)?;
        }
        let range = self
            .dom
            .selection()
            .ok_or_else(|| PlatformError::from("no selection to link"))?;
        self.formatter.apply(
            &range,
            &TextStyle::Link {
                href: href.to_string(),
            },
        )?;

        // Created anchors always open safely in a new context.
        let Some(linked) = self.dom.selection() else {
            return Ok(());
        };
        for segment in self.dom.text_segments(&linked) {
            if let Some(anchor) = self.dom.closest_tag(&segment.node, "a") {
                self.dom.set_attribute(&anchor, "target", &self.config.target)?;
                self.dom.set_attribute(&anchor, "rel", &self.config.rel)?;
            }
        }
        Ok(())
    }
}

impl<D: Dom> InlineTool<D> for LinkTool<D> {
    fn name(&self) -> &'static str {
        "link"
    }

    fn title(&self) -> &'static str {
        "Link"
    }

    fn render(&self) -> D::Node {
        self.button.clone()
    }

    fn render_actions(&self) -> Option<D::Node> {
        Some(self.actions.clone())
    }

    fn surround(&mut self, range: Option<&DomRange<D::Node>>) -> Result<(), ToolError> {
        if let Some(range) = range {
            if self.input_opened {
                self.selection.restore()?;
                self.selection.remove_fake_background()?;
            } else {
                if self.dom.selection().as_ref() != Some(range) {
                    self.dom.set_selection(Some(range))?;
                }
                self.selection.set_fake_background()?;
                self.selection.save();
            }

            if let Some(anchor) = self.selection.find_parent_tag("A", None, DEFAULT_SEARCH_DEPTH) {
                self.selection.expand_to_tag(&anchor)?;
                self.unlink()?;
                self.close_actions(true)?;
                self.check_state(None);
                self.api.inline_toolbar.close();
                tracing::debug!(target: "weaver::inline", "link removed");
                return Ok(());
            }
        }
        self.toggle_actions()?;
        Ok(())
    }

    /// Follows the live selection: inside a link the button turns into an
    /// unlink button and the input opens pre-filled with the href.
    fn check_state(&mut self, _selection: Option<&DomRange<D::Node>>) -> bool {
        match self.selection.find_parent_tag("A", None, DEFAULT_SEARCH_DEPTH) {
            Some(anchor) => {
                self.dom.add_class(&self.button, UNLINK_CLASS);
                self.dom.add_class(&self.button, BUTTON_ACTIVE_CLASS);
                self.open_actions(false);
                let href = self
                    .dom
                    .attribute(&anchor, "href")
                    .filter(|href| href != "null")
                    .unwrap_or_default();
                self.set_input_value(&href);
                self.selection.save();
                true
            }
            None => {
                self.dom.remove_class(&self.button, UNLINK_CLASS);
                self.dom.remove_class(&self.button, BUTTON_ACTIVE_CLASS);
                false
            }
        }
    }

    fn clear(&mut self) {
        if let Err(e) = self.close_actions(true) {
            tracing::warn!(target: "weaver::inline", error = %e, "closing link input failed");
        }
    }

    fn shortcut(&self) -> Option<&'static str> {
        Some("CMD+K")
    }

    fn sanitize(&self) -> SanitizeConfig {
        SanitizeConfig::new().allow_tag_with(
            "a",
            &[
                ("href", AttributeRule::Keep(true)),
                ("target", AttributeRule::Force(self.config.target.clone())),
                ("rel", AttributeRule::Force(self.config.rel.clone())),
            ],
        )
    }
}
