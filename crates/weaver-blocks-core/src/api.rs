//! Capabilities the editor orchestrator provides to blocks, tunes and tools.
//!
//! The orchestrator owns block ordering, toolbars, tooltips and UI strings.
//! Everything here is an interface; implementations live with the embedder.

use std::rc::Rc;

use crate::events::EventBus;
use crate::platform::Dom;
use crate::timers::Timers;

/// Block list queries and reordering.
pub trait BlocksApi {
    fn current_block_index(&self) -> Option<usize>;
    fn blocks_count(&self) -> usize;

    /// Move the current block (or the one at `from`) to index `to`.
    fn move_block(&self, to: usize, from: Option<usize>);

    /// Delete the block at `index`, or the current block.
    fn delete_block(&self, index: Option<usize>);
}

/// Block toolbar and settings panel control.
pub trait ToolbarApi {
    fn close(&self);
    fn toggle_block_settings(&self, open: bool);
}

/// Floating inline-formatting toolbar control.
pub trait InlineToolbarApi {
    fn close(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TooltipPlacement {
    #[default]
    Top,
    Bottom,
    Left,
    Right,
}

/// Tooltip rendering anchored at a node.
pub trait TooltipApi<N> {
    fn show(&self, anchor: &N, content: &str, placement: TooltipPlacement);
    fn hide(&self);
}

/// UI string lookup.
pub trait I18n {
    fn t(&self, key: &str) -> String;
}

/// Returns keys unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopI18n;

impl I18n for NoopI18n {
    fn t(&self, key: &str) -> String {
        key.to_string()
    }
}

/// Bundle of orchestrator capabilities handed to tunes and inline tools.
pub struct EditorApi<D: Dom> {
    pub blocks: Rc<dyn BlocksApi>,
    pub toolbar: Rc<dyn ToolbarApi>,
    pub inline_toolbar: Rc<dyn InlineToolbarApi>,
    pub tooltip: Rc<dyn TooltipApi<D::Node>>,
    pub i18n: Rc<dyn I18n>,
    pub timers: Rc<dyn Timers>,
    pub events: EventBus,
}

impl<D: Dom> Clone for EditorApi<D> {
    fn clone(&self) -> Self {
        Self {
            blocks: self.blocks.clone(),
            toolbar: self.toolbar.clone(),
            inline_toolbar: self.inline_toolbar.clone(),
            tooltip: self.tooltip.clone(),
            i18n: self.i18n.clone(),
            timers: self.timers.clone(),
            events: self.events.clone(),
        }
    }
}
