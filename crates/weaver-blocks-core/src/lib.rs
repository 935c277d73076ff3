//! weaver-blocks-core: block editor logic over an abstract DOM.
//!
//! This crate provides:
//! - `Dom` trait for document access, with the in-memory `MemoryDom`
//! - `Block` - one content tool, its tunes, input tracking and change detection
//! - `SelectionUtils` / `SelectionSnapshot` - selection capture and fake markers
//! - Inline tools (link, underline, strikethrough) over a `TextFormatter`
//! - Built-in tunes, the document saver and configuration

pub mod api;
pub mod block;
pub mod config;
pub mod error;
pub mod events;
pub mod format;
pub mod inline;
pub mod memory;
pub mod notifier;
pub mod platform;
pub mod sanitize;
pub mod saver;
pub mod selection;
pub mod timers;
pub mod tool;
pub mod tune;
pub mod tunes;

pub use api::{
    BlocksApi, EditorApi, I18n, InlineToolbarApi, NoopI18n, ToolbarApi, TooltipApi,
    TooltipPlacement,
};
pub use block::{Block, BlockMutated, BlockOptions, SavedBlock};
pub use config::{BlocksConfig, LinkConfig};
pub use error::{BlockError, ConfigError, ToolError, TuneError};
pub use events::{EditorEvent, EventBus, SubscriptionId};
pub use format::{StructuralFormatter, TextFormatter, TextStyle};
pub use inline::{ConfirmOutcome, InlineTool, LinkTool, NativeInlineTool};
pub use memory::{MemoryDom, NodeId};
pub use notifier::ChangeNotifier;
pub use platform::{Boundary, Dom, DomRange, MutationKind, MutationRecord, PlatformError};
pub use sanitize::{AttributeRule, SanitizeConfig, TagRule};
pub use saver::{OutputBlock, OutputData, save_blocks};
pub use selection::{SelectionSnapshot, SelectionUtils};
pub use smol_str::SmolStr;
pub use timers::{ManualTimers, Timers};
pub use tool::{BlockTool, ToolContext, ToolDefinition, ToolFuture, ToolHook, ToolboxConfigEntry};
pub use tune::{BlockTune, TuneContext, TuneDefinition};
