//! Content tools: the pluggable renderers/serializers behind blocks.
//!
//! A [`ToolDefinition`] is registered once and shared by every block of that
//! type; each block gets its own [`BlockTool`] instance from the definition's
//! factory. Optional capabilities have default implementations that report
//! "not provided" so the block checks them explicitly at the call site.

use std::fmt;
use std::rc::Rc;

use futures_util::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::SmolStr;

use crate::error::ToolError;
use crate::platform::Dom;
use crate::sanitize::SanitizeConfig;
use crate::tune::TuneDefinition;

/// Future returned by asynchronous tool operations.
pub type ToolFuture<'a, T> = LocalBoxFuture<'a, Result<T, ToolError>>;

/// One toolbox variant of a tool. Several variants may share a tool and
/// differ only in the data they preset (e.g. heading levels).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ToolboxConfigEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ToolboxConfigEntry {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Lifecycle hooks a block forwards to its tool.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolHook {
    AppendCallback,
    Rendered,
    Moved { from: usize, to: usize },
    Updated,
    Removed,
    /// Tool-specific hook addressed by name.
    Named { name: SmolStr, params: Value },
}

impl ToolHook {
    pub fn name(&self) -> &str {
        match self {
            ToolHook::AppendCallback => "appendCallback",
            ToolHook::Rendered => "rendered",
            ToolHook::Moved { .. } => "moved",
            ToolHook::Updated => "updated",
            ToolHook::Removed => "removed",
            ToolHook::Named { name, .. } => name.as_str(),
        }
    }
}

/// What a tool instance is constructed from.
pub struct ToolContext<D: Dom> {
    pub dom: D,
    pub block_id: SmolStr,
    pub data: Value,
    pub config: Value,
    pub read_only: bool,
}

/// A content tool instance owned by one block.
pub trait BlockTool<D: Dom> {
    /// Build the tool's content element.
    fn render(&mut self) -> Result<D::Node, ToolError>;

    /// Extract data from the rendered content.
    fn save<'a>(&'a self, content: &'a D::Node) -> ToolFuture<'a, Value>;

    /// Check saved data. `None` means the tool has no validator.
    fn validate(&self, _data: &Value) -> Option<bool> {
        None
    }

    fn is_mergeable(&self) -> bool {
        false
    }

    /// Append another block's data to this one. Only called when
    /// [`is_mergeable`](BlockTool::is_mergeable) is true.
    fn merge(&mut self, _data: &Value) -> Result<(), ToolError> {
        Err(ToolError::Unsupported("merge"))
    }

    /// Tool-specific element for the block settings panel.
    fn render_settings(&mut self) -> Option<D::Node> {
        None
    }

    /// Handle a lifecycle hook. Hooks a tool does not care about are no-ops.
    fn call(&mut self, _hook: &ToolHook) -> Result<(), ToolError> {
        Ok(())
    }

    fn destroy(&mut self) {}
}

type ToolFactory<D> = Box<dyn Fn(ToolContext<D>) -> Box<dyn BlockTool<D>>>;

/// A registered content tool.
pub struct ToolDefinition<D: Dom> {
    pub name: SmolStr,
    pub config: Value,
    pub toolbox: Vec<ToolboxConfigEntry>,
    pub sanitize: SanitizeConfig,
    pub read_only_supported: bool,
    /// Tunes attached to every block of this tool, user tunes first.
    pub tunes: Vec<Rc<TuneDefinition<D>>>,
    factory: ToolFactory<D>,
}

impl<D: Dom> fmt::Debug for ToolDefinition<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("name", &self.name)
            .field("toolbox", &self.toolbox)
            .field("tunes", &self.tunes.iter().map(|t| &t.name).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl<D: Dom> ToolDefinition<D> {
    pub fn new(
        name: impl Into<SmolStr>,
        factory: impl Fn(ToolContext<D>) -> Box<dyn BlockTool<D>> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            config: Value::Null,
            toolbox: Vec::new(),
            sanitize: SanitizeConfig::default(),
            read_only_supported: false,
            tunes: Vec::new(),
            factory: Box::new(factory),
        }
    }

    pub fn with_config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }

    pub fn with_toolbox(mut self, entries: Vec<ToolboxConfigEntry>) -> Self {
        self.toolbox = entries;
        self
    }

    pub fn with_sanitize(mut self, sanitize: SanitizeConfig) -> Self {
        self.sanitize = sanitize;
        self
    }

    pub fn with_tune(mut self, tune: Rc<TuneDefinition<D>>) -> Self {
        self.tunes.push(tune);
        self
    }

    pub fn with_read_only_support(mut self, supported: bool) -> Self {
        self.read_only_supported = supported;
        self
    }

    /// Instantiate the tool for one block.
    pub fn create(&self, ctx: ToolContext<D>) -> Box<dyn BlockTool<D>> {
        (self.factory)(ctx)
    }
}
