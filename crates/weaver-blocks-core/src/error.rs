//! Error types for block, tool and tune operations.

use smol_str::SmolStr;
use thiserror::Error;

use crate::platform::PlatformError;

/// Errors raised by content tools.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ToolError {
    /// Rendering the tool's content failed.
    #[error("render failed: {0}")]
    Render(String),

    /// Extracting the tool's data failed.
    #[error("save failed: {0}")]
    Save(String),

    /// Merging data into the tool failed.
    #[error("merge failed: {0}")]
    Merge(String),

    /// A lifecycle hook reported a failure.
    #[error("hook `{hook}` failed: {reason}")]
    Hook { hook: SmolStr, reason: String },

    /// The tool does not implement the requested capability.
    #[error("tool does not support `{0}`")]
    Unsupported(&'static str),

    /// DOM access failed while the tool was running.
    #[error(transparent)]
    Platform(#[from] PlatformError),
}

/// Errors raised by block tunes.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TuneError {
    /// Wrapping the block content failed.
    #[error("wrap failed: {0}")]
    Wrap(String),

    /// Serializing tune data failed.
    #[error("save failed: {0}")]
    Save(String),

    /// The tune refused the activation (e.g. moving the first block up).
    #[error("{0}")]
    Rejected(String),

    /// DOM access failed while the tune was running.
    #[error(transparent)]
    Platform(#[from] PlatformError),
}

/// Errors surfaced by [`Block`](crate::Block) operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum BlockError {
    /// The content tool could not render the block.
    #[error("block `{tool}` failed to render: {source}")]
    Render {
        tool: SmolStr,
        #[source]
        source: ToolError,
    },

    /// The content tool failed to produce data on save.
    #[error("block `{id}` ({tool}) failed to save: {source}")]
    Save {
        id: SmolStr,
        tool: SmolStr,
        #[source]
        source: ToolError,
    },

    /// `merge_with` was called on a block whose tool cannot merge.
    #[error("tool `{0}` is not mergeable")]
    NotMergeable(SmolStr),

    /// The tool accepted the merge call but failed.
    #[error(transparent)]
    Merge(ToolError),

    /// No tune with this name is attached to the block.
    #[error("unknown tune `{0}`")]
    UnknownTune(SmolStr),

    /// DOM access failed while composing or updating the block.
    #[error(transparent)]
    Platform(#[from] PlatformError),
}

/// Errors loading [`BlocksConfig`](crate::BlocksConfig).
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid value for `{field}`: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}
