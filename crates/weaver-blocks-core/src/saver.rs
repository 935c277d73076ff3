//! Whole-document save.

use std::collections::BTreeMap;

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::SmolStr;
use web_time::{SystemTime, UNIX_EPOCH};

use crate::block::{Block, SavedBlock};
use crate::platform::Dom;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// One block in the saved document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputBlock {
    pub id: SmolStr,
    #[serde(rename = "type")]
    pub tool: SmolStr,
    pub data: Value,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tunes: BTreeMap<SmolStr, Value>,
}

impl From<SavedBlock> for OutputBlock {
    fn from(saved: SavedBlock) -> Self {
        Self {
            id: saved.id,
            tool: saved.tool,
            data: saved.data,
            tunes: saved.tunes,
        }
    }
}

/// The saved document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputData {
    /// Milliseconds since the Unix epoch.
    pub time: u64,
    pub blocks: Vec<OutputBlock>,
    pub version: String,
}

/// Save every block concurrently.
///
/// Blocks whose tool fails to save, or whose data does not validate, are
/// logged and left out.
pub async fn save_blocks<D: Dom>(blocks: &[Block<D>]) -> OutputData {
    let results = join_all(blocks.iter().map(|block| block.save())).await;

    let mut saved = Vec::with_capacity(blocks.len());
    for (block, result) in blocks.iter().zip(results) {
        match result {
            Ok(output) if block.validate(&output.data) => saved.push(OutputBlock::from(output)),
            Ok(output) => tracing::warn!(
                target: "weaver::saver",
                block_id = %output.id,
                tool = %output.tool,
                "block skipped because saved data is invalid"
            ),
            Err(e) => tracing::error!(
                target: "weaver::saver",
                block_id = %block.id(),
                tool = %block.name(),
                error = %e,
                "block skipped because saving failed"
            ),
        }
    }

    let time = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default();

    OutputData {
        time,
        blocks: saved,
        version: VERSION.to_string(),
    }
}
