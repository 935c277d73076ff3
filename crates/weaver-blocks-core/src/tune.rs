//! Block tunes: per-block extensions shown in the settings panel.
//!
//! A tune contributes a button, may wrap the block's rendered content and may
//! persist its own data alongside the tool data. Tunes are either user tunes
//! (registered by the embedder) or internal ones (move up/down, delete).

use std::fmt;

use serde_json::Value;
use smol_str::SmolStr;

use crate::api::EditorApi;
use crate::error::TuneError;
use crate::platform::Dom;

/// What a tune instance is constructed from.
pub struct TuneContext<D: Dom> {
    pub dom: D,
    pub api: EditorApi<D>,
    pub block_id: SmolStr,
    pub config: Value,
    /// Data this tune saved last time, if any.
    pub data: Option<Value>,
}

/// A tune instance owned by one block.
pub trait BlockTune<D: Dom> {
    /// Settings panel element. `None` when the tune has no UI.
    fn render(&mut self) -> Result<Option<D::Node>, TuneError>;

    /// Wrap the block content. Returns the node that replaces `content`.
    fn wrap(&mut self, content: &D::Node) -> Result<D::Node, TuneError> {
        Ok(content.clone())
    }

    /// Data to persist under this tune's name. `None` persists nothing.
    fn save(&self) -> Result<Option<Value>, TuneError> {
        Ok(None)
    }

    /// The tune's button was activated.
    fn activate(&mut self) -> Result<(), TuneError> {
        Ok(())
    }

    fn destroy(&mut self) {}
}

type TuneFactory<D> = Box<dyn Fn(TuneContext<D>) -> Box<dyn BlockTune<D>>>;

/// A registered tune.
pub struct TuneDefinition<D: Dom> {
    pub name: SmolStr,
    pub internal: bool,
    pub config: Value,
    factory: TuneFactory<D>,
}

impl<D: Dom> fmt::Debug for TuneDefinition<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TuneDefinition")
            .field("name", &self.name)
            .field("internal", &self.internal)
            .finish_non_exhaustive()
    }
}

impl<D: Dom> TuneDefinition<D> {
    /// A user tune.
    pub fn new(
        name: impl Into<SmolStr>,
        factory: impl Fn(TuneContext<D>) -> Box<dyn BlockTune<D>> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            internal: false,
            config: Value::Null,
            factory: Box::new(factory),
        }
    }

    /// An editor-internal tune, listed in the default tunes section.
    pub fn internal(
        name: impl Into<SmolStr>,
        factory: impl Fn(TuneContext<D>) -> Box<dyn BlockTune<D>> + 'static,
    ) -> Self {
        Self {
            internal: true,
            ..Self::new(name, factory)
        }
    }

    pub fn with_config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }

    pub fn create(&self, ctx: TuneContext<D>) -> Box<dyn BlockTune<D>> {
        (self.factory)(ctx)
    }
}

/// A tune attached to a block.
pub struct TuneInstance<D: Dom> {
    pub name: SmolStr,
    pub internal: bool,
    pub tune: Box<dyn BlockTune<D>>,
}
