//! Browser layer for weaver blocks.
//!
//! Implements the core crate's capabilities over `web-sys`. It assumes a
//! `wasm32-unknown-unknown` target environment.
//!
//! # Architecture
//!
//! - `dom`: the live document as a `Dom`
//! - `formatter`: `execCommand`-based text formatting
//! - `observer`: mutation, focus and input wiring for the selected block
//! - `timers`: `setTimeout` scheduling
//!
//! # Re-exports
//!
//! This crate re-exports `weaver-blocks-core` for convenience, so consumers
//! only need to depend on `weaver-blocks-browser`.

pub use weaver_blocks_core;
pub use weaver_blocks_core::*;

pub mod dom;
pub mod formatter;
pub mod observer;
pub mod timers;

pub use dom::BrowserDom;
pub use formatter::ExecCommandFormatter;
pub use observer::{BlockWatcher, SharedBlock};
pub use timers::GlooTimers;

/// Install the panic hook and route `tracing` to the browser console.
///
/// Safe to call more than once; later calls keep the first subscriber.
pub fn init() {
    use tracing::Level;
    use tracing::subscriber::set_global_default;
    use tracing_subscriber::Registry;
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::layer::SubscriberExt;

    console_error_panic_hook::set_once();

    let console_level = if cfg!(debug_assertions) {
        Level::TRACE
    } else {
        Level::INFO
    };

    let wasm_layer = tracing_wasm::WASMLayer::new(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(console_level)
            .build(),
    );

    let filter = EnvFilter::new("debug,weaver::format=info,weaver::selection=info");

    let reg = Registry::default().with(filter).with(wasm_layer);

    let _ = set_global_default(reg);
}
