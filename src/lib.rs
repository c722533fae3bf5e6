//! swatch - live component preview and color-token rewriting
//!
//! This crate provides the core of a design studio following the Elm
//! Architecture: a buffer store, a debounced change pipeline, a preview
//! transformer and sandboxed renderer, and a color token scanner with a
//! whole-buffer substitution engine.

pub mod cli;
pub mod commands;
pub mod config;
pub mod config_paths;
pub mod error;
pub mod languages;
pub mod messages;
pub mod model;
pub mod palette;
pub mod preview;
pub mod runtime;
pub mod tracing;
pub mod update;

// Re-export commonly used types
pub use commands::Cmd;
pub use config::StudioConfig;
pub use error::{Result, StudioError};
pub use messages::Msg;
pub use model::StudioModel;
pub use runtime::Studio;
