//! Studio model - the complete state of a session
//!
//! This module contains all the state types following the Elm Architecture pattern.

pub mod buffer_set;
pub mod palette;
pub mod pipeline;
pub mod preview;

pub use buffer_set::{BodyChange, BufferSet, FileId, FileSummary, SourceFile, DEFAULT_SOURCE};
pub use palette::PaletteState;
pub use pipeline::{CanonicalSource, PendingPublish, PipelineState, DEFAULT_QUIET_PERIOD_MS};
pub use preview::PreviewState;

use crate::config::StudioConfig;

/// The complete studio model
#[derive(Debug)]
pub struct StudioModel {
    /// Configuration the session was started with
    pub config: StudioConfig,
    /// Open files and the active one
    pub buffers: BufferSet,
    /// Debounce and canonical source
    pub pipeline: PipelineState,
    /// Preview pane
    pub preview: PreviewState,
    /// Color tokens of the canonical source
    pub palette: PaletteState,
}

impl StudioModel {
    /// Create a model seeded with the starter component
    pub fn new(config: StudioConfig) -> Self {
        let buffers = BufferSet::with_default_file(&config.default_file_name);
        Self::with_buffers(config, buffers)
    }

    pub fn with_buffers(config: StudioConfig, buffers: BufferSet) -> Self {
        Self {
            pipeline: PipelineState::new(config.debounce_ms),
            config,
            buffers,
            preview: PreviewState::default(),
            palette: PaletteState::default(),
        }
    }

    /// The current canonical source text, if anything was published yet
    pub fn canonical_text(&self) -> Option<&str> {
        self.pipeline.current().map(|c| c.text.as_str())
    }
}
