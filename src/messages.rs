//! Message types for the Elm-style architecture
//!
//! All state changes flow through these message types.

use std::path::PathBuf;

use crate::model::FileId;
use crate::preview::RenderOutcome;

/// Buffer store messages
#[derive(Debug, Clone)]
pub enum BufferMsg {
    /// Keystroke-level change to the active file (debounced publish)
    Edit(String),
    /// Switch the active file (synchronous publish)
    SetActive(FileId),
    /// Import `(name, text)` pairs; the last becomes active
    Import(Vec<(String, String)>),
    /// Read files from disk, then import them
    ImportPaths(Vec<PathBuf>),
    /// File reads finished; failures carry the error text
    FilesRead(Vec<(PathBuf, Result<String, String>)>),
}

/// Change pipeline messages
#[derive(Debug, Clone, Copy)]
pub enum PipelineMsg {
    /// The debounce timer armed for `ticket` fired
    QuietPeriodElapsed { ticket: u64 },
    /// Publish the active file now, cancelling any pending publish
    PublishNow,
}

/// Preview messages
#[derive(Debug)]
pub enum PreviewMsg {
    /// A render finished (possibly for an outdated version)
    Rendered(RenderOutcome),
}

/// Palette editing messages
#[derive(Debug, Clone)]
pub enum PaletteMsg {
    /// Pick a detected token for editing
    Select(String),
    ClearSelection,
    /// Replace the selected token in the active file
    ApplyColor(String),
    /// Replace `old` with `new` in a specific file
    Substitute {
        file_id: FileId,
        old: String,
        new: String,
    },
}

/// Top-level message type
#[derive(Debug)]
pub enum Msg {
    Buffer(BufferMsg),
    Pipeline(PipelineMsg),
    Preview(PreviewMsg),
    Palette(PaletteMsg),
}
