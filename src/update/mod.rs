//! Update functions for the Elm-style architecture
//!
//! All state transformations flow through these functions.

mod buffer;
mod palette;
mod pipeline;
mod preview;

use crate::commands::Cmd;
use crate::error::Result;
use crate::messages::Msg;
use crate::model::StudioModel;

#[cfg(debug_assertions)]
use crate::tracing::SessionSnapshot;
#[cfg(debug_assertions)]
use tracing::{debug, span, Level};

pub use buffer::update_buffer;
pub use palette::update_palette;
pub use pipeline::{publish_active, update_pipeline};
pub use preview::update_preview;

/// Main update function - dispatches to sub-handlers
///
/// Only lookup failures (unknown file ids) are errors; the model is left
/// unchanged when one is returned.
///
/// In debug builds, this wraps with tracing instrumentation.
#[inline]
pub fn update(model: &mut StudioModel, msg: Msg) -> Result<Option<Cmd>> {
    #[cfg(debug_assertions)]
    {
        update_traced(model, msg)
    }
    #[cfg(not(debug_assertions))]
    {
        update_inner(model, msg)
    }
}

/// Inner update logic (no tracing)
fn update_inner(model: &mut StudioModel, msg: Msg) -> Result<Option<Cmd>> {
    match msg {
        Msg::Buffer(m) => buffer::update_buffer(model, m),
        Msg::Pipeline(m) => Ok(pipeline::update_pipeline(model, m)),
        Msg::Preview(m) => Ok(preview::update_preview(model, m)),
        Msg::Palette(m) => palette::update_palette(model, m),
    }
}

/// Traced update wrapper (debug builds only)
///
/// Captures a session snapshot before and after and logs the difference.
#[cfg(debug_assertions)]
fn update_traced(model: &mut StudioModel, msg: Msg) -> Result<Option<Cmd>> {
    let msg_name = msg_type_name(&msg);
    let _span = span!(Level::DEBUG, "update", msg = %msg_name).entered();
    debug!(target: "message", msg = %msg_name, "processing");

    let before = SessionSnapshot::from_model(model);
    let result = update_inner(model, msg);

    if let Some(diff) = before.diff(&SessionSnapshot::from_model(model)) {
        debug!(target: "pipeline", %diff, "state changed");
    }
    if let Err(ref e) = result {
        debug!(target: "message", msg = %msg_name, error = %e, "rejected");
    }
    result
}

/// Get a display name for a message
///
/// Text payloads are summarized by length so whole files don't end up in
/// the log.
#[cfg(debug_assertions)]
fn msg_type_name(msg: &Msg) -> String {
    use crate::messages::{BufferMsg, PreviewMsg};

    match msg {
        Msg::Buffer(BufferMsg::Edit(text)) => format!("Buffer::Edit({} bytes)", text.len()),
        Msg::Buffer(BufferMsg::Import(files)) => format!("Buffer::Import({} files)", files.len()),
        Msg::Buffer(BufferMsg::FilesRead(files)) => {
            format!("Buffer::FilesRead({} files)", files.len())
        }
        Msg::Buffer(m) => format!("Buffer::{:?}", m),
        Msg::Pipeline(m) => format!("Pipeline::{:?}", m),
        Msg::Preview(PreviewMsg::Rendered(outcome)) => {
            format!("Preview::Rendered(v{})", outcome.version)
        }
        Msg::Palette(m) => format!("Palette::{:?}", m),
    }
}
