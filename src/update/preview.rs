//! Preview update handlers

use crate::commands::Cmd;
use crate::messages::PreviewMsg;
use crate::model::StudioModel;

/// Handle preview messages
///
/// Outcomes are matched against the current canonical version, never by
/// arrival order; a stale outcome is dropped and its sandbox disposed.
pub fn update_preview(model: &mut StudioModel, msg: PreviewMsg) -> Option<Cmd> {
    match msg {
        PreviewMsg::Rendered(outcome) => {
            let current = model.pipeline.version();
            let version = outcome.version;
            if model.preview.accept(outcome, current) {
                tracing::debug!(version, "preview updated");
            }
            None
        }
    }
}
