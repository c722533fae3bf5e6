//! Palette update handlers: token selection and substitution

use crate::commands::Cmd;
use crate::error::Result;
use crate::messages::PaletteMsg;
use crate::model::{FileId, StudioModel};
use crate::palette;

use super::pipeline::publish_active;

/// Handle palette messages
pub fn update_palette(model: &mut StudioModel, msg: PaletteMsg) -> Result<Option<Cmd>> {
    match msg {
        PaletteMsg::Select(text) => {
            if !model.palette.select(&text) {
                tracing::debug!(token = %text, "selected text is not a detected token");
            }
            Ok(None)
        }
        PaletteMsg::ClearSelection => {
            model.palette.clear_selection();
            Ok(None)
        }
        PaletteMsg::ApplyColor(new) => {
            let Some(old) = model.palette.clear_selection() else {
                tracing::debug!("apply color without a selected token");
                return Ok(None);
            };
            let file_id = model.buffers.active_id();
            substitute(model, file_id, &old, &new)
        }
        PaletteMsg::Substitute { file_id, old, new } => substitute(model, file_id, &old, &new),
    }
}

/// Rewrite a file, then publish synchronously if it is the active one
fn substitute(model: &mut StudioModel, file_id: FileId, old: &str, new: &str) -> Result<Option<Cmd>> {
    let report = match palette::substitute(&mut model.buffers, file_id, old, new) {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(file = %file_id, "substitution into unknown file");
            return Err(e);
        }
    };
    model.palette.record_substitution(report);

    if !report.change.is_replaced() || file_id != model.buffers.active_id() {
        return Ok(None);
    }

    let publish = publish_active(model);
    Ok(Some(Cmd::batch(vec![
        publish,
        Cmd::SetEditorText {
            file_id,
            text: model.buffers.active().text(),
        },
    ])))
}
