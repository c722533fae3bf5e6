//! Change pipeline update handlers
//!
//! Publishing is the fan-out point: a new canonical source rescans the
//! palette and starts a render of the transformed source.

use crate::commands::Cmd;
use crate::messages::PipelineMsg;
use crate::model::{FileId, StudioModel};
use crate::preview::transform;

/// Handle change pipeline messages
pub fn update_pipeline(model: &mut StudioModel, msg: PipelineMsg) -> Option<Cmd> {
    match msg {
        PipelineMsg::QuietPeriodElapsed { ticket } => {
            let Some(pending) = model.pipeline.take_if_current(ticket) else {
                tracing::debug!(ticket, "ignoring superseded publish timer");
                return None;
            };
            let active = model.buffers.active_id();
            if pending.file_id != active {
                // A switch publishes synchronously and cancels the timer, so
                // this only happens if a timer outlived its cancellation.
                tracing::warn!(
                    pending = %pending.file_id,
                    %active,
                    "dropping publish for inactive file"
                );
                return None;
            }
            let text = model.buffers.active().text();
            Some(publish(model, active, text))
        }
        PipelineMsg::PublishNow => Some(publish_active(model)),
    }
}

/// Publish the active file now, cancelling any pending debounced publish
pub fn publish_active(model: &mut StudioModel) -> Cmd {
    let cancel = match model.pipeline.cancel() {
        Some(pending) => {
            tracing::debug!(ticket = pending.ticket, "cancelled pending publish");
            Cmd::CancelPublish
        }
        None => Cmd::None,
    };
    let file = model.buffers.active();
    let (file_id, text) = (file.id, file.text());
    Cmd::batch(vec![cancel, publish(model, file_id, text)])
}

fn publish(model: &mut StudioModel, file_id: FileId, text: String) -> Cmd {
    let canonical = model.pipeline.publish(file_id, text);
    let version = canonical.version;

    model.palette.refresh(version, &canonical.text);
    let transformed = transform(&canonical.text);
    let code = transformed.code.clone();

    tracing::debug!(
        version,
        file = %file_id,
        tokens = model.palette.tokens().len(),
        target = ?transformed.target,
        "published canonical source"
    );
    model.preview.request(version, transformed);

    Cmd::RunRender { version, code }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StudioConfig;

    #[test]
    fn test_superseded_timer_is_ignored() {
        let mut model = StudioModel::new(StudioConfig::default());
        let id = model.buffers.active_id();
        let old = model.pipeline.schedule(id);
        let _new = model.pipeline.schedule(id);
        let cmd = update_pipeline(&mut model, PipelineMsg::QuietPeriodElapsed { ticket: old });
        assert!(cmd.is_none());
        assert_eq!(model.pipeline.version(), 0);
    }

    #[test]
    fn test_publish_now_cancels_and_renders() {
        let mut model = StudioModel::new(StudioConfig::default());
        let id = model.buffers.active_id();
        model.pipeline.schedule(id);
        let cmds = update_pipeline(&mut model, PipelineMsg::PublishNow)
            .map(Cmd::flatten)
            .unwrap_or_default();
        assert_eq!(cmds[0], Cmd::CancelPublish);
        assert!(matches!(cmds[1], Cmd::RunRender { version: 1, .. }));
        assert!(model.pipeline.pending().is_none());
        assert!(!model.palette.tokens().is_empty());
        assert!(model.preview.is_pending());
    }
}
