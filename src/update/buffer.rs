//! Buffer store update handlers

use std::path::Path;

use crate::commands::Cmd;
use crate::error::Result;
use crate::messages::BufferMsg;
use crate::model::{BodyChange, StudioModel};

use super::pipeline::publish_active;

/// Handle buffer store messages
pub fn update_buffer(model: &mut StudioModel, msg: BufferMsg) -> Result<Option<Cmd>> {
    match msg {
        BufferMsg::Edit(text) => Ok(edit(model, &text)),
        BufferMsg::SetActive(id) => {
            if let Err(e) = model.buffers.set_active(id) {
                tracing::error!(file = %id, "set_active on unknown file");
                return Err(e);
            }
            tracing::debug!(file = %id, "switched active file");
            Ok(Some(switch_cmd(model)))
        }
        BufferMsg::Import(files) => Ok(import(model, files)),
        BufferMsg::ImportPaths(paths) => {
            if paths.is_empty() {
                return Ok(None);
            }
            Ok(Some(Cmd::ReadFiles { paths }))
        }
        BufferMsg::FilesRead(results) => {
            let mut files = Vec::with_capacity(results.len());
            for (path, result) in results {
                match result {
                    Ok(text) => files.push((display_name(&path), text)),
                    Err(e) => tracing::warn!("Failed to read {}: {}", path.display(), e),
                }
            }
            Ok(import(model, files))
        }
    }
}

/// Immediate buffer update plus a debounced publish
fn edit(model: &mut StudioModel, text: &str) -> Option<Cmd> {
    match model.buffers.replace_active_body(text) {
        BodyChange::Unchanged => {
            tracing::trace!("edit matches current body, nothing to publish");
            None
        }
        BodyChange::Replaced { revision } => {
            let file_id = model.buffers.active_id();
            let ticket = model.pipeline.schedule(file_id);
            tracing::trace!(file = %file_id, revision, ticket, "edit scheduled for publish");
            Some(Cmd::SchedulePublish {
                ticket,
                delay_ms: model.pipeline.quiet_period_ms,
            })
        }
    }
}

fn import(model: &mut StudioModel, files: Vec<(String, String)>) -> Option<Cmd> {
    if files.is_empty() {
        return None;
    }
    let ids = model.buffers.import_files(files);
    tracing::info!(count = ids.len(), active = %model.buffers.active_id(), "imported files");
    Some(switch_cmd(model))
}

/// Synchronous publish of the (new) active file, mirrored into the editor
fn switch_cmd(model: &mut StudioModel) -> Cmd {
    let publish = publish_active(model);
    let active = model.buffers.active();
    Cmd::batch(vec![
        publish,
        Cmd::SetEditorText {
            file_id: active.id,
            text: active.text(),
        },
    ])
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StudioConfig;
    use crate::model::FileId;

    fn model() -> StudioModel {
        StudioModel::new(StudioConfig::default())
    }

    #[test]
    fn test_edit_schedules_with_quiet_period() {
        let mut model = model();
        let cmd = update_buffer(&mut model, BufferMsg::Edit("const A = 1;".into())).unwrap();
        assert!(matches!(
            cmd,
            Some(Cmd::SchedulePublish { delay_ms: 300, .. })
        ));
        assert_eq!(model.buffers.active().text(), "const A = 1;");
        assert_eq!(model.pipeline.version(), 0);
    }

    #[test]
    fn test_identical_edit_is_noop() {
        let mut model = model();
        let text = model.buffers.active().text();
        assert_eq!(update_buffer(&mut model, BufferMsg::Edit(text)).unwrap(), None);
        assert!(model.pipeline.pending().is_none());
    }

    #[test]
    fn test_set_active_unknown_fails() {
        let mut model = model();
        let err = update_buffer(&mut model, BufferMsg::SetActive(FileId(99))).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_files_read_skips_failures() {
        let mut model = model();
        let cmd = update_buffer(
            &mut model,
            BufferMsg::FilesRead(vec![
                ("/tmp/a/Card.jsx".into(), Ok("const Card = () => <p />;".into())),
                ("/tmp/missing.tsx".into(), Err("not found".into())),
            ]),
        )
        .unwrap();
        assert!(cmd.is_some());
        assert_eq!(model.buffers.len(), 2);
        assert_eq!(model.buffers.active().name, "Card.jsx");
        assert_eq!(model.pipeline.version(), 1);
    }
}
