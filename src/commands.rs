//! Command types for the Elm-style architecture
//!
//! Commands represent side effects that should be performed after an update.

use std::path::PathBuf;

use crate::model::FileId;

/// Side effects returned by `update`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Cmd {
    /// No command
    #[default]
    None,
    /// Execute multiple commands in order
    Batch(Vec<Cmd>),

    // === Change Pipeline ===
    /// Arm the debounce timer, replacing any armed one
    /// After delay_ms, sends Msg::Pipeline(QuietPeriodElapsed { ticket })
    SchedulePublish { ticket: u64, delay_ms: u64 },
    /// Disarm the debounce timer
    CancelPublish,

    // === Preview ===
    /// Evaluate preview source in a fresh sandbox
    /// Sends Msg::Preview(Rendered) when done
    RunRender { version: u64, code: String },

    // === Editor widget ===
    /// Replace the text shown by the editor widget
    SetEditorText { file_id: FileId, text: String },

    // === File import ===
    /// Read files in the background
    /// Sends Msg::Buffer(FilesRead) when done
    ReadFiles { paths: Vec<PathBuf> },
}

impl Cmd {
    /// Create a batch of commands
    ///
    /// `Cmd::None` entries are dropped and a single survivor is returned as is.
    pub fn batch(cmds: Vec<Cmd>) -> Self {
        let mut cmds: Vec<Cmd> = cmds.into_iter().filter(|c| !c.is_none()).collect();
        match cmds.len() {
            0 => Cmd::None,
            1 => cmds.remove(0),
            _ => Cmd::Batch(cmds),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Cmd::None)
    }

    /// Flatten nested batches into a list of leaf commands
    pub fn flatten(self) -> Vec<Cmd> {
        match self {
            Cmd::None => Vec::new(),
            Cmd::Batch(cmds) => cmds.into_iter().flat_map(Cmd::flatten).collect(),
            other => vec![other],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_drops_none_and_unwraps_single() {
        assert_eq!(Cmd::batch(vec![Cmd::None, Cmd::None]), Cmd::None);
        assert_eq!(
            Cmd::batch(vec![Cmd::None, Cmd::CancelPublish]),
            Cmd::CancelPublish
        );
        let cmd = Cmd::batch(vec![Cmd::CancelPublish, Cmd::batch(vec![Cmd::CancelPublish])]);
        assert!(matches!(cmd, Cmd::Batch(ref c) if c.len() == 2));
    }

    #[test]
    fn test_flatten_nested() {
        let cmd = Cmd::Batch(vec![
            Cmd::CancelPublish,
            Cmd::Batch(vec![Cmd::None, Cmd::ReadFiles { paths: vec![] }]),
        ]);
        assert_eq!(cmd.flatten().len(), 2);
    }
}
