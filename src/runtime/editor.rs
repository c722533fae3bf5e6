//! Editor widget seam
//!
//! The text-editing surface is external. The runtime only needs to push text
//! into it after a file switch or a substitution; raw change events come
//! back in through `Studio::edit`.

use std::sync::{Arc, Mutex};

use crate::languages::LanguageMode;
use crate::model::FileId;

pub trait EditorSurface: Send {
    /// Show `text` for `file_id` without emitting a change event
    fn set_text(&mut self, file_id: FileId, mode: LanguageMode, text: &str);
}

#[derive(Debug, Default)]
struct HeadlessState {
    file_id: Option<FileId>,
    mode: LanguageMode,
    text: String,
    updates: usize,
}

/// An editor surface that just records what it was told to show
///
/// Clones share state, so a test can keep one handle and give another to
/// the studio.
#[derive(Debug, Clone, Default)]
pub struct HeadlessEditor {
    state: Arc<Mutex<HeadlessState>>,
}

impl HeadlessEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> String {
        self.with(|s| s.text.clone())
    }

    pub fn file_id(&self) -> Option<FileId> {
        self.with(|s| s.file_id)
    }

    pub fn mode(&self) -> LanguageMode {
        self.with(|s| s.mode)
    }

    /// Number of `set_text` calls received
    pub fn updates(&self) -> usize {
        self.with(|s| s.updates)
    }

    fn with<R>(&self, f: impl FnOnce(&mut HeadlessState) -> R) -> R {
        let mut guard = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }
}

impl EditorSurface for HeadlessEditor {
    fn set_text(&mut self, file_id: FileId, mode: LanguageMode, text: &str) {
        self.with(|s| {
            s.file_id = Some(file_id);
            s.mode = mode;
            s.text = text.to_string();
            s.updates += 1;
        });
    }
}
