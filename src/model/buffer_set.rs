//! Buffer store - the open source files and which one is active
//!
//! Files are append-only for the lifetime of a session. Every body mutation
//! goes through [`BufferSet::replace_body`], which is what serializes user
//! edits and token substitutions against each other.

use std::fmt;

use ropey::Rope;
use serde::Serialize;

use crate::error::{Result, StudioError};
use crate::languages::LanguageMode;

/// Starter component seeded into every new session
pub const DEFAULT_SOURCE: &str = r#"// React is automatically provided in the preview environment
// No need to import it explicitly

const App = () => {
  return (
    <div className="bg-blue-500 p-4 rounded-lg shadow-md">
      <h1 className="text-white text-2xl font-bold mb-4">Hello World</h1>
      <button
        className="bg-green-500 hover:bg-green-700 text-white font-bold py-2 px-4 rounded transition-colors"
        style={{ border: '1px solid #ccc', color: '#fff' }}
      >
        Click Me
      </button>
    </div>
  );
};

// Render the App component in the preview
render(<App />);"#;

/// Session-unique identifier for a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FileId(pub u64);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file-{}", self.0)
    }
}

/// An open source file
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub id: FileId,
    /// Display name, only used to infer the language mode
    pub name: String,
    pub mode: LanguageMode,
    /// The text body
    pub body: Rope,
    /// Incremented on each body mutation
    pub revision: u64,
}

impl SourceFile {
    pub fn new(id: FileId, name: impl Into<String>, text: &str) -> Self {
        let name = name.into();
        Self {
            id,
            mode: LanguageMode::from_file_name(&name),
            name,
            body: Rope::from_str(text),
            revision: 0,
        }
    }

    /// Snapshot of the body as a string
    pub fn text(&self) -> String {
        self.body.to_string()
    }

    pub fn summary(&self) -> FileSummary {
        FileSummary {
            id: self.id,
            name: self.name.clone(),
            mode: self.mode,
            chars: self.body.len_chars(),
            lines: self.body.len_lines(),
        }
    }
}

/// Listing entry for a source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSummary {
    pub id: FileId,
    pub name: String,
    pub mode: LanguageMode,
    pub chars: usize,
    pub lines: usize,
}

/// Result of a body mutation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyChange {
    /// New text equals the current body; nothing downstream should recompute
    Unchanged,
    Replaced { revision: u64 },
}

impl BodyChange {
    pub fn is_replaced(&self) -> bool {
        matches!(self, BodyChange::Replaced { .. })
    }
}

/// The ordered set of open files plus the active one
///
/// Never empty: construction seeds one file, and files are never removed.
#[derive(Debug, Clone)]
pub struct BufferSet {
    files: Vec<SourceFile>,
    /// Index into `files`; stable because the set is append-only
    active: usize,
    next_id: u64,
}

impl BufferSet {
    /// Create a set holding a single seeded file
    pub fn new(name: &str, text: &str) -> Self {
        Self {
            files: vec![SourceFile::new(FileId(1), name, text)],
            active: 0,
            next_id: 2,
        }
    }

    /// Create a set seeded with the starter component
    pub fn with_default_file(name: &str) -> Self {
        Self::new(name, DEFAULT_SOURCE)
    }

    /// Summaries in insertion order
    pub fn list_files(&self) -> Vec<FileSummary> {
        self.files.iter().map(SourceFile::summary).collect()
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn active(&self) -> &SourceFile {
        &self.files[self.active]
    }

    pub fn active_id(&self) -> FileId {
        self.files[self.active].id
    }

    pub fn get(&self, id: FileId) -> Option<&SourceFile> {
        self.files.iter().find(|f| f.id == id)
    }

    pub fn contains(&self, id: FileId) -> bool {
        self.index_of(id).is_some()
    }

    fn index_of(&self, id: FileId) -> Option<usize> {
        self.files.iter().position(|f| f.id == id)
    }

    /// Make `id` the active file
    pub fn set_active(&mut self, id: FileId) -> Result<()> {
        let index = self.index_of(id).ok_or_else(|| StudioError::not_found(id))?;
        self.active = index;
        Ok(())
    }

    /// Append one file per `(name, text)` pair; the last one becomes active
    ///
    /// Returns the new ids in input order. An empty input leaves the active
    /// file untouched.
    pub fn import_files<I, N, T>(&mut self, raw: I) -> Vec<FileId>
    where
        I: IntoIterator<Item = (N, T)>,
        N: Into<String>,
        T: AsRef<str>,
    {
        let mut ids = Vec::new();
        for (name, text) in raw {
            let id = FileId(self.next_id);
            self.next_id += 1;
            self.files.push(SourceFile::new(id, name, text.as_ref()));
            ids.push(id);
        }
        if !ids.is_empty() {
            self.active = self.files.len() - 1;
        }
        ids
    }

    /// The single mutation path for file bodies
    ///
    /// Replacing a body with identical text is a no-op and reports
    /// [`BodyChange::Unchanged`].
    pub fn replace_body(&mut self, id: FileId, new_text: &str) -> Result<BodyChange> {
        let index = self.index_of(id).ok_or_else(|| StudioError::not_found(id))?;
        Ok(Self::apply(&mut self.files[index], new_text))
    }

    /// Replace the active file's body
    pub fn replace_active_body(&mut self, new_text: &str) -> BodyChange {
        Self::apply(&mut self.files[self.active], new_text)
    }

    fn apply(file: &mut SourceFile, new_text: &str) -> BodyChange {
        if file.body == new_text {
            return BodyChange::Unchanged;
        }
        file.body = Rope::from_str(new_text);
        file.revision += 1;
        BodyChange::Replaced {
            revision: file.revision,
        }
    }
}
