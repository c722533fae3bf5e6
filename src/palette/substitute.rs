//! Token substitution
//!
//! Literal, whole-buffer, all-occurrences replacement. Not scope aware: the
//! old text is rewritten inside strings, comments and longer literals too.

use crate::error::Result;
use crate::model::{BodyChange, BufferSet, FileId};

/// Text after a substitution plus how many occurrences were rewritten
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub text: String,
    pub replaced: usize,
}

/// Outcome of substituting into a stored file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubstitutionReport {
    pub replaced: usize,
    pub change: BodyChange,
}

/// Replace every occurrence of `old` in `source` with `new`
///
/// An empty `old` matches nothing.
pub fn substitute_text(source: &str, old: &str, new: &str) -> Substitution {
    if old.is_empty() {
        return Substitution {
            text: source.to_string(),
            replaced: 0,
        };
    }
    Substitution {
        replaced: source.matches(old).count(),
        text: source.replace(old, new),
    }
}

/// Substitute inside a stored file through the buffer mutation path
///
/// Fails with `NotFound` for unknown ids. No occurrences is not an error.
pub fn substitute(
    buffers: &mut BufferSet,
    id: FileId,
    old: &str,
    new: &str,
) -> Result<SubstitutionReport> {
    let file = buffers
        .get(id)
        .ok_or_else(|| crate::error::StudioError::not_found(id))?;
    let result = substitute_text(&file.text(), old, new);
    if result.replaced == 0 {
        return Ok(SubstitutionReport {
            replaced: 0,
            change: BodyChange::Unchanged,
        });
    }
    let change = buffers.replace_body(id, &result.text)?;
    tracing::info!(
        file = %id,
        old,
        new,
        replaced = result.replaced,
        "substituted color token"
    );
    Ok(SubstitutionReport {
        replaced: result.replaced,
        change,
    })
}
