//! Language mode detection
//!
//! Maps file names to the mode the editor widget highlights with. The core
//! itself treats every mode the same way; the mode is display metadata.

use serde::Serialize;

/// Editor language modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageMode {
    #[default]
    TypeScript,
    JavaScript,
    Css,
    Html,
}

impl LanguageMode {
    /// Detect the mode from a display name by suffix
    ///
    /// Unknown or missing extensions fall back to TypeScript, which is also
    /// what the default `App.tsx` buffer uses.
    pub fn from_file_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower.ends_with(".ts") || lower.ends_with(".tsx") {
            LanguageMode::TypeScript
        } else if lower.ends_with(".js") || lower.ends_with(".jsx") {
            LanguageMode::JavaScript
        } else if lower.ends_with(".css") {
            LanguageMode::Css
        } else if lower.ends_with(".html") {
            LanguageMode::Html
        } else {
            LanguageMode::TypeScript
        }
    }

    /// Language id understood by the editor widget
    pub fn editor_id(&self) -> &'static str {
        match self {
            LanguageMode::TypeScript => "typescript",
            LanguageMode::JavaScript => "javascript",
            LanguageMode::Css => "css",
            LanguageMode::Html => "html",
        }
    }

    /// Get display name for the mode
    pub fn display_name(&self) -> &'static str {
        match self {
            LanguageMode::TypeScript => "TypeScript",
            LanguageMode::JavaScript => "JavaScript",
            LanguageMode::Css => "CSS",
            LanguageMode::Html => "HTML",
        }
    }

    /// Whether sources in this mode can be rendered as a component preview
    pub fn is_script(&self) -> bool {
        matches!(self, LanguageMode::TypeScript | LanguageMode::JavaScript)
    }
}
