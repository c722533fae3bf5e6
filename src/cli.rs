//! Command-line interface
//!
//! Supports:
//! - Importing component files (or starting from the default file)
//! - Rewriting color tokens in the active file
//! - Plain-text or JSON session reports

use std::fmt::Write as _;
use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;

use crate::config::StudioConfig;
use crate::model::{FileId, FileSummary};
use crate::palette::ColorToken;
use crate::preview::{PreviewResult, VisualNode};
use crate::runtime::Studio;

/// Live component preview and color-token rewriting
#[derive(Parser, Debug)]
#[command(
    name = "swatch",
    version,
    about = "Live component preview and color-token rewriting"
)]
pub struct CliArgs {
    /// Component source files to import; the last one becomes active
    #[arg(value_name = "PATHS")]
    pub paths: Vec<PathBuf>,

    /// Rewrite every occurrence of a color token in the active file
    #[arg(long = "replace", value_name = "OLD=NEW", value_parser = parse_replacement)]
    pub replacements: Vec<Replacement>,

    /// Print the session report as JSON
    #[arg(long)]
    pub json: bool,

    /// Override the configured debounce quiet period
    #[arg(long, value_name = "N")]
    pub debounce_ms: Option<u64>,
}

/// A `--replace OLD=NEW` argument
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Replacement {
    pub old: String,
    pub new: String,
}

/// Parse `OLD=NEW`; the first `=` splits, so `NEW` may contain more
pub fn parse_replacement(s: &str) -> Result<Replacement, String> {
    let (old, new) = s
        .split_once('=')
        .ok_or_else(|| format!("expected OLD=NEW, got '{}'", s))?;
    if old.is_empty() {
        return Err("the token to replace must not be empty".to_string());
    }
    Ok(Replacement {
        old: old.to_string(),
        new: new.to_string(),
    })
}

impl CliArgs {
    /// Apply command-line overrides to the loaded configuration
    pub fn apply_to(&self, config: &mut StudioConfig) {
        if let Some(ms) = self.debounce_ms {
            config.debounce_ms = ms;
        }
    }
}

/// A replacement and how many occurrences it rewrote
#[derive(Debug, Clone, Serialize)]
pub struct AppliedReplacement {
    #[serde(flatten)]
    pub replacement: Replacement,
    pub replaced: usize,
}

/// Everything the CLI prints about a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub files: Vec<FileSummary>,
    pub active: FileId,
    pub version: u64,
    pub replacements: Vec<AppliedReplacement>,
    pub tokens: Vec<ColorToken>,
    pub preview: Option<PreviewResult>,
    pub source: String,
}

impl SessionReport {
    pub fn collect(studio: &Studio, replacements: Vec<AppliedReplacement>) -> Self {
        Self {
            files: studio.list_files(),
            active: studio.active().id,
            version: studio.canonical().map_or(0, |c| c.version),
            replacements,
            tokens: studio.tokens().to_vec(),
            preview: studio.preview().result(),
            source: studio.active().text(),
        }
    }

    /// Human-readable rendering of the report
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "files:");
        for file in &self.files {
            let marker = if file.id == self.active { '*' } else { ' ' };
            let _ = writeln!(
                out,
                " {} {:<8} {:<24} {:<10} {} lines",
                marker,
                file.id.to_string(),
                file.name,
                file.mode.display_name(),
                file.lines
            );
        }

        for r in &self.replacements {
            let _ = writeln!(
                out,
                "replaced {} -> {} ({} occurrences)",
                r.replacement.old, r.replacement.new, r.replaced
            );
        }

        let _ = writeln!(out, "tokens (v{}):", self.version);
        if self.tokens.is_empty() {
            let _ = writeln!(out, "  (none)");
        }
        for token in &self.tokens {
            let _ = writeln!(
                out,
                "  {:<28} {:<10} x{}",
                token.text, token.display, token.occurrences
            );
        }

        match &self.preview {
            Some(PreviewResult::Rendered(tree)) => {
                let _ = writeln!(out, "preview:");
                for node in &tree.nodes {
                    write_node(&mut out, node, 1);
                }
            }
            Some(PreviewResult::Failed(error)) => {
                let _ = writeln!(out, "preview failed: {}", error);
            }
            None => {
                let _ = writeln!(out, "preview: (pending)");
            }
        }

        let _ = writeln!(out, "--- source ---");
        out.push_str(&self.source);
        if !self.source.ends_with('\n') {
            out.push('\n');
        }
        out
    }
}

fn write_node(out: &mut String, node: &VisualNode, depth: usize) {
    let indent = "  ".repeat(depth);
    match node {
        VisualNode::Element { tag, props, children } => {
            let class = props
                .iter()
                .find(|p| p.name == "className")
                .and_then(|p| p.value.as_str());
            match class {
                Some(class) => {
                    let _ = writeln!(out, "{}<{} class=\"{}\">", indent, tag, class);
                }
                None => {
                    let _ = writeln!(out, "{}<{}>", indent, tag);
                }
            }
            for child in children {
                write_node(out, child, depth + 1);
            }
        }
        VisualNode::Text { text } => {
            let _ = writeln!(out, "{}{:?}", indent, text);
        }
        VisualNode::Opaque { source } => {
            let _ = writeln!(out, "{}{{{}}}", indent, source);
        }
    }
}
