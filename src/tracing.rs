//! Logging setup and debug snapshots of session state
//!
//! # Usage
//!
//! Configure via RUST_LOG environment variable:
//! - `RUST_LOG=debug` - all debug logs
//! - `RUST_LOG=pipeline=debug,message=debug` - scoped filtering
//! - `RUST_LOG=swatch::preview=trace` - module-level filtering
//!
//! # Log Files
//!
//! Logs are written to `~/.config/swatch/logs/swatch.log` with daily rotation.
//! File logging uses debug level by default for more verbose troubleshooting.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::model::{FileId, StudioModel};

/// Initialize tracing subscriber with console and file logging
///
/// Console output respects RUST_LOG (default `warn`). Console logs go to
/// stderr so `--json` output on stdout stays parseable.
pub fn init() {
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    // Console layer - respects RUST_LOG
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .with_filter(console_filter);

    // File layer - always debug level for troubleshooting
    let file_layer = match crate::config_paths::ensure_logs_dir() {
        Ok(logs_dir) => {
            let file_appender = tracing_appender::rolling::daily(logs_dir, "swatch.log");
            Some(
                fmt::layer()
                    .with_writer(file_appender)
                    .with_ansi(false)
                    .with_target(true)
                    .with_line_number(true)
                    .with_filter(EnvFilter::new("debug")),
            )
        }
        Err(e) => {
            eprintln!("Warning: Could not initialize file logging: {}", e);
            None
        }
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
}

/// Lightweight snapshot of session state for diffing across an update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub file_count: usize,
    pub active: FileId,
    pub active_revision: u64,
    pub version: u64,
    pub pending_ticket: Option<u64>,
    pub token_count: usize,
    pub preview_failed: bool,
}

impl SessionSnapshot {
    pub fn from_model(model: &StudioModel) -> Self {
        let active = model.buffers.active();
        Self {
            file_count: model.buffers.len(),
            active: active.id,
            active_revision: active.revision,
            version: model.pipeline.version(),
            pending_ticket: model.pipeline.pending().map(|p| p.ticket),
            token_count: model.palette.tokens().len(),
            preview_failed: model.preview.failure().is_some(),
        }
    }

    /// Describe what changed between two snapshots
    pub fn diff(&self, other: &SessionSnapshot) -> Option<String> {
        let mut changes = Vec::new();
        if self.file_count != other.file_count {
            changes.push(format!("files: {} → {}", self.file_count, other.file_count));
        }
        if self.active != other.active {
            changes.push(format!("active: {} → {}", self.active, other.active));
        } else if self.active_revision != other.active_revision {
            changes.push(format!(
                "revision: {} → {}",
                self.active_revision, other.active_revision
            ));
        }
        if self.version != other.version {
            changes.push(format!("version: {} → {}", self.version, other.version));
        }
        if self.pending_ticket != other.pending_ticket {
            let status = match other.pending_ticket {
                Some(ticket) => format!("publish pending (ticket {})", ticket),
                None => "no publish pending".to_string(),
            };
            changes.push(status);
        }
        if self.token_count != other.token_count {
            changes.push(format!("tokens: {} → {}", self.token_count, other.token_count));
        }
        if self.preview_failed != other.preview_failed {
            let status = if other.preview_failed {
                "preview failed"
            } else {
                "preview recovered"
            };
            changes.push(status.to_string());
        }

        if changes.is_empty() {
            None
        } else {
            Some(changes.join("; "))
        }
    }
}
