//! Change pipeline state
//!
//! Edits update the buffer immediately but reach downstream consumers only
//! through a published [`CanonicalSource`]. Publishing is trailing-edge
//! debounced: every edit replaces the single pending publish with a new
//! ticket, and only a timer carrying the current ticket may fire it.

use serde::Serialize;

use super::FileId;

/// Quiet period before an edit is published
pub const DEFAULT_QUIET_PERIOD_MS: u64 = 300;

/// The published snapshot downstream recompute operates on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalSource {
    /// Monotonic, starts at 1 for the first publish
    pub version: u64,
    pub file_id: FileId,
    pub text: String,
}

/// The one publish that may be waiting on the debounce timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingPublish {
    pub ticket: u64,
    pub file_id: FileId,
}

#[derive(Debug, Clone)]
pub struct PipelineState {
    pub quiet_period_ms: u64,
    current: Option<CanonicalSource>,
    pending: Option<PendingPublish>,
    next_ticket: u64,
    /// Edits folded into a later publish
    coalesced: u64,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD_MS)
    }
}

impl PipelineState {
    pub fn new(quiet_period_ms: u64) -> Self {
        Self {
            quiet_period_ms,
            current: None,
            pending: None,
            next_ticket: 1,
            coalesced: 0,
        }
    }

    /// Replace any pending publish with a fresh one and return its ticket
    pub fn schedule(&mut self, file_id: FileId) -> u64 {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        if let Some(previous) = self.pending.replace(PendingPublish { ticket, file_id }) {
            self.coalesced += 1;
            tracing::trace!(
                cancelled = previous.ticket,
                ticket,
                "rescheduled pending publish"
            );
        }
        ticket
    }

    /// Drop the pending publish, returning it
    pub fn cancel(&mut self) -> Option<PendingPublish> {
        self.pending.take()
    }

    pub fn pending(&self) -> Option<PendingPublish> {
        self.pending
    }

    /// Claim the pending publish if `ticket` is still the current one
    ///
    /// A timer for a rescheduled or cancelled publish gets `None`.
    pub fn take_if_current(&mut self, ticket: u64) -> Option<PendingPublish> {
        match self.pending {
            Some(p) if p.ticket == ticket => self.pending.take(),
            _ => None,
        }
    }

    /// Record a new canonical source and return it
    pub fn publish(&mut self, file_id: FileId, text: String) -> &CanonicalSource {
        let version = self.version() + 1;
        self.current.insert(CanonicalSource {
            version,
            file_id,
            text,
        })
    }

    pub fn current(&self) -> Option<&CanonicalSource> {
        self.current.as_ref()
    }

    /// Version of the current canonical source, 0 before the first publish
    pub fn version(&self) -> u64 {
        self.current.as_ref().map_or(0, |c| c.version)
    }

    /// Whether a result computed for `version` is outdated
    pub fn is_stale(&self, version: u64) -> bool {
        version != self.version()
    }

    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }
}
