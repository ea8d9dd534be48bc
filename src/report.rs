//! Outcome reporting.
//!
//! Components report what happened through an injected [`Reporter`] instead
//! of a process-wide logger, so the run can be observed by callers and by
//! tests. The production implementation writes one log line per pair, per
//! event action, and per error.

use crate::error::SyncError;
use crate::sync::PairSummary;

/// What happened to one event during a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Imported,
    /// The destination rejected the event's recurrence rule; tolerated.
    SkippedNoInstances,
    Deleted,
    /// The resource to delete was already gone; tolerated.
    NotFoundOnDelete,
    Failed(String),
}

/// One attempted event action.
#[derive(Debug, Clone)]
pub struct EventAction {
    pub identity: String,
    pub summary: String,
    pub outcome: SyncOutcome,
}

/// Receives progress and outcomes as a run advances.
pub trait Reporter {
    fn pair_started(&self, name: &str);
    fn event(&self, action: &EventAction);
    fn pair_skipped(&self, name: &str, error: &SyncError);
    fn pair_finished(&self, name: &str, summary: &PairSummary);
}

/// Production reporter backed by `tracing`.
pub struct LogReporter;

impl Reporter for LogReporter {
    fn pair_started(&self, name: &str) {
        tracing::info!("Working with calendar {}...", name);
    }

    fn event(&self, action: &EventAction) {
        match &action.outcome {
            SyncOutcome::Imported => {
                tracing::info!("Imported: {} ({})", action.identity, action.summary);
            }
            SyncOutcome::SkippedNoInstances => {
                tracing::warn!("No valid instances: {} ({})", action.identity, action.summary);
            }
            SyncOutcome::Deleted => {
                tracing::info!("Deleted: {}", action.identity);
            }
            SyncOutcome::NotFoundOnDelete => {
                tracing::warn!("Already gone: {}", action.identity);
            }
            SyncOutcome::Failed(detail) => {
                tracing::error!("Failed: {} ({}): {}", action.identity, action.summary, detail);
            }
        }
    }

    fn pair_skipped(&self, name: &str, error: &SyncError) {
        tracing::warn!("Skipping calendar {}: {}", name, error);
    }

    fn pair_finished(&self, name: &str, summary: &PairSummary) {
        tracing::info!(
            "Calendar {} done: {} imported, {} deleted, {} skipped, {} failed",
            name,
            summary.imported,
            summary.deleted,
            summary.skipped_no_instances + summary.not_found_on_delete,
            summary.failed
        );
    }
}
