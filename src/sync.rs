//! The reconciler: applies a computed plan to the destination collection.

use crate::caldav::{CalDavClient, DeleteOutcome, PutOutcome};
use crate::diff;
use crate::ics::CalendarDocument;
use crate::report::{EventAction, Reporter, SyncOutcome};

/// Per-pair counts of event outcomes from one pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PairSummary {
    pub imported: usize,
    pub skipped_no_instances: usize,
    pub deleted: usize,
    pub not_found_on_delete: usize,
    pub failed: usize,
}

impl PairSummary {
    fn record(&mut self, outcome: &SyncOutcome) {
        match outcome {
            SyncOutcome::Imported => self.imported += 1,
            SyncOutcome::SkippedNoInstances => self.skipped_no_instances += 1,
            SyncOutcome::Deleted => self.deleted += 1,
            SyncOutcome::NotFoundOnDelete => self.not_found_on_delete += 1,
            SyncOutcome::Failed(_) => self.failed += 1,
        }
    }
}

/// Run one reconciliation pass against a destination collection.
///
/// Identity sets are taken once from the two snapshots; all imports are
/// applied before any deletion, one call at a time, in document order. A
/// failed write is reported for that event and never stops the remaining
/// operations of either phase.
pub async fn reconcile(
    client: &CalDavClient,
    destination: &CalendarDocument,
    source: &CalendarDocument,
    reporter: &dyn Reporter,
) -> PairSummary {
    let plan = diff::compute(destination, source);
    let mut totals = PairSummary::default();

    for record in &plan.to_import {
        let identity = record.identity();
        let outcome = match client.put(&identity, record).await {
            Ok(PutOutcome::Created) | Ok(PutOutcome::Updated) => SyncOutcome::Imported,
            Ok(PutOutcome::NoValidInstances) => SyncOutcome::SkippedNoInstances,
            Err(err) => SyncOutcome::Failed(err.to_string()),
        };

        totals.record(&outcome);
        reporter.event(&EventAction {
            identity,
            summary: record.summary.clone(),
            outcome,
        });
    }

    for removal in plan.to_delete {
        let outcome = match client.delete(&removal.identity).await {
            Ok(DeleteOutcome::Deleted) => SyncOutcome::Deleted,
            Ok(DeleteOutcome::NotFound) => SyncOutcome::NotFoundOnDelete,
            Err(err) => SyncOutcome::Failed(err.to_string()),
        };

        totals.record(&outcome);
        reporter.event(&EventAction {
            identity: removal.identity,
            summary: removal.summary,
            outcome,
        });
    }

    totals
}
