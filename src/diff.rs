//! Set-difference between a destination calendar and its source feed.
//!
//! This module only computes what a pass would change, without applying
//! anything. Used by both the reconciler and the status command.

use crate::ics::{CalendarDocument, EventRecord};

/// A single pending change, named for display.
#[derive(Debug, Clone)]
pub struct Change {
    pub identity: String,
    pub summary: String,
}

/// The changes one reconciliation pass will apply to a destination.
pub struct ReconcilePlan<'a> {
    /// Source events missing from the destination, in feed order.
    pub to_import: Vec<&'a EventRecord>,
    /// Destination events missing from the feed, in export order.
    pub to_delete: Vec<Change>,
}

impl ReconcilePlan<'_> {
    pub fn is_empty(&self) -> bool {
        self.to_import.is_empty() && self.to_delete.is_empty()
    }
}

/// Compute what to import and what to delete.
///
/// Both identity sets are taken once from the two snapshots. An identity
/// present on both sides is left untouched, so nothing is ever both imported
/// and deleted in the same pass.
pub fn compute<'a>(
    destination: &CalendarDocument,
    source: &'a CalendarDocument,
) -> ReconcilePlan<'a> {
    let destination_identities = destination.identities();
    let source_identities = source.identities();

    let to_import = source
        .events()
        .iter()
        .filter(|e| !destination_identities.contains(&e.identity()))
        .collect();

    let to_delete = destination
        .events()
        .iter()
        .filter(|e| !source_identities.contains(&e.identity()))
        .map(|e| Change {
            identity: e.identity(),
            summary: e.summary.clone(),
        })
        .collect();

    ReconcilePlan {
        to_import,
        to_delete,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(uids: &[&str]) -> CalendarDocument {
        let mut ics = String::from("BEGIN:VCALENDAR\nVERSION:2.0\nPRODID:TEST\n");
        for uid in uids {
            ics.push_str(&format!(
                "BEGIN:VEVENT\nUID:{uid}\nSUMMARY:Event {uid}\nDTSTART:20240101T100000Z\nDTEND:20240101T110000Z\nEND:VEVENT\n"
            ));
        }
        ics.push_str("END:VCALENDAR");
        CalendarDocument::parse(&ics, "test").expect("Should parse")
    }

    #[test]
    fn test_import_and_delete_are_disjoint_differences() {
        // Destination has {A, B}, source has {B, C}: import C, delete A, B untouched.
        let destination = doc(&["A", "B"]);
        let source = doc(&["B", "C"]);

        let plan = compute(&destination, &source);

        assert_eq!(plan.to_import.len(), 1);
        assert_eq!(plan.to_import[0].uid, "C");
        assert_eq!(plan.to_delete.len(), 1);
        assert_eq!(plan.to_delete[0].identity, "A");
    }

    #[test]
    fn test_identical_documents_produce_empty_plan() {
        let destination = doc(&["A", "B", "C"]);
        let source = doc(&["A", "B", "C"]);

        let plan = compute(&destination, &source);

        assert!(plan.is_empty());
    }

    #[test]
    fn test_empty_destination_imports_everything() {
        let destination = doc(&[]);
        let source = doc(&["A", "B"]);

        let plan = compute(&destination, &source);

        assert_eq!(plan.to_import.len(), 2);
        assert!(plan.to_delete.is_empty());
    }

    #[test]
    fn test_empty_source_deletes_everything() {
        let destination = doc(&["A", "B"]);
        let source = doc(&[]);

        let plan = compute(&destination, &source);

        assert!(plan.to_import.is_empty());
        assert_eq!(plan.to_delete.len(), 2);
        assert_eq!(plan.to_delete[0].identity, "A");
        assert_eq!(plan.to_delete[1].identity, "B");
    }

    #[test]
    fn test_matching_is_on_normalized_identity() {
        // A destination event addressed by its normalized uid matches a
        // source uid that normalizes to the same key.
        let destination = doc(&["teamslashevent"]);
        let source = doc(&["team/event"]);

        let plan = compute(&destination, &source);

        assert!(
            plan.is_empty(),
            "Identities equal after normalization must be neither imported nor deleted"
        );
    }
}
