//! Calendar document model: parsing, identity, and single-event serialization.

use std::collections::HashSet;
use std::str::FromStr;

use icalendar::{Calendar, Component, Event};

use crate::error::{SyncError, SyncResult};

/// Derive the path-safe key an event is addressed by on the destination.
///
/// The destination embeds this as a `{uid}.ics` path segment, so apostrophes
/// are dropped and every `/` becomes the literal token `slash`. Total and
/// deterministic; distinct uids colliding after normalization is an accepted
/// risk.
pub fn normalize_uid(uid: &str) -> String {
    uid.replace('\'', "").replace('/', "slash")
}

/// One VEVENT from a calendar document.
#[derive(Debug, Clone)]
pub struct EventRecord {
    pub uid: String,
    /// Human-readable title, only used for log output.
    pub summary: String,
    inner: Event,
}

impl EventRecord {
    /// The normalized identity this event is keyed and addressed by.
    pub fn identity(&self) -> String {
        normalize_uid(&self.uid)
    }

    /// Serialize as a standalone VCALENDAR document containing just this event.
    pub fn standalone_ics(&self) -> String {
        let mut cal = Calendar::new();
        cal.push(self.inner.clone());
        let cal = cal.done();
        cal.to_string()
    }
}

/// A parsed calendar: a set of event records keyed by normalized identity.
///
/// Built once per fetch and discarded after one reconciliation pass.
#[derive(Debug, Default)]
pub struct CalendarDocument {
    events: Vec<EventRecord>,
}

impl CalendarDocument {
    /// Parse an iCalendar document into a set of event records.
    ///
    /// VEVENTs without a usable UID are skipped with a warning rather than
    /// failing the whole document. Later events that repeat an identity
    /// already seen (recurrence overrides share their master's UID) are
    /// skipped too, keeping the first occurrence.
    pub fn parse(text: &str, context: &str) -> SyncResult<Self> {
        let calendar = Calendar::from_str(text).map_err(|message| SyncError::Parse {
            context: context.to_string(),
            message,
        })?;

        let mut events = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for component in &calendar.components {
            let Some(vevent) = component.as_event() else {
                continue;
            };

            let uid = vevent.get_uid().unwrap_or_default();
            let summary = vevent.get_summary().unwrap_or("(no title)").to_string();

            if uid.is_empty() {
                tracing::warn!("Skipping event without a UID ({})", summary);
                continue;
            }

            let record = EventRecord {
                uid: uid.to_string(),
                summary,
                inner: vevent.clone(),
            };

            if !seen.insert(record.identity()) {
                tracing::warn!("Skipping duplicate of already-seen UID {}", record.uid);
                continue;
            }

            events.push(record);
        }

        Ok(Self { events })
    }

    /// Events in document order.
    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    /// The set of normalized identities in this document.
    pub fn identities(&self) -> HashSet<String> {
        self.events.iter().map(|e| e.identity()).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
