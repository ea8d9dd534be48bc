//! Drives reconciliation across every configured calendar pair.

use std::collections::BTreeMap;

use reqwest::Client;

use crate::caldav::CalDavClient;
use crate::config::CalendarSection;
use crate::diff::{self, Change};
use crate::error::SyncError;
use crate::ics::CalendarDocument;
use crate::report::Reporter;
use crate::source::SourceFetcher;
use crate::sync::{self, PairSummary};

/// How one configured pair ended up.
#[derive(Debug)]
pub enum PairResult {
    Completed(PairSummary),
    /// A fetch or parse failure prevented the pass; no writes were issued.
    Skipped(SyncError),
}

/// Owned copy of a pair's pending changes, for display without applying.
#[derive(Debug)]
pub struct PendingChanges {
    pub to_import: Vec<Change>,
    pub to_delete: Vec<Change>,
}

impl PendingChanges {
    pub fn is_empty(&self) -> bool {
        self.to_import.is_empty() && self.to_delete.is_empty()
    }
}

/// Reconcile every configured pair, in section-name order.
///
/// A pair that fails to fetch or parse is reported and skipped; it never
/// prevents the remaining pairs from running.
pub async fn run_all(
    calendars: &BTreeMap<String, CalendarSection>,
    reporter: &dyn Reporter,
) -> Vec<(String, PairResult)> {
    let http = Client::new();
    let mut results = Vec::new();

    for (name, section) in calendars {
        reporter.pair_started(name);

        let result = match fetch_pair(&http, section).await {
            Ok((client, destination, source)) => {
                let summary = sync::reconcile(&client, &destination, &source, reporter).await;
                reporter.pair_finished(name, &summary);
                PairResult::Completed(summary)
            }
            Err(error) => {
                reporter.pair_skipped(name, &error);
                PairResult::Skipped(error)
            }
        };

        results.push((name.clone(), result));
    }

    results
}

/// Compute every pair's pending changes without issuing any write.
pub async fn plan_all(
    calendars: &BTreeMap<String, CalendarSection>,
) -> Vec<(String, Result<PendingChanges, SyncError>)> {
    let http = Client::new();
    let mut plans = Vec::new();

    for (name, section) in calendars {
        plans.push((name.clone(), plan_pair(&http, section).await));
    }

    plans
}

/// Fetch both sides of one pair, destination first.
async fn fetch_pair(
    http: &Client,
    section: &CalendarSection,
) -> Result<(CalDavClient, CalendarDocument, CalendarDocument), SyncError> {
    let client = CalDavClient::new(http.clone(), section)?;
    let destination = client.fetch_all().await?;
    let source = SourceFetcher::new(http.clone(), section).fetch().await?;
    Ok((client, destination, source))
}

async fn plan_pair(
    http: &Client,
    section: &CalendarSection,
) -> Result<PendingChanges, SyncError> {
    let (_, destination, source) = fetch_pair(http, section).await?;
    let plan = diff::compute(&destination, &source);

    Ok(PendingChanges {
        to_import: plan
            .to_import
            .iter()
            .map(|e| Change {
                identity: e.identity(),
                summary: e.summary.clone(),
            })
            .collect(),
        to_delete: plan.to_delete,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::recording::RecordingReporter;

    fn section(server_url: &str, calendar: &str, feed_path: &str) -> CalendarSection {
        CalendarSection {
            server: server_url.to_string(),
            username: "alice".to_string(),
            password: "secret".to_string(),
            calendar: calendar.to_string(),
            ics_url: format!("{server_url}{feed_path}"),
            ics_username: "feed-user".to_string(),
            ics_password: "feed-pass".to_string(),
        }
    }

    fn calendar_body(uids: &[&str]) -> String {
        let mut ics = String::from("BEGIN:VCALENDAR\nVERSION:2.0\nPRODID:TEST\n");
        for uid in uids {
            ics.push_str(&format!(
                "BEGIN:VEVENT\nUID:{uid}\nSUMMARY:Event {uid}\nDTSTART:20240101T100000Z\nDTEND:20240101T110000Z\nEND:VEVENT\n"
            ));
        }
        ics.push_str("END:VCALENDAR");
        ics
    }

    async fn mock_pair(
        server: &mut mockito::ServerGuard,
        calendar: &str,
        feed_path: &str,
        destination_uids: &[&str],
        source_uids: &[&str],
    ) -> (mockito::Mock, mockito::Mock) {
        let export = server
            .mock(
                "GET",
                format!("/remote.php/dav/calendars/alice/{calendar}?export").as_str(),
            )
            .with_status(200)
            .with_body(calendar_body(destination_uids))
            .create_async()
            .await;
        let feed = server
            .mock("GET", feed_path)
            .with_status(200)
            .with_body(calendar_body(source_uids))
            .create_async()
            .await;
        (export, feed)
    }

    #[tokio::test]
    async fn test_one_failing_pair_does_not_block_the_others() {
        let mut server = mockito::Server::new_async().await;

        let _first = mock_pair(&mut server, "first", "/first.ics", &["A"], &["A"]).await;
        // Second pair: the export itself fails.
        let _broken = server
            .mock("GET", "/remote.php/dav/calendars/alice/second?export")
            .with_status(500)
            .create_async()
            .await;
        let _third = mock_pair(&mut server, "third", "/third.ics", &["B"], &["B"]).await;

        let mut calendars = BTreeMap::new();
        calendars.insert("a".to_string(), section(&server.url(), "first", "/first.ics"));
        calendars.insert("b".to_string(), section(&server.url(), "second", "/second.ics"));
        calendars.insert("c".to_string(), section(&server.url(), "third", "/third.ics"));

        let reporter = RecordingReporter::default();
        let results = run_all(&calendars, &reporter).await;

        assert_eq!(results.len(), 3);
        assert!(matches!(results[0].1, PairResult::Completed(_)));
        assert!(matches!(
            results[1].1,
            PairResult::Skipped(SyncError::RemoteFetch { .. })
        ));
        assert!(matches!(results[2].1, PairResult::Completed(_)));

        assert_eq!(*reporter.skipped.lock().unwrap(), vec!["b".to_string()]);
        assert_eq!(reporter.finished.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unparseable_source_aborts_the_pair_before_any_write() {
        let mut server = mockito::Server::new_async().await;

        let _export = server
            .mock("GET", "/remote.php/dav/calendars/alice/work?export")
            .with_status(200)
            .with_body(calendar_body(&["stale-1"]))
            .create_async()
            .await;
        let _feed = server
            .mock("GET", "/feed.ics")
            .with_status(200)
            .with_body("<html>not a calendar</html>")
            .create_async()
            .await;
        // With the feed unreadable, the stale destination event must survive.
        let no_delete = server
            .mock("DELETE", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let no_put = server
            .mock("PUT", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let mut calendars = BTreeMap::new();
        calendars.insert("only".to_string(), section(&server.url(), "work", "/feed.ics"));

        let reporter = RecordingReporter::default();
        let results = run_all(&calendars, &reporter).await;

        no_delete.assert_async().await;
        no_put.assert_async().await;
        assert!(matches!(
            results[0].1,
            PairResult::Skipped(SyncError::Parse { .. })
        ));
        assert!(reporter.actions.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_plan_all_reports_changes_without_writing() {
        let mut server = mockito::Server::new_async().await;

        let _pair = mock_pair(&mut server, "work", "/feed.ics", &["A", "B"], &["B", "C"]).await;
        let no_put = server
            .mock("PUT", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let no_delete = server
            .mock("DELETE", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let mut calendars = BTreeMap::new();
        calendars.insert("work".to_string(), section(&server.url(), "work", "/feed.ics"));

        let plans = plan_all(&calendars).await;

        no_put.assert_async().await;
        no_delete.assert_async().await;

        let changes = plans[0].1.as_ref().expect("Should plan");
        assert_eq!(changes.to_import.len(), 1);
        assert_eq!(changes.to_import[0].identity, "C");
        assert_eq!(changes.to_delete.len(), 1);
        assert_eq!(changes.to_delete[0].identity, "A");
    }
}
