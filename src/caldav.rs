//! CalDAV client for one destination calendar collection.
//!
//! All authenticated interaction with the destination goes through here:
//! the full-collection export, and the per-event PUT/DELETE writes.

use reqwest::{header, Client, StatusCode};
use url::Url;

use crate::config::CalendarSection;
use crate::error::{SyncError, SyncResult};
use crate::ics::{CalendarDocument, EventRecord};

/// Marker sabre/vobject emits when an imported RRULE produces no occurrences.
/// A PUT rejected with this is tolerated, not treated as a write failure.
const NO_INSTANCES_MARKER: &str = r"Sabre\VObject\Recur\NoInstancesException";

/// Percent-encode everything except unreserved characters.
///
/// Passwords travel inside the basic-auth credential and may contain
/// characters the server mis-handles when sent verbatim, so they are encoded
/// independently of whatever the HTTP layer does to the rest of the request.
pub fn encode_password(password: &str) -> String {
    urlencoding::encode(password).into_owned()
}

/// Builds the URLs a calendar collection and its event resources live at.
#[derive(Debug, Clone)]
pub struct CollectionPath {
    base: String,
}

impl CollectionPath {
    /// `{server}remote.php/dav/calendars/{username}/{calendar}`, tolerating
    /// a missing trailing slash on the configured server base.
    pub fn new(server: &str, username: &str, calendar: &str) -> SyncResult<Self> {
        let server = server.trim_end_matches('/');
        let base = format!("{server}/remote.php/dav/calendars/{username}/{calendar}");

        Url::parse(&base)
            .map_err(|e| SyncError::Config(format!("invalid server URL {server}: {e}")))?;

        Ok(Self { base })
    }

    /// URL that exports the whole collection as one iCalendar document.
    pub fn export_url(&self) -> String {
        format!("{}?export", self.base)
    }

    /// URL of the per-event resource for a normalized identity.
    pub fn event_url(&self, identity: &str) -> String {
        format!("{}/{}.ics", self.base, identity)
    }
}

/// Outcome of a tolerated PUT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    Created,
    Updated,
    /// The server rejected the event's recurrence rule as producing no
    /// occurrences. Known quirk, reported as a skip.
    NoValidInstances,
}

/// Outcome of a tolerated DELETE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The resource was already gone. Deletes are idempotent.
    NotFound,
}

/// Authenticated client bound to one destination calendar collection.
pub struct CalDavClient {
    http: Client,
    path: CollectionPath,
    username: String,
    password: String,
}

impl CalDavClient {
    pub fn new(http: Client, section: &CalendarSection) -> SyncResult<Self> {
        Ok(Self {
            http,
            path: CollectionPath::new(&section.server, &section.username, &section.calendar)?,
            username: section.username.clone(),
            password: encode_password(&section.password),
        })
    }

    /// Fetch the whole collection and parse it.
    pub async fn fetch_all(&self) -> SyncResult<CalendarDocument> {
        let url = self.path.export_url();

        let response = self
            .http
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(|source| SyncError::Http {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::RemoteFetch { url, status });
        }

        let body = response.text().await.map_err(|source| SyncError::Http {
            url: url.clone(),
            source,
        })?;

        CalendarDocument::parse(&body, &url)
    }

    /// Write one event to its per-identity resource.
    pub async fn put(&self, identity: &str, record: &EventRecord) -> SyncResult<PutOutcome> {
        let url = self.path.event_url(identity);

        let response = self
            .http
            .put(&url)
            .basic_auth(&self.username, Some(&self.password))
            .header(header::CONTENT_TYPE, "text/calendar; charset=UTF-8")
            .body(record.standalone_ics())
            .send()
            .await
            .map_err(|source| SyncError::Http {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        match status {
            StatusCode::CREATED => Ok(PutOutcome::Created),
            StatusCode::NO_CONTENT => Ok(PutOutcome::Updated),
            StatusCode::INTERNAL_SERVER_ERROR => {
                let body = response.text().await.unwrap_or_default();
                if body.contains(NO_INSTANCES_MARKER) {
                    Ok(PutOutcome::NoValidInstances)
                } else {
                    Err(SyncError::RemoteWrite { url, status })
                }
            }
            s if s.is_success() => Ok(PutOutcome::Updated),
            _ => Err(SyncError::RemoteWrite { url, status }),
        }
    }

    /// Delete one event's per-identity resource.
    pub async fn delete(&self, identity: &str) -> SyncResult<DeleteOutcome> {
        let url = self.path.event_url(identity);

        let response = self
            .http
            .delete(&url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(|source| SyncError::Http {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(DeleteOutcome::Deleted)
        } else if status == StatusCode::NOT_FOUND {
            Ok(DeleteOutcome::NotFound)
        } else {
            Err(SyncError::RemoteWrite { url, status })
        }
    }
}
