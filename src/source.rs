//! Fetches the external ICS feed a pair mirrors from.

use reqwest::Client;

use crate::caldav::encode_password;
use crate::config::CalendarSection;
use crate::error::{SyncError, SyncResult};
use crate::ics::CalendarDocument;

/// Authenticated fetcher for one configured feed URL.
pub struct SourceFetcher {
    http: Client,
    url: String,
    username: String,
    password: String,
}

impl SourceFetcher {
    pub fn new(http: Client, section: &CalendarSection) -> Self {
        Self {
            http,
            url: section.ics_url.clone(),
            username: section.ics_username.clone(),
            password: encode_password(&section.ics_password),
        }
    }

    /// Fetch and parse the feed.
    ///
    /// The body is decoded as UTF-8 no matter what charset the server
    /// claims; invalid sequences are replaced rather than failing the pair.
    pub async fn fetch(&self) -> SyncResult<CalendarDocument> {
        let response = self
            .http
            .get(&self.url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(|source| SyncError::Http {
                url: self.url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::RemoteFetch {
                url: self.url.clone(),
                status,
            });
        }

        let bytes = response.bytes().await.map_err(|source| SyncError::Http {
            url: self.url.clone(),
            source,
        })?;
        let text = String::from_utf8_lossy(&bytes);

        CalendarDocument::parse(&text, &self.url)
    }
}
