//! Historical versions of uploaded files.
//!
//! Dumps don't carry file contents, so each `File:` revision is fetched from the
//! live wiki: the file description page lists every upload in a history table,
//! and the upload matching the revision's time of day is downloaded.

use crate::error::MigrateError;
use crate::title::to_path;
use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::blocking::Client;
use tracing::info;

const HISTORY_TABLE: &str = r#"<table class="wikitable filehistory">"#;
const TABLE_END: &str = "</table>";

// Link target below the image root, then the `HH:MM` the link text starts with
static UPLOAD_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<a href="/w/images/([a-zA-Z0-9./%_-]+)[">]+(\d\d:\d\d)"#).unwrap()
});

pub trait AssetFetcher {
    /// Bytes of `title` as uploaded at `timestamp`. Any error is fatal.
    fn fetch(&self, title: &str, timestamp: &str) -> Result<Vec<u8>, MigrateError>;
}

impl<T: AssetFetcher + ?Sized> AssetFetcher for &T {
    fn fetch(&self, title: &str, timestamp: &str) -> Result<Vec<u8>, MigrateError> {
        (**self).fetch(title, timestamp)
    }
}

pub struct HttpAssetFetcher {
    client: Client,
    base_url: String,
    image_url: String,
}

impl HttpAssetFetcher {
    pub fn new(base_url: impl Into<String>, image_url: impl Into<String>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("mwgit/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            image_url: image_url.into(),
        })
    }

    fn get(&self, url: &str) -> Result<reqwest::blocking::Response, String> {
        self.client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| format!("GET {}: {}", url, e))
    }
}

impl AssetFetcher for HttpAssetFetcher {
    fn fetch(&self, title: &str, timestamp: &str) -> Result<Vec<u8>, MigrateError> {
        let fail = |reason: String| MigrateError::Fetch {
            title: title.to_string(),
            timestamp: timestamp.to_string(),
            reason,
        };

        let page_url = format!("{}{}", self.base_url, to_path(title));
        info!(url = %page_url, "Inspecting file history page");
        let html = self
            .get(&page_url)
            .and_then(|r| r.text().map_err(|e| e.to_string()))
            .map_err(fail)?;

        let time = time_of_day(timestamp)
            .ok_or_else(|| fail(format!("no time of day in timestamp {:?}", timestamp)))?;
        let image_path = find_upload(&html, time).map_err(fail)?;

        let url = format!("{}{}", self.image_url, image_path);
        info!(url = %url, "Fetching file");
        let bytes = self
            .get(&url)
            .and_then(|r| r.bytes().map_err(|e| e.to_string()))
            .map_err(fail)?;
        Ok(bytes.to_vec())
    }
}

/// `HH:MM` from `2011-08-23T23:26:00Z`.
pub fn time_of_day(timestamp: &str) -> Option<&str> {
    let (_, time) = timestamp.split_once('T')?;
    time.get(..5)
}

/// Path (below the image root) of the single upload in the history table
/// whose link text starts with `time`.
pub fn find_upload(html: &str, time: &str) -> Result<String, String> {
    let start = html
        .find(HISTORY_TABLE)
        .ok_or_else(|| "no file history table on page".to_string())?;
    let table = &html[start..];
    let table = match table.find(TABLE_END) {
        Some(end) => &table[..end + TABLE_END.len()],
        None => table,
    };

    let mut matches = UPLOAD_LINK
        .captures_iter(table)
        .filter(|c| &c[2] == time)
        .map(|c| c[1].to_string());
    match (matches.next(), matches.next()) {
        (Some(path), None) => Ok(path),
        (None, _) => Err(format!("no upload at {} in file history", time)),
        (Some(_), Some(_)) => Err(format!("several uploads at {} in file history", time)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HISTORY: &str = r#"<html><body>
<h2>File history</h2>
<table class="wikitable filehistory">
<tr><th>Date/Time</th></tr>
<tr><td><a href="/w/images/6/64/TorusDBN.png">23:26, 23 August 2011</a></td></tr>
<tr><td><a href="/w/images/archive/6/64/20110823232600%21TorusDBN.png">22:05, 23 August 2011</a></td></tr>
</table>
<a href="/w/images/other.png">22:05, elsewhere</a>
</body></html>"#;

    #[test]
    fn time_of_day_extracts_hours_and_minutes() {
        assert_eq!(time_of_day("2011-08-23T23:26:00Z"), Some("23:26"));
        assert_eq!(time_of_day("2011-08-23"), None);
        assert_eq!(time_of_day("2011-08-23T1"), None);
    }

    #[test]
    fn finds_current_upload() {
        assert_eq!(find_upload(HISTORY, "23:26").unwrap(), "6/64/TorusDBN.png");
    }

    #[test]
    fn finds_archived_upload_inside_table_only() {
        assert_eq!(
            find_upload(HISTORY, "22:05").unwrap(),
            "archive/6/64/20110823232600%21TorusDBN.png"
        );
    }

    #[test]
    fn zero_matches_fail() {
        assert!(find_upload(HISTORY, "09:00").is_err());
    }

    #[test]
    fn multiple_matches_fail() {
        let html = r#"<table class="wikitable filehistory">
<a href="/w/images/a.png">10:00, 1 May</a><a href="/w/images/b.png">10:00, 2 May</a>
</table>"#;
        let err = find_upload(html, "10:00").unwrap_err();
        assert!(err.contains("several"));
    }

    #[test]
    fn missing_table_fails() {
        assert!(find_upload("<html>nothing here</html>", "10:00").is_err());
    }
}
