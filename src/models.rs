use serde::{Deserialize, Serialize};

/// One historical edit of one page, as read from the dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionRecord {
    pub page_title: String,
    /// ISO-8601 as exported (`2011-08-23T23:26:00Z`); sorts lexically
    pub timestamp: String,
    /// Empty for anonymous edits
    pub username: String,
    pub content: String,
    pub comment: String,
}

impl RevisionRecord {
    pub fn ordering_key(&self) -> (&str, &str) {
        (&self.timestamp, &self.page_title)
    }
}

/// Why a page is never replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionReason {
    /// A whitelist was given and the title is not on it
    NotWhitelisted,
    /// `MediaWiki:` and `Help:` pages
    System,
    /// `User:`, `Talk:` and `User_talk:` pages
    UserOrTalk,
    /// `Template:` and `Category:` pages, which don't convert
    Unsupported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Content,
    Media,
    Excluded(ExclusionReason),
}

/// Terminal state of a replayed revision. Fatal aborts surface as errors instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Excluded(ExclusionReason),
    Committed,
    Redirected,
    MediaCommitted,
    /// Conversion failed; the revision left no trace in history
    Skipped,
}

/// Files plus metadata for one commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitUnit {
    pub paths: Vec<String>,
    pub author: String,
    pub timestamp: String,
    pub message: String,
}
