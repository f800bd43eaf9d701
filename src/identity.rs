//! Wiki username to git author mapping.

use crate::config::{ANONYMOUS_NAME, DEFAULT_EMAIL};
use crate::error::MigrateError;
use anyhow::{Context, Result};
use rustc_hash::{FxHashMap, FxHashSet};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Usernames mapped to `Name <email>` author strings. Immutable once loaded.
#[derive(Debug, Default, Clone)]
pub struct IdentityMap {
    authors: FxHashMap<String, String>,
}

impl IdentityMap {
    /// Loads `username<TAB>Name <email>` records. Any malformed line aborts
    /// with a [`MigrateError::Config`] naming the line.
    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .trim(csv::Trim::All)
            .from_path(path)
            .with_context(|| format!("Failed to open identity mapping: {:?}", path))?;

        let mut authors = FxHashMap::default();
        for row in reader.records() {
            let row = row.with_context(|| format!("Failed to read identity mapping: {:?}", path))?;
            let line = row.position().map(|p| p.line()).unwrap_or(0);
            if row.iter().all(str::is_empty) {
                continue;
            }
            if row.len() != 2 {
                return Err(MigrateError::Config(format!(
                    "{}:{}: expected `username<TAB>Name <email>`, got {:?}",
                    path.display(),
                    line,
                    row.iter().collect::<Vec<_>>().join("\t")
                ))
                .into());
            }
            let (username, author) = (&row[0], unquote(&row[1]));
            validate_author(author).map_err(|reason| {
                MigrateError::Config(format!(
                    "{}:{}: invalid entry for {:?}: {}",
                    path.display(),
                    line,
                    username,
                    reason
                ))
            })?;
            authors.insert(username.to_string(), author.to_string());
        }

        info!(entries = authors.len(), path = ?path, "Identity mapping loaded");
        Ok(Self { authors })
    }

    pub fn from_entries<I, U, A>(entries: I) -> Result<Self, MigrateError>
    where
        I: IntoIterator<Item = (U, A)>,
        U: Into<String>,
        A: Into<String>,
    {
        let mut authors = FxHashMap::default();
        for (username, author) in entries {
            let (username, author) = (username.into(), author.into());
            validate_author(&author).map_err(|reason| {
                MigrateError::Config(format!("invalid entry for {:?}: {}", username, reason))
            })?;
            authors.insert(username, author);
        }
        Ok(Self { authors })
    }

    pub fn get(&self, username: &str) -> Option<&str> {
        self.authors.get(username).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.authors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.authors.is_empty()
    }
}

/// Strips one surrounding pair of double quotes.
fn unquote(field: &str) -> &str {
    field
        .strip_prefix('"')
        .and_then(|f| f.strip_suffix('"'))
        .unwrap_or(field)
}

/// An author must read `Name <email>`: `" <"`, then `"@"`, then `">"`.
/// It has to fit on one `--author` argument, so no control characters and
/// no stray quote at either end.
fn validate_author(author: &str) -> Result<(), String> {
    if author.chars().any(char::is_control) {
        return Err(format!("{:?} contains a control character", author));
    }
    if author.starts_with('"') || author.ends_with('"') {
        return Err(format!("{:?} has an unbalanced quote", author));
    }
    let ordered = author.find(" <").and_then(|open| {
        let at = open + author[open..].find('@')?;
        author[at..].find('>')
    });
    match ordered {
        Some(_) => Ok(()),
        None => Err(format!(
            "{:?} should use the format `name <email>`, e.g. A.N. Other <a.n.other@example.org>",
            author
        )),
    }
}

/// Usernames whose revisions are never replayed.
#[derive(Debug, Default, Clone)]
pub struct Blocklist {
    names: FxHashSet<String>,
}

impl Blocklist {
    /// One username per line; blank lines are ignored. A missing file is an
    /// empty blocklist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = ?path, "No blocklist file");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read blocklist: {:?}", path))?;
        let blocklist = Self::from_names(text.lines());
        info!(entries = blocklist.names.len(), "Blocklist loaded");
        Ok(blocklist)
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = names
            .into_iter()
            .map(|n| n.as_ref().trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        Self { names }
    }

    pub fn contains(&self, username: &str) -> bool {
        self.names.contains(username)
    }
}

/// Per-username count of commits that needed a synthesized identity.
#[derive(Debug, Default, Clone)]
pub struct MissingIdentities {
    counts: FxHashMap<String, u64>,
}

impl MissingIdentities {
    pub fn record(&mut self, username: &str) {
        *self.counts.entry(username.to_string()).or_insert(0) += 1;
    }

    pub fn count(&self, username: &str) -> u64 {
        self.counts.get(username).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// `(username, count)` pairs ordered by username.
    pub fn sorted(&self) -> Vec<(&str, u64)> {
        let mut entries: Vec<_> = self
            .counts
            .iter()
            .map(|(name, count)| (name.as_str(), *count))
            .collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

/// Resolves commit authors, tallying usernames that had no mapping.
#[derive(Debug)]
pub struct AuthorResolver {
    map: IdentityMap,
    missing: MissingIdentities,
}

impl AuthorResolver {
    pub fn new(map: IdentityMap) -> Self {
        Self {
            map,
            missing: MissingIdentities::default(),
        }
    }

    pub fn resolve_author(&mut self, username: &str) -> String {
        if let Some(author) = self.map.get(username) {
            return author.to_string();
        }
        if username.is_empty() {
            return anonymous_author();
        }
        self.missing.record(username);
        format!("{} <{}>", username, DEFAULT_EMAIL)
    }

    pub fn missing(&self) -> &MissingIdentities {
        &self.missing
    }

    pub fn into_missing(self) -> MissingIdentities {
        self.missing
    }
}

pub fn anonymous_author() -> String {
    format!("{} <{}>", ANONYMOUS_NAME, DEFAULT_EMAIL)
}
