//! Replays the ordered revision log as commits.
//!
//! Each revision is classified by title, written to the working tree, and
//! committed under its original author and date. A revision that fails to
//! convert is rolled back and skipped; a media fetch failure or a failing git
//! command aborts the whole run.

use crate::config::{DEFAULT_COMMIT_MESSAGE, MARKDOWN_EXT, MEDIAWIKI_EXT, ROOT_PREFIX};
use crate::convert::Converter;
use crate::error::MigrateError;
use crate::fetch::AssetFetcher;
use crate::identity::{AuthorResolver, IdentityMap, MissingIdentities};
use crate::markup::{cleanup, redirect_stub, redirect_target, with_front_matter};
use crate::models::{CommitUnit, Outcome, PageKind, RevisionRecord};
use crate::policy::{InclusionPolicy, FILE_PREFIX};
use crate::stats::{make_progress_bar, ReplayStats};
use crate::store::RevisionLog;
use crate::title::{canonicalize, ensure_directory_exists, to_filename};
use crate::vcs::VersionControl;
use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// What a completed run hands back: counters plus the usernames that had
/// no identity mapping.
#[derive(Debug)]
pub struct ReplayReport {
    pub stats: ReplayStats,
    pub missing: MissingIdentities,
}

pub struct ReplayEngine<C, V, F> {
    work_dir: PathBuf,
    policy: InclusionPolicy,
    authors: AuthorResolver,
    converter: C,
    vcs: V,
    fetcher: F,
    stats: ReplayStats,
}

impl<C, V, F> ReplayEngine<C, V, F>
where
    C: Converter,
    V: VersionControl,
    F: AssetFetcher,
{
    pub fn new(
        work_dir: impl Into<PathBuf>,
        policy: InclusionPolicy,
        identities: IdentityMap,
        converter: C,
        vcs: V,
        fetcher: F,
    ) -> Self {
        Self {
            work_dir: work_dir.into(),
            policy,
            authors: AuthorResolver::new(identities),
            converter,
            vcs,
            fetcher,
            stats: ReplayStats::new(),
        }
    }

    /// Replays every revision in order. Stops at the first fatal error.
    pub fn run(mut self, log: &RevisionLog) -> Result<ReplayReport> {
        let pb = make_progress_bar(log.len() as u64, "Replaying");
        for record in log.iterate_ordered()? {
            let record = record?;
            let outcome = self.replay(&record).with_context(|| {
                format!(
                    "Failed to replay {:?} as of {}",
                    record.page_title, record.timestamp
                )
            })?;
            self.stats.record(outcome);
            pb.inc(1);
        }
        pb.finish_and_clear();

        info!(
            commits = self.stats.commits(),
            skipped = self.stats.skipped,
            excluded = self.stats.excluded(),
            "Replay complete"
        );
        Ok(ReplayReport {
            stats: self.stats,
            missing: self.authors.into_missing(),
        })
    }

    /// Moves a single revision to its terminal state.
    pub fn replay(&mut self, record: &RevisionRecord) -> Result<Outcome> {
        match self.policy.evaluate(&record.page_title) {
            PageKind::Excluded(reason) => {
                debug!(title = %record.page_title, ?reason, "Ignoring page");
                Ok(Outcome::Excluded(reason))
            }
            PageKind::Media => self.replay_media(record),
            PageKind::Content => self.replay_content(record),
        }
    }

    fn replay_content(&mut self, record: &RevisionRecord) -> Result<Outcome> {
        let title = record.page_title.as_str();
        let mw_file = to_filename(title, MEDIAWIKI_EXT);
        let md_file = to_filename(title, MARKDOWN_EXT);
        let mw_path = self.work_dir.join(&mw_file);
        let md_path = self.work_dir.join(&md_file);
        info!(
            file = %md_file,
            timestamp = %record.timestamp,
            username = %record.username,
            "Converting revision"
        );

        let cleaned = cleanup(&record.content);
        let was_tracked = mw_path.exists();
        let created_dir = first_missing_dir(&self.work_dir, &mw_path);
        write_file(&mw_path, cleaned.as_bytes())?;

        let (markdown, outcome) = if let Some(target) = redirect_target(&cleaned) {
            info!("Setup redirection {} --> {}", title, target);
            (redirect_stub(title, target), Outcome::Redirected)
        } else {
            match self.converter.convert(&mw_path) {
                Ok(body) => (with_front_matter(title, &body), Outcome::Committed),
                Err(MigrateError::Conversion { path, reason }) => {
                    warn!(file = ?path, %reason, "Skipping this revision");
                    self.rollback(&mw_path, was_tracked, created_dir.as_deref())?;
                    return Ok(Outcome::Skipped);
                }
                Err(e) => return Err(e.into()),
            }
        };

        write_file(&md_path, markdown.as_bytes())?;
        self.commit(vec![md_file, mw_file], record)?;
        Ok(outcome)
    }

    fn replay_media(&mut self, record: &RevisionRecord) -> Result<Outcome> {
        let name = record
            .page_title
            .strip_prefix(FILE_PREFIX)
            .unwrap_or(&record.page_title);
        let file = format!("{}{}", ROOT_PREFIX, canonicalize(name));
        info!(
            file = %file,
            timestamp = %record.timestamp,
            username = %record.username,
            "Fetching file revision"
        );

        let bytes = self.fetcher.fetch(&record.page_title, &record.timestamp)?;
        write_file(&self.work_dir.join(&file), &bytes)?;
        self.commit(vec![file], record)?;
        Ok(Outcome::MediaCommitted)
    }

    /// Only the source markup was written; put the tree back as it was.
    fn rollback(
        &mut self,
        mw_path: &Path,
        was_tracked: bool,
        created_dir: Option<&Path>,
    ) -> Result<()> {
        self.vcs.hard_reset()?;
        if was_tracked {
            return Ok(());
        }
        // A reset leaves untracked files behind
        match fs::remove_file(mw_path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e).with_context(|| format!("Failed to remove {:?}", mw_path)),
        }
        let Some(top) = created_dir else {
            return Ok(());
        };
        let mut dir = mw_path.parent();
        while let Some(current) = dir {
            fs::remove_dir(current)
                .with_context(|| format!("Failed to remove directory {:?}", current))?;
            if current == top {
                break;
            }
            dir = current.parent();
        }
        Ok(())
    }

    fn commit(&mut self, paths: Vec<String>, record: &RevisionRecord) -> Result<()> {
        let message = if record.comment.is_empty() {
            DEFAULT_COMMIT_MESSAGE.to_string()
        } else {
            record.comment.clone()
        };
        let unit = CommitUnit {
            paths,
            author: self.authors.resolve_author(&record.username),
            timestamp: record.timestamp.clone(),
            message,
        };

        self.vcs.stage(&unit.paths)?;
        self.vcs
            .commit(&unit.paths, &unit.author, &unit.timestamp, &unit.message)?;
        debug!(author = %unit.author, files = ?unit.paths, "Committed");
        Ok(())
    }
}

/// Outermost ancestor of `path`, below `work_dir`, that does not exist yet.
fn first_missing_dir(work_dir: &Path, path: &Path) -> Option<PathBuf> {
    let mut missing = None;
    let mut dir = path.parent()?;
    while dir != work_dir && !dir.exists() {
        missing = Some(dir.to_path_buf());
        dir = dir.parent()?;
    }
    missing
}

fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_directory_exists(parent)?;
    }
    fs::write(path, contents).with_context(|| format!("Failed to write {:?}", path))
}
