//! mwgit: MediaWiki history to git
//!
//! Replays every revision of a MediaWiki XML export as a git commit, keeping the
//! original author and date, and converts each page to Markdown along the way.
//!
//! 1. **Parse** -- Stream the dump (plain or `.bz2`) and emit one record per
//!    revision, dropping deleted revisions and blocklisted authors
//! 2. **Store** -- Collect the records (in memory or spilled to a temp file) and
//!    sort them by `(timestamp, title)`
//! 3. **Replay** -- Walk the sorted log, write `wiki/<Title>.mediawiki` and
//!    `wiki/<Title>.md` (or the uploaded file for `File:` pages) and commit them
//!
//! # Failure policy
//!
//! - A revision pandoc can't convert is rolled back and skipped; the run continues
//! - A `File:` revision whose upload can't be fetched aborts the run
//! - Any failing git command aborts the run with git's exit status
//!
//! # Key Modules
//!
//! - [`parser`] -- Streaming XML reader with BZ2 decompression
//! - [`store`] -- Write-once revision store and the ordered log it seals into
//! - [`identity`] -- Username to author mapping, blocklist, missing-identity tally
//! - [`policy`] -- Namespace classification and title whitelist
//! - [`title`] -- Title to path/URL normalization
//! - [`markup`] -- Markup fixups, redirect stubs, front-matter
//! - [`replay`] -- The replay engine
//! - [`convert`], [`vcs`], [`fetch`] -- pandoc, git and HTTP collaborators
//! - [`config`] -- Constants and run settings
//!
//! # Example Usage
//!
//! ```bash
//! # Inside a git repository holding usernames.txt and user_blocklist.txt
//! mwgit biopython-wiki.xml.bz2
//!
//! # Only some pages
//! mwgit biopython-wiki.xml "Main Page" "File:Biopython small.jpg"
//! ```

pub mod config;
pub mod convert;
pub mod error;
pub mod fetch;
pub mod identity;
pub mod markup;
pub mod models;
pub mod parser;
pub mod policy;
pub mod replay;
pub mod stats;
pub mod store;
pub mod title;
pub mod vcs;
