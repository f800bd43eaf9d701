use std::path::PathBuf;

/// Directory (and URL path segment) that every page is written under
pub const ROOT_PREFIX: &str = "wiki/";

pub const MEDIAWIKI_EXT: &str = "mediawiki";
pub const MARKDOWN_EXT: &str = "md";

/// Tab-separated `username<TAB>Name <email>` records
pub const IDENTITY_FILE: &str = "usernames.txt";

/// One username per line; their revisions are never replayed
pub const BLOCKLIST_FILE: &str = "user_blocklist.txt";

pub const DEFAULT_EMAIL: &str = "anonymous.contributor@example.org";

/// Git requires a name, not just an email address
pub const ANONYMOUS_NAME: &str = "Anonymous Contributor";

pub const DEFAULT_COMMIT_MESSAGE: &str = "Change to wiki page";

/// Site the wiki was served from; `ROOT_PREFIX` is appended for page URLs
pub const DEFAULT_BASE_URL: &str = "http://www.open-bio.org/";

/// Relative to the base URL; uploaded files live below it
pub const IMAGE_PATH: &str = "w/images/";

pub const PANDOC: &str = "pandoc";
pub const PANDOC_FROM: &str = "mediawiki";
pub const PANDOC_TO: &str = "markdown_github-hard_line_breaks";

pub const GIT: &str = "git";

/// Progress update interval (tick every N revisions while parsing)
pub const PROGRESS_INTERVAL: u64 = 1000;

/// Runtime settings for a migration. The binary uses `Settings::default()`;
/// tests override the working directory and collaborators' programs.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Root of the git working tree; all output paths are relative to it
    pub work_dir: PathBuf,
    pub identity_file: PathBuf,
    pub blocklist_file: PathBuf,
    pub base_url: String,
    pub pandoc: String,
    pub git: String,
    /// Spill revisions to a temporary file instead of holding them in memory
    pub spill_to_disk: bool,
}

impl Settings {
    pub fn in_dir(work_dir: impl Into<PathBuf>) -> Self {
        let work_dir = work_dir.into();
        Self {
            identity_file: work_dir.join(IDENTITY_FILE),
            blocklist_file: work_dir.join(BLOCKLIST_FILE),
            work_dir,
            base_url: DEFAULT_BASE_URL.to_string(),
            pandoc: PANDOC.to_string(),
            git: GIT.to_string(),
            spill_to_disk: true,
        }
    }

    pub fn base_image_url(&self) -> String {
        format!("{}{}", self.base_url, IMAGE_PATH)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::in_dir(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn settings_resolve_files_inside_work_dir() {
        let settings = Settings::in_dir("/repo");
        assert_eq!(settings.identity_file, Path::new("/repo/usernames.txt"));
        assert_eq!(settings.blocklist_file, Path::new("/repo/user_blocklist.txt"));
    }

    #[test]
    fn base_image_url_appends_image_path() {
        let settings = Settings::default();
        assert_eq!(settings.base_image_url(), "http://www.open-bio.org/w/images/");
    }
}
