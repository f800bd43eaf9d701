//! Page title to filesystem path and URL mapping.

use crate::config::ROOT_PREFIX;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Spaces to underscores; first letter upper case, everything else lower case.
///
/// Only used for uploaded file names. The extension is lowercased too, so
/// `Logo.PNG` becomes `Logo.png`; existing history depends on this.
pub fn canonicalize(title: &str) -> String {
    let underscored = title.replace(' ', "_");
    let mut chars = underscored.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };

    let mut upper = first.to_uppercase();
    let head = match (upper.next(), upper.next()) {
        (Some(c), None) => c,
        // Multi-char expansions (e.g. 'ß' -> "SS") would not survive a second pass
        _ => first,
    };

    let mut out = String::with_capacity(underscored.len());
    out.push(head);
    out.extend(chars.flat_map(char::to_lowercase));
    out
}

/// Spaces to underscores, under the root prefix. Doubles as the site URL path.
pub fn to_path(title: &str) -> String {
    let mut path = String::with_capacity(ROOT_PREFIX.len() + title.len());
    path.push_str(ROOT_PREFIX);
    path.push_str(&title.replace(' ', "_"));
    path
}

pub fn to_filename(title: &str, extension: &str) -> String {
    format!("{}.{}", to_path(title), extension)
}

/// Creates `dir` and any missing parents. Pages like `BioSQL/Windows` need this.
pub fn ensure_directory_exists(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() || dir.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(dir).with_context(|| format!("Failed to create directory: {:?}", dir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn canonicalize_lowercases_everything_after_first_letter() {
        assert_eq!(canonicalize("biopython small.jpg"), "Biopython_small.jpg");
        assert_eq!(canonicalize("TorusDBN.png"), "Torusdbn.png");
        assert_eq!(canonicalize("File.Name.PDF"), "File.name.pdf");
    }

    #[test]
    fn canonicalize_is_idempotent() {
        for title in [
            "Biopython small.jpg",
            "already_Canonical",
            "ßtraße plan.PNG",
            "İstanbul Map.JPG",
            "ǆungla.gif",
            "",
            " leading space",
        ] {
            let once = canonicalize(title);
            assert_eq!(canonicalize(&once), once, "title {:?}", title);
        }
    }

    #[test]
    fn canonicalize_empty_title() {
        assert_eq!(canonicalize(""), "");
    }

    #[test]
    fn to_path_keeps_case() {
        assert_eq!(to_path("Foo Bar"), "wiki/Foo_Bar");
        assert_eq!(to_path("BioSQL/Windows"), "wiki/BioSQL/Windows");
    }

    #[test]
    fn to_filename_appends_extension() {
        assert_eq!(to_filename("Foo Bar", "md"), "wiki/Foo_Bar.md");
        assert_eq!(
            to_filename("Main Page", "mediawiki"),
            "wiki/Main_Page.mediawiki"
        );
    }

    #[test]
    fn ensure_directory_exists_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("wiki").join("BioSQL").join("deep");
        ensure_directory_exists(&nested).unwrap();
        assert!(nested.is_dir());
        ensure_directory_exists(&nested).unwrap();
        assert!(nested.is_dir());
    }
}
