use crate::models::{ExclusionReason, PageKind};
use rustc_hash::FxHashSet;

pub const FILE_PREFIX: &str = "File:";

const SYSTEM_PREFIXES: &[&str] = &["MediaWiki:", "Help:"];
const USER_PREFIXES: &[&str] = &["User:", "Talk:", "User_talk:"];
const UNSUPPORTED_PREFIXES: &[&str] = &["Template:", "Category:"];

/// Classifies a title by namespace prefix. Order matters: `File:` is checked
/// after the system namespaces and before the user ones.
pub fn classify(title: &str) -> PageKind {
    let has = |prefixes: &[&str]| prefixes.iter().any(|p| title.starts_with(p));

    if has(SYSTEM_PREFIXES) {
        PageKind::Excluded(ExclusionReason::System)
    } else if title.starts_with(FILE_PREFIX) {
        PageKind::Media
    } else if has(USER_PREFIXES) {
        PageKind::Excluded(ExclusionReason::UserOrTalk)
    } else if has(UNSUPPORTED_PREFIXES) {
        PageKind::Excluded(ExclusionReason::Unsupported)
    } else {
        PageKind::Content
    }
}

/// Namespace classification plus an optional exact-title whitelist.
#[derive(Debug, Default, Clone)]
pub struct InclusionPolicy {
    whitelist: FxHashSet<String>,
}

impl InclusionPolicy {
    /// An empty whitelist means every title is eligible.
    pub fn new<I, S>(whitelist: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            whitelist: whitelist.into_iter().map(Into::into).collect(),
        }
    }

    pub fn evaluate(&self, title: &str) -> PageKind {
        if !self.whitelist.is_empty() && !self.whitelist.contains(title) {
            return PageKind::Excluded(ExclusionReason::NotWhitelisted);
        }
        classify(title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_namespaces() {
        use ExclusionReason::*;
        assert_eq!(classify("MediaWiki:Sidebar"), PageKind::Excluded(System));
        assert_eq!(classify("Help:Contents"), PageKind::Excluded(System));
        assert_eq!(classify("File:Logo.png"), PageKind::Media);
        assert_eq!(classify("User:Peter"), PageKind::Excluded(UserOrTalk));
        assert_eq!(classify("Talk:Main Page"), PageKind::Excluded(UserOrTalk));
        assert_eq!(classify("User_talk:Peter"), PageKind::Excluded(UserOrTalk));
        assert_eq!(classify("Template:Infobox"), PageKind::Excluded(Unsupported));
        assert_eq!(classify("Category:Tools"), PageKind::Excluded(Unsupported));
        assert_eq!(classify("Main Page"), PageKind::Content);
    }

    #[test]
    fn classify_is_case_sensitive_and_prefix_only() {
        assert_eq!(classify("file:Logo.png"), PageKind::Content);
        assert_eq!(classify("Using File: prefixes"), PageKind::Content);
        // "User talk:" with a space is not one of the excluded prefixes
        assert_eq!(classify("User talk:Peter"), PageKind::Content);
    }

    #[test]
    fn empty_whitelist_allows_everything() {
        let policy = InclusionPolicy::default();
        assert_eq!(policy.evaluate("Main Page"), PageKind::Content);
        assert_eq!(policy.evaluate("File:Logo.png"), PageKind::Media);
    }

    #[test]
    fn whitelist_applies_before_namespaces() {
        let policy = InclusionPolicy::new(["Main Page", "User:Peter"]);
        assert_eq!(policy.evaluate("Main Page"), PageKind::Content);
        assert_eq!(
            policy.evaluate("Other Page"),
            PageKind::Excluded(ExclusionReason::NotWhitelisted)
        );
        assert_eq!(
            policy.evaluate("User:Peter"),
            PageKind::Excluded(ExclusionReason::UserOrTalk)
        );
    }
}
