//! Local fixups applied to MediaWiki markup before conversion, redirect
//! detection, and the front-matter wrapped around converted pages.

use crate::title::to_path;

const TOC_MAGIC_WORDS: &[&str] = &["__TOC__", "__FORCETOC__", "__NOTOC__"];

const REDIRECT_OPEN: &str = "#REDIRECT [[";
const REDIRECT_CLOSE: &str = "]]";

/// Removes a wrapping `<div ...>text</div>`, leaving the trimmed inner text.
/// Anything else is returned untouched.
pub fn un_div(text: &str) -> &str {
    let trimmed = text.trim();
    if !(trimmed.starts_with("<div ") && trimmed.ends_with("</div>")) {
        return text;
    }
    let without_close = &trimmed[..trimmed.len() - "</div>".len()];
    match without_close.find('>') {
        Some(pos) => without_close[pos + 1..].trim(),
        None => text,
    }
}

/// Makes wiki markup converter-ready.
///
/// GeSHi-style `<python>`/`<perl>` blocks become `<source lang=...>` so they
/// come out as fenced code, and table-of-contents magic words are dropped since
/// the Markdown output has no equivalent.
pub fn cleanup(text: &str) -> String {
    let body = un_div(text);
    let mut lines = Vec::new();
    for line in body.split('\n') {
        let line = match line.trim_end() {
            "<python>" => "<source lang=Python>",
            "<perl>" => "<source lang=Perl>",
            "</python>" | "</perl>" => "</source>",
            _ => line,
        };
        if TOC_MAGIC_WORDS.contains(&un_div(line)) {
            continue;
        }
        lines.push(line);
    }
    lines.join("\n")
}

/// Target of a page whose entire body is `#REDIRECT [[Target]]`.
pub fn redirect_target(text: &str) -> Option<&str> {
    let target = text
        .trim()
        .strip_prefix(REDIRECT_OPEN)?
        .strip_suffix(REDIRECT_CLOSE)?;
    if target.contains('\n') || target.contains(']') {
        return None;
    }
    Some(target)
}

pub fn redirect_stub(title: &str, target: &str) -> String {
    let url = to_path(target);
    format!(
        "---\ntitle: {title}\nredirect_to: /{url}\n---\n\n\
         You should automatically be redirected to [{target}]({url})\n"
    )
}

pub fn with_front_matter(title: &str, body: &str) -> String {
    format!("---\ntitle: {title}\n---\n\n{body}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn un_div_unwraps_single_div() {
        assert_eq!(un_div("<div class=\"x\">Hello</div>"), "Hello");
        assert_eq!(un_div("  <div style=\"a\"> __TOC__ </div>  "), "__TOC__");
    }

    #[test]
    fn un_div_leaves_other_text() {
        assert_eq!(un_div("<div>Hello</div>"), "<div>Hello</div>");
        assert_eq!(un_div("plain"), "plain");
        assert_eq!(un_div("<div class=\"x\">open only"), "<div class=\"x\">open only");
    }

    #[test]
    fn cleanup_unwraps_div() {
        assert_eq!(cleanup("<div class=\"x\">Hello</div>"), "Hello");
    }

    #[test]
    fn cleanup_rewrites_code_tags() {
        let text = "Intro\n<python>\nimport antigravity\n</python>\n<perl>  \nprint 1;\n</perl>";
        assert_eq!(
            cleanup(text),
            "Intro\n<source lang=Python>\nimport antigravity\n</source>\n<source lang=Perl>\nprint 1;\n</source>"
        );
    }

    #[test]
    fn cleanup_leaves_inline_code_tags() {
        assert_eq!(cleanup("x <python> y"), "x <python> y");
    }

    #[test]
    fn cleanup_drops_toc_lines() {
        let text = "before\n__TOC__\nmiddle\n<div class=\"toc\">__NOTOC__</div>\n__FORCETOC__\nafter";
        assert_eq!(cleanup(text), "before\nmiddle\nafter");
    }

    #[test]
    fn cleanup_keeps_toc_with_surrounding_text() {
        assert_eq!(cleanup("see __TOC__ here"), "see __TOC__ here");
    }

    #[test]
    fn redirect_target_detects_single_target() {
        assert_eq!(
            redirect_target("#REDIRECT [[Target Page]]"),
            Some("Target Page")
        );
        assert_eq!(redirect_target("  #REDIRECT [[Foo]]\n"), Some("Foo"));
    }

    #[test]
    fn redirect_target_rejects_other_bodies() {
        assert_eq!(redirect_target("#REDIRECT [[A]] and [[B]]"), None);
        assert_eq!(redirect_target("#REDIRECT [[A\nB]]"), None);
        assert_eq!(redirect_target("Some text\n#REDIRECT [[A]]"), None);
        assert_eq!(redirect_target("#redirect [[A]]"), None);
    }

    #[test]
    fn redirect_stub_points_at_target_url() {
        let stub = redirect_stub("Old Name", "Target Page");
        assert!(stub.starts_with("---\ntitle: Old Name\nredirect_to: /wiki/Target_Page\n---\n\n"));
        assert!(stub.contains("[Target Page](wiki/Target_Page)"));
    }

    #[test]
    fn front_matter_wraps_body() {
        assert_eq!(
            with_front_matter("Main Page", "# Hello\n"),
            "---\ntitle: Main Page\n---\n\n# Hello\n"
        );
    }
}
