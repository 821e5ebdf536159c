//! URL-safe bill slugs.

use std::sync::LazyLock;

use regex::Regex;

/// Default number of title characters kept in a slug.
pub const DEFAULT_SLUG_CHARS: usize = 64;

static RE_DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9\-\s]").expect("valid regex"));

static RE_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

static RE_DASHES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").expect("valid regex"));

/// Build a slug from `"{legis_num}-{title}-{version}"`.
///
/// Only the first `max_chars` characters of the title are used. The result is
/// lowercase, with periods and whitespace runs turned into single hyphens and
/// anything outside `[a-z0-9-]` dropped.
pub fn slug(legis_num: &str, title: &str, version: &str, max_chars: usize) -> String {
    let title: String = title.chars().take(max_chars).collect();
    let combined = format!("{legis_num}-{title}-{version}")
        .to_lowercase()
        .replace('.', "-");

    let cleaned = RE_DISALLOWED.replace_all(&combined, "");
    let dashed = RE_WHITESPACE.replace_all(&cleaned, "-");
    let collapsed = RE_DASHES.replace_all(&dashed, "-");

    collapsed.trim_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_slug() {
        assert_eq!(
            slug("S. 42", "Clean Water Act", "is", DEFAULT_SLUG_CHARS),
            "s-42-clean-water-act-is"
        );
    }

    #[test]
    fn strips_punctuation_and_collapses_dashes() {
        assert_eq!(
            slug("H.R. 7", "Securing America's Borders -- Now!", "eh", 64),
            "h-r-7-securing-americas-borders-now-eh"
        );
    }

    #[test]
    fn truncates_title_only() {
        let title = "A".repeat(100);
        let s = slug("H. R. 1", &title, "enr", 10);
        assert_eq!(s, "h-r-1-aaaaaaaaaa-enr");
    }

    #[test]
    fn empty_parts_trimmed() {
        assert_eq!(slug("", "Title", "", 64), "title");
    }
}
