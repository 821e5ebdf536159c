//! Post-conversion cleanup pipeline for Markdown output.
//!
//! Each cleanup pass is a function `&str -> String` applied in sequence.
//! Bill markdown keeps no links or images, and no stray HTML.

use std::sync::LazyLock;

use regex::Regex;

/// Run the full cleanup pipeline on raw Markdown text.
pub(crate) fn run_pipeline(md: &str) -> String {
    let mut result = md.to_string();

    result = drop_images(&result);
    result = unwrap_links(&result);
    result = strip_leftover_html(&result);
    result = normalize_whitespace(&result);
    result = clean_blank_lines(&result);

    result.trim().to_string()
}

// ---------------------------------------------------------------------------
// Pass 1: Drop images
// ---------------------------------------------------------------------------

fn drop_images(md: &str) -> String {
    static IMAGE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"!\[[^\]]*\]\([^)]*\)").expect("valid regex"));

    IMAGE_RE.replace_all(md, "").to_string()
}

// ---------------------------------------------------------------------------
// Pass 2: Unwrap links
// ---------------------------------------------------------------------------

/// Replace `[text](url)` with `text`. Runs after [`drop_images`].
fn unwrap_links(md: &str) -> String {
    static LINK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\([^)]*\)").expect("valid regex"));

    LINK_RE.replace_all(md, "$1").to_string()
}

// ---------------------------------------------------------------------------
// Pass 3: Strip leftover HTML tags
// ---------------------------------------------------------------------------

/// Remove tags htmd passes through, keeping their inner text.
fn strip_leftover_html(md: &str) -> String {
    static HTML_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"</?(?:div|span|section|q|a|img|table|tr|td|th)(?:\s[^>]*)?/?>")
            .expect("valid regex")
    });

    HTML_TAG_RE.replace_all(md, "").to_string()
}

// ---------------------------------------------------------------------------
// Pass 4: Normalize whitespace
// ---------------------------------------------------------------------------

/// Strip trailing whitespace on every line.
fn normalize_whitespace(md: &str) -> String {
    md.lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Pass 5: Clean up excessive blank lines
// ---------------------------------------------------------------------------

/// Collapse runs of blank lines into one.
fn clean_blank_lines(md: &str) -> String {
    static MULTI_BLANK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

    MULTI_BLANK_RE.replace_all(md, "\n\n").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn images_are_removed() {
        assert_eq!(drop_images("Seal ![seal](/seal.png) here"), "Seal  here");
    }

    #[test]
    fn links_keep_their_text() {
        assert_eq!(
            unwrap_links("See [section 101](https://uscode.house.gov/101) of title 5."),
            "See section 101 of title 5."
        );
    }

    #[test]
    fn leftover_tags_are_stripped() {
        assert_eq!(
            strip_leftover_html("<span class=\"x\">kept</span> text"),
            "kept text"
        );
    }

    #[test]
    fn pipeline_collapses_and_trims() {
        let md = "\n\n# Title  \n\n\n\n\nBody ![i](x.png)[link](y)\n\n";
        assert_eq!(run_pipeline(md), "# Title\n\nBody link");
    }
}
