//! Shared HTML → text / Markdown conversion.
//!
//! Both whole bills and individual sections go through [`convert`], so the
//! two representations are always produced the same way.

use scraper::{ElementRef, Html};
use tracing::debug;

use billscope_shared::{BillscopeError, Result};

use crate::cleanup;

/// Plain text and Markdown renderings of one HTML fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Converted {
    pub text: String,
    pub markdown: String,
}

/// Tags that start a new line in plain-text output.
const BLOCK_TAGS: &[&str] = &[
    "address", "blockquote", "body", "dd", "div", "dl", "dt", "h1", "h2", "h3", "h4", "h5", "h6",
    "hr", "li", "ol", "p", "pre", "section", "table", "tr", "ul",
];

/// Convert an HTML fragment to text and to link/image-free Markdown.
pub fn convert(html: &str) -> Result<Converted> {
    let text = html_to_text(html);
    let markdown = html_to_markdown(html)?;
    debug!(
        text_len = text.len(),
        markdown_len = markdown.len(),
        "converted html"
    );
    Ok(Converted { text, markdown })
}

/// Convert HTML to Markdown via `htmd`, then run the cleanup pipeline.
pub fn html_to_markdown(html: &str) -> Result<String> {
    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(vec!["script", "style", "img", "iframe", "svg"])
        .build();

    let raw = converter
        .convert(html)
        .map_err(|e| BillscopeError::Conversion(format!("htmd conversion failed: {e}")))?;

    Ok(cleanup::run_pipeline(&raw))
}

/// Extract readable text: one line per block element, inline whitespace
/// collapsed, no blank lines.
pub fn html_to_text(html: &str) -> String {
    let doc = Html::parse_fragment(html);
    let mut raw = String::new();
    collect_text(doc.root_element(), &mut raw);
    tidy_lines(&raw)
}

fn collect_text(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        if let Some(text) = child.value().as_text() {
            push_collapsed(out, text);
        } else if let Some(child_el) = ElementRef::wrap(child) {
            let name = child_el.value().name();
            if name == "br" {
                out.push('\n');
                continue;
            }
            let block = BLOCK_TAGS.contains(&name);
            if block {
                out.push('\n');
            }
            collect_text(child_el, out);
            if block {
                out.push('\n');
            }
        }
    }
}

fn push_collapsed(out: &mut String, text: &str) {
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !matches!(out.chars().last(), None | Some(' ') | Some('\n')) {
                out.push(' ');
            }
        } else {
            out.push(ch);
        }
    }
}

fn tidy_lines(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_puts_blocks_on_lines() {
        let html = "<div><p>First   paragraph\n  here.</p><p>Second <em>one</em>.</p></div>";
        assert_eq!(html_to_text(html), "First paragraph here.\nSecond one.");
    }

    #[test]
    fn text_handles_breaks_and_empty_input() {
        assert_eq!(html_to_text("<p>a<br>b</p>"), "a\nb");
        assert_eq!(html_to_text(""), "");
        assert_eq!(html_to_text("<div>  \n </div>"), "");
    }

    #[test]
    fn markdown_drops_links_and_images() {
        let html = r#"<p>See <a href="https://example.com">the act</a>.<img src="seal.png" alt="seal"></p>"#;
        let md = html_to_markdown(html).unwrap();
        assert!(md.contains("See the act."));
        assert!(!md.contains("https://"));
        assert!(!md.contains("seal"));
    }

    #[test]
    fn markdown_keeps_emphasis() {
        let md = html_to_markdown("<p><strong>SEC. 2.</strong> Definitions</p>").unwrap();
        assert!(md.contains("**SEC. 2.**"));
        assert!(md.contains("Definitions"));
    }

    #[test]
    fn conversion_is_deterministic() {
        let html = "<div><h1>H. R. 1</h1><p>To do things.</p></div>";
        assert_eq!(convert(html).unwrap(), convert(html).unwrap());
    }
}
