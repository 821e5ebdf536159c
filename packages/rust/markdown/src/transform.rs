//! Bill XML → HTML/text/Markdown.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use roxmltree::{Document, Node, NodeType, ParsingOptions};
use tracing::{debug, instrument};

use billscope_shared::{BillscopeError, Result};

use crate::convert::{Converted, convert};
use crate::stylesheet::Stylesheet;

/// Phrase identifying the injected enacting clause.
const ENACTING_MARKER: &str = "Be it enacted by the Senate and House of Representatives";

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Text, Markdown and HTML for one rendered fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    pub markdown: String,
    pub html: String,
}

/// One `<section>` with its structural metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSection {
    pub enum_: Option<String>,
    pub header: Option<String>,
    pub toc_id: Option<String>,
    pub content: Rendered,
}

/// A whole bill: its legislation number, full rendering, and sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformedBill {
    /// Text of `<legis-num>`, or empty when absent.
    pub legis_num: String,
    pub content: Rendered,
    /// Every `<section>` in document order, nested ones included.
    pub sections: Vec<RenderedSection>,
}

// ---------------------------------------------------------------------------
// Transformer
// ---------------------------------------------------------------------------

/// Applies a [`Stylesheet`] to bill XML.
///
/// Cheap to clone; the stylesheet is shared.
#[derive(Debug, Clone)]
pub struct Transformer {
    stylesheet: Arc<Stylesheet>,
}

impl Transformer {
    pub fn new(stylesheet: Arc<Stylesheet>) -> Self {
        Self { stylesheet }
    }

    /// Transformer over the embedded stylesheet.
    pub fn with_embedded() -> Result<Self> {
        Ok(Self::new(Arc::new(Stylesheet::embedded()?)))
    }

    pub fn stylesheet(&self) -> &Stylesheet {
        &self.stylesheet
    }

    /// Parse and render a full bill document.
    #[instrument(skip_all, fields(xml_len = xml.len()))]
    pub fn transform(&self, xml: &str) -> Result<TransformedBill> {
        let doc = parse_xml(xml)?;
        let root = doc.root_element();

        let legis_num = root
            .descendants()
            .find(|n| n.has_tag_name("legis-num"))
            .map(node_text)
            .unwrap_or_default();

        let mut html = String::new();
        self.render_node(root, &mut html);
        let content = rendered(html)?;

        let sections = root
            .descendants()
            .filter(|n| n.has_tag_name("section"))
            .map(|n| self.render_section(n))
            .collect::<Result<Vec<_>>>()?;

        debug!(legis_num = %legis_num, sections = sections.len(), "transformed bill");

        Ok(TransformedBill {
            legis_num,
            content,
            sections,
        })
    }

    /// Render one section inside a synthetic `bill/legis-body` scaffold,
    /// dropping the enacting clause the scaffold introduces.
    pub fn render_section(&self, section: Node<'_, '_>) -> Result<RenderedSection> {
        let mut inner = String::new();
        self.render_node(section, &mut inner);

        let body = self.wrap("legis-body", &inner);
        let html = strip_enacting_clause(&self.wrap("bill", &body));

        Ok(RenderedSection {
            enum_: first_descendant_text(section, "enum"),
            header: first_descendant_text(section, "header"),
            toc_id: section.attribute("id").map(str::to_string),
            content: rendered(html)?,
        })
    }

    /// Render a standalone section fragment (its root must be `<section>`).
    pub fn transform_section(&self, xml: &str) -> Result<RenderedSection> {
        let doc = parse_xml(xml)?;
        let root = doc.root_element();
        if !root.has_tag_name("section") {
            return Err(BillscopeError::parse(format!(
                "expected <section>, found <{}>",
                root.tag_name().name()
            )));
        }
        self.render_section(root)
    }

    // -----------------------------------------------------------------------
    // HTML emission
    // -----------------------------------------------------------------------

    fn render_node(&self, node: Node<'_, '_>, out: &mut String) {
        match node.node_type() {
            NodeType::Text => escape_into(node.text().unwrap_or_default(), out),
            NodeType::Element => {
                let name = node.tag_name().name();
                let rule = self.stylesheet.rule(name);
                if rule.skip {
                    return;
                }
                let tag = self.open(name, node.attribute("id"), out);
                for child in node.children() {
                    self.render_node(child, out);
                }
                self.close(tag, name, out);
            }
            _ => {}
        }
    }

    /// Wrap already-rendered HTML in the element `name`.
    fn wrap(&self, name: &str, inner: &str) -> String {
        let mut out = String::new();
        let tag = self.open(name, None, &mut out);
        out.push_str(inner);
        self.close(tag, name, &mut out);
        out
    }

    fn open<'s>(&'s self, name: &str, id: Option<&str>, out: &mut String) -> &'s str {
        let rule = self.stylesheet.rule(name);
        let tag = self.stylesheet.tag_for(name);
        let class = rule.class.as_deref().unwrap_or(name);

        out.push('<');
        out.push_str(tag);
        out.push_str(" class=\"");
        escape_into(class, out);
        out.push('"');
        if let Some(id) = id {
            out.push_str(" id=\"");
            escape_into(id, out);
            out.push('"');
        }
        out.push('>');

        if rule.enacting_clause {
            out.push_str("<em>");
            escape_into(&self.stylesheet.enacting_clause, out);
            out.push_str("</em>");
        }
        tag
    }

    fn close(&self, tag: &str, name: &str, out: &mut String) {
        out.push_str("</");
        out.push_str(tag);
        out.push('>');
        if let Some(suffix) = &self.stylesheet.rule(name).suffix {
            escape_into(suffix, out);
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse XML, accepting the DOCTYPE declarations GovInfo documents carry.
fn parse_xml(xml: &str) -> Result<Document<'_>> {
    let opts = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    Document::parse_with_options(xml, opts)
        .map_err(|e| BillscopeError::parse(format!("malformed bill XML: {e}")))
}

fn rendered(html: String) -> Result<Rendered> {
    let Converted { text, markdown } = convert(&html)?;
    Ok(Rendered {
        text,
        markdown,
        html,
    })
}

/// Concatenated, trimmed text of every text node under `node`.
fn node_text(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect::<String>()
        .trim()
        .to_string()
}

fn first_descendant_text(node: Node<'_, '_>, name: &str) -> Option<String> {
    node.descendants()
        .skip(1)
        .find(|n| n.has_tag_name(name))
        .map(node_text)
}

/// Remove every `<em>` carrying the enacting clause.
fn strip_enacting_clause(html: &str) -> String {
    static EM_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)<em>(.*?)</em>").expect("valid regex"));

    EM_RE
        .replace_all(html, |caps: &regex::Captures| {
            if caps[1].contains(ENACTING_MARKER) {
                String::new()
            } else {
                caps[0].to_string()
            }
        })
        .to_string()
}

fn escape_into(s: &str, out: &mut String) {
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> String {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../../fixtures/xml")
            .join(name);
        std::fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
    }

    fn transformer() -> Transformer {
        Transformer::with_embedded().unwrap()
    }

    #[test]
    fn transforms_sample_bill() {
        let bill = transformer().transform(&fixture("sample_bill.xml")).unwrap();

        assert_eq!(bill.legis_num, "H. R. 1234");
        assert_eq!(bill.sections.len(), 3);
        assert!(bill.content.html.contains(ENACTING_MARKER));
        assert!(bill.content.text.contains("Clean Water Infrastructure Act"));
        // metadata is skipped
        assert!(!bill.content.text.contains("Pursuant to Title 17"));
    }

    #[test]
    fn section_metadata_is_extracted() {
        let bill = transformer().transform(&fixture("sample_bill.xml")).unwrap();
        let first = &bill.sections[0];
        assert_eq!(first.enum_.as_deref(), Some("1."));
        assert_eq!(first.header.as_deref(), Some("Short title"));
        assert_eq!(first.toc_id.as_deref(), Some("H0001"));
        assert!(first.content.text.contains("Clean Water Infrastructure Act"));
    }

    #[test]
    fn sections_drop_enacting_clause() {
        let bill = transformer().transform(&fixture("sample_bill.xml")).unwrap();
        for section in &bill.sections {
            assert!(!section.content.html.contains(ENACTING_MARKER));
            assert!(!section.content.text.contains("Be it enacted"));
        }
    }

    #[test]
    fn section_without_enum_or_header() {
        let s = transformer()
            .transform_section("<section><text>Plain text only.</text></section>")
            .unwrap();
        assert_eq!(s.enum_, None);
        assert_eq!(s.header, None);
        assert_eq!(s.toc_id, None);
        assert_eq!(s.content.text, "Plain text only.");
    }

    #[test]
    fn missing_legis_num_is_empty() {
        let bill = transformer()
            .transform("<bill><legis-body><section><text>x</text></section></legis-body></bill>")
            .unwrap();
        assert_eq!(bill.legis_num, "");
        assert_eq!(bill.sections.len(), 1);
    }

    #[test]
    fn malformed_xml_fails_fast() {
        let err = transformer().transform("<bill><section></bill>").unwrap_err();
        assert!(matches!(err, BillscopeError::Parse { .. }));
    }

    #[test]
    fn text_is_escaped_in_html() {
        let s = transformer()
            .transform_section("<section><text>Costs &lt; $5 &amp; more</text></section>")
            .unwrap();
        assert!(s.content.html.contains("Costs &lt; $5 &amp; more"));
        assert_eq!(s.content.text, "Costs < $5 & more");
    }

    #[test]
    fn retransforming_is_byte_identical() {
        let xml = fixture("sample_bill.xml");
        let t = transformer();
        assert_eq!(t.transform(&xml).unwrap(), t.transform(&xml).unwrap());
    }

    #[test]
    fn strip_keeps_other_emphasis() {
        let html = "<em>Be it enacted by the Senate and House of Representatives of X,</em><em>keep</em>";
        assert_eq!(strip_enacting_clause(html), "<em>keep</em>");
    }
}
