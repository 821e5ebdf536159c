//! Core domain types for billscope: bills, their sections, and text statistics.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::slug::{DEFAULT_SLUG_CHARS, slug};

/// Summary recorded for sections that have no content to summarize.
pub const NO_SUMMARY: &str = "No summary available.";

// ---------------------------------------------------------------------------
// TextStats
// ---------------------------------------------------------------------------

/// Linguistic statistics for one span of text (a section or a whole bill).
///
/// Flattened into [`BillSection`] and [`Bill`] when serialized, so the JSON
/// shape carries `num_tokens`, `entities`, etc. at the top level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextStats {
    pub num_tokens: usize,
    pub num_sentences: usize,
    pub num_characters: usize,
    pub num_nouns: usize,
    pub num_verbs: usize,
    pub num_adjectives: usize,
    pub num_adverbs: usize,
    pub num_punctuations: usize,
    pub num_numbers: usize,
    pub num_entities: usize,
    pub avg_token_length: f64,
    /// Mean tokens per sentence.
    pub avg_sentence_length: f64,
    /// Shannon entropy (natural log) of the token frequency distribution.
    pub token_entropy: f64,
    /// Named entities in document order, duplicates kept.
    #[serde(default)]
    pub entities: Vec<String>,
    /// Sentences containing `$` or the word "dollar".
    #[serde(default)]
    pub money_sentences: Vec<String>,
}

// ---------------------------------------------------------------------------
// BillSection
// ---------------------------------------------------------------------------

/// One `<section>` of a bill, with its rendered forms and statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BillSection {
    /// Statutory numbering token, e.g. `"2."`.
    #[serde(rename = "enum", default)]
    pub enum_: Option<String>,
    #[serde(default)]
    pub header: Option<String>,
    /// The section element's `id` attribute.
    #[serde(default)]
    pub toc_id: Option<String>,
    pub text: String,
    pub markdown: String,
    pub html: String,

    #[serde(flatten)]
    pub stats: TextStats,

    /// Generated summary (or [`NO_SUMMARY`] for blank sections).
    #[serde(default)]
    pub summary: Option<String>,
    /// Generated issue audit.
    #[serde(default)]
    pub issues: Vec<String>,
}

impl BillSection {
    /// Whether the section has any markdown worth sending to a model.
    pub fn is_blank(&self) -> bool {
        self.markdown.trim().is_empty()
    }

    /// Display label such as `"SEC. 2. Definitions"`, skipping missing parts.
    pub fn label(&self) -> String {
        [self.enum_.as_deref(), self.header.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

// ---------------------------------------------------------------------------
// Bill
// ---------------------------------------------------------------------------

/// A fully parsed (and, once enriched, fully annotated) bill.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    // Metadata
    pub title: String,
    #[serde(default)]
    pub short_titles: Vec<String>,
    pub publisher: String,
    pub date: Option<NaiveDate>,
    pub congress: String,
    pub session: String,
    pub legis_num: String,
    pub current_chamber: String,
    pub is_appropriation: bool,
    pub bill_version: String,
    pub bill_type: String,
    #[serde(default)]
    pub package_id: Option<String>,
    #[serde(default)]
    pub llm_model_id: Option<String>,
    #[serde(default)]
    pub num_pages: Option<u32>,

    // Content representations
    pub text: String,
    pub markdown: String,
    pub html: String,

    // Structure and statistics
    pub num_sections: usize,
    #[serde(flatten)]
    pub stats: TextStats,
    #[serde(default)]
    pub sections: Vec<BillSection>,

    // Generated fields
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub commentary: Option<String>,
    #[serde(default)]
    pub money_commentary: Option<String>,
    #[serde(default)]
    pub eli5: Option<String>,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl Bill {
    /// URL-safe identifier built from the legislation number, title and version.
    pub fn slug(&self) -> String {
        slug(
            &self.legis_num,
            &self.title,
            &self.bill_version,
            DEFAULT_SLUG_CHARS,
        )
    }

    /// Whether any sentence in the bill references money.
    pub fn mentions_money(&self) -> bool {
        !self.stats.money_sentences.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_serializes_flat_with_enum_key() {
        let section = BillSection {
            enum_: Some("2.".into()),
            header: Some("Definitions".into()),
            toc_id: Some("H1234".into()),
            text: "In this Act:".into(),
            markdown: "In this Act:".into(),
            html: "<p>In this Act:</p>".into(),
            stats: TextStats {
                num_tokens: 4,
                ..Default::default()
            },
            ..Default::default()
        };

        let json = serde_json::to_value(&section).expect("serialize");
        assert_eq!(json["enum"], "2.");
        assert_eq!(json["num_tokens"], 4);
        assert!(json.get("stats").is_none());

        let back: BillSection = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, section);
    }

    #[test]
    fn section_label_skips_missing_parts() {
        let mut section = BillSection {
            enum_: Some("SEC. 2.".into()),
            header: Some("Definitions".into()),
            ..Default::default()
        };
        assert_eq!(section.label(), "SEC. 2. Definitions");

        section.enum_ = None;
        assert_eq!(section.label(), "Definitions");
    }

    #[test]
    fn blank_section_detection() {
        let section = BillSection {
            markdown: " \n\t".into(),
            ..Default::default()
        };
        assert!(section.is_blank());
    }

    #[test]
    fn bill_slug_uses_metadata() {
        let bill = Bill {
            legis_num: "H. R. 1234".into(),
            title: "To amend the Internal Revenue Code of 1986.".into(),
            bill_version: "ih".into(),
            ..Default::default()
        };
        assert_eq!(
            bill.slug(),
            "h-r-1234-to-amend-the-internal-revenue-code-of-1986-ih"
        );
    }

    #[test]
    fn bill_date_serializes_as_iso() {
        let bill = Bill {
            date: NaiveDate::from_ymd_opt(2024, 3, 15),
            ..Default::default()
        };
        let json = serde_json::to_value(&bill).expect("serialize");
        assert_eq!(json["date"], "2024-03-15");
        assert!(json["money_commentary"].is_null());
    }
}
