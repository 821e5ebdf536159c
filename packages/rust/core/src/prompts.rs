//! Prompt construction for every enrichment stage.
//!
//! A prompt is a list of named sections, each rendered as an upper-case
//! `# NAME` heading followed by its content. Instructions refer to the other
//! sections by those headings.

use serde::Serialize;
use serde_json::{Value, json};

use billscope_govinfo::PackageSummary;
use billscope_shared::{Bill, BillSection};

const ISSUES_SCHEMA: &str = r#"{"issues": ["string"]}"#;
const ENTITIES_SCHEMA: &str = r#"{"entities": ["string"]}"#;
const KEYWORDS_SCHEMA: &str = r#"{"keywords": ["string"]}"#;

/// How a bill-level stage presents the bill to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptStrategy {
    /// The whole bill markdown goes into the prompt.
    FullText,
    /// Too large for one prompt: use the per-section summaries and issues instead.
    SectionDigest,
}

// ---------------------------------------------------------------------------
// Prompt
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Prompt {
    sections: Vec<(String, String)>,
}

impl Prompt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, content: impl Into<String>) -> Self {
        self.sections.push((heading(name), content.into()));
        self
    }

    /// Add a section holding `value` as pretty-printed JSON.
    pub fn json<T: Serialize>(self, name: &str, value: &T) -> Self {
        let rendered = serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".into());
        self.text(name, rendered)
    }

    pub fn instructions(self, items: &[&str]) -> Self {
        let body = items
            .iter()
            .map(|item| format!("- {item}"))
            .collect::<Vec<_>>()
            .join("\n");
        self.text("instructions", body)
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for (name, content) in &self.sections {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str("# ");
            out.push_str(name);
            out.push('\n');
            out.push_str(content.trim_end());
            out.push('\n');
        }
        out
    }
}

fn heading(name: &str) -> String {
    name.replace('_', " ").to_uppercase()
}

// ---------------------------------------------------------------------------
// Shared blocks
// ---------------------------------------------------------------------------

fn metadata(bill: &Bill) -> Value {
    json!({
        "title": bill.title,
        "short_titles": bill.short_titles,
        "date": bill.date,
        "congress": bill.congress,
        "session": bill.session,
        "legislation_number": bill.legis_num,
        "current_chamber": bill.current_chamber,
        "is_appropriation": bill.is_appropriation,
        "bill_version": bill.bill_version,
        "bill_type": bill.bill_type,
    })
}

fn section_summaries(bill: &Bill) -> Vec<Value> {
    bill.sections
        .iter()
        .map(|s| json!({"enum": s.enum_, "header": s.header, "summary": s.summary}))
        .collect()
}

fn section_issues(bill: &Bill) -> Vec<Value> {
    bill.sections
        .iter()
        .map(|s| json!({"enum": s.enum_, "header": s.header, "issues": s.issues}))
        .collect()
}

fn section_digests(bill: &Bill) -> Vec<Value> {
    bill.sections
        .iter()
        .map(|s| {
            json!({
                "enum": s.enum_,
                "header": s.header,
                "summary": s.summary,
                "issues": s.issues,
            })
        })
        .collect()
}

fn section_money(bill: &Bill) -> Vec<Value> {
    bill.sections
        .iter()
        .map(|s| {
            json!({
                "enum": s.enum_,
                "header": s.header,
                "money_sentences": s.stats.money_sentences,
            })
        })
        .collect()
}

fn opt(text: &Option<String>) -> &str {
    text.as_deref().unwrap_or("")
}

// ---------------------------------------------------------------------------
// Section stages
// ---------------------------------------------------------------------------

pub fn section_summary(section: &BillSection) -> String {
    Prompt::new()
        .text("example", "This section defines the terms related to widgets.")
        .text("text", &section.markdown)
        .instructions(&[
            "You are an expert attorney summarizing one section of a bill from the United States Congress.",
            "Carefully review the EXAMPLE above.",
            "Carefully read the section text above in TEXT.",
            "Write a summary of the section that is one to two sentences long, in plain language a high school student could understand, in the third person with a neutral style, and formatted with Markdown.",
            "Do not include any heading or footer. Return only the summary text.",
        ])
        .render()
}

pub fn section_audit(section: &BillSection) -> String {
    Prompt::new()
        .text("text", &section.markdown)
        .instructions(&[
            "You are an expert auditor reviewing one section of a bill from the United States Congress.",
            "Carefully read the section text above in TEXT.",
            "Look for potential issues such as wasteful spending, spending that favors a particular organization or individual, unclear or ambiguous language, overly complex language, or anything else of concern.",
            "Return the issues as a JSON list of strings.",
            "Respond in JSON using the SCHEMA below.",
        ])
        .text("schema", ISSUES_SCHEMA)
        .render()
}

// ---------------------------------------------------------------------------
// Bill stages
// ---------------------------------------------------------------------------

pub fn bill_summary(bill: &Bill, package: &PackageSummary, strategy: PromptStrategy) -> String {
    let style = "Write a summary of the bill that is two to four sentences long, in plain language a high school student could understand, in the third person with a neutral style, and formatted with Markdown.";
    let closing = "Do not include any heading or footer. Return only the summary text.";

    match strategy {
        PromptStrategy::SectionDigest => {
            let mut meta = metadata(bill);
            meta["num_pages"] = json!(bill.num_pages);
            meta["committees"] = json!(package.committees);
            meta["members"] = json!(package.members);

            Prompt::new()
                .text(
                    "example",
                    "**S. 1234**, the Widget Act, is a 37 page bill that would regulate the manufacturing of widgets in the United States.",
                )
                .json("metadata", &meta)
                .json("sections", &section_summaries(bill))
                .instructions(&[
                    "You are an expert attorney summarizing a bill from the United States Congress.",
                    "Carefully review the EXAMPLE above.",
                    "Carefully review the bill metadata above in METADATA.",
                    "Carefully read the summaries of each section above in SECTIONS.",
                    style,
                    closing,
                ])
                .render()
        }
        PromptStrategy::FullText => Prompt::new()
            .text(
                "example",
                "**S. 1234** provides a framework for regulating the manufacturing of widgets in the United States.",
            )
            .json("metadata", &metadata(bill))
            .text("text", &bill.markdown)
            .instructions(&[
                "You are an expert attorney summarizing a bill from the United States Congress.",
                "Carefully review the EXAMPLE above.",
                "Carefully review the bill metadata above in METADATA.",
                "Carefully read the bill text above in TEXT.",
                style,
                closing,
            ])
            .render(),
    }
}

pub fn bill_audit(bill: &Bill, strategy: PromptStrategy) -> String {
    let synthesize = "Synthesize the material into a list of salient issues that could matter to the general public for political, legal, ethical, or financial reasons, citing the related sections explicitly.";
    let rank = "Rank the issues by importance, most important or controversial first.";
    let ret = "Return the issues as a JSON list of strings.";
    let respond = "Respond in JSON using the SCHEMA below.";

    match strategy {
        PromptStrategy::SectionDigest => Prompt::new()
            .json("metadata", &metadata(bill))
            .json("sections", &section_digests(bill))
            .instructions(&[
                "You are an expert auditor reviewing a bill from the United States Congress.",
                "Carefully review the bill metadata above in METADATA.",
                "Carefully read the summaries and issues of each section above in SECTIONS.",
                synthesize,
                rank,
                ret,
                respond,
            ])
            .text("schema", ISSUES_SCHEMA)
            .render(),
        PromptStrategy::FullText => Prompt::new()
            .text(
                "example",
                "The definition of **widget** in *Section 301* might unfairly favor larger manufacturers.",
            )
            .json("metadata", &metadata(bill))
            .json("sections", &section_issues(bill))
            .text("text", &bill.markdown)
            .instructions(&[
                "You are an expert auditor reviewing the issues found in a bill from the United States Congress.",
                "Carefully review the bill metadata above in METADATA.",
                "Carefully read the issues by section above in SECTIONS.",
                "Carefully read the bill text above in TEXT.",
                synthesize,
                rank,
                ret,
                respond,
            ])
            .text("schema", ISSUES_SCHEMA)
            .render(),
    }
}

const COMMENTARY_SCOPE: &str = "Address a general summary of the bill, a summary of significant issues, how the bill might affect the public broadly, and how it might help or hurt specific stakeholders.";
const COMMENTARY_FORM: &[&str] = &[
    "Write for a general audience with a high school education.",
    "Organize the commentary into sections and paragraphs. Do not include a title header.",
    "Write in the third person with a neutral style.",
    "Format the commentary with Markdown.",
];

pub fn commentary(bill: &Bill, strategy: PromptStrategy) -> String {
    let mut instructions = vec![
        "You are an expert attorney drafting editorial commentary on a bill from the United States Congress.",
        "Carefully review the bill metadata above in METADATA.",
    ];

    let prompt = match strategy {
        PromptStrategy::SectionDigest => {
            instructions.push("Carefully read the summaries and issues of each section above in SECTIONS.");
            Prompt::new()
                .json("metadata", &metadata(bill))
                .json("sections", &section_digests(bill))
        }
        PromptStrategy::FullText => {
            instructions.extend([
                "Carefully read the bill text above in TEXT.",
                "Carefully read the summaries and issues by section above in SECTIONS.",
                "Carefully read the list of issues above in ISSUES.",
            ]);
            Prompt::new()
                .json("metadata", &metadata(bill))
                .text("text", &bill.markdown)
                .json("sections", &section_digests(bill))
                .json("issues", &bill.issues)
        }
    };

    instructions.push(COMMENTARY_SCOPE);
    instructions.extend_from_slice(COMMENTARY_FORM);
    instructions.push("Respond only with the commentary as Markdown text.");
    prompt.instructions(&instructions).render()
}

pub fn money_commentary(bill: &Bill, strategy: PromptStrategy) -> String {
    let mut instructions = vec![
        "You are an expert attorney drafting commentary on how money is used or referenced in a bill from the United States Congress.",
        "Carefully review the bill metadata above in METADATA.",
    ];

    let mut prompt = Prompt::new().json("metadata", &metadata(bill));
    if strategy == PromptStrategy::FullText {
        instructions.push("Carefully read the bill text above in TEXT.");
        prompt = prompt.text("text", &bill.markdown);
    }

    instructions.extend([
        "Carefully read the money references by section above in SECTIONS.",
        "Carefully read the bill summary above in SUMMARY.",
        "Carefully read the list of issues above in ISSUES.",
        "Focus only on the financial references: summarize any spending, appropriations, or financial allocations, and relate them to the issues above.",
    ]);
    instructions.extend_from_slice(COMMENTARY_FORM);
    instructions.extend([
        "Bold any financial references or amounts.",
        "Respond only with the commentary as Markdown text.",
    ]);

    prompt
        .json("sections", &section_money(bill))
        .text("summary", opt(&bill.summary))
        .json("issues", &bill.issues)
        .instructions(&instructions)
        .render()
}

pub fn eli5(bill: &Bill) -> String {
    Prompt::new()
        .json("metadata", &metadata(bill))
        .text("summary", opt(&bill.summary))
        .json("issues", &bill.issues)
        .text("money_commentary", opt(&bill.money_commentary))
        .instructions(&[
            "You are an expert attorney explaining a bill from the United States Congress in simple terms.",
            "Carefully review the bill metadata above in METADATA.",
            "Carefully review the SUMMARY, ISSUES, and MONEY COMMENTARY above.",
            "Write an explain-like-I'm-five summary of the bill that is one to two sentences long, in language a child could understand, in the third person with a neutral style, and formatted with Markdown.",
            "Do not include any heading or footer. Return only the explanation text.",
        ])
        .render()
}

pub fn entity_filter(bill: &Bill, entities: &[String]) -> String {
    Prompt::new()
        .json("entities", &entities)
        .json("metadata", &metadata(bill))
        .text("summary", opt(&bill.summary))
        .json("issues", &bill.issues)
        .instructions(&[
            "You are an expert attorney reviewing a bill from the United States Congress.",
            "Carefully review the bill metadata above in METADATA.",
            "Carefully read the SUMMARY and ISSUES above.",
            "Keep only the named entities in ENTITIES that are directly relevant to the bill.",
            "Return the relevant entities as a JSON list of strings, copied exactly from ENTITIES.",
            "Respond in JSON using the SCHEMA below.",
        ])
        .text("schema", ENTITIES_SCHEMA)
        .render()
}

pub fn keywords(bill: &Bill) -> String {
    Prompt::new()
        .json("metadata", &metadata(bill))
        .text("summary", opt(&bill.summary))
        .json("issues", &bill.issues)
        .json("sections", &section_digests(bill))
        .instructions(&[
            "You are an expert attorney tagging a bill from the United States Congress for search and indexing.",
            "Carefully review the bill metadata above in METADATA.",
            "Carefully review the SUMMARY, ISSUES, and SECTIONS above.",
            "List up to 10 keywords relevant for search and indexing of this bill.",
            "Rank the keywords by importance, most important first.",
            "Return the keywords as a JSON list of strings.",
            "Respond in JSON using the SCHEMA below.",
        ])
        .text("schema", KEYWORDS_SCHEMA)
        .render()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bill() -> Bill {
        Bill {
            title: "Clean Water Infrastructure Act".into(),
            legis_num: "H. R. 1234".into(),
            markdown: "FULL BILL MARKDOWN".into(),
            sections: vec![BillSection {
                enum_: Some("1.".into()),
                header: Some("Short title".into()),
                markdown: "SECTION MARKDOWN".into(),
                summary: Some("Names the act.".into()),
                issues: vec!["Vague title".into()],
                ..Default::default()
            }],
            num_sections: 1,
            ..Default::default()
        }
    }

    #[test]
    fn render_uses_uppercase_headings() {
        let out = Prompt::new()
            .text("money_commentary", "none")
            .instructions(&["one", "two"])
            .render();
        assert_eq!(out, "# MONEY COMMENTARY\nnone\n\n# INSTRUCTIONS\n- one\n- two\n");
    }

    #[test]
    fn json_sections_are_pretty_printed() {
        let out = Prompt::new().json("issues", &vec!["a"]).render();
        assert_eq!(out, "# ISSUES\n[\n  \"a\"\n]\n");
    }

    #[test]
    fn strategies_differ_in_text_inclusion() {
        let b = bill();
        let pkg: PackageSummary = serde_json::from_str("{}").unwrap();

        let full = bill_summary(&b, &pkg, PromptStrategy::FullText);
        assert!(full.contains("FULL BILL MARKDOWN"));
        assert!(full.contains("\"legislation_number\": \"H. R. 1234\""));

        let digest = bill_summary(&b, &pkg, PromptStrategy::SectionDigest);
        assert!(!digest.contains("FULL BILL MARKDOWN"));
        assert!(digest.contains("Names the act."));
        assert!(digest.contains("\"committees\""));
    }

    #[test]
    fn section_prompts_carry_section_markdown() {
        let b = bill();
        assert!(section_summary(&b.sections[0]).contains("SECTION MARKDOWN"));
        let audit = section_audit(&b.sections[0]);
        assert!(audit.contains("# SCHEMA"));
        assert!(audit.contains("\"issues\""));
    }

    #[test]
    fn entity_prompt_lists_candidates() {
        let prompt = entity_filter(&bill(), &["Congress".into(), "EPA".into()]);
        assert!(prompt.starts_with("# ENTITIES\n"));
        assert!(prompt.contains("\"EPA\""));
    }
}
