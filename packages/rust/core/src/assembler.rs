//! Bill assembler.
//!
//! Combines the rendered XML, the package summary metadata and the
//! linguistic statistics into an un-enriched [`Bill`].

use std::sync::Arc;

use tracing::{debug, instrument};

use billscope_govinfo::PackageSummary;
use billscope_markdown::{RenderedSection, Transformer};
use billscope_nlp::Analyzer;
use billscope_shared::{Bill, BillSection, Result};

/// Builds bills from XML. Cheap to clone; the transformer and analyzer are shared.
#[derive(Debug, Clone)]
pub struct BillAssembler {
    transformer: Transformer,
    analyzer: Arc<Analyzer>,
}

impl BillAssembler {
    pub fn new(transformer: Transformer, analyzer: Arc<Analyzer>) -> Self {
        Self {
            transformer,
            analyzer,
        }
    }

    /// Transform and analyze `xml`. Malformed XML fails before anything is built.
    #[instrument(skip_all, fields(package_id = %package_id))]
    pub fn assemble(&self, package_id: &str, xml: &str, package: &PackageSummary) -> Result<Bill> {
        let transformed = self.transformer.transform(xml)?;

        let sections: Vec<BillSection> = transformed
            .sections
            .into_iter()
            .map(|s| self.section(s))
            .collect();

        let stats = self.analyzer.analyze(&transformed.content.text);
        debug!(
            sections = sections.len(),
            tokens = stats.num_tokens,
            money_sentences = stats.money_sentences.len(),
            "bill assembled"
        );

        Ok(Bill {
            title: package.title.clone(),
            short_titles: package.short_title_texts(),
            publisher: package.publisher.clone(),
            date: package.date(),
            congress: package.congress.clone(),
            session: package.session.clone(),
            legis_num: transformed.legis_num,
            current_chamber: package.current_chamber.clone(),
            is_appropriation: package.is_appropriation,
            bill_version: package.bill_version.clone(),
            bill_type: package.bill_type.clone(),
            package_id: Some(package_id.to_string()),
            llm_model_id: None,
            num_pages: package.num_pages(),
            text: transformed.content.text,
            markdown: transformed.content.markdown,
            html: transformed.content.html,
            num_sections: sections.len(),
            stats,
            sections,
            ..Default::default()
        })
    }

    fn section(&self, rendered: RenderedSection) -> BillSection {
        let stats = self.analyzer.analyze(&rendered.content.text);
        BillSection {
            enum_: rendered.enum_,
            header: rendered.header,
            toc_id: rendered.toc_id,
            text: rendered.content.text,
            markdown: rendered.content.markdown,
            html: rendered.content.html,
            stats,
            summary: None,
            issues: Vec::new(),
        }
    }
}
