//! LLM enrichment orchestrator.
//!
//! Runs the stage chain over an assembled bill: per-section summary and
//! audit, then bill summary, issue audit, commentary, money commentary,
//! ELI5, entity filtering and keyword extraction. Each stage sees the output
//! of the stages before it.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use billscope_govinfo::{PackageSummary, Sleeper, TokioSleeper};
use billscope_shared::{Bill, BillSection, IngestConfig, LlmConfig, NO_SUMMARY, Result};

use crate::llm::LanguageModel;
use crate::prompts::{self, PromptStrategy};

/// Most keywords kept per bill.
pub const MAX_KEYWORDS: usize = 10;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Tuning for the enrichment chain.
#[derive(Debug, Clone)]
pub struct EnrichmentConfig {
    /// Estimated prompt tokens above which bill stages switch to section digests.
    pub prompt_token_limit: usize,
    /// Tokens per whitespace-separated word in the estimate.
    pub token_multiplier: f64,
    /// Pause after each section that made model calls.
    pub section_delay: Duration,
}

impl EnrichmentConfig {
    pub fn from_config(llm: &LlmConfig, ingest: &IngestConfig) -> Self {
        Self {
            prompt_token_limit: llm.prompt_token_limit,
            token_multiplier: llm.token_multiplier,
            section_delay: Duration::from_millis(ingest.section_delay_ms),
        }
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self::from_config(&LlmConfig::default(), &IngestConfig::default())
    }
}

/// Approximate model tokens for `text`: word count times `multiplier`.
pub fn estimate_tokens(text: &str, multiplier: f64) -> f64 {
    text.split_whitespace().count() as f64 * multiplier
}

// ---------------------------------------------------------------------------
// Enricher
// ---------------------------------------------------------------------------

pub struct Enricher {
    llm: Arc<dyn LanguageModel>,
    config: EnrichmentConfig,
    sleeper: Arc<dyn Sleeper>,
}

impl Enricher {
    pub fn new(llm: Arc<dyn LanguageModel>, config: EnrichmentConfig) -> Self {
        Self {
            llm,
            config,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn model_id(&self) -> &str {
        self.llm.model_id()
    }

    /// Full text when the bill fits the prompt budget, section digests otherwise.
    pub fn strategy_for(&self, bill: &Bill) -> PromptStrategy {
        let estimate = estimate_tokens(&bill.markdown, self.config.token_multiplier);
        if estimate > self.config.prompt_token_limit as f64 {
            PromptStrategy::SectionDigest
        } else {
            PromptStrategy::FullText
        }
    }

    /// Run every stage over `bill`. Model failures propagate; malformed
    /// structured replies degrade to empty lists.
    #[instrument(skip_all, fields(package_id = bill.package_id.as_deref().unwrap_or(""), sections = bill.sections.len()))]
    pub async fn enrich(&self, bill: &mut Bill, package: &PackageSummary) -> Result<()> {
        bill.llm_model_id = Some(self.llm.model_id().to_string());

        self.enrich_sections(&mut bill.sections).await?;

        let strategy = self.strategy_for(bill);
        info!(?strategy, "running bill stages");

        debug!("stage: summary");
        bill.summary = Some(self.llm.chat(&prompts::bill_summary(bill, package, strategy)).await?);

        debug!("stage: issues");
        let reply = self.llm.json(&prompts::bill_audit(bill, strategy)).await?;
        bill.issues = string_list(&reply, "issues");

        debug!("stage: commentary");
        bill.commentary = Some(self.llm.chat(&prompts::commentary(bill, strategy)).await?);

        bill.money_commentary = if bill.mentions_money() {
            debug!("stage: money commentary");
            Some(self.llm.chat(&prompts::money_commentary(bill, strategy)).await?)
        } else {
            None
        };

        debug!("stage: eli5");
        bill.eli5 = Some(self.llm.chat(&prompts::eli5(bill)).await?);

        debug!("stage: entities");
        let candidates = dedup_entities(&bill.stats.entities);
        let reply = self.llm.json(&prompts::entity_filter(bill, &candidates)).await?;
        bill.stats.entities = filter_entities(&candidates, &string_list(&reply, "entities"));

        debug!("stage: keywords");
        let reply = self.llm.json(&prompts::keywords(bill)).await?;
        bill.keywords = normalize_keywords(&string_list(&reply, "keywords"));

        info!(
            issues = bill.issues.len(),
            entities = bill.stats.entities.len(),
            keywords = bill.keywords.len(),
            money = bill.money_commentary.is_some(),
            "enrichment complete"
        );
        Ok(())
    }

    /// Summarize and audit each section in document order. Blank sections get
    /// a placeholder summary and no model calls.
    pub async fn enrich_sections(&self, sections: &mut [BillSection]) -> Result<()> {
        let total = sections.len();
        for (i, section) in sections.iter_mut().enumerate() {
            if section.is_blank() {
                debug!(section = i + 1, total, "blank section, skipping model calls");
                section.summary = Some(NO_SUMMARY.to_string());
                section.issues = Vec::new();
                continue;
            }

            debug!(section = i + 1, total, label = %section.label(), "enriching section");
            section.summary = Some(self.llm.chat(&prompts::section_summary(section)).await?);
            let reply = self.llm.json(&prompts::section_audit(section)).await?;
            section.issues = string_list(&reply, "issues");

            self.sleeper.sleep(self.config.section_delay).await;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Reply handling
// ---------------------------------------------------------------------------

/// Strings under `key` in a structured reply. Anything else yields empty.
fn string_list(reply: &Value, key: &str) -> Vec<String> {
    match reply.get(key).and_then(Value::as_array) {
        Some(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        None => {
            warn!(key, "model reply missing expected list, using empty list");
            Vec::new()
        }
    }
}

fn entity_key(entity: &str) -> String {
    entity.trim().to_lowercase()
}

/// Distinct entities in first-seen order, compared case-insensitively.
fn dedup_entities(entities: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    entities
        .iter()
        .filter(|e| !e.trim().is_empty() && seen.insert(entity_key(e)))
        .cloned()
        .collect()
}

/// Keep only the model's picks that match a candidate, returned in the
/// candidate's own spelling.
fn filter_entities(candidates: &[String], picked: &[String]) -> Vec<String> {
    let mut kept = Vec::new();
    let mut seen = HashSet::new();
    for pick in picked {
        let key = entity_key(pick);
        if !seen.insert(key.clone()) {
            continue;
        }
        match candidates.iter().find(|c| entity_key(c) == key) {
            Some(original) => kept.push(original.clone()),
            None => debug!(entity = %pick, "dropping entity not in extracted list"),
        }
    }
    kept
}

fn normalize_keywords(keywords: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty() && seen.insert(k.clone()))
        .take(MAX_KEYWORDS)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use billscope_shared::{BillscopeError, TextStats};
    use serde_json::json;

    /// Scripted model that records every prompt.
    pub(crate) struct MockLlm {
        pub prompts: Mutex<Vec<String>>,
        pub issues: Value,
        pub entities: Value,
        pub keywords: Value,
        pub fail: bool,
    }

    impl Default for MockLlm {
        fn default() -> Self {
            Self {
                prompts: Mutex::new(Vec::new()),
                issues: json!({"issues": ["Unclear scope"]}),
                entities: json!({"entities": []}),
                keywords: json!({"keywords": ["water"]}),
                fail: false,
            }
        }
    }

    impl MockLlm {
        pub fn recorded(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }

        fn record(&self, prompt: &str) -> Result<()> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            if self.fail {
                return Err(BillscopeError::Enrichment("model unavailable".into()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl LanguageModel for MockLlm {
        fn model_id(&self) -> &str {
            "mock-model"
        }

        async fn chat(&self, prompt: &str) -> Result<String> {
            self.record(prompt)?;
            Ok(format!("reply #{}", self.prompts.lock().unwrap().len()))
        }

        async fn json(&self, prompt: &str) -> Result<Value> {
            self.record(prompt)?;
            Ok(if prompt.contains(r#"{"entities""#) {
                self.entities.clone()
            } else if prompt.contains(r#"{"keywords""#) {
                self.keywords.clone()
            } else {
                self.issues.clone()
            })
        }
    }

    #[derive(Default)]
    pub(crate) struct RecordingSleeper {
        pub calls: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.calls.lock().unwrap().push(duration);
        }
    }

    fn section(markdown: &str, money: &[&str]) -> BillSection {
        BillSection {
            enum_: Some("1.".into()),
            header: Some("Header".into()),
            markdown: markdown.into(),
            stats: TextStats {
                money_sentences: money.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn bill(sections: Vec<BillSection>, money: &[&str], entities: &[&str]) -> Bill {
        Bill {
            title: "Clean Water Infrastructure Act".into(),
            package_id: Some("BILLS-118hr1234ih".into()),
            markdown: "The bill text.".into(),
            num_sections: sections.len(),
            sections,
            stats: TextStats {
                money_sentences: money.iter().map(|s| s.to_string()).collect(),
                entities: entities.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn enricher(llm: Arc<MockLlm>, sleeper: Arc<RecordingSleeper>) -> Enricher {
        let config = EnrichmentConfig {
            prompt_token_limit: 1000,
            token_multiplier: 1.5,
            section_delay: Duration::from_millis(250),
        };
        Enricher::new(llm, config).with_sleeper(sleeper)
    }

    fn package() -> PackageSummary {
        serde_json::from_str("{}").unwrap()
    }

    #[tokio::test]
    async fn blank_sections_get_placeholder_without_calls() {
        let llm = Arc::new(MockLlm::default());
        let sleeper = Arc::new(RecordingSleeper::default());
        let e = enricher(llm.clone(), sleeper.clone());

        let mut sections = vec![section("  \n ", &[]), section("Real text.", &[])];
        e.enrich_sections(&mut sections).await.unwrap();

        assert_eq!(sections[0].summary.as_deref(), Some(NO_SUMMARY));
        assert!(sections[0].issues.is_empty());
        assert_eq!(sections[1].summary.as_deref(), Some("reply #1"));
        assert_eq!(sections[1].issues, vec!["Unclear scope".to_string()]);
        assert_eq!(llm.recorded().len(), 2);
        assert_eq!(*sleeper.calls.lock().unwrap(), vec![Duration::from_millis(250)]);
    }

    #[tokio::test]
    async fn no_money_sentences_means_no_money_commentary() {
        let llm = Arc::new(MockLlm::default());
        let e = enricher(llm.clone(), Arc::default());
        let mut b = bill(vec![section("Text.", &[])], &[], &[]);

        e.enrich(&mut b, &package()).await.unwrap();

        assert_eq!(b.money_commentary, None);
        assert!(!llm.recorded().iter().any(|p| p.contains("how money is used")));
        assert_eq!(b.llm_model_id.as_deref(), Some("mock-model"));
        assert!(b.summary.is_some() && b.commentary.is_some() && b.eli5.is_some());
    }

    #[tokio::test]
    async fn money_sentences_produce_money_commentary() {
        let llm = Arc::new(MockLlm::default());
        let e = enricher(llm.clone(), Arc::default());
        let money = ["There is authorized $5,000,000 for the program."];
        let mut b = bill(vec![section("Text.", &money)], &money, &[]);

        e.enrich(&mut b, &package()).await.unwrap();

        assert!(b.money_commentary.is_some());
        let prompts = llm.recorded();
        let money_prompt = prompts.iter().find(|p| p.contains("how money is used")).unwrap();
        assert!(money_prompt.contains("$5,000,000"));
    }

    #[tokio::test]
    async fn stages_run_in_dependency_order() {
        let llm = Arc::new(MockLlm::default());
        let e = enricher(llm.clone(), Arc::default());
        let money = ["$1 dollar"];
        let mut b = bill(vec![section("Text.", &money)], &money, &[]);

        e.enrich(&mut b, &package()).await.unwrap();

        let markers = [
            "summarizing one section",
            "reviewing one section",
            "summarizing a bill",
            "Rank the issues",
            "editorial commentary",
            "how money is used",
            "explain-like-I'm-five",
            "# ENTITIES",
            "tagging a bill",
        ];
        let prompts = llm.recorded();
        assert_eq!(prompts.len(), markers.len());
        for (prompt, marker) in prompts.iter().zip(markers) {
            assert!(prompt.contains(marker), "expected {marker:?} in prompt");
        }

        // ELI5 sees the money commentary produced just before it.
        assert!(prompts[6].contains("reply #6"));
    }

    #[tokio::test]
    async fn entities_are_filtered_to_extracted_set() {
        let llm = Arc::new(MockLlm {
            entities: json!({"entities": [" congress ", "Made Up Agency", "Congress", 42]}),
            ..Default::default()
        });
        let e = enricher(llm.clone(), Arc::default());
        let mut b = bill(
            vec![section("Text.", &[])],
            &[],
            &["Congress", "Environmental Protection Agency", "congress"],
        );

        e.enrich(&mut b, &package()).await.unwrap();
        assert_eq!(b.stats.entities, vec!["Congress".to_string()]);

        let entity_prompt = llm.recorded().into_iter().find(|p| p.contains("# ENTITIES")).unwrap();
        let start = entity_prompt.find("# ENTITIES").unwrap();
        let end = entity_prompt.find("# METADATA").unwrap();
        let candidates = &entity_prompt[start..end];
        assert!(candidates.contains("\"Congress\""));
        assert!(candidates.contains("\"Environmental Protection Agency\""));
        assert!(!candidates.contains("\"congress\""));
    }

    #[test]
    fn candidate_entities_dedup_case_insensitively() {
        let raw: Vec<String> = ["Congress", "Environmental Protection Agency", "congress", "  "]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(
            dedup_entities(&raw),
            vec!["Congress".to_string(), "Environmental Protection Agency".to_string()]
        );
    }

    #[tokio::test]
    async fn keywords_are_normalized_and_capped() {
        let many: Vec<String> = (0..15).map(|i| format!(" Keyword{i} ")).collect();
        let llm = Arc::new(MockLlm {
            keywords: json!({"keywords": ["Clean Water", "clean water ", "", many]}),
            ..Default::default()
        });
        // Nested array is not a string and is skipped.
        let e = enricher(llm, Arc::default());
        let mut b = bill(vec![], &[], &[]);
        e.enrich(&mut b, &package()).await.unwrap();
        assert_eq!(b.keywords, vec!["clean water".to_string()]);

        assert_eq!(
            normalize_keywords(&many).len(),
            MAX_KEYWORDS,
        );
        assert_eq!(normalize_keywords(&many)[0], "keyword0");
    }

    #[tokio::test]
    async fn malformed_replies_degrade_to_empty_lists() {
        let llm = Arc::new(MockLlm {
            issues: json!({"unexpected": true}),
            entities: json!({"entities": "not a list"}),
            keywords: json!({}),
            ..Default::default()
        });
        let e = enricher(llm, Arc::default());
        let mut b = bill(vec![section("Text.", &[])], &[], &["Congress"]);

        e.enrich(&mut b, &package()).await.unwrap();
        assert!(b.issues.is_empty());
        assert!(b.sections[0].issues.is_empty());
        assert!(b.stats.entities.is_empty());
        assert!(b.keywords.is_empty());
    }

    #[tokio::test]
    async fn model_failure_propagates() {
        let llm = Arc::new(MockLlm {
            fail: true,
            ..Default::default()
        });
        let e = enricher(llm, Arc::default());
        let mut b = bill(vec![section("Text.", &[])], &[], &[]);
        assert!(e.enrich(&mut b, &package()).await.is_err());
    }

    #[test]
    fn oversized_bills_use_section_digests() {
        let e = enricher(Arc::new(MockLlm::default()), Arc::default());
        let mut b = bill(vec![], &[], &[]);
        assert_eq!(e.strategy_for(&b), PromptStrategy::FullText);

        // 700 words * 1.5 = 1050 > 1000
        b.markdown = "word ".repeat(700);
        assert_eq!(e.strategy_for(&b), PromptStrategy::SectionDigest);
    }

    #[test]
    fn token_estimate() {
        assert_eq!(estimate_tokens("one two  three\nfour", 1.5), 6.0);
        assert_eq!(estimate_tokens("", 1.5), 0.0);
    }
}
