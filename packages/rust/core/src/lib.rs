//! Core pipeline orchestration and domain logic for billscope.
//!
//! This crate ties together the GovInfo client, the document transformer,
//! the linguistic analyzer and the LLM enrichment chain into the ingestion
//! pipeline, and computes corpus-wide statistics over the results.

pub mod assembler;
pub mod enrichment;
pub mod llm;
pub mod pipeline;
pub mod population;
pub mod prompts;
pub mod sink;

pub use assembler::BillAssembler;
pub use enrichment::{EnrichmentConfig, Enricher, MAX_KEYWORDS, estimate_tokens};
pub use llm::{LanguageModel, OpenAiCompatibleClient};
pub use pipeline::{
    DocumentOutcome, FailedDate, FailedDocument, FetchedBill, IngestProgress, IngestReport,
    Ingestor, SilentProgress, date_range,
};
pub use population::{
    BillMetric, CorpusStats, Distribution, PercentileTable, bill_ari, percentile,
    percentile_rank, recompute_percentiles,
};
pub use prompts::{Prompt, PromptStrategy};
pub use sink::{BillSink, JsonDirSink};
