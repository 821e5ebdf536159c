//! Corpus-wide distributions and percentile ranks.
//!
//! Recomputation is always a full batch over the supplied bills; nothing is
//! updated incrementally.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use billscope_nlp::ari_raw;
use billscope_shared::{Bill, BillscopeError};

// ---------------------------------------------------------------------------
// Order statistics
// ---------------------------------------------------------------------------

/// Continuous percentile of an ascending slice: position `q * (n - 1)` with
/// linear interpolation between neighbours. `None` when empty.
pub fn percentile(sorted: &[f64], q: f64) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Share of `population` strictly below `value`, as 0..=100.
pub fn percentile_rank(population: &[f64], value: f64) -> f64 {
    if population.is_empty() {
        return 0.0;
    }
    let below = population.iter().filter(|v| **v < value).count();
    below as f64 / population.len() as f64 * 100.0
}

/// Same as [`percentile_rank`] over an ascending slice, in `O(log n)`.
fn sorted_rank(sorted: &[f64], value: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    sorted.partition_point(|v| *v < value) as f64 / sorted.len() as f64 * 100.0
}

fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Summary of one attribute across the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
}

impl Distribution {
    /// `None` when there are no finite values.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let sorted = sorted_copy(values);
        let first = *sorted.first()?;
        let last = *sorted.last()?;
        let mean = sorted.iter().sum::<f64>() / sorted.len() as f64;
        Some(Self {
            min: first,
            max: last,
            mean,
            p25: percentile(&sorted, 0.25)?,
            p50: percentile(&sorted, 0.50)?,
            p75: percentile(&sorted, 0.75)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Bill metrics
// ---------------------------------------------------------------------------

/// Bill attributes that get a stored percentile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillMetric {
    NumPages,
    NumSections,
    NumTokens,
    NumSentences,
    AvgTokenLength,
    AvgSentenceLength,
    TokenEntropy,
    AriRaw,
}

impl BillMetric {
    pub const ALL: [BillMetric; 8] = [
        Self::NumPages,
        Self::NumSections,
        Self::NumTokens,
        Self::NumSentences,
        Self::AvgTokenLength,
        Self::AvgSentenceLength,
        Self::TokenEntropy,
        Self::AriRaw,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NumPages => "num_pages",
            Self::NumSections => "num_sections",
            Self::NumTokens => "num_tokens",
            Self::NumSentences => "num_sentences",
            Self::AvgTokenLength => "avg_token_length",
            Self::AvgSentenceLength => "avg_sentence_length",
            Self::TokenEntropy => "token_entropy",
            Self::AriRaw => "ari_raw",
        }
    }

    /// The metric's value for `bill`. Only `num_pages` can be missing.
    pub fn value(&self, bill: &Bill) -> Option<f64> {
        let s = &bill.stats;
        Some(match self {
            Self::NumPages => f64::from(bill.num_pages?),
            Self::NumSections => bill.num_sections as f64,
            Self::NumTokens => s.num_tokens as f64,
            Self::NumSentences => s.num_sentences as f64,
            Self::AvgTokenLength => s.avg_token_length,
            Self::AvgSentenceLength => s.avg_sentence_length,
            Self::TokenEntropy => s.token_entropy,
            Self::AriRaw => bill_ari(bill),
        })
    }
}

impl fmt::Display for BillMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillMetric {
    type Err = BillscopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| BillscopeError::validation(format!("unknown metric: {s}")))
    }
}

/// Raw ARI for a bill, `0.0` for documents with no tokens or sentences.
pub fn bill_ari(bill: &Bill) -> f64 {
    let s = &bill.stats;
    ari_raw(s.num_characters, s.num_tokens, s.num_sentences).unwrap_or(0.0)
}

fn bill_key(bill: &Bill) -> String {
    bill.package_id.clone().unwrap_or_else(|| bill.slug())
}

// ---------------------------------------------------------------------------
// Batch recomputation
// ---------------------------------------------------------------------------

/// Package id → metric → percentile rank.
pub type PercentileTable = BTreeMap<String, BTreeMap<BillMetric, f64>>;

/// Rank every bill against the whole population, for every metric.
#[instrument(skip_all, fields(bills = bills.len()))]
pub fn recompute_percentiles(bills: &[Bill]) -> PercentileTable {
    let mut table = PercentileTable::new();

    for metric in BillMetric::ALL {
        let values: Vec<f64> = bills.iter().filter_map(|b| metric.value(b)).collect();
        let sorted = sorted_copy(&values);
        if sorted.len() < values.len() {
            warn!(%metric, "ignoring non-finite values");
        }

        for bill in bills {
            if let Some(value) = metric.value(bill) {
                table
                    .entry(bill_key(bill))
                    .or_default()
                    .insert(metric, sorted_rank(&sorted, value));
            }
        }
    }

    info!(bills = table.len(), "percentiles recomputed");
    table
}

// ---------------------------------------------------------------------------
// CorpusStats
// ---------------------------------------------------------------------------

/// Totals and breakdowns across the corpus.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorpusStats {
    pub num_bills: usize,
    pub num_sections: usize,
    pub num_tokens: usize,
    pub num_sentences: usize,
    pub by_bill_type: BTreeMap<String, usize>,
    pub by_chamber: BTreeMap<String, usize>,
    pub by_version: BTreeMap<String, usize>,
    pub metrics: BTreeMap<BillMetric, Distribution>,
}

impl CorpusStats {
    pub fn from_bills(bills: &[Bill]) -> Self {
        let mut stats = Self {
            num_bills: bills.len(),
            ..Self::default()
        };

        for bill in bills {
            stats.num_sections += bill.num_sections;
            stats.num_tokens += bill.stats.num_tokens;
            stats.num_sentences += bill.stats.num_sentences;
            *stats.by_bill_type.entry(bill.bill_type.clone()).or_default() += 1;
            *stats.by_chamber.entry(bill.current_chamber.clone()).or_default() += 1;
            *stats.by_version.entry(bill.bill_version.clone()).or_default() += 1;
        }

        for metric in BillMetric::ALL {
            let values: Vec<f64> = bills.iter().filter_map(|b| metric.value(b)).collect();
            if let Some(dist) = Distribution::from_values(&values) {
                stats.metrics.insert(metric, dist);
            }
        }
        stats
    }
}
