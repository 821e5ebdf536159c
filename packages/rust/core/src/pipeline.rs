//! End-to-end ingestion: search → fetch → assemble → enrich → cache → sink.
//!
//! Documents are processed one at a time. A failure is logged with the
//! package id and recorded in the report; the run moves on to the next
//! document.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use billscope_govinfo::{
    BillCache, GovInfoClient, SearchRequest, SearchResult, Sleeper, TokioSleeper,
    bills_for_date_query,
};
use billscope_shared::{Bill, BillscopeError, Result};

use crate::assembler::BillAssembler;
use crate::enrichment::Enricher;
use crate::sink::BillSink;

// ---------------------------------------------------------------------------
// Report and progress
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedDocument {
    pub package_id: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedDate {
    pub date: NaiveDate,
    pub error: String,
}

/// Outcome of an ingestion run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub dates: usize,
    pub pages: usize,
    /// Fetched, assembled and enriched in this run.
    pub processed: usize,
    /// Served from the bill cache.
    pub cached: usize,
    pub failed: Vec<FailedDocument>,
    /// Days whose search itself failed.
    pub failed_dates: Vec<FailedDate>,
    #[serde(skip)]
    pub elapsed: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentOutcome {
    Processed,
    Cached,
    Failed(String),
}

/// Progress callbacks for the CLI.
pub trait IngestProgress: Send + Sync {
    fn date_started(&self, date: NaiveDate);
    fn page_fetched(&self, date: NaiveDate, page: usize, results: usize, total: u64);
    fn document_done(&self, package_id: &str, outcome: &DocumentOutcome);
}

/// No-op progress for headless/test usage.
pub struct SilentProgress;

impl IngestProgress for SilentProgress {
    fn date_started(&self, _date: NaiveDate) {}
    fn page_fetched(&self, _date: NaiveDate, _page: usize, _results: usize, _total: u64) {}
    fn document_done(&self, _package_id: &str, _outcome: &DocumentOutcome) {}
}

/// Every day from `start` through `end`, inclusive.
pub fn date_range(start: NaiveDate, end: NaiveDate) -> Result<Vec<NaiveDate>> {
    if end < start {
        return Err(BillscopeError::validation(format!(
            "end date {end} is before start date {start}"
        )));
    }
    Ok(start.iter_days().take_while(|d| *d <= end).collect())
}

// ---------------------------------------------------------------------------
// Ingestor
// ---------------------------------------------------------------------------

/// A bill and whether it came from the bill cache.
#[derive(Debug, Clone)]
pub struct FetchedBill {
    pub bill: Bill,
    pub cached: bool,
}

pub struct Ingestor {
    client: GovInfoClient,
    bill_cache: BillCache,
    assembler: BillAssembler,
    enricher: Enricher,
    sink: Arc<dyn BillSink>,
    sleeper: Arc<dyn Sleeper>,
    page_size: u32,
    document_delay: Duration,
}

impl Ingestor {
    pub fn new(
        client: GovInfoClient,
        bill_cache: BillCache,
        assembler: BillAssembler,
        enricher: Enricher,
        sink: Arc<dyn BillSink>,
    ) -> Self {
        Self {
            client,
            bill_cache,
            assembler,
            enricher,
            sink,
            sleeper: Arc::new(TokioSleeper),
            page_size: 100,
            document_delay: Duration::from_secs(1),
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_document_delay(mut self, delay: Duration) -> Self {
        self.document_delay = delay;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Ingest every bill published or ingested on each of `dates`.
    #[instrument(skip_all, fields(dates = dates.len()))]
    pub async fn ingest_dates(
        &self,
        dates: &[NaiveDate],
        progress: &dyn IngestProgress,
    ) -> IngestReport {
        let start = Instant::now();
        let mut report = IngestReport::default();

        for &date in dates {
            report.dates += 1;
            progress.date_started(date);
            if let Err(e) = self.ingest_date(date, progress, &mut report).await {
                error!(%date, error = %e, "search failed, skipping date");
                report.failed_dates.push(FailedDate {
                    date,
                    error: e.to_string(),
                });
            }
        }

        report.elapsed = start.elapsed();
        info!(
            processed = report.processed,
            cached = report.cached,
            failed = report.failed.len(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "ingestion complete"
        );
        report
    }

    /// Page through one day's search results until a page comes back empty.
    pub async fn ingest_date(
        &self,
        date: NaiveDate,
        progress: &dyn IngestProgress,
        report: &mut IngestReport,
    ) -> Result<()> {
        let query = bills_for_date_query(date);
        let mut request = SearchRequest::new(&query, self.page_size);
        let mut page = 0;

        loop {
            let response = self.client.search(&request).await?;
            if response.results.is_empty() {
                break;
            }
            page += 1;
            report.pages += 1;
            progress.page_fetched(date, page, response.results.len(), response.count);

            for result in &response.results {
                let outcome = self.process(result).await;
                match &outcome {
                    DocumentOutcome::Processed => report.processed += 1,
                    DocumentOutcome::Cached => report.cached += 1,
                    DocumentOutcome::Failed(e) => report.failed.push(FailedDocument {
                        package_id: result.package_id.clone(),
                        error: e.clone(),
                    }),
                }
                progress.document_done(&result.package_id, &outcome);
            }

            match response.offset_mark {
                Some(mark) if !mark.is_empty() && mark != request.offset_mark => {
                    request = request.with_offset_mark(mark);
                }
                _ => break,
            }
        }
        Ok(())
    }

    async fn process(&self, result: &SearchResult) -> DocumentOutcome {
        info!(package_id = %result.package_id, "processing bill");
        let fetched = match self.get_bill(result).await {
            Ok(fetched) => fetched,
            Err(e) => {
                error!(package_id = %result.package_id, error = %e, "failed to process bill");
                return DocumentOutcome::Failed(e.to_string());
            }
        };

        if let Err(e) = self.sink.store(&fetched.bill) {
            error!(package_id = %result.package_id, error = %e, "failed to store bill");
            return DocumentOutcome::Failed(e.to_string());
        }

        if fetched.cached {
            return DocumentOutcome::Cached;
        }

        info!(
            package_id = %result.package_id,
            legis_num = %fetched.bill.legis_num,
            title = %fetched.bill.title,
            "bill processed"
        );
        self.sleeper.sleep(self.document_delay).await;
        DocumentOutcome::Processed
    }

    /// The enriched bill for `result`, from the bill cache when present.
    #[instrument(skip_all, fields(package_id = %result.package_id))]
    pub async fn get_bill(&self, result: &SearchResult) -> Result<FetchedBill> {
        match self.bill_cache.get(&result.package_id) {
            Ok(Some(bill)) => return Ok(FetchedBill { bill, cached: true }),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "ignoring unreadable bill cache entry"),
        }

        let package = self.client.package_summary(result).await?;
        let xml = self.client.package_xml(result).await?;
        let mut bill = self.assembler.assemble(&result.package_id, &xml, &package)?;
        self.enricher.enrich(&mut bill, &package).await?;
        self.bill_cache.put(&bill)?;

        Ok(FetchedBill {
            bill,
            cached: false,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
