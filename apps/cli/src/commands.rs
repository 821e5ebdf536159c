//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use billscope_core::{
    BillAssembler, CorpusStats, DocumentOutcome, EnrichmentConfig, Enricher, IngestProgress,
    IngestReport, Ingestor, JsonDirSink, LanguageModel, OpenAiCompatibleClient, date_range,
    recompute_percentiles,
};
use billscope_govinfo::{BillCache, GovInfoClient, ResponseCache};
use billscope_markdown::{Stylesheet, Transformer};
use billscope_nlp::Analyzer;
use billscope_shared::{
    AppConfig, BILL_VERSION_CODES, DEFAULT_SLUG_CHARS, expand_home, init_config, load_config,
    slug, validate_api_key,
};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// billscope: enriched, searchable U.S. congressional bills.
#[derive(Parser)]
#[command(
    name = "billscope",
    version,
    about = "Ingest congressional bills from GovInfo and enrich them with linguistic statistics and LLM analysis.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Fetch, parse and enrich bills for a day or a range of days.
    ///
    /// Search pages are served from the response cache once fetched, so
    /// re-running a day that GovInfo is still publishing can miss bills added
    /// since. Run `billscope cache clear` first to search again.
    Ingest {
        /// Single day to ingest (YYYY-MM-DD). Defaults to today.
        #[arg(long, conflicts_with_all = ["start_date", "end_date"])]
        date: Option<NaiveDate>,

        /// First day of a range (YYYY-MM-DD).
        #[arg(long)]
        start_date: Option<NaiveDate>,

        /// Last day of a range (YYYY-MM-DD). Defaults to today.
        #[arg(long, requires = "start_date")]
        end_date: Option<NaiveDate>,

        /// Model id for enrichment (defaults to `llm.default_model`).
        #[arg(long)]
        model: Option<String>,

        /// Output directory for bill JSON (defaults to `ingest.output_dir`).
        #[arg(short, long)]
        out: Option<String>,
    },

    /// Recompute corpus percentiles for every cached bill.
    Percentiles,

    /// Print corpus statistics for every cached bill.
    Stats {
        /// Emit JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Print the slug for a bill.
    Slug {
        /// Legislation number, e.g. "H. R. 1234".
        legis_num: String,
        /// Bill title.
        title: String,
        /// Bill version code, e.g. "ih".
        #[arg(value_name = "VERSION")]
        bill_version: String,
        /// Title characters kept.
        #[arg(long, default_value_t = DEFAULT_SLUG_CHARS)]
        max_chars: usize,
    },

    /// List GovInfo bill version codes.
    Versions,

    /// List GovInfo collections.
    Collections,

    /// Cache management.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Cache subcommands.
#[derive(Subcommand)]
pub(crate) enum CacheAction {
    /// Delete cached API responses (and bills with --bills).
    Clear {
        /// Also delete processed bills.
        #[arg(long)]
        bills: bool,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "billscope=info",
        1 => "billscope=debug",
        _ => "billscope=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Ingest {
            date,
            start_date,
            end_date,
            model,
            out,
        } => {
            let dates = resolve_dates(date, start_date, end_date, Local::now().date_naive())?;
            cmd_ingest(&dates, model, out).await
        }
        Command::Percentiles => cmd_percentiles(),
        Command::Stats { json } => cmd_stats(json),
        Command::Slug {
            legis_num,
            title,
            bill_version,
            max_chars,
        } => {
            println!("{}", slug(&legis_num, &title, &bill_version, max_chars));
            Ok(())
        }
        Command::Versions => {
            for (code, label) in BILL_VERSION_CODES {
                println!("{code:<6} {label}");
            }
            Ok(())
        }
        Command::Collections => cmd_collections().await,
        Command::Cache { action } => match action {
            CacheAction::Clear { bills } => cmd_cache_clear(bills),
        },
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

/// Days to ingest: `--date`, `--start-date..=--end-date` (end defaults to
/// today), or just today.
fn resolve_dates(
    date: Option<NaiveDate>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<Vec<NaiveDate>> {
    let dates = match (date, start) {
        (Some(d), _) => vec![d],
        (None, Some(s)) => date_range(s, end.unwrap_or(today))?,
        (None, None) => vec![today],
    };
    Ok(dates)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn cmd_ingest(dates: &[NaiveDate], model: Option<String>, out: Option<String>) -> Result<()> {
    let config = load_config()?;
    let govinfo_key = validate_api_key(&config.govinfo.api_key_env)?;
    let llm_key = validate_api_key(&config.llm.api_key_env)?;

    let stylesheet_path = config.transform.stylesheet.as_deref().map(expand_home);
    let stylesheet = Stylesheet::load(stylesheet_path.as_deref())?;
    let transformer = Transformer::new(Arc::new(stylesheet));
    let assembler = BillAssembler::new(transformer, Arc::new(Analyzer::new()));

    let client = GovInfoClient::new(&config.govinfo, govinfo_key)?
        .with_cache(ResponseCache::open(config.cache.response_dir())?);
    let bill_cache = BillCache::open(config.cache.bill_dir())?;

    let model = model.unwrap_or_else(|| config.llm.default_model.clone());
    let llm: Arc<dyn LanguageModel> =
        Arc::new(OpenAiCompatibleClient::new(&config.llm, llm_key, model)?);
    let enricher = Enricher::new(
        llm,
        EnrichmentConfig::from_config(&config.llm, &config.ingest),
    );
    let model_id = enricher.model_id().to_string();

    let out_dir = out
        .map(PathBuf::from)
        .unwrap_or_else(|| expand_home(&config.ingest.output_dir));
    let sink = Arc::new(JsonDirSink::new(&out_dir)?);

    let ingestor = Ingestor::new(client, bill_cache, assembler, enricher, sink)
        .with_page_size(config.ingest.page_size)
        .with_document_delay(Duration::from_millis(config.ingest.document_delay_ms));

    info!(
        days = dates.len(),
        first = %dates.first().map(|d| d.to_string()).unwrap_or_default(),
        last = %dates.last().map(|d| d.to_string()).unwrap_or_default(),
        model = %model_id,
        out = %out_dir.display(),
        "starting ingestion"
    );

    let progress = CliProgress::new()?;
    let report = ingestor.ingest_dates(dates, &progress).await;
    progress.finish();

    print_report(&report);
    if report.processed == 0 && report.cached == 0 && !report.failed.is_empty() {
        return Err(eyre!("every bill failed to process"));
    }
    Ok(())
}

fn print_report(report: &IngestReport) {
    println!();
    println!("  Ingestion finished");
    println!("  Days:      {}", report.dates);
    println!("  Pages:     {}", report.pages);
    println!("  Processed: {}", report.processed);
    println!("  Cached:    {}", report.cached);
    println!("  Failed:    {}", report.failed.len());
    for failed in &report.failed {
        println!("    {}  {}", failed.package_id, failed.error);
    }
    for failed in &report.failed_dates {
        println!("  Search failed for {}: {}", failed.date, failed.error);
    }
    println!("  Time:      {:.1}s", report.elapsed.as_secs_f64());
    println!();
}

fn cmd_percentiles() -> Result<()> {
    let config = load_config()?;
    let bills = BillCache::open(config.cache.bill_dir())?.load_all()?;
    let table = recompute_percentiles(&bills);

    let root = config.cache.root_dir();
    std::fs::create_dir_all(&root)?;
    let path = root.join("percentiles.json");
    std::fs::write(&path, serde_json::to_string_pretty(&table)?)?;

    println!("Percentiles for {} bills written to {}", table.len(), path.display());
    Ok(())
}

fn cmd_stats(json: bool) -> Result<()> {
    let config = load_config()?;
    let bills = BillCache::open(config.cache.bill_dir())?.load_all()?;
    let stats = CorpusStats::from_bills(&bills);

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("  Bills:     {}", stats.num_bills);
    println!("  Sections:  {}", stats.num_sections);
    println!("  Tokens:    {}", stats.num_tokens);
    println!("  Sentences: {}", stats.num_sentences);
    for (title, counts) in [
        ("Type", &stats.by_bill_type),
        ("Chamber", &stats.by_chamber),
        ("Version", &stats.by_version),
    ] {
        println!();
        println!("  By {}:", title.to_lowercase());
        for (key, count) in counts {
            let key = if key.is_empty() { "(none)" } else { key };
            println!("    {key:<24} {count}");
        }
    }
    println!();
    println!(
        "  {:<20} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "metric", "min", "p25", "p50", "p75", "max", "mean"
    );
    for (metric, d) in &stats.metrics {
        println!(
            "  {:<20} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>10.2}",
            metric.as_str(),
            d.min,
            d.p25,
            d.p50,
            d.p75,
            d.max,
            d.mean
        );
    }
    Ok(())
}

async fn cmd_collections() -> Result<()> {
    let config = load_config()?;
    let key = validate_api_key(&config.govinfo.api_key_env)?;
    let client = GovInfoClient::new(&config.govinfo, key)?;

    let summary = client.collections().await?;
    for c in &summary.collections {
        println!(
            "{:<12} {:>10} {}",
            c.collection_code,
            c.package_count.map(|n| n.to_string()).unwrap_or_default(),
            c.collection_name
        );
    }
    Ok(())
}

fn cmd_cache_clear(bills: bool) -> Result<()> {
    let config = load_config()?;
    let removed = ResponseCache::open(config.cache.response_dir())?.clear()?;
    println!("Removed {removed} cached responses");
    if bills {
        let removed = BillCache::open(config.cache.bill_dir())?.clear()?;
        println!("Removed {removed} cached bills");
    }
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Result<Self> {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")?
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(Duration::from_millis(80));
        Ok(Self { spinner })
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl IngestProgress for CliProgress {
    fn date_started(&self, date: NaiveDate) {
        self.spinner.set_message(format!("Searching bills for {date}"));
    }

    fn page_fetched(&self, date: NaiveDate, page: usize, results: usize, total: u64) {
        self.spinner
            .set_message(format!("{date}: page {page} ({results} of {total} results)"));
    }

    fn document_done(&self, package_id: &str, outcome: &DocumentOutcome) {
        let status = match outcome {
            DocumentOutcome::Processed => "processed",
            DocumentOutcome::Cached => "cached",
            DocumentOutcome::Failed(_) => "failed",
        };
        self.spinner.set_message(format!("{package_id}: {status}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn ingest_help_points_to_cache_clear() {
        let mut cmd = Cli::command();
        let ingest = cmd.find_subcommand_mut("ingest").unwrap();
        let help = ingest.render_long_help().to_string();
        assert!(help.contains("billscope cache clear"));
    }

    #[test]
    fn dates_default_to_today() {
        let today = d("2024-03-15");
        assert_eq!(resolve_dates(None, None, None, today).unwrap(), vec![today]);
    }

    #[test]
    fn open_range_runs_through_today() {
        let dates = resolve_dates(None, Some(d("2024-03-13")), None, d("2024-03-15")).unwrap();
        assert_eq!(dates, vec![d("2024-03-13"), d("2024-03-14"), d("2024-03-15")]);
    }

    #[test]
    fn reversed_range_is_rejected() {
        let today = d("2024-04-01");
        let result = resolve_dates(None, Some(d("2024-03-15")), Some(d("2024-03-01")), today);
        assert!(result.is_err());
    }

    #[test]
    fn parses_ingest_flags() {
        let cli = Cli::try_parse_from([
            "billscope",
            "ingest",
            "--start-date",
            "2024-03-01",
            "--end-date",
            "2024-03-02",
            "--model",
            "gpt-4o-mini",
        ])
        .unwrap();
        match cli.command {
            Command::Ingest {
                start_date, model, ..
            } => {
                assert_eq!(start_date, Some(d("2024-03-01")));
                assert_eq!(model.as_deref(), Some("gpt-4o-mini"));
            }
            _ => panic!("expected ingest"),
        }
        assert!(Cli::try_parse_from(["billscope", "ingest", "--end-date", "2024-03-02"]).is_err());
        let conflicting = Cli::try_parse_from([
            "billscope",
            "ingest",
            "--date",
            "2024-03-02",
            "--start-date",
            "2024-03-01",
        ]);
        assert!(conflicting.is_err());
    }
}
