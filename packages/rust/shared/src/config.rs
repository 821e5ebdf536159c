//! Application configuration for billscope.
//!
//! User config lives at `~/.billscope/billscope.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BillscopeError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "billscope.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".billscope";

// ---------------------------------------------------------------------------
// Config structs (matching billscope.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Ingestion loop settings.
    #[serde(default)]
    pub ingest: IngestConfig,

    /// GovInfo API settings.
    #[serde(default)]
    pub govinfo: GovInfoConfig,

    /// LLM provider settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Local cache locations.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Document transformer settings.
    #[serde(default)]
    pub transform: TransformConfig,
}

/// `[ingest]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Search page size.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Pause after each processed document.
    #[serde(default = "default_delay_ms")]
    pub document_delay_ms: u64,

    /// Pause after each enriched section (request-rate throttle).
    #[serde(default = "default_delay_ms")]
    pub section_delay_ms: u64,

    /// Directory the JSON sink writes finished bills into.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            document_delay_ms: default_delay_ms(),
            section_delay_ms: default_delay_ms(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_page_size() -> u32 {
    100
}
fn default_delay_ms() -> u64 {
    1000
}
fn default_output_dir() -> String {
    "~/billscope-bills".into()
}

/// `[govinfo]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovInfoConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_govinfo_key_env")]
    pub api_key_env: String,

    /// API root.
    #[serde(default = "default_govinfo_base_url")]
    pub base_url: String,

    /// Attempts per request while the service answers 503.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Pause used when a 503 carries no usable `Retry-After`.
    #[serde(default = "default_retry_after_secs")]
    pub default_retry_after_secs: u64,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GovInfoConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_govinfo_key_env(),
            base_url: default_govinfo_base_url(),
            max_retries: default_max_retries(),
            default_retry_after_secs: default_retry_after_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_govinfo_key_env() -> String {
    "GOVINFO_API_KEY".into()
}
fn default_govinfo_base_url() -> String {
    "https://api.govinfo.gov".into()
}
fn default_max_retries() -> u32 {
    3
}
fn default_retry_after_secs() -> u64 {
    30
}
fn default_timeout_secs() -> u64 {
    60
}

/// `[llm]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Name of the env var holding the API key.
    #[serde(default = "default_llm_key_env")]
    pub api_key_env: String,

    /// OpenAI-compatible API root.
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    /// Default model to use for enrichment.
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Estimated-token ceiling above which stages switch to section digests.
    #[serde(default = "default_prompt_token_limit")]
    pub prompt_token_limit: usize,

    /// Tokens assumed per whitespace-separated word.
    #[serde(default = "default_token_multiplier")]
    pub token_multiplier: f64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_llm_key_env(),
            base_url: default_llm_base_url(),
            default_model: default_model(),
            prompt_token_limit: default_prompt_token_limit(),
            token_multiplier: default_token_multiplier(),
        }
    }
}

fn default_llm_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o".into()
}
fn default_prompt_token_limit() -> usize {
    128_000
}
fn default_token_multiplier() -> f64 {
    1.5
}

/// `[cache]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache root; raw responses go to `govinfo/`, parsed bills to `bills/`.
    #[serde(default = "default_cache_root")]
    pub root: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root: default_cache_root(),
        }
    }
}

fn default_cache_root() -> String {
    "~/.cache/billscope".into()
}

impl CacheConfig {
    pub fn root_dir(&self) -> PathBuf {
        expand_home(&self.root)
    }

    /// Directory for gzip'd raw API responses.
    pub fn response_dir(&self) -> PathBuf {
        expand_home(&self.root).join("govinfo")
    }

    /// Directory for gzip'd parsed bills.
    pub fn bill_dir(&self) -> PathBuf {
        expand_home(&self.root).join("bills")
    }
}

/// `[transform]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransformConfig {
    /// Stylesheet override; the embedded default is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stylesheet: Option<String>,
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.billscope/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| BillscopeError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.billscope/billscope.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| BillscopeError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        BillscopeError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| BillscopeError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| BillscopeError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| BillscopeError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the API key from the named env var, failing if unset or empty.
pub fn validate_api_key(var_name: &str) -> Result<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(BillscopeError::config(format!(
            "API key not found. Set the {var_name} environment variable."
        ))),
    }
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}
