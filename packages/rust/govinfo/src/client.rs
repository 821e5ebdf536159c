//! GovInfo API client with 503 backoff and a raw-response cache.
//!
//! GovInfo renders package artifacts on demand and answers `503` with a
//! `Retry-After` header while it works. Those responses are retried up to
//! `max_retries` attempts; any other failure status is returned immediately.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, RETRY_AFTER};
use reqwest::{Client, RequestBuilder, StatusCode};
use tracing::{debug, error, info, instrument};
use url::Url;

use billscope_shared::{BillscopeError, GovInfoConfig, Result};

use crate::cache::{ResponseCache, cache_key};
use crate::sleep::{Sleeper, TokioSleeper};
use crate::types::{CollectionSummary, PackageSummary, SearchRequest, SearchResponse, SearchResult};

/// User-Agent string for API requests.
const USER_AGENT: &str = concat!("billscope/", env!("CARGO_PKG_VERSION"));

/// Header carrying the API key on search and collection requests.
const API_KEY_HEADER: &str = "X-Api-Key";

enum Method {
    Get,
    Post(Vec<u8>),
}

// ---------------------------------------------------------------------------
// GovInfoClient
// ---------------------------------------------------------------------------

/// Authenticated client for `api.govinfo.gov`.
pub struct GovInfoClient {
    http: Client,
    base_url: String,
    api_key: String,
    max_retries: u32,
    default_retry_after: Duration,
    cache: Option<ResponseCache>,
    sleeper: Arc<dyn Sleeper>,
}

impl GovInfoClient {
    /// Build a client from config. No cache is attached until [`with_cache`](Self::with_cache).
    pub fn new(config: &GovInfoConfig, api_key: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BillscopeError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            max_retries: config.max_retries.max(1),
            default_retry_after: Duration::from_secs(config.default_retry_after_secs),
            cache: None,
            sleeper: Arc::new(TokioSleeper),
        })
    }

    pub fn with_cache(mut self, cache: ResponseCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -----------------------------------------------------------------------
    // Endpoints
    // -----------------------------------------------------------------------

    /// `POST /search` for one page.
    #[instrument(skip_all, fields(query = %request.query, offset_mark = %request.offset_mark))]
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let url = format!("{}/search", self.base_url);
        let body = serde_json::to_vec(request)
            .map_err(|e| BillscopeError::parse(format!("failed to encode search request: {e}")))?;

        let bytes = self.fetch(&url, &url, Method::Post(body)).await?;
        let response: SearchResponse = parse_json(&url, &bytes)?;

        info!(
            count = response.count,
            results = response.results.len(),
            "search page fetched"
        );
        Ok(response)
    }

    /// `GET /collections`.
    pub async fn collections(&self) -> Result<CollectionSummary> {
        let url = format!("{}/collections", self.base_url);
        let bytes = self.fetch(&url, &url, Method::Get).await?;
        parse_json(&url, &bytes)
    }

    /// Fetch a link returned by the API (summary, XML, ...), authenticating
    /// with an `api_key` query parameter.
    pub async fn get_result_link(&self, link: &str) -> Result<Vec<u8>> {
        let mut url = Url::parse(link)
            .map_err(|e| BillscopeError::validation(format!("invalid result link {link}: {e}")))?;
        url.query_pairs_mut().append_pair("api_key", &self.api_key);
        self.fetch(url.as_str(), link, Method::Get).await
    }

    /// Package summary JSON behind a search result.
    pub async fn package_summary(&self, result: &SearchResult) -> Result<PackageSummary> {
        let bytes = self.get_result_link(&result.result_link).await?;
        parse_json(&result.result_link, &bytes)
    }

    /// Bill XML behind a search result.
    pub async fn package_xml(&self, result: &SearchResult) -> Result<String> {
        let link = result.xml_link().ok_or_else(|| {
            BillscopeError::validation(format!("{} has no xmlLink", result.package_id))
        })?;
        let bytes = self.get_result_link(link).await?;
        String::from_utf8(bytes)
            .map_err(|e| BillscopeError::parse(format!("{link} is not UTF-8: {e}")))
    }

    // -----------------------------------------------------------------------
    // Transport
    // -----------------------------------------------------------------------

    /// Cache-first fetch. `display_url` is the key-free URL used for cache
    /// keys, logs and errors.
    async fn fetch(&self, url: &str, display_url: &str, method: Method) -> Result<Vec<u8>> {
        let key = match &method {
            Method::Get => cache_key(&[display_url.as_bytes()]),
            Method::Post(body) => cache_key(&[display_url.as_bytes(), body]),
        };

        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(&key)? {
                debug!(url = %display_url, "using cached response");
                return Ok(hit);
            }
        }

        let body = self.send_with_retry(url, display_url, &method).await?;

        if let Some(cache) = &self.cache {
            cache.put(&key, &body)?;
        }
        Ok(body)
    }

    async fn send_with_retry(&self, url: &str, display_url: &str, method: &Method) -> Result<Vec<u8>> {
        for attempt in 1..=self.max_retries {
            debug!(url = %display_url, attempt, "sending request");
            let response = self
                .build(url, method)
                .send()
                .await
                .map_err(|e| BillscopeError::Network(format!("{display_url}: {e}")))?;

            let status = response.status();
            if status == StatusCode::SERVICE_UNAVAILABLE {
                if attempt == self.max_retries {
                    break;
                }
                let delay = retry_after(response.headers()).unwrap_or(self.default_retry_after);
                info!(
                    url = %display_url,
                    attempt,
                    delay_secs = delay.as_secs(),
                    "content is being generated, waiting to retry"
                );
                self.sleeper.sleep(delay).await;
                continue;
            }

            if !status.is_success() {
                error!(url = %display_url, status = status.as_u16(), "request failed");
                return Err(BillscopeError::Http {
                    url: display_url.to_string(),
                    status: status.as_u16(),
                });
            }

            let bytes = response.bytes().await.map_err(|e| {
                BillscopeError::Network(format!("{display_url}: body read failed: {e}"))
            })?;
            return Ok(bytes.to_vec());
        }

        error!(url = %display_url, attempts = self.max_retries, "retries exhausted");
        Err(BillscopeError::RetriesExhausted {
            url: display_url.to_string(),
            attempts: self.max_retries,
        })
    }

    fn build(&self, url: &str, method: &Method) -> RequestBuilder {
        match method {
            Method::Get => self.http.get(url).header(API_KEY_HEADER, &self.api_key),
            Method::Post(body) => self
                .http
                .post(url)
                .header(API_KEY_HEADER, &self.api_key)
                .header(CONTENT_TYPE, "application/json")
                .body(body.clone()),
        }
    }
}

/// `Retry-After` in whole seconds, if present and numeric.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

fn parse_json<T: serde::de::DeserializeOwned>(url: &str, bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes)
        .map_err(|e| BillscopeError::parse(format!("invalid JSON from {url}: {e}")))
}
