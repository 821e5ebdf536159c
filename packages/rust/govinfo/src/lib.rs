//! Client and caches for the GovInfo (`api.govinfo.gov`) bill collection.

mod cache;
mod client;
mod sleep;
mod types;

pub use cache::{BillCache, ResponseCache, cache_key};
pub use client::GovInfoClient;
pub use sleep::{Sleeper, TokioSleeper};
pub use types::{
    CollectionItem, CollectionSummary, PackageSummary, SearchRequest, SearchResponse,
    SearchResult, SearchSort, ShortTitle, bills_for_date_query,
};
