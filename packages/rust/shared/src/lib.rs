//! Shared types, error model, and configuration for billscope.
//!
//! This crate is the foundation depended on by all other billscope crates.
//! It provides:
//! - [`BillscopeError`]: the unified error type
//! - Domain types ([`Bill`], [`BillSection`], [`TextStats`])
//! - Configuration ([`AppConfig`], config loading)
//! - Slugs and GovInfo bill version codes

pub mod config;
pub mod error;
pub mod slug;
pub mod types;
pub mod versions;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CacheConfig, GovInfoConfig, IngestConfig, LlmConfig, TransformConfig, config_dir,
    config_file_path, expand_home, init_config, load_config, load_config_from, validate_api_key,
};
pub use error::{BillscopeError, Result};
pub use slug::{DEFAULT_SLUG_CHARS, slug};
pub use types::{Bill, BillSection, NO_SUMMARY, TextStats};
pub use versions::{BILL_VERSION_CODES, bill_version_label};
