//! Shared types, error model, and configuration for Prospector.
//!
//! This crate is the foundation depended on by all other Prospector crates.
//! It provides:
//! - [`ProspectorError`] — the unified error type
//! - Domain types ([`Target`], [`FetchOutcome`], [`ScoreResult`], [`AnalysisRecord`])
//! - Configuration ([`AppConfig`], [`HarvestConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CacheConfig, DefaultsConfig, HarvestConfig, SemanticConfig, cache_db_path,
    config_dir, config_file_path, init_config, load_config, load_config_from, resolve_api_key,
};
pub use error::{ProspectorError, Result};
pub use types::{
    AXIS_MAX, AnalysisRecord, Axis, FetchOutcome, FetchStatus, RunStats, ScoreResult, TEXT_CAP,
    Target,
};
