//! Shared error model, configuration, and request pacing for leadpipe.
//!
//! This crate is the foundation depended on by all other leadpipe crates.
//! It provides:
//! - [`LeadPipeError`]: the unified error type
//! - Configuration ([`AppConfig`], config loading, credential lookup)
//! - [`RateLimiter`]: the shared token dispenser injected into clients

pub mod config;
pub mod error;
pub mod ratelimit;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AirtableConfig, AppConfig, EnrichmentSettings, MergeSettings, OpenAiConfig, ServiceConfig,
    config_dir, config_file_path, init_config, load_config, load_config_from, require_api_key,
};
pub use error::{LeadPipeError, Result};
pub use ratelimit::RateLimiter;
