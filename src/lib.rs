//! KP-Harvest: a category-driven classifieds harvester
//!
//! This crate resolves the category tree of kupujemprodajem.com, paginates the
//! listing summaries of a category and enriches summaries into full detail
//! records, driving a browsing session one explicit context at a time.

pub mod catalog;
pub mod config;
pub mod harvest;
pub mod listing;
pub mod output;
pub mod session;
pub mod url;

use thiserror::Error;

/// Main error type for KP-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("No category with slug '{slug}'")]
    NotFound { slug: String },

    #[error("Detail page {url} is unavailable: {reason}")]
    DetailUnavailable { url: String, reason: String },

    #[error("Category '{slug}' has no entry in the category id mapping")]
    UnmappedCategory { slug: String },

    #[error("Page numbers start at 1, got {0}")]
    InvalidPage(u32),

    #[error("Session error: {0}")]
    Session(#[from] session::SessionError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector '{selector}' for {name}")]
    InvalidSelector { name: String, selector: String },
}

/// Result type alias for KP-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use catalog::{Category, CategoryIdMapping, CategoryIndex, SubCategory};
pub use config::Config;
pub use harvest::{HarvestRequest, Harvester, ResultAggregator};
pub use listing::{
    Field, ListingDetail, ListingDetailEnricher, ListingKind, ListingPageFetcher, ListingSummary,
    VehicleAttributes,
};
pub use output::{HarvestStats, JsonLinesSink, MemorySink, Record, RecordSink};
pub use session::{BrowsingSession, ContextHandle, ContextPool, ElementHandle, HtmlSession};
pub use url::transform;
