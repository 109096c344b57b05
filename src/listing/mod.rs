//! Listing summaries and detail enrichment
//!
//! This module contains:
//! - The record types (`ListingSummary`, `ListingDetail`, `VehicleAttributes`)
//! - `Field`, the per-field extraction result
//! - `ListingPageFetcher`, reading one search page at a time
//! - `ListingDetailEnricher`, turning a summary into a detail record

mod enricher;
mod extract;
mod fetcher;
mod types;

pub use enricher::ListingDetailEnricher;
pub use fetcher::ListingPageFetcher;
pub use types::{Field, ListingDetail, ListingKind, ListingSummary, VehicleAttributes};
