//! Harvest orchestration
//!
//! The [`Harvester`] resolves a category, walks its search pages on one
//! context and optionally enriches every page through the context pool. The
//! [`ResultAggregator`] sits between the two and the sink: it drops duplicate
//! listings, keeps input order and counts what happened.

mod aggregator;
mod coordinator;

pub use aggregator::ResultAggregator;
pub use coordinator::{HarvestRequest, Harvester};
