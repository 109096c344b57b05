//! Sink trait and record type
//!
//! The harvest engine holds no storage of its own. Every finished record is
//! handed to a [`RecordSink`] exactly once, in output order.

use crate::listing::{ListingDetail, ListingSummary};
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to format record: {0}")]
    Format(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// A finished record
///
/// Serialized with a `record` tag, e.g. `{"record":"summary","url":...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "record", rename_all = "lowercase")]
pub enum Record {
    Summary(ListingSummary),
    Detail(ListingDetail),
}

impl Record {
    /// Identity of the listing the record describes
    pub fn url(&self) -> &str {
        match self {
            Self::Summary(summary) => &summary.url,
            Self::Detail(detail) => detail.url(),
        }
    }
}

impl From<ListingSummary> for Record {
    fn from(summary: ListingSummary) -> Self {
        Self::Summary(summary)
    }
}

impl From<ListingDetail> for Record {
    fn from(detail: ListingDetail) -> Self {
        Self::Detail(detail)
    }
}

/// Receiver of finished records
///
/// `append` is called once per record as soon as the record is finished.
pub trait RecordSink: Send {
    /// Accepts one record
    fn append(&mut self, record: &Record) -> OutputResult<()>;
}
