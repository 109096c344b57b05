//! Harvest statistics
//!
//! Counters are kept by the harvester while it runs and printed once at the
//! end. The report goes to stderr because stdout carries the records.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::{self, Write};

/// Counters describing one harvest run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HarvestStats {
    /// Slug of the harvested category
    pub category: String,

    /// Search pages fetched successfully that had entries
    pub pages_fetched: u64,

    /// Search pages that could not be fetched
    pub pages_failed: u64,

    /// Summaries read from search pages, duplicates included
    pub summaries_seen: u64,

    /// Summaries dropped because their url was already seen
    pub duplicates_dropped: u64,

    /// Details successfully enriched
    pub details_enriched: u64,

    /// Summaries skipped because their detail page was unavailable
    pub details_skipped: u64,

    /// Records handed to the sink
    pub records_emitted: u64,

    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl HarvestStats {
    /// Starts counting for `category` now
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            pages_fetched: 0,
            pages_failed: 0,
            summaries_seen: 0,
            duplicates_dropped: 0,
            details_enriched: 0,
            details_skipped: 0,
            records_emitted: 0,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Marks the run as finished now
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }

    /// Share of attempted enrichments that succeeded, as a percentage
    pub fn enrichment_rate(&self) -> f64 {
        let attempted = self.details_enriched + self.details_skipped;
        if attempted == 0 {
            return 0.0;
        }
        (self.details_enriched as f64 / attempted as f64) * 100.0
    }
}

/// Writes the statistics report
pub fn write_statistics(out: &mut impl Write, stats: &HarvestStats) -> io::Result<()> {
    writeln!(out, "=== Harvest Statistics ===\n")?;

    writeln!(out, "Category: {}", stats.category)?;
    writeln!(out, "  Started: {}", stats.started_at.to_rfc3339())?;
    if let Some(finished) = stats.finished_at {
        writeln!(out, "  Finished: {}", finished.to_rfc3339())?;
    }
    if let Some(seconds) = stats.duration_seconds() {
        writeln!(out, "  Duration: {}s", seconds)?;
    }
    writeln!(out)?;

    writeln!(out, "Pages:")?;
    writeln!(out, "  Fetched: {}", stats.pages_fetched)?;
    writeln!(out, "  Failed: {}", stats.pages_failed)?;
    writeln!(out)?;

    writeln!(out, "Listings:")?;
    writeln!(out, "  Summaries seen: {}", stats.summaries_seen)?;
    writeln!(out, "  Duplicates dropped: {}", stats.duplicates_dropped)?;
    if stats.details_enriched + stats.details_skipped > 0 {
        writeln!(
            out,
            "  Details enriched: {} ({:.1}%)",
            stats.details_enriched,
            stats.enrichment_rate()
        )?;
        writeln!(out, "  Details skipped: {}", stats.details_skipped)?;
    }
    writeln!(out)?;

    writeln!(out, "Records emitted: {}", stats.records_emitted)
}

/// Prints the statistics report to stderr
pub fn print_statistics(stats: &HarvestStats) {
    if let Err(e) = write_statistics(&mut io::stderr().lock(), stats) {
        tracing::warn!("Failed to print statistics: {}", e);
    }
}
