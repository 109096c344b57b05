use crate::listing::{ListingDetail, ListingSummary};
use crate::output::{OutputResult, Record, RecordSink};

/// Collects records in memory, in the order they were appended
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Vec<Record>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Summary records, in order
    pub fn summaries(&self) -> Vec<&ListingSummary> {
        self.records
            .iter()
            .filter_map(|record| match record {
                Record::Summary(summary) => Some(summary),
                Record::Detail(_) => None,
            })
            .collect()
    }

    /// Detail records, in order
    pub fn details(&self) -> Vec<&ListingDetail> {
        self.records
            .iter()
            .filter_map(|record| match record {
                Record::Detail(detail) => Some(detail),
                Record::Summary(_) => None,
            })
            .collect()
    }
}

impl RecordSink for MemorySink {
    fn append(&mut self, record: &Record) -> OutputResult<()> {
        self.records.push(record.clone());
        Ok(())
    }
}
