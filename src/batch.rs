//! In-progress batch state
//!
//! A [`Batch`] is the group of records destined for one output artifact,
//! together with two running counters: the accumulated UTF-8 byte length
//! of each record's JSON-serialized form, and the accumulated token
//! estimate. Records are pushed to the front, so the store holds them
//! newest-first ("oldest appended last"); the writer reverses back to
//! document order on output.
//!
//! Lifecycle: created empty, grown by pushes, flushed (written, then
//! [`Batch::clear`] resets both counters), and always flushed once more at
//! end of run if non-empty.

use std::collections::VecDeque;

use crate::record::PageRecord;

/// The in-progress group of records for one output artifact
#[derive(Debug, Default)]
pub struct Batch {
    records: VecDeque<PageRecord>,
    byte_size: usize,
    token_estimate: u32,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Accumulated serialized byte size of all records
    pub fn byte_size(&self) -> usize {
        self.byte_size
    }

    /// Running token estimate (maintained by the budgeter's decisions)
    pub fn token_estimate(&self) -> u32 {
        self.token_estimate
    }

    /// Append a record, accounting its serialized byte length
    pub fn push(&mut self, record: PageRecord, serialized_bytes: usize) {
        self.records.push_front(record);
        self.byte_size += serialized_bytes;
    }

    /// Add a record's token cost to the running estimate
    pub fn add_token_estimate(&mut self, tokens: u32) {
        self.token_estimate = self.token_estimate.saturating_add(tokens);
    }

    /// Set the opening token estimate of a batch started by a forced split
    pub fn reset_token_estimate(&mut self, tokens: u32) {
        self.token_estimate = tokens;
    }

    /// Records in document order (reversal of the newest-first store)
    pub fn records_in_document_order(&self) -> impl Iterator<Item = &PageRecord> {
        self.records.iter().rev()
    }

    /// Reset to empty: drops records and zeroes both counters
    pub fn clear(&mut self) {
        self.records.clear();
        self.byte_size = 0;
        self.token_estimate = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(url: &str) -> PageRecord {
        serde_json::from_value(serde_json::json!({
            "title": url,
            "url": url,
            "content": "<p>x</p>",
        }))
        .expect("valid record")
    }

    #[test]
    fn test_document_order_reverses_pushes() {
        let mut batch = Batch::new();
        batch.push(record("https://x/1"), 10);
        batch.push(record("https://x/2"), 10);
        batch.push(record("https://x/3"), 10);

        let urls: Vec<_> = batch
            .records_in_document_order()
            .map(|r| r.url.as_str())
            .collect();
        assert_eq!(urls, vec!["https://x/1", "https://x/2", "https://x/3"]);
    }

    #[test]
    fn test_counters_accumulate_and_clear() {
        let mut batch = Batch::new();
        batch.push(record("https://x/1"), 100);
        batch.add_token_estimate(25);
        batch.push(record("https://x/2"), 50);
        batch.add_token_estimate(10);

        assert_eq!(batch.byte_size(), 150);
        assert_eq!(batch.token_estimate(), 35);

        batch.clear();
        assert!(batch.is_empty());
        assert_eq!(batch.byte_size(), 0);
        assert_eq!(batch.token_estimate(), 0);
    }

    #[test]
    fn test_reset_token_estimate_sets_opening_value() {
        let mut batch = Batch::new();
        batch.add_token_estimate(40);
        batch.reset_token_estimate(7);
        assert_eq!(batch.token_estimate(), 7);
    }
}
