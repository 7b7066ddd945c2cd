//! Holds fetched records between batches and decides when they go to disk.

use crate::parse::Record;
use crate::sink::RecordSink;
use crate::Result;

/// Single-owner record buffer. Only the batch driver touches it, between batches.
#[derive(Debug)]
pub struct RecordBuffer {
    records: Vec<Record>,
    threshold: usize,
}

impl RecordBuffer {
    pub fn new(threshold: usize) -> Self {
        Self {
            records: Vec::new(),
            threshold,
        }
    }

    pub fn accumulate(&mut self, records: impl IntoIterator<Item = Record>) {
        self.records.extend(records);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_full(&self) -> bool {
        !self.records.is_empty() && self.records.len() >= self.threshold
    }

    /// Writes the whole buffer if it reached the threshold.
    /// Returns how many records were written.
    pub fn maybe_flush(&mut self, sink: &mut dyn RecordSink) -> Result<Option<usize>> {
        if !self.is_full() {
            return Ok(None);
        }
        self.flush(sink).map(Some)
    }

    /// Writes whatever is left, if anything.
    pub fn flush_remainder(&mut self, sink: &mut dyn RecordSink) -> Result<Option<usize>> {
        if self.is_empty() {
            return Ok(None);
        }
        self.flush(sink).map(Some)
    }

    fn flush(&mut self, sink: &mut dyn RecordSink) -> Result<usize> {
        sink.write_records(&self.records)?;
        let written = self.records.len();
        self.records.clear();
        Ok(written)
    }
}
