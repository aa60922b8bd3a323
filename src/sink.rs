//! Output sinks for finished records

use crate::types::OutputRecord;
use std::io::Write;
use std::sync::Mutex;

/// Receives every record that survives filtering
///
/// Shared by all workers, so implementations must tolerate concurrent calls.
/// Records of one group arrive in listing order; records of different groups
/// interleave arbitrarily.
pub trait RecordSink: Send + Sync {
    /// Accept one record
    fn emit(&self, record: &OutputRecord);
}

/// Writes one line per record to standard output
#[derive(Debug, Default)]
pub struct StdoutSink;

impl RecordSink for StdoutSink {
    fn emit(&self, record: &OutputRecord) {
        let mut out = std::io::stdout().lock();
        if let Err(e) = writeln!(out, "{}", record) {
            tracing::error!(error = %e, group_id = %record.group_id, "failed to write record");
        }
    }
}

/// Keeps records in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<OutputRecord>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything emitted so far
    pub fn records(&self) -> Vec<OutputRecord> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Rendered output lines, sorted
    pub fn sorted_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self.records().iter().map(ToString::to_string).collect();
        lines.sort();
        lines
    }
}

impl RecordSink for MemorySink {
    fn emit(&self, record: &OutputRecord) {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(record.clone());
    }
}
