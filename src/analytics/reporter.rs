//! History reporter: aggregates the sample log for `nxdash history`.
//!
//! Device counters are cumulative since boot, so the interesting numbers
//! are deltas between the first and last sample of a window. A counter
//! that went backwards (device rebooted) contributes a delta of zero.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analytics::logger::SampleLogEntry;

/// Aggregate view over a window of samples.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HistorySummary {
    pub samples: usize,
    pub first: Option<DateTime<Utc>>,
    pub last: Option<DateTime<Utc>>,
    /// Seconds between the first and last sample.
    pub span_secs: f64,
    pub resumptions: u64,
    pub suspensions: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub connections: u64,
    pub disconnections: u64,
    /// Average send throughput over the span (bytes/s).
    pub send_rate: f64,
    /// Average receive throughput over the span (bytes/s).
    pub receive_rate: f64,
}

/// Difference of a cumulative counter, zero across a reset.
fn delta(first: u64, last: u64) -> u64 {
    last.saturating_sub(first)
}

fn rate(bytes: u64, secs: f64) -> f64 {
    if secs <= 0.0 { 0.0 } else { bytes as f64 / secs }
}

/// Summarize entries (expected oldest first, as the log stores them).
pub fn summarize(entries: &[SampleLogEntry]) -> HistorySummary {
    let (Some(first), Some(last)) = (entries.first(), entries.last()) else {
        return HistorySummary::default();
    };

    let span_secs = (last.timestamp - first.timestamp).num_milliseconds().max(0) as f64 / 1000.0;
    let bytes_sent = delta(first.nx.bytes_sent, last.nx.bytes_sent);
    let bytes_received = delta(first.nx.bytes_received, last.nx.bytes_received);

    HistorySummary {
        samples: entries.len(),
        first: Some(first.timestamp),
        last: Some(last.timestamp),
        span_secs,
        resumptions: delta(first.tx.resumptions, last.tx.resumptions),
        suspensions: delta(first.tx.suspensions, last.tx.suspensions),
        bytes_sent,
        bytes_received,
        connections: delta(first.nx.connections, last.nx.connections),
        disconnections: delta(first.nx.disconnections, last.nx.disconnections),
        send_rate: rate(bytes_sent, span_secs),
        receive_rate: rate(bytes_received, span_secs),
    }
}

/// The newest `n` entries, oldest first.
pub fn recent(entries: &[SampleLogEntry], n: usize) -> &[SampleLogEntry] {
    &entries[entries.len().saturating_sub(n)..]
}
