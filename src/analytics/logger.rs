use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::DashConfig;
use crate::device::stats::{NxStats, TxStats};

// ---------------------------------------------------------------------------
// Sample log entry (JSONL history)
// ---------------------------------------------------------------------------

/// One complete poll round, as stored in the sample history.
///
/// Only rounds where both the TX and NX halves parsed are recorded, so
/// every entry carries a full set of counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleLogEntry {
    pub timestamp: DateTime<Utc>,
    /// Base URL of the device the sample came from.
    pub device: String,
    pub tx: TxStats,
    pub nx: NxStats,
}

/// Append-only JSONL file of poll samples.
#[derive(Debug, Clone)]
pub struct SampleLog {
    path: PathBuf,
}

impl SampleLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The configured log, or `None` when history logging is disabled.
    pub fn from_config(config: &DashConfig) -> Option<Self> {
        if !config.logging.enabled {
            return None;
        }
        config.sample_log_path().map(Self::new)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a sample taken now. Best-effort: failures are only logged.
    pub fn record(&self, device: &str, tx: TxStats, nx: NxStats) {
        let entry = SampleLogEntry {
            timestamp: Utc::now(),
            device: device.to_string(),
            tx,
            nx,
        };
        if let Err(e) = self.append(&entry) {
            tracing::debug!(path = %self.path.display(), error = %e, "failed to record sample");
        }
    }

    pub fn append(&self, entry: &SampleLogEntry) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let json = serde_json::to_string(entry)?;
        writeln!(file, "{json}")?;

        Ok(())
    }

    // -----------------------------------------------------------------------
    // Reading
    // -----------------------------------------------------------------------

    /// Read every entry, oldest first.
    ///
    /// Silently skips malformed lines. Returns an empty vec if the file does
    /// not exist or cannot be read.
    pub fn read_all(&self) -> Vec<SampleLogEntry> {
        let Ok(file) = fs::File::open(&self.path) else {
            return Vec::new();
        };

        BufReader::new(file)
            .lines()
            .map_while(Result::ok)
            .filter_map(|line| serde_json::from_str::<SampleLogEntry>(&line).ok())
            .collect()
    }

    /// Read entries from the last `minutes` minutes (all entries if `None`).
    pub fn read_since_minutes(&self, minutes: Option<u32>) -> Vec<SampleLogEntry> {
        let entries = self.read_all();

        let Some(minutes) = minutes else {
            return entries;
        };

        let cutoff = Utc::now() - chrono::Duration::minutes(i64::from(minutes));
        entries
            .into_iter()
            .filter(|e| e.timestamp >= cutoff)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_log(name: &str) -> SampleLog {
        let path = std::env::temp_dir()
            .join(format!("nxdash-logger-{}-{name}", std::process::id()))
            .join("samples.jsonl");
        let _ = fs::remove_file(&path);
        SampleLog::new(path)
    }

    fn tx(n: u64) -> TxStats {
        TxStats {
            resumptions: n,
            ..TxStats::default()
        }
    }

    #[test]
    fn missing_file_reads_empty() {
        let log = temp_log("missing");
        assert!(log.read_all().is_empty());
    }

    #[test]
    fn records_are_read_back_in_order() {
        let log = temp_log("order");
        log.record("http://dev", tx(1), NxStats::default());
        log.record("http://dev", tx(2), NxStats::default());

        let entries = log.read_all();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].tx.resumptions, 1);
        assert_eq!(entries[1].tx.resumptions, 2);
        assert_eq!(entries[1].device, "http://dev");
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let log = temp_log("malformed");
        log.record("http://dev", tx(1), NxStats::default());
        let mut file = OpenOptions::new().append(true).open(log.path()).unwrap();
        writeln!(file, "not json").unwrap();
        log.record("http://dev", tx(3), NxStats::default());

        let entries = log.read_all();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].tx.resumptions, 3);
    }

    #[test]
    fn window_filter_drops_old_entries() {
        let log = temp_log("window");
        let old = SampleLogEntry {
            timestamp: Utc::now() - chrono::Duration::hours(2),
            device: "http://dev".to_string(),
            tx: tx(1),
            nx: NxStats::default(),
        };
        log.append(&old).unwrap();
        log.record("http://dev", tx(2), NxStats::default());

        assert_eq!(log.read_since_minutes(None).len(), 2);
        let recent = log.read_since_minutes(Some(30));
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].tx.resumptions, 2);
    }

    #[test]
    fn disabled_logging_yields_no_log() {
        let mut config = DashConfig::default();
        config.logging.enabled = false;
        assert!(SampleLog::from_config(&config).is_none());

        config.logging.enabled = true;
        config.logging.path = "/tmp/nxdash-samples.jsonl".to_string();
        let log = SampleLog::from_config(&config).unwrap();
        assert_eq!(log.path(), Path::new("/tmp/nxdash-samples.jsonl"));
    }
}
