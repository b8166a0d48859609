//! Classification history: the persistence collaborator.
//!
//! The guardian hands every accepted classification to a
//! [`ClassificationStore`]. Two stores ship with the crate:
//!
//! - [`InMemoryHistory`]: bounded per-symbol ring buffer
//! - [`JsonlHistory`]: append-only JSONL file, one record per line, which
//!   makes the format resilient to partial writes and easy to stream

use std::collections::{HashMap, VecDeque};
use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, RwLock};
use regime_core::RegimeRecord;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("history record encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Store of accepted classifications.
pub trait ClassificationStore: Send + Sync {
    fn append(&self, record: &RegimeRecord) -> Result<(), HistoryError>;

    /// Up to `n` most recent records for `symbol` by detection time, oldest
    /// first, regardless of the order they were appended in.
    fn recent(&self, symbol: &str, n: usize) -> Result<Vec<RegimeRecord>, HistoryError>;
}

/// Keeps the last `capacity` records per symbol.
#[derive(Debug)]
pub struct InMemoryHistory {
    capacity: usize,
    records: RwLock<HashMap<String, VecDeque<RegimeRecord>>>,
}

impl InMemoryHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            records: RwLock::new(HashMap::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self, symbol: &str) -> usize {
        self.records.read().get(symbol).map_or(0, VecDeque::len)
    }
}

impl ClassificationStore for InMemoryHistory {
    fn append(&self, record: &RegimeRecord) -> Result<(), HistoryError> {
        let mut records = self.records.write();
        let ring = records.entry(record.symbol.clone()).or_default();
        // Appends can arrive out of order when evaluations race; keep the
        // ring sorted by detection time so eviction drops the oldest.
        let at = ring.partition_point(|r| r.detected_at <= record.detected_at);
        ring.insert(at, record.clone());
        if ring.len() > self.capacity {
            ring.pop_front();
        }
        Ok(())
    }

    fn recent(&self, symbol: &str, n: usize) -> Result<Vec<RegimeRecord>, HistoryError> {
        let records = self.records.read();
        Ok(records
            .get(symbol)
            .map(|ring| {
                let skip = ring.len().saturating_sub(n);
                ring.iter().skip(skip).cloned().collect()
            })
            .unwrap_or_default())
    }
}

/// JSONL history file.
pub struct JsonlHistory {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Read every record in the file.
    ///
    /// Skips malformed lines (logged but not fatal).
    pub fn read_all(&self) -> Result<Vec<RegimeRecord>, HistoryError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = fs::File::open(&self.path)?;
        let reader = io::BufReader::new(file);
        let mut records = Vec::new();

        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<RegimeRecord>(&line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        line = lineno + 1,
                        error = %e,
                        "skipping malformed history line"
                    );
                }
            }
        }

        Ok(records)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ClassificationStore for JsonlHistory {
    fn append(&self, record: &RegimeRecord) -> Result<(), HistoryError> {
        let json = serde_json::to_string(record)?;
        let _guard = self.write_lock.lock();

        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        writeln!(file, "{json}")?;
        file.flush()?;
        Ok(())
    }

    fn recent(&self, symbol: &str, n: usize) -> Result<Vec<RegimeRecord>, HistoryError> {
        let mut matching: Vec<RegimeRecord> = self
            .read_all()?
            .into_iter()
            .filter(|r| r.symbol == symbol)
            .collect();
        // File order is append order, which racing evaluations can invert.
        matching.sort_by_key(|r| r.detected_at);
        let skip = matching.len().saturating_sub(n);
        Ok(matching.split_off(skip))
    }
}
