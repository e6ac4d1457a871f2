//! Per-source record adapters and snapshot feeds.
//!
//! Each site's scraper writes its latest snapshot in its own shape. An
//! adapter turns one snapshot into [`NormalizedRecord`]s, dropping any
//! record that is malformed. A [`SnapshotFeed`] is what the supervisor
//! polls: it produces the current record list for one source.

pub mod bookmaker;
pub mod efbet;
pub mod orbitx;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::normalize::{minutes_from_text, minutes_with_stoppage};
use crate::storage;
use crate::types::{ArbwatchError, NormalizedRecord, OddsText, SourceId, NOT_AVAILABLE};

use bookmaker::BookmakerAdapter;
use efbet::EfbetAdapter;
use orbitx::OrbitXAdapter;

/// Converts one source's raw snapshot text into normalized records.
pub trait RecordAdapter: Send + Sync {
    /// The source this adapter understands.
    fn source(&self) -> SourceId;

    /// Parse a complete snapshot.
    ///
    /// Individual malformed records are dropped. An error means the
    /// snapshot as a whole could not be read.
    fn parse_snapshot(&self, contents: &str) -> Result<Vec<NormalizedRecord>>;
}

/// The adapter for a known source.
pub fn adapter_for(source: SourceId) -> Box<dyn RecordAdapter> {
    match source {
        SourceId::WinBet | SourceId::Betano => Box::new(BookmakerAdapter::new(source)),
        SourceId::Efbet => Box::new(EfbetAdapter),
        SourceId::OrbitX => Box::new(OrbitXAdapter),
    }
}

/// A complete set of records from one source.
///
/// `fetched_at` is when the source produced the records, not when they
/// were read, so a snapshot nobody refreshes ages even if it is re-read.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub records: Vec<NormalizedRecord>,
    pub fetched_at: DateTime<Utc>,
}

impl Snapshot {
    /// Records produced just now.
    pub fn new(records: Vec<NormalizedRecord>) -> Self {
        Self::at(records, Utc::now())
    }

    pub fn at(records: Vec<NormalizedRecord>, fetched_at: DateTime<Utc>) -> Self {
        Self {
            records,
            fetched_at,
        }
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.fetched_at).to_std().unwrap_or(Duration::ZERO)
    }
}

/// A pollable producer of one source's latest records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnapshotFeed: Send + Sync {
    fn source(&self) -> SourceId;

    /// Fetch the current snapshot. Errors mean the source is unavailable
    /// for this poll.
    async fn fetch(&self) -> Result<Snapshot>;
}

/// Feed backed by the snapshot file a scraper keeps replacing.
pub struct FileFeed {
    path: PathBuf,
    adapter: Box<dyn RecordAdapter>,
}

impl FileFeed {
    pub fn new(source: SourceId, path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            adapter: adapter_for(source),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SnapshotFeed for FileFeed {
    fn source(&self) -> SourceId {
        self.adapter.source()
    }

    /// The snapshot is dated by the file's mtime, i.e. when the scraper last
    /// replaced it. The mtime is taken before reading so a concurrent
    /// replacement can only make the snapshot look older.
    async fn fetch(&self) -> Result<Snapshot> {
        let written_at = storage::modified_at(&self.path);
        let contents = storage::read_snapshot(&self.path)?.ok_or_else(|| {
            ArbwatchError::SourceUnavailable {
                source_id: self.source(),
                message: format!("no snapshot at {}", self.path.display()),
            }
        })?;
        let records = self.adapter.parse_snapshot(&contents)?;
        Ok(Snapshot::at(records, written_at.unwrap_or_else(Utc::now)))
    }
}

// ---------------------------------------------------------------------------
// Shared field helpers
// ---------------------------------------------------------------------------

/// Read a price cell that may be a JSON string or number.
pub(crate) fn odds_from_value(value: Option<&Value>) -> OddsText {
    match value {
        Some(Value::String(s)) => OddsText::new(s),
        Some(Value::Number(n)) => OddsText::new(n.to_string()),
        _ => OddsText::missing(),
    }
}

/// First three prices of a 1X2 list, padded with "N/A".
pub(crate) fn odds_triple(values: &[Value]) -> [OddsText; 3] {
    [
        odds_from_value(values.first()),
        odds_from_value(values.get(1)),
        odds_from_value(values.get(2)),
    ]
}

/// Elapsed minutes from a `minutes` field, falling back to the clock text.
pub(crate) fn minutes_from_fields(minutes: Option<&Value>, clock: Option<&str>) -> u32 {
    match minutes {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .map(|m| m.min(u32::MAX as u64) as u32)
            .unwrap_or(0),
        Some(Value::String(s)) => minutes_with_stoppage(s),
        _ => clock.map(minutes_from_text).unwrap_or(0),
    }
}

/// Scrapers print "N/A-N/A" when the score widget is missing.
pub(crate) fn score_text(score: Option<String>) -> Option<String> {
    score.filter(|s| {
        let s = s.trim();
        !s.is_empty() && s != NOT_AVAILABLE && s != "N/A-N/A"
    })
}

/// Parse a JSON array snapshot, converting each element with `convert`.
///
/// Elements that fail to convert are logged and skipped.
pub(crate) fn parse_json_array<F>(
    source: SourceId,
    contents: &str,
    convert: F,
) -> Result<Vec<NormalizedRecord>>
where
    F: Fn(Value) -> Result<NormalizedRecord>,
{
    if contents.trim().is_empty() {
        return Ok(Vec::new());
    }

    let items: Vec<Value> = serde_json::from_str(contents).map_err(|e| {
        ArbwatchError::SourceUnavailable {
            source_id: source,
            message: format!("snapshot is not a JSON array: {e}"),
        }
    })?;

    let total = items.len();
    let records: Vec<NormalizedRecord> = items
        .into_iter()
        .filter_map(|item| match convert(item) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!(source = %source, error = %e, "Dropping malformed record");
                None
            }
        })
        .collect();

    debug!(
        source = %source,
        total,
        kept = records.len(),
        "Snapshot parsed"
    );

    Ok(records)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
