//! In-memory feed for integration testing.
//!
//! Provides a deterministic `SnapshotFeed` whose records (or failure) are
//! fully controllable from test code.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use arbwatch::sources::{Snapshot, SnapshotFeed};
use arbwatch::types::{Market, NormalizedRecord, OddsText, SourceId};

pub struct MemoryFeed {
    source: SourceId,
    records: Arc<Mutex<Vec<NormalizedRecord>>>,
    /// If set, every fetch fails with this message.
    force_error: Arc<Mutex<Option<String>>>,
    fetches: Arc<AtomicUsize>,
}

impl MemoryFeed {
    pub fn new(source: SourceId, records: Vec<NormalizedRecord>) -> Self {
        Self {
            source,
            records: Arc::new(Mutex::new(records)),
            force_error: Arc::new(Mutex::new(None)),
            fetches: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotFeed for MemoryFeed {
    fn source(&self) -> SourceId {
        self.source
    }

    async fn fetch(&self) -> Result<Snapshot> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(msg) = self.force_error.lock().unwrap().clone() {
            return Err(anyhow!(msg));
        }
        Ok(Snapshot::new(self.records.lock().unwrap().clone()))
    }
}

/// A bookmaker record with the given home price.
pub fn bookmaker_record(source: SourceId, home: &str, away: &str, minutes: u32) -> NormalizedRecord {
    NormalizedRecord::new(
        source,
        vec![home.to_string(), away.to_string()],
        minutes,
        None,
        Market::back_only(OddsText::new("2.0"), OddsText::new("3.2"), OddsText::new("3.9")),
    )
    .unwrap()
}
