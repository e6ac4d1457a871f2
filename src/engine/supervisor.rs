//! Source supervisor: one poll task per source, one snapshot slot each.
//!
//! Every source task fetches on its own interval and publishes a complete
//! replacement of its slot. The reconcile loop reads the slots without
//! ever waiting on a task: whatever is there (or nothing) is what the
//! cycle gets. Stopping a source touches only that source's task and slot.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::engine::reconciler::SourceRecords;
pub use crate::sources::Snapshot;
use crate::sources::SnapshotFeed;
use crate::types::SourceId;

/// How long `stop` waits for a task to notice its stop signal before aborting it.
const STOP_GRACE: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Slots
// ---------------------------------------------------------------------------

/// What a source's slot currently holds.
#[derive(Debug, Clone, Default)]
pub struct SourceSlot {
    /// Latest good snapshot; `None` while the source is unavailable.
    pub snapshot: Option<Snapshot>,
    pub last_error: Option<String>,
    pub last_attempt: Option<DateTime<Utc>>,
}

/// Per-source view for the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct SourceStatus {
    pub source: SourceId,
    pub running: bool,
    pub records: usize,
    pub last_fetch: Option<DateTime<Utc>>,
    pub last_attempt: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

struct SourceTask {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

// ---------------------------------------------------------------------------
// Poll task
// ---------------------------------------------------------------------------

/// Fetch once and publish the result into `slot`.
///
/// A failed fetch replaces the slot with "unavailable" rather than leaving
/// the previous snapshot in place.
pub async fn poll_once(feed: &dyn SnapshotFeed, slot: &watch::Sender<SourceSlot>) {
    let source = feed.source();
    let now = Utc::now();

    match feed.fetch().await {
        Ok(snapshot) => {
            debug!(
                source = %source,
                records = snapshot.records.len(),
                fetched_at = %snapshot.fetched_at,
                "Snapshot published"
            );
            slot.send_replace(SourceSlot {
                snapshot: Some(snapshot),
                last_error: None,
                last_attempt: Some(now),
            });
        }
        Err(e) => {
            warn!(source = %source, error = %e, "Source unavailable");
            slot.send_replace(SourceSlot {
                snapshot: None,
                last_error: Some(e.to_string()),
                last_attempt: Some(now),
            });
        }
    }
}

async fn poll_source(
    feed: Arc<dyn SnapshotFeed>,
    period: Duration,
    slot: Arc<watch::Sender<SourceSlot>>,
    mut stop: oneshot::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => poll_once(&*feed, &slot).await,
            _ = &mut stop => break,
        }
    }
    debug!(source = %feed.source(), "Poll task exited");
}

async fn shutdown_task(source: SourceId, mut task: SourceTask) {
    // The receiver is gone only if the task already exited.
    let _ = task.stop.send(());
    if tokio::time::timeout(STOP_GRACE, &mut task.handle).await.is_err() {
        warn!(source = %source, "Poll task did not stop in time, aborting");
        task.handle.abort();
    }
}

// ---------------------------------------------------------------------------
// Supervisor
// ---------------------------------------------------------------------------

pub struct SourceSupervisor {
    slots: HashMap<SourceId, Arc<watch::Sender<SourceSlot>>>,
    tasks: HashMap<SourceId, SourceTask>,
}

impl Default for SourceSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceSupervisor {
    pub fn new() -> Self {
        let slots = SourceId::ALL
            .iter()
            .map(|s| (*s, Arc::new(watch::channel(SourceSlot::default()).0)))
            .collect();
        Self {
            slots,
            tasks: HashMap::new(),
        }
    }

    fn slot(&self, source: SourceId) -> Arc<watch::Sender<SourceSlot>> {
        self.slots
            .get(&source)
            .cloned()
            .unwrap_or_else(|| Arc::new(watch::channel(SourceSlot::default()).0))
    }

    /// Spawn the poll task for `feed`'s source.
    ///
    /// Returns `false` without spawning if that source is already running.
    pub fn start(&mut self, feed: Arc<dyn SnapshotFeed>, interval: Duration) -> bool {
        let source = feed.source();
        if self.is_running(source) {
            warn!(source = %source, "Source already running");
            return false;
        }

        let (stop, stop_rx) = oneshot::channel();
        let handle = tokio::spawn(poll_source(feed, interval, self.slot(source), stop_rx));
        self.tasks.insert(source, SourceTask { stop, handle });

        info!(source = %source, interval_secs = interval.as_secs_f64(), "Source started");
        true
    }

    /// Stop one source and clear its slot.
    ///
    /// Returns `false` if the source was not running.
    pub async fn stop(&mut self, source: SourceId) -> bool {
        let Some(task) = self.tasks.remove(&source) else {
            debug!(source = %source, "Stop requested for idle source");
            return false;
        };

        shutdown_task(source, task).await;
        self.slot(source).send_replace(SourceSlot::default());
        info!(source = %source, "Source stopped");
        true
    }

    /// Stop every running source concurrently.
    pub async fn stop_all(&mut self) {
        let tasks: Vec<(SourceId, SourceTask)> = self.tasks.drain().collect();
        let sources: Vec<SourceId> = tasks.iter().map(|(s, _)| *s).collect();

        join_all(tasks.into_iter().map(|(s, t)| shutdown_task(s, t))).await;
        for source in &sources {
            self.slot(*source).send_replace(SourceSlot::default());
        }
        info!(stopped = sources.len(), "All sources stopped");
    }

    pub fn is_running(&self, source: SourceId) -> bool {
        self.tasks
            .get(&source)
            .is_some_and(|t| !t.handle.is_finished())
    }

    pub fn running(&self) -> Vec<SourceId> {
        let mut running: Vec<SourceId> = self
            .tasks
            .keys()
            .copied()
            .filter(|s| self.is_running(*s))
            .collect();
        running.sort();
        running
    }

    #[cfg(test)]
    fn publish(&self, source: SourceId, snapshot: Snapshot) {
        self.slot(source).send_replace(SourceSlot {
            last_attempt: Some(snapshot.fetched_at),
            snapshot: Some(snapshot),
            last_error: None,
        });
    }

    /// Watch a source's slot for changes.
    pub fn subscribe(&self, source: SourceId) -> watch::Receiver<SourceSlot> {
        self.slot(source).subscribe()
    }

    /// Latest fresh records per source.
    ///
    /// Sources that are unavailable, or whose snapshot is older than
    /// `max_age`, are left out.
    pub fn collect(&self, max_age: Duration) -> SourceRecords {
        let now = Utc::now();
        let mut out = SourceRecords::new();

        for source in SourceId::ALL {
            let slot = self.slot(*source);
            let slot = slot.borrow();
            let Some(snapshot) = slot.snapshot.as_ref() else {
                continue;
            };

            let age = snapshot.age(now);
            if age > max_age {
                warn!(
                    source = %source,
                    age_secs = age.as_secs(),
                    "Snapshot stale, ignoring"
                );
                continue;
            }
            out.insert(*source, snapshot.records.clone());
        }

        out
    }

    pub fn status(&self) -> Vec<SourceStatus> {
        SourceId::ALL
            .iter()
            .map(|source| {
                let slot = self.slot(*source);
                let slot = slot.borrow();
                SourceStatus {
                    source: *source,
                    running: self.is_running(*source),
                    records: slot.snapshot.as_ref().map_or(0, |s| s.records.len()),
                    last_fetch: slot.snapshot.as_ref().map(|s| s.fetched_at),
                    last_attempt: slot.last_attempt,
                    last_error: slot.last_error.clone(),
                }
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
