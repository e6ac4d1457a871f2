//! Cross-source match reconciliation.
//!
//! Joins every source's records on their canonical key, builds one
//! [`MergedEntry`] per key, and sorts the entries into four priority
//! buckets. Matches the exchange covers come first since only those can
//! carry a back/lay arbitrage; within that bucket more bookmaker
//! corroboration ranks higher, then the more advanced clock.
//!
//! A source with no records (stopped, stale, unparseable) simply
//! contributes nothing; merging never fails.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

use crate::types::{CanonicalKey, MergedEntry, NormalizedRecord, PriorityClass, SourceId};

/// Latest records per source, as handed to [`merge`].
pub type SourceRecords = HashMap<SourceId, Vec<NormalizedRecord>>;

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// Merged entries grouped by priority class, each bucket already sorted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Board {
    pub has_exchange: Vec<MergedEntry>,
    pub all_providers: Vec<MergedEntry>,
    pub two_providers: Vec<MergedEntry>,
    pub single_provider: Vec<MergedEntry>,
}

impl Board {
    pub fn bucket(&self, class: PriorityClass) -> &[MergedEntry] {
        match class {
            PriorityClass::HasExchange => &self.has_exchange,
            PriorityClass::AllProviders => &self.all_providers,
            PriorityClass::TwoProviders => &self.two_providers,
            PriorityClass::SingleProvider => &self.single_provider,
        }
    }

    fn bucket_mut(&mut self, class: PriorityClass) -> &mut Vec<MergedEntry> {
        match class {
            PriorityClass::HasExchange => &mut self.has_exchange,
            PriorityClass::AllProviders => &mut self.all_providers,
            PriorityClass::TwoProviders => &mut self.two_providers,
            PriorityClass::SingleProvider => &mut self.single_provider,
        }
    }

    /// All entries in display order: buckets concatenated by priority.
    pub fn entries(&self) -> impl Iterator<Item = &MergedEntry> {
        PriorityClass::ALL.iter().flat_map(move |c| self.bucket(*c).iter())
    }

    pub fn len(&self) -> usize {
        PriorityClass::ALL.iter().map(|c| self.bucket(*c).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

/// Index one source's records by canonical key.
///
/// If a source reports two records with the same key in one snapshot the
/// later one wins.
pub fn index_by_key(records: &[NormalizedRecord]) -> BTreeMap<&CanonicalKey, &NormalizedRecord> {
    records.iter().map(|r| (&r.canonical_key, r)).collect()
}

/// Priority class for an entry given its exchange coverage and the number
/// of bookmakers reporting it.
pub fn classify(has_exchange: bool, provider_count: usize) -> PriorityClass {
    if has_exchange {
        PriorityClass::HasExchange
    } else if provider_count >= SourceId::BACK_ONLY.len() {
        PriorityClass::AllProviders
    } else if provider_count == 2 {
        PriorityClass::TwoProviders
    } else {
        PriorityClass::SingleProvider
    }
}

fn build_entry(
    key: &CanonicalKey,
    indexed: &HashMap<SourceId, BTreeMap<&CanonicalKey, &NormalizedRecord>>,
) -> MergedEntry {
    let members: BTreeMap<SourceId, NormalizedRecord> = SourceId::ALL
        .iter()
        .filter_map(|source| {
            let record = indexed.get(source)?.get(key)?;
            Some((*source, (*record).clone()))
        })
        .collect();

    let provider_count = members.keys().filter(|s| !s.is_exchange()).count();
    let has_exchange = members.contains_key(&SourceId::EXCHANGE);
    let minutes_elapsed = members.values().map(|r| r.minutes_elapsed).max().unwrap_or(0);
    let display_teams = members
        .values()
        .next()
        .map(|r| r.teams.clone())
        .unwrap_or_default();

    MergedEntry {
        canonical_key: key.clone(),
        members,
        minutes_elapsed,
        provider_count,
        priority_class: classify(has_exchange, provider_count),
        display_teams,
    }
}

/// Merge every source's records into a sorted [`Board`].
pub fn merge(source_records: &SourceRecords) -> Board {
    let indexed: HashMap<SourceId, BTreeMap<&CanonicalKey, &NormalizedRecord>> = source_records
        .iter()
        .map(|(source, records)| (*source, index_by_key(records)))
        .collect();

    // Ordered union so that ties keep a stable, reproducible order.
    let keys: BTreeSet<&CanonicalKey> = indexed
        .values()
        .flat_map(|by_key| by_key.keys().copied())
        .collect();

    let mut board = Board::default();
    for key in &keys {
        let entry = build_entry(key, &indexed);
        board.bucket_mut(entry.priority_class).push(entry);
    }

    board.has_exchange.sort_by(|a, b| {
        b.provider_count
            .cmp(&a.provider_count)
            .then(b.minutes_elapsed.cmp(&a.minutes_elapsed))
    });
    for bucket in [
        &mut board.all_providers,
        &mut board.two_providers,
        &mut board.single_provider,
    ] {
        bucket.sort_by(|a, b| b.minutes_elapsed.cmp(&a.minutes_elapsed));
    }

    debug!(
        keys = keys.len(),
        exchange = board.has_exchange.len(),
        all = board.all_providers.len(),
        two = board.two_providers.len(),
        single = board.single_provider.len(),
        "Merge complete"
    );

    board
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
