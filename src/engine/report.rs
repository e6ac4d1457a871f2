//! Per-cycle summary.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::info;

use crate::engine::arbitrage::Opportunity;
use crate::engine::reconciler::{Board, SourceRecords};
use crate::types::{CanonicalKey, SourceId};

/// Summary of one reconcile cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub cycle_number: u64,
    pub timestamp: DateTime<Utc>,
    /// Sources that contributed a fresh snapshot, in priority order.
    pub sources_available: Vec<SourceId>,
    pub records_in: usize,
    pub has_exchange: usize,
    pub all_providers: usize,
    pub two_providers: usize,
    pub single_provider: usize,
    pub opportunities: usize,
    pub best_profit: Option<Decimal>,
}

impl CycleReport {
    pub fn summarize(
        cycle_number: u64,
        inputs: &SourceRecords,
        board: &Board,
        opportunities: &BTreeMap<CanonicalKey, Vec<Opportunity>>,
    ) -> Self {
        let mut sources_available: Vec<SourceId> = inputs.keys().copied().collect();
        sources_available.sort();

        let all_opps = opportunities.values().flatten();
        Self {
            cycle_number,
            timestamp: Utc::now(),
            sources_available,
            records_in: inputs.values().map(Vec::len).sum(),
            has_exchange: board.has_exchange.len(),
            all_providers: board.all_providers.len(),
            two_providers: board.two_providers.len(),
            single_provider: board.single_provider.len(),
            opportunities: opportunities.values().map(Vec::len).sum(),
            best_profit: all_opps.map(|o| o.profit).max(),
        }
    }

    pub fn entries(&self) -> usize {
        self.has_exchange + self.all_providers + self.two_providers + self.single_provider
    }

    pub fn log(&self) {
        let sources: Vec<&str> = self.sources_available.iter().map(|s| s.key()).collect();
        info!(
            cycle = self.cycle_number,
            sources = %sources.join(","),
            records = self.records_in,
            entries = self.entries(),
            exchange = self.has_exchange,
            opportunities = self.opportunities,
            best_profit = %self.best_profit.map(|p| format!("${:.2}", p)).unwrap_or_else(|| "-".into()),
            "Cycle complete"
        );
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cycle {}: {} entries ({} exchange, {} all, {} two, {} single), {} opportunities",
            self.cycle_number,
            self.entries(),
            self.has_exchange,
            self.all_providers,
            self.two_providers,
            self.single_provider,
            self.opportunities,
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
