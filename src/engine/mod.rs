//! Core engine: per-source polling, cross-source merge, and arbitrage scan.

pub mod arbitrage;
pub mod reconciler;
pub mod report;
pub mod supervisor;

use std::collections::BTreeMap;

use arbitrage::{ArbitrageCalculator, Opportunity};
use reconciler::{merge, Board, SourceRecords};
use report::CycleReport;

use crate::types::CanonicalKey;

/// Everything one reconcile cycle produces.
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub board: Board,
    /// Opportunities per merged entry; entries without any are absent.
    pub opportunities: BTreeMap<CanonicalKey, Vec<Opportunity>>,
    pub report: CycleReport,
}

impl CycleOutcome {
    pub fn opportunities_for(&self, key: &CanonicalKey) -> &[Opportunity] {
        self.opportunities.get(key).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Stateless apart from the cycle counter: every cycle recomputes from the
/// snapshots it is given.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    calculator: ArbitrageCalculator,
    cycle_count: u64,
}

impl Engine {
    pub fn new(calculator: ArbitrageCalculator) -> Self {
        Self {
            calculator,
            cycle_count: 0,
        }
    }

    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    pub fn calculator(&self) -> &ArbitrageCalculator {
        &self.calculator
    }

    /// Merge the given snapshots and scan every exchange-covered entry.
    pub fn run_cycle(&mut self, inputs: &SourceRecords) -> CycleOutcome {
        self.cycle_count += 1;

        let board = merge(inputs);
        let opportunities: BTreeMap<CanonicalKey, Vec<Opportunity>> = board
            .has_exchange
            .iter()
            .filter_map(|entry| {
                let found = self.calculator.scan(entry);
                (!found.is_empty()).then(|| (entry.canonical_key.clone(), found))
            })
            .collect();

        let report = CycleReport::summarize(self.cycle_count, inputs, &board, &opportunities);
        CycleOutcome {
            board,
            opportunities,
            report,
        }
    }
}
