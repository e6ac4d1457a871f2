//! Back/lay arbitrage detection.
//!
//! For each 1X2 outcome of a merged entry, the best back price offered by
//! any bookmaker is compared with the exchange lay price. Backing at the
//! higher price and laying at the lower one locks in
//! `stake * (best_back / lay - 1)` whatever the result.
//!
//! Prices that are missing or not numeric never take part. All arithmetic
//! is checked, so absurd inputs yield no opportunity instead of a panic.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::types::{MergedEntry, Outcome, SourceId};

/// Stake used when none is configured.
pub const DEFAULT_STAKE: Decimal = dec!(1000);

/// A profitable back/lay pair for one outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Opportunity {
    pub outcome: Outcome,
    pub best_back: Decimal,
    /// Bookmaker offering `best_back`.
    pub back_source: SourceId,
    pub lay_price: Decimal,
    /// Stake available at the lay price, as the exchange shows it.
    pub lay_size: String,
    pub profit: Decimal,
}

/// Highest numeric back price across the bookmakers in `entry`.
///
/// Ties go to the source earlier in priority order.
pub fn best_back(entry: &MergedEntry, outcome: Outcome) -> Option<(SourceId, Decimal)> {
    entry
        .back_only_members()
        .filter_map(|r| {
            let price = r.market.back_price(outcome)?.decimal()?;
            Some((r.source, price))
        })
        .fold(None, |best, (source, price)| match best {
            Some((_, current)) if current >= price => best,
            _ => Some((source, price)),
        })
}

/// Numeric exchange lay price for `outcome`, with its displayed size.
pub fn lay_quote(entry: &MergedEntry, outcome: Outcome) -> Option<(Decimal, String)> {
    let level = entry.exchange()?.market.lay_level(outcome)?;
    let price = level.price.decimal()?;
    Some((price, level.size.clone()))
}

/// `stake * (back / lay - 1)`, or `None` on overflow or a zero lay.
pub fn arbitrage_profit(stake: Decimal, back: Decimal, lay: Decimal) -> Option<Decimal> {
    let ratio = back.checked_div(lay)?;
    stake.checked_mul(ratio.checked_sub(Decimal::ONE)?)
}

/// Opportunity for a single outcome. Requires `best_back > lay` strictly.
pub fn find_opportunity(entry: &MergedEntry, outcome: Outcome, stake: Decimal) -> Option<Opportunity> {
    let (back_source, best_back) = best_back(entry, outcome)?;
    let (lay_price, lay_size) = lay_quote(entry, outcome)?;
    if best_back <= lay_price {
        return None;
    }

    let profit = arbitrage_profit(stake, best_back, lay_price)?;
    Some(Opportunity {
        outcome,
        best_back,
        back_source,
        lay_price,
        lay_size,
        profit,
    })
}

/// Profit per outcome for every outcome with an opportunity.
pub fn compute_opportunities(entry: &MergedEntry, stake: Decimal) -> BTreeMap<Outcome, Decimal> {
    Outcome::ALL
        .iter()
        .filter_map(|o| find_opportunity(entry, *o, stake))
        .map(|opp| (opp.outcome, opp.profit))
        .collect()
}

// ---------------------------------------------------------------------------
// Calculator
// ---------------------------------------------------------------------------

/// Scans merged entries at a fixed stake.
#[derive(Debug, Clone)]
pub struct ArbitrageCalculator {
    stake: Decimal,
}

impl Default for ArbitrageCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_STAKE)
    }
}

impl ArbitrageCalculator {
    pub fn new(stake: Decimal) -> Self {
        Self { stake }
    }

    pub fn stake(&self) -> Decimal {
        self.stake
    }

    /// All opportunities on one entry, in Home, Draw, Away order.
    pub fn scan(&self, entry: &MergedEntry) -> Vec<Opportunity> {
        Outcome::ALL
            .iter()
            .filter_map(|o| find_opportunity(entry, *o, self.stake))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
