//! Board rendering: merged entries to display rows.
//!
//! Each row mirrors one line of the match board: the match label, one odds
//! column per bookmaker, the exchange back/lay column, and the arbitrage
//! column. Missing cells read "N/A".

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::engine::arbitrage::Opportunity;
use crate::engine::CycleOutcome;
use crate::types::{
    MergedEntry, NormalizedRecord, Outcome, PriceLevel, PriorityClass, SourceId, NOT_AVAILABLE,
};

/// One rendered board line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardRow {
    pub bucket: PriorityClass,
    pub canonical_key: String,
    pub minutes_elapsed: u32,
    /// "A vs B (N')\nScore: S"
    pub match_label: String,
    /// Bookmaker odds columns, keyed by source.
    pub bookmakers: BTreeMap<SourceId, String>,
    pub exchange: String,
    pub arbitrage: String,
    pub opportunities: Vec<Opportunity>,
}

pub fn match_label(entry: &MergedEntry) -> String {
    format!(
        "{} vs {} ({}')\nScore: {}",
        entry.display_teams[0],
        entry.display_teams[1],
        entry.minutes_elapsed,
        entry.score()
    )
}

/// "1: p\nX: p\n2: p" for a bookmaker, or "N/A" when it has no record.
pub fn bookmaker_cell(record: Option<&NormalizedRecord>) -> String {
    let Some(record) = record else {
        return NOT_AVAILABLE.to_string();
    };
    Outcome::ALL
        .iter()
        .map(|o| {
            let price = record
                .market
                .back_price(*o)
                .map(|p| p.as_str())
                .unwrap_or(NOT_AVAILABLE);
            format!("{}: {}", o.label(), price)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn level_text(level: Option<&PriceLevel>) -> &str {
    level.map(|l| l.price.as_str()).unwrap_or(NOT_AVAILABLE)
}

/// "1: back/lay" per outcome, or "N/A" when the exchange has no record.
pub fn exchange_cell(record: Option<&NormalizedRecord>) -> String {
    let Some(record) = record else {
        return NOT_AVAILABLE.to_string();
    };
    Outcome::ALL
        .iter()
        .map(|o| {
            let back = record
                .market
                .back_price(*o)
                .map(|p| p.as_str())
                .unwrap_or(NOT_AVAILABLE);
            let lay = level_text(record.market.lay_level(*o));
            format!("{}: {}/{}", o.label(), back, lay)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// "1: $105.26, X: $3.10", or "N/A" when nothing qualifies.
pub fn arbitrage_cell(opportunities: &[Opportunity]) -> String {
    if opportunities.is_empty() {
        return NOT_AVAILABLE.to_string();
    }
    opportunities
        .iter()
        .map(|o| format!("{}: ${:.2}", o.outcome.label(), o.profit))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn board_row(entry: &MergedEntry, opportunities: &[Opportunity]) -> BoardRow {
    let bookmakers = SourceId::BACK_ONLY
        .iter()
        .map(|s| (*s, bookmaker_cell(entry.member(*s))))
        .collect();

    BoardRow {
        bucket: entry.priority_class,
        canonical_key: entry.canonical_key.to_string(),
        minutes_elapsed: entry.minutes_elapsed,
        match_label: match_label(entry),
        bookmakers,
        exchange: exchange_cell(entry.exchange()),
        arbitrage: arbitrage_cell(opportunities),
        opportunities: opportunities.to_vec(),
    }
}

/// Rows for a whole cycle, buckets concatenated in priority order.
pub fn board_rows(outcome: &CycleOutcome) -> Vec<BoardRow> {
    outcome
        .board
        .entries()
        .map(|e| board_row(e, outcome.opportunities_for(&e.canonical_key)))
        .collect()
}

/// Plain-text board, one block per row under a heading per bucket.
pub fn render_text(rows: &[BoardRow]) -> String {
    let mut out = String::new();
    let mut current: Option<PriorityClass> = None;

    for row in rows {
        if current != Some(row.bucket) {
            let _ = writeln!(out, "== {} ==", row.bucket);
            current = Some(row.bucket);
        }
        let _ = writeln!(out, "{}", row.match_label);
        for (source, cell) in &row.bookmakers {
            let _ = writeln!(out, "  {}: {}", source, cell.replace('\n', "  "));
        }
        let _ = writeln!(
            out,
            "  {}: {}",
            SourceId::EXCHANGE,
            row.exchange.replace('\n', "  ")
        );
        let _ = writeln!(out, "  Arbitrage: {}", row.arbitrage);
        out.push('\n');
    }

    if out.is_empty() {
        out.push_str("No live matches.\n");
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
