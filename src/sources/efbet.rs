//! Efbet snapshots.
//!
//! Efbet prints both teams in one title ("Home - Away") and groups prices
//! into named markets; the 1X2 prices live in the "Match Result" market.
//! Carousel fallback items carry no teams and are dropped.

use anyhow::Result;
use serde::Deserialize;
use serde_json::Value;

use super::{odds_from_value, parse_json_array, score_text, RecordAdapter};
use crate::normalize::minutes_from_text;
use crate::types::{Market, NormalizedRecord, OddsText, SourceId};

const MATCH_RESULT_MARKET: &str = "match result";
const TEAM_SEPARATOR: &str = " - ";

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(default)]
    teams: Value,
    #[serde(default)]
    time: Option<String>,
    #[serde(default)]
    score: Option<String>,
    #[serde(default)]
    markets: Vec<RawMarket>,
}

#[derive(Debug, Deserialize)]
struct RawMarket {
    #[serde(default)]
    market: String,
    #[serde(default)]
    selections: Vec<RawSelection>,
}

#[derive(Debug, Deserialize)]
struct RawSelection {
    #[serde(default)]
    odds: Value,
}

/// Split the event title into team names.
fn split_teams(teams: &Value) -> Vec<String> {
    match teams {
        Value::String(title) => title
            .split(TEAM_SEPARATOR)
            .map(|t| t.trim().to_string())
            .collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(|t| t.as_str().map(|s| s.trim().to_string()))
            .collect(),
        _ => Vec::new(),
    }
}

/// 1X2 prices from the last "Match Result" market with at least three selections.
fn match_result_prices(markets: &[RawMarket]) -> [OddsText; 3] {
    markets
        .iter()
        .filter(|m| m.market.trim().eq_ignore_ascii_case(MATCH_RESULT_MARKET))
        .filter(|m| m.selections.len() >= 3)
        .last()
        .map(|m| {
            [
                odds_from_value(Some(&m.selections[0].odds)),
                odds_from_value(Some(&m.selections[1].odds)),
                odds_from_value(Some(&m.selections[2].odds)),
            ]
        })
        .unwrap_or_default()
}

pub struct EfbetAdapter;

impl EfbetAdapter {
    fn convert(item: Value) -> Result<NormalizedRecord> {
        let raw: RawEvent = serde_json::from_value(item)?;
        let minutes = raw.time.as_deref().map(minutes_from_text).unwrap_or(0);
        let [home, draw, away] = match_result_prices(&raw.markets);

        let record = NormalizedRecord::new(
            SourceId::Efbet,
            split_teams(&raw.teams),
            minutes,
            score_text(raw.score),
            Market::back_only(home, draw, away),
        )?;
        Ok(record)
    }
}

impl RecordAdapter for EfbetAdapter {
    fn source(&self) -> SourceId {
        SourceId::Efbet
    }

    fn parse_snapshot(&self, contents: &str) -> Result<Vec<NormalizedRecord>> {
        parse_json_array(SourceId::Efbet, contents, Self::convert)
    }
}
