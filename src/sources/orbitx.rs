//! OrbitX exchange snapshots.
//!
//! The exchange scraper overwrites a JSON-lines file each poll; every line
//! wraps one match:
//!
//! ```json
//! {"timestamp": "...", "match_data": {"time_str": "63'", "minutes": 63,
//!   "team1": "Levski", "team2": "CSKA", "score": "1-0", "matched": "€12,400",
//!   "outcomes": [{"outcome": "1", "back_odds": "2.1", "back_amount": "150",
//!                 "lay_odds": "2.14", "lay_amount": "90"}, ...]}}
//! ```
//!
//! Exchange outcomes carry both ladders, so records are `Market::BackLay`.

use anyhow::Result;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{minutes_from_fields, odds_from_value, score_text, RecordAdapter};
use crate::types::{
    ExchangeOutcome, Market, NormalizedRecord, Outcome, PriceLevel, SourceId, NOT_AVAILABLE,
};

#[derive(Debug, Deserialize)]
struct RawLine {
    match_data: RawMatch,
}

#[derive(Debug, Deserialize)]
struct RawMatch {
    #[serde(default)]
    time_str: Option<String>,
    #[serde(default)]
    minutes: Option<Value>,
    #[serde(default)]
    team1: Option<String>,
    #[serde(default)]
    team2: Option<String>,
    #[serde(default)]
    score: Option<String>,
    #[serde(default)]
    outcomes: Vec<RawOutcome>,
}

#[derive(Debug, Deserialize)]
struct RawOutcome {
    #[serde(default)]
    outcome: String,
    #[serde(default)]
    back_odds: Value,
    #[serde(default)]
    back_amount: Value,
    #[serde(default)]
    lay_odds: Value,
    #[serde(default)]
    lay_amount: Value,
}

/// A ladder level, or `None` when the exchange shows no price.
fn level(price: &Value, size: &Value) -> Option<PriceLevel> {
    let price = odds_from_value(Some(price));
    if price.as_str() == NOT_AVAILABLE {
        return None;
    }
    let size = match size {
        Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    };
    Some(PriceLevel { price, size })
}

fn exchange_outcomes(raw: &[RawOutcome]) -> [ExchangeOutcome; 3] {
    let mut outcomes: [ExchangeOutcome; 3] = Default::default();
    for oc in raw {
        let Ok(outcome) = oc.outcome.parse::<Outcome>() else {
            debug!(outcome = %oc.outcome, "Skipping unknown exchange outcome");
            continue;
        };
        outcomes[outcome.index()] = ExchangeOutcome {
            back: level(&oc.back_odds, &oc.back_amount),
            lay: level(&oc.lay_odds, &oc.lay_amount),
        };
    }
    outcomes
}

pub struct OrbitXAdapter;

impl OrbitXAdapter {
    fn convert(line: &str) -> Result<NormalizedRecord> {
        let raw: RawLine = serde_json::from_str(line)?;
        let m = raw.match_data;

        let teams: Vec<String> = [m.team1, m.team2]
            .into_iter()
            .flatten()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty() && t != NOT_AVAILABLE)
            .collect();

        let record = NormalizedRecord::new(
            SourceId::OrbitX,
            teams,
            minutes_from_fields(m.minutes.as_ref(), m.time_str.as_deref()),
            score_text(m.score),
            Market::BackLay {
                outcomes: exchange_outcomes(&m.outcomes),
            },
        )?;
        Ok(record)
    }
}

impl RecordAdapter for OrbitXAdapter {
    fn source(&self) -> SourceId {
        SourceId::OrbitX
    }

    fn parse_snapshot(&self, contents: &str) -> Result<Vec<NormalizedRecord>> {
        let mut records = Vec::new();
        let mut dropped = 0usize;

        for line in contents.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match Self::convert(line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    dropped += 1;
                    debug!(source = %SourceId::OrbitX, error = %e, "Dropping malformed line");
                }
            }
        }

        debug!(
            source = %SourceId::OrbitX,
            kept = records.len(),
            dropped,
            "Snapshot parsed"
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn line(team1: &str, team2: &str, minutes: Value, outcomes: Value) -> String {
        json!({
            "timestamp": "2026-10-17T20:15:00",
            "match_data": {
                "time_str": "63'",
                "minutes": minutes,
                "team1": team1,
                "team2": team2,
                "score": "1-0",
                "matched": "€12,400",
                "outcomes": outcomes,
            }
        })
        .to_string()
    }

    fn full_outcomes() -> Value {
        json!([
            {"outcome": "1", "back_odds": "2.1", "back_amount": "150", "lay_odds": "2.14", "lay_amount": "90"},
            {"outcome": "X", "back_odds": "3.3", "back_amount": "40", "lay_odds": "N/A", "lay_amount": "N/A"},
            {"outcome": "2", "back_odds": "N/A", "back_amount": "N/A", "lay_odds": "4.0", "lay_amount": 25}
        ])
    }

    #[test]
    fn test_parse_orbitx_lines() {
        let contents = format!(
            "{}\n\n{}\n",
            line("Levski Sofia", "CSKA Sofia", json!(63), full_outcomes()),
            line("Arsenal", "Chelsea", json!(null), json!([])),
        );
        let records = OrbitXAdapter.parse_snapshot(&contents).unwrap();
        assert_eq!(records.len(), 2);

        let levski = &records[0];
        assert_eq!(levski.source, SourceId::OrbitX);
        assert_eq!(levski.minutes_elapsed, 63);
        assert!(levski.market.is_back_lay());

        let home_lay = levski.market.lay_level(Outcome::Home).unwrap();
        assert_eq!(home_lay.price.decimal(), Some(dec!(2.14)));
        assert_eq!(home_lay.size, "90");
        assert!(levski.market.lay_level(Outcome::Draw).is_none());
        assert!(levski.market.back_price(Outcome::Away).is_none());
        assert_eq!(levski.market.lay_level(Outcome::Away).unwrap().size, "25");

        // minutes fall back to time_str
        assert_eq!(records[1].minutes_elapsed, 63);
    }

    #[test]
    fn test_bad_lines_are_dropped() {
        let contents = format!(
            "not json\n{}\n{}",
            line("Levski Sofia", "", json!(10), full_outcomes()),
            line("Arsenal", "Chelsea", json!(12), full_outcomes()),
        );
        let records = OrbitXAdapter.parse_snapshot(&contents).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].teams[0], "Arsenal");
    }

    #[test]
    fn test_unknown_outcome_skipped() {
        let outcomes = exchange_outcomes(&[RawOutcome {
            outcome: "Over 2.5".into(),
            back_odds: json!("1.9"),
            back_amount: json!("10"),
            lay_odds: json!("1.95"),
            lay_amount: json!("10"),
        }]);
        assert!(outcomes.iter().all(|o| o.back.is_none() && o.lay.is_none()));
    }

    #[test]
    fn test_empty_snapshot() {
        assert!(OrbitXAdapter.parse_snapshot("").unwrap().is_empty());
    }
}
