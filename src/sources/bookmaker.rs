//! WinBet and Betano snapshots.
//!
//! Both scrapers write a JSON array of live matches with a two-element
//! `teams` list and a 1X2 `odds` list:
//!
//! ```json
//! [{"teams": ["Levski", "CSKA"], "score": "1-0", "time": "34:12",
//!   "minutes": 34, "odds": ["1.90", "3.20", "4.50"]}]
//! ```
//!
//! Betano names the clock field `time_str`.

use anyhow::Result;
use serde::Deserialize;
use serde_json::Value;

use super::{minutes_from_fields, odds_triple, parse_json_array, score_text, RecordAdapter};
use crate::types::{Market, NormalizedRecord, SourceId};

#[derive(Debug, Deserialize)]
struct RawListing {
    #[serde(default)]
    teams: Vec<String>,
    #[serde(default)]
    score: Option<String>,
    #[serde(default, alias = "time_str")]
    time: Option<String>,
    #[serde(default)]
    minutes: Option<Value>,
    #[serde(default)]
    odds: Vec<Value>,
}

/// Adapter for list-shaped bookmaker snapshots.
pub struct BookmakerAdapter {
    source: SourceId,
}

impl BookmakerAdapter {
    pub fn new(source: SourceId) -> Self {
        Self { source }
    }

    fn convert(&self, item: Value) -> Result<NormalizedRecord> {
        let raw: RawListing = serde_json::from_value(item)?;
        let minutes = minutes_from_fields(raw.minutes.as_ref(), raw.time.as_deref());
        let [home, draw, away] = odds_triple(&raw.odds);

        let record = NormalizedRecord::new(
            self.source,
            raw.teams,
            minutes,
            score_text(raw.score),
            Market::back_only(home, draw, away),
        )?;
        Ok(record)
    }
}

impl RecordAdapter for BookmakerAdapter {
    fn source(&self) -> SourceId {
        self.source
    }

    fn parse_snapshot(&self, contents: &str) -> Result<Vec<NormalizedRecord>> {
        parse_json_array(self.source, contents, |item| self.convert(item))
    }
}
