//! Shared types for the ARBWATCH engine.
//!
//! These types form the data model used across all modules: the
//! per-source normalized record, the cross-source merged entry, and the
//! market shapes (bookmaker 1X2 prices vs. exchange back/lay ladders).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::normalize::names::normalize_team_name;

/// Display text used for any missing value (price, score).
pub const NOT_AVAILABLE: &str = "N/A";

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// The external sites feeding the engine.
///
/// Declaration order is the fixed source-priority order used when a merged
/// entry needs a single representative (display teams, score).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceId {
    WinBet,
    Betano,
    Efbet,
    OrbitX,
}

impl SourceId {
    /// All known sources in priority order.
    pub const ALL: &'static [SourceId] = &[
        SourceId::WinBet,
        SourceId::Betano,
        SourceId::Efbet,
        SourceId::OrbitX,
    ];

    /// Bookmakers offering back prices only.
    pub const BACK_ONLY: &'static [SourceId] =
        &[SourceId::WinBet, SourceId::Betano, SourceId::Efbet];

    /// The exchange providing lay prices.
    pub const EXCHANGE: SourceId = SourceId::OrbitX;

    pub fn is_exchange(&self) -> bool {
        *self == Self::EXCHANGE
    }

    /// Lowercase identifier used in config sections and JSON.
    pub fn key(&self) -> &'static str {
        match self {
            SourceId::WinBet => "winbet",
            SourceId::Betano => "betano",
            SourceId::Efbet => "efbet",
            SourceId::OrbitX => "orbitx",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceId::WinBet => write!(f, "WinBet"),
            SourceId::Betano => write!(f, "Betano"),
            SourceId::Efbet => write!(f, "Efbet"),
            SourceId::OrbitX => write!(f, "OrbitX"),
        }
    }
}

impl FromStr for SourceId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "winbet" | "wb" => Ok(SourceId::WinBet),
            "betano" | "bt" => Ok(SourceId::Betano),
            "efbet" | "ef" => Ok(SourceId::Efbet),
            "orbitx" | "orbit" => Ok(SourceId::OrbitX),
            _ => Err(anyhow::anyhow!("Unknown source: {s}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Outcomes & prices
// ---------------------------------------------------------------------------

/// Full-time result outcome of a soccer match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Home,
    Draw,
    Away,
}

impl Outcome {
    pub const ALL: &'static [Outcome] = &[Outcome::Home, Outcome::Draw, Outcome::Away];

    /// Position in a 1X2 price triple.
    pub fn index(&self) -> usize {
        match self {
            Outcome::Home => 0,
            Outcome::Draw => 1,
            Outcome::Away => 2,
        }
    }

    /// Conventional 1X2 label.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Home => "1",
            Outcome::Draw => "X",
            Outcome::Away => "2",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Outcome {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" | "home" => Ok(Outcome::Home),
            "x" | "draw" => Ok(Outcome::Draw),
            "2" | "away" => Ok(Outcome::Away),
            _ => Err(anyhow::anyhow!("Unknown outcome: {s}")),
        }
    }
}

/// A price exactly as the site displayed it.
///
/// Kept as text so the board can show what the site showed; use
/// [`OddsText::decimal`] for arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OddsText(String);

impl OddsText {
    pub fn new(text: impl AsRef<str>) -> Self {
        let trimmed = text.as_ref().trim();
        if trimmed.is_empty() {
            Self::missing()
        } else {
            Self(trimmed.to_string())
        }
    }

    pub fn missing() -> Self {
        Self(NOT_AVAILABLE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric decimal odds, if the text is a positive number.
    pub fn decimal(&self) -> Option<Decimal> {
        Decimal::from_str(self.0.trim())
            .ok()
            .filter(|d| *d > Decimal::ZERO)
    }

    pub fn is_available(&self) -> bool {
        self.decimal().is_some()
    }
}

impl Default for OddsText {
    fn default() -> Self {
        Self::missing()
    }
}

impl fmt::Display for OddsText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One side of an exchange ladder: best price plus the stake available at it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: OddsText,
    pub size: String,
}

/// Exchange quotes for one outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeOutcome {
    pub back: Option<PriceLevel>,
    pub lay: Option<PriceLevel>,
}

/// The two market shapes the sources produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Market {
    /// Bookmaker 1X2 back prices, ordered Home, Draw, Away.
    BackOnly { prices: [OddsText; 3] },
    /// Exchange back/lay quotes per outcome, ordered Home, Draw, Away.
    BackLay { outcomes: [ExchangeOutcome; 3] },
}

impl Market {
    pub fn back_only(home: OddsText, draw: OddsText, away: OddsText) -> Self {
        Market::BackOnly { prices: [home, draw, away] }
    }

    /// Back price offered for an outcome, if the market quotes one.
    pub fn back_price(&self, outcome: Outcome) -> Option<&OddsText> {
        match self {
            Market::BackOnly { prices } => Some(&prices[outcome.index()]),
            Market::BackLay { outcomes } => {
                outcomes[outcome.index()].back.as_ref().map(|l| &l.price)
            }
        }
    }

    /// Lay quote for an outcome. Only exchange markets carry one.
    pub fn lay_level(&self, outcome: Outcome) -> Option<&PriceLevel> {
        match self {
            Market::BackOnly { .. } => None,
            Market::BackLay { outcomes } => outcomes[outcome.index()].lay.as_ref(),
        }
    }

    pub fn is_back_lay(&self) -> bool {
        matches!(self, Market::BackLay { .. })
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Source-independent identity of a match: the two normalized team names,
/// sorted so that home/away order does not matter.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CanonicalKey(String, String);

impl CanonicalKey {
    pub fn from_teams(first: &str, second: &str) -> Self {
        let a = normalize_team_name(first);
        let b = normalize_team_name(second);
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }

    pub fn tokens(&self) -> (&str, &str) {
        (&self.0, &self.1)
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {}", self.0, self.1)
    }
}

/// One source's view of one match for one poll cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub source: SourceId,
    /// Display names as the site printed them.
    pub teams: [String; 2],
    pub canonical_key: CanonicalKey,
    pub minutes_elapsed: u32,
    pub score: String,
    pub market: Market,
}

impl NormalizedRecord {
    /// Build a record, rejecting anything that does not name exactly two teams.
    pub fn new(
        source: SourceId,
        teams: Vec<String>,
        minutes_elapsed: u32,
        score: Option<String>,
        market: Market,
    ) -> Result<Self, ArbwatchError> {
        let teams: [String; 2] = teams.try_into().map_err(|t: Vec<String>| {
            ArbwatchError::MalformedRecord(format!(
                "{source}: expected 2 teams, got {}",
                t.len()
            ))
        })?;

        let canonical_key = CanonicalKey::from_teams(&teams[0], &teams[1]);
        let score = score
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        Ok(Self {
            source,
            teams,
            canonical_key,
            minutes_elapsed,
            score,
            market,
        })
    }

    pub fn has_score(&self) -> bool {
        self.score != NOT_AVAILABLE
    }
}

impl fmt::Display for NormalizedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} vs {} ({}') {}",
            self.source, self.teams[0], self.teams[1], self.minutes_elapsed, self.score,
        )
    }
}

// ---------------------------------------------------------------------------
// Merged entries
// ---------------------------------------------------------------------------

/// Display/sort group of a merged entry, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PriorityClass {
    HasExchange,
    AllProviders,
    TwoProviders,
    SingleProvider,
}

impl PriorityClass {
    pub const ALL: &'static [PriorityClass] = &[
        PriorityClass::HasExchange,
        PriorityClass::AllProviders,
        PriorityClass::TwoProviders,
        PriorityClass::SingleProvider,
    ];
}

impl fmt::Display for PriorityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriorityClass::HasExchange => write!(f, "Exchange"),
            PriorityClass::AllProviders => write!(f, "All providers"),
            PriorityClass::TwoProviders => write!(f, "Two providers"),
            PriorityClass::SingleProvider => write!(f, "Single provider"),
        }
    }
}

/// Every source's record for one canonical key in one cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedEntry {
    pub canonical_key: CanonicalKey,
    /// Keyed by source; iteration follows source-priority order.
    pub members: BTreeMap<SourceId, NormalizedRecord>,
    /// Most advanced clock among members.
    pub minutes_elapsed: u32,
    /// Number of back-only sources contributing.
    pub provider_count: usize,
    pub priority_class: PriorityClass,
    pub display_teams: [String; 2],
}

impl MergedEntry {
    pub fn member(&self, source: SourceId) -> Option<&NormalizedRecord> {
        self.members.get(&source)
    }

    pub fn exchange(&self) -> Option<&NormalizedRecord> {
        self.member(SourceId::EXCHANGE)
    }

    pub fn back_only_members(&self) -> impl Iterator<Item = &NormalizedRecord> {
        self.members.values().filter(|r| !r.source.is_exchange())
    }

    /// First known score in source-priority order.
    pub fn score(&self) -> &str {
        self.members
            .values()
            .find(|r| r.has_score())
            .map(|r| r.score.as_str())
            .unwrap_or(NOT_AVAILABLE)
    }
}

impl fmt::Display for MergedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sources: Vec<String> = self.members.keys().map(|s| s.to_string()).collect();
        write!(
            f,
            "{} vs {} ({}') [{}] via {}",
            self.display_teams[0],
            self.display_teams[1],
            self.minutes_elapsed,
            self.priority_class,
            sources.join(", "),
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for ARBWATCH.
#[derive(Debug, thiserror::Error)]
pub enum ArbwatchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Source unavailable ({source_id}): {message}")]
    SourceUnavailable { source_id: SourceId, message: String },

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
