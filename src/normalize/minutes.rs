//! Match clock parsing.
//!
//! Sites print elapsed time as "67'", "23:41", "HT", "Half Time",
//! "Полувреме" or "45+2". Everything here returns whole minutes and
//! falls back to `0` (unknown) instead of failing.

use regex::Regex;
use std::sync::LazyLock;

/// Minutes reported while the teams are in the dressing room.
pub const HALF_TIME_MINUTES: u32 = 45;

static RE_CLOCK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([0-9]+):[0-9]+").unwrap());
static RE_DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]+").unwrap());

/// Single tokens that mark the half-time break.
const BREAK_TOKENS: &[&str] = &["ht", "halftime", "полувреме"];

/// Two-token spellings of the break ("half time", "half-time").
const BREAK_PAIRS: &[[&str; 2]] = &[["half", "time"]];

/// Whether the clock text shows the break. "2nd half 67'" is a running
/// clock, so only whole marker tokens count.
fn is_break(lower: &str) -> bool {
    let tokens: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();

    tokens.iter().any(|t| BREAK_TOKENS.contains(t))
        || tokens
            .windows(2)
            .any(|w| BREAK_PAIRS.iter().any(|pair| pair[0] == w[0] && pair[1] == w[1]))
}

/// Parse a displayed match clock into elapsed minutes.
///
/// Priority: half-time marker (45), then `mm:ss` (minutes part), then the
/// first run of digits, else 0.
pub fn minutes_from_text(text: &str) -> u32 {
    let lower = text.trim().to_lowercase();

    if is_break(&lower) {
        return HALF_TIME_MINUTES;
    }

    if let Some(caps) = RE_CLOCK.captures(&lower) {
        return caps[1].parse().unwrap_or(0);
    }

    RE_DIGITS
        .find(&lower)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Parse a minute value that may carry stoppage time ("45+2" → 47).
///
/// Parts are split on `+` and summed; an empty part counts as 0. Anything
/// else that is not a plain number yields 0.
pub fn minutes_with_stoppage(text: &str) -> u32 {
    let text = text.trim().trim_matches('\'');

    let part = |p: &str| -> Option<u32> {
        let p = p.trim().trim_matches('\'');
        if p.is_empty() {
            Some(0)
        } else {
            p.parse().ok()
        }
    };

    if !text.contains('+') {
        return text.parse().unwrap_or(0);
    }

    text.split('+')
        .try_fold(0u32, |total, p| total.checked_add(part(p)?))
        .unwrap_or(0)
}
