//! Text normalization for cross-source matching.
//!
//! Sites spell the same club differently and print the match clock in
//! different formats. These helpers reduce both to comparable values and
//! never fail: unparseable input degrades to `""` or `0`.

pub mod names;
pub mod minutes;

pub use minutes::{minutes_from_text, minutes_with_stoppage};
pub use names::normalize_team_name;
