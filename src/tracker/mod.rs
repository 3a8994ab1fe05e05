//! Pure live-tracking core: lineup integrity, score reconciliation from the
//! event log, clock resumption, and opponent stat hydration.
//!
//! Everything in this module is synchronous, performs no I/O, and never
//! panics on malformed input. Missing or corrupted fields degrade to safe
//! defaults so a partially-synced log entry cannot take down a tracking
//! session; invalid operations are reported through flags (`applied`,
//! `mismatch`, `restored`) rather than errors.

pub mod lineup;
pub mod opponent;
pub mod resume;
pub mod score;

/// One entry of a game's append-only event log, reduced to the fields the
/// reconciliation core cares about. Entries retain their insertion order in
/// the slice they are handed over in; that order is the tiebreak of last
/// resort when timestamps are missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogEntry {
    /// Game segment label the event occurred in (`"Q1"`, `"OT2"`, ...).
    pub period: Option<String>,
    /// Milliseconds on the game clock at the moment of the event.
    pub game_clock_ms: Option<i64>,
    /// Server-assigned timestamp in epoch milliseconds. Entries recorded
    /// offline lack one until they sync.
    pub created_at_ms: Option<i64>,
    /// Reversible stat effect of the action, when the action was a stat.
    pub stat: Option<StatDelta>,
}

/// The reversible stat payload carried by a log entry of kind `stat`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatDelta {
    /// Free-form stat label (`"PTS"`, `"goals"`, `"fouls"`, ...).
    pub stat_key: String,
    /// Signed delta applied to the counter. Negative deltas are legitimate
    /// corrections and must survive the fold.
    pub value: i64,
    /// Player credited with the stat, absent for opponent entries.
    pub player_id: Option<String>,
    /// True when the event credits the opposing team.
    pub is_opponent: bool,
}

impl LogEntry {
    /// Shorthand for a stat-only entry, used heavily by the tests.
    #[cfg(test)]
    pub(crate) fn stat(stat_key: &str, value: i64, is_opponent: bool) -> Self {
        Self {
            stat: Some(StatDelta {
                stat_key: stat_key.to_owned(),
                value,
                player_id: None,
                is_opponent,
            }),
            ..Self::default()
        }
    }
}
