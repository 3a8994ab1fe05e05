//! Score derivation and reconciliation against the game event log.
//!
//! At finalization the event log is the ground truth: whatever score the
//! tracking UI accumulated live is overridden by what the log can prove
//! happened, and the caller is told about the disagreement via `mismatch`.

use super::{LogEntry, StatDelta};

/// Home/away score pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Score {
    /// Points credited to our team.
    pub home: i64,
    /// Points credited to the opponent.
    pub away: i64,
}

/// Outcome of arbitrating a requested final score against the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconciledScore {
    /// The score to persist: the requested one when it matches the log, the
    /// derived one otherwise.
    pub score: Score,
    /// True when the requested score disagreed with the log on either side.
    pub mismatch: bool,
    /// The score replayed from the log, always reported for transparency.
    pub derived: Score,
}

/// Closed, sport-agnostic allowlist of stat keys that count toward the
/// score. Extending it for a new sport's scoring vocabulary is a reviewable
/// decision, not a configuration knob.
fn is_points_key(stat_key: &str) -> bool {
    stat_key.eq_ignore_ascii_case("PTS")
        || stat_key.eq_ignore_ascii_case("POINTS")
        || stat_key.eq_ignore_ascii_case("GOALS")
}

/// Fold one stat delta into a running score. Non-scoring stats leave the
/// score untouched; negative deltas (corrections) are folded as-is. The
/// live tracker uses this for its incremental score, so live and derived
/// totals go through the same allowlist.
pub fn apply_stat_to_score(mut score: Score, stat: &StatDelta) -> Score {
    if !is_points_key(&stat.stat_key) {
        return score;
    }
    if stat.is_opponent {
        score.away += stat.value;
    } else {
        score.home += stat.value;
    }
    score
}

/// Replay every points-like stat entry of the log into a home/away total.
/// Non-stat entries and non-scoring stats (fouls, assists, ...) contribute
/// nothing.
pub fn derive_score_from_log(log: &[LogEntry]) -> Score {
    log.iter()
        .filter_map(|entry| entry.stat.as_ref())
        .fold(Score::default(), |totals, stat| {
            apply_stat_to_score(totals, stat)
        })
}

/// Number of points-like entries with a nonzero delta.
fn count_scoring_events(log: &[LogEntry]) -> usize {
    log.iter()
        .filter_map(|entry| entry.stat.as_ref())
        .filter(|stat| is_points_key(&stat.stat_key) && stat.value != 0)
        .count()
}

/// Whether the log is a trustworthy basis for finalizing with `live`.
///
/// Requires both a nonzero scoring entry somewhere in the log and exact
/// agreement with the live score on both sides. A log without any scoring
/// event is never trusted, even against a live 0-0: it more likely means the
/// log was never populated than that a scoreless game was faithfully
/// recorded.
pub fn can_trust_score_log(live: Score, log: &[LogEntry]) -> bool {
    let derived = derive_score_from_log(log);
    count_scoring_events(log) > 0 && derived == live
}

/// Arbitrate the requested final score against the log-derived one. On any
/// disagreement the derived score wins and `mismatch` is raised.
pub fn reconcile_final_score(requested: Score, log: &[LogEntry]) -> ReconciledScore {
    let derived = derive_score_from_log(log);
    let mismatch = requested != derived;

    ReconciledScore {
        score: if mismatch { derived } else { requested },
        mismatch,
        derived,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_keys_match_case_insensitively() {
        for key in ["PTS", "pts", "Points", "GOALS", "goals"] {
            assert!(is_points_key(key), "{key} should count toward the score");
        }
        for key in ["fouls", "AST", "REB", "score", "PT", ""] {
            assert!(!is_points_key(key), "{key} must not count");
        }
    }

    #[test]
    fn derive_folds_only_points_like_entries() {
        let log = vec![
            LogEntry::stat("PTS", 2, false),
            LogEntry::stat("fouls", 1, false),
            LogEntry::stat("goals", 1, true),
            LogEntry::stat("AST", 3, false),
            LogEntry::default(),
        ];

        assert_eq!(derive_score_from_log(&log), Score { home: 2, away: 1 });
    }

    #[test]
    fn derive_keeps_negative_corrections() {
        let log = vec![
            LogEntry::stat("PTS", 3, false),
            LogEntry::stat("PTS", -2, false),
            LogEntry::stat("POINTS", 2, true),
        ];

        assert_eq!(derive_score_from_log(&log), Score { home: 1, away: 2 });
    }

    #[test]
    fn derive_is_order_independent() {
        let mut log = vec![
            LogEntry::stat("PTS", 2, false),
            LogEntry::stat("fouls", 1, true),
            LogEntry::stat("GOALS", 1, true),
            LogEntry::stat("PTS", 3, false),
        ];
        let forward = derive_score_from_log(&log);
        log.reverse();
        assert_eq!(derive_score_from_log(&log), forward);
    }

    #[test]
    fn empty_or_scoreless_log_is_never_trusted() {
        assert!(!can_trust_score_log(Score::default(), &[]));

        let no_scoring = vec![
            LogEntry::stat("fouls", 1, false),
            LogEntry::stat("PTS", 0, false),
        ];
        assert!(!can_trust_score_log(Score::default(), &no_scoring));
    }

    #[test]
    fn trust_requires_exact_agreement() {
        let log = vec![
            LogEntry::stat("PTS", 2, false),
            LogEntry::stat("PTS", 3, true),
        ];

        assert!(can_trust_score_log(Score { home: 2, away: 3 }, &log));
        assert!(!can_trust_score_log(Score { home: 2, away: 2 }, &log));
        assert!(!can_trust_score_log(Score { home: 3, away: 3 }, &log));
    }

    #[test]
    fn reconcile_overrides_a_drifted_request_with_the_derived_score() {
        let log = vec![
            LogEntry::stat("PTS", 2, false),
            LogEntry::stat("PTS", 3, false),
            LogEntry::stat("POINTS", 2, true),
            LogEntry::stat("fouls", 1, false),
        ];

        let outcome = reconcile_final_score(Score { home: 4, away: 1 }, &log);
        assert!(outcome.mismatch);
        assert_eq!(outcome.score, Score { home: 5, away: 2 });
        assert_eq!(outcome.derived, Score { home: 5, away: 2 });
    }

    #[test]
    fn reconcile_keeps_a_matching_request() {
        let log = vec![
            LogEntry::stat("GOALS", 1, false),
            LogEntry::stat("GOALS", 2, true),
        ];

        let outcome = reconcile_final_score(Score { home: 1, away: 2 }, &log);
        assert!(!outcome.mismatch);
        assert_eq!(outcome.score, Score { home: 1, away: 2 });
    }
}
