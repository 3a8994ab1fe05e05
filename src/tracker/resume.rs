//! Clock/period resumption from a partially-ordered, partially-timestamped
//! event stream.
//!
//! A scorekeeper who reloads mid-game hands the whole event log to
//! [`derive_resume_clock_state`] and gets back the most advanced known
//! period/clock pair. Entries written while offline carry no server
//! timestamp, so recency cannot always be read off `created_at_ms`; the
//! resolver falls back to content-derived "progress order" where needed.

use std::cmp::Ordering;

use super::LogEntry;

/// A period/clock pair, also used as the resume defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockState {
    /// Period label, e.g. `"Q1"`.
    pub period: String,
    /// Milliseconds on the game clock.
    pub clock_ms: i64,
}

impl Default for ClockState {
    fn default() -> Self {
        Self {
            period: "Q1".to_owned(),
            clock_ms: 0,
        }
    }
}

/// The resolver's verdict: where to resume and whether anything usable was
/// found in the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeState {
    /// Period label to resume in.
    pub period: String,
    /// Game clock to resume at, in milliseconds.
    pub clock_ms: i64,
    /// False when the defaults were returned because no event carried a
    /// usable period and clock.
    pub restored: bool,
}

/// A log entry that carries everything needed to rank it.
#[derive(Debug, Clone)]
struct Candidate<'a> {
    period: &'a str,
    clock_ms: i64,
    created_at_ms: Option<i64>,
    order: usize,
}

/// Rank a period label: `Q<n>` ranks `n`, overtime (`OT`, `OT2`, `OT-2`,
/// `OT 2`) ranks `100 + n` defaulting `n = 1`, anything unrecognized ranks
/// 0 and is therefore judged least advanced.
fn period_rank(label: &str) -> i64 {
    let value = label.trim().to_ascii_uppercase();

    if let Some(digits) = value.strip_prefix('Q')
        && !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
    {
        return digits.parse().unwrap_or(0);
    }

    if let Some(rest) = value.strip_prefix("OT") {
        // Separator is either a run of whitespace or a single dash.
        let digits = match rest.strip_prefix('-') {
            Some(after_dash) => after_dash,
            None => rest.trim_start(),
        };
        if digits.is_empty() {
            return 101;
        }
        if digits.bytes().all(|b| b.is_ascii_digit()) {
            return 100 + digits.parse::<i64>().unwrap_or(1);
        }
    }

    0
}

/// Total "progress order" over candidates: period rank, then clock, then
/// insertion order. Greatest means most advanced.
fn progress_order(a: &Candidate<'_>, b: &Candidate<'_>) -> Ordering {
    progress_key(a).cmp(&progress_key(b)).then(a.order.cmp(&b.order))
}

/// The content-only part of progress order, without the insertion-index
/// tiebreak. Used for the mixed-branch comparison, where a genuine tie goes
/// to the untimestamped side regardless of where the entries sit in the log.
fn progress_key(candidate: &Candidate<'_>) -> (i64, i64) {
    (period_rank(candidate.period), candidate.clock_ms)
}

/// Reconstruct the most advanced known clock state from `events`.
///
/// The branch on timestamp availability is deliberately explicit:
/// - every candidate timestamped: latest timestamp wins (ties broken by
///   insertion order), since the server clock is the most reliable recency
///   signal when it covers the whole set;
/// - no candidate timestamped: the most advanced candidate under progress
///   order wins, recency being otherwise unknowable;
/// - mixed: the latest timestamped candidate competes against the most
///   advanced untimestamped one under progress order, and the untimestamped
///   side wins ties — an offline entry may well describe later game state
///   than the last synced one.
pub fn derive_resume_clock_state(events: &[LogEntry], defaults: &ClockState) -> ResumeState {
    let candidates: Vec<Candidate<'_>> = events
        .iter()
        .enumerate()
        .filter_map(|(order, event)| {
            let period = event.period.as_deref().filter(|p| !p.is_empty())?;
            let clock_ms = event.game_clock_ms.filter(|clock| *clock >= 0)?;
            Some(Candidate {
                period,
                clock_ms,
                created_at_ms: event.created_at_ms,
                order,
            })
        })
        .collect();

    if candidates.is_empty() {
        return ResumeState {
            period: defaults.period.clone(),
            clock_ms: defaults.clock_ms,
            restored: false,
        };
    }

    let latest_timestamped = candidates
        .iter()
        .filter(|candidate| candidate.created_at_ms.is_some())
        .max_by(|a, b| {
            a.created_at_ms
                .cmp(&b.created_at_ms)
                .then(a.order.cmp(&b.order))
        });
    let furthest_untimestamped = candidates
        .iter()
        .filter(|candidate| candidate.created_at_ms.is_none())
        .max_by(|a, b| progress_order(a, b));

    let chosen = match (latest_timestamped, furthest_untimestamped) {
        (Some(timestamped), None) => timestamped,
        (None, Some(untimestamped)) => untimestamped,
        (Some(timestamped), Some(untimestamped)) => {
            if progress_key(untimestamped) >= progress_key(timestamped) {
                untimestamped
            } else {
                timestamped
            }
        }
        // Unreachable with a non-empty candidate list; fall back to the
        // defaults rather than panic.
        (None, None) => {
            return ResumeState {
                period: defaults.period.clone(),
                clock_ms: defaults.clock_ms,
                restored: false,
            };
        }
    };

    ResumeState {
        period: chosen.period.to_owned(),
        clock_ms: chosen.clock_ms,
        restored: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(period: &str, clock_ms: i64, created_at_ms: Option<i64>) -> LogEntry {
        LogEntry {
            period: Some(period.to_owned()),
            game_clock_ms: Some(clock_ms),
            created_at_ms,
            stat: None,
        }
    }

    #[test]
    fn period_ranks() {
        assert_eq!(period_rank("Q1"), 1);
        assert_eq!(period_rank("q4"), 4);
        assert_eq!(period_rank(" Q2 "), 2);
        assert_eq!(period_rank("OT"), 101);
        assert_eq!(period_rank("OT2"), 102);
        assert_eq!(period_rank("OT-3"), 103);
        assert_eq!(period_rank("OT 2"), 102);
        assert_eq!(period_rank("H1"), 0);
        assert_eq!(period_rank("Q"), 0);
        assert_eq!(period_rank("QX"), 0);
        assert_eq!(period_rank(""), 0);
    }

    #[test]
    fn empty_stream_returns_defaults_unrestored() {
        let state = derive_resume_clock_state(&[], &ClockState::default());
        assert_eq!(
            state,
            ResumeState {
                period: "Q1".to_owned(),
                clock_ms: 0,
                restored: false
            }
        );
    }

    #[test]
    fn events_without_period_or_clock_are_not_candidates() {
        let events = vec![
            LogEntry {
                period: Some("Q2".to_owned()),
                game_clock_ms: None,
                ..LogEntry::default()
            },
            LogEntry {
                period: None,
                game_clock_ms: Some(30_000),
                ..LogEntry::default()
            },
            LogEntry {
                period: Some("Q2".to_owned()),
                game_clock_ms: Some(-5),
                ..LogEntry::default()
            },
        ];

        let defaults = ClockState {
            period: "Q3".to_owned(),
            clock_ms: 7_000,
        };
        let state = derive_resume_clock_state(&events, &defaults);
        assert!(!state.restored);
        assert_eq!(state.period, "Q3");
        assert_eq!(state.clock_ms, 7_000);
    }

    #[test]
    fn all_timestamped_latest_timestamp_wins() {
        let events = vec![
            event("Q3", 120_000, Some(1_000)),
            event("Q2", 45_000, Some(900)),
            event("Q3", 150_000, Some(1_100)),
        ];

        let state = derive_resume_clock_state(&events, &ClockState::default());
        assert_eq!(
            state,
            ResumeState {
                period: "Q3".to_owned(),
                clock_ms: 150_000,
                restored: true
            }
        );
    }

    #[test]
    fn equal_timestamps_break_on_insertion_order() {
        let events = vec![event("Q1", 10_000, Some(500)), event("Q1", 20_000, Some(500))];

        let state = derive_resume_clock_state(&events, &ClockState::default());
        assert_eq!(state.clock_ms, 20_000);
    }

    #[test]
    fn untimestamped_stream_uses_progress_order() {
        let events = vec![
            event("Q1", 30_000, None),
            event("Q2", 10_000, None),
            event("Q1", 45_000, None),
        ];

        let state = derive_resume_clock_state(&events, &ClockState::default());
        assert_eq!(
            state,
            ResumeState {
                period: "Q2".to_owned(),
                clock_ms: 10_000,
                restored: true
            }
        );
    }

    #[test]
    fn overtime_outranks_any_quarter() {
        let events = vec![event("Q4", 600_000, None), event("OT", 1_000, None)];

        let state = derive_resume_clock_state(&events, &ClockState::default());
        assert_eq!(state.period, "OT");
    }

    #[test]
    fn mixed_stream_lets_a_further_offline_entry_beat_the_timestamped_one() {
        let events = vec![
            event("Q2", 300_000, Some(2_000)),
            // Recorded offline after the disconnect, so no timestamp, but
            // clearly later in the game.
            event("Q3", 60_000, None),
        ];

        let state = derive_resume_clock_state(&events, &ClockState::default());
        assert_eq!(
            state,
            ResumeState {
                period: "Q3".to_owned(),
                clock_ms: 60_000,
                restored: true
            }
        );
    }

    #[test]
    fn mixed_stream_keeps_the_timestamped_entry_when_it_is_further() {
        let events = vec![event("Q3", 60_000, None), event("Q4", 10_000, Some(2_000))];

        let state = derive_resume_clock_state(&events, &ClockState::default());
        assert_eq!(state.period, "Q4");
        assert_eq!(state.clock_ms, 10_000);
    }

    #[test]
    fn mixed_stream_ties_go_to_the_untimestamped_side() {
        // Identical period and clock: the offline entry wins the tie even
        // though it sits earlier in the log.
        let events = vec![event("Q2", 30_000, None), event("Q2", 30_000, Some(1_000))];

        let state = derive_resume_clock_state(&events, &ClockState::default());
        assert_eq!(state.period, "Q2");
        assert_eq!(state.clock_ms, 30_000);
    }

    #[test]
    fn unrecognized_period_labels_rank_lowest() {
        let events = vec![event("H2", 40_000, None), event("Q1", 1_000, None)];

        let state = derive_resume_clock_state(&events, &ClockState::default());
        assert_eq!(state.period, "Q1");
    }
}
