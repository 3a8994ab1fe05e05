//! Substitution validation for the active lineup.
//!
//! Substitutions come in fast during live play, so an illegal swap (self
//! substitution, duplicate on court, unknown outgoing player) is rejected by
//! returning the lineup unchanged with `applied == false` instead of an
//! error; the tracking UI keeps rendering without branching on failures.

/// The two halves of a rostered lineup during live tracking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lineup {
    /// Active players, in court position order.
    pub on_court: Vec<String>,
    /// Everyone currently not playing.
    pub bench: Vec<String>,
}

/// Result of attempting a substitution. On rejection `lineup` is the input
/// lineup, untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstitutionOutcome {
    /// Whether the swap was committed.
    pub applied: bool,
    /// The resulting (or preserved) lineup.
    pub lineup: Lineup,
}

/// True iff no player id repeats in `ids`.
pub fn has_unique_player_ids(ids: &[String]) -> bool {
    let mut seen = std::collections::HashSet::with_capacity(ids.len());
    ids.iter().all(|id| seen.insert(id.as_str()))
}

/// A substitution is valid iff both ids are non-empty and distinct, the
/// outgoing player is on court, and the incoming player is not. There is no
/// bench-membership requirement: callers may bring in a player the bench
/// list does not track.
pub fn can_apply_substitution(on_court: &[String], out_id: &str, in_id: &str) -> bool {
    if out_id.is_empty() || in_id.is_empty() {
        return false;
    }
    if out_id == in_id {
        return false;
    }
    if !on_court.iter().any(|id| id == out_id) {
        return false;
    }
    !on_court.iter().any(|id| id == in_id)
}

/// Swap `out_id` for `in_id`, preserving the outgoing player's court
/// position. The incoming player is removed from the bench when present and
/// the outgoing player is appended to it.
///
/// After the swap the resulting on-court list is checked for uniqueness a
/// second time; a caller-supplied lineup that already carried an undetected
/// duplicate is rejected here rather than committed.
pub fn apply_substitution(lineup: &Lineup, out_id: &str, in_id: &str) -> SubstitutionOutcome {
    if !can_apply_substitution(&lineup.on_court, out_id, in_id) {
        return SubstitutionOutcome {
            applied: false,
            lineup: lineup.clone(),
        };
    }

    let mut next_on_court = lineup.on_court.clone();
    if let Some(slot) = next_on_court.iter_mut().find(|id| *id == out_id) {
        *slot = in_id.to_owned();
    }

    if !has_unique_player_ids(&next_on_court) {
        return SubstitutionOutcome {
            applied: false,
            lineup: lineup.clone(),
        };
    }

    let mut next_bench: Vec<String> = lineup
        .bench
        .iter()
        .filter(|id| *id != in_id && *id != out_id)
        .cloned()
        .collect();
    next_bench.push(out_id.to_owned());

    SubstitutionOutcome {
        applied: true,
        lineup: Lineup {
            on_court: next_on_court,
            bench: next_bench,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_owned()).collect()
    }

    fn lineup(on_court: &[&str], bench: &[&str]) -> Lineup {
        Lineup {
            on_court: ids(on_court),
            bench: ids(bench),
        }
    }

    #[test]
    fn unique_ids_detects_duplicates() {
        assert!(has_unique_player_ids(&ids(&["p1", "p2", "p3"])));
        assert!(has_unique_player_ids(&[]));
        assert!(!has_unique_player_ids(&ids(&["p1", "p2", "p1"])));
    }

    #[test]
    fn self_substitution_is_rejected_for_every_id() {
        let court = ids(&["p1", "p2", "p3"]);
        for id in ["p1", "p2", "p3", "p9", ""] {
            assert!(!can_apply_substitution(&court, id, id));
        }
    }

    #[test]
    fn validation_requires_out_on_court_and_in_off_court() {
        let court = ids(&["p1", "p2"]);
        assert!(can_apply_substitution(&court, "p1", "p5"));
        assert!(!can_apply_substitution(&court, "p5", "p6"));
        assert!(!can_apply_substitution(&court, "p1", "p2"));
        assert!(!can_apply_substitution(&court, "", "p5"));
        assert!(!can_apply_substitution(&court, "p1", ""));
    }

    #[test]
    fn applied_swap_preserves_position_and_moves_benches() {
        let before = lineup(&["p1", "p2", "p3"], &["p4", "p5"]);
        let outcome = apply_substitution(&before, "p2", "p4");

        assert!(outcome.applied);
        assert_eq!(outcome.lineup.on_court, ids(&["p1", "p4", "p3"]));
        assert_eq!(outcome.lineup.bench, ids(&["p5", "p2"]));
    }

    #[test]
    fn incoming_player_missing_from_bench_is_fine() {
        let before = lineup(&["p1", "p2"], &[]);
        let outcome = apply_substitution(&before, "p1", "p8");

        assert!(outcome.applied);
        assert_eq!(outcome.lineup.on_court, ids(&["p8", "p2"]));
        assert_eq!(outcome.lineup.bench, ids(&["p1"]));
    }

    #[test]
    fn rejection_returns_the_lineup_untouched() {
        let before = lineup(&["p1", "p2"], &["p3"]);
        let outcome = apply_substitution(&before, "p9", "p3");

        assert!(!outcome.applied);
        assert_eq!(outcome.lineup, before);
    }

    #[test]
    fn pre_existing_duplicate_on_court_is_caught_by_the_post_check() {
        // "p3" is already on court twice; swapping p1 out would commit a
        // lineup that still contains the duplicate.
        let before = lineup(&["p1", "p3", "p3"], &["p4"]);
        let outcome = apply_substitution(&before, "p1", "p4");

        // The up-front check passes (p4 is not on court), the post-check
        // must not.
        assert!(!outcome.applied);
        assert_eq!(outcome.lineup, before);
    }

    #[test]
    fn applied_swap_keeps_length_and_uniqueness() {
        let before = lineup(&["p1", "p2", "p3", "p4", "p5"], &["p6", "p7"]);
        let outcome = apply_substitution(&before, "p4", "p7");

        assert!(outcome.applied);
        assert_eq!(outcome.lineup.on_court.len(), before.on_court.len());
        assert!(has_unique_player_ids(&outcome.lineup.on_court));
    }
}
