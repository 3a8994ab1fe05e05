use std::time::Instant;

use thiserror::Error;
use uuid::Uuid;

/// Lifecycle phases of a tracked game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Created but not yet tracked; roster and schedule can still change.
    Scheduled,
    /// A scorekeeper is actively tracking the game.
    Live,
    /// The game has been finalized with a reconciled score.
    Final,
}

/// Events that can be applied to the lifecycle machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// Scorekeeper opens the tracker with a starting lineup.
    BeginTracking,
    /// Finalize the game after score reconciliation.
    FinishGame,
    /// Reopen a finalized game for a correction session.
    ReopenGame,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the machine was in when the invalid event was received.
    pub from: GamePhase,
    /// The event that cannot be applied from this phase.
    pub event: GameEvent,
}

/// Errors that can occur when planning a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// A transition is already pending and must be applied or aborted.
    AlreadyPending,
    /// The requested transition is not valid from the current phase.
    InvalidTransition(InvalidTransition),
}

/// Errors that can occur when applying a planned transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
    /// Phase changed since the plan was created.
    PhaseMismatch {
        /// Phase when the plan was created.
        expected: GamePhase,
        /// Current phase.
        actual: GamePhase,
    },
    /// Version changed since the plan was created.
    VersionMismatch {
        /// Version the plan expected to commit.
        expected: usize,
        /// Version that would actually be committed.
        actual: usize,
    },
}

/// Errors that can occur when aborting a planned transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
}

/// Unique identifier for a planned transition.
pub type PlanId = Uuid;

/// A validated transition that has not been committed yet. The surrounding
/// service performs its side effects (persistence, broadcasts) between
/// `plan` and `apply`, and aborts on failure so the in-memory phase never
/// runs ahead of the store.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Unique identifier for this plan.
    pub id: PlanId,
    /// Phase the machine is currently in.
    pub from: GamePhase,
    /// Phase the machine will transition to.
    pub to: GamePhase,
    /// Event that triggered this transition.
    pub event: GameEvent,
    /// Version number after applying this transition.
    pub version_next: usize,
    /// Timestamp when this plan was created.
    pub pending_since: Instant,
}

/// Point-in-time view of a lifecycle machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    /// Current phase.
    pub phase: GamePhase,
    /// Version number (increments on each committed transition).
    pub version: usize,
    /// Phase a pending transition would move to, if one is planned.
    pub pending: Option<GamePhase>,
}

/// Lifecycle machine guarding a single game's phase.
#[derive(Debug, Clone)]
pub struct LifecycleMachine {
    phase: GamePhase,
    version: usize,
    pending: Option<Plan>,
}

impl Default for LifecycleMachine {
    fn default() -> Self {
        Self::new(GamePhase::Scheduled)
    }
}

impl LifecycleMachine {
    /// Create a machine starting in `phase` (persisted games rehydrate in
    /// whatever phase they were saved in).
    pub fn new(phase: GamePhase) -> Self {
        Self {
            phase,
            version: 0,
            pending: None,
        }
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Create a snapshot of the current machine state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            version: self.version,
            pending: self.pending.as_ref().map(|plan| plan.to),
        }
    }

    /// Validate that `event` can be applied from the current phase and
    /// register it as the pending transition.
    pub fn plan(&mut self, event: GameEvent) -> Result<Plan, PlanError> {
        if self.pending.is_some() {
            return Err(PlanError::AlreadyPending);
        }

        let next = self
            .compute_transition(event)
            .map_err(PlanError::InvalidTransition)?;

        let plan = Plan {
            id: Uuid::new_v4(),
            from: self.phase,
            to: next,
            event,
            version_next: self.version + 1,
            pending_since: Instant::now(),
        };

        self.pending = Some(plan.clone());

        Ok(plan)
    }

    /// Commit a planned transition, returning the new phase.
    pub fn apply(&mut self, plan_id: PlanId) -> Result<GamePhase, ApplyError> {
        let plan = self.pending.take().ok_or(ApplyError::NoPending)?;

        if plan.id != plan_id {
            let expected = plan.id;
            self.pending = Some(plan);
            return Err(ApplyError::IdMismatch {
                expected,
                got: plan_id,
            });
        }

        if self.phase != plan.from {
            return Err(ApplyError::PhaseMismatch {
                expected: plan.from,
                actual: self.phase,
            });
        }

        if self.version + 1 != plan.version_next {
            return Err(ApplyError::VersionMismatch {
                expected: plan.version_next,
                actual: self.version + 1,
            });
        }

        self.phase = plan.to;
        self.version = plan.version_next;
        self.pending = None;

        Ok(self.phase)
    }

    /// Discard a planned transition without applying it.
    pub fn abort(&mut self, plan_id: PlanId) -> Result<(), AbortError> {
        let plan = self.pending.as_ref().ok_or(AbortError::NoPending)?;

        if plan.id != plan_id {
            return Err(AbortError::IdMismatch {
                expected: plan.id,
                got: plan_id,
            });
        }

        self.pending = None;
        Ok(())
    }

    fn compute_transition(&self, event: GameEvent) -> Result<GamePhase, InvalidTransition> {
        let next = match (self.phase, event) {
            (GamePhase::Scheduled, GameEvent::BeginTracking) => GamePhase::Live,
            (GamePhase::Live, GameEvent::FinishGame) => GamePhase::Final,
            (GamePhase::Final, GameEvent::ReopenGame) => GamePhase::Live,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(machine: &mut LifecycleMachine, event: GameEvent) -> GamePhase {
        let plan = machine.plan(event).unwrap();
        machine.apply(plan.id).unwrap()
    }

    #[test]
    fn fresh_game_is_scheduled() {
        let machine = LifecycleMachine::default();
        assert_eq!(machine.phase(), GamePhase::Scheduled);
    }

    #[test]
    fn full_happy_path_through_a_game() {
        let mut machine = LifecycleMachine::default();

        assert_eq!(apply(&mut machine, GameEvent::BeginTracking), GamePhase::Live);
        assert_eq!(apply(&mut machine, GameEvent::FinishGame), GamePhase::Final);
        assert_eq!(apply(&mut machine, GameEvent::ReopenGame), GamePhase::Live);
        assert_eq!(apply(&mut machine, GameEvent::FinishGame), GamePhase::Final);
    }

    #[test]
    fn finalizing_a_scheduled_game_is_invalid() {
        let mut machine = LifecycleMachine::default();
        let err = machine.plan(GameEvent::FinishGame).unwrap_err();
        assert_eq!(
            err,
            PlanError::InvalidTransition(InvalidTransition {
                from: GamePhase::Scheduled,
                event: GameEvent::FinishGame,
            })
        );
    }

    #[test]
    fn only_one_plan_may_be_pending() {
        let mut machine = LifecycleMachine::default();
        machine.plan(GameEvent::BeginTracking).unwrap();
        assert_eq!(
            machine.plan(GameEvent::BeginTracking).unwrap_err(),
            PlanError::AlreadyPending
        );
    }

    #[test]
    fn aborted_plan_leaves_the_phase_unchanged() {
        let mut machine = LifecycleMachine::default();
        let plan = machine.plan(GameEvent::BeginTracking).unwrap();
        machine.abort(plan.id).unwrap();

        assert_eq!(machine.phase(), GamePhase::Scheduled);
        assert_eq!(machine.snapshot().pending, None);
    }

    #[test]
    fn apply_rejects_a_mismatched_plan_id() {
        let mut machine = LifecycleMachine::default();
        let plan = machine.plan(GameEvent::BeginTracking).unwrap();
        let bogus = Uuid::new_v4();

        let err = machine.apply(bogus).unwrap_err();
        assert_eq!(
            err,
            ApplyError::IdMismatch {
                expected: plan.id,
                got: bogus,
            }
        );
        // The original plan is still pending and can be applied.
        assert_eq!(machine.apply(plan.id).unwrap(), GamePhase::Live);
    }

    #[test]
    fn snapshot_reports_pending_target() {
        let mut machine = LifecycleMachine::default();
        machine.plan(GameEvent::BeginTracking).unwrap();

        let snapshot = machine.snapshot();
        assert_eq!(snapshot.phase, GamePhase::Scheduled);
        assert_eq!(snapshot.pending, Some(GamePhase::Live));
    }
}
