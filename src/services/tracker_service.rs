use std::time::SystemTime;

use uuid::Uuid;

use crate::{
    dao::models::{GameEntity, GameEventEntity, GameStatusEntity, log_entries},
    dto::game::{
        AppendEventRequest, EventView, FinalizeRequest, FinalizeResponse, GameDetail,
        GameStatusDto, OpponentStatsRequest, ResumeResponse, StartTrackingRequest,
        SubstitutionRequest, SubstitutionResponse, system_time_from_millis,
    },
    error::ServiceError,
    services::{game_service::ensure_session, sse_events},
    state::{
        SharedState,
        state_machine::{GameEvent, GamePhase},
    },
    tracker::{
        LogEntry,
        lineup::{Lineup, apply_substitution, has_unique_player_ids},
        opponent::{StatRecord, hydrate_opponent_stats},
        resume::{ClockState, derive_resume_clock_state},
        score::{ReconciledScore, Score, apply_stat_to_score, reconcile_final_score},
    },
};

/// Begin live tracking for a scheduled game with the given starting lineup.
pub async fn start_tracking(
    state: &SharedState,
    game_id: Uuid,
    request: StartTrackingRequest,
) -> Result<GameDetail, ServiceError> {
    ensure_session(state, game_id).await?;
    let store = state.require_game_store().await?;

    let (entity, lineup) = state
        .with_session(game_id, |session| {
            build_starting_lineup(state, session, request.on_court)
        })
        .ok_or_else(|| not_found(game_id))??;

    let snapshot = entity.clone();
    state
        .run_transition(game_id, GameEvent::BeginTracking, move || async move {
            store.save_game(snapshot).await.map_err(Into::into)
        })
        .await?;

    let detail = state
        .with_session(game_id, |session| {
            session.lineup = lineup;
            session.updated_at = entity.updated_at;
            GameDetail::from(&*session)
        })
        .ok_or_else(|| not_found(game_id))?;

    sse_events::broadcast_status_changed(state, game_id, GameStatusDto::Live);
    Ok(detail)
}

/// Append one event to a live game's log, updating the running score and
/// opponent counters when the entry carries a stat payload.
pub async fn append_event(
    state: &SharedState,
    game_id: Uuid,
    request: AppendEventRequest,
) -> Result<EventView, ServiceError> {
    ensure_session(state, game_id).await?;
    let store = state.require_game_store().await?;
    require_live(state, game_id)?;

    let entity = state
        .with_session(game_id, |session| {
            build_event_entity(game_id, session.take_seq(), request)
        })
        .ok_or_else(|| not_found(game_id))?;

    store.append_event(entity.clone()).await?;

    let (snapshot, score_change) = state
        .with_session(game_id, |session| {
            let before = session.score;

            if let Some(period) = entity.period.clone() {
                session.clock.period = period;
            }
            if let Some(clock_ms) = entity.game_clock_ms {
                session.clock.clock_ms = clock_ms;
            }

            if let Some(stat) = LogEntry::from(&entity).stat {
                session.score = apply_stat_to_score(session.score, &stat);
                if stat.is_opponent {
                    let key = stat.stat_key.to_lowercase();
                    if let Some(counter) = session.opponent_stats.get_mut(&key) {
                        *counter += stat.value;
                    }
                }
            }

            session.updated_at = SystemTime::now();
            let change = (session.score != before).then_some(session.score);
            (GameEntity::from(&*session), change)
        })
        .ok_or_else(|| not_found(game_id))?;

    store.save_game(snapshot).await?;

    sse_events::broadcast_log_appended(state, game_id, &entity);
    if let Some(score) = score_change {
        sse_events::broadcast_score_updated(state, game_id, score);
    }

    Ok(EventView::from(&entity))
}

/// Attempt to swap `out_id` for `in_id` on the court. Rejections are
/// reported in the response, not as errors.
pub async fn substitute(
    state: &SharedState,
    game_id: Uuid,
    request: SubstitutionRequest,
) -> Result<SubstitutionResponse, ServiceError> {
    ensure_session(state, game_id).await?;
    let store = state.require_game_store().await?;
    require_live(state, game_id)?;

    let (applied, lineup, snapshot) = state
        .with_session(game_id, |session| {
            let outcome = apply_substitution(&session.lineup, &request.out_id, &request.in_id);
            if outcome.applied {
                session.lineup = outcome.lineup.clone();
                session.updated_at = SystemTime::now();
                (true, outcome.lineup, Some(GameEntity::from(&*session)))
            } else {
                (false, outcome.lineup, None)
            }
        })
        .ok_or_else(|| not_found(game_id))?;

    if let Some(snapshot) = snapshot {
        store.save_game(snapshot).await?;
        sse_events::broadcast_substitution(
            state,
            game_id,
            &request.out_id,
            &request.in_id,
            &lineup.on_court,
        );
    }

    Ok(SubstitutionResponse {
        applied,
        on_court: lineup.on_court,
        bench: lineup.bench,
    })
}

/// Replace the opponent counter record, normalising it against the game's
/// configured columns.
pub async fn replace_opponent_stats(
    state: &SharedState,
    game_id: Uuid,
    request: OpponentStatsRequest,
) -> Result<StatRecord, ServiceError> {
    ensure_session(state, game_id).await?;
    let store = state.require_game_store().await?;
    require_live(state, game_id)?;

    // Client column casing is not trusted; the record is keyed lowercase.
    let incoming: StatRecord = request
        .stats
        .into_iter()
        .map(|(key, value)| (key.to_lowercase(), value))
        .collect();

    let (record, snapshot) = state
        .with_session(game_id, |session| {
            session.opponent_stats = hydrate_opponent_stats(&incoming, &session.stat_columns);
            session.updated_at = SystemTime::now();
            (session.opponent_stats.clone(), GameEntity::from(&*session))
        })
        .ok_or_else(|| not_found(game_id))?;

    store.save_game(snapshot).await?;
    Ok(record)
}

/// Rebuild everything a reconnecting tracking console needs: the resume
/// clock derived from the log, the live score and lineup, and the
/// rehydrated opponent record.
pub async fn resume_game(
    state: &SharedState,
    game_id: Uuid,
) -> Result<ResumeResponse, ServiceError> {
    ensure_session(state, game_id).await?;
    let store = state.require_game_store().await?;
    require_live(state, game_id)?;

    let events = store.fetch_events(game_id).await?;
    let log = log_entries(&events);

    state
        .with_session(game_id, |session| {
            let clock = derive_resume_clock_state(&log, &session.clock);
            if clock.restored {
                session.clock = ClockState {
                    period: clock.period.clone(),
                    clock_ms: clock.clock_ms,
                };
            }
            let opponent_stats =
                hydrate_opponent_stats(&session.opponent_stats, &session.stat_columns);
            ResumeResponse::new(clock, session, opponent_stats, &events)
        })
        .ok_or_else(|| not_found(game_id))
}

/// Finalize a live game. The requested score is checked against the event
/// log; when they disagree the derived score is persisted and the game is
/// flagged.
pub async fn finalize_game(
    state: &SharedState,
    game_id: Uuid,
    request: FinalizeRequest,
) -> Result<FinalizeResponse, ServiceError> {
    ensure_session(state, game_id).await?;
    let store = state.require_game_store().await?;

    let events = store.fetch_events(game_id).await?;
    let requested = Score {
        home: request.home,
        away: request.away,
    };
    let outcome = reconcile_final_score(requested, &log_entries(&events));

    let entity = state
        .with_session(game_id, |session| {
            finalized_entity(session_entity(session), &outcome)
        })
        .ok_or_else(|| not_found(game_id))?;

    let snapshot = entity.clone();
    state
        .run_transition(game_id, GameEvent::FinishGame, move || async move {
            store.save_game(snapshot).await.map_err(Into::into)
        })
        .await?;

    state.with_session(game_id, |session| {
        session.score = outcome.score;
        session.score_mismatch = outcome.mismatch;
        session.updated_at = entity.updated_at;
    });

    sse_events::broadcast_game_finalized(state, game_id, &outcome);
    sse_events::broadcast_status_changed(state, game_id, GameStatusDto::Final);

    Ok(FinalizeResponse::from_reconciled(
        &outcome,
        GameStatusDto::Final,
    ))
}

/// Reopen a finalized game for corrections. The mismatch flag is cleared;
/// the next finalization re-runs reconciliation from scratch.
pub async fn reopen_game(state: &SharedState, game_id: Uuid) -> Result<GameDetail, ServiceError> {
    ensure_session(state, game_id).await?;
    let store = state.require_game_store().await?;

    let entity = state
        .with_session(game_id, |session| {
            let mut entity = session_entity(session);
            entity.status = GameStatusEntity::Live;
            entity.score_mismatch = false;
            entity
        })
        .ok_or_else(|| not_found(game_id))?;

    let snapshot = entity.clone();
    state
        .run_transition(game_id, GameEvent::ReopenGame, move || async move {
            store.save_game(snapshot).await.map_err(Into::into)
        })
        .await?;

    let detail = state
        .with_session(game_id, |session| {
            session.score_mismatch = false;
            session.updated_at = entity.updated_at;
            GameDetail::from(&*session)
        })
        .ok_or_else(|| not_found(game_id))?;

    sse_events::broadcast_status_changed(state, game_id, GameStatusDto::Live);
    Ok(detail)
}

fn not_found(game_id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("game `{game_id}` not found"))
}

fn require_live(state: &SharedState, game_id: Uuid) -> Result<(), ServiceError> {
    let phase = state
        .with_session(game_id, |session| session.phase())
        .ok_or_else(|| not_found(game_id))?;
    if phase != GamePhase::Live {
        return Err(ServiceError::InvalidState(format!(
            "game `{game_id}` is not live ({phase:?})"
        )));
    }
    Ok(())
}

/// Snapshot a session into its persisted shape with a fresh `updated_at`.
fn session_entity(session: &crate::state::game::TrackerSession) -> GameEntity {
    let mut entity = GameEntity::from(session);
    entity.updated_at = SystemTime::now();
    entity
}

fn finalized_entity(mut entity: GameEntity, outcome: &ReconciledScore) -> GameEntity {
    entity.status = GameStatusEntity::Final;
    entity.home_score = outcome.score.home;
    entity.away_score = outcome.score.away;
    entity.score_mismatch = outcome.mismatch;
    entity
}

fn build_starting_lineup(
    state: &SharedState,
    session: &mut crate::state::game::TrackerSession,
    on_court: Vec<String>,
) -> Result<(GameEntity, Lineup), ServiceError> {
    let lineup_size = state.config().sport_profile(&session.sport).lineup_size;

    if on_court.len() != lineup_size {
        return Err(ServiceError::InvalidInput(format!(
            "{} requires exactly {lineup_size} starters, got {}",
            session.sport,
            on_court.len()
        )));
    }
    if !has_unique_player_ids(&on_court) {
        return Err(ServiceError::InvalidInput(
            "starting lineup contains duplicate player ids".into(),
        ));
    }
    if let Some(unknown) = on_court.iter().find(|id| !session.roster.contains(id)) {
        return Err(ServiceError::InvalidInput(format!(
            "player `{unknown}` is not on the roster"
        )));
    }

    let bench = session
        .roster
        .iter()
        .filter(|id| !on_court.contains(id))
        .cloned()
        .collect();
    let lineup = Lineup { on_court, bench };

    let mut entity = session_entity(session);
    entity.status = GameStatusEntity::Live;
    entity.on_court = lineup.on_court.clone();
    entity.bench = lineup.bench.clone();

    Ok((entity, lineup))
}

fn build_event_entity(game_id: Uuid, seq: u64, request: AppendEventRequest) -> GameEventEntity {
    // Offline entries keep the client's own timestamp, or none at all until
    // the client syncs one. Everything else is stamped server-side.
    let created_at = if request.offline {
        request.created_at_ms.map(system_time_from_millis)
    } else {
        Some(SystemTime::now())
    };

    GameEventEntity {
        id: Uuid::new_v4(),
        game_id,
        seq,
        text: request.text,
        period: request.period,
        game_clock_ms: request.game_clock_ms,
        created_at,
        undo: request.undo.map(Into::into),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, state::AppState, state::game::TrackerSession};

    fn live_session(roster: &[&str]) -> TrackerSession {
        let mut session = TrackerSession::new(
            "vs Eagles".into(),
            "Eagles".into(),
            "basketball".into(),
            SystemTime::now(),
            vec!["pts".into(), "reb".into(), "fouls".into()],
            roster.iter().map(|id| (*id).to_owned()).collect(),
        );
        let plan = session.machine.plan(GameEvent::BeginTracking).unwrap();
        session.machine.apply(plan.id).unwrap();
        session
    }

    #[test]
    fn starting_lineup_must_match_the_profile_size() {
        let state = AppState::new(AppConfig::default());
        let mut session = TrackerSession::new(
            "vs Eagles".into(),
            "Eagles".into(),
            "basketball".into(),
            SystemTime::now(),
            vec!["pts".into()],
            vec!["p1".into(), "p2".into(), "p3".into(), "p4".into(), "p5".into(), "p6".into()],
        );

        let short = build_starting_lineup(
            &state,
            &mut session,
            vec!["p1".into(), "p2".into(), "p3".into()],
        );
        assert!(matches!(short, Err(ServiceError::InvalidInput(_))));

        let stranger = build_starting_lineup(
            &state,
            &mut session,
            vec!["p1".into(), "p2".into(), "p3".into(), "p4".into(), "p9".into()],
        );
        assert!(matches!(stranger, Err(ServiceError::InvalidInput(_))));

        let (entity, lineup) = build_starting_lineup(
            &state,
            &mut session,
            vec!["p1".into(), "p2".into(), "p3".into(), "p4".into(), "p5".into()],
        )
        .unwrap();
        assert_eq!(entity.status, GameStatusEntity::Live);
        assert_eq!(lineup.on_court.len(), 5);
        assert_eq!(lineup.bench, vec!["p6".to_owned()]);
    }

    #[test]
    fn online_events_are_stamped_and_offline_events_are_not() {
        let online = build_event_entity(
            Uuid::new_v4(),
            0,
            AppendEventRequest {
                text: "made layup".into(),
                period: Some("Q1".into()),
                game_clock_ms: Some(540_000),
                offline: false,
                created_at_ms: None,
                undo: None,
            },
        );
        assert!(online.created_at.is_some());

        let offline = build_event_entity(
            Uuid::new_v4(),
            1,
            AppendEventRequest {
                text: "made layup".into(),
                period: Some("Q1".into()),
                game_clock_ms: Some(530_000),
                offline: true,
                created_at_ms: None,
                undo: None,
            },
        );
        assert!(offline.created_at.is_none());

        let synced = build_event_entity(
            Uuid::new_v4(),
            2,
            AppendEventRequest {
                text: "made layup".into(),
                period: Some("Q1".into()),
                game_clock_ms: Some(520_000),
                offline: true,
                created_at_ms: Some(1_700_000_000_000),
                undo: None,
            },
        );
        assert_eq!(
            synced.created_at,
            Some(system_time_from_millis(1_700_000_000_000))
        );
    }

    #[test]
    fn require_live_rejects_scheduled_games() {
        let state = AppState::new(AppConfig::default());
        let session = TrackerSession::new(
            "vs Eagles".into(),
            "Eagles".into(),
            "basketball".into(),
            SystemTime::now(),
            vec!["pts".into()],
            vec!["p1".into()],
        );
        let id = session.id;
        state.sessions().insert(id, session);

        assert!(matches!(
            require_live(&state, id),
            Err(ServiceError::InvalidState(_))
        ));

        let live = live_session(&["p1"]);
        let live_id = live.id;
        state.sessions().insert(live_id, live);
        assert!(require_live(&state, live_id).is_ok());
    }
}
