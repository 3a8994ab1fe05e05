use uuid::Uuid;

use crate::{
    dto::game::{CreateGameRequest, GameDetail, GameSummary, system_time_from_millis},
    error::ServiceError,
    state::{SharedState, game::TrackerSession},
    tracker::lineup::has_unique_player_ids,
};

/// Schedule a new game and persist it immediately.
pub async fn create_game(
    state: &SharedState,
    request: CreateGameRequest,
) -> Result<GameDetail, ServiceError> {
    let store = state.require_game_store().await?;
    let session = build_session(state, request)?;

    store.save_game((&session).into()).await?;

    let detail = GameDetail::from(&session);
    state.sessions().insert(session.id, session);

    Ok(detail)
}

/// List persisted games, most recently scheduled first.
pub async fn list_games(state: &SharedState) -> Result<Vec<GameSummary>, ServiceError> {
    let store = state.require_game_store().await?;
    let games = store.list_games().await?;
    Ok(games.into_iter().map(Into::into).collect())
}

/// Fetch one game, priming the in-memory session cache when needed.
pub async fn get_game(state: &SharedState, id: Uuid) -> Result<GameDetail, ServiceError> {
    ensure_session(state, id).await?;
    state
        .with_session(id, |session| GameDetail::from(&*session))
        .ok_or_else(|| ServiceError::NotFound(format!("game `{id}` not found")))
}

/// Make sure the session for `id` is cached, loading it from storage on a
/// miss.
pub async fn ensure_session(state: &SharedState, id: Uuid) -> Result<(), ServiceError> {
    if state.sessions().contains_key(&id) {
        return Ok(());
    }

    let store = state.require_game_store().await?;
    let Some(entity) = store.find_game(id).await? else {
        return Err(ServiceError::NotFound(format!("game `{id}` not found")));
    };

    state
        .sessions()
        .entry(id)
        .or_insert_with(|| TrackerSession::from(entity));
    Ok(())
}

fn build_session(
    state: &SharedState,
    request: CreateGameRequest,
) -> Result<TrackerSession, ServiceError> {
    let CreateGameRequest {
        name,
        opponent_name,
        sport,
        scheduled_at_ms,
        roster,
    } = request;

    if roster.is_empty() {
        return Err(ServiceError::InvalidInput(
            "a game requires at least one rostered player".into(),
        ));
    }
    if !has_unique_player_ids(&roster) {
        return Err(ServiceError::InvalidInput(
            "roster contains duplicate player ids".into(),
        ));
    }

    let profile = state.config().sport_profile(&sport);
    if roster.len() < profile.lineup_size {
        return Err(ServiceError::InvalidInput(format!(
            "{} requires at least {} rostered players, got {}",
            profile.name,
            profile.lineup_size,
            roster.len()
        )));
    }

    Ok(TrackerSession::new(
        name,
        opponent_name,
        profile.name.clone(),
        system_time_from_millis(scheduled_at_ms),
        profile.stat_columns.clone(),
        roster,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::state::AppState;

    fn roster(count: usize) -> Vec<String> {
        (1..=count).map(|index| format!("p{index}")).collect()
    }

    #[test]
    fn build_session_applies_the_sport_profile() {
        let state = AppState::new(AppConfig::default());
        let session = build_session(
            &state,
            CreateGameRequest {
                name: "vs Eagles".into(),
                opponent_name: "Eagles".into(),
                sport: "Basketball".into(),
                scheduled_at_ms: 1_700_000_000_000,
                roster: roster(8),
            },
        )
        .unwrap();

        assert_eq!(session.sport, "basketball");
        assert!(session.stat_columns.contains(&"pts".to_owned()));
        assert_eq!(session.lineup.on_court.len(), 0);
        assert_eq!(session.lineup.bench.len(), 8);
    }

    #[test]
    fn build_session_rejects_small_or_duplicated_rosters() {
        let state = AppState::new(AppConfig::default());

        let too_small = build_session(
            &state,
            CreateGameRequest {
                name: "vs Eagles".into(),
                opponent_name: "Eagles".into(),
                sport: "basketball".into(),
                scheduled_at_ms: 0,
                roster: roster(3),
            },
        );
        assert!(matches!(too_small, Err(ServiceError::InvalidInput(_))));

        let mut duplicated = roster(8);
        duplicated[7] = "p1".into();
        let dup = build_session(
            &state,
            CreateGameRequest {
                name: "vs Eagles".into(),
                opponent_name: "Eagles".into(),
                sport: "basketball".into(),
                scheduled_at_ms: 0,
                roster: duplicated,
            },
        );
        assert!(matches!(dup, Err(ServiceError::InvalidInput(_))));
    }
}
