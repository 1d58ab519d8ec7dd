use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use tokio_stream::{wrappers::WatchStream, Stream, StreamExt};
use tracing::{error, info, instrument, warn};

use crate::identity::normalize_name;
use crate::registry::SpotId;
use crate::state::AppState;

use super::dto::{BoardResponse, SpotActionRequest, SpotView};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/spots", get(list_spots))
        .route("/spots/events", get(watch_spots))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/spots/:id/claim", post(claim_spot))
        .route("/spots/:id/release", post(release_spot))
}

#[instrument(skip(state))]
pub async fn list_spots(
    State(state): State<AppState>,
) -> Result<Json<BoardResponse>, (StatusCode, String)> {
    let spots = state.store.snapshot().await.map_err(|e| {
        error!(error = %e, "board snapshot failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Unable to connect to the parking board. Please refresh.".into(),
        )
    })?;
    Ok(Json(BoardResponse::new(state.store.mode(), spots)))
}

#[instrument(skip(state, payload))]
pub async fn claim_spot(
    State(state): State<AppState>,
    Path(spot): Path<SpotId>,
    Json(payload): Json<SpotActionRequest>,
) -> Result<Json<SpotView>, (StatusCode, String)> {
    let Some(name) = normalize_name(&payload.name) else {
        warn!(%spot, "claim without a display name");
        return Err((StatusCode::BAD_REQUEST, "Display name is required".into()));
    };

    match state.store.claim(spot, &name).await {
        Ok(updated) => {
            info!(%spot, occupant = %name, "claimed");
            Ok(Json(updated.into()))
        }
        Err(e) if e.is_conflict() => {
            warn!(%spot, occupant = %name, conflict = %e, "claim rejected");
            Err((StatusCode::CONFLICT, e.to_string()))
        }
        Err(e) => {
            error!(error = %e, %spot, "claim failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Could not claim the spot. Please try again.".into(),
            ))
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn release_spot(
    State(state): State<AppState>,
    Path(spot): Path<SpotId>,
    Json(payload): Json<SpotActionRequest>,
) -> Result<Json<SpotView>, (StatusCode, String)> {
    let Some(name) = normalize_name(&payload.name) else {
        warn!(%spot, "release without a display name");
        return Err((StatusCode::BAD_REQUEST, "Display name is required".into()));
    };

    match state.store.release(spot, &name).await {
        Ok(updated) => {
            info!(%spot, by = %name, "released");
            Ok(Json(updated.into()))
        }
        Err(e) if e.is_conflict() => {
            warn!(%spot, by = %name, conflict = %e, "release rejected");
            Err((StatusCode::CONFLICT, e.to_string()))
        }
        Err(e) => {
            error!(error = %e, %spot, "release failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Could not release the spot. Please try again.".into(),
            ))
        }
    }
}

/// Live board stream. Every event carries the full snapshot; the first one
/// is the current board. The stream ends when the sync channel dies, at
/// which point the client reloads.
#[instrument(skip(state))]
pub async fn watch_spots(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let mode = state.store.mode();
    let updates = WatchStream::new(state.store.watch()).map(move |spots| {
        Event::default()
            .event("board")
            .json_data(BoardResponse::new(mode, spots))
    });
    Sse::new(updates).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod spot_handler_tests {
    use super::*;
    use std::sync::Arc;

    use axum::async_trait;
    use tokio::sync::watch;

    use crate::registry::{default_board, Spot};
    use crate::store::{BoardWatch, SpotStore, StoreError, StoreMode};

    fn request(name: &str) -> Json<SpotActionRequest> {
        Json(SpotActionRequest { name: name.into() })
    }

    /// Remote-shaped board where someone else already holds every spot, so
    /// claim and release both hit the conflict path.
    struct TakenBoard {
        occupant: &'static str,
        board: watch::Sender<Vec<Spot>>,
    }

    impl TakenBoard {
        fn new(occupant: &'static str) -> Self {
            let mut spots = default_board();
            for spot in &mut spots {
                spot.occupant = Some(occupant.to_string());
            }
            let (board, _) = watch::channel(spots);
            Self { occupant, board }
        }
    }

    #[async_trait]
    impl SpotStore for TakenBoard {
        async fn snapshot(&self) -> anyhow::Result<Vec<Spot>> {
            Ok(self.board.borrow().clone())
        }

        async fn claim(&self, _spot: SpotId, _name: &str) -> Result<Spot, StoreError> {
            Err(StoreError::AlreadyTaken {
                occupant: self.occupant.to_string(),
            })
        }

        async fn release(&self, _spot: SpotId, _name: &str) -> Result<Spot, StoreError> {
            Err(StoreError::TakenSince {
                occupant: self.occupant.to_string(),
            })
        }

        fn watch(&self) -> BoardWatch {
            self.board.subscribe()
        }

        fn mode(&self) -> StoreMode {
            StoreMode::Remote
        }
    }

    fn taken_state(occupant: &'static str) -> AppState {
        let mut state = AppState::fake();
        state.store = Arc::new(TakenBoard::new(occupant));
        state
    }

    #[tokio::test]
    async fn claim_sets_the_occupant() {
        let state = AppState::fake();
        let spot = claim_spot(State(state.clone()), Path(SpotId::Garage1), request("Aswin"))
            .await
            .expect("claim");
        assert_eq!(spot.0.occupant.as_deref(), Some("Aswin"));
        assert!(spot.0.updated_at.is_some());
    }

    #[tokio::test]
    async fn claim_trims_the_acting_name() {
        let state = AppState::fake();
        let spot = claim_spot(State(state), Path(SpotId::Garage2), request("  Jack "))
            .await
            .expect("claim");
        assert_eq!(spot.0.occupant.as_deref(), Some("Jack"));
    }

    #[tokio::test]
    async fn claim_without_a_name_is_rejected() {
        let state = AppState::fake();
        let (status, _) = claim_spot(State(state.clone()), Path(SpotId::Garage1), request("   "))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let board = state.store.snapshot().await.expect("snapshot");
        assert!(board.iter().all(|s| s.occupant.is_none()));
    }

    #[tokio::test]
    async fn release_clears_a_claimed_spot() {
        let state = AppState::fake();
        claim_spot(State(state.clone()), Path(SpotId::Driveway1), request("Joel"))
            .await
            .expect("claim");
        let spot = release_spot(State(state), Path(SpotId::Driveway1), request("Joel"))
            .await
            .expect("release");
        assert!(spot.0.occupant.is_none());
    }

    #[tokio::test]
    async fn claim_conflict_maps_to_409_with_the_occupant() {
        let state = taken_state("Aswin");
        let (status, message) = claim_spot(State(state), Path(SpotId::Garage1), request("Jack"))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(message, "Spot already taken by Aswin");
    }

    #[tokio::test]
    async fn release_conflict_maps_to_409_with_the_occupant() {
        let state = taken_state("Aswin");
        let (status, message) = release_spot(State(state), Path(SpotId::Garage1), request("Jack"))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(message, "Spot is now taken by Aswin");
    }

    #[tokio::test]
    async fn board_stream_ends_when_the_publisher_stops() {
        let (tx, rx) = watch::channel(default_board());
        let mut updates = WatchStream::new(rx);
        assert!(updates.next().await.is_some());

        drop(tx);
        assert!(updates.next().await.is_none());
    }

    #[tokio::test]
    async fn list_reports_local_mode_without_configuration() {
        let state = AppState::fake();
        let board = list_spots(State(state)).await.expect("list");
        assert_eq!(board.0.mode, crate::store::StoreMode::Local);
        assert_eq!(board.0.spots.len(), 4);
    }

    #[test]
    fn board_response_serializes_wire_ids() {
        let board = BoardResponse::new(
            crate::store::StoreMode::Local,
            crate::registry::default_board(),
        );
        let json = serde_json::to_string(&board).unwrap();
        assert!(json.contains("\"garage-1\""));
        assert!(json.contains("\"mode\":\"local\""));
        assert!(json.contains("\"occupant\":null"));
    }
}
