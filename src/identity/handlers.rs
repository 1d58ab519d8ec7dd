use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{error, info, instrument};

use crate::registry::ROOMMATES;
use crate::state::AppState;

use super::dto::{IdentityResponse, SetIdentityRequest};

pub fn identity_routes() -> Router<AppState> {
    Router::new().route("/identity", get(get_identity).put(set_identity))
}

#[instrument(skip(state))]
pub async fn get_identity(State(state): State<AppState>) -> Json<IdentityResponse> {
    Json(IdentityResponse {
        name: state.identity.load(),
        roommates: ROOMMATES,
    })
}

/// Saves a display name. An empty-after-trim name is a silent no-op; the
/// response echoes whatever is stored so the client dialog can tell nothing
/// changed.
#[instrument(skip(state, payload))]
pub async fn set_identity(
    State(state): State<AppState>,
    Json(payload): Json<SetIdentityRequest>,
) -> Result<Json<IdentityResponse>, (StatusCode, String)> {
    if let Err(e) = state.identity.save(&payload.name) {
        error!(error = %e, "failed to persist display name");
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Could not save your name. Please try again.".into(),
        ));
    }

    let name = state.identity.load();
    if let Some(name) = &name {
        info!(%name, "display name saved");
    }
    Ok(Json(IdentityResponse {
        name,
        roommates: ROOMMATES,
    }))
}

#[cfg(test)]
mod identity_handler_tests {
    use super::*;

    #[tokio::test]
    async fn set_identity_trims_and_echoes_the_stored_name() {
        let state = AppState::fake();
        let response = set_identity(
            State(state.clone()),
            Json(SetIdentityRequest {
                name: "  Nishant ".into(),
            }),
        )
        .await
        .expect("set identity");
        assert_eq!(response.0.name.as_deref(), Some("Nishant"));
        assert_eq!(state.identity.load().as_deref(), Some("Nishant"));
    }

    #[tokio::test]
    async fn empty_submission_leaves_identity_unchanged() {
        let state = AppState::fake();
        state.identity.save("Joel").expect("seed name");

        let response = set_identity(
            State(state.clone()),
            Json(SetIdentityRequest { name: "   ".into() }),
        )
        .await
        .expect("set identity");
        assert_eq!(response.0.name.as_deref(), Some("Joel"));
    }

    #[tokio::test]
    async fn get_identity_lists_the_roommate_hints() {
        let state = AppState::fake();
        let response = get_identity(State(state)).await;
        assert_eq!(response.0.roommates, ["Aswin", "Jack", "Joel", "Nishant"]);
    }
}
