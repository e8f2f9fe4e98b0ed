use crate::config::AppState;
use crate::ctx::User;
use crate::error::Result;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use relay_core::{JoinOutcome, Participant};
use serde::Deserialize;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub struct JoinInput {
    #[serde(default)]
    pub name: String,
}

/// GET /participants
pub async fn list_participants(State(state): State<AppState>) -> Result<Json<Vec<Participant>>> {
    Ok(Json(state.chat.list_participants().await?))
}

/// POST /participants
pub async fn join(
    State(state): State<AppState>,
    input: std::result::Result<Json<JoinInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Participant>)> {
    let Json(input) = input?;
    info!("POST /participants - {}", input.name);

    let outcome = state.chat.join_room(&input.name).await?;
    if let JoinOutcome::NoticeFailed { error, .. } = &outcome {
        warn!("Join notice for {} was not stored: {}", input.name, error);
    }

    Ok((StatusCode::CREATED, Json(outcome.into_participant())))
}

/// POST /status
pub async fn heartbeat(State(state): State<AppState>, user: User) -> Result<StatusCode> {
    state.chat.send_heartbeat(user.name()).await?;
    Ok(StatusCode::OK)
}
