use axum::{
    extract::{Path, State},
    routing::{delete, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::services::{self, JOINED, LEFT};
use crate::{error::AppError, ids::parse_id, state::AppState};

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

pub fn membership_routes() -> Router<AppState> {
    Router::new()
        .route("/user/:user_id/join/:community_id", post(join_community))
        .route("/user/:user_id/leave/:community_id", delete(leave_community))
}

#[instrument(skip(state))]
pub async fn join_community(
    State(state): State<AppState>,
    Path((user_id, community_id)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, AppError> {
    let user_id = parse_id("user", &user_id)?;
    let community_id = parse_id("community", &community_id)?;

    services::join(
        state.store.as_ref(),
        state.config.membership_max_attempts,
        user_id,
        community_id,
    )
    .await?;

    Ok(Json(MessageResponse {
        message: JOINED.into(),
    }))
}

#[instrument(skip(state))]
pub async fn leave_community(
    State(state): State<AppState>,
    Path((user_id, community_id)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, AppError> {
    let user_id = parse_id("user", &user_id)?;
    let community_id = parse_id("community", &community_id)?;

    services::leave(
        state.store.as_ref(),
        state.config.membership_max_attempts,
        user_id,
        community_id,
    )
    .await?;

    Ok(Json(MessageResponse {
        message: LEFT.into(),
    }))
}
