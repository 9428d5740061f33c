use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::dto::{CommunitySummary, LeaderboardEntry, ReconcileResponse};
use super::services;
use crate::{error::AppError, state::AppState};

pub fn leaderboard_routes() -> Router<AppState> {
    Router::new()
        .route("/leaderboard", get(get_leaderboard))
        .route("/leaderboard/reconcile", post(reconcile_leaderboard))
}

pub fn community_routes() -> Router<AppState> {
    Router::new().route("/community", get(list_communities))
}

#[instrument(skip(state))]
pub async fn get_leaderboard(
    State(state): State<AppState>,
) -> Result<Json<Vec<LeaderboardEntry>>, AppError> {
    let board = services::leaderboard(state.store.as_ref()).await?;
    Ok(Json(board))
}

#[instrument(skip(state))]
pub async fn list_communities(
    State(state): State<AppState>,
) -> Result<Json<Vec<CommunitySummary>>, AppError> {
    Ok(Json(services::list_communities(state.store.as_ref()).await?))
}

#[instrument(skip(state))]
pub async fn reconcile_leaderboard(
    State(state): State<AppState>,
) -> Result<Json<ReconcileResponse>, AppError> {
    let updated = services::reconcile(state.store.as_ref(), state.config.membership_max_attempts).await?;
    Ok(Json(ReconcileResponse {
        message: "Community aggregates reconciled".into(),
        updated,
    }))
}
