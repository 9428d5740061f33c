use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::{dto::UserWithTotal, repo_types::User, services};
use crate::{error::AppError, ids::parse_id, state::AppState};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/user", get(list_users))
        .route("/user/:user_id", get(get_user))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<User>, AppError> {
    let id = parse_id("user", &user_id)?;
    let user = services::get_user(state.store.as_ref(), id).await?;
    Ok(Json(user))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserWithTotal>>, AppError> {
    Ok(Json(services::users_with_totals(state.store.as_ref()).await?))
}
