use uuid::Uuid;

use super::dto::UserWithTotal;
use super::repo_types::User;
use crate::error::AppError;
use crate::store::CommunityStore;

/// Folds every user's history into a total. Users without history report 0.
pub fn with_totals(users: Vec<User>) -> Vec<UserWithTotal> {
    users
        .into_iter()
        .map(|u| UserWithTotal {
            total_experience: u.total_experience(),
            id: u.id,
            email: u.email,
            profile_picture: u.profile_picture,
            community_id: u.community_id,
        })
        .collect()
}

pub async fn users_with_totals(store: &dyn CommunityStore) -> Result<Vec<UserWithTotal>, AppError> {
    Ok(with_totals(store.list_users().await?))
}

pub async fn get_user(store: &dyn CommunityStore, id: Uuid) -> Result<User, AppError> {
    store.find_user(id).await?.ok_or(AppError::NotFound("User"))
}
