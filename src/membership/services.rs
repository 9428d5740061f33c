use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::communities::repo_types::Community;
use crate::error::AppError;
use crate::store::{CommunityStore, StoreError, WriteBatch};
use crate::users::repo_types::User;

pub const JOINED: &str = "User joined the community successfully";
pub const LEFT: &str = "User left the community successfully";

/// Stages the writes for moving `user` into `target`.
///
/// `previous` is the community the user currently points at, when that differs from
/// `target` and still exists. Writes are ordered previous, user, target.
pub(crate) fn plan_join(mut user: User, mut target: Community, previous: Option<Community>) -> WriteBatch {
    let experience = user.total_experience();
    let mut batch = WriteBatch::new();

    if let Some(mut old) = previous {
        if old.remove_member(user.id, experience) {
            debug!(user_id = %user.id, community_id = %old.id, "removed from previous community");
            batch.put_community(old);
        } else {
            warn!(user_id = %user.id, community_id = %old.id, "previous community did not list user");
        }
    }

    if user.community_id != Some(target.id) {
        user.community_id = Some(target.id);
        batch.put_user(user.clone());
    }

    if target.add_member(user.id, experience) {
        batch.put_community(target);
    }
    batch
}

/// Stages the writes for removing `user` from `community`.
pub(crate) fn plan_leave(mut user: User, mut community: Community) -> Result<WriteBatch, AppError> {
    let experience = user.total_experience();
    if !community.remove_member(user.id, experience) {
        return Err(AppError::NotAMember);
    }

    let mut batch = WriteBatch::new();
    batch.put_community(community.clone());
    if let Some(other) = user.community_id {
        if other != community.id {
            warn!(user_id = %user.id, community_id = %community.id, points_at = %other,
                "member set and communityID disagree; clearing communityID");
        }
        user.community_id = None;
        batch.put_user(user);
    }
    Ok(batch)
}

async fn load(store: &dyn CommunityStore, user_id: Uuid, community_id: Uuid) -> Result<(User, Community), AppError> {
    let community = store
        .find_community(community_id)
        .await?
        .ok_or(AppError::NotFound("Community"))?;
    let user = store
        .find_user(user_id)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    Ok((user, community))
}

/// Re-runs `attempt` while the store reports a concurrent update.
pub(crate) async fn with_retry<T, F, Fut>(max_attempts: u32, mut attempt: F) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, AppError>>,
{
    let mut tries = 0;
    loop {
        tries += 1;
        match attempt().await {
            Err(AppError::Store(StoreError::Conflict { entity, id })) => {
                if tries >= max_attempts {
                    warn!(%entity, %id, tries, "giving up after repeated conflicts");
                    return Err(AppError::Conflict);
                }
                debug!(%entity, %id, tries, "conflict; retrying");
            }
            other => return other,
        }
    }
}

pub async fn join(
    store: &dyn CommunityStore,
    max_attempts: u32,
    user_id: Uuid,
    community_id: Uuid,
) -> Result<(), AppError> {
    with_retry(max_attempts, move || async move {
        let (user, target) = load(store, user_id, community_id).await?;

        let previous = match user.community_id {
            Some(old_id) if old_id != target.id => store.find_community(old_id).await?,
            _ => None,
        };
        let batch = plan_join(user, target, previous);
        store.commit(batch).await?;
        Ok(())
    })
    .await?;

    info!(%user_id, %community_id, "user joined community");
    Ok(())
}

pub async fn leave(
    store: &dyn CommunityStore,
    max_attempts: u32,
    user_id: Uuid,
    community_id: Uuid,
) -> Result<(), AppError> {
    with_retry(max_attempts, move || async move {
        let (user, community) = load(store, user_id, community_id).await?;
        let batch = plan_leave(user, community)?;
        store.commit(batch).await?;
        Ok(())
    })
    .await?;

    info!(%user_id, %community_id, "user left community");
    Ok(())
}
