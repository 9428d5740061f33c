use std::collections::HashMap;

use tracing::{info, warn};
use uuid::Uuid;

use super::dto::{CommunitySummary, LeaderboardEntry};
use super::repo_types::Community;
use crate::error::AppError;
use crate::membership::services::with_retry;
use crate::store::{CommunityStore, WriteBatch};

/// Ranks communities by total experience, highest first.
///
/// The sort is stable, so tied communities keep the store's listing order.
/// `memberCount` is reported from the member set itself.
pub fn rank_communities(communities: Vec<Community>) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = communities
        .into_iter()
        .map(|c| LeaderboardEntry {
            id: c.id,
            member_count: c.members.len() as i64,
            name: c.name,
            logo: c.logo,
            total_experience: c.total_experience,
            rank: 0,
        })
        .collect();

    entries.sort_by(|a, b| b.total_experience.cmp(&a.total_experience));
    for (i, e) in entries.iter_mut().enumerate() {
        e.rank = i + 1;
    }
    entries
}

pub async fn leaderboard(store: &dyn CommunityStore) -> Result<Vec<LeaderboardEntry>, AppError> {
    let communities = store.list_communities().await?;
    Ok(rank_communities(communities))
}

pub async fn list_communities(store: &dyn CommunityStore) -> Result<Vec<CommunitySummary>, AppError> {
    let communities = store.list_communities().await?;
    Ok(communities
        .into_iter()
        .map(|c| CommunitySummary {
            id: c.id,
            member_count: c.members.len() as i64,
            name: c.name,
            logo: c.logo,
            total_experience: c.total_experience,
        })
        .collect())
}

/// Recomputes `totalExperience` and `memberCount` of `community` from member histories.
/// Returns true if either cached value was off.
pub(crate) fn reconcile_one(community: &mut Community, totals: &HashMap<Uuid, i64>) -> bool {
    let expected_total: i64 = community
        .members
        .iter()
        .map(|m| match totals.get(m) {
            Some(t) => *t,
            None => {
                warn!(community_id = %community.id, member_id = %m, "member has no user record");
                0
            }
        })
        .fold(0i64, i64::saturating_add);
    let expected_count = community.members.len() as i64;

    if community.total_experience == expected_total && community.member_count == expected_count {
        return false;
    }
    warn!(
        community_id = %community.id,
        stored_total = community.total_experience,
        expected_total,
        stored_count = community.member_count,
        expected_count,
        "community aggregates drifted"
    );
    community.total_experience = expected_total;
    community.member_count = expected_count;
    true
}

async fn reconcile_once(store: &dyn CommunityStore) -> Result<usize, AppError> {
    let totals: HashMap<Uuid, i64> = store
        .list_users()
        .await?
        .iter()
        .map(|u| (u.id, u.total_experience()))
        .collect();

    let mut batch = WriteBatch::new();
    let mut updated = 0;
    for mut community in store.list_communities().await? {
        if reconcile_one(&mut community, &totals) {
            batch.put_community(community);
            updated += 1;
        }
    }
    store.commit(batch).await?;
    Ok(updated)
}

/// Repairs drifted aggregates across all communities in one batch, re-reading on
/// concurrent updates like join/leave do.
pub async fn reconcile(store: &dyn CommunityStore, max_attempts: u32) -> Result<usize, AppError> {
    let updated = with_retry(max_attempts, move || reconcile_once(store)).await?;
    info!(updated, "reconciled community aggregates");
    Ok(updated)
}
