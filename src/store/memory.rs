use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CommunityStore, StoreError, Write, WriteBatch};
use crate::communities::repo_types::{Community, NewCommunity};
use crate::users::repo_types::{NewUser, User};

#[derive(Default)]
struct Documents {
    // insertion order stands in for created_at ordering
    users: BTreeMap<Uuid, (u64, User)>,
    communities: BTreeMap<Uuid, (u64, Community)>,
    next_seq: u64,
}

/// Process-local store with the same commit semantics as [`super::PgStore`].
#[derive(Default)]
pub struct InMemoryStore {
    docs: RwLock<Documents>,
    fail_commits: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, new: NewUser) -> User {
        let mut docs = self.docs.write().await;
        let user = User {
            id: Uuid::new_v4(),
            email: new.email,
            password_hash: new.password_hash,
            profile_picture: new.profile_picture,
            experience_points: new.experience_points,
            community_id: None,
            version: 0,
        };
        let seq = docs.next_seq;
        docs.next_seq += 1;
        docs.users.insert(user.id, (seq, user.clone()));
        user
    }

    pub async fn insert_community(&self, new: NewCommunity) -> Community {
        let mut docs = self.docs.write().await;
        let community = Community {
            id: Uuid::new_v4(),
            name: new.name,
            logo: new.logo,
            members: Vec::new(),
            total_experience: 0,
            member_count: 0,
            version: 0,
        };
        let seq = docs.next_seq;
        docs.next_seq += 1;
        docs.communities.insert(community.id, (seq, community.clone()));
        community
    }

    /// Overwrites a community without a version check, for setting up drifted state.
    pub async fn overwrite_community(&self, community: Community) {
        let mut docs = self.docs.write().await;
        if let Some(slot) = docs.communities.get_mut(&community.id) {
            slot.1 = community;
        }
    }

    /// Makes every subsequent commit fail with [`StoreError::Unavailable`].
    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl CommunityStore for InMemoryStore {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.docs.read().await.users.get(&id).map(|(_, u)| u.clone()))
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let docs = self.docs.read().await;
        let mut users: Vec<_> = docs.users.values().cloned().collect();
        users.sort_by_key(|(seq, _)| *seq);
        Ok(users.into_iter().map(|(_, u)| u).collect())
    }

    async fn find_community(&self, id: Uuid) -> Result<Option<Community>, StoreError> {
        Ok(self
            .docs
            .read()
            .await
            .communities
            .get(&id)
            .map(|(_, c)| c.clone()))
    }

    async fn list_communities(&self) -> Result<Vec<Community>, StoreError> {
        let docs = self.docs.read().await;
        let mut communities: Vec<_> = docs.communities.values().cloned().collect();
        communities.sort_by_key(|(seq, _)| *seq);
        Ok(communities.into_iter().map(|(_, c)| c).collect())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("commits disabled".into()));
        }
        let mut docs = self.docs.write().await;

        // validate everything first so a conflict leaves no partial state
        for write in batch.writes() {
            let (entity, id, version, stored) = match write {
                Write::User(u) => (
                    "user",
                    u.id,
                    u.version,
                    docs.users.get(&u.id).map(|(_, s)| s.version),
                ),
                Write::Community(c) => (
                    "community",
                    c.id,
                    c.version,
                    docs.communities.get(&c.id).map(|(_, s)| s.version),
                ),
            };
            if stored != Some(version) {
                return Err(StoreError::Conflict { entity, id });
            }
        }

        for write in batch.writes() {
            match write {
                Write::User(u) => {
                    if let Some(slot) = docs.users.get_mut(&u.id) {
                        let mut next = u.clone();
                        next.version += 1;
                        // history is never rewritten by a commit
                        next.experience_points = std::mem::take(&mut slot.1.experience_points);
                        next.password_hash = std::mem::take(&mut slot.1.password_hash);
                        slot.1 = next;
                    }
                }
                Write::Community(c) => {
                    if let Some(slot) = docs.communities.get_mut(&c.id) {
                        let mut next = c.clone();
                        next.version += 1;
                        slot.1 = next;
                    }
                }
            }
        }
        Ok(())
    }
}
