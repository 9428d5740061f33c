use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::communities::repo_types::Community;
use crate::users::repo_types::User;

mod memory;
mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The record changed since it was read; the whole batch was discarded.
    #[error("{entity} {id} was modified concurrently")]
    Conflict { entity: &'static str, id: Uuid },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// A single document write. The record's `version` is the one it was read at.
#[derive(Debug, Clone)]
pub enum Write {
    User(User),
    Community(Community),
}

/// Ordered writes applied all-or-nothing by [`CommunityStore::commit`].
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    writes: Vec<Write>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_user(&mut self, user: User) -> &mut Self {
        self.writes.push(Write::User(user));
        self
    }

    pub fn put_community(&mut self, community: Community) -> &mut Self {
        self.writes.push(Write::Community(community));
        self
    }

    pub fn writes(&self) -> &[Write] {
        &self.writes
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

/// Persistence for users and communities.
#[async_trait]
pub trait CommunityStore: Send + Sync {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;
    async fn find_community(&self, id: Uuid) -> Result<Option<Community>, StoreError>;
    async fn list_communities(&self) -> Result<Vec<Community>, StoreError>;

    /// Applies every write in order inside one transaction. Each write only succeeds if
    /// the stored version still matches; otherwise nothing is applied and
    /// [`StoreError::Conflict`] is returned.
    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;
}
