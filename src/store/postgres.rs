use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{CommunityStore, StoreError, Write, WriteBatch};
use crate::communities::repo_types::{Community, NewCommunity};
use crate::users::repo_types::{ExperiencePoint, NewUser, User};

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    profile_picture: Option<String>,
    community_id: Option<Uuid>,
    version: i64,
}

#[derive(Debug, FromRow)]
struct ExperienceRow {
    user_id: Uuid,
    points: i64,
    recorded_at: OffsetDateTime,
}

#[derive(Debug, FromRow)]
struct CommunityRow {
    id: Uuid,
    name: String,
    logo: Option<String>,
    total_experience: i64,
    member_count: i64,
    version: i64,
}

#[derive(Debug, FromRow)]
struct MemberRow {
    community_id: Uuid,
    user_id: Uuid,
}

impl UserRow {
    fn into_user(self, experience_points: Vec<ExperiencePoint>) -> User {
        User {
            id: self.id,
            email: self.email,
            password_hash: self.password_hash,
            profile_picture: self.profile_picture,
            experience_points,
            community_id: self.community_id,
            version: self.version,
        }
    }
}

impl CommunityRow {
    fn into_community(self, members: Vec<Uuid>) -> Community {
        Community {
            id: self.id,
            name: self.name,
            logo: self.logo,
            members,
            total_experience: self.total_experience,
            member_count: self.member_count,
            version: self.version,
        }
    }
}

impl From<ExperienceRow> for ExperiencePoint {
    fn from(r: ExperienceRow) -> Self {
        Self {
            points: r.points,
            timestamp: r.recorded_at,
        }
    }
}

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { db })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db)
            .await
            .context("run migrations")?;
        Ok(())
    }

    /// Insert a community with an empty member set.
    pub async fn create_community(&self, new: &NewCommunity) -> anyhow::Result<Community> {
        let row = sqlx::query_as::<_, CommunityRow>(
            r#"
            INSERT INTO communities (name, logo)
            VALUES ($1, $2)
            RETURNING id, name, logo, total_experience, member_count, version
            "#,
        )
        .bind(&new.name)
        .bind(&new.logo)
        .fetch_one(&self.db)
        .await
        .context("insert community")?;
        Ok(row.into_community(Vec::new()))
    }

    /// Insert a user together with its experience history.
    pub async fn create_user(&self, new: &NewUser) -> anyhow::Result<User> {
        let mut tx = self.db.begin().await.context("begin tx")?;
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (email, password_hash, profile_picture)
            VALUES ($1, $2, $3)
            RETURNING id, email, password_hash, profile_picture, community_id, version
            "#,
        )
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.profile_picture)
        .fetch_one(&mut *tx)
        .await
        .context("insert user")?;

        for e in &new.experience_points {
            sqlx::query(
                r#"
                INSERT INTO experience_points (user_id, points, recorded_at)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(row.id)
            .bind(e.points)
            .bind(e.timestamp)
            .execute(&mut *tx)
            .await
            .context("insert experience point")?;
        }
        tx.commit().await.context("commit tx")?;

        Ok(row.into_user(new.experience_points.clone()))
    }

    async fn experience_of(&self, user_id: Uuid) -> Result<Vec<ExperiencePoint>, StoreError> {
        let rows = sqlx::query_as::<_, ExperienceRow>(
            r#"
            SELECT user_id, points, recorded_at
              FROM experience_points
             WHERE user_id = $1
             ORDER BY recorded_at ASC, id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(ExperiencePoint::from).collect())
    }

    async fn members_of(&self, community_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT user_id
              FROM community_members
             WHERE community_id = $1
             ORDER BY position ASC
            "#,
        )
        .bind(community_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn write_user(tx: &mut Transaction<'_, Postgres>, user: &User) -> Result<(), StoreError> {
        let res = sqlx::query(
            r#"
            UPDATE users
               SET community_id = $1, version = version + 1
             WHERE id = $2 AND version = $3
            "#,
        )
        .bind(user.community_id)
        .bind(user.id)
        .bind(user.version)
        .execute(&mut **tx)
        .await?;
        if res.rows_affected() == 0 {
            return Err(StoreError::Conflict {
                entity: "user",
                id: user.id,
            });
        }
        Ok(())
    }

    async fn write_community(
        tx: &mut Transaction<'_, Postgres>,
        community: &Community,
    ) -> Result<(), StoreError> {
        let res = sqlx::query(
            r#"
            UPDATE communities
               SET name = $1, logo = $2, total_experience = $3, member_count = $4,
                   version = version + 1
             WHERE id = $5 AND version = $6
            "#,
        )
        .bind(&community.name)
        .bind(&community.logo)
        .bind(community.total_experience)
        .bind(community.member_count)
        .bind(community.id)
        .bind(community.version)
        .execute(&mut **tx)
        .await?;
        if res.rows_affected() == 0 {
            return Err(StoreError::Conflict {
                entity: "community",
                id: community.id,
            });
        }

        sqlx::query("DELETE FROM community_members WHERE community_id = $1")
            .bind(community.id)
            .execute(&mut **tx)
            .await?;
        sqlx::query(
            r#"
            INSERT INTO community_members (community_id, user_id, position)
            SELECT $1, m.user_id, m.ord
              FROM UNNEST($2::uuid[]) WITH ORDINALITY AS m(user_id, ord)
            "#,
        )
        .bind(community.id)
        .bind(&community.members)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl CommunityStore for PgStore {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, profile_picture, community_id, version
              FROM users
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        match row {
            Some(row) => {
                let points = self.experience_of(row.id).await?;
                Ok(Some(row.into_user(points)))
            }
            None => Ok(None),
        }
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, profile_picture, community_id, version
              FROM users
             ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        let points = sqlx::query_as::<_, ExperienceRow>(
            r#"
            SELECT user_id, points, recorded_at
              FROM experience_points
             ORDER BY recorded_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let mut by_user: HashMap<Uuid, Vec<ExperiencePoint>> = HashMap::new();
        for p in points {
            by_user.entry(p.user_id).or_default().push(p.into());
        }
        Ok(rows
            .into_iter()
            .map(|row| {
                let history = by_user.remove(&row.id).unwrap_or_default();
                row.into_user(history)
            })
            .collect())
    }

    async fn find_community(&self, id: Uuid) -> Result<Option<Community>, StoreError> {
        let row = sqlx::query_as::<_, CommunityRow>(
            r#"
            SELECT id, name, logo, total_experience, member_count, version
              FROM communities
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        match row {
            Some(row) => {
                let members = self.members_of(row.id).await?;
                Ok(Some(row.into_community(members)))
            }
            None => Ok(None),
        }
    }

    async fn list_communities(&self) -> Result<Vec<Community>, StoreError> {
        let rows = sqlx::query_as::<_, CommunityRow>(
            r#"
            SELECT id, name, logo, total_experience, member_count, version
              FROM communities
             ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        let members = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT community_id, user_id
              FROM community_members
             ORDER BY position ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let mut by_community: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for m in members {
            by_community.entry(m.community_id).or_default().push(m.user_id);
        }
        Ok(rows
            .into_iter()
            .map(|row| {
                let members = by_community.remove(&row.id).unwrap_or_default();
                row.into_community(members)
            })
            .collect())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut tx = self.db.begin().await?;
        for write in batch.writes() {
            let res = match write {
                Write::User(u) => Self::write_user(&mut tx, u).await,
                Write::Community(c) => Self::write_community(&mut tx, c).await,
            };
            if let Err(e) = res {
                warn!(error = %e, "write batch aborted; rolling back");
                tx.rollback().await?;
                return Err(e);
            }
        }
        tx.commit().await?;
        debug!(writes = batch.writes().len(), "write batch committed");
        Ok(())
    }
}
