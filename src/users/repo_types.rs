use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// One entry of a user's experience history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperiencePoint {
    pub points: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// User document as stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,        // Argon2 hash, not exposed in JSON
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub experience_points: Vec<ExperiencePoint>,
    #[serde(rename = "communityID")]
    pub community_id: Option<Uuid>,
    #[serde(skip)]
    pub version: i64,                 // optimistic lock counter
}

impl User {
    /// Sum of all points in the experience history, clamped to the `i64` range.
    pub fn total_experience(&self) -> i64 {
        self.experience_points
            .iter()
            .fold(0i64, |acc, e| acc.saturating_add(e.points))
    }
}

/// Fields needed to create a user; ids and versions are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub profile_picture: Option<String>,
    pub experience_points: Vec<ExperiencePoint>,
}
