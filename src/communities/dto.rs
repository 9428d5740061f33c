use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One row of the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub logo: Option<String>,
    pub total_experience: i64,
    pub member_count: i64,
    pub rank: usize, // 1-based, never stored
}

/// Community as listed for selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunitySummary {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub logo: Option<String>,
    pub total_experience: i64,
    pub member_count: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReconcileResponse {
    pub message: String,
    pub updated: usize,
}
