use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user folded with the sum of their experience history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserWithTotal {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub email: String,
    pub profile_picture: Option<String>,
    pub total_experience: i64,
    #[serde(rename = "communityID")]
    pub community_id: Option<Uuid>,
}
