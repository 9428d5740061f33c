use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Community document as stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Community {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub logo: Option<String>,
    #[serde(default)]
    pub members: Vec<Uuid>,
    pub total_experience: i64,
    pub member_count: i64,
    #[serde(skip)]
    pub version: i64,
}

impl Community {
    pub fn has_member(&self, user_id: Uuid) -> bool {
        self.members.contains(&user_id)
    }

    /// Appends `user_id` and credits `experience`. Returns false if already a member.
    pub fn add_member(&mut self, user_id: Uuid, experience: i64) -> bool {
        if self.has_member(user_id) {
            return false;
        }
        self.members.push(user_id);
        self.member_count = self.members.len() as i64;
        self.total_experience = self.total_experience.saturating_add(experience);
        true
    }

    /// Removes `user_id` and debits `experience`. Returns false if not a member.
    pub fn remove_member(&mut self, user_id: Uuid, experience: i64) -> bool {
        let before = self.members.len();
        self.members.retain(|m| *m != user_id);
        if self.members.len() == before {
            return false;
        }
        self.member_count = self.members.len() as i64;
        self.total_experience = self.total_experience.saturating_sub(experience);
        true
    }
}

#[derive(Debug, Clone)]
pub struct NewCommunity {
    pub name: String,
    pub logo: Option<String>,
}
