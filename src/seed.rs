//! Demo data for local runs.

use argon2::{password_hash::SaltString, Argon2, PasswordHasher};
use rand::{rngs::OsRng, Rng};
use time::{Duration, OffsetDateTime};
use tracing::error;

use crate::communities::repo_types::NewCommunity;
use crate::users::repo_types::{ExperiencePoint, NewUser};

const COMMUNITY_NAMES: &[&str] = &[
    "Rustaceans",
    "Gophers",
    "Pythonistas",
    "Crustaceans United",
    "Lambda Lounge",
];

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn demo_communities() -> Vec<NewCommunity> {
    COMMUNITY_NAMES
        .iter()
        .map(|name| NewCommunity {
            name: (*name).to_string(),
            logo: Some(format!(
                "https://img.example.com/logos/{}.png",
                name.to_lowercase().replace(' ', "-")
            )),
        })
        .collect()
}

/// Random experience history: up to `max_entries` awards of 1..=100 points over the last 90 days.
pub fn random_history<R: Rng>(rng: &mut R, max_entries: usize, now: OffsetDateTime) -> Vec<ExperiencePoint> {
    let n = rng.gen_range(0..=max_entries);
    let mut history: Vec<ExperiencePoint> = (0..n)
        .map(|_| ExperiencePoint {
            points: rng.gen_range(1..=100),
            timestamp: now - Duration::minutes(rng.gen_range(0..90 * 24 * 60)),
        })
        .collect();
    history.sort_by_key(|e| e.timestamp);
    history
}

pub fn demo_user<R: Rng>(rng: &mut R, index: usize, password: &str) -> anyhow::Result<NewUser> {
    Ok(NewUser {
        email: format!("player{index}@example.com"),
        password_hash: hash_password(password)?,
        profile_picture: Some(format!("https://img.example.com/avatars/{index}.png")),
        experience_points: random_history(rng, 12, OffsetDateTime::now_utc()),
    })
}
