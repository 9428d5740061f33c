use std::fmt::Write as _;

use uuid::Uuid;

use crate::communities::dto::{CommunitySummary, LeaderboardEntry};
use crate::users::dto::UserWithTotal;

/// Text table with rank, community, logo, experience and members columns.
pub fn render_leaderboard(entries: &[LeaderboardEntry]) -> String {
    if entries.is_empty() {
        return "No communities yet.\n".to_string();
    }

    let name_w = entries
        .iter()
        .map(|e| e.name.chars().count())
        .max()
        .unwrap_or(0)
        .max("Community".len());

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>4}  {:<name_w$}  {:>10}  {:>7}  Logo",
        "Rank", "Community", "Experience", "Members"
    );
    for e in entries {
        let _ = writeln!(
            out,
            "{:>4}  {:<name_w$}  {:>10}  {:>7}  {}",
            e.rank,
            e.name,
            e.total_experience,
            e.member_count,
            e.logo.as_deref().unwrap_or("-")
        );
    }
    out
}

pub fn render_users(users: &[UserWithTotal]) -> String {
    let mut out = String::new();
    for u in users {
        let community = u
            .community_id
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".into());
        let _ = writeln!(out, "{}  {:>8} xp  community {}", u.email, u.total_experience, community);
    }
    out
}

pub fn render_communities(communities: &[CommunitySummary]) -> String {
    let mut out = String::new();
    for c in communities {
        let _ = writeln!(out, "{}  ({} members)", c.name, c.member_count);
    }
    out
}

/// Resolves the user picked by email and the community picked by name.
pub fn resolve_selection(
    users: &[UserWithTotal],
    communities: &[CommunitySummary],
    email: &str,
    community_name: &str,
) -> anyhow::Result<(Uuid, Uuid)> {
    let email = email.trim();
    let user = users
        .iter()
        .find(|u| u.email.eq_ignore_ascii_case(email))
        .ok_or_else(|| anyhow::anyhow!("no user with email {email}"))?;

    let mut matches = communities.iter().filter(|c| c.name == community_name.trim());
    let community = matches
        .next()
        .ok_or_else(|| anyhow::anyhow!("no community named {community_name}"))?;
    if matches.next().is_some() {
        anyhow::bail!("community name {community_name} is ambiguous");
    }
    Ok((user.id, community.id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(rank: usize, name: &str, xp: i64, members: i64) -> LeaderboardEntry {
        LeaderboardEntry {
            id: Uuid::new_v4(),
            name: name.into(),
            logo: None,
            total_experience: xp,
            member_count: members,
            rank,
        }
    }

    fn summary(name: &str) -> CommunitySummary {
        CommunitySummary {
            id: Uuid::new_v4(),
            name: name.into(),
            logo: None,
            total_experience: 0,
            member_count: 0,
        }
    }

    fn user(email: &str) -> UserWithTotal {
        UserWithTotal {
            id: Uuid::new_v4(),
            email: email.into(),
            profile_picture: None,
            total_experience: 0,
            community_id: None,
        }
    }

    #[test]
    fn leaderboard_rows_follow_rank_order() {
        let table = render_leaderboard(&[entry(1, "B", 300, 2), entry(2, "A", 150, 1)]);
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Rank"));
        assert!(lines[1].trim_start().starts_with("1  B"));
        assert!(lines[1].contains("300"));
        assert!(lines[2].trim_start().starts_with("2  A"));
    }

    #[test]
    fn empty_leaderboard_says_so() {
        assert_eq!(render_leaderboard(&[]), "No communities yet.\n");
    }

    #[test]
    fn selection_resolves_email_case_insensitively() {
        let users = vec![user("ada@example.com"), user("bob@example.com")];
        let communities = vec![summary("Crabs"), summary("Gophers")];
        let (u, c) = resolve_selection(&users, &communities, "BOB@example.com", "Gophers").unwrap();
        assert_eq!(u, users[1].id);
        assert_eq!(c, communities[1].id);
    }

    #[test]
    fn selection_rejects_unknown_and_ambiguous_names() {
        let users = vec![user("ada@example.com")];
        let communities = vec![summary("Crabs"), summary("Crabs")];
        assert!(resolve_selection(&users, &communities, "eve@example.com", "Crabs").is_err());
        let err = resolve_selection(&users, &communities, "ada@example.com", "Crabs").unwrap_err();
        assert!(err.to_string().contains("ambiguous"));
    }
}
