//! Terminal front end: leaderboard view and join/leave controls over the HTTP API.

pub mod client;
pub mod render;

pub use client::ApiClient;
