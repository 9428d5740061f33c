use anyhow::Context;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use crate::communities::dto::{CommunitySummary, LeaderboardEntry};
use crate::error::ErrorBody;
use crate::membership::handlers::MessageResponse;
use crate::users::dto::UserWithTotal;

/// HTTP client for the board's JSON API.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("build http client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn leaderboard(&self) -> anyhow::Result<Vec<LeaderboardEntry>> {
        self.get("/leaderboard").await
    }

    pub async fn users(&self) -> anyhow::Result<Vec<UserWithTotal>> {
        self.get("/user").await
    }

    pub async fn communities(&self) -> anyhow::Result<Vec<CommunitySummary>> {
        self.get("/community").await
    }

    pub async fn join(&self, user_id: Uuid, community_id: Uuid) -> anyhow::Result<String> {
        let url = self.url(&format!("/user/{user_id}/join/{community_id}"));
        debug!(%url, "join");
        let res = self.http.post(&url).send().await.with_context(|| format!("POST {url}"))?;
        Ok(decode::<MessageResponse>(res).await?.message)
    }

    pub async fn leave(&self, user_id: Uuid, community_id: Uuid) -> anyhow::Result<String> {
        let url = self.url(&format!("/user/{user_id}/leave/{community_id}"));
        debug!(%url, "leave");
        let res = self.http.delete(&url).send().await.with_context(|| format!("DELETE {url}"))?;
        Ok(decode::<MessageResponse>(res).await?.message)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> anyhow::Result<T> {
        let url = self.url(path);
        debug!(%url, "get");
        let res = self.http.get(&url).send().await.with_context(|| format!("GET {url}"))?;
        decode(res).await
    }
}

/// Decodes a success body, or turns the server's `{message}` into the error.
async fn decode<T: DeserializeOwned>(res: Response) -> anyhow::Result<T> {
    let status = res.status();
    if status.is_success() {
        return res.json::<T>().await.context("decode response body");
    }
    let message = match res.json::<ErrorBody>().await {
        Ok(body) => body.message,
        Err(_) => status.to_string(),
    };
    anyhow::bail!("{message} ({})", status.as_u16())
}
