use std::net::SocketAddr;
use axum::{Router, routing::get};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use crate::config::AppConfig;
use crate::state::AppState;
use crate::{communities, membership, telemetry, users};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(communities::router())
        .merge(users::router())
        .merge(membership::router())
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(telemetry::make_request_span)
                .on_response(telemetry::log_response),
        )
}

pub async fn serve(app: Router, config: &AppConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
    };
    use serde_json::Value;
    use time::OffsetDateTime;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::communities::repo_types::{Community, NewCommunity};
    use crate::store::{CommunityStore, InMemoryStore};
    use crate::users::repo_types::{ExperiencePoint, NewUser, User};

    struct Fixture {
        store: Arc<InMemoryStore>,
        app: Router,
    }

    impl Fixture {
        fn new() -> Self {
            let store = Arc::new(InMemoryStore::new());
            let app = build_app(AppState::in_memory(store.clone()));
            Self { store, app }
        }

        async fn user(&self, email: &str, points: &[i64]) -> User {
            self.store
                .insert_user(NewUser {
                    email: email.into(),
                    password_hash: "$argon2id$stub".into(),
                    profile_picture: Some(format!("https://img.example.com/{email}.png")),
                    experience_points: points
                        .iter()
                        .map(|p| ExperiencePoint {
                            points: *p,
                            timestamp: OffsetDateTime::UNIX_EPOCH,
                        })
                        .collect(),
                })
                .await
        }

        async fn community(&self, name: &str) -> Community {
            self.store
                .insert_community(NewCommunity {
                    name: name.into(),
                    logo: Some(format!("https://img.example.com/{name}.svg")),
                })
                .await
        }

        async fn call(&self, method: Method, uri: &str) -> (StatusCode, Value) {
            let req = Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap();
            let res = self.app.clone().oneshot(req).await.unwrap();
            let status = res.status();
            let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
            let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            (status, body)
        }
    }

    #[tokio::test]
    async fn health_is_ok() {
        let fx = Fixture::new();
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let res = fx.app.clone().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn join_then_leaderboard_reflects_membership() {
        let fx = Fixture::new();
        let u = fx.user("a@example.com", &[10, 5]).await;
        let small = fx.community("Small").await;
        let big = fx.community("Big").await;
        let whale = fx.user("whale@example.com", &[1000]).await;

        let (status, body) = fx
            .call(Method::POST, &format!("/user/{}/join/{}", u.id, small.id))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "User joined the community successfully");
        fx.call(Method::POST, &format!("/user/{}/join/{}", whale.id, big.id))
            .await;

        let (status, board) = fx.call(Method::GET, "/leaderboard").await;
        assert_eq!(status, StatusCode::OK);
        let board = board.as_array().unwrap();
        assert_eq!(board.len(), 2);
        assert_eq!(board[0]["_id"], big.id.to_string());
        assert_eq!(board[0]["totalExperience"], 1000);
        assert_eq!(board[0]["rank"], 1);
        assert_eq!(board[1]["name"], "Small");
        assert_eq!(board[1]["totalExperience"], 15);
        assert_eq!(board[1]["memberCount"], 1);
        assert_eq!(board[1]["logo"], "https://img.example.com/Small.svg");
    }

    #[tokio::test]
    async fn ids_in_other_textual_forms_address_the_same_records() {
        let fx = Fixture::new();
        let u = fx.user("a@example.com", &[3]).await;
        let c = fx.community("Crabs").await;
        let upper = u.id.hyphenated().to_string().to_uppercase();
        let simple = c.id.simple().to_string();

        let (status, _) = fx
            .call(Method::POST, &format!("/user/{upper}/join/{simple}"))
            .await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = fx
            .call(Method::POST, &format!("/user/{}/join/{}", u.id, c.id))
            .await;
        assert_eq!(status, StatusCode::OK);

        let stored = fx.store.find_community(c.id).await.unwrap().unwrap();
        assert_eq!(stored.members, vec![u.id]);
    }

    #[tokio::test]
    async fn join_unknown_entities_is_not_found() {
        let fx = Fixture::new();
        let u = fx.user("a@example.com", &[]).await;
        let c = fx.community("Crabs").await;

        let (status, body) = fx
            .call(Method::POST, &format!("/user/{}/join/{}", u.id, Uuid::new_v4()))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Community not found");

        let (status, body) = fx
            .call(Method::POST, &format!("/user/{}/join/{}", Uuid::new_v4(), c.id))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "User not found");
    }

    #[tokio::test]
    async fn malformed_id_is_bad_request() {
        let fx = Fixture::new();
        let c = fx.community("Crabs").await;
        let (status, body) = fx
            .call(Method::POST, &format!("/user/not-an-id/join/{}", c.id))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("not-an-id"));
    }

    #[tokio::test]
    async fn leave_by_non_member_is_rejected() {
        let fx = Fixture::new();
        let u = fx.user("a@example.com", &[8]).await;
        let c = fx.community("Crabs").await;

        let (status, body) = fx
            .call(Method::DELETE, &format!("/user/{}/leave/{}", u.id, c.id))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "User is not a part of this community");
    }

    #[tokio::test]
    async fn leave_clears_membership() {
        let fx = Fixture::new();
        let u = fx.user("a@example.com", &[8]).await;
        let c = fx.community("Crabs").await;
        fx.call(Method::POST, &format!("/user/{}/join/{}", u.id, c.id)).await;

        let (status, body) = fx
            .call(Method::DELETE, &format!("/user/{}/leave/{}", u.id, c.id))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "User left the community successfully");

        let (_, user) = fx.call(Method::GET, &format!("/user/{}", u.id)).await;
        assert!(user["communityID"].is_null());
        let (_, board) = fx.call(Method::GET, "/leaderboard").await;
        assert_eq!(board[0]["memberCount"], 0);
        assert_eq!(board[0]["totalExperience"], 0);
    }

    #[tokio::test]
    async fn get_user_returns_history_without_hash() {
        let fx = Fixture::new();
        let u = fx.user("a@example.com", &[4, 6]).await;

        let (status, body) = fx.call(Method::GET, &format!("/user/{}", u.id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "a@example.com");
        assert_eq!(body["experiencePoints"].as_array().unwrap().len(), 2);
        assert!(body.get("passwordHash").is_none());

        let (status, body) = fx
            .call(Method::GET, &format!("/user/{}", Uuid::new_v4()))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "User not found");
    }

    #[tokio::test]
    async fn list_users_includes_totals() {
        let fx = Fixture::new();
        fx.user("a@example.com", &[4, 6]).await;
        fx.user("new@example.com", &[]).await;

        let (status, body) = fx.call(Method::GET, "/user").await;
        assert_eq!(status, StatusCode::OK);
        let users = body.as_array().unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0]["totalExperience"], 10);
        assert_eq!(users[1]["email"], "new@example.com");
        assert_eq!(users[1]["totalExperience"], 0);
    }

    #[tokio::test]
    async fn list_communities_for_selection() {
        let fx = Fixture::new();
        let c = fx.community("Crabs").await;
        let (status, body) = fx.call(Method::GET, "/community").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["_id"], c.id.to_string());
        assert_eq!(body[0]["name"], "Crabs");
    }

    #[tokio::test]
    async fn store_failure_is_opaque_server_error() {
        let fx = Fixture::new();
        let u = fx.user("a@example.com", &[1]).await;
        let c = fx.community("Crabs").await;
        fx.store.fail_commits(true);

        let (status, body) = fx
            .call(Method::POST, &format!("/user/{}/join/{}", u.id, c.id))
            .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal Server Error");
    }

    #[tokio::test]
    async fn reconcile_endpoint_reports_updates() {
        let fx = Fixture::new();
        let (status, body) = fx.call(Method::POST, "/leaderboard/reconcile").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["updated"], 0);
    }
}
