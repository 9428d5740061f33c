use communityboard::telemetry::{self, LogSettings};
use communityboard::{app, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    telemetry::init(&LogSettings::from_env(
        "communityboard=debug,axum=info,tower_http=info",
    ));

    let app_state = AppState::init().await?;
    let config = app_state.config.clone();

    let router = app::build_app(app_state);
    app::serve(router, &config).await?;

    Ok(())
}
