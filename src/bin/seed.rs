use anyhow::Context;
use clap::Parser;
use communityboard::telemetry::{self, LogSettings};
use communityboard::{config::AppConfig, membership, seed, store::PgStore};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "communityboard-seed", about = "Fill the database with demo users and communities")]
struct Args {
    /// Number of users to create
    #[arg(long, default_value_t = 20)]
    users: usize,

    /// Password given to every demo user
    #[arg(long, default_value = "password123")]
    password: String,

    /// RNG seed, for reproducible data
    #[arg(long)]
    rng_seed: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init(&LogSettings::from_env("communityboard=info"));

    let args = Args::parse();
    let config = AppConfig::from_env()?;
    let store = PgStore::connect(&config.database_url, config.db_max_connections).await?;
    store.migrate().await?;

    let mut rng = match args.rng_seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    let mut communities = Vec::new();
    for new in seed::demo_communities() {
        communities.push(store.create_community(&new).await?);
    }

    for i in 0..args.users {
        let new = seed::demo_user(&mut rng, i, &args.password)?;
        let user = store
            .create_user(&new)
            .await
            .with_context(|| format!("create {}", new.email))?;
        // roughly one in five users stays unaffiliated
        if i % 5 != 4 {
            if let Some(c) = communities.choose(&mut rng) {
                membership::services::join(&store, config.membership_max_attempts, user.id, c.id)
                    .await?;
            }
        }
    }

    info!(users = args.users, communities = communities.len(), "seeded demo data");
    Ok(())
}
