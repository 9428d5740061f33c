use clap::{Parser, Subcommand};
use communityboard::presentation::{render, ApiClient};
use communityboard::telemetry::{self, LogSettings};
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "communityboard-cli")]
#[command(author, version, about = "Leaderboard and membership controls", long_about = None)]
struct Args {
    /// Base URL of the communityboard server
    #[arg(long, env = "COMMUNITYBOARD_URL", default_value = "http://localhost:8080")]
    base_url: String,

    /// Log filter for the client itself
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show communities ranked by total experience
    Leaderboard,
    /// List users that can be selected
    Users,
    /// List communities that can be selected
    Communities,
    /// Put a user into a community
    Join {
        #[arg(long)]
        user: String,
        #[arg(long)]
        community: String,
    },
    /// Take a user out of a community
    Leave {
        #[arg(long)]
        user: String,
        #[arg(long)]
        community: String,
    },
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    telemetry::init(&LogSettings {
        filter: args.log_level.clone(),
        ..LogSettings::from_env("warn")
    });

    if let Err(e) = run(args).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let client = ApiClient::new(&args.base_url)?;
    debug!(base_url = %args.base_url, "client ready");

    match args.command {
        Command::Leaderboard => {
            eprintln!("Loading...");
            let board = client.leaderboard().await?;
            print!("{}", render::render_leaderboard(&board));
        }
        Command::Users => print!("{}", render::render_users(&client.users().await?)),
        Command::Communities => {
            print!("{}", render::render_communities(&client.communities().await?))
        }
        Command::Join { user, community } => {
            let (uid, cid) = select(&client, &user, &community).await?;
            client.join(uid, cid).await?;
            println!("Successfully joined the community");
        }
        Command::Leave { user, community } => {
            let (uid, cid) = select(&client, &user, &community).await?;
            client.leave(uid, cid).await?;
            println!("Successfully left the community");
        }
    }
    Ok(())
}

async fn select(
    client: &ApiClient,
    email: &str,
    community: &str,
) -> anyhow::Result<(uuid::Uuid, uuid::Uuid)> {
    let (users, communities) = tokio::try_join!(client.users(), client.communities())?;
    render::resolve_selection(&users, &communities, email, community)
}
