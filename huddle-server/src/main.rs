use std::sync::Arc;

use clap::Parser;
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

use huddle_core::video::{StreamVideoClient, VideoConfig};
use huddle_core::HuddleConfig;
use huddle_server::http::{start_http_server, HttpState};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "huddle.toml")]
    config: String,

    #[arg(long)]
    health: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience — production uses real env vars)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Init logging
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    // Load config
    let config = match HuddleConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // Connect to DB
    let pool = match huddle_core::db::create_pool(&config.database).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    if args.health {
        match huddle_core::db::health_check(&pool).await {
            Ok(v) => println!("✅ PostgreSQL connected: {}", v),
            Err(e) => {
                println!("❌ PostgreSQL connection failed: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    huddle_core::db::run_migrations(&pool).await?;

    // Missing vendor credentials or session secret are fatal at startup.
    let video_config = match VideoConfig::from_settings(&config.video) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    let video = match StreamVideoClient::new(video_config) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            eprintln!("Failed to build video client: {}", e);
            std::process::exit(1);
        }
    };
    let session_secret = match config.auth.resolve_secret() {
        Some(s) => s,
        None => {
            eprintln!("Session secret is missing (set HUDDLE_SESSION_SECRET or [auth].session_secret)");
            std::process::exit(1);
        }
    };

    let state = Arc::new(HttpState {
        pool,
        config,
        session_secret,
        video,
    });

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received ctrl-c, shutting down");
            let _ = shutdown_tx.send(());
        }
    });

    start_http_server(state, shutdown_rx).await
}
