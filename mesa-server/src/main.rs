use clap::Parser;
use mesa_core::MesaConfig;
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

use mesa_server::http;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "mesa.toml")]
    config: String,

    #[arg(long)]
    health: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience — production uses real env vars)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Load config
    let config = match MesaConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // Init logging — RUST_LOG wins, otherwise the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.service.log_level));
    fmt().with_env_filter(filter).init();

    // Connect to DB
    let pool = match mesa_core::db::create_pool(&config.database).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    if args.health {
        match mesa_core::db::health_check(&pool).await {
            Ok(v) => println!("PostgreSQL connected: {}", v),
            Err(e) => {
                println!("PostgreSQL connection failed: {}", e);
                std::process::exit(1);
            }
        }

        println!("Mesa DB health check passed");
        return Ok(());
    }

    let (tx, rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for Ctrl+C");
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    http::start_http_server(pool, config, rx).await?;

    Ok(())
}
