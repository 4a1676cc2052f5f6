// radius-probe: a thin CLI for manually exercising a configured client
// pool. Not part of the library's public contract.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use radius_failover_client::{Client, ClientConfig};

#[derive(Parser)]
#[command(author, version, about = "Manual smoke-test client for a RADIUS failover pool")]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Path to a TOML client configuration file.
    #[arg(short, long, default_value = "radius-client.toml")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Perform one authentication against the current active host.
    Auth {
        #[arg(short, long)]
        user: String,
        #[arg(short, long)]
        password: String,
    },
    /// Print the active host and each pool member's health snapshot.
    Status,
    /// Force a failover sequence and print the result.
    Failover,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config = match ClientConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(error) => {
            tracing::error!(config = ?args.config, %error, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    let client = match Client::new(config).await {
        Ok(client) => client,
        Err(error) => {
            tracing::error!(%error, "failed to construct client");
            return ExitCode::FAILURE;
        }
    };

    let result = match args.command {
        Commands::Auth { user, password } => run_auth(&client, &user, &password).await,
        Commands::Status => run_status(&client).await,
        Commands::Failover => run_failover(&client).await,
    };

    client.shutdown().await;
    result
}

async fn run_auth(client: &Client, user: &str, password: &str) -> ExitCode {
    match client.authenticate(user, password).await {
        Ok(outcome) => {
            match serde_json::to_string_pretty(&outcome) {
                Ok(json) => println!("{json}"),
                Err(error) => tracing::error!(%error, "failed to serialize outcome"),
            }
            if outcome.ok {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(error) => {
            tracing::error!(%error, "authentication call failed");
            ExitCode::FAILURE
        }
    }
}

async fn run_status(client: &Client) -> ExitCode {
    println!("active host: {}", client.get_active_host().await);
    for record in client.health_snapshot().await {
        println!(
            "  {}: consecutive_failures={} last_ok_at={:?} last_tried_at={:?}",
            record.host, record.consecutive_failures, record.last_ok_at, record.last_tried_at
        );
    }
    ExitCode::SUCCESS
}

async fn run_failover(client: &Client) -> ExitCode {
    match client.failover().await {
        Some(host) => {
            println!("failed over to {host}");
            ExitCode::SUCCESS
        }
        None => {
            println!("no responsive host found");
            ExitCode::FAILURE
        }
    }
}
