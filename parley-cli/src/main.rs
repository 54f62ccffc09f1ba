mod call;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use parley_server::{RelayConfig, RelayServer};
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "parley", version, about = "Two-party WebRTC calls over a signaling relay")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a signaling relay.
    Relay {
        #[arg(long)]
        bind: Option<SocketAddr>,

        #[arg(long)]
        path: Option<String>,

        /// CORS allow-origin, `*` for any.
        #[arg(long)]
        allow_origin: Option<String>,
    },
    /// Join a room and call whoever else joins it.
    Call(call::CallArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Relay {
            bind,
            path,
            allow_origin,
        } => run_relay(bind, path, allow_origin).await,
        Commands::Call(args) => call::run(args).await,
    }
}

async fn run_relay(
    bind: Option<SocketAddr>,
    path: Option<String>,
    allow_origin: Option<String>,
) -> Result<()> {
    let mut config = RelayConfig::from_env()?;
    if let Some(bind) = bind {
        config.bind_addr = bind;
    }
    if let Some(path) = path {
        config.ws_path = path;
    }
    if allow_origin.is_some() {
        config.allow_origin = allow_origin;
    }
    config.validate()?;

    let server = RelayServer::new(config);
    let listener = server.bind().await?;

    println!("{}", "📡 Parley relay running".green().bold());
    println!(
        "   ws://{}{}",
        listener.local_addr()?,
        server.config().ws_path
    );
    println!("   {}", "Press Ctrl-C to stop".dimmed());

    server
        .serve(listener, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    println!("{}", "👋 Relay stopped".green());
    Ok(())
}
