//! AOMA Mesh server entry point.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::broadcast;

use aoma_mesh::adapters::mcp::{self, StdioServer};
use aoma_mesh::infrastructure::config::Environment;
use aoma_mesh::infrastructure::logging;
use aoma_mesh::Server;

/// How long in-flight handlers get to finish after a shutdown signal.
const DRAIN_WINDOW: Duration = Duration::from_secs(1);

#[derive(Parser, Debug)]
#[command(name = "aoma-mesh", version, about = "MCP server for the AOMA knowledge corpus")]
struct Cli {
    /// Also serve MCP over stdio (stdout becomes protocol-only).
    #[arg(long)]
    stdio: bool,

    /// Override the HTTP listen port from the environment.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let env = Environment::load().context("environment validation failed")?;
    logging::init_tracing(env.log_level);

    let port = cli.port.unwrap_or(env.http_port);
    let version = env.version.clone();
    let server = Arc::new(Server::from_environment(env).context("failed to build server")?);

    // Startup gate: one probe round; refusing to start beats serving a
    // server whose every tool call would fail.
    let startup_health = server.ctx.health.probe_now().await;
    if startup_health.status == aoma_mesh::domain::models::OverallStatus::Unhealthy {
        bail!("no upstream service is reachable; refusing to start");
    }

    let (shutdown_tx, _) = broadcast::channel(4);
    let sweeper = server.ctx.cache.spawn_sweeper(shutdown_tx.subscribe());
    let prober = server.ctx.health.spawn_probe_loop(shutdown_tx.subscribe());

    let http_handle = {
        let server = Arc::clone(&server);
        let shutdown = shutdown_tx.subscribe();
        tokio::spawn(async move { mcp::serve(server, port, shutdown).await })
    };

    let stdio_handle = cli.stdio.then(|| {
        let server = Arc::clone(&server);
        let shutdown = shutdown_tx.subscribe();
        tokio::spawn(async move { StdioServer::new(server).run(shutdown).await })
    });

    tracing::info!(version = %version, port, stdio = cli.stdio, "aoma-mesh ready");

    wait_for_signal().await?;
    tracing::info!("shutdown signal received, draining");

    let _ = shutdown_tx.send(());

    // Stop accepting new work, then give in-flight handlers a short
    // window before exiting.
    let mut clean = true;
    if tokio::time::timeout(DRAIN_WINDOW, http_handle).await.is_err() {
        tracing::warn!("HTTP transport did not drain within the window");
        clean = false;
    }
    if let Some(handle) = stdio_handle {
        if tokio::time::timeout(DRAIN_WINDOW, handle).await.is_err() {
            tracing::warn!("stdio transport did not drain within the window");
            clean = false;
        }
    }
    sweeper.abort();
    prober.abort();

    if clean {
        Ok(())
    } else {
        std::process::exit(1);
    }
}

async fn wait_for_signal() -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;
    tokio::select! {
        _ = sigint.recv() => {}
        _ = sigterm.recv() => {}
        _ = sighup.recv() => {}
    }
    Ok(())
}
