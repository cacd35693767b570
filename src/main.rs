use anyhow::Result;
use clap::{Parser, Subcommand};
use restic_exporter::*;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[derive(Parser, Debug)]
#[command(name = "restic-exporter", version, about = "Export restic metrics for Prometheus")]
struct Cli {
    /// Path of the TOML config file.
    #[arg(short, long, env = "CONFIG_FILE", default_value = "config.toml")]
    config: PathBuf,

    /// Address to bind; overrides server.host.
    #[arg(long)]
    host: Option<String>,

    /// Port to bind; overrides server.port.
    #[arg(short, long)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load and validate the config file, then exit.
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let cli = Cli::parse();
    let mut app_config = config::AppConfig::load(Some(cli.config.as_path()))?;

    if let Some(Command::Validate) = cli.command {
        println!("{}: config OK", cli.config.display());
        for target in &app_config.targets {
            println!(
                "  {} (alias {:?}) group_by={}",
                target.path,
                target.alias,
                target.effective_group_by(&app_config.global)
            );
        }
        return Ok(());
    }

    if let Some(host) = cli.host {
        app_config.server.host = host;
    }
    if let Some(port) = cli.port {
        app_config.server.port = port;
    }

    if app_config.targets.is_empty() {
        tracing::warn!("no targets configured; /metrics will be empty");
    }

    let probe = Arc::new(probe::ResticProbe::new(
        app_config.global.restic_binary.clone(),
    ));
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let collector = Arc::new(collector::Collector::new(Arc::new(app_config), probe));

    let app = routes::app(collector);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("{} listening on http://{}", version::banner(), addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("Server stopped");

    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    tracing::info!("Received shutdown signal");
}
