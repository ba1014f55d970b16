//! MysticChests Backend Daemon
//!
//! This is the main entry point for the MysticChests backend service, a
//! daemon that owns the chest database and the in-memory working set.
//!
//! The daemon provides:
//! - Whole-lifecycle management of chest records (load at startup,
//!   flush at shutdown)
//! - Key validation and loot payload decoding for hosts
//! - Cancellable guide trackers emitting directional hints
//! - The admin command surface (create, guide)

use anyhow::{Context, Result};
use clap::Parser;

use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mysticchests_backend::service::ChestService;
use mysticchests_backend::tracker::GuideHint;
use mysticchests_backend::Config;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Chest database path, overriding the configuration
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

/// Main daemon state
pub struct Daemon {
    service: Arc<ChestService>,
    hints: mpsc::UnboundedReceiver<GuideHint>,
}

impl Daemon {
    /// Create a new daemon instance
    pub async fn new(config: Config) -> Result<Self> {
        info!("Initializing MysticChests backend daemon");

        let (service, hints) = ChestService::new(config).context("Failed to open chest store")?;
        let service = Arc::new(service);

        service
            .startup()
            .await
            .context("Failed to load the chest working set")?;
        info!("Working set loaded: {} chests", service.chest_count().await);

        Ok(Self { service, hints })
    }

    /// Run the daemon until a termination signal arrives.
    pub async fn run(self) -> Result<()> {
        info!("Starting MysticChests backend daemon");

        let Daemon {
            service,
            mut hints,
        } = self;

        // Drain guide hints; a host integration would render these as
        // particle trails near the holder.
        let hint_handle = tokio::spawn(async move {
            while let Some(hint) = hints.recv().await {
                debug!("guide hint for {:?} toward {}", hint.chest, hint.location);
            }
        });

        // Set up signal handling for graceful shutdown
        let shutdown_signal = async {
            let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("Failed to register SIGTERM handler");
            let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())
                .expect("Failed to register SIGINT handler");

            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, initiating graceful shutdown");
                },
                _ = sigint.recv() => {
                    info!("Received SIGINT, initiating graceful shutdown");
                },
            }
        };

        shutdown_signal.await;

        // Graceful shutdown: stop trackers and flush the working set.
        info!("Shutting down MysticChests backend daemon");
        service
            .shutdown()
            .await
            .context("Failed to flush the working set")?;

        hint_handle.abort();
        info!("MysticChests backend daemon stopped");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(true)
                .with_level(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    info!(
        "Starting MysticChests Backend v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Load configuration
    let config_path = args
        .config
        .unwrap_or_else(|| PathBuf::from("/etc/mysticchests/backend.toml"));

    let mut config = Config::load(&config_path).unwrap_or_else(|e| {
        warn!(
            "Failed to load config from {:?}: {}. Using defaults.",
            config_path, e
        );
        Config::default()
    });

    // Override config with command line arguments
    if let Some(database) = args.database {
        config.storage.database_path = database;
    }

    // Validate configuration
    config
        .validate()
        .context("Configuration validation failed")?;
    info!("Configuration loaded and validated");

    // Create daemon
    let daemon = Daemon::new(config)
        .await
        .context("Failed to create daemon")?;

    // Run daemon
    match daemon.run().await {
        Ok(()) => {
            info!("Daemon exited successfully");
            Ok(())
        }
        Err(e) => {
            error!("Daemon failed: {}", e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_daemon_creation() {
        let temp_dir = tempdir().unwrap();

        let mut config = Config::default();
        config.storage.database_path = temp_dir.path().join("chests.db");

        let daemon = Daemon::new(config).await;
        assert!(daemon.is_ok());
    }

    #[test]
    fn test_args_parsing() {
        use clap::Parser;

        let args = Args::try_parse_from([
            "mysticchests-backend",
            "--debug",
            "--database",
            "/tmp/chests.db",
        ]);

        assert!(args.is_ok());
        let args = args.unwrap();
        assert!(args.debug);
        assert_eq!(args.database, Some(PathBuf::from("/tmp/chests.db")));
    }
}
