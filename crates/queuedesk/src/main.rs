// SPDX-FileCopyrightText: 2026 Queuedesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queuedesk - walk-in queue dispatch engine.
//!
//! This is the binary entry point: one engine operation per invocation.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod commands;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use queuedesk_bus::NotificationBus;
use queuedesk_config::model::QueueDeskConfig;
use queuedesk_core::{ErrorKind, QueueDeskError, QueuePriority, ServicePointStatus};
use queuedesk_engine::{QueueEngine, SystemClock};

/// Queuedesk - walk-in queue dispatch engine.
#[derive(Parser, Debug)]
#[command(name = "queuedesk", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print the notifications the command published to stderr.
    #[arg(long, global = true)]
    notifications: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage services.
    #[command(subcommand)]
    Service(ServiceCommand),
    /// Manage service points.
    #[command(subcommand)]
    Point(PointCommand),
    /// Put a new customer in the queue of a service.
    Join {
        service_id: String,
    },
    /// Inspect queue items.
    #[command(subcommand)]
    Item(ItemCommand),
    /// Show the board across all service points.
    Board {
        /// Waiting items shown per service.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Report adapter health.
    Health,
}

#[derive(Subcommand, Debug)]
enum ServiceCommand {
    Add {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    List,
    Show {
        id: String,
    },
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    Rm {
        id: String,
    },
}

#[derive(Args, Debug)]
struct PointFields {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    description: Option<String>,
    /// Service served by the point; repeat for several.
    #[arg(long = "service")]
    services: Vec<String>,
}

#[derive(Subcommand, Debug)]
enum PointCommand {
    Add {
        /// Label shown on the board, e.g. `3`.
        number: String,
        #[command(flatten)]
        fields: PointFields,
    },
    List,
    Show {
        id: String,
    },
    Update {
        id: String,
        #[arg(long)]
        number: Option<String>,
        #[command(flatten)]
        fields: PointFields,
        /// Remove every service from the point.
        #[arg(long, conflicts_with = "services")]
        clear_services: bool,
    },
    Rm {
        id: String,
    },
    /// Request a status change: CLOSED, WAITING, IN_SERVICE or SERVED.
    Status {
        id: String,
        status: ServicePointStatus,
    },
}

#[derive(Subcommand, Debug)]
enum ItemCommand {
    Show {
        id: String,
    },
    List {
        service_id: String,
    },
    /// Change the priority of a waiting item: HIGH or MEDIUM.
    Priority {
        id: String,
        priority: QueuePriority,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup
    let loaded = match &cli.config {
        Some(path) => queuedesk_config::load_and_validate_path(path),
        None => queuedesk_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            queuedesk_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.logging.level);

    if let Err(e) = run(cli, &config).await {
        eprintln!("queuedesk: {} error: {e}", kind_label(e.kind()));
        std::process::exit(exit_code(e.kind()));
    }
}

async fn run(cli: Cli, config: &QueueDeskConfig) -> Result<(), QueueDeskError> {
    let store = queuedesk_storage::open_store(&config.storage).await?;
    let bus = Arc::new(NotificationBus::new(config.notify.channel_capacity));
    let mut published = bus.subscribe();
    let engine = QueueEngine::new(store, bus, Arc::new(SystemClock), config);

    let result = commands::execute(&engine, cli.command).await;
    engine.shutdown().await?;

    if cli.notifications {
        while let Ok(notification) = published.try_recv() {
            eprintln!("{}", serde_json::to_string(&notification).unwrap_or_default());
        }
    }

    let output = result?;
    println!(
        "{}",
        serde_json::to_string_pretty(&output)
            .map_err(|e| QueueDeskError::Internal(format!("output encoding: {e}")))?
    );
    Ok(())
}

fn kind_label(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::NotFound => "not found",
        ErrorKind::Conflict => "conflict",
        ErrorKind::InvalidRequest => "invalid request",
        ErrorKind::Internal => "internal",
    }
}

fn exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Internal => 1,
        ErrorKind::NotFound => 2,
        ErrorKind::Conflict => 3,
        ErrorKind::InvalidRequest => 4,
    }
}

/// Initializes the tracing subscriber with the given log level.
///
/// Logs go to stderr so stdout carries only command output.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("queuedesk={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
