//! # pkgctl
//!
//! Operator CLI for the Package Manager Controller.
//!
//! ```bash
//! # Pause reconciliation of a Package
//! pkgctl pause my-package
//!
//! # Resume reconciliation
//! pkgctl resume my-package
//!
//! # List Packages with their current revision
//! pkgctl list
//!
//! # Show the status of a Package and its revisions
//! pkgctl status my-package
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kube::Client;

mod list;
mod pause;
mod status;

/// Package Manager Controller CLI
#[derive(Parser)]
#[command(name = "pkgctl")]
#[command(about = "Package Manager Controller CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pause reconciliation of a Package
    Pause {
        /// Name of the Package
        #[arg(value_name = "NAME")]
        name: String,
    },
    /// Resume reconciliation of a paused Package
    Resume {
        /// Name of the Package
        #[arg(value_name = "NAME")]
        name: String,
    },
    /// List all Packages
    List,
    /// Show the status of a Package and its revisions
    Status {
        /// Name of the Package
        #[arg(value_name = "NAME")]
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        anyhow::bail!("Failed to install rustls crypto provider");
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pkgctl=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client. Ensure kubeconfig is configured.")?;

    match cli.command {
        Commands::Pause { name } => pause::pause_command(client, &name).await,
        Commands::Resume { name } => pause::resume_command(client, &name).await,
        Commands::List => list::list_command(client).await,
        Commands::Status { name } => status::status_command(client, &name).await,
    }
}
