//! # Dealboard CLI Module
//!
//! This module implements the CLI interface for Dealboard.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `pipelines` - List pipelines from the upstream CRM
//! - `users` - List users from the upstream CRM
//! - `stages` - List deal stages from the upstream CRM
//! - `fetch` - Fetch a full snapshot and print counts
//! - `metrics` - Fetch a snapshot and print computed metrics

mod commands;

use clap::{Parser, Subcommand};
use dealboard_core::DealboardError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Dealboard - CRM Dashboard Backend
///
/// Fetches deals, users, and stages from an upstream CRM REST API and
/// serves aggregated dashboard metrics over HTTP.
#[derive(Parser, Debug)]
#[command(name = "dealboard")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Base URL of the upstream CRM REST API (or set DEALBOARD_CRM_URL)
    #[arg(short = 'u', long, global = true)]
    pub base_url: Option<String>,

    /// Path to a TOML file with metric definitions (default: built-in table)
    #[arg(short = 'm', long, global = true)]
    pub metrics_config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Pipeline (deal category) to serve
        #[arg(short = 'P', long)]
        pipeline: Option<String>,
    },

    /// List pipelines from the upstream CRM
    Pipelines,

    /// List users from the upstream CRM
    Users,

    /// List deal stages from the upstream CRM
    Stages,

    /// Fetch a full snapshot and print counts
    Fetch {
        /// Pipeline (deal category) to fetch
        #[arg(short = 'P', long)]
        pipeline: Option<String>,
    },

    /// Fetch a snapshot and print computed metrics
    Metrics {
        /// Pipeline (deal category) to fetch
        #[arg(short = 'P', long)]
        pipeline: Option<String>,

        /// Restrict metrics to deals assigned to this user id
        #[arg(short = 'U', long)]
        user: Option<String>,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Resolve the upstream base URL from the flag or the environment.
fn resolve_base_url(flag: Option<String>) -> Result<String, DealboardError> {
    flag.or_else(|| std::env::var("DEALBOARD_CRM_URL").ok())
        .ok_or_else(|| {
            DealboardError::Config(
                "No upstream URL: pass --base-url or set DEALBOARD_CRM_URL".to_string(),
            )
        })
}

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), DealboardError> {
    let base_url = resolve_base_url(cli.base_url)?;
    let metrics = load_metric_set(cli.metrics_config.as_deref())?;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server {
            host,
            port,
            pipeline,
        }) => cmd_server(&base_url, &host, port, pipeline, metrics).await,
        Some(Commands::Pipelines) => cmd_pipelines(&base_url, json_mode).await,
        Some(Commands::Users) => cmd_users(&base_url, json_mode).await,
        Some(Commands::Stages) => cmd_stages(&base_url, json_mode).await,
        Some(Commands::Fetch { pipeline }) => {
            cmd_fetch(&base_url, json_mode, pipeline, &metrics).await
        }
        Some(Commands::Metrics { pipeline, user }) => {
            cmd_metrics(&base_url, json_mode, pipeline, user, &metrics).await
        }
        None => {
            // No subcommand - show a snapshot summary by default
            cmd_fetch(&base_url, json_mode, None, &metrics).await
        }
    }
}
