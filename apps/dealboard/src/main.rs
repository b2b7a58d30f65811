//! # Dealboard - CRM Dashboard Backend
//!
//! The main binary for the dealboard dashboard backend.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for snapshot and metric operations
//! - A client for the upstream CRM REST API
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                  apps/dealboard (THE BINARY)                   │
//! │                                                                │
//! │  ┌─────────────┐    ┌─────────────┐    ┌──────────────────┐    │
//! │  │   CLI       │    │   HTTP API  │    │   CRM Client     │    │
//! │  │  (clap)     │    │   (axum)    │    │   (reqwest)      │    │
//! │  └──────┬──────┘    └──────┬──────┘    └────────┬─────────┘    │
//! │         │                  │                    │              │
//! │         └──────────────────┼────────────────────┘              │
//! │                            ▼                                   │
//! │                  ┌──────────────────┐                          │
//! │                  │  dealboard-core  │                          │
//! │                  │   (THE LOGIC)    │                          │
//! │                  └──────────────────┘                          │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! dealboard server --host 0.0.0.0 --port 8080 --pipeline 9
//!
//! # CLI operations
//! dealboard pipelines
//! dealboard fetch -P 9
//! dealboard metrics -P 9 -U 42
//! ```

use clap::Parser;
use dealboard::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // Initialize tracing — DEALBOARD_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("DEALBOARD_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "dealboard=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Display startup banner
    if !cli.quiet {
        print_banner();
    }

    // Execute command
    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the dealboard startup banner.
fn print_banner() {
    println!(
        r#"
  ██████╗ ███████╗ █████╗ ██╗     ██████╗  ██████╗  █████╗ ██████╗ ██████╗
  ██╔══██╗██╔════╝██╔══██╗██║     ██╔══██╗██╔═══██╗██╔══██╗██╔══██╗██╔══██╗
  ██║  ██║█████╗  ███████║██║     ██████╔╝██║   ██║███████║██████╔╝██║  ██║
  ██║  ██║██╔══╝  ██╔══██║██║     ██╔══██╗██║   ██║██╔══██║██╔══██╗██║  ██║
  ██████╔╝███████╗██║  ██║███████╗██████╔╝╚██████╔╝██║  ██║██║  ██║██████╔╝
  ╚═════╝ ╚══════╝╚═╝  ╚═╝╚══════╝╚═════╝  ╚═════╝ ╚═╝  ╚═╝╚═╝  ╚═╝╚═════╝

  CRM Dashboard Backend v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
