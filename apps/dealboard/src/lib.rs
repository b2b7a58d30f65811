//! # Dealboard Application Library
//!
//! HTTP API server and CLI for the dealboard CRM dashboard backend.
//! The pure aggregation logic lives in `dealboard-core`; this crate adds
//! the upstream CRM client, the axum API surface, and the CLI.

pub mod api;
pub mod cli;
pub mod crm;
