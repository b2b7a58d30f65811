//! # CRM Collaborator Module
//!
//! Everything that talks to the upstream CRM REST API lives here: the
//! wire-format record types with the CRM's upper-case field names, and
//! the reqwest-based client with cursor pagination.
//!
//! The rest of the application only ever sees normalized core types; the
//! ingestion boundary is `types::RawDeal::into_deal` and friends.

mod client;
mod types;

pub use client::{CrmClient, CrmError};
#[allow(unused_imports)]
pub use types::{PageResponse, RawDeal, RawPipeline, RawStage, RawUser};
