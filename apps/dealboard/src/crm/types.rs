//! # CRM Wire Types
//!
//! JSON shapes as the CRM returns them: upper-case field names, string
//! identifiers, heterogeneous flag encodings, and a `next` pagination
//! cursor. Conversion into core types is the normalization boundary —
//! past this file nothing carries the union encodings.

use dealboard_core::{
    Deal, DealId, Pipeline, PipelineId, RawFlag, StageId, StageMeta, User, UserId,
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

// =============================================================================
// PAGINATED RESPONSE ENVELOPE
// =============================================================================

/// One page of a list response.
///
/// The CRM signals continuation via `next`: the offset to request the
/// following page with. Absent `next` means the cursor is exhausted.
#[derive(Debug, Clone, Deserialize)]
pub struct PageResponse<T> {
    /// Records on this page.
    pub result: Vec<T>,
    /// Offset of the next page, absent on the last page.
    #[serde(default)]
    pub next: Option<u64>,
}

// =============================================================================
// RAW RECORDS
// =============================================================================

/// A pipeline (deal category) as returned by the CRM.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPipeline {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "NAME", default)]
    pub name: String,
}

impl RawPipeline {
    /// Convert to the core pipeline type.
    pub fn into_pipeline(self) -> Pipeline {
        Pipeline {
            id: PipelineId::new(self.id),
            name: self.name,
        }
    }
}

/// A CRM user record.
#[derive(Debug, Clone, Deserialize)]
pub struct RawUser {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "NAME", default)]
    pub first_name: String,
    #[serde(rename = "LAST_NAME", default)]
    pub last_name: String,
}

impl RawUser {
    /// Convert to the core user type, deriving the full name.
    pub fn into_user(self) -> User {
        User::from_name_parts(UserId::new(self.id), &self.first_name, &self.last_name)
    }
}

/// A numeric value the CRM may encode as either a JSON number or a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(u64),
    Text(String),
}

impl NumberOrText {
    fn as_u64(&self) -> u64 {
        match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse().unwrap_or(0),
        }
    }
}

/// Stage metadata as returned by the status list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RawStage {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "STATUS_ID", default)]
    pub status_id: String,
    #[serde(rename = "NAME", default)]
    pub name: String,
    #[serde(rename = "SORT", default)]
    sort: Option<NumberOrText>,
    #[serde(rename = "COLOR", default)]
    pub color: Option<String>,
}

impl RawStage {
    /// Convert to the core stage type, coercing the sort key and
    /// defaulting the color.
    pub fn into_stage_meta(self) -> StageMeta {
        StageMeta {
            id: StageId::new(self.id),
            status_id: self.status_id,
            name: self.name,
            sort: self.sort.map(|s| s.as_u64()).unwrap_or(0),
            color: self
                .color
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| "#000000".to_string()),
        }
    }
}

/// A deal record as returned by the deal list endpoint.
///
/// Custom `UF_*` fields are not enumerated here; they land in `extra`
/// via `serde(flatten)` and are normalized during conversion.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDeal {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "TITLE", default)]
    pub title: String,
    #[serde(rename = "CATEGORY_ID", default)]
    pub category_id: String,
    #[serde(rename = "STAGE_ID", default)]
    pub stage_id: Option<String>,
    #[serde(rename = "ASSIGNED_BY_ID", default)]
    pub assigned_by_id: Option<String>,
    #[serde(rename = "OPPORTUNITY", default)]
    pub opportunity: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl RawDeal {
    /// Normalize into the core deal type.
    ///
    /// Every `UF_*` custom field is ingested twice: its truthiness into
    /// `flags` and its raw text into `fields`. Null, array, and object
    /// values are dropped — the CRM only puts scalars in custom fields.
    pub fn into_deal(self) -> Deal {
        let mut deal = Deal::new(DealId::new(self.id), PipelineId::new(self.category_id));
        deal.title = self.title;
        deal.stage = self.stage_id.filter(|s| !s.is_empty()).map(StageId::new);
        deal.assigned_to = self
            .assigned_by_id
            .filter(|s| !s.is_empty())
            .map(UserId::new);
        deal.amount = self.opportunity.filter(|s| !s.is_empty());

        for (key, value) in self.extra {
            if !key.starts_with("UF_") {
                continue;
            }
            let raw = match value {
                Value::Bool(b) => RawFlag::Bool(b),
                Value::String(s) => RawFlag::Text(s),
                Value::Number(n) => RawFlag::Text(n.to_string()),
                _ => continue,
            };
            deal.flags.insert(key.clone(), raw.is_set());
            deal.fields.insert(key, raw.as_text());
        }

        deal
    }
}

// =============================================================================
// TESTS
// =============================================================================
