//! Deduplication job messages and report types
//!
//! A batch goes in as one `START_CLEANING` request; the worker answers with any
//! number of `PROGRESS` messages followed by exactly one `COMPLETE`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::GeoRecord;

/// Request sent to the deduplication worker
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DedupRequest {
    StartCleaning { data: Vec<GeoRecord> },
}

impl DedupRequest {
    pub fn start_cleaning(data: Vec<GeoRecord>) -> Self {
        DedupRequest::StartCleaning { data }
    }

    pub fn item_count(&self) -> usize {
        match self {
            DedupRequest::StartCleaning { data } => data.len(),
        }
    }
}

/// Message emitted by the deduplication worker
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DedupResponse {
    /// Progress percentage (0-100)
    Progress { progress: u8 },
    Complete { report: CleaningReport },
}

/// Records judged to be the same physical entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateGroup {
    pub ids: Vec<String>,
}

impl DuplicateGroup {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|i| i == id)
    }
}

/// A field rewritten by the normalization pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizationEdit {
    pub record_id: String,
    pub field: String,
    pub old_value: String,
    pub new_value: String,
}

/// Final report of one cleaning batch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleaningReport {
    pub total_scanned: usize,
    /// Records with at least one normalized field
    pub normalized_count: usize,
    /// Records implicated in duplicate groups (sum of group sizes)
    pub duplicates_found: usize,
    pub duplicate_groups: Vec<DuplicateGroup>,
    pub normalization_edits: Vec<NormalizationEdit>,
    pub duration_ms: u64,
    pub completed_at: DateTime<Utc>,
}
