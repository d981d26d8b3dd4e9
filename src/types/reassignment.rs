//! Cross-route reassignment suggestion types

use serde::{Deserialize, Serialize};

/// A record that looks better served by another route in the same region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReassignmentSuggestion {
    pub record_id: String,
    pub record_name: String,
    pub region: String,
    pub current_group: String,
    pub suggested_group: String,
    /// Distance to the nearest stop on the current route, `None` if isolated
    pub current_neighbor_km: Option<f64>,
    pub alternative_neighbor_id: String,
    pub alternative_neighbor_km: f64,
    pub estimated_saving_km: f64,
    pub reason: String,
}

impl ReassignmentSuggestion {
    pub fn is_isolated(&self) -> bool {
        self.current_neighbor_km.is_none()
    }
}
