//! Route sequencing output types

use serde::{Deserialize, Serialize};

use super::GeoRecord;

/// One leg between consecutive stops of a produced sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSegment {
    pub from_id: String,
    pub to_id: String,
    /// Estimated road distance
    pub distance_km: f64,
    pub estimated_time_min: f64,
}

/// Totals for a produced sequence.
///
/// `total_distance_km` is the sum of segment distances and `total_time_min` is
/// travel + service + break time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSummary {
    pub total_distance_km: f64,
    pub total_time_min: f64,
    pub stop_count: usize,
    pub segments: Vec<RouteSegment>,
    pub travel_time_min: f64,
    pub service_time_min: f64,
    pub break_time_min: f64,
    pub exceeds_working_hours: bool,
}

impl RouteSummary {
    /// Zero summary for a sequence with fewer than two stops
    pub fn empty(stop_count: usize) -> Self {
        Self {
            stop_count,
            ..Default::default()
        }
    }
}

/// Visiting order plus its summary
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequencedRoute {
    pub order: Vec<GeoRecord>,
    pub summary: RouteSummary,
}

impl SequencedRoute {
    pub fn ids(&self) -> Vec<&str> {
        self.order.iter().map(|r| r.id.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_summary() {
        let summary = RouteSummary::empty(1);
        assert_eq!(summary.stop_count, 1);
        assert_eq!(summary.total_distance_km, 0.0);
        assert!(summary.segments.is_empty());
    }

    #[test]
    fn test_summary_serializes_to_camel_case() {
        let summary = RouteSummary {
            total_distance_km: 1.5,
            total_time_min: 20.0,
            stop_count: 2,
            segments: vec![RouteSegment {
                from_id: "a".into(),
                to_id: "b".into(),
                distance_km: 1.5,
                estimated_time_min: 5.0,
            }],
            ..Default::default()
        };

        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("totalDistanceKm"));
        assert!(json.contains("fromId"));
        assert!(json.contains("estimatedTimeMin"));
        assert!(!json.contains("total_distance_km"));
    }
}
