//! Spatial proximity scanning
//!
//! Same-location and nearby detection over a batch of records. The default
//! implementation sorts by latitude and sweeps a bounded window forward from
//! each record instead of building a spatial index.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::defaults::DEFAULT_NEARBY_THRESHOLD_KM;
use crate::services::geo::{distance_km, lng_delta, lng_window_for, KM_PER_DEGREE};
use crate::types::{Coordinates, GeoRecord};

/// Proximity queries over a batch of records.
///
/// Callers only see this trait, so a real spatial index can replace the sweep.
pub trait ProximityIndex: Send + Sync {
    /// Ids of every record that shares its location with at least one other record
    fn same_location_ids(&self, records: &[GeoRecord]) -> HashSet<String>;

    /// Number of distinct records with a neighbor further than the same-location
    /// distance but closer than `threshold_km`
    fn count_nearby(&self, records: &[GeoRecord], threshold_km: Option<f64>) -> usize;

    /// Get index name for logging
    fn name(&self) -> &str;
}

/// Thresholds for the sort-and-sweep scanner
#[derive(Debug, Clone, Copy)]
pub struct ScanThresholds {
    /// Latitude window for same-location candidates (~30 m)
    pub same_location_window_deg: f64,
    /// Exact distance at or under which two records share a location
    pub same_location_km: f64,
    pub default_nearby_km: f64,
    /// Batches larger than this are not scanned for nearby records
    pub max_records: usize,
}

impl Default for ScanThresholds {
    fn default() -> Self {
        Self {
            same_location_window_deg: 0.0003,
            same_location_km: 0.02,
            default_nearby_km: DEFAULT_NEARBY_THRESHOLD_KM,
            max_records: 5000,
        }
    }
}

/// Sort-and-sweep proximity scanner
#[derive(Debug, Clone, Default)]
pub struct SortSweepIndex {
    thresholds: ScanThresholds,
}

struct Point<'a> {
    id: &'a str,
    at: Coordinates,
}

impl SortSweepIndex {
    pub fn new(thresholds: ScanThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &ScanThresholds {
        &self.thresholds
    }

    /// Valid points sorted by latitude (stable).
    ///
    /// The forward sweep breaks at the first candidate beyond the window, which
    /// is only correct because every later candidate has a larger latitude.
    fn sorted_points<'a>(records: &'a [GeoRecord]) -> Vec<Point<'a>> {
        let mut points: Vec<Point<'a>> = records
            .iter()
            .filter_map(|r| r.coordinates().map(|at| Point { id: r.id.as_str(), at }))
            .collect();
        points.sort_by(|a, b| a.at.lat.total_cmp(&b.at.lat));
        points
    }

    /// Visit every pair within `lat_window` degrees of latitude and the matching
    /// longitude window, passing the exact distance to `visit`
    fn sweep<'a>(points: &[Point<'a>], lat_window: f64, mut visit: impl FnMut(&Point<'a>, &Point<'a>, f64)) {
        for i in 0..points.len() {
            let a = &points[i];
            let lng_window = lng_window_for(lat_window, a.at.lat);

            for b in &points[i + 1..] {
                if b.at.lat - a.at.lat > lat_window {
                    break;
                }
                if lng_delta(a.at.lng, b.at.lng) > lng_window {
                    continue;
                }
                visit(a, b, distance_km(a.at.lat, a.at.lng, b.at.lat, b.at.lng));
            }
        }
    }
}

impl ProximityIndex for SortSweepIndex {
    fn same_location_ids(&self, records: &[GeoRecord]) -> HashSet<String> {
        let points = Self::sorted_points(records);
        let limit = self.thresholds.same_location_km;
        let mut ids = HashSet::new();

        Self::sweep(&points, self.thresholds.same_location_window_deg, |a, b, d| {
            if d <= limit {
                ids.insert(a.id.to_string());
                ids.insert(b.id.to_string());
            }
        });

        debug!("{} of {} records share a location", ids.len(), records.len());
        ids
    }

    fn count_nearby(&self, records: &[GeoRecord], threshold_km: Option<f64>) -> usize {
        if records.len() > self.thresholds.max_records {
            warn!(
                "Nearby scan skipped: {} records exceeds cap of {}",
                records.len(),
                self.thresholds.max_records
            );
            return 0;
        }

        let threshold = threshold_km.unwrap_or(self.thresholds.default_nearby_km);
        let floor = self.thresholds.same_location_km;
        if !(threshold > floor) {
            return 0;
        }

        let points = Self::sorted_points(records);
        // Slightly wider than the threshold so the window never cuts a qualifying pair
        let lat_window = threshold / KM_PER_DEGREE * 1.01;
        let mut ids: HashSet<&str> = HashSet::new();

        Self::sweep(&points, lat_window, |a, b, d| {
            if d > floor && d < threshold {
                ids.insert(a.id);
                ids.insert(b.id);
            }
        });

        debug!("{} of {} records have a neighbor within {} km", ids.len(), records.len(), threshold);
        ids.len()
    }

    fn name(&self) -> &str {
        "sort-sweep"
    }
}

/// Ids of records sharing a location, using the default scanner
pub fn scan_same_location(records: &[GeoRecord]) -> HashSet<String> {
    SortSweepIndex::default().same_location_ids(records)
}

/// Count of records with a nearby (but not same-location) neighbor, using the default scanner
pub fn count_nearby(records: &[GeoRecord], threshold_km: Option<f64>) -> usize {
    SortSweepIndex::default().count_nearby(records, threshold_km)
}
