//! Route sequencing
//!
//! Greedy nearest-neighbor construction over records with a valid fix, with a
//! pluggable cost objective and service/break time accounting.

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::defaults::{BREAK_AFTER_MINUTES, BREAK_AFTER_STOPS};
use crate::services::geo::{haversine_distance, road_distance_km, travel_time_min};
use crate::types::{
    Coordinates, CostObjective, GeoRecord, OptimizerConfig, RouteSegment, RouteSummary,
    SequencedRoute, StartLocation,
};

/// Candidates further than this (degrees, either axis) are skipped before the exact distance
const CANDIDATE_BOX_DEGREES: f64 = 0.5;

/// Legs shorter than this are treated as the same location (zero distance and time)
const SAME_LOCATION_KM: f64 = 0.05;

/// Weight of raw distance in the balanced objective
const BALANCED_DISTANCE_WEIGHT: f64 = 0.7;
/// Weight of the time term in the balanced objective
const BALANCED_TIME_WEIGHT: f64 = 0.3;
/// Converts travel hours into a distance-like term (km per hour)
const BALANCED_TIME_TO_KM: f64 = 30.0;

/// Nearest-neighbor route sequencer
pub struct RouteSequencer {
    config: OptimizerConfig,
}

impl RouteSequencer {
    pub fn new(config: OptimizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Produce a visiting order and its summary.
    ///
    /// Records without a valid fix are left out of the order and the totals.
    pub fn sequence(&self, records: &[GeoRecord], start_id: Option<&str>) -> SequencedRoute {
        let started_at = Instant::now();

        let (valid, coords): (Vec<&GeoRecord>, Vec<Coordinates>) = records
            .iter()
            .filter_map(|r| r.coordinates().map(|c| (r, c)))
            .unzip();

        let skipped = records.len() - valid.len();
        if skipped > 0 {
            debug!("Skipping {} records without a valid fix", skipped);
        }

        if valid.len() < 2 {
            debug!("Fewer than 2 valid records, returning unchanged order");
            return SequencedRoute {
                order: valid.into_iter().cloned().collect(),
                summary: RouteSummary::empty(records.len() - skipped),
            };
        }

        let start = self.resolve_start(&valid, start_id);
        let ordered_indices = self.nearest_neighbor(&coords, start, records.len() * 2);
        let order: Vec<GeoRecord> = ordered_indices.iter().map(|&i| valid[i].clone()).collect();
        let ordered_coords: Vec<Coordinates> = ordered_indices.iter().map(|&i| coords[i]).collect();

        let summary = self.build_summary(&order, &ordered_coords);

        info!(
            "Sequenced {} stops ({}): {:.1} km, {:.0} min in {} ms",
            summary.stop_count,
            self.config.cost_objective.as_str(),
            summary.total_distance_km,
            summary.total_time_min,
            started_at.elapsed().as_millis()
        );

        SequencedRoute { order, summary }
    }

    /// Index (into `valid`) of the first stop
    fn resolve_start(&self, valid: &[&GeoRecord], start_id: Option<&str>) -> usize {
        if let Some(id) = start_id {
            if let Some(idx) = valid.iter().position(|r| r.id == id) {
                return idx;
            }
            debug!("Start record {} not found among valid records", id);
        }

        if self.config.start_location == StartLocation::Depot {
            if let Some(idx) = valid.iter().position(|r| r.looks_like_depot()) {
                return idx;
            }
            debug!("No depot-like record found, starting from the first record");
        }

        0
    }

    /// Cost of moving `raw_km` (straight line) under the configured objective
    fn step_cost(&self, raw_km: f64) -> f64 {
        match self.config.cost_objective {
            CostObjective::Distance => raw_km,
            CostObjective::Time => self.leg_minutes(raw_km),
            CostObjective::Balanced => {
                let time_term = self.leg_minutes(raw_km) / 60.0 * BALANCED_TIME_TO_KM;
                BALANCED_DISTANCE_WEIGHT * raw_km + BALANCED_TIME_WEIGHT * time_term
            }
        }
    }

    fn leg_minutes(&self, raw_km: f64) -> f64 {
        travel_time_min(road_distance_km(raw_km, &self.config), &self.config)
    }

    /// Nearest neighbor heuristic.
    /// Returns indices into `coords` in visit order, starting with `start`.
    fn nearest_neighbor(&self, coords: &[Coordinates], start: usize, max_iterations: usize) -> Vec<usize> {
        let n = coords.len();
        let mut visited = vec![false; n];
        let mut route = Vec::with_capacity(n);

        visited[start] = true;
        route.push(start);
        let mut current = start;
        let mut remaining = n - 1;
        let mut iterations = 0;

        while remaining > 0 {
            if iterations >= max_iterations {
                warn!(
                    "Sequencer hit its iteration cap ({}) with {} records unvisited",
                    max_iterations, remaining
                );
                break;
            }
            iterations += 1;

            let from = coords[current];
            let mut best: Option<(usize, f64)> = None;

            for (j, candidate) in coords.iter().enumerate() {
                if visited[j] {
                    continue;
                }
                if (candidate.lat - from.lat).abs() > CANDIDATE_BOX_DEGREES
                    || (candidate.lng - from.lng).abs() > CANDIDATE_BOX_DEGREES
                {
                    continue;
                }

                let cost = self.step_cost(haversine_distance(&from, candidate));
                if best.map_or(true, |(_, best_cost)| cost < best_cost) {
                    best = Some((j, cost));
                }
            }

            // Nothing inside the box: take the first unvisited record as is
            let next = match best {
                Some((j, _)) => Some(j),
                None => visited.iter().position(|v| !v),
            };

            match next {
                Some(j) => {
                    visited[j] = true;
                    route.push(j);
                    current = j;
                    remaining -= 1;
                }
                None => break,
            }
        }

        route
    }

    /// Build segments and totals for an ordered list of stops
    fn build_summary(&self, order: &[GeoRecord], coords: &[Coordinates]) -> RouteSummary {
        let mut segments = Vec::with_capacity(order.len().saturating_sub(1));
        let mut total_distance = 0.0;
        let mut travel_time = 0.0;

        for i in 1..order.len() {
            let raw = haversine_distance(&coords[i - 1], &coords[i]);
            let (distance_km, estimated_time_min) = if raw < SAME_LOCATION_KM {
                (0.0, 0.0)
            } else {
                let road = road_distance_km(raw, &self.config);
                (road, travel_time_min(road, &self.config))
            };

            total_distance += distance_km;
            travel_time += estimated_time_min;

            segments.push(RouteSegment {
                from_id: order[i - 1].id.clone(),
                to_id: order[i].id.clone(),
                distance_km,
                estimated_time_min,
            });
        }

        let stop_count = order.len();
        let service_time = stop_count.saturating_sub(1) as f64 * self.config.service_time_min;
        let subtotal = travel_time + service_time;
        let break_time = if subtotal > BREAK_AFTER_MINUTES || stop_count > BREAK_AFTER_STOPS {
            self.config.break_time_min
        } else {
            0.0
        };
        let total_time = subtotal + break_time;

        let exceeds_working_hours = self
            .config
            .max_working_hours
            .map_or(false, |hours| total_time > hours * 60.0);
        if exceeds_working_hours {
            warn!(
                "Route of {} stops needs {:.0} min, over the {:?} h working day",
                stop_count, total_time, self.config.max_working_hours
            );
        }

        RouteSummary {
            total_distance_km: total_distance,
            total_time_min: total_time,
            stop_count,
            segments,
            travel_time_min: travel_time,
            service_time_min: service_time,
            break_time_min: break_time,
            exceeds_working_hours,
        }
    }
}

impl Default for RouteSequencer {
    fn default() -> Self {
        Self::new(OptimizerConfig::default())
    }
}

/// Sequence `records` with a one-off sequencer
pub fn sequence_route(records: &[GeoRecord], start_id: Option<&str>, config: &OptimizerConfig) -> SequencedRoute {
    RouteSequencer::new(config.clone()).sequence(records, start_id)
}
