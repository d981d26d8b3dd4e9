//! Cross-route reassignment advisor
//!
//! For every record, compares the nearest stop on its own route with the
//! nearest stop on any other route in the same region, and suggests a move
//! when another route passes closer. The scan is quadratic per region, so it
//! yields to the scheduler every few records, reports progress and honours a
//! cancellation token.

use std::collections::BTreeMap;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::defaults::DEFAULT_REASSIGN_YIELD_EVERY;
use crate::error::{EngineError, Result};
use crate::services::geo::haversine_distance;
use crate::services::progress::{percent, ProgressSink};
use crate::types::{Coordinates, GeoRecord, ReassignmentSuggestion};

/// Tuning for a reassignment scan
#[derive(Debug, Clone, Copy)]
pub struct ReassignOptions {
    /// Neighbors further than this (degrees, either axis) are not considered
    pub box_degrees: f64,
    /// Saving baseline for a record that is alone on its route
    pub isolated_fallback_km: f64,
    /// Yield and report progress after this many records
    pub yield_every: usize,
}

impl Default for ReassignOptions {
    fn default() -> Self {
        Self {
            box_degrees: 1.0,
            isolated_fallback_km: 5.0,
            yield_every: DEFAULT_REASSIGN_YIELD_EVERY,
        }
    }
}

struct Member<'a> {
    record: &'a GeoRecord,
    at: Coordinates,
    route: &'a str,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Valid records with a route and a region, grouped by region
fn partition_by_region(records: &[GeoRecord]) -> BTreeMap<&str, Vec<Member<'_>>> {
    let mut regions: BTreeMap<&str, Vec<Member<'_>>> = BTreeMap::new();
    for record in records {
        let (Some(at), Some(route), Some(region)) = (
            record.coordinates(),
            non_empty(&record.route_name),
            non_empty(&record.region_description),
        ) else {
            continue;
        };
        regions.entry(region).or_default().push(Member { record, at, route });
    }
    regions
}

/// Find records better served by another route in their region.
///
/// Suggestions are sorted by estimated saving, largest first. Returns
/// `EngineError::Cancelled` if `cancel` fires before the scan completes.
pub async fn find_reassignments(
    records: &[GeoRecord],
    options: &ReassignOptions,
    progress: &dyn ProgressSink,
    cancel: &CancellationToken,
) -> Result<Vec<ReassignmentSuggestion>> {
    let started_at = Instant::now();

    if cancel.is_cancelled() {
        return Err(EngineError::Cancelled);
    }

    let regions = partition_by_region(records);
    let total: usize = regions.values().map(Vec::len).sum();
    let yield_every = options.yield_every.max(1);
    let mut processed = 0usize;
    let mut suggestions = Vec::new();

    debug!("Reassignment scan over {} records in {} regions", total, regions.len());

    for (region, members) in &regions {
        for (i, me) in members.iter().enumerate() {
            if let Some(suggestion) = evaluate(region, members, i, me, options) {
                suggestions.push(suggestion);
            }

            processed += 1;
            if processed % yield_every == 0 {
                progress.report(percent(processed, total));
                tokio::task::yield_now().await;
                if cancel.is_cancelled() {
                    info!("Reassignment scan cancelled after {} of {} records", processed, total);
                    return Err(EngineError::Cancelled);
                }
            }
        }
    }

    suggestions.sort_by(|a, b| b.estimated_saving_km.total_cmp(&a.estimated_saving_km));
    progress.report(100);

    info!(
        "Reassignment scan: {} suggestions from {} records in {} ms",
        suggestions.len(),
        total,
        started_at.elapsed().as_millis()
    );

    Ok(suggestions)
}

/// Compare the nearest same-route and other-route neighbors of `members[i]`
fn evaluate(
    region: &str,
    members: &[Member<'_>],
    i: usize,
    me: &Member<'_>,
    options: &ReassignOptions,
) -> Option<ReassignmentSuggestion> {
    let mut nearest_same: Option<f64> = None;
    let mut nearest_other: Option<(&Member<'_>, f64)> = None;

    for (j, them) in members.iter().enumerate() {
        if i == j {
            continue;
        }
        if (them.at.lat - me.at.lat).abs() > options.box_degrees
            || (them.at.lng - me.at.lng).abs() > options.box_degrees
        {
            continue;
        }

        let d = haversine_distance(&me.at, &them.at);
        if them.route == me.route {
            if nearest_same.map_or(true, |best| d < best) {
                nearest_same = Some(d);
            }
        } else if nearest_other.map_or(true, |(_, best)| d < best) {
            nearest_other = Some((them, d));
        }
    }

    let (alternative, alt_km) = nearest_other?;
    if let Some(current_km) = nearest_same {
        if alt_km >= current_km {
            return None;
        }
    }

    let baseline = nearest_same.unwrap_or(options.isolated_fallback_km);
    let reason = match nearest_same {
        Some(current_km) => format!(
            "Nearest stop on {} is {:.2} km away vs {:.2} km on {}",
            alternative.route, alt_km, current_km, me.route
        ),
        None => format!(
            "Only stop on {} in {}; nearest stop on {} is {:.2} km away",
            me.route, region, alternative.route, alt_km
        ),
    };

    Some(ReassignmentSuggestion {
        record_id: me.record.id.clone(),
        record_name: me.record.name.clone(),
        region: region.to_string(),
        current_group: me.route.to_string(),
        suggested_group: alternative.route.to_string(),
        current_neighbor_km: nearest_same,
        alternative_neighbor_id: alternative.record.id.clone(),
        alternative_neighbor_km: alt_km,
        estimated_saving_km: baseline - alt_km,
        reason,
    })
}
