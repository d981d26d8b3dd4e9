//! Duplicate detection: sort by position, sweep a small latitude window and
//! compare names exactly or by edit distance.

use crate::error::{EngineError, Result};
use crate::services::geo::haversine_distance;
use crate::services::progress::percent;
use crate::types::{Coordinates, DuplicateGroup, GeoRecord};

/// Returned by `edit_distance` when the lengths alone rule out a near match
pub const EDIT_DISTANCE_SENTINEL: usize = 999;

/// Length difference above which two names are never a near match
const MAX_LENGTH_GAP: usize = 3;

/// Thresholds for the duplicate pass
#[derive(Debug, Clone, Copy)]
pub struct MatchRules {
    /// Latitude window of the forward sweep (~111 m)
    pub sweep_window_deg: f64,
    /// Per-axis tolerance for the exact rule
    pub exact_coord_tolerance_deg: f64,
    /// Distance under which the fuzzy rule compares names
    pub fuzzy_distance_km: f64,
}

impl Default for MatchRules {
    fn default() -> Self {
        Self {
            sweep_window_deg: 0.001,
            exact_coord_tolerance_deg: 0.00001,
            fuzzy_distance_km: 0.02,
        }
    }
}

/// Levenshtein distance over chars.
///
/// Gives up with `EDIT_DISTANCE_SENTINEL` when the lengths differ by more than 3.
pub fn edit_distance(a: &str, b: &str) -> usize {
    if a.chars().count().abs_diff(b.chars().count()) > MAX_LENGTH_GAP {
        return EDIT_DISTANCE_SENTINEL;
    }
    strsim::levenshtein(a, b)
}

/// Allowed edit distance for two names: none for short names, 2 otherwise
pub fn name_tolerance(a: &str, b: &str) -> usize {
    if a.chars().count().max(b.chars().count()) < 5 {
        0
    } else {
        2
    }
}

struct Candidate<'a> {
    id: &'a str,
    /// Trimmed, lower-cased; empty if missing
    name: String,
    at: Option<Coordinates>,
}

impl MatchRules {
    fn is_exact(&self, a: &Candidate<'_>, b: &Candidate<'_>, a_at: Coordinates, b_at: Coordinates) -> bool {
        a.name == b.name
            && (a_at.lat - b_at.lat).abs() <= self.exact_coord_tolerance_deg
            && (a_at.lng - b_at.lng).abs() <= self.exact_coord_tolerance_deg
    }

    fn is_fuzzy(&self, a: &Candidate<'_>, b: &Candidate<'_>, a_at: Coordinates, b_at: Coordinates) -> bool {
        haversine_distance(&a_at, &b_at) < self.fuzzy_distance_km
            && edit_distance(&a.name, &b.name) <= name_tolerance(&a.name, &b.name)
    }
}

/// Ordering by (lat, lng) with records lacking a fix at the end
fn by_position(a: &Option<Coordinates>, b: &Option<Coordinates>) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (Some(x), Some(y)) => x.lat.total_cmp(&y.lat).then(x.lng.total_cmp(&y.lng)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Group records that look like the same physical entity.
///
/// A record joins at most one group; records already grouped never seed a
/// new one. `progress` receives about fifty updates, and `is_cancelled` is
/// polled at the same checkpoints.
pub fn find_duplicate_groups(
    records: &[GeoRecord],
    rules: &MatchRules,
    progress: &mut dyn FnMut(u8),
    is_cancelled: &dyn Fn() -> bool,
) -> Result<Vec<DuplicateGroup>> {
    let mut candidates: Vec<Candidate<'_>> = records
        .iter()
        .map(|r| Candidate {
            id: r.id.as_str(),
            name: r.name.trim().to_lowercase(),
            at: r.coordinates(),
        })
        .collect();
    candidates.sort_by(|a, b| by_position(&a.at, &b.at));

    let n = candidates.len();
    let step = (n / 50).max(1);
    let mut consumed = vec![false; n];
    let mut groups = Vec::new();

    for i in 0..n {
        if i % step == 0 {
            if is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            progress(percent(i, n));
        }

        if consumed[i] {
            continue;
        }
        // Everything from here on lacks a fix
        let Some(seed_at) = candidates[i].at else {
            break;
        };
        consumed[i] = true;

        let mut ids = vec![candidates[i].id.to_string()];
        for j in i + 1..n {
            let Some(other_at) = candidates[j].at else {
                break;
            };
            if other_at.lat - seed_at.lat > rules.sweep_window_deg {
                break;
            }
            if consumed[j] {
                continue;
            }

            let (seed, other) = (&candidates[i], &candidates[j]);
            if rules.is_exact(seed, other, seed_at, other_at) || rules.is_fuzzy(seed, other, seed_at, other_at) {
                consumed[j] = true;
                ids.push(other.id.to_string());
            }
        }

        if ids.len() > 1 {
            groups.push(DuplicateGroup { ids });
        }
    }

    progress(100);
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: &str, name: &str, lat: f64, lng: f64) -> GeoRecord {
        GeoRecord::new(id, name, lat, lng)
    }

    fn groups_of(records: &[GeoRecord]) -> Vec<DuplicateGroup> {
        find_duplicate_groups(records, &MatchRules::default(), &mut |_: u8| {}, &|| false).unwrap()
    }

    #[test]
    fn test_edit_distance_basics() {
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("abc", ""), 3);
        assert_eq!(edit_distance("same", "same"), 0);
        assert_eq!(edit_distance("al noor", "al nour"), 1);
    }

    #[test]
    fn test_edit_distance_length_gap_short_circuits() {
        assert_eq!(edit_distance("abc", "abcdefg"), EDIT_DISTANCE_SENTINEL);
        assert_eq!(edit_distance("a", "abcd"), 3);
    }

    #[test]
    fn test_edit_distance_counts_chars_not_bytes() {
        assert_eq!(edit_distance("café", "cafe"), 1);
        assert_eq!(edit_distance("مطعم", "مطعم"), 0);
    }

    #[test]
    fn test_name_tolerance() {
        assert_eq!(name_tolerance("abcd", "abc"), 0);
        assert_eq!(name_tolerance("abcde", "abc"), 2);
    }

    #[test]
    fn test_exact_duplicates_grouped_regardless_of_case() {
        let records = vec![
            rec("1", "Al Noor Market", 21.5433, 39.1728),
            rec("2", "  al noor market ", 21.5433, 39.1728),
            rec("3", "Other Shop", 21.6000, 39.2000),
        ];
        let groups = groups_of(&records);

        assert_eq!(groups.len(), 1);
        assert!(groups[0].contains("1") && groups[0].contains("2"));
    }

    #[test]
    fn test_fuzzy_match_within_twenty_meters() {
        // ~10 m apart, one typo
        let records = vec![
            rec("1", "Al Noor Market", 21.54330, 39.1728),
            rec("2", "Al Nour Market", 21.54339, 39.1728),
        ];
        assert_eq!(groups_of(&records).len(), 1);
    }

    #[test]
    fn test_fuzzy_rejects_distant_or_different() {
        let far = vec![
            rec("1", "Al Noor Market", 21.5433, 39.1728),
            rec("2", "Al Nour Market", 21.5437, 39.1728), // ~44 m
        ];
        assert!(groups_of(&far).is_empty());

        let different = vec![
            rec("1", "Al Noor Market", 21.54330, 39.1728),
            rec("2", "Baqala Express", 21.54331, 39.1728),
        ];
        assert!(groups_of(&different).is_empty());
    }

    #[test]
    fn test_short_names_need_exact_spelling() {
        let records = vec![rec("1", "Spar", 21.54330, 39.1728), rec("2", "Spir", 21.54331, 39.1728)];
        assert!(groups_of(&records).is_empty());
    }

    #[test]
    fn test_missing_coordinates_never_match() {
        let mut a = rec("1", "Shop", 21.5, 39.2);
        a.lat = None;
        let mut b = rec("2", "Shop", 21.5, 39.2);
        b.lat = None;
        let zero = rec("3", "Shop", 0.0, 0.0);
        let zero2 = rec("4", "Shop", 0.0, 0.0);

        assert!(groups_of(&[a, b, zero, zero2]).is_empty());
    }

    #[test]
    fn test_missing_name_treated_as_empty() {
        let records = vec![rec("1", "", 21.54330, 39.1728), rec("2", "", 21.54330, 39.1728)];
        assert_eq!(groups_of(&records).len(), 1);
    }

    #[test]
    fn test_record_joins_only_one_group() {
        // b is close to both a and c, but a seeds first and consumes it
        let records = vec![
            rec("a", "Corner Shop", 21.54330, 39.1728),
            rec("b", "Corner Shop", 21.54340, 39.1728),
            rec("c", "Corner Shop", 21.54350, 39.1728),
        ];
        let groups = groups_of(&records);

        let total: usize = groups.iter().map(DuplicateGroup::len).sum();
        let mut all: Vec<&String> = groups.iter().flat_map(|g| g.ids.iter()).collect();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), total);
        assert!(groups[0].contains("a") && groups[0].contains("b"));
    }

    #[test]
    fn test_progress_is_reported_and_finishes_at_100() {
        let records: Vec<GeoRecord> = (0..500)
            .map(|i| rec(&i.to_string(), "Shop", 21.0 + i as f64 * 0.01, 39.0))
            .collect();
        let mut seen = Vec::new();
        find_duplicate_groups(&records, &MatchRules::default(), &mut |p: u8| seen.push(p), &|| false).unwrap();

        assert_eq!(seen.len(), 51);
        assert_eq!(seen.first(), Some(&0));
        assert_eq!(seen.last(), Some(&100));
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_cancellation_is_polled() {
        let records = vec![rec("1", "Shop", 21.5, 39.2)];
        let result = find_duplicate_groups(&records, &MatchRules::default(), &mut |_: u8| {}, &|| true);
        assert!(matches!(result, Err(EngineError::Cancelled)));
    }
}
