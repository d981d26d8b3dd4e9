//! Geolocated record types

use serde::{Deserialize, Deserializer, Serialize};

/// Coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// A customer (or depot) with an optional location fix, as handed over by the
/// record source. The engine only reads, reorders and copies these.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoRecord {
    pub id: String,
    #[serde(default)]
    pub client_code: Option<String>,
    /// Empty when the source has no name (absent or null)
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,

    // Location (absent or zero means "no fix")
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,

    // Grouping attributes
    /// Sequence group (the run the record is currently assigned to)
    #[serde(default)]
    pub route_name: Option<String>,
    /// Cluster group (broader region bounding the reassignment search)
    #[serde(default)]
    pub region_description: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub day: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl GeoRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            lat: Some(lat),
            lng: Some(lng),
            ..Default::default()
        }
    }

    pub fn with_route(mut self, route_name: impl Into<String>) -> Self {
        self.route_name = Some(route_name.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region_description = Some(region.into());
        self
    }

    pub fn with_client_code(mut self, code: impl Into<String>) -> Self {
        self.client_code = Some(code.into());
        self
    }

    /// Coordinates if the record has a usable fix
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) if crate::services::geo::has_valid_fix(lat, lng) => {
                Some(Coordinates { lat, lng })
            }
            _ => None,
        }
    }

    pub fn has_valid_fix(&self) -> bool {
        self.coordinates().is_some()
    }

    /// Heuristic depot detection on client code or display name
    pub fn looks_like_depot(&self) -> bool {
        let code_is_depot = self
            .client_code
            .as_deref()
            .map(|code| {
                let code = code.trim().to_ascii_uppercase();
                code.starts_with("DEP") || code.contains("DEPOT")
            })
            .unwrap_or(false);

        let name = self.name.to_lowercase();
        code_is_depot || name.contains("depot") || name.contains("warehouse")
    }
}
