//! Optimizer configuration

use serde::{Deserialize, Serialize};

use crate::defaults::*;
use crate::error::{EngineError, Result};

/// Where the sequencer starts when no explicit start record is given
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StartLocation {
    /// First valid record in input order
    #[default]
    First,
    /// First record that looks like a depot, falling back to `First`
    Depot,
}

/// Metric minimised at each nearest-neighbor step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CostObjective {
    Distance,
    Time,
    #[default]
    Balanced,
}

impl CostObjective {
    pub const fn as_str(self) -> &'static str {
        match self {
            CostObjective::Distance => "distance",
            CostObjective::Time => "time",
            CostObjective::Balanced => "balanced",
        }
    }
}

/// Speed bands used by the travel time model.
///
/// `highway_kmh` of `None` means the optimizer's `average_speed_kmh` is used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpeedBands {
    pub urban_kmh: f64,
    pub arterial_kmh: f64,
    pub highway_kmh: Option<f64>,
    pub urban_limit_km: f64,
    pub arterial_limit_km: f64,
    pub short_leg_limit_km: f64,
    pub short_leg_traffic_floor: f64,
}

impl Default for SpeedBands {
    fn default() -> Self {
        Self {
            urban_kmh: DEFAULT_URBAN_SPEED_KMH,
            arterial_kmh: DEFAULT_ARTERIAL_SPEED_KMH,
            highway_kmh: None,
            urban_limit_km: URBAN_BAND_LIMIT_KM,
            arterial_limit_km: ARTERIAL_BAND_LIMIT_KM,
            short_leg_limit_km: SHORT_LEG_LIMIT_KM,
            short_leg_traffic_floor: SHORT_LEG_TRAFFIC_FLOOR,
        }
    }
}

/// Options for a single sequencing call. Never mutated by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OptimizerConfig {
    pub average_speed_kmh: f64,
    /// Service duration at each stop after the first, in minutes
    pub service_time_min: f64,
    pub traffic_factor: f64,
    /// Straight line to road distance inflation
    pub driving_distance_factor: f64,
    pub max_working_hours: Option<f64>,
    pub break_time_min: f64,
    pub start_location: StartLocation,
    pub cost_objective: CostObjective,
    pub speed_bands: SpeedBands,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            average_speed_kmh: DEFAULT_AVERAGE_SPEED_KMH,
            service_time_min: DEFAULT_SERVICE_TIME_MINUTES,
            traffic_factor: DEFAULT_TRAFFIC_FACTOR,
            driving_distance_factor: DEFAULT_DRIVING_DISTANCE_FACTOR,
            max_working_hours: None,
            break_time_min: DEFAULT_BREAK_TIME_MINUTES,
            start_location: StartLocation::default(),
            cost_objective: CostObjective::default(),
            speed_bands: SpeedBands::default(),
        }
    }
}

impl OptimizerConfig {
    /// Pure distance ordering, no service or break time
    pub fn distance_only() -> Self {
        Self {
            cost_objective: CostObjective::Distance,
            service_time_min: 0.0,
            break_time_min: 0.0,
            ..Self::default()
        }
    }

    /// Start from the depot and respect an 8 hour shift
    pub fn depot_shift() -> Self {
        Self {
            start_location: StartLocation::Depot,
            max_working_hours: Some(8.0),
            ..Self::default()
        }
    }

    pub fn highway_kmh(&self) -> f64 {
        self.speed_bands.highway_kmh.unwrap_or(self.average_speed_kmh)
    }

    /// Check that every option is usable by the travel model
    pub fn validate(&self) -> Result<()> {
        fn positive(name: &str, value: f64) -> Result<()> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(EngineError::invalid_config(format!("{name} must be positive, got {value}")))
            }
        }
        fn non_negative(name: &str, value: f64) -> Result<()> {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(EngineError::invalid_config(format!("{name} must not be negative, got {value}")))
            }
        }

        positive("averageSpeedKmh", self.average_speed_kmh)?;
        positive("trafficFactor", self.traffic_factor)?;
        positive("drivingDistanceFactor", self.driving_distance_factor)?;
        non_negative("serviceTimeMin", self.service_time_min)?;
        non_negative("breakTimeMin", self.break_time_min)?;
        if let Some(hours) = self.max_working_hours {
            positive("maxWorkingHours", hours)?;
        }

        let bands = &self.speed_bands;
        positive("speedBands.urbanKmh", bands.urban_kmh)?;
        positive("speedBands.arterialKmh", bands.arterial_kmh)?;
        positive("speedBands.highwayKmh", self.highway_kmh())?;
        positive("speedBands.shortLegTrafficFloor", bands.short_leg_traffic_floor)?;
        non_negative("speedBands.shortLegLimitKm", bands.short_leg_limit_km)?;
        if !(bands.urban_limit_km > 0.0 && bands.urban_limit_km <= bands.arterial_limit_km) {
            return Err(EngineError::invalid_config(format!(
                "speed band limits must satisfy 0 < urban ({}) <= arterial ({})",
                bands.urban_limit_km, bands.arterial_limit_km
            )));
        }

        Ok(())
    }

    /// Validate and return self, for builder-style call sites
    pub fn validated(self) -> Result<Self> {
        self.validate()?;
        Ok(self)
    }
}
