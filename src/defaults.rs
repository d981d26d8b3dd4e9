//! Default tuning values shared by the planner services

/// Average cruising speed used for the highway band (km/h)
pub const DEFAULT_AVERAGE_SPEED_KMH: f64 = 60.0;

/// Urban (stop-and-go) band speed for legs under 2 km
pub const DEFAULT_URBAN_SPEED_KMH: f64 = 20.0;

/// Arterial band speed for legs between 2 and 10 km
pub const DEFAULT_ARTERIAL_SPEED_KMH: f64 = 40.0;

pub const URBAN_BAND_LIMIT_KM: f64 = 2.0;
pub const ARTERIAL_BAND_LIMIT_KM: f64 = 10.0;

/// Legs shorter than this get the raised traffic floor
pub const SHORT_LEG_LIMIT_KM: f64 = 5.0;
pub const SHORT_LEG_TRAFFIC_FLOOR: f64 = 1.3;

pub const DEFAULT_TRAFFIC_FACTOR: f64 = 1.2;

/// Straight line to road distance inflation
pub const DEFAULT_DRIVING_DISTANCE_FACTOR: f64 = 1.4;

pub const DEFAULT_SERVICE_TIME_MINUTES: f64 = 15.0;
pub const DEFAULT_BREAK_TIME_MINUTES: f64 = 30.0;

/// A route needs a break past this much driving + service time...
pub const BREAK_AFTER_MINUTES: f64 = 240.0;
/// ...or past this many stops
pub const BREAK_AFTER_STOPS: usize = 10;

pub const DEFAULT_NEARBY_THRESHOLD_KM: f64 = 0.3;
pub const DEFAULT_REASSIGN_YIELD_EVERY: usize = 50;

/// Region aliases applied by the deduplication normalization pass.
/// Keys are lower-cased and trimmed.
pub const DEFAULT_REGION_ALIASES: &[(&str, &str)] = &[
    ("jedda", "Jeddah"),
    ("jeddah", "Jeddah"),
    ("jeddah consumer", "Jeddah"),
    ("jiddah", "Jeddah"),
    ("riyad", "Riyadh"),
    ("riyadh", "Riyadh"),
    ("riyadh consumer", "Riyadh"),
    ("ar riyadh", "Riyadh"),
    ("dammam", "Dammam"),
    ("dammam consumer", "Dammam"),
    ("ad dammam", "Dammam"),
    ("khobar", "Al Khobar"),
    ("al khobar", "Al Khobar"),
    ("alkhobar", "Al Khobar"),
    ("mecca", "Makkah"),
    ("makka", "Makkah"),
    ("makkah", "Makkah"),
    ("medina", "Madinah"),
    ("madina", "Madinah"),
    ("madinah", "Madinah"),
    ("al madinah", "Madinah"),
    ("taif", "Taif"),
    ("at taif", "Taif"),
];
