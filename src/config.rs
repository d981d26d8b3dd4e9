//! Configuration management

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::defaults::{DEFAULT_NEARBY_THRESHOLD_KM, DEFAULT_REASSIGN_YIELD_EVERY};
use crate::services::reassignment::ReassignOptions;
use crate::types::OptimizerConfig;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory for the rotated log files
    pub logs_dir: PathBuf,

    /// Sequencing options, already validated
    pub optimizer: OptimizerConfig,

    /// Neighbor radius for the nearby count (km)
    pub nearby_threshold_km: f64,

    /// Records between progress reports in the reassignment scan
    pub reassign_yield_every: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup; missing keys use defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = OptimizerConfig::default();

        let logs_dir = lookup("LOGS_DIR").unwrap_or_else(|| "./logs".to_string()).into();

        let optimizer = OptimizerConfig {
            average_speed_kmh: parse_or(&lookup, "PLANNER_AVERAGE_SPEED_KMH", defaults.average_speed_kmh)?,
            service_time_min: parse_or(&lookup, "PLANNER_SERVICE_TIME_MIN", defaults.service_time_min)?,
            traffic_factor: parse_or(&lookup, "PLANNER_TRAFFIC_FACTOR", defaults.traffic_factor)?,
            driving_distance_factor: parse_or(&lookup, "PLANNER_DRIVING_FACTOR", defaults.driving_distance_factor)?,
            break_time_min: parse_or(&lookup, "PLANNER_BREAK_TIME_MIN", defaults.break_time_min)?,
            ..defaults
        }
        .validated()
        .context("Planner settings from the environment are invalid")?;

        let nearby_threshold_km = parse_or(&lookup, "PLANNER_NEARBY_THRESHOLD_KM", DEFAULT_NEARBY_THRESHOLD_KM)?;
        if !(nearby_threshold_km.is_finite() && nearby_threshold_km > 0.0) {
            anyhow::bail!("PLANNER_NEARBY_THRESHOLD_KM must be positive, got {}", nearby_threshold_km);
        }

        let reassign_yield_every = parse_or(&lookup, "PLANNER_REASSIGN_YIELD_EVERY", DEFAULT_REASSIGN_YIELD_EVERY)?;
        if reassign_yield_every == 0 {
            anyhow::bail!("PLANNER_REASSIGN_YIELD_EVERY must be at least 1");
        }

        Ok(Self {
            logs_dir,
            optimizer,
            nearby_threshold_km,
            reassign_yield_every,
        })
    }

    pub fn reassign_options(&self) -> ReassignOptions {
        ReassignOptions {
            yield_every: self.reassign_yield_every,
            ..ReassignOptions::default()
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{}={:?} is not valid: {}", key, raw, e)),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_config_defaults_when_nothing_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.logs_dir, PathBuf::from("./logs"));
        assert_eq!(config.optimizer, OptimizerConfig::default());
        assert!((config.nearby_threshold_km - 0.3).abs() < f64::EPSILON);
        assert_eq!(config.reassign_yield_every, 50);
    }

    #[test]
    fn test_config_overrides() {
        let config = config_from(&[
            ("LOGS_DIR", "/var/log/geoplan"),
            ("PLANNER_AVERAGE_SPEED_KMH", "80"),
            ("PLANNER_SERVICE_TIME_MIN", " 10 "),
            ("PLANNER_REASSIGN_YIELD_EVERY", "25"),
        ])
        .unwrap();

        assert_eq!(config.logs_dir, PathBuf::from("/var/log/geoplan"));
        assert!((config.optimizer.average_speed_kmh - 80.0).abs() < f64::EPSILON);
        assert!((config.optimizer.service_time_min - 10.0).abs() < f64::EPSILON);
        assert_eq!(config.reassign_options().yield_every, 25);
    }

    #[test]
    fn test_config_blank_value_uses_default() {
        let config = config_from(&[("PLANNER_TRAFFIC_FACTOR", "")]).unwrap();
        assert!((config.optimizer.traffic_factor - 1.2).abs() < f64::EPSILON);
    }

    #[test]
    fn test_config_unparseable_value_names_the_key() {
        let err = config_from(&[("PLANNER_TRAFFIC_FACTOR", "fast")]).unwrap_err();
        assert!(err.to_string().contains("PLANNER_TRAFFIC_FACTOR"));
    }

    #[test]
    fn test_config_invalid_optimizer_settings_rejected() {
        assert!(config_from(&[("PLANNER_AVERAGE_SPEED_KMH", "0")]).is_err());
        assert!(config_from(&[("PLANNER_BREAK_TIME_MIN", "-5")]).is_err());
        assert!(config_from(&[("PLANNER_NEARBY_THRESHOLD_KM", "0")]).is_err());
        assert!(config_from(&[("PLANNER_REASSIGN_YIELD_EVERY", "0")]).is_err());
    }

    #[test]
    #[ignore] // requires --test-threads=1 due to env var race
    fn test_config_from_env_reads_process_env() {
        std::env::set_var("PLANNER_DRIVING_FACTOR", "1.6");

        let config = Config::from_env().unwrap();
        assert!((config.optimizer.driving_distance_factor - 1.6).abs() < f64::EPSILON);

        // Cleanup
        std::env::remove_var("PLANNER_DRIVING_FACTOR");
    }
}
