//! CLI argument parsing for the geoplan-worker binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::types::CostObjective;

#[derive(Parser)]
#[command(name = "geoplan-worker", about = "Route sequencing and record cleaning over geotagged records")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Order records into a visiting sequence and print the route summary
    Sequence {
        /// JSON file with an array of records
        file: PathBuf,
        /// Record id to start from
        #[arg(long)]
        start: Option<String>,
        /// What the nearest-neighbor step minimizes
        #[arg(long, value_enum, default_value_t = Objective::Balanced)]
        objective: Objective,
        /// Start from the first depot-like record
        #[arg(long)]
        depot: bool,
    },
    /// Find co-located records and count records with close neighbors
    Scan {
        file: PathBuf,
        /// Neighbor radius for the nearby count (km)
        #[arg(long)]
        threshold_km: Option<f64>,
    },
    /// Suggest moving records to a route that passes closer
    Reassign { file: PathBuf },
    /// Normalize region names and group duplicate records
    Dedup { file: PathBuf },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Objective {
    Distance,
    Time,
    Balanced,
}

impl From<Objective> for CostObjective {
    fn from(value: Objective) -> Self {
        match value {
            Objective::Distance => CostObjective::Distance,
            Objective::Time => CostObjective::Time,
            Objective::Balanced => CostObjective::Balanced,
        }
    }
}
