//! Geoplan worker library
//!
//! Route sequencing, proximity scanning, cross-route reassignment advice and
//! record deduplication over geotagged customer records.

pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod services;
pub mod types;

pub use error::{EngineError, Result};
pub use services::dedup::{clean_batch, DedupJob, DedupService};
pub use services::geo::{distance_km, travel_time_min};
pub use services::proximity::{count_nearby, scan_same_location, ProximityIndex, SortSweepIndex};
pub use services::reassignment::{find_reassignments, ReassignOptions};
pub use services::sequencer::{sequence_route, RouteSequencer};
