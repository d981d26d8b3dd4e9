//! Planning and data-quality services

pub mod cancellation;
pub mod dedup;
pub mod geo;
pub mod progress;
pub mod proximity;
pub mod reassignment;
pub mod sequencer;
