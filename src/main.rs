//! Geoplan Worker - route sequencing and record cleaning from the command line
//!
//! Each subcommand reads a JSON array of records and prints its result as JSON.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use geoplan_worker::cli::{Cli, Command};
use geoplan_worker::config::Config;
use geoplan_worker::services::proximity::{ProximityIndex, SortSweepIndex};
use geoplan_worker::types::{DedupRequest, GeoRecord, OptimizerConfig, StartLocation};
use geoplan_worker::{find_reassignments, DedupService, RouteSequencer};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;

    std::fs::create_dir_all(&config.logs_dir).ok();

    // File appender for persistent logs (daily rotation)
    let file_appender = RollingFileAppender::new(Rotation::DAILY, &config.logs_dir, "worker.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // Initialize logging - stderr keeps stdout clean for the JSON result
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,geoplan_worker=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false)) // file
        .init();

    debug!("Configuration loaded: {:?}", config);

    match cli.command {
        Command::Sequence {
            file,
            start,
            objective,
            depot,
        } => {
            let records = read_records(&file)?;
            let optimizer = OptimizerConfig {
                cost_objective: objective.into(),
                start_location: if depot { StartLocation::Depot } else { StartLocation::First },
                ..config.optimizer.clone()
            };
            let route = RouteSequencer::new(optimizer).sequence(&records, start.as_deref());
            print_json(&route)
        }
        Command::Scan { file, threshold_km } => {
            let records = read_records(&file)?;
            let index = SortSweepIndex::default();
            let mut same_location_ids: Vec<String> = index.same_location_ids(&records).into_iter().collect();
            same_location_ids.sort();
            let nearby_count =
                index.count_nearby(&records, Some(threshold_km.unwrap_or(config.nearby_threshold_km)));

            info!(
                "{} scan: {} co-located, {} with close neighbors",
                index.name(),
                same_location_ids.len(),
                nearby_count
            );
            print_json(&serde_json::json!({
                "sameLocationIds": same_location_ids,
                "nearbyCount": nearby_count,
            }))
        }
        Command::Reassign { file } => {
            let records = read_records(&file)?;
            let cancel = CancellationToken::new();
            let progress = |p: u8| debug!("Reassignment scan {}%", p);

            let options = config.reassign_options();
            let scan = find_reassignments(&records, &options, &progress, &cancel);
            let suggestions = tokio::select! {
                result = scan => result?,
                _ = tokio::signal::ctrl_c() => {
                    cancel.cancel();
                    anyhow::bail!("Reassignment scan interrupted");
                }
            };
            print_json(&suggestions)
        }
        Command::Dedup { file } => {
            let records = read_records(&file)?;
            let service = DedupService::default();
            let job = service.submit(DedupRequest::start_cleaning(records))?;
            let job_id = job.job_id();
            let progress = |p: u8| debug!("Dedup job {} {}%", job_id, p);

            let report = tokio::select! {
                result = job.wait(&progress) => result?,
                _ = tokio::signal::ctrl_c() => {
                    if !service.cancel(&job_id) {
                        warn!("Dedup job {} already finished", job_id);
                    }
                    anyhow::bail!("Dedup job {} interrupted", job_id);
                }
            };
            print_json(&report)
        }
    }
}

fn read_records(path: &Path) -> Result<Vec<GeoRecord>> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let records: Vec<GeoRecord> =
        serde_json::from_str(&raw).with_context(|| format!("{} is not a JSON array of records", path.display()))?;
    info!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
