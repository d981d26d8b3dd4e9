//! Record deduplication service
//!
//! Each batch runs on its own blocking thread that owns a copy of the records
//! and reports back only through a channel:
//! - zero or more `PROGRESS` messages
//! - exactly one `COMPLETE` carrying the report
//!
//! A cancelled job stops at its next checkpoint and closes the channel without
//! a report. Dropping the `DedupJob` cancels the batch the same way.

mod matcher;
mod normalize;

pub use matcher::{edit_distance, find_duplicate_groups, name_tolerance, MatchRules, EDIT_DISTANCE_SENTINEL};
pub use normalize::{normalize_records, AliasDictionary};

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{EngineError, Result};
use crate::services::cancellation::{CancellationRegistry, JobGuard, CANCELLATION};
use crate::services::progress::ProgressSink;
use crate::types::{CleaningReport, DedupRequest, DedupResponse, GeoRecord};

/// Room for every message of one batch: at the 2 % cadence a batch emits at
/// most 99 checkpoints, the final 100 and the report
const DEFAULT_CHANNEL_CAPACITY: usize = 128;

/// Run both cleaning passes over a batch.
///
/// Normalizes region/city in place, then groups duplicates. Returns
/// `EngineError::Cancelled` as soon as `is_cancelled` reports true at a checkpoint.
pub fn clean_batch(
    mut records: Vec<GeoRecord>,
    aliases: &AliasDictionary,
    rules: &MatchRules,
    progress: &mut dyn FnMut(u8),
    is_cancelled: &dyn Fn() -> bool,
) -> Result<CleaningReport> {
    let started_at = Instant::now();

    if is_cancelled() {
        return Err(EngineError::Cancelled);
    }

    let (normalization_edits, normalized_count) = normalize_records(&mut records, aliases);
    debug!("Normalized {} of {} records", normalized_count, records.len());

    if is_cancelled() {
        return Err(EngineError::Cancelled);
    }

    let duplicate_groups = find_duplicate_groups(&records, rules, progress, is_cancelled)?;
    let duplicates_found = duplicate_groups.iter().map(|g| g.len()).sum();

    Ok(CleaningReport {
        total_scanned: records.len(),
        normalized_count,
        duplicates_found,
        duplicate_groups,
        normalization_edits,
        duration_ms: started_at.elapsed().as_millis() as u64,
        completed_at: Utc::now(),
    })
}

/// Runs cleaning batches off the caller's thread
#[derive(Clone)]
pub struct DedupService {
    aliases: Arc<AliasDictionary>,
    rules: MatchRules,
    registry: CancellationRegistry,
    channel_capacity: usize,
}

impl Default for DedupService {
    fn default() -> Self {
        Self::new(AliasDictionary::default())
    }
}

impl DedupService {
    /// Service using the global cancellation registry
    pub fn new(aliases: AliasDictionary) -> Self {
        Self::with_registry(aliases, CANCELLATION.clone())
    }

    pub fn with_registry(aliases: AliasDictionary, registry: CancellationRegistry) -> Self {
        Self {
            aliases: Arc::new(aliases),
            rules: MatchRules::default(),
            registry,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    pub fn with_rules(mut self, rules: MatchRules) -> Self {
        self.rules = rules;
        self
    }

    /// Bound on undelivered messages; a full channel pauses the worker
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    pub fn registry(&self) -> &CancellationRegistry {
        &self.registry
    }

    /// Start a cleaning batch under a fresh job id.
    ///
    /// Must be called from within a tokio runtime, otherwise `EngineError::NoRuntime`.
    pub fn submit(&self, request: DedupRequest) -> Result<DedupJob> {
        self.submit_with_id(Uuid::new_v4(), request)
    }

    /// Start a cleaning batch under a caller-chosen job id.
    ///
    /// A job id that was pre-cancelled finishes immediately without a report.
    pub fn submit_with_id(&self, job_id: Uuid, request: DedupRequest) -> Result<DedupJob> {
        let runtime = Handle::try_current().map_err(|_| EngineError::NoRuntime)?;
        let (tx, rx) = mpsc::channel(self.channel_capacity);
        // Registered before spawning so a cancel right after submit is never lost
        let guard = self.registry.register(job_id);
        let aliases = Arc::clone(&self.aliases);
        let rules = self.rules;

        info!("Dedup job {} submitted with {} records", job_id, request.item_count());

        let handle = runtime.spawn_blocking(move || run_job(guard, request, &aliases, &rules, tx));

        Ok(DedupJob {
            job_id,
            rx,
            handle,
            registry: self.registry.clone(),
        })
    }

    /// Cancel a running job by id
    pub fn cancel(&self, job_id: &Uuid) -> bool {
        self.registry.cancel(job_id)
    }
}

/// Body of the worker thread
fn run_job(
    guard: JobGuard,
    request: DedupRequest,
    aliases: &AliasDictionary,
    rules: &MatchRules,
    tx: mpsc::Sender<DedupResponse>,
) {
    let job_id = guard.job_id();
    let token = guard.token().clone();
    let DedupRequest::StartCleaning { data } = request;

    // A closed channel means the caller went away: stop like a cancel
    let mut emit = |progress: u8| {
        if tx.blocking_send(DedupResponse::Progress { progress }).is_err() {
            token.cancel();
        }
    };

    match clean_batch(data, aliases, rules, &mut emit, &|| token.is_cancelled()) {
        Ok(report) => {
            info!(
                "Dedup job {} completed: {} scanned, {} normalized, {} duplicates in {} groups ({} ms)",
                job_id,
                report.total_scanned,
                report.normalized_count,
                report.duplicates_found,
                report.duplicate_groups.len(),
                report.duration_ms
            );
            if tx.blocking_send(DedupResponse::Complete { report }).is_err() {
                debug!("Dedup job {} finished after its receiver was dropped", job_id);
            }
        }
        Err(e) => info!("Dedup job {} stopped: {}", job_id, e),
    }
}

/// Handle to a submitted cleaning batch
pub struct DedupJob {
    job_id: Uuid,
    rx: mpsc::Receiver<DedupResponse>,
    handle: JoinHandle<()>,
    registry: CancellationRegistry,
}

impl DedupJob {
    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    /// Next message from the worker, `None` once the channel is closed
    pub async fn recv(&mut self) -> Option<DedupResponse> {
        self.rx.recv().await
    }

    /// Ask the worker to stop at its next checkpoint
    pub fn cancel(&self) -> bool {
        self.registry.cancel(&self.job_id)
    }

    /// Wait for the worker thread to exit, leaving queued messages in place
    #[cfg(test)]
    async fn worker_exit(&mut self) -> std::result::Result<(), tokio::task::JoinError> {
        (&mut self.handle).await
    }

    /// Forward progress to `progress` and return the final report
    pub async fn wait(mut self, progress: &dyn ProgressSink) -> Result<CleaningReport> {
        while let Some(message) = self.rx.recv().await {
            match message {
                DedupResponse::Progress { progress: percent } => progress.report(percent),
                DedupResponse::Complete { report } => return Ok(report),
            }
        }

        // Channel closed without a report: cancelled, or the worker died
        match (&mut self.handle).await {
            Ok(()) => Err(EngineError::Cancelled),
            Err(e) => {
                warn!("Dedup job {} worker failed: {}", self.job_id, e);
                Err(EngineError::WorkerGone)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::progress::{NoopProgress, RecordedProgress};

    fn service() -> DedupService {
        DedupService::with_registry(AliasDictionary::default(), CancellationRegistry::default())
    }

    fn rec(id: &str, name: &str, lat: f64, lng: f64) -> GeoRecord {
        GeoRecord::new(id, name, lat, lng)
    }

    fn spread(n: usize) -> Vec<GeoRecord> {
        (0..n)
            .map(|i| rec(&format!("s{i}"), &format!("Store {i}"), 21.0 + i as f64 * 0.002, 39.0))
            .collect()
    }

    #[test]
    fn test_clean_batch_report() {
        let records = vec![
            rec("1", "Al Noor Market", 21.5433, 39.1728).with_region("jeddah consumer"),
            rec("2", "AL NOOR MARKET", 21.5433, 39.1728).with_region("Jeddah"),
            rec("3", "Baqala", 21.6, 39.2),
        ];
        let report = clean_batch(
            records,
            &AliasDictionary::default(),
            &MatchRules::default(),
            &mut |_: u8| {},
            &|| false,
        )
        .unwrap();

        assert_eq!(report.total_scanned, 3);
        assert_eq!(report.normalized_count, 1);
        assert_eq!(report.normalization_edits.len(), 1);
        assert_eq!(report.normalization_edits[0].record_id, "1");
        assert_eq!(report.normalization_edits[0].new_value, "Jeddah");
        assert_eq!(report.duplicate_groups.len(), 1);
        assert_eq!(report.duplicates_found, 2);
    }

    #[test]
    fn test_duplicates_found_sums_group_sizes() {
        let records = vec![
            rec("a1", "Alpha Store", 21.50, 39.10),
            rec("a2", "alpha store", 21.50, 39.10),
            rec("a3", "Alpha Store ", 21.50, 39.10),
            rec("b1", "Beta Store", 21.60, 39.10),
            rec("b2", "Beta Store", 21.60, 39.10),
        ];
        let report =
            clean_batch(records, &AliasDictionary::empty(), &MatchRules::default(), &mut |_: u8| {}, &|| false)
                .unwrap();

        assert_eq!(report.duplicate_groups.len(), 2);
        assert_eq!(report.duplicates_found, 5);
        assert_eq!(report.normalized_count, 0);
    }

    #[tokio::test]
    async fn test_job_streams_progress_then_one_complete() {
        let mut records = spread(200);
        records.push(rec("dup", "Store 0", 21.0, 39.0));

        let mut job = service().submit(DedupRequest::start_cleaning(records)).unwrap();
        let mut progress_messages = 0;
        let mut completes = 0;
        let mut report = None;

        while let Some(message) = job.recv().await {
            match message {
                DedupResponse::Progress { progress } => {
                    assert_eq!(completes, 0, "progress after complete");
                    assert!(progress <= 100);
                    progress_messages += 1;
                }
                DedupResponse::Complete { report: r } => {
                    completes += 1;
                    report = Some(r);
                }
            }
        }

        assert!(progress_messages > 0);
        assert_eq!(completes, 1);
        let report = report.unwrap();
        assert_eq!(report.total_scanned, 201);
        assert_eq!(report.duplicate_groups.len(), 1);
        assert!(report.duplicate_groups[0].contains("dup"));
        assert!(report.duplicate_groups[0].contains("s0"));
    }

    #[tokio::test]
    async fn test_wait_forwards_progress() {
        let progress = RecordedProgress::default();
        let report = service()
            .submit(DedupRequest::start_cleaning(spread(100)))
            .unwrap()
            .wait(&progress)
            .await
            .unwrap();

        assert_eq!(report.total_scanned, 100);
        assert_eq!(progress.values().last(), Some(&100));
    }

    #[tokio::test]
    async fn test_empty_batch_completes() {
        let report = service()
            .submit(DedupRequest::start_cleaning(vec![]))
            .unwrap()
            .wait(&NoopProgress)
            .await
            .unwrap();

        assert_eq!(report.total_scanned, 0);
        assert!(report.duplicate_groups.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_running_job() {
        // Capacity 1 keeps the worker from running ahead of the receiver
        let service = service().with_channel_capacity(1);
        let job = service.submit(DedupRequest::start_cleaning(spread(1000))).unwrap();

        assert!(job.cancel());
        let result = job.wait(&NoopProgress).await;

        assert!(matches!(result, Err(EngineError::Cancelled)));
    }

    #[tokio::test]
    async fn test_pre_cancelled_job_sends_nothing() {
        let service = service();
        let job_id = Uuid::new_v4();
        service.registry().pre_cancel(job_id);

        let mut job = service.submit_with_id(job_id, DedupRequest::start_cleaning(spread(10))).unwrap();
        assert_eq!(job.job_id(), job_id);
        assert!(job.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_finished_job_leaves_registry() {
        let service = service();
        let mut job = service.submit(DedupRequest::start_cleaning(spread(5))).unwrap();

        while let Some(message) = job.recv().await {
            if matches!(message, DedupResponse::Complete { .. }) {
                break;
            }
        }
        job.worker_exit().await.unwrap();

        assert_eq!(service.registry().active_jobs(), 0);
    }

    #[test]
    fn test_submit_outside_runtime_is_an_error() {
        let service = service();
        let result = service.submit(DedupRequest::start_cleaning(spread(3)));

        assert!(matches!(result, Err(EngineError::NoRuntime)));
        assert_eq!(service.registry().active_jobs(), 0);
    }

    #[tokio::test]
    async fn test_default_capacity_holds_a_whole_batch() {
        // 99 records report at every record; nobody reads until the worker is done
        let mut job = service().submit(DedupRequest::start_cleaning(spread(99))).unwrap();
        job.worker_exit().await.unwrap();

        let mut messages = 0;
        let mut completed = false;
        while let Some(message) = job.recv().await {
            messages += 1;
            completed |= matches!(message, DedupResponse::Complete { .. });
        }
        assert_eq!(messages, 101);
        assert!(completed);
    }
}
