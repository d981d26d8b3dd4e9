//! Cancellation registry for deduplication jobs
//!
//! Maps job ids to cancellation tokens, with RAII cleanup via `JobGuard`.

use std::collections::HashMap;
use std::sync::Arc;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Global cancellation registry singleton
pub static CANCELLATION: Lazy<CancellationRegistry> = Lazy::new(CancellationRegistry::default);

/// RAII guard that removes the job from the registry when dropped.
/// Must be kept alive for the duration of job processing.
pub struct JobGuard {
    job_id: Uuid,
    token: CancellationToken,
    registry: CancellationRegistry,
}

impl JobGuard {
    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    /// Token the running job polls at its checkpoints
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for JobGuard {
    fn drop(&mut self) {
        self.registry.remove(&self.job_id);
    }
}

/// Thread-safe registry of active jobs and their cancellation tokens
#[derive(Clone, Default)]
pub struct CancellationRegistry {
    jobs: Arc<Mutex<HashMap<Uuid, CancellationToken>>>,
}

impl CancellationRegistry {
    /// Register a job. Returns a `JobGuard` that must be held in scope during
    /// processing. A job that was pre-cancelled keeps its cancelled token.
    pub fn register(&self, job_id: Uuid) -> JobGuard {
        let token = self
            .jobs
            .lock()
            .entry(job_id)
            .or_insert_with(CancellationToken::new)
            .clone();
        JobGuard {
            job_id,
            token,
            registry: self.clone(),
        }
    }

    /// Cancel a running job.
    ///
    /// Returns `true` if the job was found, `false` if it already finished or
    /// has not started.
    pub fn cancel(&self, job_id: &Uuid) -> bool {
        match self.jobs.lock().get(job_id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Pre-register a cancelled token for a job that has not started yet.
    /// When the worker registers it, it sees the cancelled token and stops at once.
    pub fn pre_cancel(&self, job_id: Uuid) {
        let token = CancellationToken::new();
        token.cancel();
        self.jobs.lock().insert(job_id, token);
    }

    /// Check if a job has been cancelled
    pub fn is_cancelled(&self, job_id: &Uuid) -> bool {
        self.jobs
            .lock()
            .get(job_id)
            .map_or(false, |token| token.is_cancelled())
    }

    /// Remove a finished job from the registry.
    /// Called automatically by `JobGuard::drop`.
    pub fn remove(&self, job_id: &Uuid) {
        self.jobs.lock().remove(job_id);
    }

    pub fn active_jobs(&self) -> usize {
        self.jobs.lock().len()
    }

    #[cfg(test)]
    fn contains(&self, job_id: &Uuid) -> bool {
        self.jobs.lock().contains_key(job_id)
    }
}
