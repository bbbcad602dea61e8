//! Synthetic CPU load generation.
//!
//! A [`LoadRequest`] asks for `intensity` busy-looping workers running for a
//! fixed wall-clock duration. Workers run on Tokio's blocking pool and poll a
//! shared [`CancelFlag`] between batches, so cancelled or abandoned runs stop
//! within a few microseconds of work.
//!
//! [`LoadJobs`] tracks detached runs started through the jobs API and the
//! synchronous runs tied to a request. At most
//! [`LoadLimits::max_running_jobs`] runs of either kind may be in progress at
//! once; finished jobs are kept for status polling until
//! [`RETAINED_FINISHED_JOBS`] newer ones replace them.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::hint::black_box;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::Error;

/// Default duration of a load run, in seconds.
pub const DEFAULT_DURATION_SECS: u64 = 10;
/// Default number of workers for a load run.
pub const DEFAULT_INTENSITY: u32 = 1;
/// Finished jobs kept for status lookups.
pub const RETAINED_FINISHED_JOBS: usize = 64;

const BATCH: u64 = 10_000;

/// Upper bounds applied to load requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadLimits {
    /// Longest accepted run, in seconds.
    pub max_duration_secs: u64,
    /// Largest accepted worker count.
    pub max_intensity: u32,
    /// Load runs, detached or synchronous, allowed in progress at once.
    pub max_running_jobs: usize,
}

impl Default for LoadLimits {
    fn default() -> Self {
        Self {
            max_duration_secs: 60,
            max_intensity: 10,
            max_running_jobs: 4,
        }
    }
}

/// Validation errors for [`LoadRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadValidationError {
    /// Duration is zero or above the configured maximum.
    #[error("duration must be between 1 and {max} seconds")]
    Duration {
        /// Maximum accepted duration.
        max: u64,
    },
    /// Intensity is zero or above the configured maximum.
    #[error("intensity must be between 1 and {max}")]
    Intensity {
        /// Maximum accepted intensity.
        max: u32,
    },
}

impl LoadValidationError {
    /// Request field the failure refers to.
    #[must_use]
    pub fn field(&self) -> &'static str {
        match self {
            Self::Duration { .. } => "duration",
            Self::Intensity { .. } => "intensity",
        }
    }

    /// Stable machine-readable code for the failure.
    #[must_use]
    pub fn code(&self) -> &'static str {
        "out_of_range"
    }
}

/// Validated load run parameters.
///
/// # Examples
/// ```
/// use stats_api::domain::{LoadLimits, LoadRequest};
///
/// let limits = LoadLimits::default();
/// let request = LoadRequest::new(5, 2, &limits).expect("within limits");
/// assert_eq!(request.duration_secs(), 5);
/// assert!(LoadRequest::new(1000, 1, &limits).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadRequest {
    duration_secs: u64,
    intensity: u32,
}

impl LoadRequest {
    /// Validate parameters against `limits`.
    pub fn new(
        duration_secs: u64,
        intensity: u32,
        limits: &LoadLimits,
    ) -> Result<Self, LoadValidationError> {
        if !(1..=limits.max_duration_secs).contains(&duration_secs) {
            return Err(LoadValidationError::Duration {
                max: limits.max_duration_secs,
            });
        }
        if !(1..=limits.max_intensity).contains(&intensity) {
            return Err(LoadValidationError::Intensity {
                max: limits.max_intensity,
            });
        }
        Ok(Self {
            duration_secs,
            intensity,
        })
    }

    /// Requested duration in whole seconds.
    #[must_use]
    pub fn duration_secs(&self) -> u64 {
        self.duration_secs
    }

    /// Requested duration.
    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }

    /// Requested number of workers.
    #[must_use]
    pub fn intensity(&self) -> u32 {
        self.intensity
    }
}

/// Outcome of a load run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    /// Loop iterations completed across all workers.
    pub iterations: u64,
    /// Wall-clock time from start until the last worker stopped.
    pub elapsed: Duration,
    /// Whether the run stopped early because it was cancelled.
    pub cancelled: bool,
}

/// Shared cancellation flag observed by load workers.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Ask workers to stop at their next check.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Guard that cancels the flag when dropped.
    #[must_use]
    pub fn cancel_on_drop(&self) -> CancelOnDrop {
        CancelOnDrop(self.clone())
    }
}

/// Cancels its [`CancelFlag`] when dropped.
#[derive(Debug)]
pub struct CancelOnDrop(CancelFlag);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

fn burn(deadline: Instant, cancel: &CancelFlag) -> u64 {
    let mut iterations = 0_u64;
    let mut acc = 0_u64;
    while !cancel.is_cancelled() && Instant::now() < deadline {
        for i in 0..BATCH {
            acc = black_box(acc.wrapping_mul(31).wrapping_add(i));
        }
        iterations = iterations.saturating_add(BATCH);
    }
    black_box(acc);
    iterations
}

/// Runs CPU-bound load on the blocking thread pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadGenerator;

impl LoadGenerator {
    /// Run until the requested duration elapses or `cancel` is set.
    pub async fn run(&self, request: LoadRequest, cancel: CancelFlag) -> Result<LoadReport, Error> {
        let started = Instant::now();
        let deadline = started + request.duration();
        debug!(
            duration_secs = request.duration_secs(),
            intensity = request.intensity(),
            "load run starting"
        );
        let workers: Vec<_> = (0..request.intensity())
            .map(|_| {
                let cancel = cancel.clone();
                tokio::task::spawn_blocking(move || burn(deadline, &cancel))
            })
            .collect();

        let mut iterations = 0_u64;
        for worker in workers {
            let done = worker
                .await
                .map_err(|err| Error::internal(format!("load worker failed: {err}")))?;
            iterations = iterations.saturating_add(done);
        }
        Ok(LoadReport {
            iterations,
            elapsed: started.elapsed(),
            cancelled: cancel.is_cancelled(),
        })
    }

    /// Run tied to the caller: dropping the returned future stops the workers.
    pub async fn run_attached(&self, request: LoadRequest) -> Result<LoadReport, Error> {
        let cancel = CancelFlag::default();
        let _guard = cancel.cancel_on_drop();
        self.run(request, cancel.clone()).await
    }
}

/// Identifier of a detached load job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct LoadJobId(Uuid);

impl LoadJobId {
    /// Generate a new random job identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for LoadJobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LoadJobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Lifecycle state of a detached load job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LoadJobState {
    /// Workers are burning CPU.
    Running,
    /// The full duration elapsed.
    Completed,
    /// Stopped early by a cancel request or shutdown.
    Cancelled,
    /// A worker panicked.
    Failed,
}

/// Snapshot of a detached load job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LoadJobStatus {
    /// Job identifier.
    #[schema(value_type = String, format = Uuid)]
    pub job_id: LoadJobId,
    /// Current state.
    pub status: LoadJobState,
    /// Requested duration in seconds.
    pub duration: u64,
    /// Requested worker count.
    pub intensity: u32,
    /// When the job started.
    #[schema(value_type = String, format = DateTime)]
    pub started_at: DateTime<Utc>,
    /// When the job stopped, once it has.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub finished_at: Option<DateTime<Utc>>,
    /// Iterations completed, once the job has stopped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iterations: Option<u64>,
    /// Wall-clock run time in milliseconds, once the job has stopped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
}

struct JobEntry {
    status: LoadJobStatus,
    cancel: CancelFlag,
}

#[derive(Default)]
struct JobTable {
    jobs: HashMap<LoadJobId, JobEntry>,
    finished: VecDeque<LoadJobId>,
    attached: usize,
}

impl JobTable {
    fn running(&self) -> usize {
        self.jobs
            .values()
            .filter(|entry| entry.status.status == LoadJobState::Running)
            .count()
    }

    fn in_progress(&self) -> usize {
        self.running() + self.attached
    }

    fn evict_finished(&mut self) {
        while self.finished.len() > RETAINED_FINISHED_JOBS {
            if let Some(oldest) = self.finished.pop_front() {
                self.jobs.remove(&oldest);
            }
        }
    }
}

/// Releases a synchronous run's slot when dropped.
struct AttachedSlot<'a>(&'a LoadJobs);

impl Drop for AttachedSlot<'_> {
    fn drop(&mut self) {
        let mut table = self.0.lock();
        table.attached = table.attached.saturating_sub(1);
    }
}

/// Registry of load runs: detached jobs plus a count of synchronous runs.
pub struct LoadJobs {
    generator: LoadGenerator,
    limits: LoadLimits,
    clock: Arc<dyn Clock>,
    table: Mutex<JobTable>,
}

impl LoadJobs {
    /// Create an empty registry.
    pub fn new(limits: LoadLimits, clock: Arc<dyn Clock>) -> Self {
        Self {
            generator: LoadGenerator,
            limits,
            clock,
            table: Mutex::new(JobTable::default()),
        }
    }

    /// Limits applied to requests handled by this registry.
    #[must_use]
    pub fn limits(&self) -> &LoadLimits {
        &self.limits
    }

    fn lock(&self) -> MutexGuard<'_, JobTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_capacity(&self, table: &JobTable) -> Result<(), Error> {
        if table.in_progress() >= self.limits.max_running_jobs {
            return Err(Error::conflict(format!(
                "too many load runs in progress (limit {})",
                self.limits.max_running_jobs
            )));
        }
        Ok(())
    }

    /// Run load tied to the caller, counted against the same limit as
    /// detached jobs.
    ///
    /// Fails with a conflict when the limit is reached. Dropping the returned
    /// future stops the workers and frees the slot.
    pub async fn run_attached(&self, request: LoadRequest) -> Result<LoadReport, Error> {
        let _slot = {
            let mut table = self.lock();
            self.ensure_capacity(&table)?;
            table.attached += 1;
            AttachedSlot(self)
        };
        self.generator.run_attached(request).await
    }

    /// Start a detached job.
    ///
    /// Fails with a conflict when [`LoadLimits::max_running_jobs`] runs are
    /// already in progress. Must be called from within a Tokio runtime.
    pub fn start(self: &Arc<Self>, request: LoadRequest) -> Result<LoadJobStatus, Error> {
        let job_id = LoadJobId::random();
        let cancel = CancelFlag::default();
        let status = {
            let mut table = self.lock();
            self.ensure_capacity(&table)?;
            let status = LoadJobStatus {
                job_id,
                status: LoadJobState::Running,
                duration: request.duration_secs(),
                intensity: request.intensity(),
                started_at: self.clock.utc(),
                finished_at: None,
                iterations: None,
                elapsed_ms: None,
            };
            table.jobs.insert(
                job_id,
                JobEntry {
                    status: status.clone(),
                    cancel: cancel.clone(),
                },
            );
            status
        };

        info!(
            %job_id,
            duration_secs = request.duration_secs(),
            intensity = request.intensity(),
            "load job started"
        );
        let jobs = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = jobs.generator.run(request, cancel).await;
            jobs.finish(job_id, outcome);
        });
        Ok(status)
    }

    fn finish(&self, job_id: LoadJobId, outcome: Result<LoadReport, Error>) {
        let finished_at = self.clock.utc();
        let mut table = self.lock();
        let Some(entry) = table.jobs.get_mut(&job_id) else {
            return;
        };
        let status = &mut entry.status;
        status.finished_at = Some(finished_at);
        match outcome {
            Ok(report) => {
                status.status = if report.cancelled {
                    LoadJobState::Cancelled
                } else {
                    LoadJobState::Completed
                };
                status.iterations = Some(report.iterations);
                status.elapsed_ms =
                    Some(u64::try_from(report.elapsed.as_millis()).unwrap_or(u64::MAX));
                info!(%job_id, state = ?status.status, "load job finished");
            }
            Err(error) => {
                status.status = LoadJobState::Failed;
                warn!(%job_id, error = %error, "load job failed");
            }
        }
        table.finished.push_back(job_id);
        table.evict_finished();
    }

    /// Current status of a job.
    pub fn get(&self, job_id: &LoadJobId) -> Result<LoadJobStatus, Error> {
        self.lock()
            .jobs
            .get(job_id)
            .map(|entry| entry.status.clone())
            .ok_or_else(|| Error::not_found(format!("load job not found: {job_id}")))
    }

    /// Request cancellation of a job and return its status.
    ///
    /// Finished jobs are returned unchanged.
    pub fn cancel(&self, job_id: &LoadJobId) -> Result<LoadJobStatus, Error> {
        let table = self.lock();
        let entry = table
            .jobs
            .get(job_id)
            .ok_or_else(|| Error::not_found(format!("load job not found: {job_id}")))?;
        if entry.status.status == LoadJobState::Running {
            entry.cancel.cancel();
            info!(%job_id, "load job cancellation requested");
        }
        Ok(entry.status.clone())
    }

    /// Cancel every running job. Returns how many were signalled.
    pub fn cancel_all(&self) -> usize {
        let table = self.lock();
        let mut cancelled = 0;
        for entry in table.jobs.values() {
            if entry.status.status == LoadJobState::Running {
                entry.cancel.cancel();
                cancelled += 1;
            }
        }
        cancelled
    }

    /// Number of detached jobs still running.
    #[must_use]
    pub fn running(&self) -> usize {
        self.lock().running()
    }

    /// Number of runs, detached or synchronous, currently in progress.
    #[must_use]
    pub fn in_progress(&self) -> usize {
        self.lock().in_progress()
    }
}
