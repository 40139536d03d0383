//! Batch coordinator: many encode or decode items on a bounded worker pool
//!
//! Each submitted job gets its own rayon pool sized to the concurrency limit. Items are
//! isolated from one another: an error or a panic lands in that item's slot and the
//! rest of the job carries on. Cancellation is cooperative; items that have not started
//! are marked cancelled, and running items see the flag at their next checkpoint.

/// Work items, outputs and the built-in processors
pub mod job;

pub use job::{
    Checkpoint, DecodeProcessor, EncodeOutput, EncodeProcessor, ItemOutput, ItemProcessor,
    ItemResult, JobId, JobStatus, WorkItem,
};

use crate::config::BatchConfig;
use crate::error::{BatchError, ItemError};
use crate::scanner::ScanOptions;
use std::any::Any;
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Which built-in processor a job uses
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BatchMode {
    /// Encode and render every item
    Encode,
    /// Scan every item
    Decode(ScanOptions),
}

#[derive(Debug, Clone)]
enum Slot {
    Pending,
    Running,
    Finished(ItemResult),
}

#[derive(Debug)]
struct JobState {
    status: JobStatus,
    slots: Vec<Slot>,
    remaining: usize,
}

struct Job {
    cancel: Arc<AtomicBool>,
    state: Mutex<JobState>,
    done: Condvar,
    // Lives as long as the job; `None` for empty jobs
    pool: Option<rayon::ThreadPool>,
}

impl Job {
    fn lock(&self) -> MutexGuard<'_, JobState> {
        // A worker that panicked while holding the lock leaves consistent slot data
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Point-in-time view of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    /// Job status
    pub status: JobStatus,
    /// Items submitted
    pub total: usize,
    /// Items finished successfully
    pub completed: usize,
    /// Items finished with an error other than cancellation
    pub failed: usize,
    /// Items cancelled
    pub cancelled: usize,
    /// Items currently being processed
    pub running: usize,
}

impl ProgressSnapshot {
    /// Items not yet started
    pub fn pending(&self) -> usize {
        self.total - self.completed - self.failed - self.cancelled - self.running
    }
}

/// Final per-item results of a job, in submission order
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// Job id
    pub job_id: JobId,
    /// `Completed` or `Cancelled`
    pub status: JobStatus,
    /// One entry per submitted item
    pub results: Vec<ItemResult>,
}

impl BatchReport {
    /// Successful outputs with their indices
    pub fn successes(&self) -> impl Iterator<Item = (usize, &ItemOutput)> {
        self.results
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.as_ref().ok().map(|out| (i, out)))
    }

    /// Failed items with their indices
    pub fn failures(&self) -> impl Iterator<Item = (usize, &BatchError)> {
        self.results
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.as_ref().err().map(|err| (i, err)))
    }

    /// Number of successful items
    pub fn success_count(&self) -> usize {
        self.successes().count()
    }
}

/// Runs jobs and tracks them by id until their report is collected
pub struct BatchCoordinator {
    config: BatchConfig,
    jobs: Mutex<HashMap<JobId, Arc<Job>>>,
    next_id: AtomicU64,
}

impl Default for BatchCoordinator {
    fn default() -> Self {
        Self::new(BatchConfig::default())
    }
}

impl BatchCoordinator {
    /// Coordinator with default concurrency and item timeout from `config`
    pub fn new(config: BatchConfig) -> Self {
        Self {
            config,
            jobs: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Start a job with a built-in processor. Returns as soon as the items are queued.
    pub fn submit(
        &self,
        items: Vec<WorkItem>,
        mode: BatchMode,
        concurrency: Option<usize>,
    ) -> Result<JobId, BatchError> {
        let processor: Arc<dyn ItemProcessor> = match mode {
            BatchMode::Encode => Arc::new(EncodeProcessor),
            BatchMode::Decode(options) => Arc::new(DecodeProcessor { options }),
        };
        self.submit_with(items, processor, concurrency)
    }

    /// Start a job with a caller-supplied processor
    pub fn submit_with(
        &self,
        items: Vec<WorkItem>,
        processor: Arc<dyn ItemProcessor>,
        concurrency: Option<usize>,
    ) -> Result<JobId, BatchError> {
        let limit = match concurrency.or(self.config.concurrency) {
            Some(0) => return Err(BatchError::InvalidConcurrency),
            Some(n) => n,
            None => std::thread::available_parallelism().map_or(1, |n| n.get()),
        };
        let threads = limit.min(items.len()).max(1);
        let total = items.len();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);

        let pool = if total > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .thread_name(move |i| format!("qr-batch-{id}-{i}"))
                .build()
                .map_err(|e| BatchError::Pool(e.to_string()))?;
            Some(pool)
        } else {
            None
        };

        let job = Arc::new(Job {
            cancel: Arc::new(AtomicBool::new(false)),
            state: Mutex::new(JobState {
                status: if total == 0 {
                    JobStatus::Completed
                } else {
                    JobStatus::Pending
                },
                slots: vec![Slot::Pending; total],
                remaining: total,
            }),
            done: Condvar::new(),
            pool,
        });

        if let Some(pool) = &job.pool {
            let timeout = self.config.item_timeout();
            for (index, item) in items.into_iter().enumerate() {
                let worker_job = Arc::clone(&job);
                let processor = Arc::clone(&processor);
                pool.spawn(move || {
                    run_item(&worker_job, processor.as_ref(), index, item, timeout)
                });
            }
        }

        self.jobs_lock().insert(id, job);
        info!(job = id, items = total, threads, "batch submitted");
        Ok(id)
    }

    /// Request cancellation. Unstarted items become `Cancelled`; running items stop at
    /// their next checkpoint.
    pub fn cancel(&self, id: JobId) -> Result<(), BatchError> {
        let job = self.job(id)?;
        job.cancel.store(true, Ordering::SeqCst);
        info!(job = id, "batch cancellation requested");
        Ok(())
    }

    /// Current progress without blocking
    pub fn poll(&self, id: JobId) -> Result<ProgressSnapshot, BatchError> {
        let job = self.job(id)?;
        let state = job.lock();
        let mut snapshot = ProgressSnapshot {
            status: state.status,
            total: state.slots.len(),
            completed: 0,
            failed: 0,
            cancelled: 0,
            running: 0,
        };
        for slot in &state.slots {
            match slot {
                Slot::Pending => {}
                Slot::Running => snapshot.running += 1,
                Slot::Finished(Ok(_)) => snapshot.completed += 1,
                Slot::Finished(Err(BatchError::ItemFailed(_, ItemError::Cancelled))) => {
                    snapshot.cancelled += 1
                }
                Slot::Finished(Err(_)) => snapshot.failed += 1,
            }
        }
        Ok(snapshot)
    }

    /// Block until every item is terminal, then hand over the report. The job id is
    /// forgotten afterwards.
    pub fn await_completion(&self, id: JobId) -> Result<BatchReport, BatchError> {
        let job = self.job(id)?;
        let results = {
            let mut state = job.lock();
            while state.remaining > 0 {
                state = job
                    .done
                    .wait(state)
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
            }
            let status = state.status;
            let results = state
                .slots
                .iter()
                .enumerate()
                .map(|(i, slot)| match slot {
                    Slot::Finished(result) => result.clone(),
                    _ => Err(BatchError::ItemFailed(i, ItemError::Cancelled)),
                })
                .collect();
            (status, results)
        };
        self.jobs_lock().remove(&id);
        let (status, results) = results;
        Ok(BatchReport {
            job_id: id,
            status,
            results,
        })
    }

    fn job(&self, id: JobId) -> Result<Arc<Job>, BatchError> {
        self.jobs_lock()
            .get(&id)
            .cloned()
            .ok_or(BatchError::UnknownJob(id))
    }

    fn jobs_lock(&self) -> MutexGuard<'_, HashMap<JobId, Arc<Job>>> {
        self.jobs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn run_item(
    job: &Job,
    processor: &dyn ItemProcessor,
    index: usize,
    item: WorkItem,
    timeout: Duration,
) {
    let result = if job.cancel.load(Ordering::SeqCst) {
        Err(ItemError::Cancelled)
    } else {
        {
            let mut state = job.lock();
            state.slots[index] = Slot::Running;
            if state.status == JobStatus::Pending {
                state.status = JobStatus::Running;
            }
        }
        let checkpoint = Checkpoint::new(Arc::clone(&job.cancel), Instant::now() + timeout);
        catch_unwind(AssertUnwindSafe(|| {
            processor.process(index, &item, &checkpoint)
        }))
        .unwrap_or_else(|payload| Err(ItemError::Panicked(panic_message(payload.as_ref()))))
    };

    match &result {
        Ok(_) => debug!(index, "batch item done"),
        Err(ItemError::Cancelled) => debug!(index, "batch item cancelled"),
        Err(err) => warn!(index, %err, "batch item failed"),
    }

    let mut state = job.lock();
    state.slots[index] = Slot::Finished(result.map_err(|e| BatchError::ItemFailed(index, e)));
    state.remaining -= 1;
    if state.remaining == 0 {
        state.status = if job.cancel.load(Ordering::SeqCst) {
            JobStatus::Cancelled
        } else {
            JobStatus::Completed
        };
        info!(status = ?state.status, "batch finished");
        job.done.notify_all();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
