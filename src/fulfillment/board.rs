//! Shared, watchable view of every fulfillment job.

use super::job::{FulfillmentJob, JobId, JobRecord, JobState};
use crate::model::{DocumentHandle, InvoiceId};
use chrono::Utc;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JobStats {
    pub submitted: u64,
    /// Refused at submit time (queue full or closed).
    pub rejected: u64,
    pub delivered: u64,
    pub failed: u64,
    pub retries: u64,
}

/// Finished records kept by [`JobBoard::new`].
pub const DEFAULT_RETAINED_JOBS: usize = 1024;

#[derive(Debug, Default)]
struct Board {
    jobs: HashMap<JobId, JobRecord>,
    /// Terminal jobs, oldest first.
    finished: VecDeque<JobId>,
    stats: JobStats,
}

/// Cheap to clone; all clones share one board.
///
/// Only the newest `retain` delivered or failed records are kept; older ones
/// are dropped as new jobs finish. Unfinished jobs are never dropped, and the
/// counters cover every job ever seen.
#[derive(Clone)]
pub struct JobBoard {
    board: Arc<watch::Sender<Board>>,
    retain: usize,
}

impl Default for JobBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl JobBoard {
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_RETAINED_JOBS)
    }

    pub fn with_retention(retain: usize) -> Self {
        let (board, _) = watch::channel(Board::default());
        Self {
            board: Arc::new(board),
            retain,
        }
    }

    pub(crate) fn register(&self, job: &FulfillmentJob) {
        let record = JobRecord {
            job_id: job.id,
            invoice_id: job.invoice.id,
            tenant: job.tenant.clone(),
            contact: job.contact.clone(),
            state: JobState::Pending,
            attempts: 0,
            document: None,
            updated_at: Utc::now(),
        };
        self.board.send_modify(|b| {
            b.jobs.insert(job.id, record);
            b.stats.submitted += 1;
        });
    }

    /// Removes a job that never made it onto the queue.
    pub(crate) fn reject(&self, job: JobId) {
        self.board.send_modify(|b| {
            if b.jobs.remove(&job).is_some() {
                b.stats.submitted -= 1;
            }
            b.stats.rejected += 1;
        });
    }

    pub(crate) fn set_state(&self, job: JobId, state: JobState) {
        self.board.send_modify(|b| {
            match &state {
                JobState::Delivered => b.stats.delivered += 1,
                JobState::Failed(_) => b.stats.failed += 1,
                _ => {}
            }
            let Some(record) = b.jobs.get_mut(&job) else {
                return;
            };
            let finished = state.is_terminal() && !record.state.is_terminal();
            record.state = state;
            record.updated_at = Utc::now();
            if finished {
                b.finished.push_back(job);
                while b.finished.len() > self.retain {
                    if let Some(oldest) = b.finished.pop_front() {
                        b.jobs.remove(&oldest);
                    }
                }
            }
        });
    }

    pub(crate) fn set_document(&self, job: JobId, document: DocumentHandle) {
        self.update(job, |record| record.document = Some(document));
    }

    /// Counts one delivery attempt; returns the running total.
    pub(crate) fn record_attempt(&self, job: JobId) -> u32 {
        let mut attempts = 0;
        self.board.send_modify(|b| {
            if let Some(record) = b.jobs.get_mut(&job) {
                record.attempts += 1;
                record.updated_at = Utc::now();
                attempts = record.attempts;
                if attempts > 1 {
                    b.stats.retries += 1;
                }
            }
        });
        attempts
    }

    fn update(&self, job: JobId, f: impl FnOnce(&mut JobRecord)) {
        self.board.send_modify(|b| {
            if let Some(record) = b.jobs.get_mut(&job) {
                f(record);
                record.updated_at = Utc::now();
            }
        });
    }

    pub fn get(&self, job: JobId) -> Option<JobRecord> {
        self.board.borrow().jobs.get(&job).cloned()
    }

    pub fn jobs_for_invoice(&self, invoice: InvoiceId) -> Vec<JobRecord> {
        self.board
            .borrow()
            .jobs
            .values()
            .filter(|r| r.invoice_id == invoice)
            .cloned()
            .collect()
    }

    pub fn stats(&self) -> JobStats {
        self.board.borrow().stats
    }

    /// Waits until the job is delivered or failed. `None` on timeout, or when
    /// the job is unknown or its record has already been dropped.
    pub async fn wait_for_terminal(&self, job: JobId, timeout: Duration) -> Option<JobRecord> {
        let mut rx = self.board.subscribe();
        let done = rx.wait_for(|b| match b.jobs.get(&job) {
            Some(record) => record.state.is_terminal(),
            None => true,
        });
        let record = match tokio::time::timeout(timeout, done).await {
            Ok(Ok(board)) => board.jobs.get(&job).cloned(),
            _ => None,
        };
        record
    }
}
