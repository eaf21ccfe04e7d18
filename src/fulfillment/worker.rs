//! Background worker: render, wait for the tenant's session, deliver.

use super::board::JobBoard;
use super::job::{FailureReason, FulfillmentJob, JobId, JobState};
use super::queue::FulfillmentQueue;
use super::renderer::DocumentRenderer;
use super::retry::RetryPolicy;
use crate::config::FulfillmentConfig;
use crate::messaging::{DeliveryResult, RejectReason, SessionManager};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{error, info, info_span, warn, Instrument};

/// Everything a single job needs, shared by all job tasks.
#[derive(Clone)]
struct JobContext {
    board: JobBoard,
    sessions: SessionManager,
    renderer: Arc<dyn DocumentRenderer>,
    ready_timeout: Duration,
    retry: RetryPolicy,
    /// Held around rendering and each send, never across a readiness wait.
    active: Arc<Semaphore>,
}

pub struct FulfillmentWorker {
    receiver: mpsc::Receiver<FulfillmentJob>,
    /// Jobs taken off the queue but not finished.
    in_flight: Arc<Semaphore>,
    shutdown_grace: Duration,
    ctx: JobContext,
}

impl FulfillmentWorker {
    /// Creates the worker and the queue that feeds it. Call [`run`](Self::run)
    /// on a spawned task; it returns once every queue handle is dropped.
    pub fn new(
        config: &FulfillmentConfig,
        sessions: SessionManager,
        renderer: Arc<dyn DocumentRenderer>,
    ) -> (Self, FulfillmentQueue) {
        let board = JobBoard::with_retention(config.retain_finished);
        let (queue, receiver) = FulfillmentQueue::channel(config.queue_capacity, board.clone());
        let worker = Self {
            receiver,
            in_flight: Arc::new(Semaphore::new(config.queue_capacity)),
            shutdown_grace: config.shutdown_grace,
            ctx: JobContext {
                board,
                sessions,
                renderer,
                ready_timeout: config.ready_timeout,
                retry: config.retry.clone(),
                active: Arc::new(Semaphore::new(config.max_concurrent_jobs)),
            },
        };
        (worker, queue)
    }

    pub fn board(&self) -> &JobBoard {
        &self.ctx.board
    }

    pub async fn run(mut self) {
        info!(
            max_concurrent = self.ctx.active.available_permits(),
            max_in_flight = self.in_flight.available_permits(),
            "Fulfillment worker started"
        );
        let mut jobs = JoinSet::new();

        loop {
            tokio::select! {
                job = self.receiver.recv() => {
                    let Some(job) = job else { break };
                    let Ok(slot) = self.in_flight.clone().acquire_owned().await else { break };
                    let span = info_span!("job", job_id = %job.id, invoice_id = %job.invoice.id, tenant = %job.tenant);
                    let ctx = self.ctx.clone();
                    jobs.spawn(
                        async move {
                            process(ctx, job).await;
                            drop(slot);
                        }
                        .instrument(span),
                    );
                }
                Some(joined) = jobs.join_next(), if !jobs.is_empty() => {
                    if let Err(e) = joined {
                        error!(error = %e, "Fulfillment task panicked");
                    }
                }
            }
        }

        info!(in_flight = jobs.len(), "Queue closed, draining jobs");
        let drained = tokio::time::timeout(self.shutdown_grace, async {
            while jobs.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            warn!(abandoned = jobs.len(), "Grace period elapsed, aborting jobs");
            jobs.abort_all();
        }
        info!("Fulfillment worker stopped");
    }
}

fn fail(board: &JobBoard, job: JobId, reason: FailureReason) {
    error!(%reason, "Fulfillment failed");
    board.set_state(job, JobState::Failed(reason));
}

async fn process(ctx: JobContext, job: FulfillmentJob) {
    let JobContext {
        board,
        sessions,
        renderer,
        ready_timeout,
        retry,
        active,
    } = ctx;
    // The semaphores are never closed.
    let Ok(permit) = active.acquire().await else { return };

    board.set_state(job.id, JobState::Rendering);
    let rendered = renderer.render(&job.invoice);
    drop(permit);
    let document = match rendered {
        Ok(document) => document,
        Err(e) => return fail(&board, job.id, FailureReason::Render(e.to_string())),
    };
    board.set_document(job.id, document.handle());
    let document = Arc::new(document);

    sessions.ensure_session(&job.tenant);
    if !sessions.wait_until_ready(&job.tenant, ready_timeout).await {
        return fail(&board, job.id, FailureReason::SessionNotReady);
    }

    board.set_state(job.id, JobState::Delivering);
    let caption = format!(
        "Thank you for your purchase! Here is your invoice #{}.",
        job.invoice.id
    );
    let mut waited_again = false;
    let mut transport_failures = 0;

    loop {
        let Ok(permit) = active.acquire().await else { return };
        let attempt = board.record_attempt(job.id);
        let result = sessions
            .deliver(&job.tenant, &job.contact, document.clone(), &caption)
            .await;
        drop(permit);
        match result {
            DeliveryResult::Delivered => {
                info!(attempt, "Invoice delivered");
                board.set_state(job.id, JobState::Delivered);
                return;
            }
            DeliveryResult::Rejected(RejectReason::InvalidRecipient(reason)) => {
                return fail(&board, job.id, FailureReason::InvalidRecipient(reason));
            }
            DeliveryResult::Rejected(RejectReason::SessionNotReady) => {
                // The session dropped between the wait and the send.
                if waited_again {
                    return fail(&board, job.id, FailureReason::SessionNotReady);
                }
                waited_again = true;
                warn!(attempt, "Session not ready, waiting once more");
                sessions.ensure_session(&job.tenant);
                if !sessions.wait_until_ready(&job.tenant, ready_timeout).await {
                    return fail(&board, job.id, FailureReason::SessionNotReady);
                }
            }
            DeliveryResult::Rejected(RejectReason::Transport(reason)) => {
                transport_failures += 1;
                if !retry.should_retry(transport_failures) {
                    return fail(&board, job.id, FailureReason::Transport(reason));
                }
                let delay = retry.delay_for_attempt(transport_failures);
                warn!(attempt, %reason, ?delay, "Delivery failed, retrying");
                tokio::time::sleep(delay).await;
            }
        }
    }
}
