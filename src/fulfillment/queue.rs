use super::board::JobBoard;
use super::job::{FulfillmentJob, JobId};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FulfillmentError {
    #[error("fulfillment queue is full")]
    QueueFull,
    #[error("fulfillment worker has stopped")]
    Closed,
}

/// Producer side of the worker's job channel. Submitting never waits.
#[derive(Clone)]
pub struct FulfillmentQueue {
    sender: mpsc::Sender<FulfillmentJob>,
    board: JobBoard,
}

impl FulfillmentQueue {
    /// A queue plus the receiving end, for wiring a worker or a test double.
    pub fn channel(capacity: usize, board: JobBoard) -> (Self, mpsc::Receiver<FulfillmentJob>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender, board }, receiver)
    }

    pub fn submit(&self, job: FulfillmentJob) -> Result<JobId, FulfillmentError> {
        let id = job.id;
        // Registered first so the worker never sees an unknown job.
        self.board.register(&job);
        match self.sender.try_send(job) {
            Ok(()) => {
                debug!(job_id = %id, "Job queued");
                Ok(id)
            }
            Err(e) => {
                self.board.reject(id);
                Err(match e {
                    mpsc::error::TrySendError::Full(_) => FulfillmentError::QueueFull,
                    mpsc::error::TrySendError::Closed(_) => FulfillmentError::Closed,
                })
            }
        }
    }

    pub fn board(&self) -> &JobBoard {
        &self.board
    }
}
