//! Background triage.
//!
//! Ticket creation hands ids to a [`TriageQueue`] instead of waiting on the
//! pipeline. A single worker runs each triage on the blocking pool, one at a
//! time. Failures go out on a dedicated channel so none are lost with the
//! caller's request.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::{Orchestrator, TriageError, TriageReport, TriageStore};

/// Why a queued triage did not complete.
#[derive(Debug, thiserror::Error)]
pub enum FailureCause {
    #[error(transparent)]
    Triage(#[from] TriageError),

    #[error("triage worker panicked: {0}")]
    Panicked(String),
}

/// A triage run that failed in the background.
#[derive(Debug)]
pub struct TriageFailure {
    pub ticket_id: Uuid,
    pub cause: FailureCause,
}

#[derive(Debug, thiserror::Error)]
#[error("triage queue is closed")]
pub struct QueueClosed;

/// Ticket ids that are queued or running.
type Pending = Arc<Mutex<HashSet<Uuid>>>;

/// Hands tickets to a background triage worker.
pub struct TriageQueue {
    jobs: mpsc::UnboundedSender<Uuid>,
    pending: Pending,
    worker: JoinHandle<Vec<TriageReport>>,
}

impl TriageQueue {
    /// Starts the worker. Must be called from within a Tokio runtime.
    ///
    /// Returns the queue and the receiving end of its failure channel.
    pub fn spawn<S>(
        orchestrator: Arc<Orchestrator<S>>,
    ) -> (Self, mpsc::UnboundedReceiver<TriageFailure>)
    where
        S: TriageStore + Send + Sync + 'static,
    {
        let (jobs, job_rx) = mpsc::unbounded_channel();
        let (failure_tx, failure_rx) = mpsc::unbounded_channel();
        let pending = Pending::default();

        let worker = tokio::spawn(run_worker(
            orchestrator,
            job_rx,
            Arc::clone(&pending),
            failure_tx,
        ));

        let queue = Self {
            jobs,
            pending,
            worker,
        };
        (queue, failure_rx)
    }

    /// Queues a ticket for triage.
    ///
    /// Returns `Ok(false)` without queueing if the ticket is already queued
    /// or running.
    pub fn submit(&self, ticket_id: Uuid) -> Result<bool, QueueClosed> {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if !pending.insert(ticket_id) {
            debug!(ticket = %ticket_id, "triage already pending, not queued again");
            return Ok(false);
        }
        if self.jobs.send(ticket_id).is_err() {
            pending.remove(&ticket_id);
            return Err(QueueClosed);
        }
        Ok(true)
    }

    /// Stops accepting work and waits for everything queued to finish.
    ///
    /// Returns the reports of the runs that succeeded, in completion order.
    pub async fn drain(self) -> Vec<TriageReport> {
        drop(self.jobs);
        match self.worker.await {
            Ok(reports) => reports,
            Err(e) => {
                error!(error = %e, "triage worker stopped unexpectedly");
                Vec::new()
            }
        }
    }
}

async fn run_worker<S>(
    orchestrator: Arc<Orchestrator<S>>,
    mut jobs: mpsc::UnboundedReceiver<Uuid>,
    pending: Pending,
    failures: mpsc::UnboundedSender<TriageFailure>,
) -> Vec<TriageReport>
where
    S: TriageStore + Send + Sync + 'static,
{
    let mut completed = Vec::new();

    while let Some(ticket_id) = jobs.recv().await {
        let orchestrator = Arc::clone(&orchestrator);
        let result = tokio::task::spawn_blocking(move || orchestrator.triage(ticket_id)).await;

        pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&ticket_id);

        let cause = match result {
            Ok(Ok(report)) => {
                completed.push(report);
                continue;
            }
            Ok(Err(e)) => FailureCause::Triage(e),
            Err(e) => FailureCause::Panicked(e.to_string()),
        };

        warn!(ticket = %ticket_id, error = %cause, "triage failed");
        if failures.send(TriageFailure { ticket_id, cause }).is_err() {
            error!(ticket = %ticket_id, "failure channel closed, triage failure dropped");
        }
    }

    completed
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::TicketStatus;
    use crate::storage::Storage;
    use crate::storage::tests::{sample_ticket, test_storage};
    use crate::triage::Outcome;

    fn queue_for(storage: &Storage) -> (TriageQueue, mpsc::UnboundedReceiver<TriageFailure>) {
        TriageQueue::spawn(Arc::new(Orchestrator::new(storage.clone())))
    }

    #[tokio::test]
    async fn triages_every_submitted_ticket() {
        let (_dir, storage) = test_storage();
        let refund = sample_ticket("Refund for double charge");
        let vague = sample_ticket("Something vague");
        storage.create_ticket(&refund).unwrap();
        storage.create_ticket(&vague).unwrap();

        let (queue, mut failures) = queue_for(&storage);
        assert!(queue.submit(refund.id).unwrap());
        assert!(queue.submit(vague.id).unwrap());
        let reports = queue.drain().await;

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].outcome, Outcome::AutoClosed);
        assert_eq!(reports[1].outcome, Outcome::Escalated);
        assert!(failures.try_recv().is_err());

        assert_eq!(
            storage.load_ticket(refund.id).unwrap().status,
            TicketStatus::Resolved
        );
        assert_eq!(
            storage.load_ticket(vague.id).unwrap().status,
            TicketStatus::WaitingHuman
        );
    }

    #[tokio::test]
    async fn failures_arrive_on_the_failure_channel() {
        let (_dir, storage) = test_storage();
        let missing = Uuid::new_v4();

        let (queue, mut failures) = queue_for(&storage);
        queue.submit(missing).unwrap();
        let reports = queue.drain().await;

        assert!(reports.is_empty());
        let failure = failures.recv().await.unwrap();
        assert_eq!(failure.ticket_id, missing);
        assert!(matches!(
            failure.cause,
            FailureCause::Triage(TriageError::NotFound(id)) if id == missing
        ));
    }

    #[tokio::test]
    async fn duplicate_submission_is_rejected_while_pending() {
        let (_dir, storage) = test_storage();
        let ticket = sample_ticket("Shipment delayed 5 days");
        storage.create_ticket(&ticket).unwrap();

        let (queue, _failures) = queue_for(&storage);
        // The worker hasn't run yet on this single-threaded runtime.
        assert!(queue.submit(ticket.id).unwrap());
        assert!(!queue.submit(ticket.id).unwrap());
        let reports = queue.drain().await;

        assert_eq!(reports.len(), 1);
        assert_eq!(storage.list_suggestions(ticket.id).unwrap().len(), 1);
    }
}
