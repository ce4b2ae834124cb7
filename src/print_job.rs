//! Print job lifecycle and capacity control.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use queue_shared::{
    Clock, Job, JobAction, JobField, JobId, JobPatch, JobStatus, NewJob, PrintJobError, SystemClock,
    ValidationErrors,
};
use tokio::sync::{broadcast, RwLock};

use crate::catalog::PartCatalog;
use crate::config::QueueConfig;
use crate::query::{self, JobFilter, LiveQueueView, QueueView};
use crate::store::{JobChange, JobEvent, JobStore, StoreSnapshot};

/// Lifecycle and capacity controller for the print queue.
///
/// Every mutation runs under the store's write lock, so admission checks and
/// inserts see the same state and readers never observe a half-applied change.
/// Cloning is cheap and every clone drives the same store.
#[derive(Clone)]
pub struct PrintJobManager {
    store: Arc<RwLock<JobStore>>,
    catalog: Arc<dyn PartCatalog>,
    clock: Arc<dyn Clock>,
    events: broadcast::Sender<JobEvent>,
    settings: QueueConfig,
}

impl PrintJobManager {
    pub fn new(catalog: Arc<dyn PartCatalog>, settings: QueueConfig) -> Self {
        let (events, _) = broadcast::channel(settings.event_buffer.max(1));
        Self {
            store: Arc::new(RwLock::new(JobStore::new())),
            catalog,
            clock: Arc::new(SystemClock),
            events,
            settings,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn settings(&self) -> &QueueConfig {
        &self.settings
    }

    pub fn capacity(&self) -> usize {
        self.settings.capacity
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Admit a new job in `Pending`.
    pub async fn create_job(&self, input: NewJob) -> Result<Job, PrintJobError> {
        let mut errors = ValidationErrors::new();
        self.check_part(&input.part_id, &mut errors);
        check_operator(&input.operator_id, &mut errors);
        check_window(input.start_time, input.estimated_completion, &mut errors);
        if let Err(err) = errors.into_result() {
            tracing::warn!("Rejected new job: {}", err);
            return Err(err);
        }

        let mut store = self.store.write().await;
        let active = store.active_count();
        if active >= self.settings.capacity {
            tracing::warn!(
                "Rejected new job for part {}: {}/{} active jobs",
                input.part_id,
                active,
                self.settings.capacity
            );
            return Err(PrintJobError::CapacityExceeded {
                limit: self.settings.capacity,
            });
        }

        let now = self.clock.now();
        let job = Job {
            id: store.allocate_id(),
            part_id: input.part_id,
            operator_id: input.operator_id,
            status: JobStatus::Pending,
            start_time: input.start_time,
            estimated_completion: input.estimated_completion,
            created_at: now,
            updated_at: now,
        };
        store.insert(job.clone());
        self.publish(&mut store, JobChange::Created(job.clone()));
        tracing::info!(
            "Job {} queued for part {} by {} ({}/{} active)",
            job.id,
            job.part_id,
            job.operator_id,
            active + 1,
            self.settings.capacity
        );
        Ok(job)
    }

    /// Apply a field-level edit.
    ///
    /// Status edits bypass the state machine and capacity is not re-checked
    /// here, so an edit can bring the active count above the limit.
    pub async fn edit_job(&self, id: JobId, patch: JobPatch) -> Result<Job, PrintJobError> {
        let mut store = self.store.write().await;
        let current = store.get(id).ok_or(PrintJobError::NotFound(id))?;
        let mut updated = current.clone();
        let mut errors = ValidationErrors::new();

        if let Some(part_id) = patch.part_id {
            if part_id != current.part_id {
                self.check_part(&part_id, &mut errors);
            }
            updated.part_id = part_id;
        }
        if let Some(operator_id) = patch.operator_id {
            check_operator(&operator_id, &mut errors);
            updated.operator_id = operator_id;
        }
        if let Some(status) = patch.status {
            updated.status = status;
        }
        if let Some(start_time) = patch.start_time {
            updated.start_time = start_time;
        }
        if let Some(estimated_completion) = patch.estimated_completion {
            updated.estimated_completion = estimated_completion;
        }
        check_window(updated.start_time, updated.estimated_completion, &mut errors);
        if let Err(err) = errors.into_result() {
            tracing::warn!("Rejected edit of job {}: {}", id, err);
            return Err(err);
        }

        let reactivated = !current.is_active() && updated.is_active();
        updated.updated_at = self.clock.now();
        store.replace(updated.clone());
        if reactivated {
            let active = store.active_count();
            if active > self.settings.capacity {
                tracing::warn!(
                    "Job {} edited back to {}: {}/{} active jobs exceeds capacity",
                    id,
                    updated.status,
                    active,
                    self.settings.capacity
                );
            }
        }
        self.publish(&mut store, JobChange::Updated(updated.clone()));
        tracing::info!("Job {} edited ({})", id, updated.status);
        Ok(updated)
    }

    /// Run an operator action through the state machine.
    pub async fn apply_action(&self, id: JobId, action: JobAction) -> Result<Job, PrintJobError> {
        let mut store = self.store.write().await;
        let job = store.get_mut(id).ok_or(PrintJobError::NotFound(id))?;
        let from = job.status;
        let Some(to) = action.apply(from) else {
            tracing::warn!("Cannot {} job {} in state {}", action, id, from);
            return Err(PrintJobError::InvalidTransition { action, state: from });
        };
        job.status = to;
        job.updated_at = self.clock.now();
        let job = job.clone();
        self.publish(&mut store, JobChange::Updated(job.clone()));
        tracing::info!("Job {} {}: {} -> {}", id, action, from, to);
        Ok(job)
    }

    /// Remove a job in any state.
    pub async fn delete_job(&self, id: JobId) -> Result<(), PrintJobError> {
        let mut store = self.store.write().await;
        let removed = store.remove(id).ok_or(PrintJobError::NotFound(id))?;
        self.publish(&mut store, JobChange::Deleted(id));
        tracing::info!("Job {} deleted (was {})", id, removed.status);
        Ok(())
    }

    pub async fn get_job(&self, id: JobId) -> Option<Job> {
        self.store.read().await.get(id).cloned()
    }

    /// Jobs matching `filter`, in id order.
    pub async fn list_jobs(&self, filter: &JobFilter) -> Vec<Job> {
        let store = self.store.read().await;
        query::list_jobs(store.iter(), filter)
    }

    pub async fn active_count(&self) -> usize {
        self.store.read().await.active_count()
    }

    pub fn progress(&self, job: &Job, now: DateTime<Utc>) -> u8 {
        queue_shared::progress(job, now)
    }

    pub async fn snapshot(&self) -> StoreSnapshot {
        self.store.read().await.snapshot()
    }

    /// Filtered projection plus the derived queue figures, from one snapshot.
    pub async fn view(&self, filter: &JobFilter) -> QueueView {
        let snapshot = self.snapshot().await;
        let view = QueueView::compute(&snapshot, filter, &self.settings, self.clock.now());
        tracing::debug!(
            "Queue view at revision {}: {} of {} jobs",
            view.revision,
            view.jobs.len(),
            snapshot.jobs.len()
        );
        view
    }

    /// Change events for every committed mutation from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.events.subscribe()
    }

    /// A view that recomputes itself after every committed change.
    pub fn live_view(&self, filter: JobFilter) -> LiveQueueView {
        LiveQueueView::new(self.clone(), filter)
    }

    fn publish(&self, store: &mut JobStore, change: JobChange) {
        let event = store.commit(change);
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn check_part(&self, part_id: &str, errors: &mut ValidationErrors) {
        if part_id.trim().is_empty() {
            errors.push(JobField::PartId, "Part selection is required");
        } else if !self.catalog.part_exists(part_id) {
            errors.push(JobField::PartId, format!("Part '{}' does not exist in the catalog", part_id));
        }
    }
}

fn check_operator(operator_id: &str, errors: &mut ValidationErrors) {
    if operator_id.trim().is_empty() {
        errors.push(JobField::OperatorId, "Operator ID is required");
    }
}

fn check_window(
    start_time: Option<DateTime<Utc>>,
    estimated_completion: Option<DateTime<Utc>>,
    errors: &mut ValidationErrors,
) {
    if let (Some(start), Some(end)) = (start_time, estimated_completion) {
        if end <= start {
            errors.push(
                JobField::EstimatedCompletion,
                "Estimated completion must be after start time",
            );
        }
    }
}
