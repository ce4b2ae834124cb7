use std::collections::BTreeMap;

use queue_shared::{Job, JobId};
use serde::Serialize;

/// A committed change to the job store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "job", rename_all = "lowercase")]
pub enum JobChange {
    Created(Job),
    Updated(Job),
    Deleted(JobId),
}

impl JobChange {
    pub fn job_id(&self) -> JobId {
        match self {
            JobChange::Created(job) | JobChange::Updated(job) => job.id,
            JobChange::Deleted(id) => *id,
        }
    }
}

/// Published once per committed mutation. `revision` matches the store
/// revision right after the change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobEvent {
    pub revision: u64,
    pub change: JobChange,
}

/// Point-in-time copy of every job, ordered by id.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub revision: u64,
    pub jobs: Vec<Job>,
}

/// Jobs keyed by id. Only the lifecycle controller mutates it.
#[derive(Debug, Default)]
pub struct JobStore {
    jobs: BTreeMap<JobId, Job>,
    next_id: u64,
    revision: u64,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the next job id. Ids are never reused, even after deletes.
    pub fn allocate_id(&mut self) -> JobId {
        self.next_id += 1;
        JobId(self.next_id)
    }

    /// Insert a job. Returns false if the id is already taken.
    pub fn insert(&mut self, job: Job) -> bool {
        if self.jobs.contains_key(&job.id) {
            return false;
        }
        self.jobs.insert(job.id, job);
        true
    }

    /// Replace an existing job. Returns false if the id is unknown.
    pub fn replace(&mut self, job: Job) -> bool {
        match self.jobs.get_mut(&job.id) {
            Some(slot) => {
                *slot = job;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: JobId) -> Option<&Job> {
        self.jobs.get(&id)
    }

    pub fn get_mut(&mut self, id: JobId) -> Option<&mut Job> {
        self.jobs.get_mut(&id)
    }

    pub fn remove(&mut self, id: JobId) -> Option<Job> {
        self.jobs.remove(&id)
    }

    /// Jobs in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.values()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.jobs.values().filter(|job| job.is_active()).count()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Record a committed change and return the event describing it.
    pub fn commit(&mut self, change: JobChange) -> JobEvent {
        self.revision += 1;
        JobEvent {
            revision: self.revision,
            change,
        }
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            revision: self.revision,
            jobs: self.jobs.values().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use queue_shared::JobStatus;

    fn job(id: JobId, status: JobStatus) -> Job {
        let now = Utc::now();
        Job {
            id,
            part_id: "PART-001".to_string(),
            operator_id: "OP-001".to_string(),
            status,
            start_time: None,
            estimated_completion: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_ids_are_not_reused() {
        let mut store = JobStore::new();
        let first = store.allocate_id();
        assert!(store.insert(job(first, JobStatus::Pending)));
        store.remove(first);
        let second = store.allocate_id();
        assert_ne!(first, second);
        assert_eq!(second, JobId(2));
    }

    #[test]
    fn test_insert_rejects_duplicate_id() {
        let mut store = JobStore::new();
        let id = store.allocate_id();
        assert!(store.insert(job(id, JobStatus::Pending)));
        assert!(!store.insert(job(id, JobStatus::Printing)));
        assert_eq!(store.get(id).unwrap().status, JobStatus::Pending);
    }

    #[test]
    fn test_active_count() {
        let mut store = JobStore::new();
        for status in JobStatus::ALL {
            let id = store.allocate_id();
            store.insert(job(id, status));
        }
        assert_eq!(store.len(), 5);
        assert_eq!(store.active_count(), 3);
    }

    #[test]
    fn test_commit_bumps_revision() {
        let mut store = JobStore::new();
        assert_eq!(store.revision(), 0);
        let event = store.commit(JobChange::Deleted(JobId(9)));
        assert_eq!(event.revision, 1);
        assert_eq!(event.change.job_id(), JobId(9));
        assert_eq!(store.snapshot().revision, 1);
    }

    #[test]
    fn test_replace_unknown_id() {
        let mut store = JobStore::new();
        assert!(!store.replace(job(JobId(1), JobStatus::Pending)));
        assert!(store.is_empty());
    }
}
