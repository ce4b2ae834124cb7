//! Read-side projections of the job store: filtered job lists, the derived
//! queue figures, and a live view that recomputes on every committed change.

use std::collections::HashSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use futures::Stream;
use queue_shared::{Job, JobField, JobStatus, PrintJobError, ValidationErrors};
use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::config::QueueConfig;
use crate::print_job::PrintJobManager;
use crate::store::{JobEvent, StoreSnapshot};

const ALL: &str = "all";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(JobStatus),
}

impl FromStr for StatusFilter {
    type Err = PrintJobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == ALL {
            return Ok(StatusFilter::All);
        }
        s.parse::<JobStatus>().map(StatusFilter::Only).map_err(|msg| {
            PrintJobError::Validation(ValidationErrors::single(JobField::Status, msg))
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OperatorFilter {
    #[default]
    All,
    Only(String),
}

impl From<&str> for OperatorFilter {
    fn from(s: &str) -> Self {
        if s == ALL {
            OperatorFilter::All
        } else {
            OperatorFilter::Only(s.to_string())
        }
    }
}

/// Conjunctive equality filter over status and operator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobFilter {
    pub status: StatusFilter,
    pub operator: OperatorFilter,
}

impl JobFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: JobStatus) -> Self {
        self.status = StatusFilter::Only(status);
        self
    }

    pub fn with_operator(mut self, operator_id: impl Into<String>) -> Self {
        self.operator = OperatorFilter::Only(operator_id.into());
        self
    }

    /// Build a filter from raw query values, where a missing value or `"all"`
    /// matches everything.
    pub fn parse(status: Option<&str>, operator_id: Option<&str>) -> Result<Self, PrintJobError> {
        Ok(Self {
            status: status.map(str::parse::<StatusFilter>).transpose()?.unwrap_or_default(),
            operator: operator_id.map(OperatorFilter::from).unwrap_or_default(),
        })
    }

    pub fn matches(&self, job: &Job) -> bool {
        let status_ok = match self.status {
            StatusFilter::All => true,
            StatusFilter::Only(status) => job.status == status,
        };
        let operator_ok = match &self.operator {
            OperatorFilter::All => true,
            OperatorFilter::Only(operator_id) => &job.operator_id == operator_id,
        };
        status_ok && operator_ok
    }
}

/// Jobs matching `filter`, sorted by id.
pub fn list_jobs<'a>(jobs: impl IntoIterator<Item = &'a Job>, filter: &JobFilter) -> Vec<Job> {
    let mut matched: Vec<Job> = jobs.into_iter().filter(|job| filter.matches(job)).cloned().collect();
    matched.sort_by_key(|job| job.id);
    matched
}

pub fn active_count<'a>(jobs: impl IntoIterator<Item = &'a Job>) -> usize {
    jobs.into_iter().filter(|job| job.is_active()).count()
}

/// Unique operator ids in first-seen order.
pub fn distinct_operators<'a>(jobs: impl IntoIterator<Item = &'a Job>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut operators = Vec::new();
    for job in jobs {
        if seen.insert(job.operator_id.as_str()) {
            operators.push(job.operator_id.clone());
        }
    }
    operators
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CapacityLevel {
    Ok,
    Approaching,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CapacitySummary {
    pub active: usize,
    pub limit: usize,
    pub level: CapacityLevel,
}

impl CapacitySummary {
    pub fn new(active: usize, settings: &QueueConfig) -> Self {
        let limit = settings.capacity;
        let level = if active >= limit {
            CapacityLevel::Full
        } else if active as f64 >= limit as f64 * settings.warn_ratio {
            CapacityLevel::Approaching
        } else {
            CapacityLevel::Ok
        };
        Self { active, limit, level }
    }
}

/// A job plus its progress at the time the view was computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobRow {
    #[serde(flatten)]
    pub job: Job,
    pub progress: u8,
}

impl JobRow {
    pub fn new(job: Job, now: DateTime<Utc>) -> Self {
        let progress = queue_shared::progress(&job, now);
        Self { job, progress }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueView {
    pub revision: u64,
    pub jobs: Vec<JobRow>,
    pub active_count: usize,
    pub distinct_operators: Vec<String>,
    pub capacity: CapacitySummary,
}

impl QueueView {
    /// Filtered rows come from `filter`; the counts and operator list cover the whole store.
    pub fn compute(
        snapshot: &StoreSnapshot,
        filter: &JobFilter,
        settings: &QueueConfig,
        now: DateTime<Utc>,
    ) -> Self {
        let active = active_count(&snapshot.jobs);
        Self {
            revision: snapshot.revision,
            jobs: list_jobs(&snapshot.jobs, filter)
                .into_iter()
                .map(|job| JobRow::new(job, now))
                .collect(),
            active_count: active,
            distinct_operators: distinct_operators(&snapshot.jobs),
            capacity: CapacitySummary::new(active, settings),
        }
    }
}

/// Subscriber that recomputes a `QueueView` each time the store commits.
pub struct LiveQueueView {
    manager: PrintJobManager,
    filter: JobFilter,
    events: broadcast::Receiver<JobEvent>,
}

impl LiveQueueView {
    pub(crate) fn new(manager: PrintJobManager, filter: JobFilter) -> Self {
        let events = manager.subscribe();
        Self {
            manager,
            filter,
            events,
        }
    }

    pub fn filter(&self) -> &JobFilter {
        &self.filter
    }

    pub async fn current(&self) -> QueueView {
        self.manager.view(&self.filter).await
    }

    /// Wait for the next committed change and return the recomputed view.
    /// A lagging subscriber skips the missed events and recomputes from the
    /// latest state.
    pub async fn changed(&mut self) -> Option<QueueView> {
        match self.events.recv().await {
            Ok(_) => {}
            Err(RecvError::Lagged(missed)) => {
                tracing::debug!("Live queue view skipped {} events", missed);
            }
            Err(RecvError::Closed) => return None,
        }
        Some(self.current().await)
    }

    pub fn into_stream(self) -> impl Stream<Item = QueueView> {
        let mut live = self;
        async_stream::stream! {
            while let Some(view) = live.changed().await {
                yield view;
            }
        }
    }
}
