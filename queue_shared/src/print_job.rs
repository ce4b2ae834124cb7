use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Identifier assigned by the job store. Rendered as `JOB-0001`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JOB-{:04}", self.0)
    }
}

impl FromStr for JobId {
    type Err = std::num::ParseIntError;

    /// Accepts both the display form (`JOB-0042`) and the bare number (`42`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("JOB-").unwrap_or(s);
        digits.parse().map(JobId)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    Printing,
    Paused,
    Completed,
    Failed,
}

impl JobStatus {
    pub const ALL: [JobStatus; 5] = [
        JobStatus::Pending,
        JobStatus::Printing,
        JobStatus::Paused,
        JobStatus::Completed,
        JobStatus::Failed,
    ];

    /// Active jobs count against the queue capacity.
    pub fn is_active(self) -> bool {
        matches!(self, JobStatus::Pending | JobStatus::Printing | JobStatus::Paused)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "Pending",
            JobStatus::Printing => "Printing",
            JobStatus::Paused => "Paused",
            JobStatus::Completed => "Completed",
            JobStatus::Failed => "Failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown job status '{}'", s))
    }
}

/// Operator actions driving the job state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobAction {
    Pause,
    Resume,
    Cancel,
    Complete,
}

impl JobAction {
    pub const ALL: [JobAction; 4] = [
        JobAction::Pause,
        JobAction::Resume,
        JobAction::Cancel,
        JobAction::Complete,
    ];

    /// Resulting status when this action is taken from `from`, or `None` if the
    /// transition is not allowed.
    pub fn apply(self, from: JobStatus) -> Option<JobStatus> {
        match (self, from) {
            (JobAction::Pause, JobStatus::Printing) => Some(JobStatus::Paused),
            (JobAction::Resume, JobStatus::Paused) => Some(JobStatus::Printing),
            (JobAction::Cancel, JobStatus::Pending | JobStatus::Printing | JobStatus::Paused) => {
                Some(JobStatus::Failed)
            }
            (JobAction::Complete, JobStatus::Printing) => Some(JobStatus::Completed),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobAction::Pause => "pause",
            JobAction::Resume => "resume",
            JobAction::Cancel => "cancel",
            JobAction::Complete => "complete",
        }
    }
}

impl fmt::Display for JobAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobAction::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| format!("unknown job action '{}'", s))
    }
}

/// A print job as held by the job store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub part_id: String,
    pub operator_id: String,
    pub status: JobStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub estimated_completion: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// Operator submission for a new job. Status is always `Pending` on admission.
///
/// Missing keys deserialize as empty so that validation can report them per field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewJob {
    pub part_id: String,
    pub operator_id: String,
    pub start_time: Option<DateTime<Utc>>,
    pub estimated_completion: Option<DateTime<Utc>>,
}

impl NewJob {
    pub fn new(part_id: impl Into<String>, operator_id: impl Into<String>) -> Self {
        Self {
            part_id: part_id.into(),
            operator_id: operator_id.into(),
            ..Self::default()
        }
    }
}

/// Field-level edit of an existing job.
///
/// The time fields are tri-state: `None` keeps the stored value, `Some(None)`
/// clears it and `Some(Some(t))` replaces it. In JSON an absent key keeps and
/// an explicit `null` clears.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobPatch {
    #[serde(default)]
    pub part_id: Option<String>,
    #[serde(default)]
    pub operator_id: Option<String>,
    #[serde(default)]
    pub status: Option<JobStatus>,
    #[serde(default, deserialize_with = "present")]
    pub start_time: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "present")]
    pub estimated_completion: Option<Option<DateTime<Utc>>>,
}

impl JobPatch {
    pub fn is_empty(&self) -> bool {
        self == &JobPatch::default()
    }

    pub fn status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn operator_id(mut self, operator_id: impl Into<String>) -> Self {
        self.operator_id = Some(operator_id.into());
        self
    }

    pub fn part_id(mut self, part_id: impl Into<String>) -> Self {
        self.part_id = Some(part_id.into());
        self
    }

    pub fn start_time(mut self, start_time: Option<DateTime<Utc>>) -> Self {
        self.start_time = Some(start_time);
        self
    }

    pub fn estimated_completion(mut self, estimated_completion: Option<DateTime<Utc>>) -> Self {
        self.estimated_completion = Some(estimated_completion);
        self
    }
}

// A key that is present (even as null) becomes `Some(_)`; absent keys fall back to `Default`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_table() {
        use JobAction::*;
        use JobStatus::*;
        let allowed = [
            (Pause, Printing, Paused),
            (Resume, Paused, Printing),
            (Cancel, Pending, Failed),
            (Cancel, Printing, Failed),
            (Cancel, Paused, Failed),
            (Complete, Printing, Completed),
        ];
        for action in JobAction::ALL {
            for from in JobStatus::ALL {
                let expected = allowed
                    .iter()
                    .find(|(a, f, _)| *a == action && *f == from)
                    .map(|(_, _, to)| *to);
                assert_eq!(action.apply(from), expected, "{} from {}", action, from);
            }
        }
    }

    #[test]
    fn test_terminal_states_accept_no_action() {
        for action in JobAction::ALL {
            assert_eq!(action.apply(JobStatus::Completed), None);
            assert_eq!(action.apply(JobStatus::Failed), None);
        }
    }

    #[test]
    fn test_job_id_display_and_parse() {
        assert_eq!(JobId(7).to_string(), "JOB-0007");
        assert_eq!("JOB-0042".parse::<JobId>().unwrap(), JobId(42));
        assert_eq!("42".parse::<JobId>().unwrap(), JobId(42));
        assert!("JOB-x".parse::<JobId>().is_err());
    }

    #[test]
    fn test_status_parse_is_exact() {
        assert_eq!("Paused".parse::<JobStatus>().unwrap(), JobStatus::Paused);
        assert!("paused".parse::<JobStatus>().is_err());
        assert!("Cancelled".parse::<JobStatus>().is_err());
    }

    #[test]
    fn test_unknown_status_rejected_by_serde() {
        let result = serde_json::from_str::<JobStatus>("\"Queued\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_patch_distinguishes_absent_and_null() {
        let patch: JobPatch = serde_json::from_str(r#"{"startTime": null}"#).unwrap();
        assert_eq!(patch.start_time, Some(None));
        assert_eq!(patch.estimated_completion, None);

        let patch: JobPatch = serde_json::from_str("{}").unwrap();
        assert!(patch.is_empty());

        let patch: JobPatch =
            serde_json::from_str(r#"{"estimatedCompletion": "2026-01-01T10:00:00Z", "status": "Printing"}"#).unwrap();
        assert!(matches!(patch.estimated_completion, Some(Some(_))));
        assert_eq!(patch.status, Some(JobStatus::Printing));
    }

    #[test]
    fn test_patch_rejects_unknown_keys() {
        let result = serde_json::from_str::<JobPatch>(r#"{"operatorID": "OP-009"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_job_serializes_camel_case() {
        let now = Utc::now();
        let job = Job {
            id: JobId(1),
            part_id: "PART-001".to_string(),
            operator_id: "OP-001".to_string(),
            status: JobStatus::Pending,
            start_time: None,
            estimated_completion: None,
            created_at: now,
            updated_at: now,
        };
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["id"], 1);
        assert_eq!(value["partId"], "PART-001");
        assert_eq!(value["status"], "Pending");
        assert!(value["estimatedCompletion"].is_null());
    }
}
