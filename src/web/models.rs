//! Contains the data models for API requests and responses.

use queue_shared::{FieldError, JobAction, JobStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Query string for `GET /api/v1/jobs`. Missing values mean "all".
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListParams {
    pub status: Option<String>,
    pub operator_id: Option<String>,
}

/// Response for `GET /api/v1/jobs/active-count`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveCountResponse {
    pub active_count: usize,
    pub limit: usize,
}

/// Error body shared by every endpoint.
#[derive(Debug, Default, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Offending fields and their messages, for validation failures.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<&'static str, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<JobAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<JobStatus>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            ..Self::default()
        }
    }

    pub fn with_fields<'a>(mut self, errors: impl IntoIterator<Item = &'a FieldError>) -> Self {
        for error in errors {
            self.fields
                .entry(error.field.as_str())
                .or_insert_with(|| error.message.clone());
        }
        self
    }
}
