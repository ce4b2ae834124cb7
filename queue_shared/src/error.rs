use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::print_job::{JobAction, JobId, JobStatus};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PrintJobError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("maximum job limit reached ({limit}); complete or cancel existing jobs before adding new ones")]
    CapacityExceeded { limit: usize },
    #[error("cannot {action} a job that is {state}")]
    InvalidTransition { action: JobAction, state: JobStatus },
    #[error("job {0} not found")]
    NotFound(JobId),
}

/// Job fields that can fail validation, named as they appear on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum JobField {
    PartId,
    OperatorId,
    Status,
    StartTime,
    EstimatedCompletion,
}

impl JobField {
    pub fn as_str(self) -> &'static str {
        match self {
            JobField::PartId => "partId",
            JobField::OperatorId => "operatorId",
            JobField::Status => "status",
            JobField::StartTime => "startTime",
            JobField::EstimatedCompletion => "estimatedCompletion",
        }
    }
}

impl fmt::Display for JobField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: JobField,
    pub message: String,
}

/// Every offending field of one request, in the order they were checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: JobField, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: JobField, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, field: JobField) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// `Ok(())` when nothing was recorded, otherwise a `Validation` error.
    pub fn into_result(self) -> Result<(), PrintJobError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(PrintJobError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", error.field, error.message)?;
        }
        Ok(())
    }
}
