//! Time-based progress estimate for printing jobs.

use chrono::{DateTime, Duration, Utc};

use crate::print_job::{Job, JobStatus};

/// Estimated completion percentage (0..=100) of a printing job at `now`.
///
/// Only `Printing` jobs with both time bounds have progress; everything else
/// reports 0. An empty or inverted window also reports 0.
pub fn progress(job: &Job, now: DateTime<Utc>) -> u8 {
    if job.status != JobStatus::Printing {
        return 0;
    }
    let (Some(start), Some(end)) = (job.start_time, job.estimated_completion) else {
        return 0;
    };
    if end <= start {
        return 0;
    }
    if now > end {
        return 100;
    }
    let percent = (nanos(now - start) * 100.0 / nanos(end - start)).round();
    percent.clamp(0.0, 100.0) as u8
}

// Spans past the nanosecond range (about 292 years) fall back to milliseconds.
fn nanos(span: Duration) -> f64 {
    span.num_nanoseconds()
        .map(|n| n as f64)
        .unwrap_or_else(|| span.num_milliseconds() as f64 * 1_000_000.0)
}
