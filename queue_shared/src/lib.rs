//! Job types, errors and pure helpers shared by the queue host and its clients.

pub mod error;
pub mod print_job;
pub mod progress;
pub mod time;

pub use error::{FieldError, JobField, PrintJobError, ValidationErrors};
pub use print_job::{Job, JobAction, JobId, JobPatch, JobStatus, NewJob};
pub use progress::progress;
pub use time::{Clock, ManualClock, SystemClock};
