//! Bounded print job queue with lifecycle and capacity control.

pub mod catalog;
pub mod config;
pub mod print_job;
pub mod query;
pub mod store;
pub mod web;

pub use catalog::{InMemoryPartCatalog, Part, PartCatalog};
pub use print_job::PrintJobManager;
pub use query::{JobFilter, LiveQueueView, QueueView};
pub use queue_shared::{
    progress, Clock, Job, JobAction, JobId, JobPatch, JobStatus, ManualClock, NewJob, PrintJobError,
    SystemClock,
};
pub use store::{JobChange, JobEvent};
