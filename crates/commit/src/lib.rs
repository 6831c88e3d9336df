pub mod error;
pub mod job;
pub mod registry;
pub mod service;
pub mod store;

pub use error::CommitError;
pub use job::{ImportJob, JobStatus, NewImportJob};
pub use registry::{ImportRegistration, ImportRegistry};
pub use service::{CommitOutcome, CommitService};
pub use store::{CommitStore, JobStore, PgJobStore};
