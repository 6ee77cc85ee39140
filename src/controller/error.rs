//! Error types for lifecycle-event handling
//!
//! Lifecycle errors never crash the process: each variant maps to exactly
//! one externally visible status, and retry is always driven by the
//! platform re-delivering an event, never by a loop in this agent.

use thiserror::Error;

use crate::config::ConfigError;
use crate::controller::status::UnitStatus;
use crate::workload::WorkloadError;

#[derive(Error, Debug)]
pub enum Error {
    /// Bad user input; waits for corrected configuration
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// A collaborator (supervisor, image store, relation bus) failed
    #[error("{0}")]
    Collaborator(String),

    /// Transient condition expected to resolve on its own
    #[error("{0}")]
    NotReady(String),
}

impl Error {
    /// The status this error surfaces as
    pub fn to_status(&self) -> UnitStatus {
        match self {
            Error::Config(e) => UnitStatus::blocked(e.to_string()),
            Error::Collaborator(reason) => UnitStatus::blocked(reason.clone()),
            Error::NotReady(reason) => UnitStatus::waiting(reason.clone()),
        }
    }
}

impl From<WorkloadError> for Error {
    fn from(e: WorkloadError) -> Self {
        match e {
            WorkloadError::NotFound(name) => Error::NotReady(format!("service {name} not found")),
            WorkloadError::Unavailable(reason) => Error::Collaborator(reason),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
