//! Collaborator contracts consumed by the controller
//!
//! The orchestration platform itself (container supervisor, relation data
//! bus, image resource store, status reporting) is out of scope; the
//! controller reaches it only through these narrow async traits. Production
//! implementations live in the `platform` module; tests use in-memory fakes.

use async_trait::async_trait;
use thiserror::Error;

use crate::controller::status::UnitStatus;
use crate::resources::plan::ServicePlan;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkloadError {
    /// The named service is not known to the supervisor
    #[error("service {0} not found")]
    NotFound(String),

    /// The collaborator could not be reached or refused the request
    #[error("{0}")]
    Unavailable(String),
}

/// Observed state of a supervised service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Running,
    Stopped,
}

/// Reference to the workload container image, as resolved by the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDescriptor {
    pub image_path: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Process-supervision collaborator inside the workload container
#[async_trait]
pub trait Workload: Send + Sync {
    /// Idempotent upsert of the service plan, merged with any existing
    /// descriptor (combine semantics). Applying an unchanged plan is a no-op.
    async fn apply_plan(&self, plan: &ServicePlan) -> Result<(), WorkloadError>;

    /// Start any services whose startup policy is enabled
    async fn autostart(&self) -> Result<(), WorkloadError>;

    async fn service_status(&self, name: &str) -> Result<ServiceState, WorkloadError>;

    async fn start_service(&self, name: &str) -> Result<(), WorkloadError>;

    async fn stop_service(&self, name: &str) -> Result<(), WorkloadError>;
}

/// Image-resource collaborator
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch(&self) -> Result<ImageDescriptor, WorkloadError>;
}

/// Peer-visible key-value store attached to a relation
#[async_trait]
pub trait RelationStore: Send + Sync {
    async fn set(&self, relation_id: u32, key: &str, value: &str) -> Result<(), WorkloadError>;
}

/// Sink for the externally visible unit status
#[async_trait]
pub trait StatusSink: Send + Sync {
    async fn set_status(&self, status: &UnitStatus) -> Result<(), WorkloadError>;
}
