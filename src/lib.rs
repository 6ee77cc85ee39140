pub mod actions;
pub mod backup;
pub mod config;
pub mod controller;
pub mod exec;
pub mod platform;
pub mod relation;
pub mod resources;
pub mod state;
pub mod workload;

pub use actions::{ActionOutcome, Actions};
pub use backup::{BackupConfig, BackupError, BackupOrchestrator, BackupRecord};
pub use config::{ConfigError, MariadbConfig};
pub use controller::{Context, Error, Event, Reconciler, Result, Role, UnitPhase, UnitStatus};
pub use exec::{CommandRunner, Exec, ExecError, ExecOutput, TokioRunner};
pub use relation::RelationPublisher;
pub use resources::{ServicePlan, Startup, build_service_plan};
pub use state::{StateStore, StoredState};
pub use workload::{ImageDescriptor, ImageSource, RelationStore, ServiceState, StatusSink, Workload};
