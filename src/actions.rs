//! Operator-invoked action surface
//!
//! Actions (`restart`, `backup`, `list-backups`, `restore`) run on demand
//! and report a structured outcome back to the invoker: result fields on
//! success, a fail reason plus any partial results on failure. Apart from
//! the documented maintenance window during `restart`, action failures do
//! not alter the unit status, and nothing beyond the tool's own diagnostic
//! text is ever surfaced.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::warn;

use crate::backup::BackupOrchestrator;
use crate::controller::status::UnitStatus;
use crate::resources::plan::SERVICE_NAME;
use crate::workload::{ServiceState, StatusSink, Workload, WorkloadError};

/// Structured result of an action invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionOutcome {
    pub results: BTreeMap<String, String>,
    pub fail: Option<String>,
}

impl ActionOutcome {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.results.insert(key.into(), value.into());
        self
    }

    /// Mark the outcome failed, keeping any partial results already set.
    pub fn failed(mut self, reason: impl Into<String>) -> Self {
        self.fail = Some(reason.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.fail.is_none()
    }
}

/// Handlers for the operator action surface
pub struct Actions {
    workload: Arc<dyn Workload>,
    status: Arc<dyn StatusSink>,
    backups: BackupOrchestrator,
}

impl Actions {
    pub fn new(
        workload: Arc<dyn Workload>,
        status: Arc<dyn StatusSink>,
        backups: BackupOrchestrator,
    ) -> Self {
        Self {
            workload,
            status,
            backups,
        }
    }

    /// Stop the service if running, then start it again under a
    /// maintenance status window.
    pub async fn restart(&self) -> ActionOutcome {
        let outcome = ActionOutcome::ok().with("service", SERVICE_NAME);

        match self.workload.service_status(SERVICE_NAME).await {
            Ok(ServiceState::Running) => {
                if let Err(e) = self.workload.stop_service(SERVICE_NAME).await {
                    return outcome.failed(format!("failed to stop {SERVICE_NAME}: {e}"));
                }
            }
            Ok(ServiceState::Stopped) => {}
            Err(WorkloadError::NotFound(_)) => {
                return outcome.failed(format!("service {SERVICE_NAME} has not been set up yet"));
            }
            Err(e) => return outcome.failed(e.to_string()),
        }

        self.push_status(&UnitStatus::maintenance("restarting mariadb"))
            .await;

        if let Err(e) = self.workload.start_service(SERVICE_NAME).await {
            return outcome.failed(format!("failed to start {SERVICE_NAME}: {e}"));
        }

        self.push_status(&UnitStatus::Active).await;
        outcome.with("restarted", "true")
    }

    /// Dump all databases into a new backup record.
    pub async fn backup(&self, root_password: Option<&str>) -> ActionOutcome {
        let Some(password) = root_password else {
            return ActionOutcome::ok().failed("root credential has not been generated yet");
        };

        match self.backups.backup(password).await {
            Ok(record) => ActionOutcome::ok()
                .with("backup-id", record.identifier)
                .with("path", record.location.display().to_string()),
            Err(e) => ActionOutcome::ok().failed(e.to_string()),
        }
    }

    /// Enumerate the backup store.
    pub async fn list_backups(&self) -> ActionOutcome {
        match self.backups.list().await {
            Ok(records) => {
                let ids: Vec<&str> = records.iter().map(|r| r.identifier.as_str()).collect();
                ActionOutcome::ok()
                    .with("count", records.len().to_string())
                    .with("backups", ids.join(","))
            }
            Err(e) => ActionOutcome::ok().failed(e.to_string()),
        }
    }

    /// Import a backup; without an identifier the newest record is used.
    pub async fn restore(
        &self,
        identifier: Option<&str>,
        root_password: Option<&str>,
    ) -> ActionOutcome {
        let mut outcome = ActionOutcome::ok();
        if let Some(id) = identifier {
            outcome = outcome.with("requested-id", id);
        }

        let Some(password) = root_password else {
            return outcome.failed("root credential has not been generated yet");
        };

        match self.backups.restore(identifier, password).await {
            Ok(record) => outcome
                .with("backup-id", record.identifier)
                .with("path", record.location.display().to_string()),
            Err(e) => outcome.failed(e.to_string()),
        }
    }

    async fn push_status(&self, status: &UnitStatus) {
        if let Err(e) = self.status.set_status(status).await {
            warn!("failed to push unit status: {e}");
        }
    }
}
