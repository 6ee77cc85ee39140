//! Platform hook-tool collaborators
//!
//! Leadership, configuration, status reporting, relation data and the image
//! resource all reach the platform through its hook-tool CLIs. Arguments
//! are argv vectors through the command-runner boundary, so relation values
//! and status messages are never shell-interpolated.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::config::MariadbConfig;
use crate::controller::status::UnitStatus;
use crate::exec::{CommandRunner, Exec, ExecOutput};
use crate::workload::{ImageDescriptor, ImageSource, RelationStore, StatusSink, WorkloadError};

/// Name of the workload image resource attached to this unit
const IMAGE_RESOURCE: &str = "mariadb-image";

/// Image resource file contents as written by the platform
#[derive(Debug, Deserialize)]
struct ImageResourceInfo {
    registrypath: String,
    username: Option<String>,
    password: Option<String>,
}

pub struct HookTools {
    runner: Arc<dyn CommandRunner>,
    timeout: Duration,
}

impl HookTools {
    pub fn new(runner: Arc<dyn CommandRunner>, timeout: Duration) -> Self {
        Self { runner, timeout }
    }

    async fn run_tool(&self, exec: Exec) -> Result<ExecOutput, WorkloadError> {
        let program = exec.program.clone();
        let out = self
            .runner
            .run(&exec)
            .await
            .map_err(|e| WorkloadError::Unavailable(e.to_string()))?;
        if !out.success() {
            return Err(WorkloadError::Unavailable(format!(
                "{program} failed: {}",
                out.diagnostic()
            )));
        }
        Ok(out)
    }

    /// Am-I-leader check
    pub async fn is_leader(&self) -> Result<bool, WorkloadError> {
        let out = self
            .run_tool(Exec::new("is-leader", self.timeout).arg("--format=json"))
            .await?;
        serde_json::from_str(out.stdout.trim())
            .map_err(|e| WorkloadError::Unavailable(format!("cannot parse is-leader output: {e}")))
    }

    /// Read the unit configuration from the platform's config store
    pub async fn config(&self) -> Result<MariadbConfig, WorkloadError> {
        let out = self
            .run_tool(Exec::new("config-get", self.timeout).arg("--format=json"))
            .await?;
        let raw = out.stdout.trim();
        if raw.is_empty() || raw == "null" {
            return Ok(MariadbConfig::default());
        }
        serde_json::from_str(raw)
            .map_err(|e| WorkloadError::Unavailable(format!("cannot parse config-get output: {e}")))
    }

    /// Report a structured action result
    pub async fn action_set(&self, key: &str, value: &str) -> Result<(), WorkloadError> {
        self.run_tool(
            Exec::new("action-set", self.timeout).arg(format!("{key}={value}")),
        )
        .await?;
        Ok(())
    }

    /// Report an action failure with a human-readable diagnostic
    pub async fn action_fail(&self, message: &str) -> Result<(), WorkloadError> {
        self.run_tool(Exec::new("action-fail", self.timeout).arg(message))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl StatusSink for HookTools {
    async fn set_status(&self, status: &UnitStatus) -> Result<(), WorkloadError> {
        let (level, message) = status.level_and_message();
        debug!(level, message, "setting unit status");
        self.run_tool(
            Exec::new("status-set", self.timeout)
                .arg(level)
                .arg(message),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl RelationStore for HookTools {
    async fn set(&self, relation_id: u32, key: &str, value: &str) -> Result<(), WorkloadError> {
        self.run_tool(
            Exec::new("relation-set", self.timeout)
                .arg("-r")
                .arg(relation_id.to_string())
                .arg(format!("{key}={value}")),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ImageSource for HookTools {
    async fn fetch(&self) -> Result<ImageDescriptor, WorkloadError> {
        let out = self
            .run_tool(Exec::new("resource-get", self.timeout).arg(IMAGE_RESOURCE))
            .await?;
        let path = out.stdout.trim().to_string();
        if path.is_empty() {
            return Err(WorkloadError::Unavailable(format!(
                "resource-get returned no path for {IMAGE_RESOURCE}"
            )));
        }

        let contents = tokio::fs::read_to_string(&path).await.map_err(|e| {
            WorkloadError::Unavailable(format!("cannot read image resource {path}: {e}"))
        })?;
        let info: ImageResourceInfo = serde_json::from_str(&contents).map_err(|e| {
            WorkloadError::Unavailable(format!("cannot parse image resource {path}: {e}"))
        })?;

        Ok(ImageDescriptor {
            image_path: info.registrypath,
            username: info.username,
            password: info.password,
        })
    }
}
