//! Workload collaborator backed by the Pebble CLI
//!
//! The service plan is serialized as a layer and handed to `pebble add`
//! with combine semantics, so re-applying an unchanged plan has no effect.
//! All invocations go through the command-runner boundary.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::exec::{CommandRunner, Exec, ExecOutput};
use crate::resources::plan::{ServicePlan, Startup};
use crate::workload::{ServiceState, Workload, WorkloadError};

const PEBBLE_PROGRAM: &str = "pebble";

/// Label under which the layer is registered with the supervisor
const LAYER_LABEL: &str = "mariadb";

pub struct PebbleCli {
    runner: Arc<dyn CommandRunner>,
    /// Directory the rendered layer file is written into
    layer_dir: PathBuf,
    timeout: Duration,
}

impl PebbleCli {
    pub fn new(runner: Arc<dyn CommandRunner>, layer_dir: PathBuf, timeout: Duration) -> Self {
        Self {
            runner,
            layer_dir,
            timeout,
        }
    }

    async fn run(&self, exec: Exec) -> Result<ExecOutput, WorkloadError> {
        self.runner
            .run(&exec)
            .await
            .map_err(|e| WorkloadError::Unavailable(e.to_string()))
    }

    /// Render the supervisor layer for a service plan.
    ///
    /// JSON is a YAML subset, so the supervisor parses this directly.
    fn render_layer(plan: &ServicePlan) -> serde_json::Value {
        let startup = match plan.startup {
            Startup::Enabled => "enabled",
            Startup::Disabled => "disabled",
        };
        serde_json::json!({
            "summary": "mariadb layer",
            "description": "layer for the mariadb service",
            "services": {
                &plan.service_name: {
                    "override": "replace",
                    "summary": &plan.service_name,
                    "command": &plan.command,
                    "startup": startup,
                    "environment": &plan.environment,
                }
            }
        })
    }
}

#[async_trait]
impl Workload for PebbleCli {
    async fn apply_plan(&self, plan: &ServicePlan) -> Result<(), WorkloadError> {
        let layer = Self::render_layer(plan);
        let layer_path = self.layer_dir.join(format!("{LAYER_LABEL}-layer.json"));

        tokio::fs::create_dir_all(&self.layer_dir)
            .await
            .map_err(|e| WorkloadError::Unavailable(format!("cannot write layer file: {e}")))?;
        tokio::fs::write(&layer_path, layer.to_string())
            .await
            .map_err(|e| WorkloadError::Unavailable(format!("cannot write layer file: {e}")))?;

        debug!(path = %layer_path.display(), "applying supervisor layer");

        let out = self
            .run(
                Exec::new(PEBBLE_PROGRAM, self.timeout)
                    .args(["add", "--combine", LAYER_LABEL])
                    .arg(layer_path.display().to_string()),
            )
            .await?;
        if !out.success() {
            return Err(WorkloadError::Unavailable(format!(
                "pebble add failed: {}",
                out.diagnostic()
            )));
        }
        Ok(())
    }

    async fn autostart(&self) -> Result<(), WorkloadError> {
        let out = self
            .run(Exec::new(PEBBLE_PROGRAM, self.timeout).arg("replan"))
            .await?;
        if !out.success() {
            return Err(WorkloadError::Unavailable(format!(
                "pebble replan failed: {}",
                out.diagnostic()
            )));
        }
        Ok(())
    }

    async fn service_status(&self, name: &str) -> Result<ServiceState, WorkloadError> {
        let out = self
            .run(
                Exec::new(PEBBLE_PROGRAM, self.timeout)
                    .arg("services")
                    .arg(name),
            )
            .await?;
        if !out.success() {
            return Err(WorkloadError::NotFound(name.to_string()));
        }

        // Tabular output: "Service  Startup  Current  Since"
        for line in out.stdout.lines().skip(1) {
            let mut columns = line.split_whitespace();
            if columns.next() == Some(name) {
                let current = columns.nth(1).unwrap_or_default();
                return if current == "active" {
                    Ok(ServiceState::Running)
                } else {
                    Ok(ServiceState::Stopped)
                };
            }
        }
        Err(WorkloadError::NotFound(name.to_string()))
    }

    async fn start_service(&self, name: &str) -> Result<(), WorkloadError> {
        let out = self
            .run(
                Exec::new(PEBBLE_PROGRAM, self.timeout)
                    .arg("start")
                    .arg(name),
            )
            .await?;
        if !out.success() {
            return Err(WorkloadError::Unavailable(format!(
                "pebble start failed: {}",
                out.diagnostic()
            )));
        }
        Ok(())
    }

    async fn stop_service(&self, name: &str) -> Result<(), WorkloadError> {
        let out = self
            .run(
                Exec::new(PEBBLE_PROGRAM, self.timeout)
                    .arg("stop")
                    .arg(name),
            )
            .await?;
        if !out.success() {
            return Err(WorkloadError::Unavailable(format!(
                "pebble stop failed: {}",
                out.diagnostic()
            )));
        }
        Ok(())
    }
}
