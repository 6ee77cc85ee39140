//! Desired-state builder for the MariaDB service
//!
//! `build_service_plan` is a pure function from (configuration, credential)
//! to the process-supervision descriptor applied to the workload container.
//! Equal inputs always produce structurally equal plans, so re-applying an
//! unchanged plan is a no-op at the supervisor boundary.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::{ConfigError, MariadbConfig};

/// Supervised service name inside the workload container
pub const SERVICE_NAME: &str = "mariadb";

/// Command line the supervisor runs for the service
pub const SERVICE_COMMAND: &str = "/usr/local/bin/docker-entrypoint.sh mysqld";

/// Fixed environment key carrying the root credential
pub const ROOT_PASSWORD_ENV: &str = "MYSQL_ROOT_PASSWORD";

/// Startup policy for a supervised service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Startup {
    Enabled,
    Disabled,
}

/// Declarative specification of what should run inside the workload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServicePlan {
    pub service_name: String,
    pub command: String,
    pub environment: BTreeMap<String, String>,
    pub startup: Startup,
    pub port: u16,
}

/// Build the desired service plan from configuration and the root credential.
///
/// Pure and total: the only failure mode is an out-of-range port, reported
/// as `ConfigError` for the controller to translate into a Blocked status.
pub fn build_service_plan(
    config: &MariadbConfig,
    root_password: &str,
) -> Result<ServicePlan, ConfigError> {
    let port = config.validated_port()?;

    let environment = BTreeMap::from([(ROOT_PASSWORD_ENV.to_string(), root_password.to_string())]);

    Ok(ServicePlan {
        service_name: SERVICE_NAME.to_string(),
        command: SERVICE_COMMAND.to_string(),
        environment,
        startup: Startup::Enabled,
        port,
    })
}
