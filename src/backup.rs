//! Backup and restore orchestration
//!
//! Dumps and restores the live database through the MariaDB client tools,
//! invoked through the `exec` boundary. Commands are argv vectors and the
//! credential travels in the `MYSQL_PWD` environment variable, so neither
//! paths nor the credential are ever interpolated into a shell string.
//! These operations are action-scoped: their failures are reported to the
//! invoker and never change the unit status.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info};

use crate::exec::{CommandRunner, Exec, ExecError};

/// Export tool
const MYSQLDUMP_PROGRAM: &str = "mysqldump";

/// Import tool
const MYSQL_PROGRAM: &str = "mysql";

/// Environment variable the client tools read the password from
const MYSQL_PWD_ENV: &str = "MYSQL_PWD";

/// Identifier format: sortable, second granularity. Lexical order of
/// identifiers equals creation order, which is what `restore` relies on
/// when picking the newest record.
const IDENTIFIER_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// File extension for dump files in the backup directory
const DUMP_EXTENSION: &str = "sql";

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("backup failed: {diagnostic}")]
    BackupFailed { diagnostic: String },

    #[error("restore failed: {diagnostic}")]
    RestoreFailed { diagnostic: String },

    #[error("failed to list backups: {0}")]
    BackupListFailed(String),

    #[error("no backup available: {0}")]
    NoBackupAvailable(String),

    #[error("operation timed out after {0:?}")]
    TimedOut(Duration),
}

/// A completed backup in the backup store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupRecord {
    /// Timestamp-derived identifier, e.g. `20260825T101502Z`
    pub identifier: String,
    /// Dump file location
    pub location: PathBuf,
}

/// Where and how backups run
#[derive(Debug, Clone)]
pub struct BackupConfig {
    /// Backup store directory; created on demand
    pub dir: PathBuf,
    /// Workload network address
    pub host: String,
    pub port: u16,
    /// Bound on each client-tool invocation
    pub timeout: Duration,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("/var/lib/mariadb-operator/backups"),
            host: "127.0.0.1".to_string(),
            port: crate::config::DEFAULT_PORT as u16,
            timeout: Duration::from_secs(300),
        }
    }
}

/// Orchestrates backup, list and restore against the live workload
pub struct BackupOrchestrator {
    config: BackupConfig,
    runner: Arc<dyn CommandRunner>,
}

impl BackupOrchestrator {
    pub fn new(config: BackupConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self { config, runner }
    }

    /// Dump all databases into a new record.
    ///
    /// A failed dump never surfaces as a record: the partially written file
    /// is removed before the error is returned.
    pub async fn backup(&self, root_password: &str) -> Result<BackupRecord, BackupError> {
        let identifier = Utc::now().format(IDENTIFIER_FORMAT).to_string();

        tokio::fs::create_dir_all(&self.config.dir)
            .await
            .map_err(|e| BackupError::BackupFailed {
                diagnostic: format!("cannot create backup directory: {e}"),
            })?;

        let location = self.record_location(&identifier);
        info!(%identifier, location = %location.display(), "starting backup");

        let port = self.config.port.to_string();
        let exec = Exec::new(MYSQLDUMP_PROGRAM, self.config.timeout)
            .args([
                "--host",
                self.config.host.as_str(),
                "--port",
                port.as_str(),
                "--user",
                "root",
                "--single-transaction",
                "--all-databases",
                "--result-file",
            ])
            .arg(location.display().to_string())
            .env(MYSQL_PWD_ENV, root_password);

        match self.runner.run(&exec).await {
            Ok(out) if out.success() => {
                info!(%identifier, "backup completed");
                Ok(BackupRecord {
                    identifier,
                    location,
                })
            }
            Ok(out) => {
                self.discard_partial(&location).await;
                Err(BackupError::BackupFailed {
                    diagnostic: out.diagnostic().to_string(),
                })
            }
            Err(e) => {
                self.discard_partial(&location).await;
                Err(exec_failure(e, |diagnostic| BackupError::BackupFailed {
                    diagnostic,
                }))
            }
        }
    }

    /// Enumerate the backup store, oldest first.
    pub async fn list(&self) -> Result<Vec<BackupRecord>, BackupError> {
        let mut entries = match tokio::fs::read_dir(&self.config.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(BackupError::BackupListFailed(e.to_string())),
        };

        let mut records = Vec::new();
        loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => {
                    if let Some(record) = record_from_path(entry.path()) {
                        records.push(record);
                    }
                }
                Ok(None) => break,
                Err(e) => return Err(BackupError::BackupListFailed(e.to_string())),
            }
        }

        // Identifiers are timestamp-prefixed, so lexical order is creation
        // order and ties resolve consistently.
        records.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        Ok(records)
    }

    /// Import a backup into the live workload.
    ///
    /// With no identifier the newest record is restored; an empty store is
    /// `NoBackupAvailable` and the import tool is never invoked.
    pub async fn restore(
        &self,
        identifier: Option<&str>,
        root_password: &str,
    ) -> Result<BackupRecord, BackupError> {
        let records = self.list().await?;

        let record = match identifier {
            Some(id) => {
                if !is_valid_identifier(id) {
                    return Err(BackupError::NoBackupAvailable(format!(
                        "invalid backup identifier {id:?}"
                    )));
                }
                records
                    .into_iter()
                    .find(|r| r.identifier == id)
                    .ok_or_else(|| {
                        BackupError::NoBackupAvailable(format!("no backup named {id}"))
                    })?
            }
            None => records.into_iter().next_back().ok_or_else(|| {
                BackupError::NoBackupAvailable(format!(
                    "backup store {} is empty",
                    self.config.dir.display()
                ))
            })?,
        };

        info!(identifier = %record.identifier, "restoring backup");

        let port = self.config.port.to_string();
        let exec = Exec::new(MYSQL_PROGRAM, self.config.timeout)
            .args([
                "--host",
                self.config.host.as_str(),
                "--port",
                port.as_str(),
                "--user",
                "root",
            ])
            .stdin_file(&record.location)
            .env(MYSQL_PWD_ENV, root_password);

        match self.runner.run(&exec).await {
            Ok(out) if out.success() => {
                info!(identifier = %record.identifier, "restore completed");
                Ok(record)
            }
            Ok(out) => Err(BackupError::RestoreFailed {
                diagnostic: out.diagnostic().to_string(),
            }),
            Err(e) => Err(exec_failure(e, |diagnostic| BackupError::RestoreFailed {
                diagnostic,
            })),
        }
    }

    fn record_location(&self, identifier: &str) -> PathBuf {
        self.config.dir.join(format!("{identifier}.{DUMP_EXTENSION}"))
    }

    async fn discard_partial(&self, location: &Path) {
        if let Err(e) = tokio::fs::remove_file(location).await
            && e.kind() != std::io::ErrorKind::NotFound
        {
            debug!(location = %location.display(), "could not remove partial dump: {e}");
        }
    }
}

/// Map an exec-boundary failure: timeouts keep their own variant, spawn
/// failures become the tool diagnostic.
fn exec_failure(e: ExecError, to_error: impl FnOnce(String) -> BackupError) -> BackupError {
    match e {
        ExecError::TimedOut { timeout, .. } => BackupError::TimedOut(timeout),
        other => to_error(other.to_string()),
    }
}

/// Identifiers contain only digits plus the literal `T` and `Z` markers.
/// Anything else (separators, traversal sequences) is rejected before it
/// can reach the filesystem.
pub fn is_valid_identifier(identifier: &str) -> bool {
    !identifier.is_empty()
        && identifier
            .chars()
            .all(|c| c.is_ascii_digit() || c == 'T' || c == 'Z')
}

fn record_from_path(path: PathBuf) -> Option<BackupRecord> {
    if path.extension().and_then(|e| e.to_str()) != Some(DUMP_EXTENSION) {
        return None;
    }
    let identifier = path.file_stem()?.to_str()?;
    if !is_valid_identifier(identifier) {
        return None;
    }
    Some(BackupRecord {
        identifier: identifier.to_string(),
        location: path,
    })
}
