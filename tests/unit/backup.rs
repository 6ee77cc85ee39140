//! Unit tests for backup/restore orchestration
//!
//! Uses the scripted command runner: no real mysqldump/mysql processes are
//! spawned, and every constructed command line is inspected.

use std::sync::Arc;
use std::time::Duration;

use mariadb_operator::backup::{BackupConfig, BackupError, BackupOrchestrator};
use mariadb_operator::exec::{ExecError, ExecOutput};

use crate::fixtures::ScriptedRunner;

const PASSWORD: &str = "correct-horse-battery";

fn has_arg_pair(args: &[String], key: &str, value: &str) -> bool {
    args.windows(2).any(|w| w[0] == key && w[1] == value)
}

fn orchestrator(
    dir: &tempfile::TempDir,
    runner: Arc<ScriptedRunner>,
) -> BackupOrchestrator {
    BackupOrchestrator::new(
        BackupConfig {
            dir: dir.path().to_path_buf(),
            host: "127.0.0.1".to_string(),
            port: 3306,
            timeout: Duration::from_secs(60),
        },
        runner,
    )
}

#[tokio::test]
async fn test_backup_then_restore_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let runner = Arc::new(ScriptedRunner::emulating_mysqldump());
    let backups = orchestrator(&dir, runner.clone());

    let record = backups.backup(PASSWORD).await.unwrap();
    assert!(record.location.exists());

    let restored = backups.restore(Some(&record.identifier), PASSWORD).await.unwrap();
    assert_eq!(restored, record);

    let calls = runner.recorded_calls();
    assert_eq!(calls.len(), 2);
    let (dump, import) = (&calls[0], &calls[1]);

    assert_eq!(dump.program, "mysqldump");
    assert_eq!(import.program, "mysql");

    // Same credential, same address for export and import
    for call in [dump, import] {
        assert_eq!(call.envs.get("MYSQL_PWD").map(String::as_str), Some(PASSWORD));
        assert!(has_arg_pair(&call.args, "--host", "127.0.0.1"));
        assert!(has_arg_pair(&call.args, "--port", "3306"));
        // The credential must never appear on the command line
        assert!(call.args.iter().all(|a| !a.contains(PASSWORD)));
    }

    // The import reads the exact dump file
    assert_eq!(import.stdin.as_deref(), Some(record.location.as_path()));
}

#[tokio::test]
async fn test_restore_without_identifier_picks_newest() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("20260101T000000Z.sql"), "a").unwrap();
    std::fs::write(dir.path().join("20260315T120000Z.sql"), "b").unwrap();
    std::fs::write(dir.path().join("20260102T000000Z.sql"), "c").unwrap();

    let runner = Arc::new(ScriptedRunner::default());
    let backups = orchestrator(&dir, runner);

    let restored = backups.restore(None, PASSWORD).await.unwrap();
    assert_eq!(restored.identifier, "20260315T120000Z");
}

#[tokio::test]
async fn test_restore_on_empty_store_fails_without_invoking_tool() {
    let dir = tempfile::tempdir().unwrap();
    let runner = Arc::new(ScriptedRunner::default());
    let backups = orchestrator(&dir, runner.clone());

    let err = backups.restore(None, PASSWORD).await.unwrap_err();
    assert!(matches!(err, BackupError::NoBackupAvailable(_)));
    assert!(runner.recorded_calls().is_empty());
}

#[tokio::test]
async fn test_restore_unknown_identifier() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("20260101T000000Z.sql"), "a").unwrap();

    let runner = Arc::new(ScriptedRunner::default());
    let backups = orchestrator(&dir, runner.clone());

    let err = backups
        .restore(Some("20991231T235959Z"), PASSWORD)
        .await
        .unwrap_err();
    match err {
        BackupError::NoBackupAvailable(reason) => {
            assert!(reason.contains("20991231T235959Z"), "{reason}")
        }
        other => panic!("expected NoBackupAvailable, got {other:?}"),
    }
    assert!(runner.recorded_calls().is_empty());
}

#[tokio::test]
async fn test_traversal_identifier_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let runner = Arc::new(ScriptedRunner::default());
    let backups = orchestrator(&dir, runner.clone());

    let err = backups
        .restore(Some("../../etc/passwd"), PASSWORD)
        .await
        .unwrap_err();
    assert!(matches!(err, BackupError::NoBackupAvailable(_)));
    assert!(runner.recorded_calls().is_empty());
}

#[tokio::test]
async fn test_failed_backup_discards_partial_dump() {
    let dir = tempfile::tempdir().unwrap();
    let runner = Arc::new(ScriptedRunner::emulating_mysqldump());
    runner.push_output(Ok(ExecOutput {
        code: 2,
        stdout: String::new(),
        stderr: "mysqldump: Got error: 1045: Access denied\n".to_string(),
    }));
    let backups = orchestrator(&dir, runner);

    let err = backups.backup(PASSWORD).await.unwrap_err();
    match err {
        BackupError::BackupFailed { diagnostic } => {
            // Tool diagnostics are carried verbatim
            assert_eq!(diagnostic, "mysqldump: Got error: 1045: Access denied");
        }
        other => panic!("expected BackupFailed, got {other:?}"),
    }

    // A failed dump never shows up as a record
    assert!(backups.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_timeout_surfaces_as_timed_out() {
    let dir = tempfile::tempdir().unwrap();
    let runner = Arc::new(ScriptedRunner::default());
    runner.push_output(Err(ExecError::TimedOut {
        program: "mysqldump".to_string(),
        timeout: Duration::from_secs(60),
    }));
    let backups = orchestrator(&dir, runner);

    let err = backups.backup(PASSWORD).await.unwrap_err();
    assert!(matches!(err, BackupError::TimedOut(t) if t == Duration::from_secs(60)));
}

#[tokio::test]
async fn test_list_ignores_foreign_files_and_sorts() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("20260315T120000Z.sql"), "b").unwrap();
    std::fs::write(dir.path().join("20260101T000000Z.sql"), "a").unwrap();
    std::fs::write(dir.path().join("notes.txt"), "n").unwrap();
    std::fs::write(dir.path().join("evil name.sql"), "x").unwrap();

    let runner = Arc::new(ScriptedRunner::default());
    let backups = orchestrator(&dir, runner);

    let records = backups.list().await.unwrap();
    let ids: Vec<&str> = records.iter().map(|r| r.identifier.as_str()).collect();
    assert_eq!(ids, ["20260101T000000Z", "20260315T120000Z"]);
}

#[tokio::test]
async fn test_list_missing_directory_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("does-not-exist");
    let backups = BackupOrchestrator::new(
        BackupConfig {
            dir: missing,
            host: "127.0.0.1".to_string(),
            port: 3306,
            timeout: Duration::from_secs(60),
        },
        Arc::new(ScriptedRunner::default()),
    );
    assert!(backups.list().await.unwrap().is_empty());
}
