//! Unit tests for the MariaDB lifecycle agent
//!
//! This target covers:
//! - Reconciliation handlers and status transitions
//! - Backup/restore orchestration against a scripted command runner
//! - The operator action surface

mod fixtures;

mod backup;
