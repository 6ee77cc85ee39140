//! Externally visible unit status
//!
//! A single status value per unit, overwritten on every evaluation and
//! pushed through the platform's status sink.

use std::fmt;

/// Status levels understood by the platform
pub mod status_levels {
    pub const ACTIVE: &str = "active";
    pub const WAITING: &str = "waiting";
    pub const MAINTENANCE: &str = "maintenance";
    pub const BLOCKED: &str = "blocked";
}

/// The coarse status reported for this unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitStatus {
    Active,
    Waiting(String),
    Maintenance(String),
    Blocked(String),
}

impl UnitStatus {
    pub fn waiting(reason: impl Into<String>) -> Self {
        UnitStatus::Waiting(reason.into())
    }

    pub fn maintenance(reason: impl Into<String>) -> Self {
        UnitStatus::Maintenance(reason.into())
    }

    pub fn blocked(reason: impl Into<String>) -> Self {
        UnitStatus::Blocked(reason.into())
    }

    /// Platform-facing (level, message) projection
    pub fn level_and_message(&self) -> (&'static str, &str) {
        match self {
            UnitStatus::Active => (status_levels::ACTIVE, ""),
            UnitStatus::Waiting(m) => (status_levels::WAITING, m),
            UnitStatus::Maintenance(m) => (status_levels::MAINTENANCE, m),
            UnitStatus::Blocked(m) => (status_levels::BLOCKED, m),
        }
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (level, message) = self.level_and_message();
        if message.is_empty() {
            write!(f, "{level}")
        } else {
            write!(f, "{level}: {message}")
        }
    }
}
