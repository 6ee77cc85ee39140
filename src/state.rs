//! Persisted unit state
//!
//! The agent runs one process per lifecycle event, so anything that must
//! survive across events lives in [`StoredState`] and is written through
//! [`StateStore`] explicitly. The only persisted value today is the root
//! credential: generated once on first use, immutable afterwards, observed
//! identically by every consumer.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::resources::secret::{ROOT_PASSWORD_LEN, generate_password};

#[derive(Error, Debug)]
pub enum StateError {
    #[error("failed to read state file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write state file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("state file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// State shared by all event handlers of this unit
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredState {
    root_password: Option<String>,
}

impl StoredState {
    /// Read-only credential accessor
    pub fn root_password(&self) -> Option<&str> {
        self.root_password.as_deref()
    }

    /// Return the root credential, generating it on first call.
    ///
    /// Subsequent calls always return the stored value; the credential is
    /// never rotated for the lifetime of the unit.
    pub fn get_or_create_root_password(&mut self) -> &str {
        self.root_password
            .get_or_insert_with(|| generate_password(ROOT_PASSWORD_LEN))
            .as_str()
    }
}

/// Explicit load/save hooks for [`StoredState`]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load state from disk; a missing file yields the default state.
    pub fn load(&self) -> Result<StoredState, StateError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| StateError::Corrupt {
                path: self.path.clone(),
                source,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StoredState::default()),
            Err(source) => Err(StateError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Persist state to disk, creating parent directories as needed.
    pub fn save(&self, state: &StoredState) -> Result<(), StateError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StateError::Write {
                path: self.path.clone(),
                source,
            })?;
        }
        let bytes = serde_json::to_vec_pretty(state).map_err(|source| StateError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        std::fs::write(&self.path, bytes).map_err(|source| StateError::Write {
            path: self.path.clone(),
            source,
        })
    }
}
