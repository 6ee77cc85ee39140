//! Credential distribution to consumer relations

use std::sync::Arc;

use tracing::{debug, info};

use crate::state::StoredState;
use crate::workload::{RelationStore, WorkloadError};

/// Relation key under which the credential is published
pub const ROOT_PASSWORD_KEY: &str = "root-password";

/// Copies the root credential into a consumer relation's per-unit data bag.
///
/// Idempotent: the credential never changes after creation, so repeated
/// publication writes the same value. A missing credential is a no-op.
pub struct RelationPublisher {
    relations: Arc<dyn RelationStore>,
}

impl RelationPublisher {
    pub fn new(relations: Arc<dyn RelationStore>) -> Self {
        Self { relations }
    }

    pub async fn publish(
        &self,
        relation_id: u32,
        state: &StoredState,
    ) -> Result<(), WorkloadError> {
        let Some(password) = state.root_password() else {
            debug!(relation_id, "no credential yet, skipping publication");
            return Ok(());
        };

        self.relations
            .set(relation_id, ROOT_PASSWORD_KEY, password)
            .await?;
        info!(relation_id, "published root credential to relation");
        Ok(())
    }
}
