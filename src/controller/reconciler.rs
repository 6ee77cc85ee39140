//! Reconciliation logic for the MariaDB unit
//!
//! This module contains the event handlers that converge the workload
//! container toward its desired state. Exactly one event is handled per
//! process invocation; the platform serializes delivery, so no handler is
//! ever re-entered. Errors become status changes and are never retried
//! here: a fresh lifecycle event from the platform is the only retry path.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::config::MariadbConfig;
use crate::controller::error::{Error, Result};
use crate::controller::state_machine::{
    TransitionContext, TransitionResult, UnitEvent, UnitPhase, UnitStateMachine,
};
use crate::controller::status::UnitStatus;
use crate::relation::RelationPublisher;
use crate::resources::plan::{SERVICE_NAME, build_service_plan};
use crate::state::{StateStore, StoredState};
use crate::workload::{ImageSource, RelationStore, ServiceState, StatusSink, Workload, WorkloadError};

/// Whether this replica owns convergence of shared desired state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Leader,
    Follower,
}

impl Role {
    pub fn is_leader(self) -> bool {
        self == Role::Leader
    }
}

/// Lifecycle events delivered by the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The workload container is up and the supervisor is reachable
    WorkloadReady,
    /// Unit configuration changed
    ConfigChanged,
    /// Periodic status check
    UpdateStatus,
    /// Peer topology changed; keeps desired state consistent across replicas
    PeerRelationChanged,
    /// A consumer joined or changed the database relation
    ConsumerRelationChanged { relation_id: u32 },
}

/// Shared collaborator handles for the controller
#[derive(Clone)]
pub struct Context {
    pub workload: Arc<dyn Workload>,
    pub image: Arc<dyn ImageSource>,
    pub relations: Arc<dyn RelationStore>,
    pub status: Arc<dyn StatusSink>,
}

/// Event-driven controller for a single MariaDB unit
pub struct Reconciler {
    ctx: Context,
    config: MariadbConfig,
    state: StoredState,
    store: StateStore,
    fsm: UnitStateMachine,
    phase: UnitPhase,
    last_status: UnitStatus,
}

impl Reconciler {
    pub fn new(ctx: Context, config: MariadbConfig, state: StoredState, store: StateStore) -> Self {
        Self {
            ctx,
            config,
            state,
            store,
            fsm: UnitStateMachine::new(),
            phase: UnitPhase::Uninitialized,
            last_status: UnitStatus::waiting("agent has not converged yet"),
        }
    }

    pub fn phase(&self) -> UnitPhase {
        self.phase
    }

    pub fn state(&self) -> &StoredState {
        &self.state
    }

    /// Handle one lifecycle event and push the resulting unit status.
    #[instrument(skip(self), fields(event = ?event, role = ?role, phase = %self.phase))]
    pub async fn handle_event(&mut self, event: Event, role: Role) -> UnitStatus {
        info!("handling lifecycle event");

        let status = match event {
            Event::WorkloadReady => self.on_workload_ready().await,
            Event::ConfigChanged | Event::PeerRelationChanged => self.on_config_changed(role).await,
            Event::UpdateStatus => self.on_update_status(role).await,
            Event::ConsumerRelationChanged { relation_id } => {
                self.on_consumer_relation_changed(relation_id).await
            }
        };

        if let Err(e) = self.ctx.status.set_status(&status).await {
            warn!("failed to push unit status: {e}");
        }
        self.last_status = status.clone();
        status
    }

    /// Workload-ready: ensure the credential exists, apply the plan and
    /// autostart. Collaborator failure blocks the unit; the event counts as
    /// handled either way.
    async fn on_workload_ready(&mut self) -> UnitStatus {
        self.apply_phase_event(UnitEvent::ConvergeRequested, &TransitionContext::default());

        match self.converge_workload().await {
            Ok(()) => {
                self.apply_phase_event(UnitEvent::PlanApplied, &TransitionContext::default());
                UnitStatus::Active
            }
            Err(e) => self.fail_convergence(e),
        }
    }

    /// Configuration-changed (also the peer-relation path): only the leader
    /// recomputes and applies desired state; followers go straight to the
    /// readiness evaluation. Readiness is always re-evaluated afterwards.
    async fn on_config_changed(&mut self, role: Role) -> UnitStatus {
        if !role.is_leader() {
            debug!("not the leader, skipping convergence");
            return self.on_update_status(role).await;
        }

        self.apply_phase_event(UnitEvent::ConvergeRequested, &TransitionContext::default());

        // Image fetch failure is fatal to this reconciliation attempt; the
        // reason is surfaced verbatim and no silent retry happens.
        let image = match self.ctx.image.fetch().await {
            Ok(image) => image,
            Err(e) => {
                return self.fail_convergence(Error::Collaborator(format!(
                    "failed to fetch workload image: {e}"
                )));
            }
        };
        debug!(image = %image.image_path, "using workload image");

        // The credential is only ever created on workload-ready; before that
        // there is nothing to apply yet.
        let Some(password) = self.state.root_password().map(str::to_string) else {
            let status = UnitStatus::waiting("waiting for workload container");
            self.apply_phase_event(UnitEvent::ServiceNotReady, &TransitionContext::default());
            return status;
        };

        let result: Result<()> = async {
            let plan = build_service_plan(&self.config, &password)?;
            self.ctx.workload.apply_plan(&plan).await?;
            Ok(())
        }
        .await;

        match result {
            Ok(()) => self.on_update_status(role).await,
            Err(e) => self.fail_convergence(e),
        }
    }

    /// Update-status: the leader queries service liveness; followers report
    /// Active since they do not own convergence.
    async fn on_update_status(&mut self, role: Role) -> UnitStatus {
        if !role.is_leader() {
            debug!("follower unit, reporting active");
            self.phase = UnitPhase::Active;
            return UnitStatus::Active;
        }

        self.apply_phase_event(UnitEvent::ConvergeRequested, &TransitionContext::default());

        match self.ctx.workload.service_status(SERVICE_NAME).await {
            Ok(ServiceState::Running) => {
                self.apply_phase_event(
                    UnitEvent::ServiceReady,
                    &TransitionContext {
                        service_running: true,
                    },
                );
                UnitStatus::Active
            }
            Ok(ServiceState::Stopped) => {
                self.apply_phase_event(UnitEvent::ServiceNotReady, &TransitionContext::default());
                UnitStatus::waiting("service not running")
            }
            // A missing service is expected before first convergence; never
            // propagate the raw error.
            Err(WorkloadError::NotFound(_)) => {
                self.apply_phase_event(UnitEvent::ServiceNotReady, &TransitionContext::default());
                UnitStatus::waiting("service not ready yet")
            }
            Err(WorkloadError::Unavailable(reason)) => {
                self.fail_convergence(Error::Collaborator(reason))
            }
        }
    }

    /// Consumer-relation-changed: publish the credential into the relation
    /// data bag. No phase transition.
    async fn on_consumer_relation_changed(&mut self, relation_id: u32) -> UnitStatus {
        let publisher = RelationPublisher::new(self.ctx.relations.clone());
        if let Err(e) = publisher.publish(relation_id, &self.state).await {
            warn!(relation_id, "failed to publish credential: {e}");
        }
        self.last_status.clone()
    }

    /// Create the credential if absent, then apply and autostart the plan.
    async fn converge_workload(&mut self) -> Result<()> {
        let created = self.state.root_password().is_none();
        let password = self.state.get_or_create_root_password().to_string();
        if created {
            info!("generated root credential");
            self.store
                .save(&self.state)
                .map_err(|e| Error::Collaborator(format!("failed to persist unit state: {e}")))?;
        }

        let plan = build_service_plan(&self.config, &password)?;
        self.ctx.workload.apply_plan(&plan).await?;
        self.ctx.workload.autostart().await?;
        Ok(())
    }

    /// Map a convergence error to its status and drive the phase machine.
    fn fail_convergence(&mut self, error: Error) -> UnitStatus {
        let status = error.to_status();
        let event = match status {
            UnitStatus::Waiting(_) => UnitEvent::ServiceNotReady,
            _ => UnitEvent::ConvergeFailed,
        };
        warn!("convergence failed: {error}");
        self.apply_phase_event(event, &TransitionContext::default());
        status
    }

    fn apply_phase_event(&mut self, event: UnitEvent, ctx: &TransitionContext) {
        match self.fsm.transition(self.phase, event, ctx) {
            TransitionResult::Success {
                from,
                to,
                description,
                ..
            } => {
                info!(%from, %to, %event, "{description}");
                self.phase = to;
            }
            TransitionResult::GuardFailed { reason, .. } => {
                warn!(%event, "transition guard failed: {reason}");
            }
            TransitionResult::InvalidTransition { current, .. } => {
                debug!(%current, %event, "no transition defined, phase unchanged");
            }
        }
    }
}
