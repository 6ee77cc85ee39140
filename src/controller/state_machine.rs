//! Finite state machine for unit lifecycle management
//!
//! Explicit transition table with guards. The machine is re-entrant: every
//! lifecycle event re-enters through `ConvergeRequested`, and the side
//! branches (Waiting, Blocked, Maintenance) are all reachable from
//! Converging and from each other on re-evaluation.

use std::fmt;

/// Coarse lifecycle phase of this unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UnitPhase {
    /// No event has been handled yet
    #[default]
    Uninitialized,
    /// Desired state is being recomputed and applied
    Converging,
    /// Workload is running the desired state
    Active,
    /// Transient condition, expected to resolve on a later event
    Waiting,
    /// Requires operator intervention (bad config, collaborator failure)
    Blocked,
    /// Operator-driven maintenance (e.g. restart) in progress
    Maintenance,
}

impl fmt::Display for UnitPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnitPhase::Uninitialized => "Uninitialized",
            UnitPhase::Converging => "Converging",
            UnitPhase::Active => "Active",
            UnitPhase::Waiting => "Waiting",
            UnitPhase::Blocked => "Blocked",
            UnitPhase::Maintenance => "Maintenance",
        };
        f.write_str(s)
    }
}

/// Events that trigger phase transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitEvent {
    /// A lifecycle event arrived and convergence is starting
    ConvergeRequested,
    /// The service plan was applied and autostarted successfully
    PlanApplied,
    /// The readiness query reported the service running
    ServiceReady,
    /// The readiness query reported the service absent or stopped
    ServiceNotReady,
    /// Convergence failed (bad config or collaborator error)
    ConvergeFailed,
    /// An operator action took the service down on purpose
    MaintenanceStarted,
    /// Maintenance completed and the service is back up
    MaintenanceFinished,
}

impl fmt::Display for UnitEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Context consulted by transition guards
#[derive(Debug, Clone, Copy, Default)]
pub struct TransitionContext {
    /// Whether the readiness query saw the service running
    pub service_running: bool,
}

/// A state transition definition
#[derive(Debug)]
struct Transition {
    from: UnitPhase,
    to: UnitPhase,
    event: UnitEvent,
    description: &'static str,
}

impl Transition {
    const fn new(
        from: UnitPhase,
        to: UnitPhase,
        event: UnitEvent,
        description: &'static str,
    ) -> Self {
        Self {
            from,
            to,
            event,
            description,
        }
    }
}

/// Result of attempting a state transition
#[derive(Debug)]
pub enum TransitionResult {
    Success {
        from: UnitPhase,
        to: UnitPhase,
        event: UnitEvent,
        description: &'static str,
    },
    /// No transition is defined for (current phase, event)
    InvalidTransition {
        current: UnitPhase,
        event: UnitEvent,
    },
    /// A guard condition prevented the transition
    GuardFailed {
        from: UnitPhase,
        to: UnitPhase,
        event: UnitEvent,
        reason: String,
    },
}

/// Transition-table state machine for the unit lifecycle
pub struct UnitStateMachine {
    transitions: Vec<Transition>,
}

impl Default for UnitStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitStateMachine {
    pub fn new() -> Self {
        use UnitEvent::*;
        use UnitPhase::*;

        Self {
            transitions: vec![
                // === Entry into convergence, re-entrant from every phase ===
                Transition::new(Uninitialized, Converging, ConvergeRequested, "First lifecycle event, starting convergence"),
                Transition::new(Active, Converging, ConvergeRequested, "Re-evaluating desired state"),
                Transition::new(Waiting, Converging, ConvergeRequested, "Retrying convergence after transient condition"),
                Transition::new(Blocked, Converging, ConvergeRequested, "Retrying convergence after operator intervention"),
                Transition::new(Converging, Converging, ConvergeRequested, "Convergence re-entered by a new event"),
                // === Convergence outcomes ===
                Transition::new(Converging, Active, PlanApplied, "Service plan applied, workload converged"),
                Transition::new(Converging, Active, ServiceReady, "Workload service is running"),
                Transition::new(Converging, Waiting, ServiceNotReady, "Workload service not ready yet"),
                Transition::new(Converging, Blocked, ConvergeFailed, "Convergence failed"),
                // === Re-evaluation from Active ===
                Transition::new(Active, Active, ServiceReady, "Workload service still running"),
                Transition::new(Active, Waiting, ServiceNotReady, "Workload service went away"),
                Transition::new(Active, Blocked, ConvergeFailed, "Failure while active"),
                // === Re-evaluation from Waiting ===
                Transition::new(Waiting, Active, ServiceReady, "Workload service became ready"),
                Transition::new(Waiting, Waiting, ServiceNotReady, "Workload service still not ready"),
                Transition::new(Waiting, Blocked, ConvergeFailed, "Failure while waiting"),
                // === Operator-driven maintenance ===
                Transition::new(Active, Maintenance, MaintenanceStarted, "Operator maintenance started"),
                Transition::new(Waiting, Maintenance, MaintenanceStarted, "Operator maintenance started while waiting"),
                Transition::new(Maintenance, Active, MaintenanceFinished, "Maintenance completed, service restarted"),
                Transition::new(Maintenance, Blocked, ConvergeFailed, "Maintenance failed"),
            ],
        }
    }

    /// Attempt to transition from `current` on `event`
    pub fn transition(
        &self,
        current: UnitPhase,
        event: UnitEvent,
        ctx: &TransitionContext,
    ) -> TransitionResult {
        let transition = self
            .transitions
            .iter()
            .find(|t| t.from == current && t.event == event);

        match transition {
            Some(t) => {
                if let Some(reason) = check_guard(t, ctx) {
                    TransitionResult::GuardFailed {
                        from: t.from,
                        to: t.to,
                        event,
                        reason,
                    }
                } else {
                    TransitionResult::Success {
                        from: t.from,
                        to: t.to,
                        event,
                        description: t.description,
                    }
                }
            }
            None => TransitionResult::InvalidTransition { current, event },
        }
    }

    /// Check if a transition is defined (ignoring guards)
    pub fn can_transition(&self, from: UnitPhase, event: UnitEvent) -> bool {
        self.transitions
            .iter()
            .any(|t| t.from == from && t.event == event)
    }

    /// All events with a defined transition out of `phase`
    pub fn valid_events(&self, phase: UnitPhase) -> Vec<UnitEvent> {
        self.transitions
            .iter()
            .filter(|t| t.from == phase)
            .map(|t| t.event)
            .collect()
    }
}

/// Guard conditions, keyed on the target phase and event
fn check_guard(transition: &Transition, ctx: &TransitionContext) -> Option<String> {
    match (transition.to, transition.event) {
        // ServiceReady must only land in Active when the service was
        // actually observed running
        (UnitPhase::Active, UnitEvent::ServiceReady) if !ctx.service_running => {
            Some("service was not observed running".to_string())
        }
        _ => None,
    }
}
