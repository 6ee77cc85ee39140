pub mod error;
pub mod reconciler;
pub mod state_machine;
pub mod status;

pub use error::{Error, Result};
pub use reconciler::{Context, Event, Reconciler, Role};
pub use state_machine::{
    TransitionContext, TransitionResult, UnitEvent, UnitPhase, UnitStateMachine,
};
pub use status::UnitStatus;
