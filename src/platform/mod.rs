//! Production collaborator implementations
//!
//! These drive the container supervisor and the platform hook tools through
//! the command-runner boundary. The controller itself only sees the trait
//! contracts in `crate::workload`.

pub mod hooktools;
pub mod pebble;

pub use hooktools::HookTools;
pub use pebble::PebbleCli;
