//! Drive control module
//!
//! Converts a normalised chassis motion command into four per-module (speed,
//! steering angle) targets. The per-tick pipeline is: command validation,
//! polar-domain command shaping, field-to-chassis frame transform, inverse
//! kinematics, speed desaturation and per-module steering optimisation.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod cmd;
mod kinematics;
mod params;
mod shaper;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use cmd::*;
pub use kinematics::*;
pub use params::*;
pub use shaper::*;
pub use state::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// The number of drive modules on the chassis, ordered front left, front
/// right, back left, back right.
pub const NUM_MODULES: usize = 4;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during DriveCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum DriveCtrlError {
    #[error("Non-finite sensor input ({0}), the equipment collaborator must supply a last-known value")]
    NonFiniteInput(&'static str),
}
