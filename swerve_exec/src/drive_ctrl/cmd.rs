//! Commands passed into DriveCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A manoeuvre that can be executed by drive control.
#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub enum DriveCmd {
    /// A velocity drive command, the normal operating mode.
    Velocity {
        /// Normalised translation demand along the chassis X+ (forward) axis.
        ///
        /// Range: [-1, +1]
        x_norm: f64,

        /// Normalised translation demand along the chassis Y+ (left) axis.
        ///
        /// Range: [-1, +1]
        y_norm: f64,

        /// Normalised rotation demand about the chassis Z+ (up) axis,
        /// following the right hand grip rule (positive is counter-clockwise
        /// viewed from above).
        ///
        /// Range: [-1, +1]
        omega_norm: f64,

        /// True if the translation demand is expressed in the field frame
        /// rather than the chassis frame.
        field_relative: bool,

        /// True if the command should be smoothed by the slew-rate shaper.
        rate_limit: bool,
    },

    /// Lock the wheels in an X pattern at zero speed, resisting pushes from
    /// outside. Bypasses the shaper entirely.
    LockWheels,

    /// Stop the chassis, maintaining the current steer angles but setting all
    /// drive speeds to zero.
    Stop,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DriveCmd {
    /// Determine if the command is valid.
    ///
    /// A velocity command is valid if all demands are finite and within the
    /// normalised range. Invalid commands must be rejected at the boundary: a
    /// NaN reaching the shaper state would corrupt every subsequent cycle.
    pub fn is_valid(&self) -> bool {
        match *self {
            DriveCmd::Velocity {
                x_norm,
                y_norm,
                omega_norm,
                ..
            } => [x_norm, y_norm, omega_norm]
                .iter()
                .all(|v| v.is_finite() && v.abs() <= 1.0),
            DriveCmd::LockWheels | DriveCmd::Stop => true,
        }
    }
}
