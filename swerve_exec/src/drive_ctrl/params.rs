//! Parameters for the drive control module
//!
//! Loaded from `drive_ctrl.toml` under the software root parameters
//! directory.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use super::{ModulePosition, NUM_MODULES};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Drive control parameters.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Params {
    /// Lateral distance between the left and right module centres.
    ///
    /// Units: metres
    pub track_width_m: f64,

    /// Longitudinal distance between the front and back module centres.
    ///
    /// Units: metres
    pub wheelbase_m: f64,

    /// Maximum achievable drive speed of a single module.
    ///
    /// Units: metres/second
    pub max_speed_ms: f64,

    /// Maximum commandable chassis angular rate.
    ///
    /// Units: radians/second
    pub max_ang_speed_rads: f64,

    /// Slew rate of the commanded translation direction, scaled inversely by
    /// the current demand magnitude.
    ///
    /// Units: radians/second at unit magnitude
    pub direction_slew_rate_rads: f64,

    /// Slew rate of the normalised translation magnitude.
    ///
    /// Units: 1/second
    pub magnitude_slew_rate: f64,

    /// Slew rate of the normalised rotation demand.
    ///
    /// Units: 1/second
    pub rotational_slew_rate: f64,

    /// Direction slew rate used when the current magnitude is effectively
    /// zero, where the inverse scaling would diverge. High enough to be an
    /// instantaneous snap at the cycle period.
    ///
    /// Units: radians/second
    pub stationary_direction_slew_rads: f64,

    /// Magnitude below which the translation demand is considered stationary
    /// when deciding whether a near-reversal may flip direction immediately.
    pub reversal_mag_threshold: f64,

    /// Angular offset of each module's steering zero from the chassis
    /// forward axis, ordered front left, front right, back left, back right.
    ///
    /// Units: radians
    pub module_angular_offsets_rad: [f64; NUM_MODULES],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Get the position of each module centre in the chassis frame (X+
    /// forward, Y+ left), ordered front left, front right, back left, back
    /// right.
    pub fn module_positions(&self) -> [ModulePosition; NUM_MODULES] {
        let half_wb = self.wheelbase_m / 2.0;
        let half_tw = self.track_width_m / 2.0;

        [
            ModulePosition {
                x_m: half_wb,
                y_m: half_tw,
            },
            ModulePosition {
                x_m: half_wb,
                y_m: -half_tw,
            },
            ModulePosition {
                x_m: -half_wb,
                y_m: half_tw,
            },
            ModulePosition {
                x_m: -half_wb,
                y_m: -half_tw,
            },
        ]
    }
}
