//! Polar-domain command shaper
//!
//! Smooths the normalised translation demand by slew-rate limiting its
//! direction and magnitude separately, rather than limiting X and Y
//! independently. Limiting in cartesian would let a hard left-to-right
//! reversal pass through zero translation with the wheels still steered
//! forwards; limiting in polar keeps the wheels pointing along the actual
//! path of the demand.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use util::maths::{ang_diff, clamp, step_towards, step_towards_circular, wrap_angle};

use super::Params;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Largest angle between the demand and the current direction for which the
/// direction may slew straight towards the demand.
const SIMILAR_DIR_LIMIT_RAD: f64 = 0.45 * std::f64::consts::PI;

/// Smallest angle between the demand and the current direction at which the
/// demand is treated as a reversal, decelerating to rest before flipping.
const REVERSAL_DIR_LIMIT_RAD: f64 = 0.85 * std::f64::consts::PI;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Persistent shaper state, carried between cycles.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct ShaperState {
    /// Current translation direction.
    ///
    /// Units: radians, in `(-pi, pi]`
    pub dir_rad: f64,

    /// Current normalised translation magnitude.
    ///
    /// Range: [0, 1]
    pub mag: f64,

    /// Current normalised rotation demand.
    ///
    /// Range: [-1, +1]
    pub rot: f64,
}

/// A shaped demand ready for scaling into physical units.
#[derive(Clone, Copy, Debug)]
pub struct ShapedDemand {
    /// Normalised translation demand along the chassis X+ axis.
    pub x_norm: f64,

    /// Normalised translation demand along the chassis Y+ axis.
    pub y_norm: f64,

    /// Normalised rotation demand.
    pub omega_norm: f64,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Shape a raw normalised demand against the previous shaper state, stepping
/// the state forward by `dt_s` seconds.
pub fn shape(
    state: ShaperState,
    x_norm: f64,
    y_norm: f64,
    omega_norm: f64,
    dt_s: f64,
    params: &Params,
) -> (ShaperState, ShapedDemand) {
    let input_dir_rad = y_norm.atan2(x_norm);
    let input_mag = x_norm.hypot(y_norm).min(1.0);

    // The direction slew rate scales inversely with the current magnitude, a
    // slow chassis may swing its demand direction faster than one at speed.
    let dir_slew_rads = if state.mag != 0.0 {
        params.direction_slew_rate_rads / state.mag
    } else {
        params.stationary_direction_slew_rads
    };

    let max_dir_step_rad = dir_slew_rads * dt_s;
    let max_mag_step = params.magnitude_slew_rate * dt_s;

    let angle_dif_rad = ang_diff(input_dir_rad, state.dir_rad);

    let (dir_rad, mag) = if angle_dif_rad < SIMILAR_DIR_LIMIT_RAD {
        // Demand close to the current direction, track it
        (
            step_towards_circular(state.dir_rad, input_dir_rad, max_dir_step_rad),
            step_towards(state.mag, input_mag, max_mag_step),
        )
    } else if angle_dif_rad > REVERSAL_DIR_LIMIT_RAD {
        // Near reversal, decelerate to rest first and only then flip
        if state.mag > params.reversal_mag_threshold {
            (state.dir_rad, step_towards(state.mag, 0.0, max_mag_step))
        } else {
            (
                wrap_angle(state.dir_rad + std::f64::consts::PI),
                step_towards(state.mag, input_mag, max_mag_step),
            )
        }
    } else {
        // Demand well off the current direction but short of a reversal,
        // bleed the magnitude off while the direction comes round
        (
            step_towards_circular(state.dir_rad, input_dir_rad, max_dir_step_rad),
            step_towards(state.mag, 0.0, max_mag_step),
        )
    };

    let mag = clamp(&mag, &0.0, &1.0);
    let rot = clamp(
        &step_towards(state.rot, omega_norm, params.rotational_slew_rate * dt_s),
        &-1.0,
        &1.0,
    );

    let new_state = ShaperState { dir_rad, mag, rot };

    let demand = ShapedDemand {
        x_norm: mag * dir_rad.cos(),
        y_norm: mag * dir_rad.sin(),
        omega_norm: rot,
    };

    (new_state, demand)
}
