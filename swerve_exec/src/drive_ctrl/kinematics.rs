//! Swerve kinematics
//!
//! Inverse kinematics from a chassis velocity to per-module targets, speed
//! desaturation, per-module steering optimisation and the forward solution
//! used by odometry.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use util::maths::wrap_angle;

use super::NUM_MODULES;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Position of a module centre in the chassis frame (X+ forward, Y+ left).
#[derive(Clone, Copy, Debug, Default)]
pub struct ModulePosition {
    /// Units: metres
    pub x_m: f64,

    /// Units: metres
    pub y_m: f64,
}

/// Target state for a single module.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct ModuleTarget {
    /// Drive speed, negative to run the wheel backwards.
    ///
    /// Units: metres/second
    pub speed_ms: f64,

    /// Steering angle from the chassis forward axis, positive towards Y+.
    ///
    /// Units: radians, in `(-pi, pi]`
    pub angle_rad: f64,
}

/// A chassis velocity in the chassis frame.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct ChassisVelocity {
    /// Units: metres/second
    pub x_ms: f64,

    /// Units: metres/second
    pub y_ms: f64,

    /// Positive counter-clockwise viewed from above.
    ///
    /// Units: radians/second
    pub omega_rads: f64,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Solve the inverse kinematics, giving the target for each module.
///
/// Each module's velocity is the chassis translation plus the tangential
/// contribution of the rotation at the module's position:
///
/// `v_i = (v_x - omega * y_i, v_y + omega * x_i)`
pub fn inverse_kinematics(
    vel: &ChassisVelocity,
    positions: &[ModulePosition; NUM_MODULES],
) -> [ModuleTarget; NUM_MODULES] {
    let mut targets = [ModuleTarget::default(); NUM_MODULES];

    for (target, pos) in targets.iter_mut().zip(positions.iter()) {
        let vx_ms = vel.x_ms - vel.omega_rads * pos.y_m;
        let vy_ms = vel.y_ms + vel.omega_rads * pos.x_m;

        target.speed_ms = vx_ms.hypot(vy_ms);
        // A stationary module keeps an angle of zero, atan2(0, 0) is 0
        target.angle_rad = vy_ms.atan2(vx_ms);
    }

    targets
}

/// Scale all module speeds down uniformly so that none exceeds
/// `max_speed_ms`, preserving the ratio between them and therefore the
/// direction of chassis motion.
///
/// Returns true if the targets were scaled.
pub fn desaturate(targets: &mut [ModuleTarget; NUM_MODULES], max_speed_ms: f64) -> bool {
    let max_found_ms = targets
        .iter()
        .map(|t| t.speed_ms.abs())
        .fold(0.0, f64::max);

    if max_found_ms <= max_speed_ms {
        return false;
    }

    let scale = max_speed_ms / max_found_ms;

    for target in targets.iter_mut() {
        target.speed_ms *= scale;
    }

    true
}

/// Optimise a module target against the measured steering angle, reversing
/// the drive direction if doing so more than halves the steering travel.
///
/// A target exactly 90 degrees away is not flipped, either choice costs the
/// same travel and not flipping keeps the drive direction stable.
pub fn optimise(target: ModuleTarget, current_angle_rad: f64) -> ModuleTarget {
    let diff_rad = wrap_angle(target.angle_rad - current_angle_rad);

    if diff_rad.abs() > std::f64::consts::FRAC_PI_2 {
        ModuleTarget {
            speed_ms: -target.speed_ms,
            angle_rad: wrap_angle(target.angle_rad + std::f64::consts::PI),
        }
    } else {
        target
    }
}

/// Recover the chassis translation from per-module velocity vectors, given
/// as `(vx_ms, vy_ms)` pairs in the chassis frame.
///
/// The rotational contributions of the four modules cancel by symmetry, so
/// the translation is simply the mean of the module vectors. No chassis
/// geometry is needed, which lets odometry use wheel deltas directly.
pub fn forward_translation(module_vels: &[(f64, f64); NUM_MODULES]) -> (f64, f64) {
    let (sum_x, sum_y) = module_vels
        .iter()
        .fold((0.0, 0.0), |(sx, sy), (vx, vy)| (sx + vx, sy + vy));

    (sum_x / NUM_MODULES as f64, sum_y / NUM_MODULES as f64)
}

/// Solve the full forward kinematics, recovering the chassis velocity from
/// per-module states.
pub fn forward_kinematics(
    states: &[ModuleTarget; NUM_MODULES],
    positions: &[ModulePosition; NUM_MODULES],
) -> ChassisVelocity {
    let mut module_vels = [(0.0, 0.0); NUM_MODULES];
    for (vel, state) in module_vels.iter_mut().zip(states.iter()) {
        *vel = (
            state.speed_ms * state.angle_rad.cos(),
            state.speed_ms * state.angle_rad.sin(),
        );
    }

    let (x_ms, y_ms) = forward_translation(&module_vels);

    // Each module's angular rate estimate is the tangential component of its
    // velocity about the chassis centre over its radius
    let mut omega_sum_rads = 0.0;
    for ((vx_ms, vy_ms), pos) in module_vels.iter().zip(positions.iter()) {
        let r_sq_m = pos.x_m * pos.x_m + pos.y_m * pos.y_m;
        if r_sq_m > 0.0 {
            omega_sum_rads += (pos.x_m * vy_ms - pos.y_m * vx_ms) / r_sq_m;
        }
    }

    ChassisVelocity {
        x_ms,
        y_ms,
        omega_rads: omega_sum_rads / NUM_MODULES as f64,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::drive_ctrl::params::test::test_params;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "expected {} to be close to {}", a, b);
    }

    #[test]
    fn test_pure_translation() {
        let positions = test_params().module_positions();
        let vel = ChassisVelocity {
            x_ms: 1.5,
            y_ms: -0.5,
            omega_rads: 0.0,
        };

        let targets = inverse_kinematics(&vel, &positions);

        // All modules identical under pure translation
        for target in &targets {
            assert_close(target.speed_ms, 1.5f64.hypot(0.5));
            assert_close(target.angle_rad, (-0.5f64).atan2(1.5));
        }
    }

    #[test]
    fn test_pure_rotation() {
        let positions = test_params().module_positions();
        let vel = ChassisVelocity {
            x_ms: 0.0,
            y_ms: 0.0,
            omega_rads: 1.0,
        };

        let targets = inverse_kinematics(&vel, &positions);

        for (target, pos) in targets.iter().zip(positions.iter()) {
            let radius_m = pos.x_m.hypot(pos.y_m);

            // Speed is omega * r, direction perpendicular to the radius
            assert_close(target.speed_ms, radius_m);
            let radial_rad = pos.y_m.atan2(pos.x_m);
            assert_close(
                util::maths::ang_diff(target.angle_rad, radial_rad),
                FRAC_PI_2,
            );
        }
    }

    #[test]
    fn test_desaturate() {
        let mut targets = [
            ModuleTarget {
                speed_ms: 6.0,
                angle_rad: 0.0,
            },
            ModuleTarget {
                speed_ms: 3.0,
                angle_rad: 1.0,
            },
            ModuleTarget {
                speed_ms: -4.0,
                angle_rad: 2.0,
            },
            ModuleTarget {
                speed_ms: 1.5,
                angle_rad: 3.0,
            },
        ];

        assert!(desaturate(&mut targets, 4.8));

        // Ratios preserved, maximum now at the limit
        assert_close(targets[0].speed_ms, 4.8);
        assert_close(targets[1].speed_ms, 2.4);
        assert_close(targets[2].speed_ms, -3.2);
        assert_close(targets[3].speed_ms, 1.2);

        // Already under the limit, untouched
        let before = targets;
        assert!(!desaturate(&mut targets, 4.8));
        for (a, b) in targets.iter().zip(before.iter()) {
            assert_close(a.speed_ms, b.speed_ms);
        }
    }

    #[test]
    fn test_optimise() {
        let target = ModuleTarget {
            speed_ms: 2.0,
            angle_rad: 0.0,
        };

        // Within a quarter turn, unchanged
        let opt = optimise(target, 1.0);
        assert_close(opt.speed_ms, 2.0);
        assert_close(opt.angle_rad, 0.0);

        // Beyond a quarter turn, flipped
        let opt = optimise(target, 2.0);
        assert_close(opt.speed_ms, -2.0);
        assert_close(opt.angle_rad.abs(), PI);

        // Exactly a quarter turn, not flipped
        let opt = optimise(target, FRAC_PI_2);
        assert_close(opt.speed_ms, 2.0);
        assert_close(opt.angle_rad, 0.0);

        // Flip across the +-pi seam stays wrapped
        let seam = ModuleTarget {
            speed_ms: 1.0,
            angle_rad: PI - 0.1,
        };
        let opt = optimise(seam, -0.1);
        assert_close(opt.speed_ms, -1.0);
        assert_close(opt.angle_rad, -0.1);
    }

    #[test]
    fn test_forward_recovers_inverse() {
        let positions = test_params().module_positions();
        let vel = ChassisVelocity {
            x_ms: 1.2,
            y_ms: -0.7,
            omega_rads: 0.9,
        };

        let targets = inverse_kinematics(&vel, &positions);
        let recovered = forward_kinematics(&targets, &positions);

        assert_close(recovered.x_ms, vel.x_ms);
        assert_close(recovered.y_ms, vel.y_ms);
        assert_close(recovered.omega_rads, vel.omega_rads);
    }

    #[test]
    fn test_forward_translation_cancels_rotation() {
        let positions = test_params().module_positions();
        let vel = ChassisVelocity {
            x_ms: 0.0,
            y_ms: 0.0,
            omega_rads: 2.0,
        };

        let targets = inverse_kinematics(&vel, &positions);
        let mut module_vels = [(0.0, 0.0); NUM_MODULES];
        for (v, t) in module_vels.iter_mut().zip(targets.iter()) {
            *v = (
                t.speed_ms * t.angle_rad.cos(),
                t.speed_ms * t.angle_rad.sin(),
            );
        }

        let (x_ms, y_ms) = forward_translation(&module_vels);
        assert_close(x_ms, 0.0);
        assert_close(y_ms, 0.0);
    }
}
