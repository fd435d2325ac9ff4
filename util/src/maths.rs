//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Clamp a value between a minimum and a maximum.
pub fn clamp<T>(value: &T, min: &T, max: &T) -> T
where
    T: Float,
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()`, violating the mathematical definition, if
/// `self` is much smaller than `rhs.abs()` in magnitude and `self < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float,
{
    let r = lhs % rhs;
    if r < T::from(0.0).unwrap() {
        r + rhs.abs()
    } else {
        r
    }
}

/// Normalise an angle into the range `(-pi, pi]`.
pub fn wrap_angle<T>(angle: T) -> T
where
    T: Float,
{
    let pi_t: T = T::from(std::f64::consts::PI).unwrap();
    let tau_t: T = T::from(std::f64::consts::TAU).unwrap();

    let wrapped = rem_euclid(angle, tau_t);

    if wrapped > pi_t {
        wrapped - tau_t
    } else {
        wrapped
    }
}

/// Get the unsigned shortest angular distance between two angles.
///
/// The result is in the range `[0, pi]` and is invariant to adding multiples
/// of 2pi to either input.
pub fn ang_diff<T>(a: T, b: T) -> T
where
    T: Float,
{
    let pi_t: T = T::from(std::f64::consts::PI).unwrap();
    let tau_t: T = T::from(std::f64::consts::TAU).unwrap();

    let dist = rem_euclid(a - b, tau_t);

    if dist > pi_t {
        tau_t - dist
    } else {
        dist
    }
}

/// Step a value towards a target, moving at most `max_step`.
///
/// Returns the target unchanged if it is already within `max_step` of the
/// current value.
pub fn step_towards<T>(current: T, target: T, max_step: T) -> T
where
    T: Float,
{
    if (target - current).abs() <= max_step {
        target
    } else if target > current {
        current + max_step
    } else {
        current - max_step
    }
}

/// Step an angle towards a target along the shorter arc, moving at most
/// `max_step` radians.
///
/// Returns the target unchanged if it is already within `max_step` of the
/// current angle. Stepped results are wrapped into `(-pi, pi]`.
pub fn step_towards_circular<T>(current: T, target: T, max_step: T) -> T
where
    T: Float,
{
    if ang_diff(current, target) <= max_step {
        return target;
    }

    // The sign of the wrapped difference gives the direction of the shorter
    // arc
    let signed_dif = wrap_angle(target - current);

    if signed_dif > T::zero() {
        wrap_angle(current + max_step)
    } else {
        wrap_angle(current - max_step)
    }
}
