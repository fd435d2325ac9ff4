//! Equipment abstraction
//!
//! Traits for the hardware the executive talks to (drive modules and the
//! heading sensor) plus the per-module angular offset handling. The control
//! and odometry modules only ever see chassis-frame angles, the offset of
//! each module's steering zero is applied and removed here at the equipment
//! boundary.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod sim;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use util::maths::wrap_angle;

use crate::drive_ctrl::ModuleTarget;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A measurement of a single drive module's state.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct ModuleMeasurement {
    /// Accumulated distance driven by the wheel.
    ///
    /// Units: metres
    pub position_m: f64,

    /// Current drive speed.
    ///
    /// Units: metres/second
    pub speed_ms: f64,

    /// Current steering angle.
    ///
    /// Units: radians
    pub angle_rad: f64,
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A single drive module's actuators and encoders.
pub trait ModuleActuator {
    /// Command the module to the given drive speed and steering angle, both
    /// in the module's own frame.
    fn set_target(&mut self, speed_ms: f64, angle_rad: f64);

    /// Read the module's current state, in the module's own frame.
    fn measurement(&self) -> ModuleMeasurement;
}

/// The chassis heading sensor.
pub trait HeadingSensor {
    /// Current heading, positive counter-clockwise viewed from above.
    ///
    /// Units: degrees
    fn heading_degrees(&self) -> f64;

    /// Current turn rate.
    ///
    /// Units: degrees/second
    fn turn_rate_degs(&self) -> f64;

    /// Zero the heading at the current orientation.
    fn reset(&mut self);
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

/// Wraps a module actuator with its steering zero offset, converting between
/// the chassis frame used by control and the module's own frame.
pub struct ModuleIo<A: ModuleActuator> {
    actuator: A,

    /// Offset of the module's steering zero from the chassis forward axis.
    ///
    /// Units: radians
    angular_offset_rad: f64,
}

impl<A: ModuleActuator> ModuleIo<A> {
    pub fn new(actuator: A, angular_offset_rad: f64) -> Self {
        Self {
            actuator,
            angular_offset_rad,
        }
    }

    /// Command the module to a chassis-frame target.
    pub fn set_target(&mut self, target: &ModuleTarget) {
        self.actuator.set_target(
            target.speed_ms,
            wrap_angle(target.angle_rad + self.angular_offset_rad),
        );
    }

    /// Read the module's state in the chassis frame.
    pub fn measurement(&self) -> ModuleMeasurement {
        let raw = self.actuator.measurement();
        ModuleMeasurement {
            angle_rad: wrap_angle(raw.angle_rad - self.angular_offset_rad),
            ..raw
        }
    }

    /// Direct access to the underlying actuator.
    pub fn actuator_mut(&mut self) -> &mut A {
        &mut self.actuator
    }
}
