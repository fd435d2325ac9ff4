//! Simulated equipment
//!
//! Idealised drive modules and heading sensor used by the executive in place
//! of real hardware. Targets are acquired instantly, the only dynamics are
//! the integration of wheel position and heading over the cycle period.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::{HeadingSensor, ModuleActuator, ModuleMeasurement};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A simulated drive module.
#[derive(Clone, Copy, Debug, Default)]
pub struct SimModule {
    position_m: f64,
    speed_ms: f64,
    angle_rad: f64,
}

/// A simulated heading sensor, driven by the commanded chassis angular rate.
#[derive(Clone, Copy, Debug, Default)]
pub struct SimHeading {
    heading_rad: f64,
    rate_rads: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimModule {
    /// Advance the wheel position by one timestep at the current speed.
    pub fn step(&mut self, dt_s: f64) {
        self.position_m += self.speed_ms * dt_s;
    }
}

impl ModuleActuator for SimModule {
    fn set_target(&mut self, speed_ms: f64, angle_rad: f64) {
        self.speed_ms = speed_ms;
        self.angle_rad = angle_rad;
    }

    fn measurement(&self) -> ModuleMeasurement {
        ModuleMeasurement {
            position_m: self.position_m,
            speed_ms: self.speed_ms,
            angle_rad: self.angle_rad,
        }
    }
}

impl SimHeading {
    /// Set the chassis angular rate the sensor integrates.
    ///
    /// Units: radians/second
    pub fn set_rate_rads(&mut self, rate_rads: f64) {
        self.rate_rads = rate_rads;
    }

    /// Advance the heading by one timestep at the current rate.
    pub fn step(&mut self, dt_s: f64) {
        self.heading_rad += self.rate_rads * dt_s;
    }
}

impl HeadingSensor for SimHeading {
    fn heading_degrees(&self) -> f64 {
        self.heading_rad.to_degrees()
    }

    fn turn_rate_degs(&self) -> f64 {
        self.rate_rads.to_degrees()
    }

    fn reset(&mut self) {
        self.heading_rad = 0.0;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_sim_module_integrates_position() {
        let mut module = SimModule::default();
        module.set_target(2.0, 0.3);

        for _ in 0..50 {
            module.step(0.02);
        }

        let meas = module.measurement();
        assert!((meas.position_m - 2.0).abs() < 1e-9);
        assert!((meas.speed_ms - 2.0).abs() < 1e-9);
        assert!((meas.angle_rad - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_sim_heading() {
        let mut heading = SimHeading::default();
        heading.set_rate_rads(std::f64::consts::PI);

        for _ in 0..50 {
            heading.step(0.02);
        }

        // One second at pi rad/s is 180 degrees
        assert!((heading.heading_degrees() - 180.0).abs() < 1e-9);
        assert!((heading.turn_rate_degs() - 180.0).abs() < 1e-9);

        heading.reset();
        assert!(heading.heading_degrees().abs() < 1e-9);
    }
}
