//! Odometry module
//!
//! Integrates a field-frame pose estimate from the per-module wheel distance
//! deltas and the heading sensor. The heading itself is taken directly from
//! the sensor rather than integrated, only the translation is dead-reckoned.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::warn;
use serde::Serialize;

// Internal
use util::{
    archive::{Archived, Archiver},
    module::State,
    session::Session,
};

use crate::drive_ctrl::{forward_translation, NUM_MODULES};
use crate::eqpt::ModuleMeasurement;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A pose in the field frame.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct Pose {
    /// Units: metres
    pub x_m: f64,

    /// Units: metres
    pub y_m: f64,

    /// Units: radians
    pub heading_rad: f64,
}

/// Odometry module state.
#[derive(Default)]
pub struct Odometry {
    pose: Pose,

    /// Wheel positions at the previous cycle. `None` until the first cycle
    /// has captured a baseline, no delta can be formed before then.
    last_positions_m: Option<[f64; NUM_MODULES]>,

    arch_pose: Archiver,
}

/// Input data to the odometry module.
#[derive(Clone, Copy, Debug, Default)]
pub struct InputData {
    /// The measured state of each module, in the chassis frame.
    pub module_readings: [ModuleMeasurement; NUM_MODULES],

    /// The measured chassis heading in the field frame.
    ///
    /// Units: radians
    pub heading_rad: f64,
}

/// Status report from odometry processing. Odometry has no status of note.
#[derive(Clone, Copy, Debug, Default)]
pub struct StatusReport;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during Odometry operation.
#[derive(Debug, thiserror::Error)]
pub enum OdomError {
    #[error("Non-finite sensor input ({0})")]
    NonFiniteInput(&'static str),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for Odometry {
    type InitData = ();
    type InitError = std::convert::Infallible;

    type InputData = InputData;
    type OutputData = Pose;
    type StatusReport = StatusReport;
    type ProcError = OdomError;

    fn init(&mut self, _init_data: Self::InitData, session: &Session) -> Result<(), Self::InitError> {
        self.arch_pose = Archiver::from_path(session, "odom/pose.csv").unwrap_or_else(|e| {
            warn!("Could not create pose archiver: {}", e);
            Archiver::default()
        });

        Ok(())
    }

    /// Perform one cycle of odometry processing.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        if !input_data.heading_rad.is_finite() {
            return Err(OdomError::NonFiniteInput("heading"));
        }
        for reading in input_data.module_readings.iter() {
            if !reading.position_m.is_finite() || !reading.angle_rad.is_finite() {
                return Err(OdomError::NonFiniteInput("module reading"));
            }
        }

        let mut positions_m = [0.0; NUM_MODULES];
        for (pos, reading) in positions_m.iter_mut().zip(input_data.module_readings.iter()) {
            *pos = reading.position_m;
        }

        if let Some(last_positions_m) = self.last_positions_m {
            // Each wheel's distance delta along its steering direction gives
            // a chassis-frame displacement vector, the mean of which is the
            // chassis translation over the cycle
            let mut module_deltas_m = [(0.0, 0.0); NUM_MODULES];
            for ((delta, reading), last_m) in module_deltas_m
                .iter_mut()
                .zip(input_data.module_readings.iter())
                .zip(last_positions_m.iter())
            {
                let dist_m = reading.position_m - last_m;
                *delta = (
                    dist_m * reading.angle_rad.cos(),
                    dist_m * reading.angle_rad.sin(),
                );
            }

            let (dx_m, dy_m) = forward_translation(&module_deltas_m);

            // Rotate the chassis-frame translation into the field frame
            let (sin_h, cos_h) = self.pose.heading_rad.sin_cos();
            self.pose.x_m += dx_m * cos_h - dy_m * sin_h;
            self.pose.y_m += dx_m * sin_h + dy_m * cos_h;
        }

        self.pose.heading_rad = input_data.heading_rad;
        self.last_positions_m = Some(positions_m);

        Ok((self.pose, StatusReport))
    }
}

impl Odometry {
    /// Get the current pose estimate.
    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Reset the pose estimate, discarding the wheel position baseline so
    /// that no stale delta is applied on the next cycle.
    pub fn reset_pose(&mut self, pose: Pose) {
        self.pose = pose;
        self.last_positions_m = None;
    }
}

impl Archived for Odometry {
    fn write(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.arch_pose.serialise(self.pose)
    }
}
