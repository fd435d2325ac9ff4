//! Drive control state and cyclic processing

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{trace, warn};
use serde::Serialize;

// Internal
use util::{
    archive::{Archived, Archiver},
    module::State,
    params,
    session::Session,
};

use crate::eqpt::ModuleMeasurement;

use super::{
    desaturate, inverse_kinematics, optimise, shape, ChassisVelocity, DriveCmd, DriveCtrlError,
    ModulePosition, ModuleTarget, Params, ShapedDemand, ShaperState, NUM_MODULES,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Drive control module state.
#[derive(Default)]
pub struct DriveCtrl {
    params: Params,

    module_positions: [ModulePosition; NUM_MODULES],

    shaper_state: ShaperState,

    /// The manoeuvre currently being executed. Held between cycles so that
    /// the chassis keeps executing the last command when none arrives.
    current_cmd: Option<DriveCmd>,

    report: StatusReport,

    output: Option<OutputData>,

    arch_output: Archiver,
    arch_report: Archiver,
    arch_shaper: Archiver,
}

/// Input data to the drive control module.
#[derive(Clone, Copy, Debug, Default)]
pub struct InputData {
    /// A command to start executing this cycle, or `None` to continue the
    /// previous one.
    pub cmd: Option<DriveCmd>,

    /// The measured state of each module, in the chassis frame.
    pub module_readings: [ModuleMeasurement; NUM_MODULES],

    /// The measured chassis heading in the field frame.
    ///
    /// Units: radians
    pub heading_rad: f64,

    /// Time since the previous cycle.
    ///
    /// Units: seconds
    pub dt_s: f64,
}

/// Output data from the drive control module.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct OutputData {
    /// The target state for each module, in the chassis frame.
    pub targets: [ModuleTarget; NUM_MODULES],

    /// The chassis velocity implied by the targets, after desaturation.
    pub chassis_vel: ChassisVelocity,
}

/// Status report from drive control processing.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct StatusReport {
    /// True if a command was rejected this cycle.
    pub cmd_rejected: bool,

    /// True if the module speeds were desaturated this cycle.
    pub desaturated: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for DriveCtrl {
    type InitData = &'static str;
    type InitError = params::LoadError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = DriveCtrlError;

    /// Initialise the drive control module.
    ///
    /// Expects the path to the module's parameter file relative to the
    /// parameters directory.
    fn init(&mut self, init_data: Self::InitData, session: &Session) -> Result<(), Self::InitError> {
        self.params = params::load(init_data)?;
        self.module_positions = self.params.module_positions();

        self.arch_output = Archiver::from_path(session, "drive_ctrl/output.csv").unwrap_or_else(|e| {
            warn!("Could not create output archiver: {}", e);
            Archiver::default()
        });
        self.arch_report = Archiver::from_path(session, "drive_ctrl/report.csv").unwrap_or_else(|e| {
            warn!("Could not create report archiver: {}", e);
            Archiver::default()
        });
        self.arch_shaper = Archiver::from_path(session, "drive_ctrl/shaper.csv").unwrap_or_else(|e| {
            warn!("Could not create shaper archiver: {}", e);
            Archiver::default()
        });

        Ok(())
    }

    /// Perform one cycle of drive control processing.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        // Sensor inputs must be finite before any of them touch the shaper
        // state or the kinematics
        if !input_data.heading_rad.is_finite() {
            return Err(DriveCtrlError::NonFiniteInput("heading"));
        }
        if !input_data.dt_s.is_finite() {
            return Err(DriveCtrlError::NonFiniteInput("cycle period"));
        }
        for reading in input_data.module_readings.iter() {
            if !reading.angle_rad.is_finite()
                || !reading.speed_ms.is_finite()
                || !reading.position_m.is_finite()
            {
                return Err(DriveCtrlError::NonFiniteInput("module reading"));
            }
        }

        self.report = StatusReport::default();

        // Resolve the command to execute this cycle. A new valid command
        // replaces the held one, an invalid command is rejected and the
        // chassis is driven at zero demand for this cycle only, and no
        // command continues the held one (or stops if there is none).
        let cmd = match input_data.cmd {
            Some(cmd) if cmd.is_valid() => {
                self.current_cmd = Some(cmd);
                cmd
            }
            Some(cmd) => {
                warn!("Rejecting invalid drive command: {:?}", cmd);
                self.report.cmd_rejected = true;
                DriveCmd::Velocity {
                    x_norm: 0.0,
                    y_norm: 0.0,
                    omega_norm: 0.0,
                    field_relative: false,
                    rate_limit: false,
                }
            }
            None => self.current_cmd.unwrap_or(DriveCmd::Stop),
        };

        let targets = match cmd {
            DriveCmd::LockWheels => lock_targets(),
            DriveCmd::Stop => {
                // Hold the current steer angles at zero speed. The shaper
                // magnitude and rotation are zeroed so that a later velocity
                // command ramps up from rest.
                self.shaper_state.mag = 0.0;
                self.shaper_state.rot = 0.0;

                let mut targets = [ModuleTarget::default(); NUM_MODULES];
                for (target, reading) in targets.iter_mut().zip(input_data.module_readings.iter())
                {
                    target.angle_rad = reading.angle_rad;
                }
                targets
            }
            DriveCmd::Velocity {
                x_norm,
                y_norm,
                omega_norm,
                field_relative,
                rate_limit,
            } => {
                let demand = if rate_limit {
                    let (new_state, demand) = shape(
                        self.shaper_state,
                        x_norm,
                        y_norm,
                        omega_norm,
                        input_data.dt_s,
                        &self.params,
                    );
                    self.shaper_state = new_state;
                    demand
                } else {
                    // Unshaped demands still update the rotation so that a
                    // return to shaped driving does not jump
                    self.shaper_state.rot = omega_norm;
                    ShapedDemand {
                        x_norm,
                        y_norm,
                        omega_norm,
                    }
                };

                // Scale into physical units
                let x_ms = demand.x_norm * self.params.max_speed_ms;
                let y_ms = demand.y_norm * self.params.max_speed_ms;
                let omega_rads = demand.omega_norm * self.params.max_ang_speed_rads;

                // Rotate a field-relative translation into the chassis frame
                let (x_ms, y_ms) = if field_relative {
                    let (sin_h, cos_h) = input_data.heading_rad.sin_cos();
                    (x_ms * cos_h + y_ms * sin_h, -x_ms * sin_h + y_ms * cos_h)
                } else {
                    (x_ms, y_ms)
                };

                let vel = ChassisVelocity {
                    x_ms,
                    y_ms,
                    omega_rads,
                };

                let mut targets = inverse_kinematics(&vel, &self.module_positions);

                self.report.desaturated = desaturate(&mut targets, self.params.max_speed_ms);

                // Minimise steering travel against the measured angles
                for (target, reading) in targets.iter_mut().zip(input_data.module_readings.iter())
                {
                    *target = optimise(*target, reading.angle_rad);
                }

                targets
            }
        };

        let chassis_vel = match cmd {
            DriveCmd::Velocity { .. } => {
                super::forward_kinematics(&targets, &self.module_positions)
            }
            _ => ChassisVelocity::default(),
        };

        trace!(
            "DriveCtrl: cmd = {:?}, targets = {:?}, chassis_vel = {:?}",
            cmd,
            targets,
            chassis_vel
        );

        let output = OutputData {
            targets,
            chassis_vel,
        };
        self.output = Some(output);

        Ok((output, self.report))
    }
}

impl DriveCtrl {
    /// Build a drive control instance directly from parameters, without a
    /// parameter file or session. Archiving is disabled.
    pub fn with_params(params: Params) -> Self {
        let module_positions = params.module_positions();
        Self {
            params,
            module_positions,
            ..Default::default()
        }
    }
}

impl Archived for DriveCtrl {
    fn write(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.arch_output
            .serialise(self.output.unwrap_or_default())?;
        self.arch_report.serialise(self.report)?;
        self.arch_shaper.serialise(self.shaper_state)?;

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Targets locking the wheels in an X pattern at zero speed.
fn lock_targets() -> [ModuleTarget; NUM_MODULES] {
    use std::f64::consts::FRAC_PI_4;

    // Front left, front right, back left, back right. Each wheel points
    // along its chassis-centre diagonal.
    let angles_rad = [FRAC_PI_4, -FRAC_PI_4, -FRAC_PI_4, FRAC_PI_4];

    let mut targets = [ModuleTarget::default(); NUM_MODULES];
    for (target, angle_rad) in targets.iter_mut().zip(angles_rad.iter()) {
        target.angle_rad = *angle_rad;
    }

    targets
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::drive_ctrl::params::test::test_params;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "expected {} to be close to {}", a, b);
    }

    fn velocity_cmd(x_norm: f64, y_norm: f64, omega_norm: f64) -> DriveCmd {
        DriveCmd::Velocity {
            x_norm,
            y_norm,
            omega_norm,
            field_relative: false,
            rate_limit: false,
        }
    }

    #[test]
    fn test_full_throttle_forward() {
        let mut ctrl = DriveCtrl::with_params(test_params());
        let input = InputData {
            cmd: Some(velocity_cmd(1.0, 0.0, 0.0)),
            dt_s: 0.02,
            ..Default::default()
        };

        let (output, report) = ctrl.proc(&input).unwrap();

        // All modules straight ahead at max speed, no desaturation needed
        assert!(!report.desaturated);
        for target in &output.targets {
            assert_close(target.speed_ms, 4.8);
            assert_close(target.angle_rad, 0.0);
        }
        assert_close(output.chassis_vel.x_ms, 4.8);
        assert_close(output.chassis_vel.y_ms, 0.0);
    }

    #[test]
    fn test_combined_demand_desaturates() {
        let mut ctrl = DriveCtrl::with_params(test_params());
        let input = InputData {
            cmd: Some(velocity_cmd(1.0, 0.0, 1.0)),
            dt_s: 0.02,
            ..Default::default()
        };

        let (output, report) = ctrl.proc(&input).unwrap();

        assert!(report.desaturated);
        for target in &output.targets {
            assert!(target.speed_ms.abs() <= 4.8 + 1e-9);
        }
    }

    #[test]
    fn test_pure_rotation_perpendicular() {
        let params = test_params();
        let positions = params.module_positions();
        let mut ctrl = DriveCtrl::with_params(params);
        let input = InputData {
            cmd: Some(velocity_cmd(0.0, 0.0, 0.5)),
            dt_s: 0.02,
            ..Default::default()
        };

        let (output, _) = ctrl.proc(&input).unwrap();

        for (target, pos) in output.targets.iter().zip(positions.iter()) {
            let radial_rad = pos.y_m.atan2(pos.x_m);
            assert_close(
                util::maths::ang_diff(target.angle_rad, radial_rad),
                FRAC_PI_2,
            );
        }
    }

    #[test]
    fn test_field_relative_transform() {
        let mut ctrl = DriveCtrl::with_params(test_params());

        // Facing 90 degrees left in the field, a field-forward demand is a
        // chassis-rightward demand
        let input = InputData {
            cmd: Some(DriveCmd::Velocity {
                x_norm: 1.0,
                y_norm: 0.0,
                omega_norm: 0.0,
                field_relative: true,
                rate_limit: false,
            }),
            heading_rad: FRAC_PI_2,
            dt_s: 0.02,
            ..Default::default()
        };

        let (output, _) = ctrl.proc(&input).unwrap();

        assert_close(output.chassis_vel.x_ms, 0.0);
        assert_close(output.chassis_vel.y_ms, -4.8);
    }

    #[test]
    fn test_lock_wheels_pattern() {
        let mut ctrl = DriveCtrl::with_params(test_params());
        let input = InputData {
            cmd: Some(DriveCmd::LockWheels),
            dt_s: 0.02,
            ..Default::default()
        };

        let (output, _) = ctrl.proc(&input).unwrap();

        let expected_rad = [FRAC_PI_4, -FRAC_PI_4, -FRAC_PI_4, FRAC_PI_4];
        for (target, expected) in output.targets.iter().zip(expected_rad.iter()) {
            assert_close(target.speed_ms, 0.0);
            assert_close(target.angle_rad, *expected);
        }
    }

    #[test]
    fn test_stop_holds_angles() {
        let mut ctrl = DriveCtrl::with_params(test_params());
        let mut input = InputData {
            cmd: Some(DriveCmd::Stop),
            dt_s: 0.02,
            ..Default::default()
        };
        for (i, reading) in input.module_readings.iter_mut().enumerate() {
            reading.angle_rad = 0.1 * i as f64;
        }

        let (output, _) = ctrl.proc(&input).unwrap();

        for (i, target) in output.targets.iter().enumerate() {
            assert_close(target.speed_ms, 0.0);
            assert_close(target.angle_rad, 0.1 * i as f64);
        }
    }

    #[test]
    fn test_command_held_between_cycles() {
        let mut ctrl = DriveCtrl::with_params(test_params());
        let input = InputData {
            cmd: Some(velocity_cmd(0.5, 0.0, 0.0)),
            dt_s: 0.02,
            ..Default::default()
        };
        ctrl.proc(&input).unwrap();

        // No command this cycle, the previous one continues
        let input = InputData {
            cmd: None,
            dt_s: 0.02,
            ..Default::default()
        };
        let (output, _) = ctrl.proc(&input).unwrap();
        assert_close(output.chassis_vel.x_ms, 2.4);
    }

    #[test]
    fn test_no_command_ever_stops() {
        let mut ctrl = DriveCtrl::with_params(test_params());
        let input = InputData {
            cmd: None,
            dt_s: 0.02,
            ..Default::default()
        };

        let (output, _) = ctrl.proc(&input).unwrap();

        for target in &output.targets {
            assert_close(target.speed_ms, 0.0);
        }
    }

    #[test]
    fn test_invalid_command_rejected() {
        let mut ctrl = DriveCtrl::with_params(test_params());

        // Establish a held command first
        let input = InputData {
            cmd: Some(velocity_cmd(1.0, 0.0, 0.0)),
            dt_s: 0.02,
            ..Default::default()
        };
        ctrl.proc(&input).unwrap();

        // An invalid command is rejected and drives zero demand this cycle
        let input = InputData {
            cmd: Some(velocity_cmd(f64::NAN, 0.0, 0.0)),
            dt_s: 0.02,
            ..Default::default()
        };
        let (output, report) = ctrl.proc(&input).unwrap();
        assert!(report.cmd_rejected);
        assert_close(output.chassis_vel.x_ms, 0.0);
        for target in &output.targets {
            assert!(target.speed_ms.is_finite());
            assert!(target.angle_rad.is_finite());
        }

        // The held command was not replaced by the invalid one
        let input = InputData {
            cmd: None,
            dt_s: 0.02,
            ..Default::default()
        };
        let (output, _) = ctrl.proc(&input).unwrap();
        assert_close(output.chassis_vel.x_ms, 4.8);
    }

    #[test]
    fn test_non_finite_sensor_input() {
        let mut ctrl = DriveCtrl::with_params(test_params());
        let input = InputData {
            cmd: Some(velocity_cmd(1.0, 0.0, 0.0)),
            heading_rad: f64::NAN,
            dt_s: 0.02,
            ..Default::default()
        };

        assert!(matches!(
            ctrl.proc(&input),
            Err(DriveCtrlError::NonFiniteInput("heading"))
        ));
    }

    #[test]
    fn test_optimiser_uses_measured_angles() {
        let mut ctrl = DriveCtrl::with_params(test_params());

        // Modules measured facing backwards, so a forward demand runs the
        // wheels in reverse rather than steering half a turn
        let mut input = InputData {
            cmd: Some(velocity_cmd(1.0, 0.0, 0.0)),
            dt_s: 0.02,
            ..Default::default()
        };
        for reading in input.module_readings.iter_mut() {
            reading.angle_rad = std::f64::consts::PI;
        }

        let (output, _) = ctrl.proc(&input).unwrap();

        for target in &output.targets {
            assert_close(target.speed_ms, -4.8);
            assert_close(target.angle_rad.abs(), std::f64::consts::PI);
        }

        // The flipped targets still produce the same chassis velocity
        assert_close(output.chassis_vel.x_ms, 4.8);
    }
}
