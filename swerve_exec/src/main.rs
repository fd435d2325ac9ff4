//! Swerve executive entry point.
//!
//! # Architecture
//!
//! The executive runs a fixed-cadence control loop:
//!
//!     - Initialise all modules
//!     - Main loop:
//!         - Equipment sensing (module encoders and heading sensor)
//!         - Drive script processing
//!         - Drive control processing
//!         - Actuation
//!         - Odometry processing
//!
//! All modules (e.g. `drive_ctrl`) provide a public struct implementing the
//! `util::module::State` trait and are owned by the `DataStore`.

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use swerve_lib::{
    data_store::DataStore,
    drive_ctrl,
    eqpt::{
        sim::{SimHeading, SimModule},
        HeadingSensor, ModuleIo,
    },
    odom,
    script::{PendingCmds, ScriptInterpreter},
};

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, info, warn};
use std::env;
use std::thread;
use std::time::{Duration, Instant};

// Internal
use util::{
    archive::Archived,
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target period of one cycle.
const CYCLE_PERIOD_S: f64 = 0.02;

/// Number of cycles per second
const CYCLE_FREQUENCY_HZ: f64 = 1.0 / CYCLE_PERIOD_S;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("swerve_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Swerve Chassis Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- INITIALISE SCRIPT ----

    // Collect all arguments
    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    // A single argument gives the drive script to execute
    if args.len() != 2 {
        return Err(eyre!("Expected one argument (the drive script path), found {}", args.len() - 1));
    }

    info!("Loading script from \"{}\"", &args[1]);

    let mut script = ScriptInterpreter::new(&args[1]).wrap_err("Failed to load script")?;

    info!(
        "Loaded script lasts {:.02} s and contains {} commands\n",
        script.duration_s(),
        script.num_cmds()
    );

    // ---- INITIALISE DATASTORE ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    // ---- INITIALISE MODULES ----

    ds.drive_ctrl
        .init("drive_ctrl.toml", &session)
        .wrap_err("Failed to initialise DriveCtrl")?;
    info!("DriveCtrl init complete");

    ds.odom.init((), &session).wrap_err("Failed to initialise Odometry")?;
    info!("Odometry init complete");

    info!("Module initialisation complete\n");

    // ---- INITIALISE EQUIPMENT ----

    // The simulated equipment stands in for the real drive modules and
    // heading sensor. The module offsets come from the same parameter file
    // used by drive control.
    let drive_params: drive_ctrl::Params =
        util::params::load("drive_ctrl.toml").wrap_err("Could not load drive parameters")?;

    let mut modules: Vec<ModuleIo<SimModule>> = drive_params
        .module_angular_offsets_rad
        .iter()
        .map(|&offset_rad| ModuleIo::new(SimModule::default(), offset_rad))
        .collect();

    let mut heading = SimHeading::default();

    info!("Equipment initialisation complete");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start(CYCLE_FREQUENCY_HZ);

        // ---- EQUIPMENT SENSING ----

        // Propagate the simulated equipment over one cycle
        for module in modules.iter_mut() {
            module.actuator_mut().step(CYCLE_PERIOD_S);
        }
        heading.step(CYCLE_PERIOD_S);

        for (reading, module) in ds
            .drive_ctrl_input
            .module_readings
            .iter_mut()
            .zip(modules.iter())
        {
            *reading = module.measurement();
        }

        ds.drive_ctrl_input.heading_rad = heading.heading_degrees().to_radians();
        ds.drive_ctrl_input.dt_s = CYCLE_PERIOD_S;

        // ---- SCRIPT PROCESSING ----

        match script.pending(util::session::get_elapsed_seconds()) {
            PendingCmds::None => (),
            PendingCmds::Some(cmds) => {
                // If multiple commands became due in one cycle the last wins
                for cmd in cmds {
                    info!("Executing scripted command: {:?}", cmd);
                    ds.drive_ctrl_input.cmd = Some(cmd);
                }
            }
            // Exit if end of script reached
            PendingCmds::EndOfScript => {
                info!("End of drive script reached, stopping");
                break;
            }
        }

        // ---- CONTROL ALGORITHM PROCESSING ----

        // DriveCtrl processing
        match ds.drive_ctrl.proc(&ds.drive_ctrl_input) {
            Ok((o, r)) => {
                ds.drive_ctrl_output = o;
                ds.drive_ctrl_status_rpt = r;
            }
            Err(e) => {
                // The previous cycle's targets remain in force
                warn!("Error during DriveCtrl processing: {}", e)
            }
        };

        // ---- ACTUATION ----

        for (module, target) in modules.iter_mut().zip(ds.drive_ctrl_output.targets.iter()) {
            module.set_target(target);
        }

        // The simulated heading sensor integrates the commanded chassis rate
        heading.set_rate_rads(ds.drive_ctrl_output.chassis_vel.omega_rads);

        // ---- ODOMETRY PROCESSING ----

        ds.odom_input.module_readings = ds.drive_ctrl_input.module_readings;
        ds.odom_input.heading_rad = ds.drive_ctrl_input.heading_rad;

        match ds.odom.proc(&ds.odom_input) {
            Ok((pose, _)) => ds.pose = pose,
            Err(e) => warn!("Error during Odometry processing: {}", e),
        };

        if ds.is_1_hz_cycle {
            info!(
                "Pose: x = {:.3} m, y = {:.3} m, heading = {:.3} rad",
                ds.pose.x_m, ds.pose.y_m, ds.pose.heading_rad
            );
        }

        // ---- WRITE ARCHIVES ----

        if let Err(e) = ds.drive_ctrl.write() {
            warn!("Could not write DriveCtrl archives: {}", e);
        }
        if let Err(e) = ds.odom.write() {
            warn!("Could not write Odometry archives: {}", e);
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match Duration::from_secs_f64(CYCLE_PERIOD_S).checked_sub(cycle_dur) {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            }
            None => {
                warn!("Cycle overran by {:.06} s", cycle_dur.as_secs_f64() - CYCLE_PERIOD_S);
                ds.num_consec_cycle_overruns += 1;
            }
        }

        // Increment cycle counter
        ds.num_cycles += 1;
    }

    // ---- SHUTDOWN ----

    info!("Final pose: {:?}", ds.pose);
    info!("End of execution");

    Ok(())
}
