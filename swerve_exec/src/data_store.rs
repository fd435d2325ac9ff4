//! # Data Store

use crate::{drive_ctrl, odom};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// True if this cycle falls on a 1Hz boundary
    pub is_1_hz_cycle: bool,

    // DriveCtrl
    pub drive_ctrl: drive_ctrl::DriveCtrl,
    pub drive_ctrl_input: drive_ctrl::InputData,
    pub drive_ctrl_output: drive_ctrl::OutputData,
    pub drive_ctrl_status_rpt: drive_ctrl::StatusReport,

    // Odometry
    pub odom: odom::Odometry,
    pub odom_input: odom::InputData,
    pub pose: odom::Pose,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle, and sets the 1Hz cycle flag.
    pub fn cycle_start(&mut self, cycle_frequency_hz: f64) {
        self.is_1_hz_cycle = self.num_cycles % (cycle_frequency_hz as u128) == 0;

        self.drive_ctrl_input = drive_ctrl::InputData::default();
        self.drive_ctrl_output = drive_ctrl::OutputData::default();
        self.drive_ctrl_status_rpt = drive_ctrl::StatusReport::default();
        self.odom_input = odom::InputData::default();
    }
}
