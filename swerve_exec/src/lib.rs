//! Swerve chassis control library
//!
//! Provides the modules used by the swerve executive: drive control (command
//! shaping, inverse kinematics, desaturation and per-module optimisation),
//! odometry, the equipment abstraction and the drive script interpreter.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod data_store;
pub mod drive_ctrl;
pub mod eqpt;
pub mod odom;
pub mod script;
