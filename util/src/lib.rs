//! Utility library for the Swerve Chassis Software
//!
//! Provides the infrastructure shared by all executables: logging, parameter
//! loading, session management, CSV archiving, maths helpers and the cyclic
//! module trait.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod archive;
pub mod host;
pub mod logger;
pub mod maths;
pub mod module;
pub mod params;
pub mod session;
pub mod time;
