//! Drive script interpreter
//!
//! Drive scripts are plain text files of timestamped commands, one per line:
//!
//! ```text
//! 0.0: {"Velocity": {"x_norm": 1.0, "y_norm": 0.0, "omega_norm": 0.0,
//!       "field_relative": false, "rate_limit": true}};
//! 5.0: "Stop";
//! 6.0: "LockWheels";
//! ```
//!
//! The timestamp is the elapsed session time in seconds at which the command
//! becomes due, the payload is the JSON serialisation of a [`DriveCmd`].

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use regex::RegexBuilder;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use thiserror::Error;

// Internal
use crate::drive_ctrl::DriveCmd;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A command which is scripted to occur at a specific time.
struct ScriptedCmd {
    /// The elapsed session time the command is due at.
    exec_time_s: f64,

    cmd: DriveCmd,
}

/// A drive script interpreter.
///
/// After constructing with the script to run, poll `.pending` once per cycle
/// to acquire the commands that have become due.
pub struct ScriptInterpreter {
    cmds: VecDeque<ScriptedCmd>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Could not find the script at {0}")]
    ScriptNotFound(String),

    #[error("Could not load the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script contains no commands")]
    ScriptEmpty,

    #[error("Script contains an invalid timestamp: {0}. Should be a float (like 1.0)")]
    InvalidTimestamp(String),

    #[error("Script contains an invalid command at {0} s: {1}")]
    InvalidCmd(f64, serde_json::Error),
}

/// Commands which have become due.
pub enum PendingCmds {
    None,
    Some(Vec<DriveCmd>),
    EndOfScript,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ScriptInterpreter {
    /// Create a new interpreter from the given script path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {
        let path = script_path.as_ref();

        if !path.exists() {
            return Err(ScriptError::ScriptNotFound(
                path.to_string_lossy().to_string(),
            ));
        }

        let script = fs::read_to_string(path).map_err(ScriptError::ScriptLoadError)?;

        Self::from_str(&script)
    }

    /// Create a new interpreter from the script text itself.
    pub fn from_str(script: &str) -> Result<Self, ScriptError> {
        let mut cmds: VecDeque<ScriptedCmd> = VecDeque::new();

        // Each command is `<time>: <json payload>;`, the payload may span
        // lines but may not itself contain a semicolon
        let re = RegexBuilder::new(r"^\s*(\d+(\.\d+)?)\s*:\s*([^;]*);")
            .multi_line(true)
            .build()
            .unwrap();

        for cap in re.captures_iter(script) {
            let exec_time_s: f64 = cap
                .get(1)
                .unwrap()
                .as_str()
                .parse()
                .map_err(|e| ScriptError::InvalidTimestamp(format!("{}", e)))?;

            let cmd: DriveCmd = serde_json::from_str(cap.get(3).unwrap().as_str())
                .map_err(|e| ScriptError::InvalidCmd(exec_time_s, e))?;

            cmds.push_back(ScriptedCmd { exec_time_s, cmd });
        }

        if cmds.is_empty() {
            return Err(ScriptError::ScriptEmpty);
        }

        Ok(ScriptInterpreter { cmds })
    }

    /// Return the commands which have become due at the given elapsed time,
    /// or `EndOfScript` once the script is exhausted.
    pub fn pending(&mut self, current_time_s: f64) -> PendingCmds {
        if self.cmds.is_empty() {
            return PendingCmds::EndOfScript;
        }

        let mut due: Vec<DriveCmd> = vec![];

        while self
            .cmds
            .front()
            .map(|c| c.exec_time_s < current_time_s)
            .unwrap_or(false)
        {
            // The front element is known to exist
            if let Some(scripted) = self.cmds.pop_front() {
                due.push(scripted.cmd);
            }
        }

        if due.is_empty() {
            PendingCmds::None
        } else {
            PendingCmds::Some(due)
        }
    }

    /// Get the number of commands remaining in the script.
    pub fn num_cmds(&self) -> usize {
        self.cmds.len()
    }

    /// Get the length of the script in seconds.
    pub fn duration_s(&self) -> f64 {
        match self.cmds.back() {
            Some(c) => c.exec_time_s,
            None => 0.0,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const SCRIPT: &str = r#"
        # Drive forward, stop, then lock
        0.0: {"Velocity": {"x_norm": 1.0, "y_norm": 0.0, "omega_norm": 0.0,
            "field_relative": false, "rate_limit": true}};
        2.0: "Stop";
        3.0: "LockWheels";
    "#;

    #[test]
    fn test_parse_script() {
        let interp = ScriptInterpreter::from_str(SCRIPT).unwrap();
        assert_eq!(interp.num_cmds(), 3);
        assert!((interp.duration_s() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_pending_by_time() {
        let mut interp = ScriptInterpreter::from_str(SCRIPT).unwrap();

        // Just after start only the first command is due
        match interp.pending(0.01) {
            PendingCmds::Some(cmds) => {
                assert_eq!(cmds.len(), 1);
                assert!(matches!(cmds[0], DriveCmd::Velocity { .. }));
            }
            _ => panic!("expected one pending command"),
        }

        // Nothing due between commands
        assert!(matches!(interp.pending(1.0), PendingCmds::None));

        // Both remaining commands become due together
        match interp.pending(10.0) {
            PendingCmds::Some(cmds) => {
                assert_eq!(cmds.len(), 2);
                assert!(matches!(cmds[0], DriveCmd::Stop));
                assert!(matches!(cmds[1], DriveCmd::LockWheels));
            }
            _ => panic!("expected two pending commands"),
        }

        assert!(matches!(interp.pending(10.0), PendingCmds::EndOfScript));
    }

    #[test]
    fn test_empty_script_rejected() {
        assert!(matches!(
            ScriptInterpreter::from_str("# nothing here\n"),
            Err(ScriptError::ScriptEmpty)
        ));
    }

    #[test]
    fn test_invalid_payload_rejected() {
        assert!(matches!(
            ScriptInterpreter::from_str("1.0: {\"NotACmd\": 3};"),
            Err(ScriptError::InvalidCmd(_, _))
        ));
    }
}
