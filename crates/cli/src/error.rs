//! Structured CLI errors with meaningful exit codes.
//!
//! Exit code scheme:
//! - 0:  success
//! - 2:  clap arg parse error (automatic, before our code runs)
//! - 10: animation error (unknown animation, failed tick, missing shape)
//! - 11: I/O error (snapshot, route table, seed file)
//! - 12: input error (bad params JSON, bad colors)
//! - 13: serialization error

use dotfield_core::AnimationError;
use std::fmt;

/// Errors produced by CLI operations, each mapped to a distinct exit code.
#[derive(Debug)]
pub enum CliError {
    Animation(AnimationError),
    Io(String),
    Input(String),
    Serialization(String),
}

impl CliError {
    /// Returns the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Animation(_) => 10,
            CliError::Io(_) => 11,
            CliError::Input(_) => 12,
            CliError::Serialization(_) => 13,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Animation(e) => write!(f, "{e}"),
            CliError::Io(msg) | CliError::Input(msg) | CliError::Serialization(msg) => {
                write!(f, "{msg}")
            }
        }
    }
}

impl From<AnimationError> for CliError {
    fn from(e: AnimationError) -> Self {
        match e {
            AnimationError::Io(msg) => CliError::Io(msg),
            AnimationError::InvalidParams(_) | AnimationError::InvalidColor(_) => {
                CliError::Input(e.to_string())
            }
            other => CliError::Animation(other),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Serialization(e.to_string())
    }
}
