/*
Error types for the zkWASM harness
Every failure terminates the run; the kind decides the process exit status.
*/

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or running a guest module
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Module file missing or unreadable
    #[error("cannot read module {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Module bytes are not a valid WebAssembly module
    #[error("malformed module {label}: {reason}")]
    MalformedModule { label: String, reason: String },

    /// Preimage file missing or unreadable
    #[error("cannot read preimage {path}: {source}")]
    PreimageLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Imports, signatures or entry point do not match the intrinsics table
    #[error("instantiation failed: {0}")]
    Instantiation(String),

    /// Guest called `require(0)`
    #[error("assertion failed after {emitted} emitted value(s)")]
    AssertionFailed { emitted: usize },

    /// Private read past the end of the preimage buffer
    #[error("preimage read out of bounds: offset {offset} + 8 exceeds length {len}")]
    OutOfBoundsPreimageRead { offset: usize, len: usize },

    /// Guest trapped for a reason other than a host abort
    #[error("guest trapped: {0}")]
    Trap(String),

    /// Writing to the output or diagnostic channel failed
    #[error("output channel failed: {0}")]
    OutputChannel(#[from] std::io::Error),
}

/// Failure taxonomy as seen by the caller of the harness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    Load,
    Instantiation,
    AssertionFailure,
    OutOfBoundsPreimageRead,
    Trap,
    OutputChannel,
}

impl FailureKind {
    /// Process exit status for this kind of failure
    pub fn exit_code(&self) -> u8 {
        match self {
            FailureKind::Load => 2,
            FailureKind::Instantiation => 3,
            FailureKind::AssertionFailure => 4,
            FailureKind::OutOfBoundsPreimageRead => 5,
            FailureKind::Trap => 6,
            FailureKind::OutputChannel => 7,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Load => "load error",
            FailureKind::Instantiation => "instantiation error",
            FailureKind::AssertionFailure => "assertion failure",
            FailureKind::OutOfBoundsPreimageRead => "out-of-bounds preimage read",
            FailureKind::Trap => "guest trap",
            FailureKind::OutputChannel => "output channel error",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl HarnessError {
    pub fn kind(&self) -> FailureKind {
        match self {
            HarnessError::Load { .. }
            | HarnessError::MalformedModule { .. }
            | HarnessError::PreimageLoad { .. } => FailureKind::Load,
            HarnessError::Instantiation(_) => FailureKind::Instantiation,
            HarnessError::AssertionFailed { .. } => FailureKind::AssertionFailure,
            HarnessError::OutOfBoundsPreimageRead { .. } => FailureKind::OutOfBoundsPreimageRead,
            HarnessError::Trap(_) => FailureKind::Trap,
            HarnessError::OutputChannel(_) => FailureKind::OutputChannel,
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.kind().exit_code()
    }
}

/// Result type for harness operations
pub type Result<T> = core::result::Result<T, HarnessError>;
