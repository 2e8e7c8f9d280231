//! Execution output types for the zkWASM harness
//!
//! Represents what a run leaves behind: the emitted value sequence, the
//! run status, and the commitment the proving side binds to.

use crate::errors::{FailureKind, HarnessError};
use crate::hashing::{compute_commitment, keccak256};
use crate::input::PublicInput;
use crate::types::{Hash, Word, HEX_WIDTH};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};

/// Render one emitted value as 16 lowercase hex digits, big-endian
pub fn render_word(value: Word) -> String {
    hex::encode(value.to_be_bytes())
}

/// Append-only sequence of values emitted by the guest
///
/// The first-emission flag lives here, so it is scoped to a single run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSequence {
    values: Vec<Word>,
}

impl OutputSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value; returns `true` if this was the first emission of the run
    pub fn push(&mut self, value: Word) -> bool {
        self.values.push(value);
        self.values.len() == 1
    }

    pub fn values(&self) -> &[Word] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Concatenated hex rendering, exactly `16 * len()` characters
    pub fn render_hex(&self) -> String {
        let mut out = String::with_capacity(self.values.len() * HEX_WIDTH);
        for value in &self.values {
            out.push_str(&render_word(*value));
        }
        out
    }

    /// Big-endian byte image of the sequence
    pub fn to_bytes(&self) -> Vec<u8> {
        self.values.iter().flat_map(|v| v.to_be_bytes()).collect()
    }

    /// Keccak256 of the big-endian byte image
    pub fn hash(&self) -> Hash {
        keccak256(&self.to_bytes())
    }
}

/// In-memory channel that can be handed to the harness and read back later
///
/// Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        // A poisoned buffer still holds every byte written before the panic
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn contents(&self) -> Vec<u8> {
        self.lock().clone()
    }

    /// Contents decoded as UTF-8, lossily
    pub fn contents_string(&self) -> String {
        String::from_utf8_lossy(&self.lock()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run result status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum RunStatus {
    /// Entry point returned normally
    Completed,
    /// A host abort or guest trap ended the run
    Aborted { kind: FailureKind, message: String },
}

impl RunStatus {
    pub fn aborted(err: &HarnessError) -> Self {
        RunStatus::Aborted {
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, RunStatus::Completed)
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, RunStatus::Aborted { .. })
    }

    /// Process exit status: 0 on completion
    pub fn exit_code(&self) -> u8 {
        match self {
            RunStatus::Completed => 0,
            RunStatus::Aborted { kind, .. } => kind.exit_code(),
        }
    }
}

/// Commitment binding a run's inputs to its outputs
///
/// # Structure
/// - `preimage_hash`: Keccak256 of the preimage bytes
/// - `output_hash`: Keccak256 of the emitted values, big-endian
/// - `commitment`: Keccak256(public_input || preimage_hash || output_hash)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunCommitment {
    pub preimage_hash: Hash,
    pub output_hash: Hash,
    pub commitment: Hash,
}

impl RunCommitment {
    pub fn new(public_input: PublicInput, preimage_hash: Hash, output_hash: Hash) -> Self {
        let commitment = compute_commitment(public_input.value(), &preimage_hash, &output_hash);
        Self {
            preimage_hash,
            output_hash,
            commitment,
        }
    }

    /// Verify that this commitment matches the given run inputs and outputs
    pub fn verify(
        &self,
        public_input: PublicInput,
        preimage_hash: &Hash,
        output_hash: &Hash,
    ) -> bool {
        self.preimage_hash == *preimage_hash
            && self.output_hash == *output_hash
            && self.commitment
                == compute_commitment(public_input.value(), preimage_hash, output_hash)
    }
}

/// Everything a finished run reports back
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    #[serde(flatten)]
    pub status: RunStatus,
    pub public_input: PublicInput,
    /// Values emitted before the run ended; a true prefix on abort
    pub outputs: OutputSequence,
    /// Preimage bytes consumed by private reads
    pub preimage_consumed: usize,
    /// Value returned by an `() -> i64` entry point
    pub entry_result: Option<i64>,
    pub commitment: RunCommitment,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.status.is_completed()
    }

    pub fn exit_code(&self) -> u8 {
        self.status.exit_code()
    }
}
