//! Execution input types for the zkWASM harness
//!
//! Defines the public and private inputs a guest can observe.
//! The public input is a single scalar known to the verifier; the private
//! input is the preimage, consumed front to back in 8-byte records.

use crate::errors::{HarnessError, Result};
use crate::hashing::keccak256;
use crate::types::{Hash, Word, RECORD_SIZE};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Public input supplied on the command line
///
/// Known to both prover and verifier. Immutable for the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PublicInput(pub Word);

impl PublicInput {
    pub fn value(&self) -> Word {
        self.0
    }
}

impl From<u64> for PublicInput {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// What a private read does when fewer than 8 bytes remain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShortReadPolicy {
    /// Abort the run with `OutOfBoundsPreimageRead`
    #[default]
    Fail,
    /// Fill the missing low-order bytes with zeros
    ZeroPad,
}

impl FromStr for ShortReadPolicy {
    type Err = String;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        match s {
            "fail" => Ok(ShortReadPolicy::Fail),
            "zero-pad" => Ok(ShortReadPolicy::ZeroPad),
            other => Err(format!(
                "unknown short-read policy `{other}` (expected `fail` or `zero-pad`)"
            )),
        }
    }
}

impl fmt::Display for ShortReadPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShortReadPolicy::Fail => f.write_str("fail"),
            ShortReadPolicy::ZeroPad => f.write_str("zero-pad"),
        }
    }
}

/// Immutable preimage bytes, loaded in full before the run starts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preimage {
    bytes: Vec<u8>,
}

impl Preimage {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Read the whole preimage file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| HarnessError::PreimageLoad {
            path: path.to_path_buf(),
            source,
        })?;
        let preimage = Self::new(bytes);
        if !preimage.is_record_aligned() {
            tracing::warn!(
                path = %path.display(),
                len = preimage.len(),
                "preimage length is not a multiple of 8; the last record is partial"
            );
        }
        Ok(preimage)
    }

    /// Build a preimage from whole records, big-endian encoded
    pub fn from_records(records: &[i64]) -> Self {
        let bytes = records.iter().flat_map(|r| r.to_be_bytes()).collect();
        Self::new(bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_record_aligned(&self) -> bool {
        self.bytes.len() % RECORD_SIZE == 0
    }

    /// Number of complete 8-byte records
    pub fn record_count(&self) -> usize {
        self.bytes.len() / RECORD_SIZE
    }

    /// Keccak256 of the raw bytes, bound into the run commitment
    pub fn hash(&self) -> Hash {
        keccak256(&self.bytes)
    }
}

/// Sequential reader over a preimage
///
/// Owns the single read cursor of a run. The cursor only moves forward,
/// by exactly one record per successful read.
#[derive(Debug, Clone)]
pub struct PreimageReader {
    preimage: Preimage,
    cursor: usize,
    policy: ShortReadPolicy,
}

impl PreimageReader {
    pub fn new(preimage: Preimage, policy: ShortReadPolicy) -> Self {
        Self {
            preimage,
            cursor: 0,
            policy,
        }
    }

    /// Read the next record as a signed big-endian integer
    ///
    /// Under `ShortReadPolicy::Fail` a short read leaves the cursor untouched.
    pub fn next_record(&mut self) -> Result<i64> {
        let len = self.preimage.len();
        let start = self.cursor;
        let end = start.checked_add(RECORD_SIZE);

        let mut record = [0u8; RECORD_SIZE];
        match end {
            Some(end) if end <= len => {
                record.copy_from_slice(&self.preimage.as_bytes()[start..end]);
            }
            _ => match self.policy {
                ShortReadPolicy::Fail => {
                    return Err(HarnessError::OutOfBoundsPreimageRead { offset: start, len })
                }
                ShortReadPolicy::ZeroPad => {
                    let available = &self.preimage.as_bytes()[start.min(len)..];
                    record[..available.len()].copy_from_slice(available);
                }
            },
        }

        self.cursor = start.saturating_add(RECORD_SIZE);
        Ok(i64::from_be_bytes(record))
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn policy(&self) -> ShortReadPolicy {
        self.policy
    }

    pub fn preimage(&self) -> &Preimage {
        &self.preimage
    }

    /// Bytes not yet consumed
    pub fn remaining(&self) -> usize {
        self.preimage.len().saturating_sub(self.cursor)
    }
}
