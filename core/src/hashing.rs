//! Hashing utilities for the zkWASM harness
//!
//! Provides Keccak256 hashing for binding the preimage and the output
//! sequence to a run. All hashing functions are deterministic.

use crate::types::{Hash, B256};
use sha3::{Digest, Keccak256};

/// Compute Keccak256 hash of arbitrary data
///
/// # Arguments
/// * `data` - Byte slice to hash
///
/// # Returns
/// 32-byte Keccak256 hash
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    B256::from_slice(&hasher.finalize())
}

/// Compute the commitment binding a run's inputs to its outputs
///
/// `commitment = keccak256(public_input_be || preimage_hash || output_hash)`
///
/// # Arguments
/// * `public_input` - The public scalar the guest observed
/// * `preimage_hash` - Hash of the full preimage buffer
/// * `output_hash` - Hash of the emitted values, big-endian
pub fn compute_commitment(public_input: u64, preimage_hash: &Hash, output_hash: &Hash) -> Hash {
    hash_concat(&[
        &public_input.to_be_bytes(),
        preimage_hash.as_slice(),
        output_hash.as_slice(),
    ])
}

/// Hash multiple values together
///
/// Concatenates all byte slices and hashes the result.
pub fn hash_concat(values: &[&[u8]]) -> Hash {
    let mut hasher = Keccak256::new();
    for value in values {
        hasher.update(value);
    }
    B256::from_slice(&hasher.finalize())
}
