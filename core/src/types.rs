//! Core type definitions for the zkWASM harness
//!
//! Uses alloy-primitives for the 32-byte digest type shared with the
//! proving side.

pub use alloy_primitives::B256;

/// 32-byte hash (Keccak256 output)
pub type Hash = B256;

/// A value crossing the intrinsic boundary (wasm `i64`, carried as raw bits)
pub type Word = u64;

/// Width in bytes of one preimage record
pub const RECORD_SIZE: usize = 8;

/// Number of hex characters used to render one emitted value
pub const HEX_WIDTH: usize = RECORD_SIZE * 2;
