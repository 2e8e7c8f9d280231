//! # zkWASM Harness Core
//!
//! Deterministic host harness for sandboxed WebAssembly guests whose
//! execution is later attested by a zero-knowledge proof.
//!
//! The crate is designed to be:
//! - **Deterministic**: same module, public input and preimage always give
//!   the same output sequence
//! - **Narrow**: the guest sees the outside world only through the
//!   intrinsics table
//! - **Fail-fast**: every failure ends the run; nothing is retried
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  ModuleLoader   │ ── wasm bytes -> LoadedModule
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐      ┌──────────────────┐
//! │ ExecutionDriver │ ◄─── │  HostIntrinsics  │ ── public input,
//! └────────┬────────┘      └──────────────────┘    preimage reader,
//!          │                                       output channels
//!          ▼
//! ┌─────────────────┐
//! │    RunReport    │ ── status, outputs, commitment
//! └─────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use zkwasm_harness_core::prelude::*;
//!
//! let module = ModuleLoader::load("guest.wasm")?;
//! let config = HarnessConfig::default();
//! let reader = config.reader(Preimage::load("preimage.bin")?);
//! let intrinsics = HostIntrinsics::new(PublicInput(5), reader, std::io::stdout(), std::io::stdout());
//!
//! let report = ExecutionDriver::new(config).execute(&module, intrinsics)?;
//! println!("{}", report.outputs.render_hex());
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Shared type definitions
//! - [`errors`] - Error taxonomy and Result alias
//! - [`hashing`] - Keccak256 and run commitment
//! - [`input`] - Public input, preimage and its reader
//! - [`output`] - Output sequence, channels and run report
//! - [`intrinsics`] - Host intrinsics table
//! - [`loader`] - Module loader
//! - [`driver`] - Execution driver

pub mod driver;
pub mod errors;
pub mod hashing;
pub mod input;
pub mod intrinsics;
pub mod loader;
pub mod output;
pub mod types;

// Re-exports for convenience
pub use driver::{ExecutionDriver, HarnessConfig, InstantiatedRun, DEFAULT_ENTRY_POINT};
pub use errors::{FailureKind, HarnessError, Result};
pub use hashing::{compute_commitment, keccak256};
pub use input::{Preimage, PreimageReader, PublicInput, ShortReadPolicy};
pub use intrinsics::{HostAbort, HostIntrinsics, OUTPUT_MARKER};
pub use loader::{ImportSpec, LoadedModule, ModuleInfo, ModuleLoader};
pub use output::{OutputSequence, RunCommitment, RunReport, RunStatus, SharedBuffer};
pub use types::{Hash, Word};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        ExecutionDriver, FailureKind, HarnessConfig, HarnessError, Hash, HostIntrinsics,
        LoadedModule, ModuleLoader, OutputSequence, Preimage, PublicInput, Result, RunReport,
        RunStatus, SharedBuffer, ShortReadPolicy,
    };
}

#[cfg(test)]
mod integration_tests {
    use super::prelude::*;
    use super::OUTPUT_MARKER;

    /// One export per scenario; the entry point picks which one runs
    const ECHO_GUEST: &str = r#"
        (module
            (import "env" "wasm_input" (func $input (param i32) (result i64)))
            (import "env" "wasm_output" (func $output (param i64)))
            (import "env" "require" (func $require (param i32)))
            (import "env" "wasm_dbg_char" (func $dbg_char (param i64)))
            (func (export "echo_public") (result i64)
                (call $output (call $input (i32.const 1)))
                (i64.const 0))
            (func (export "echo_private")
                (call $output (call $input (i32.const 0))))
            (func (export "echo_private_twice")
                (call $output (call $input (i32.const 0)))
                (call $output (call $input (i32.const 0))))
            (func (export "public_stable")
                (call $require
                    (i64.eq (call $input (i32.const 1)) (call $input (i32.const 1))))
                (call $output (call $input (i32.const 1))))
            (func (export "fail_first")
                (call $require (i32.const 0))
                (call $output (i64.const 1)))
            (func (export "fail_after_emit")
                (call $output (i64.const 1))
                (call $require (i32.const 1))
                (call $output (i64.const 2))
                (call $require (i32.const 0))
                (call $output (i64.const 3)))
            (func (export "hello")
                (call $dbg_char (i64.const 104))
                (call $dbg_char (i64.const 105))
                (call $output (i64.const 10))))
    "#;

    struct Run {
        report: RunReport,
        output: SharedBuffer,
        diagnostics: SharedBuffer,
    }

    fn run_with(entry: &str, public: u64, preimage: Preimage, policy: ShortReadPolicy) -> Run {
        let bytes = wat::parse_str(ECHO_GUEST).unwrap();
        let module = ModuleLoader::from_bytes("echo", &bytes).unwrap();

        let config = HarnessConfig::default()
            .with_entry_point(entry)
            .with_short_read(policy);
        let output = SharedBuffer::new();
        let diagnostics = SharedBuffer::new();
        let intrinsics = HostIntrinsics::new(
            PublicInput(public),
            config.reader(preimage),
            output.clone(),
            diagnostics.clone(),
        );

        let report = ExecutionDriver::new(config)
            .execute(&module, intrinsics)
            .unwrap();
        Run {
            report,
            output,
            diagnostics,
        }
    }

    fn run(entry: &str, public: u64, preimage: Preimage) -> Run {
        run_with(entry, public, preimage, ShortReadPolicy::Fail)
    }

    /// Public size 5, eight zero bytes of preimage, emit the public input
    #[test]
    fn test_public_input_scenario() {
        let run = run("echo_public", 5, Preimage::new(vec![0u8; 8]));

        assert!(run.report.is_success());
        assert_eq!(run.report.exit_code(), 0);
        assert_eq!(run.output.contents_string(), "0000000000000005");
        assert_eq!(run.diagnostics.contents_string(), OUTPUT_MARKER);
        assert_eq!(run.report.entry_result, Some(0));
        assert_eq!(run.report.preimage_consumed, 0);
    }

    /// Preimage holding -1 big-endian, emit the private read
    #[test]
    fn test_private_input_scenario() {
        let run = run("echo_private", 0, Preimage::new(vec![0xff; 8]));

        assert!(run.report.is_success());
        assert_eq!(run.output.contents_string(), "ffffffffffffffff");
        assert_eq!(run.report.preimage_consumed, 8);
    }

    #[test]
    fn test_private_reads_are_ordered() {
        let preimage = Preimage::from_records(&[0x0102030405060708, -2]);
        let first = run("echo_private_twice", 0, preimage.clone());
        let second = run("echo_private_twice", 0, preimage);

        assert_eq!(
            first.output.contents_string(),
            "0102030405060708fffffffffffffffe"
        );
        assert_eq!(first.report.outputs, second.report.outputs);
        assert_eq!(first.report.commitment, second.report.commitment);
    }

    #[test]
    fn test_public_input_is_repeatable() {
        let run = run("public_stable", u64::MAX, Preimage::default());
        assert!(run.report.is_success());
        assert_eq!(run.report.outputs.values(), &[u64::MAX]);
    }

    /// `require(0)` before any emit: non-zero exit, empty output
    #[test]
    fn test_assert_before_emit_scenario() {
        let run = run("fail_first", 0, Preimage::default());

        assert!(matches!(
            run.report.status,
            RunStatus::Aborted {
                kind: FailureKind::AssertionFailure,
                ..
            }
        ));
        assert_ne!(run.report.exit_code(), 0);
        assert!(run.output.contents().is_empty());
        assert!(run.diagnostics.contents().is_empty());
        assert!(run.report.outputs.is_empty());
    }

    #[test]
    fn test_assert_keeps_emitted_prefix() {
        let run = run("fail_after_emit", 0, Preimage::default());

        assert_eq!(run.report.exit_code(), FailureKind::AssertionFailure.exit_code());
        assert_eq!(run.report.outputs.values(), &[1, 2]);
        assert_eq!(
            run.output.contents_string(),
            "00000000000000010000000000000002"
        );
    }

    #[test]
    fn test_hex_length_tracks_emit_count() {
        let run = run("echo_private_twice", 0, Preimage::from_records(&[1, 2]));
        assert_eq!(
            run.output.contents_string().len(),
            16 * run.report.outputs.len()
        );
        assert_eq!(run.report.outputs.render_hex(), run.output.contents_string());
    }

    #[test]
    fn test_debug_chars_go_to_diagnostics() {
        let run = run("hello", 0, Preimage::default());

        assert_eq!(
            run.diagnostics.contents_string(),
            format!("hi{OUTPUT_MARKER}")
        );
        assert_eq!(run.output.contents_string(), "000000000000000a");
        assert_eq!(run.report.outputs.values(), &[10]);
    }

    #[test]
    fn test_short_preimage_fails_by_default() {
        let run = run("echo_private_twice", 0, Preimage::from_records(&[7]));

        assert!(matches!(
            run.report.status,
            RunStatus::Aborted {
                kind: FailureKind::OutOfBoundsPreimageRead,
                ..
            }
        ));
        assert_eq!(run.report.outputs.values(), &[7]);
        assert_eq!(run.report.preimage_consumed, 8);
    }

    #[test]
    fn test_short_preimage_zero_padded_on_request() {
        let run = run_with(
            "echo_private_twice",
            0,
            Preimage::new(vec![0, 0, 0, 0, 0, 0, 0, 7, 0xab]),
            ShortReadPolicy::ZeroPad,
        );

        assert!(run.report.is_success());
        assert_eq!(run.report.outputs.values(), &[7, 0xab00_0000_0000_0000]);
        assert_eq!(run.report.preimage_consumed, 16);
    }

    #[test]
    fn test_loading_same_file_twice() {
        let dir = std::env::temp_dir().join(format!("zkwasm-core-load-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("echo.wasm");
        std::fs::write(&path, wat::parse_str(ECHO_GUEST).unwrap()).unwrap();

        let a = ModuleLoader::load(&path).unwrap();
        let b = ModuleLoader::load(&path).unwrap();
        assert_eq!(a.info(), b.info());
        assert_eq!(a.info().imports.len(), 4);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
