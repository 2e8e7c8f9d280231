//! Host intrinsics table
//!
//! The only path by which a guest observes input or produces output. The
//! table is a plain capability object: the driver binds its methods to the
//! guest's imports, and tests can drive it directly without a wasm engine.
//!
//! Once any intrinsic aborts, the table stays aborted and every later call
//! fails with the same abort.

use crate::errors::{FailureKind, HarnessError};
use crate::input::{PreimageReader, PublicInput};
use crate::output::{render_word, OutputSequence};
use crate::types::Word;
use std::fmt;
use std::io::Write;

/// Import names the guest links against, all in the `env` namespace
pub mod names {
    pub const MODULE: &str = "env";
    /// `(i32 is_public) -> i64`
    pub const INPUT: &str = "wasm_input";
    /// `(i64) -> ()`
    pub const OUTPUT: &str = "wasm_output";
    /// `(i32) -> ()`
    pub const REQUIRE: &str = "require";
    /// `(i64) -> ()`
    pub const DEBUG_CHAR: &str = "wasm_dbg_char";
    /// `(i64) -> ()`
    pub const DEBUG_VALUE: &str = "wasm_dbg";
}

/// Written to the diagnostic channel before the first emitted value
pub const OUTPUT_MARKER: &str = "output: ";

/// Abort raised by an intrinsic
///
/// A cheap, cloneable summary of the recorded `HarnessError`; the driver
/// turns it into a guest trap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostAbort {
    pub kind: FailureKind,
    pub message: String,
}

impl From<&HarnessError> for HostAbort {
    fn from(err: &HarnessError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for HostAbort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for HostAbort {}

pub type IntrinsicResult<T> = core::result::Result<T, HostAbort>;

/// Per-run host state behind the guest's imports
pub struct HostIntrinsics {
    public: PublicInput,
    reader: PreimageReader,
    outputs: OutputSequence,
    output: Box<dyn Write + Send>,
    diagnostics: Box<dyn Write + Send>,
    abort: Option<HarnessError>,
}

impl fmt::Debug for HostIntrinsics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostIntrinsics")
            .field("public", &self.public)
            .field("cursor", &self.reader.cursor())
            .field("outputs", &self.outputs.len())
            .field("aborted", &self.abort.is_some())
            .finish()
    }
}

impl HostIntrinsics {
    /// Create the table for one run
    ///
    /// # Arguments
    /// * `public` - Public input returned by `wasm_input(1)`
    /// * `reader` - Preimage reader consumed by `wasm_input(0)`
    /// * `output` - Output channel for hex-rendered emitted values
    /// * `diagnostics` - Diagnostic channel for the marker and debug output
    pub fn new(
        public: PublicInput,
        reader: PreimageReader,
        output: impl Write + Send + 'static,
        diagnostics: impl Write + Send + 'static,
    ) -> Self {
        Self {
            public,
            reader,
            outputs: OutputSequence::new(),
            output: Box::new(output),
            diagnostics: Box::new(diagnostics),
            abort: None,
        }
    }

    /// `wasm_input(is_public)`: a non-zero flag selects the public input
    pub fn input(&mut self, is_public: i32) -> IntrinsicResult<i64> {
        if is_public != 0 {
            self.public_input().map(|v| v as i64)
        } else {
            self.private_input()
        }
    }

    /// The public input, unchanged for the whole run
    pub fn public_input(&self) -> IntrinsicResult<Word> {
        self.ensure_running()?;
        Ok(self.public.value())
    }

    /// Next 8-byte big-endian record of the preimage
    pub fn private_input(&mut self) -> IntrinsicResult<i64> {
        self.ensure_running()?;
        match self.reader.next_record() {
            Ok(record) => Ok(record),
            Err(err) => Err(self.abort(err)),
        }
    }

    /// `require(condition)`: zero aborts the run
    pub fn assert(&mut self, condition: i32) -> IntrinsicResult<()> {
        self.ensure_running()?;
        if condition == 0 {
            let emitted = self.outputs.len();
            return Err(self.abort(HarnessError::AssertionFailed { emitted }));
        }
        Ok(())
    }

    /// Append a value to the output sequence and flush its hex rendering
    pub fn emit(&mut self, value: Word) -> IntrinsicResult<()> {
        self.ensure_running()?;
        let first = self.outputs.is_empty();
        if let Err(err) = self.write_emission(value, first) {
            return Err(self.abort(HarnessError::OutputChannel(err)));
        }
        self.outputs.push(value);
        Ok(())
    }

    fn write_emission(&mut self, value: Word, first: bool) -> std::io::Result<()> {
        if first {
            self.diagnostics.write_all(OUTPUT_MARKER.as_bytes())?;
            self.diagnostics.flush()?;
        }
        self.output.write_all(render_word(value).as_bytes())?;
        self.output.flush()
    }

    /// Write the character with code point `value`, UTF-8 encoded, to the
    /// diagnostic channel
    ///
    /// Values that are not Unicode scalar values (surrogates, anything above
    /// `0x10ffff`) are written as U+FFFD.
    pub fn debug_char(&mut self, value: Word) -> IntrinsicResult<()> {
        self.ensure_running()?;
        let ch = debug_char_of(value);
        let mut buf = [0u8; 4];
        let written = self
            .diagnostics
            .write_all(ch.encode_utf8(&mut buf).as_bytes())
            .and_then(|_| self.diagnostics.flush());
        written.map_err(|err| self.abort(HarnessError::OutputChannel(err)))
    }

    /// Write `value` in decimal, newline-terminated, to the diagnostic channel
    pub fn debug_value(&mut self, value: Word) -> IntrinsicResult<()> {
        self.ensure_running()?;
        let written = writeln!(self.diagnostics, "{value}").and_then(|_| self.diagnostics.flush());
        written.map_err(|err| self.abort(HarnessError::OutputChannel(err)))
    }

    fn ensure_running(&self) -> IntrinsicResult<()> {
        match &self.abort {
            Some(err) => Err(HostAbort::from(err)),
            None => Ok(()),
        }
    }

    /// Record the first abort of the run and summarise it for the trap
    pub fn abort(&mut self, err: HarnessError) -> HostAbort {
        let abort = HostAbort::from(&err);
        tracing::warn!(
            kind = %abort.kind,
            emitted = self.outputs.len(),
            cursor = self.reader.cursor(),
            "run aborted: {}",
            abort.message
        );
        if self.abort.is_none() {
            self.abort = Some(err);
        }
        abort
    }

    pub fn is_aborted(&self) -> bool {
        self.abort.is_some()
    }

    /// Take the recorded abort, if any
    pub fn take_abort(&mut self) -> Option<HarnessError> {
        self.abort.take()
    }

    pub fn public(&self) -> PublicInput {
        self.public
    }

    pub fn outputs(&self) -> &OutputSequence {
        &self.outputs
    }

    pub fn reader(&self) -> &PreimageReader {
        &self.reader
    }
}

fn debug_char_of(value: Word) -> char {
    u32::try_from(value)
        .ok()
        .and_then(char::from_u32)
        .unwrap_or(char::REPLACEMENT_CHARACTER)
}
