//! Execution driver for the zkWASM harness
//!
//! Binds a loaded guest to the host intrinsics table and runs its entry
//! point exactly once. Runs are single-shot: `Loaded -> Instantiated ->
//! Running -> {Completed | Aborted}`, and nothing can be resumed.

use crate::errors::{HarnessError, Result};
use crate::input::{Preimage, PreimageReader, ShortReadPolicy};
use crate::intrinsics::{names, HostAbort, HostIntrinsics};
use crate::loader::LoadedModule;
use crate::output::{RunCommitment, RunReport, RunStatus};
use wasmi::core::{HostError, Trap, ValueType};
use wasmi::{Caller, InstancePre, Linker, Module, Store};

/// Default exported entry point
pub const DEFAULT_ENTRY_POINT: &str = "zkmain";

impl HostError for HostAbort {}

/// Return type of a bound intrinsic: a trap unwinds the guest
type HostResult<T> = core::result::Result<T, Trap>;

/// Run parameters that are not inputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Exported function invoked once per run
    pub entry_point: String,
    /// What a private read does past the end of the preimage
    pub short_read: ShortReadPolicy,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            entry_point: DEFAULT_ENTRY_POINT.to_string(),
            short_read: ShortReadPolicy::default(),
        }
    }
}

impl HarnessConfig {
    pub fn with_entry_point(mut self, entry_point: impl Into<String>) -> Self {
        self.entry_point = entry_point.into();
        self
    }

    pub fn with_short_read(mut self, short_read: ShortReadPolicy) -> Self {
        self.short_read = short_read;
        self
    }

    /// Reader over `preimage` honouring this config's bounds policy
    pub fn reader(&self, preimage: Preimage) -> PreimageReader {
        PreimageReader::new(preimage, self.short_read)
    }
}

/// Accepted entry point signatures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntrySignature {
    /// `() -> ()`
    Unit,
    /// `() -> i64`
    I64,
}

/// Execution driver
///
/// Holds no per-run state; every call to [`ExecutionDriver::instantiate`]
/// starts from a fresh store.
#[derive(Debug, Clone, Default)]
pub struct ExecutionDriver {
    config: HarnessConfig,
}

impl ExecutionDriver {
    pub fn new(config: HarnessConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Bind `module` to `intrinsics`
    ///
    /// Fails with `HarnessError::Instantiation` on unknown imports,
    /// signature mismatches, or a missing or ill-typed entry point. No guest
    /// code has run when this returns.
    pub fn instantiate(
        &self,
        module: &LoadedModule,
        intrinsics: HostIntrinsics,
    ) -> Result<InstantiatedRun> {
        let entry = entry_signature(module.module(), &self.config.entry_point)?;
        let linker = Self::build_linker(module)?;
        let short_read = intrinsics.reader().policy();

        let mut store = Store::new(module.engine(), intrinsics);
        let pre = linker
            .instantiate(&mut store, module.module())
            .map_err(link_err)?;

        tracing::debug!(
            module = module.label(),
            entry = %self.config.entry_point,
            on_short_read = %short_read,
            "module instantiated"
        );

        Ok(InstantiatedRun {
            store,
            pre,
            entry_point: self.config.entry_point.clone(),
            entry,
        })
    }

    /// Instantiate and run to completion or abort
    pub fn execute(&self, module: &LoadedModule, intrinsics: HostIntrinsics) -> Result<RunReport> {
        Ok(self.instantiate(module, intrinsics)?.run())
    }

    /// Register every intrinsic under the `env` namespace
    fn build_linker(module: &LoadedModule) -> Result<Linker<HostIntrinsics>> {
        let mut linker = <Linker<HostIntrinsics>>::new(module.engine());

        linker
            .func_wrap(
                names::MODULE,
                names::INPUT,
                |mut caller: Caller<'_, HostIntrinsics>, is_public: i32| -> HostResult<i64> {
                    caller.data_mut().input(is_public).map_err(Trap::from)
                },
            )
            .map_err(link_err)?;
        linker
            .func_wrap(
                names::MODULE,
                names::OUTPUT,
                |mut caller: Caller<'_, HostIntrinsics>, value: i64| -> HostResult<()> {
                    caller.data_mut().emit(value as u64).map_err(Trap::from)
                },
            )
            .map_err(link_err)?;
        linker
            .func_wrap(
                names::MODULE,
                names::REQUIRE,
                |mut caller: Caller<'_, HostIntrinsics>, condition: i32| -> HostResult<()> {
                    caller.data_mut().assert(condition).map_err(Trap::from)
                },
            )
            .map_err(link_err)?;
        linker
            .func_wrap(
                names::MODULE,
                names::DEBUG_CHAR,
                |mut caller: Caller<'_, HostIntrinsics>, value: i64| -> HostResult<()> {
                    caller.data_mut().debug_char(value as u64).map_err(Trap::from)
                },
            )
            .map_err(link_err)?;
        linker
            .func_wrap(
                names::MODULE,
                names::DEBUG_VALUE,
                |mut caller: Caller<'_, HostIntrinsics>, value: i64| -> HostResult<()> {
                    caller.data_mut().debug_value(value as u64).map_err(Trap::from)
                },
            )
            .map_err(link_err)?;

        Ok(linker)
    }
}

fn link_err(err: impl std::fmt::Display) -> HarnessError {
    HarnessError::Instantiation(err.to_string())
}

/// Resolve the entry point against the module's exports
fn entry_signature(module: &Module, name: &str) -> Result<EntrySignature> {
    let export = module
        .exports()
        .find(|export| export.name() == name)
        .ok_or_else(|| {
            HarnessError::Instantiation(format!("entry point `{name}` is not exported"))
        })?;
    let func = export.ty().func().ok_or_else(|| {
        HarnessError::Instantiation(format!("entry point `{name}` is not a function"))
    })?;

    if !func.params().is_empty() {
        return Err(HarnessError::Instantiation(format!(
            "entry point `{name}` must take no parameters"
        )));
    }
    match func.results() {
        [] => Ok(EntrySignature::Unit),
        [ValueType::I64] => Ok(EntrySignature::I64),
        _ => Err(HarnessError::Instantiation(format!(
            "entry point `{name}` must return nothing or a single i64"
        ))),
    }
}

/// A module bound to its intrinsics, not yet started
pub struct InstantiatedRun {
    store: Store<HostIntrinsics>,
    pre: InstancePre,
    entry_point: String,
    entry: EntrySignature,
}

impl InstantiatedRun {
    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    /// Run the guest once
    ///
    /// Any trap, host abort included, ends the run as `Aborted`; values
    /// emitted before it stay in the report.
    pub fn run(self) -> RunReport {
        let InstantiatedRun {
            mut store,
            pre,
            entry_point,
            entry,
        } = self;

        let outcome = Self::invoke(&mut store, pre, &entry_point, entry);
        Self::finish(store, outcome)
    }

    fn invoke(
        store: &mut Store<HostIntrinsics>,
        pre: InstancePre,
        entry_point: &str,
        entry: EntrySignature,
    ) -> core::result::Result<Option<i64>, String> {
        // Runs the module's start function, if it has one
        let instance = pre.start(&mut *store).map_err(|e| e.to_string())?;

        match entry {
            EntrySignature::Unit => {
                let func = instance
                    .get_typed_func::<(), ()>(&*store, entry_point)
                    .map_err(|e| e.to_string())?;
                func.call(&mut *store, ()).map_err(|e| e.to_string())?;
                Ok(None)
            }
            EntrySignature::I64 => {
                let func = instance
                    .get_typed_func::<(), i64>(&*store, entry_point)
                    .map_err(|e| e.to_string())?;
                let value = func.call(&mut *store, ()).map_err(|e| e.to_string())?;
                Ok(Some(value))
            }
        }
    }

    fn finish(
        store: Store<HostIntrinsics>,
        outcome: core::result::Result<Option<i64>, String>,
    ) -> RunReport {
        let mut host = store.into_data();

        let (status, entry_result) = match (host.take_abort(), outcome) {
            (Some(err), _) => (RunStatus::aborted(&err), None),
            (None, Ok(result)) => (RunStatus::Completed, result),
            (None, Err(trap)) => {
                let err = HarnessError::Trap(trap);
                tracing::warn!(kind = %err.kind(), "run aborted: {err}");
                (RunStatus::aborted(&err), None)
            }
        };

        let outputs = host.outputs().clone();
        let commitment = RunCommitment::new(
            host.public(),
            host.reader().preimage().hash(),
            outputs.hash(),
        );

        if status.is_completed() {
            tracing::info!(
                emitted = outputs.len(),
                preimage_consumed = host.reader().cursor(),
                "run completed"
            );
        }

        RunReport {
            status,
            public_input: host.public(),
            outputs,
            preimage_consumed: host.reader().cursor(),
            entry_result,
            commitment,
        }
    }
}
