//! zkWASM Host CLI
//!
//! Loads a compiled guest module, feeds it a public input and a preimage
//! file, and streams the emitted values to standard output as hex.

mod io;

use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use zkwasm_harness_core::prelude::*;
use zkwasm_harness_core::DEFAULT_ENTRY_POINT;

/// Exit status when the run finished but its report could not be saved
const REPORT_FAILURE_EXIT: u8 = 1;

#[derive(Debug, Parser)]
#[command(name = "zkwasm-run")]
#[command(about = "Run a zkWASM guest module against a public input and a preimage")]
#[command(version)]
struct Cli {
    /// Compiled guest module (WebAssembly binary)
    module: PathBuf,

    /// Public input, visible to the guest through `wasm_input(1)`
    public_input: u64,

    /// Preimage file, consumed in 8-byte big-endian records by `wasm_input(0)`
    preimage: PathBuf,

    /// Exported function to invoke
    #[arg(long, env = "ZKWASM_ENTRY", default_value = DEFAULT_ENTRY_POINT)]
    entry: String,

    /// Behaviour of a private read past the end of the preimage: fail or zero-pad
    #[arg(long, env = "ZKWASM_ON_SHORT_READ", default_value = "fail")]
    on_short_read: ShortReadPolicy,

    /// Write a JSON run report to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn config(&self) -> HarnessConfig {
        HarnessConfig::default()
            .with_entry_point(self.entry.clone())
            .with_short_read(self.on_short_read)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let report = match execute(&cli, || Box::new(std::io::stdout())) {
        Ok(report) => report,
        Err(err) => {
            eprintln!("error: {}: {}", err.kind(), err);
            return ExitCode::from(err.exit_code());
        }
    };

    if let RunStatus::Aborted { kind, message } = &report.status {
        eprintln!("error: {kind}: {message}");
    }
    if cli.verbose {
        eprintln!("{}", io::format_summary(&report));
    }
    if let Some(path) = &cli.report {
        if let Err(err) = io::save_report_json(&report, path) {
            eprintln!("error: {err:#}");
            return ExitCode::from(REPORT_FAILURE_EXIT);
        }
    }

    ExitCode::from(report.exit_code())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

/// Load, instantiate and run the guest
///
/// `console` opens a handle on the channel that receives startup lines,
/// the hex output stream and guest diagnostics.
fn execute<F>(cli: &Cli, console: F) -> Result<RunReport>
where
    F: Fn() -> Box<dyn Write + Send>,
{
    let mut out = console();
    writeln!(out, "module: {}", cli.module.display())?;

    let module = ModuleLoader::load(&cli.module)?;

    let preimage = Preimage::load(&cli.preimage)?;
    writeln!(out, "preimage size: {} bytes", preimage.len())?;
    out.flush()?;

    let config = cli.config();
    tracing::debug!(
        public_input = cli.public_input,
        entry = %config.entry_point,
        on_short_read = %config.short_read,
        "starting run"
    );
    let intrinsics = HostIntrinsics::new(
        PublicInput(cli.public_input),
        config.reader(preimage),
        console(),
        console(),
    );

    let report = ExecutionDriver::new(config).execute(&module, intrinsics)?;
    if !report.outputs.is_empty() {
        // The run is over; a lost newline must not change its status
        if let Err(err) = writeln!(out).and_then(|_| out.flush()) {
            tracing::warn!(error = %err, "failed to terminate output line");
        }
    }
    Ok(report)
}
