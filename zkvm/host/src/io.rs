//! I/O utilities for the host
//!
//! Handles report files and human-readable summaries of a run.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use zkwasm_harness_core::prelude::*;
use zkwasm_harness_core::RunCommitment;

/// Save a run report as pretty JSON
pub fn save_report_json<P: AsRef<Path>>(report: &RunReport, path: P) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(report).context("Failed to serialize RunReport")?;
    fs::write(path, json).with_context(|| format!("Failed to write report to {:?}", path))?;
    Ok(())
}

/// Format a hash as a hex string
pub fn format_hash(hash: &Hash) -> String {
    format!("0x{}", hex::encode(hash.as_slice()))
}

/// Format commitment for display
pub fn format_commitment(commitment: &RunCommitment) -> String {
    format!(
        "RunCommitment {{\n  \
         preimage_hash: {},\n  \
         output_hash: {},\n  \
         commitment: {}\n\
         }}",
        format_hash(&commitment.preimage_hash),
        format_hash(&commitment.output_hash),
        format_hash(&commitment.commitment),
    )
}

/// One-paragraph summary of a finished run
pub fn format_summary(report: &RunReport) -> String {
    let status = match &report.status {
        RunStatus::Completed => "completed".to_string(),
        RunStatus::Aborted { kind, message } => format!("aborted ({kind}): {message}"),
    };
    format!(
        "Run {status}\n  \
         Public input: {}\n  \
         Emitted values: {}\n  \
         Preimage consumed: {} bytes\n\
         {}",
        report.public_input.value(),
        report.outputs.len(),
        report.preimage_consumed,
        format_commitment(&report.commitment),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> RunReport {
        let mut outputs = OutputSequence::new();
        outputs.push(5);
        RunReport {
            status: RunStatus::Completed,
            public_input: PublicInput(5),
            outputs,
            preimage_consumed: 0,
            entry_result: Some(0),
            commitment: RunCommitment::new(PublicInput(5), Hash::ZERO, Hash::repeat_byte(0x01)),
        }
    }

    #[test]
    fn test_format_hash() {
        let formatted = format_hash(&Hash::repeat_byte(0xab));
        assert!(formatted.starts_with("0xabab"));
        assert_eq!(formatted.len(), 2 + 64);
    }

    #[test]
    fn test_summary_mentions_status_and_commitment() {
        let summary = format_summary(&report());
        assert!(summary.starts_with("Run completed"));
        assert!(summary.contains("Emitted values: 1"));
        assert!(summary.contains("commitment: 0x"));
    }

    #[test]
    fn test_save_report_json() {
        let path = std::env::temp_dir()
            .join(format!("zkwasm-io-report-{}.json", std::process::id()));
        save_report_json(&report(), &path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["status"], "completed");
        assert_eq!(json["outputs"]["values"][0], 5);

        fs::remove_file(&path).unwrap();
    }
}
