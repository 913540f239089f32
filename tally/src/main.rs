//! tally - Web meeting detector.
//!
//! Prints "meeting" or "idle" on stdout and exits 0 (meeting), 1 (idle)
//! or 2 (error). Argument errors exit 2 through clap.

mod cli;

use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;

use tally_core::{DetectionConfig, DetectionError, DetectionReport, OverallVerdict};

use cli::Cli;

const EXIT_MEETING: u8 = 0;
const EXIT_IDLE: u8 = 1;
const EXIT_ERROR: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    let report = match detect(&cli.detection_config()) {
        Ok(report) => report,
        Err(e) => {
            log::error!("Detection failed: {}", e);
            eprintln!("tally: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    if cli.verbose {
        for line in verbose_lines(&report) {
            eprintln!("{}", line);
        }
    }

    if cli.json {
        match report.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("tally: failed to serialize report: {}", e);
                return ExitCode::from(EXIT_ERROR);
            }
        }
    } else {
        println!("{}", report.verdict);
    }

    ExitCode::from(exit_code(report.verdict))
}

#[cfg(target_os = "windows")]
fn detect(config: &DetectionConfig) -> Result<DetectionReport, DetectionError> {
    use tally_core::DetectionCoordinator;
    use tally_windows::{RegistryConsentStore, WasapiSubsystem};

    DetectionCoordinator::new(RegistryConsentStore::current_user(), WasapiSubsystem).detect(config)
}

#[cfg(not(target_os = "windows"))]
fn detect(_config: &DetectionConfig) -> Result<DetectionReport, DetectionError> {
    Err(DetectionError::Unsupported(format!(
        "{} (the consent ledger and WASAPI are Windows-only)",
        std::env::consts::OS
    )))
}

fn exit_code(verdict: OverallVerdict) -> u8 {
    if verdict.meeting {
        EXIT_MEETING
    } else {
        EXIT_IDLE
    }
}

/// Evidence in discovery order, then the resolved state of each device.
fn verbose_lines(report: &DetectionReport) -> Vec<String> {
    let mut lines: Vec<String> = report.evidence.iter().map(|e| format!("Evidence: {}", e)).collect();

    for (label, outcome) in [("Microphone", report.microphone), ("Camera", report.camera)] {
        let line = match outcome.resolved_by {
            Some(source) if outcome.in_use => format!("{} in use: YES ({})", label, source),
            _ => format!("{} in use: NO", label),
        };
        lines.push(line);
    }

    lines.push(format!("Policy: {}", report.policy));
    lines
}
