use clap::Parser;

use tally_core::{CombinationPolicy, DetectionConfig};

#[derive(Debug, Parser)]
#[command(name = "tally")]
#[command(
    version,
    about = "Web meeting detector",
    long_about = "Reports whether a web meeting appears to be in progress by checking whether the \
                  microphone and camera are in use.\n\n\
                  stdout: \"meeting\" or \"idle\"\n\
                  stderr: verbose information (with --verbose)",
    after_help = "Exit codes:\n  0: Meeting in progress\n  1: Idle (not in meeting)\n  2: Error"
)]
pub struct Cli {
    /// Print per-device state and the apps or sessions using them to stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// Meeting when "any" device is in use, or only when "both" are
    #[arg(long, default_value_t = CombinationPolicy::Both)]
    pub policy: CombinationPolicy,

    /// Only consult the consent ledger; skip the live audio-session check
    #[arg(long)]
    pub ledger_only: bool,

    /// Print the full detection report as JSON instead of a single word
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    pub fn detection_config(&self) -> DetectionConfig {
        let config = DetectionConfig::default()
            .with_policy(self.policy)
            .with_verbose(self.verbose || self.json);
        if self.ledger_only {
            config.ledger_only()
        } else {
            config
        }
    }
}
