use crate::detection::probe::AudioSessionProbe;
use crate::detection::scanner::ConsentStoreScanner;
use crate::models::category::DeviceCategory;
use crate::models::config::{DetectionConfig, EvidenceSource};
use crate::models::error::DetectionError;
use crate::models::report::{CategoryOutcome, DetectionReport, DetectionResult, OverallVerdict};
use crate::traits::audio_subsystem::AudioSubsystem;
use crate::traits::consent_store::ConsentStore;

/// Combines the consent ledger and the audio session probe into a verdict.
///
/// Generic over both backends, so the same policy runs against the Windows
/// registry and WASAPI or against in-memory fakes:
/// ```text
/// microphone: [ConsentLedger] ─ false ─▶ [AudioSessions] ─┐
///                                                          ├─▶ policy (any | both) ─▶ verdict
/// camera:     [ConsentLedger] ─────────────────────────────┘
/// ```
pub struct DetectionCoordinator<S: ConsentStore, A: AudioSubsystem> {
    scanner: ConsentStoreScanner<S>,
    probe: AudioSessionProbe<A>,
}

impl<S: ConsentStore, A: AudioSubsystem> DetectionCoordinator<S, A> {
    pub fn new(store: S, subsystem: A) -> Self {
        Self {
            scanner: ConsentStoreScanner::new(store),
            probe: AudioSessionProbe::new(subsystem),
        }
    }

    pub fn scanner(&self) -> &ConsentStoreScanner<S> {
        &self.scanner
    }

    pub fn probe(&self) -> &AudioSessionProbe<A> {
        &self.probe
    }

    /// Take one snapshot of device usage and derive the meeting verdict.
    ///
    /// Only an invalid configuration is an error; every backend failure
    /// degrades to "no evidence" for the affected source.
    pub fn detect(&self, config: &DetectionConfig) -> Result<DetectionReport, DetectionError> {
        config.validate().map_err(DetectionError::ConfigurationFailed)?;

        let mut evidence = Vec::new();
        let microphone = self.resolve(DeviceCategory::Microphone, config, &mut evidence);
        let camera = self.resolve(DeviceCategory::Camera, config, &mut evidence);

        let verdict = OverallVerdict {
            meeting: config.policy.combine(microphone.in_use, camera.in_use),
        };
        log::info!(
            "Verdict {} (policy {}, microphone {}, camera {})",
            verdict,
            config.policy,
            microphone.in_use,
            camera.in_use
        );

        Ok(DetectionReport {
            verdict,
            policy: config.policy,
            microphone,
            camera,
            evidence,
        })
    }

    /// Consult the category's sources in order until one reports use.
    fn resolve(
        &self,
        category: DeviceCategory,
        config: &DetectionConfig,
        evidence: &mut Vec<String>,
    ) -> CategoryOutcome {
        for &source in config.sources_for(category) {
            let result = self.consult(source, category, config.verbose);
            evidence.extend(result.evidence);
            if result.in_use {
                return CategoryOutcome {
                    in_use: true,
                    resolved_by: Some(source),
                };
            }
            log::debug!("{} not in use according to {}", category, source);
        }
        CategoryOutcome::default()
    }

    fn consult(&self, source: EvidenceSource, category: DeviceCategory, verbose: bool) -> DetectionResult {
        match source {
            EvidenceSource::ConsentLedger => self.scanner.scan(category, verbose),
            EvidenceSource::AudioSessions => self.probe.probe(verbose),
        }
    }
}
