//! University distress scoring pipeline: derived financial ratios, ordinal
//! classification, credibility-gated real-time amplification, and the
//! backward-compatible profile merge.

pub mod batch;
pub mod classification;
pub mod cohort;
pub mod composite;
pub mod credibility;
pub mod domain;
pub mod dossier;
pub mod metrics;
pub mod profile;
pub mod router;
pub mod sources;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub use batch::{BatchReport, BatchRow, BatchRowStatus, CohortSummary};
pub use cohort::{parse_cohort, CohortImportError, CohortMember};
pub use composite::CompositeScore;
pub use credibility::ScoreContribution;
pub use domain::{
    BaseScore, Credibility, DerivedMetrics, DistressLevel, Ein, FinancialFacts, InstitutionRecord,
    InstitutionType, IntelCategory, IntelSignal, Region, SignalIndicator, SignalSet,
    SignalSeverity, UrgencyFlag,
};
pub use profile::{Profile, V2Signals};
pub use router::profile_router;
pub use sources::{
    ExtractionOutcome, FinancialFactsProvider, ProviderError, Recon, ReconOutcome, SignalExtractor,
    StageStatus,
};

use profile::{build_profile, merge_v2};

/// Configuration surface consumed by the scoring core: the enrichment switch
/// and an optional default base-score source.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalystConfig {
    pub enable_v2_enrichment: bool,
    pub default_base_score: Option<BaseScore>,
}

impl Default for AnalystConfig {
    fn default() -> Self {
        AnalystConfig {
            enable_v2_enrichment: true,
            default_base_score: None,
        }
    }
}

/// Everything the pipeline needs for one institution. Collaborators have
/// already fetched the facts and static indicators by the time this exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub institution: InstitutionRecord,
    pub facts: FinancialFacts,
    #[serde(default)]
    pub indicators: Vec<SignalIndicator>,
    #[serde(default)]
    pub base_score: Option<BaseScore>,
}

/// Terminal status of one pipeline run. `Skipped` (enrichment disabled) and
/// `Failed` return structurally identical profiles; only this record tells
/// them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Complete,
    Skipped,
    Failed,
}

impl RunStatus {
    pub const fn label(self) -> &'static str {
        match self {
            RunStatus::Complete => "complete",
            RunStatus::Skipped => "skipped",
            RunStatus::Failed => "failed",
        }
    }
}

/// Run accounting that accompanies every produced profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub v2_enabled: bool,
    pub phases_executed: Vec<String>,
    pub status: RunStatus,
    pub error: Option<String>,
    pub completed_at: DateTime<Utc>,
}

/// One pipeline result: the profile plus its run metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub profile: Profile,
    pub run: RunMetadata,
}

/// Stateless pipeline composing the calculator, classifier, credibility gate,
/// composite scorer, and merger around the external collaborators.
pub struct AnalystService<R, X> {
    recon: Arc<R>,
    extractor: Arc<X>,
    config: AnalystConfig,
}

impl<R, X> AnalystService<R, X>
where
    R: Recon,
    X: SignalExtractor,
{
    pub fn new(recon: Arc<R>, extractor: Arc<X>, config: AnalystConfig) -> Self {
        Self {
            recon,
            extractor,
            config,
        }
    }

    pub fn config(&self) -> &AnalystConfig {
        &self.config
    }

    /// Run the full pipeline for one institution. Total: every failure mode
    /// is folded into the returned status, and the profile returned on
    /// failure or skip is the untouched baseline.
    pub fn analyze(&self, request: &AnalysisRequest, now: DateTime<Utc>) -> AnalysisOutcome {
        let mut phases = vec!["v1_profile".to_string()];
        let v1 = build_profile(
            &request.institution,
            &request.facts,
            request.indicators.clone(),
            now,
        );
        info!(
            institution = %request.institution.name,
            distress_level = v1.signals.distress_level.label(),
            "baseline profile built"
        );

        if !self.config.enable_v2_enrichment {
            return AnalysisOutcome {
                profile: v1,
                run: RunMetadata {
                    v2_enabled: false,
                    phases_executed: phases,
                    status: RunStatus::Skipped,
                    error: None,
                    completed_at: now,
                },
            };
        }

        let recon = self.recon.execute(&request.institution);
        phases.push("recon".to_string());

        let extraction = self.extractor.extract(&recon, &request.institution);
        phases.push("signal_extraction".to_string());

        let base = self.resolve_base_score(request, v1.signals.distress_level);
        let composite = composite::score(&base, &extraction.signals, now);
        phases.push("composite_scoring".to_string());

        let profile = merge_v2(&v1, &recon, &extraction, &composite);
        phases.push("merge".to_string());

        let (status, error) = match (recon.status, extraction.status) {
            (StageStatus::Error, _) => (RunStatus::Failed, recon.error.clone()),
            (_, StageStatus::Error) => (RunStatus::Failed, extraction.error.clone()),
            _ => (RunStatus::Complete, None),
        };

        if status == RunStatus::Failed {
            warn!(
                institution = %request.institution.name,
                error = error.as_deref().unwrap_or("unknown"),
                "enrichment failed, baseline profile retained"
            );
        }

        AnalysisOutcome {
            profile,
            run: RunMetadata {
                v2_enabled: true,
                phases_executed: phases,
                status,
                error,
                completed_at: now,
            },
        }
    }

    /// Precedence: explicit request value, then the configured default, then
    /// the baseline distress level mapped through the pain-label table.
    fn resolve_base_score(
        &self,
        request: &AnalysisRequest,
        distress_level: DistressLevel,
    ) -> BaseScore {
        request
            .base_score
            .clone()
            .or_else(|| self.config.default_base_score.clone())
            .unwrap_or_else(|| BaseScore::Label(distress_level.pain_label().to_string()))
    }
}
