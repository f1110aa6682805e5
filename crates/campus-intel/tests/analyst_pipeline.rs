use std::sync::Arc;

use campus_intel::workflows::analyst::{
    AnalysisRequest, AnalystConfig, AnalystService, BaseScore, Credibility, Ein,
    ExtractionOutcome, FinancialFacts, InstitutionRecord, IntelSignal, Recon, ReconOutcome,
    RunStatus, SignalExtractor, SignalSet, StageStatus, UrgencyFlag,
};
use chrono::{DateTime, TimeZone, Utc};

fn frozen_clock() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 2, 3, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

fn sample_institution() -> InstitutionRecord {
    InstitutionRecord {
        name: "Bellmont College".to_string(),
        ein: Ein("231352607".to_string()),
        org_type: Default::default(),
        classification: Some("Baccalaureate College".to_string()),
        city: Some("Reading".to_string()),
        state: Some("PA".to_string()),
        website: None,
    }
}

fn deficit_facts() -> FinancialFacts {
    FinancialFacts {
        fiscal_year: 2023,
        total_revenue: Some(61_000_000.0),
        total_expenses: Some(81_100_000.0),
        net_assets: Some(45_200_000.0),
        tuition_revenue: Some(35_000_000.0),
        contributions: Some(5_000_000.0),
        investment_income: Some(2_000_000.0),
    }
}

fn request_with_base(base: Option<BaseScore>) -> AnalysisRequest {
    AnalysisRequest {
        institution: sample_institution(),
        facts: deficit_facts(),
        indicators: Vec::new(),
        base_score: base,
    }
}

/// Recon fake that either answers within budget or simulates a connectivity
/// failure.
struct FakeRecon {
    fail: bool,
}

impl Recon for FakeRecon {
    fn execute(&self, _institution: &InstitutionRecord) -> ReconOutcome {
        if self.fail {
            ReconOutcome::failed("connection refused", frozen_clock())
        } else {
            ReconOutcome {
                status: StageStatus::Success,
                error: None,
                raw_results: Default::default(),
                queries_executed: 3,
                queries_budget: 3,
                retrieved_at: frozen_clock(),
            }
        }
    }
}

/// Extractor fake returning a fixed signal triple, or degrading on failure.
struct FakeExtractor {
    fail: bool,
    signals: SignalSet,
}

impl FakeExtractor {
    fn trusted_probation() -> Self {
        FakeExtractor {
            fail: false,
            signals: SignalSet {
                accreditation_status: IntelSignal {
                    finding: "Accreditor placed the college on probation".to_string(),
                    source: "Accreditor disclosure, 2025-01-12".to_string(),
                    credibility: Credibility::Trusted,
                },
                ..SignalSet::unavailable()
            },
        }
    }

    fn all_trusted() -> Self {
        let trusted = |finding: &str| IntelSignal {
            finding: finding.to_string(),
            source: "Higher Ed Chronicle, 2025-01-30".to_string(),
            credibility: Credibility::Trusted,
        };
        FakeExtractor {
            fail: false,
            signals: SignalSet {
                enrollment_trends: trusted("fall enrollment declined 12%"),
                leadership_changes: trusted("interim president appointed"),
                accreditation_status: trusted("probation notice issued"),
            },
        }
    }
}

impl SignalExtractor for FakeExtractor {
    fn extract(&self, _recon: &ReconOutcome, _institution: &InstitutionRecord) -> ExtractionOutcome {
        if self.fail {
            ExtractionOutcome::failed("malformed extraction payload", frozen_clock())
        } else {
            ExtractionOutcome::succeeded(self.signals.clone(), frozen_clock())
        }
    }
}

fn service(
    recon_fail: bool,
    extractor: FakeExtractor,
    config: AnalystConfig,
) -> AnalystService<FakeRecon, FakeExtractor> {
    AnalystService::new(
        Arc::new(FakeRecon { fail: recon_fail }),
        Arc::new(extractor),
        config,
    )
}

#[test]
fn trusted_probation_signal_scores_seventy_five_high() {
    let service = service(
        false,
        FakeExtractor::trusted_probation(),
        AnalystConfig::default(),
    );

    let outcome = service.analyze(
        &request_with_base(Some(BaseScore::Numeric(55.0))),
        frozen_clock(),
    );

    assert_eq!(outcome.run.status, RunStatus::Complete);
    let v2 = outcome.profile.v2_signals.expect("v2 block present");
    assert_eq!(v2.v1_base_score, 55);
    assert_eq!(v2.v2_contribution, 20);
    assert_eq!(v2.composite_score, 75);
    assert_eq!(v2.urgency_flag, UrgencyFlag::High);
    assert_eq!(v2.signal_breakdown.len(), 1);
}

#[test]
fn saturated_base_caps_at_one_hundred() {
    let service = service(false, FakeExtractor::all_trusted(), AnalystConfig::default());

    let outcome = service.analyze(
        &request_with_base(Some(BaseScore::Numeric(100.0))),
        frozen_clock(),
    );

    let v2 = outcome.profile.v2_signals.expect("v2 block present");
    assert_eq!(v2.v2_contribution, 45);
    assert_eq!(v2.composite_score, 100);
    assert_eq!(v2.urgency_flag, UrgencyFlag::Immediate);
}

#[test]
fn recon_connectivity_failure_leaves_v1_profile_untouched() {
    let enriched = service(
        true,
        FakeExtractor::trusted_probation(),
        AnalystConfig::default(),
    );
    let disabled = service(
        false,
        FakeExtractor::trusted_probation(),
        AnalystConfig {
            enable_v2_enrichment: false,
            default_base_score: None,
        },
    );

    let request = request_with_base(Some(BaseScore::Numeric(55.0)));
    let failed = enriched.analyze(&request, frozen_clock());
    let baseline = disabled.analyze(&request, frozen_clock());

    assert_eq!(failed.run.status, RunStatus::Failed);
    assert_eq!(failed.run.error.as_deref(), Some("connection refused"));
    // The failed profile is exactly the baseline profile.
    assert_eq!(failed.profile, baseline.profile);
    assert_eq!(
        serde_json::to_value(&failed.profile).expect("serializes"),
        serde_json::to_value(&baseline.profile).expect("serializes")
    );
}

#[test]
fn disabled_and_failed_runs_differ_only_in_metadata() {
    let request = request_with_base(Some(BaseScore::Numeric(55.0)));

    let failed = service(
        true,
        FakeExtractor::trusted_probation(),
        AnalystConfig::default(),
    )
    .analyze(&request, frozen_clock());

    let skipped = service(
        false,
        FakeExtractor::trusted_probation(),
        AnalystConfig {
            enable_v2_enrichment: false,
            default_base_score: None,
        },
    )
    .analyze(&request, frozen_clock());

    assert_eq!(failed.profile, skipped.profile);
    assert_eq!(failed.run.status, RunStatus::Failed);
    assert_eq!(skipped.run.status, RunStatus::Skipped);
    assert!(!skipped.run.v2_enabled);
}

#[test]
fn pipeline_is_idempotent_under_a_frozen_clock() {
    let request = request_with_base(Some(BaseScore::Label("SEVERE".to_string())));

    let first = service(false, FakeExtractor::all_trusted(), AnalystConfig::default())
        .analyze(&request, frozen_clock());
    let second = service(false, FakeExtractor::all_trusted(), AnalystConfig::default())
        .analyze(&request, frozen_clock());

    assert_eq!(first.profile, second.profile);
    assert_eq!(first.run, second.run);
}

#[test]
fn base_score_defaults_to_distress_level_pain_label() {
    // Deficit facts classify critical, which maps to the 85-point label.
    let service = service(
        false,
        FakeExtractor::trusted_probation(),
        AnalystConfig::default(),
    );

    let outcome = service.analyze(&request_with_base(None), frozen_clock());

    let v2 = outcome.profile.v2_signals.expect("v2 block present");
    assert_eq!(v2.v1_base_score, 85);
    assert_eq!(v2.composite_score, 100);
}

#[test]
fn configured_default_base_score_applies_when_request_omits_one() {
    let service = service(
        false,
        FakeExtractor::trusted_probation(),
        AnalystConfig {
            enable_v2_enrichment: true,
            default_base_score: Some(BaseScore::Numeric(30.0)),
        },
    );

    let outcome = service.analyze(&request_with_base(None), frozen_clock());

    let v2 = outcome.profile.v2_signals.expect("v2 block present");
    assert_eq!(v2.v1_base_score, 30);
    assert_eq!(v2.composite_score, 50);
    assert_eq!(v2.urgency_flag, UrgencyFlag::Monitor);
}

#[test]
fn extraction_failure_aborts_merge_but_reports_run_error() {
    let service = service(
        false,
        FakeExtractor {
            fail: true,
            signals: SignalSet::unavailable(),
        },
        AnalystConfig::default(),
    );

    let outcome = service.analyze(
        &request_with_base(Some(BaseScore::Numeric(55.0))),
        frozen_clock(),
    );

    assert_eq!(outcome.run.status, RunStatus::Failed);
    assert!(outcome.profile.v2_signals.is_none());
    assert_eq!(outcome.profile.profile_version, "1.0.0");
}
