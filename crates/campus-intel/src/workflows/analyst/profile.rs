use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::classification::classify;
use super::composite::CompositeScore;
use super::credibility::ScoreContribution;
use super::domain::{
    blinded_display_name, DerivedMetrics, DistressLevel, FinancialFacts, InstitutionRecord,
    InstitutionType, Region, SignalIndicator, SignalSet, UrgencyFlag,
};
use super::metrics::derive_metrics;
use super::sources::{ExtractionOutcome, ReconOutcome, StageStatus};

pub const SCHEMA_VERSION_V1: &str = "1.0.0";
pub const SCHEMA_VERSION_V2: &str = "2.0.0";
pub const GENERATOR_TAG: &str = "campus-intel-analyst";
pub const ANALYST_VERSION_V2: &str = "2.0.0";

/// Provenance stamp for one upstream data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSourceStamp {
    pub source: String,
    pub retrieved_at: DateTime<Utc>,
    pub confidence: SourceConfidence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceConfidence {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileMeta {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub generated_by: String,
    pub data_sources: Vec<DataSourceStamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analyst_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intelligence_queries_used: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub city: Option<String>,
    pub state: Option<String>,
    pub region: Region,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstitutionSection {
    pub name: String,
    pub ein: String,
    #[serde(rename = "type")]
    pub org_type: InstitutionType,
    pub classification: Option<String>,
    pub location: Location,
    pub website: Option<String>,
}

/// Where the raw financial figures came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilingSource {
    pub form: String,
    pub tax_period: String,
    pub retrieved_from: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialsSection {
    pub fiscal_year: i32,
    pub total_revenue: Option<f64>,
    pub total_expenses: Option<f64>,
    pub operating_surplus_deficit: Option<f64>,
    pub net_assets: Option<f64>,
    pub tuition_revenue: Option<f64>,
    pub contributions: Option<f64>,
    pub investment_income: Option<f64>,
    pub calculated: DerivedMetrics,
    pub data_source: FilingSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalsSection {
    pub distress_level: DistressLevel,
    pub indicators: Vec<SignalIndicator>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlindedPresentation {
    pub display_name: String,
    pub approved_for_external: bool,
}

/// Additive enrichment block appended by a successful V2 merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct V2Signals {
    pub real_time_intel: SignalSet,
    pub composite_score: u8,
    pub urgency_flag: UrgencyFlag,
    pub v1_base_score: u8,
    pub v2_contribution: u8,
    pub signal_breakdown: Vec<ScoreContribution>,
}

/// The merged output record. Created once per institution per run; later
/// runs produce a new profile rather than mutating this one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub profile_version: String,
    pub meta: ProfileMeta,
    pub institution: InstitutionSection,
    pub financials: FinancialsSection,
    pub signals: SignalsSection,
    pub blinded_presentation: BlindedPresentation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub v2_signals: Option<V2Signals>,
}

impl Profile {
    pub fn distress_level(&self) -> DistressLevel {
        self.signals.distress_level
    }
}

/// Assemble the baseline (V1) profile from a facts snapshot and the static
/// indicator feed. Pure given the injected clock.
pub fn build_profile(
    institution: &InstitutionRecord,
    facts: &FinancialFacts,
    indicators: Vec<SignalIndicator>,
    generated_at: DateTime<Utc>,
) -> Profile {
    let calculated = derive_metrics(facts);
    let distress_level = classify(
        calculated.expense_ratio,
        calculated.runway_years,
        &indicators,
    );

    let region = institution
        .state
        .as_deref()
        .map(Region::from_state)
        .unwrap_or(Region::Unknown);

    Profile {
        profile_version: SCHEMA_VERSION_V1.to_string(),
        meta: ProfileMeta {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            generated_at,
            generated_by: GENERATOR_TAG.to_string(),
            data_sources: vec![DataSourceStamp {
                source: "IRS Form 990 filings".to_string(),
                retrieved_at: generated_at,
                confidence: SourceConfidence::High,
            }],
            analyst_version: None,
            intelligence_queries_used: None,
        },
        institution: InstitutionSection {
            name: institution.name.clone(),
            ein: institution.ein.formatted(),
            org_type: institution.org_type,
            classification: institution.classification.clone(),
            location: Location {
                city: institution.city.clone(),
                state: institution.state.clone(),
                region,
            },
            website: institution.website.clone(),
        },
        financials: FinancialsSection {
            fiscal_year: facts.fiscal_year,
            total_revenue: facts.total_revenue,
            total_expenses: facts.total_expenses,
            operating_surplus_deficit: calculated.operating_surplus_deficit,
            net_assets: facts.net_assets,
            tuition_revenue: facts.tuition_revenue,
            contributions: facts.contributions,
            investment_income: facts.investment_income,
            calculated,
            data_source: FilingSource {
                form: "IRS-990".to_string(),
                tax_period: facts.fiscal_year.to_string(),
                retrieved_from: "Nonprofit filings explorer".to_string(),
            },
        },
        signals: SignalsSection {
            distress_level,
            indicators,
        },
        blinded_presentation: BlindedPresentation {
            display_name: blinded_display_name(institution.org_type, region),
            approved_for_external: false,
        },
        v2_signals: None,
    }
}

/// Merge V2 enrichment into a baseline profile.
///
/// All-or-nothing: any collaborator stage short of success returns the V1
/// profile unchanged, so partial intelligence never leaks into the record.
/// A successful merge is strictly additive over the V1 fields.
pub fn merge_v2(
    v1: &Profile,
    recon: &ReconOutcome,
    extraction: &ExtractionOutcome,
    composite: &CompositeScore,
) -> Profile {
    if recon.status != StageStatus::Success || extraction.status != StageStatus::Success {
        return v1.clone();
    }

    let mut merged = v1.clone();
    merged.profile_version = SCHEMA_VERSION_V2.to_string();
    merged.meta.schema_version = SCHEMA_VERSION_V2.to_string();
    merged.meta.analyst_version = Some(ANALYST_VERSION_V2.to_string());
    merged.meta.intelligence_queries_used = Some(recon.queries_executed);
    merged.v2_signals = Some(V2Signals {
        real_time_intel: extraction.signals.clone(),
        composite_score: composite.composite_score,
        urgency_flag: composite.urgency_flag,
        v1_base_score: composite.v1_base_score,
        v2_contribution: composite.v2_contribution,
        signal_breakdown: composite.signal_breakdown.clone(),
    });

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::analyst::composite::score;
    use crate::workflows::analyst::domain::{BaseScore, Credibility, Ein, IntelSignal};
    use chrono::TimeZone;

    fn frozen_clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 3, 12, 0, 0).single().expect("valid timestamp")
    }

    fn sample_institution() -> InstitutionRecord {
        InstitutionRecord {
            name: "Bellmont College".to_string(),
            ein: Ein("231352607".to_string()),
            org_type: InstitutionType::PrivateNonprofit,
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

    fn trusted_set() -> SignalSet {
        SignalSet {
            enrollment_trends: IntelSignal {
                finding: "Spring enrollment declined 12% year over year".to_string(),
                source: "Higher Ed Chronicle, 2025-01-20".to_string(),
                credibility: Credibility::Trusted,
            },
            ..SignalSet::unavailable()
        }
    }

    fn success_recon() -> ReconOutcome {
        ReconOutcome {
            status: StageStatus::Success,
            error: None,
            raw_results: Default::default(),
            queries_executed: 3,
            queries_budget: 3,
            retrieved_at: frozen_clock(),
        }
    }

    #[test]
    fn baseline_profile_carries_calculated_block_and_classification() {
        let profile = build_profile(&sample_institution(), &deficit_facts(), vec![], frozen_clock());

        assert_eq!(profile.profile_version, SCHEMA_VERSION_V1);
        assert_eq!(profile.financials.calculated.expense_ratio, Some(1.33));
        assert_eq!(profile.financials.calculated.runway_years, Some(2.2));
        assert_eq!(profile.signals.distress_level, DistressLevel::Critical);
        assert_eq!(profile.institution.ein, "23-1352607");
        assert_eq!(profile.institution.location.region, Region::Northeast);
        assert!(profile.v2_signals.is_none());
        assert!(!profile.blinded_presentation.approved_for_external);
    }

    #[test]
    fn merge_aborts_on_recon_error_and_returns_v1_unchanged() {
        let v1 = build_profile(&sample_institution(), &deficit_facts(), vec![], frozen_clock());
        let recon = ReconOutcome::failed("connection refused", frozen_clock());
        let extraction = ExtractionOutcome::succeeded(trusted_set(), frozen_clock());
        let composite = score(&BaseScore::Numeric(55.0), &trusted_set(), frozen_clock());

        let merged = merge_v2(&v1, &recon, &extraction, &composite);

        assert_eq!(merged, v1);
        assert_eq!(
            serde_json::to_value(&merged).expect("serializes"),
            serde_json::to_value(&v1).expect("serializes")
        );
    }

    #[test]
    fn merge_aborts_on_extraction_error() {
        let v1 = build_profile(&sample_institution(), &deficit_facts(), vec![], frozen_clock());
        let extraction = ExtractionOutcome::failed("malformed response", frozen_clock());
        let composite = score(
            &BaseScore::Numeric(55.0),
            &extraction.signals,
            frozen_clock(),
        );

        let merged = merge_v2(&v1, &success_recon(), &extraction, &composite);
        assert_eq!(merged, v1);
    }

    #[test]
    fn successful_merge_is_strictly_additive() {
        let v1 = build_profile(&sample_institution(), &deficit_facts(), vec![], frozen_clock());
        let extraction = ExtractionOutcome::succeeded(trusted_set(), frozen_clock());
        let composite = score(&BaseScore::Numeric(55.0), &trusted_set(), frozen_clock());

        let merged = merge_v2(&v1, &success_recon(), &extraction, &composite);

        // V1 sections survive untouched.
        assert_eq!(merged.institution, v1.institution);
        assert_eq!(merged.financials, v1.financials);
        assert_eq!(merged.signals, v1.signals);
        assert_eq!(merged.blinded_presentation, v1.blinded_presentation);

        let v2 = merged.v2_signals.expect("v2 block attached");
        assert_eq!(v2.composite_score, 65);
        assert_eq!(v2.v2_contribution, 10);
        assert_eq!(merged.profile_version, SCHEMA_VERSION_V2);
        assert_eq!(merged.meta.intelligence_queries_used, Some(3));
        assert_eq!(
            merged.meta.analyst_version.as_deref(),
            Some(ANALYST_VERSION_V2)
        );
    }

    #[test]
    fn profile_json_exposes_versioned_sections() {
        let profile = build_profile(&sample_institution(), &deficit_facts(), vec![], frozen_clock());
        let value = serde_json::to_value(&profile).expect("serializes");

        assert_eq!(value["meta"]["schema_version"], "1.0.0");
        assert_eq!(value["financials"]["calculated"]["expense_ratio"], 1.33);
        assert_eq!(value["signals"]["distress_level"], "critical");
        assert!(value.get("v2_signals").is_none());
    }
}
