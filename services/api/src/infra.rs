use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use campus_intel::workflows::analyst::sources::QUERY_BUDGET;
use campus_intel::workflows::analyst::{
    Credibility, Ein, ExtractionOutcome, FinancialFacts, FinancialFactsProvider,
    InstitutionRecord, IntelCategory, IntelSignal, ProviderError, Recon, ReconOutcome,
    SignalExtractor, SignalIndicator, SignalSet, SignalSeverity, StageStatus,
};
use chrono::{NaiveDate, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Deterministic filings collaborator backed by bundled fixtures. A real
/// deployment swaps in the nonprofit-filings API client behind the same
/// trait.
pub(crate) struct FixtureFilings {
    records: HashMap<String, (FinancialFacts, InstitutionRecord)>,
}

impl Default for FixtureFilings {
    fn default() -> Self {
        let mut records = HashMap::new();

        records.insert(
            "231352607".to_string(),
            (
                FinancialFacts {
                    fiscal_year: 2023,
                    total_revenue: Some(61_000_000.0),
                    total_expenses: Some(81_100_000.0),
                    net_assets: Some(45_200_000.0),
                    tuition_revenue: Some(35_000_000.0),
                    contributions: Some(5_000_000.0),
                    investment_income: Some(2_000_000.0),
                },
                institution(
                    "Bellmont College",
                    "231352607",
                    "Reading",
                    "PA",
                    Some("Baccalaureate College"),
                ),
            ),
        );

        records.insert(
            "042104307".to_string(),
            (
                FinancialFacts {
                    fiscal_year: 2023,
                    total_revenue: Some(92_000_000.0),
                    total_expenses: Some(84_500_000.0),
                    net_assets: Some(150_000_000.0),
                    tuition_revenue: Some(40_000_000.0),
                    contributions: Some(12_000_000.0),
                    investment_income: Some(6_000_000.0),
                },
                institution(
                    "Hartwell University",
                    "042104307",
                    "Amherst",
                    "MA",
                    Some("Masters University"),
                ),
            ),
        );

        records.insert(
            "540505282".to_string(),
            (
                FinancialFacts {
                    fiscal_year: 2023,
                    total_revenue: Some(45_000_000.0),
                    total_expenses: Some(47_000_000.0),
                    net_assets: Some(60_000_000.0),
                    tuition_revenue: Some(28_000_000.0),
                    contributions: None,
                    investment_income: Some(1_500_000.0),
                },
                institution(
                    "Crestview College",
                    "540505282",
                    "Sweet Briar",
                    "VA",
                    Some("Baccalaureate College"),
                ),
            ),
        );

        FixtureFilings { records }
    }
}

impl FinancialFactsProvider for FixtureFilings {
    fn fetch(&self, ein: &Ein) -> Result<(FinancialFacts, InstitutionRecord), ProviderError> {
        self.records
            .get(&ein.digits())
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(ein.formatted()))
    }
}

/// Static indicator feed for the bundled fixtures.
pub(crate) fn fixture_indicators(institution_name: &str) -> Vec<SignalIndicator> {
    if institution_name != "Bellmont College" {
        return Vec::new();
    }

    vec![
        SignalIndicator {
            kind: "FINANCIAL".to_string(),
            signal: "Rating agency downgraded credit rating to B2".to_string(),
            severity: SignalSeverity::Critical,
            detected_at: NaiveDate::from_ymd_opt(2025, 1, 15),
            source_url: None,
        },
        SignalIndicator {
            kind: "ENROLLMENT".to_string(),
            signal: "Spring enrollment down 12% YoY".to_string(),
            severity: SignalSeverity::Warning,
            detected_at: NaiveDate::from_ymd_opt(2025, 1, 20),
            source_url: None,
        },
        SignalIndicator {
            kind: "LEADERSHIP".to_string(),
            signal: "CFO resignation announced".to_string(),
            severity: SignalSeverity::Warning,
            detected_at: NaiveDate::from_ymd_opt(2025, 1, 28),
            source_url: None,
        },
    ]
}

/// Canned reconnaissance collaborator: always succeeds within budget and
/// returns fixed search payloads.
#[derive(Default)]
pub(crate) struct FixtureRecon;

impl Recon for FixtureRecon {
    fn execute(&self, institution: &InstitutionRecord) -> ReconOutcome {
        let mut raw_results = BTreeMap::new();
        for category in IntelCategory::ALL {
            raw_results.insert(
                category,
                json!({
                    "query": format!("\"{}\" {}", institution.name, category.label()),
                    "snippets": [],
                }),
            );
        }

        ReconOutcome {
            status: StageStatus::Success,
            error: None,
            raw_results,
            queries_executed: QUERY_BUDGET,
            queries_budget: QUERY_BUDGET,
            retrieved_at: Utc::now(),
        }
    }
}

/// Canned extraction collaborator with per-fixture signal triples.
#[derive(Default)]
pub(crate) struct FixtureExtractor;

impl SignalExtractor for FixtureExtractor {
    fn extract(&self, _recon: &ReconOutcome, institution: &InstitutionRecord) -> ExtractionOutcome {
        let signals = match institution.name.as_str() {
            "Bellmont College" => SignalSet {
                enrollment_trends: trusted(
                    "Fall enrollment declined 12% year over year",
                    "Higher Ed Chronicle, 2025-01-20",
                ),
                leadership_changes: IntelSignal {
                    finding: "Provost departure rumored".to_string(),
                    source: "campus message board".to_string(),
                    credibility: Credibility::Untrusted,
                },
                accreditation_status: trusted(
                    "Placed on probation by regional accreditor",
                    "Accreditor disclosure, 2025-01-12",
                ),
            },
            "Crestview College" => SignalSet {
                leadership_changes: trusted(
                    "Interim president appointed after resignation",
                    "Regional business journal, 2025-01-08",
                ),
                ..SignalSet::unavailable()
            },
            _ => SignalSet::unavailable(),
        };

        ExtractionOutcome::succeeded(signals, Utc::now())
    }
}

fn trusted(finding: &str, source: &str) -> IntelSignal {
    IntelSignal {
        finding: finding.to_string(),
        source: source.to_string(),
        credibility: Credibility::Trusted,
    }
}

fn institution(
    name: &str,
    ein: &str,
    city: &str,
    state: &str,
    classification: Option<&str>,
) -> InstitutionRecord {
    InstitutionRecord {
        name: name.to_string(),
        ein: Ein(ein.to_string()),
        org_type: Default::default(),
        classification: classification.map(str::to_string),
        city: Some(city.to_string()),
        state: Some(state.to_string()),
        website: None,
    }
}
