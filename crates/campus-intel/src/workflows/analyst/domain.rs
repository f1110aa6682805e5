use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for Employer Identification Numbers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ein(pub String);

impl Ein {
    /// Digits-only form used for lookups.
    pub fn digits(&self) -> String {
        self.0.chars().filter(char::is_ascii_digit).collect()
    }

    /// Canonical `XX-XXXXXXX` rendering when a full nine-digit number is present.
    pub fn formatted(&self) -> String {
        let digits = self.digits();
        if digits.len() == 9 {
            format!("{}-{}", &digits[..2], &digits[2..])
        } else {
            self.0.clone()
        }
    }
}

/// Institution metadata as reported by the filings collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstitutionRecord {
    pub name: String,
    pub ein: Ein,
    #[serde(default)]
    pub org_type: InstitutionType,
    pub classification: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub website: Option<String>,
}

/// Coarse institution categories used for blinded presentation labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstitutionType {
    #[default]
    PrivateNonprofit,
    PrivateForProfit,
    PublicState,
    PublicLocal,
    PublicFederal,
}

impl InstitutionType {
    pub const fn display_label(self) -> &'static str {
        match self {
            InstitutionType::PrivateNonprofit => "Private Nonprofit College",
            InstitutionType::PrivateForProfit => "Private For-Profit Institution",
            InstitutionType::PublicState => "Public State University",
            InstitutionType::PublicLocal => "Public Community College",
            InstitutionType::PublicFederal => "Federal Institution",
        }
    }
}

/// Census-style region derived from the two-letter state code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    Northeast,
    Southeast,
    Midwest,
    Southwest,
    West,
    Unknown,
}

impl Region {
    pub fn from_state(state: &str) -> Self {
        match state.trim().to_ascii_uppercase().as_str() {
            "CT" | "ME" | "MA" | "NH" | "RI" | "VT" | "NJ" | "NY" | "PA" | "DE" | "MD"
            | "DC" => Region::Northeast,
            "AL" | "AR" | "FL" | "GA" | "KY" | "LA" | "MS" | "NC" | "SC" | "TN" | "VA"
            | "WV" => Region::Southeast,
            "IL" | "IN" | "IA" | "KS" | "MI" | "MN" | "MO" | "NE" | "ND" | "OH" | "SD"
            | "WI" => Region::Midwest,
            "AZ" | "NM" | "OK" | "TX" => Region::Southwest,
            "AK" | "CA" | "CO" | "HI" | "ID" | "MT" | "NV" | "OR" | "UT" | "WA" | "WY" => {
                Region::West
            }
            _ => Region::Unknown,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Region::Northeast => "Northeast",
            Region::Southeast => "Southeast",
            Region::Midwest => "Midwest",
            Region::Southwest => "Southwest",
            Region::West => "West",
            Region::Unknown => "United States",
        }
    }
}

/// One fiscal-year snapshot from an IRS Form 990 filing. Monetary fields are
/// nullable; the filing year is always known for a returned filing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialFacts {
    #[serde(alias = "filing_year")]
    pub fiscal_year: i32,
    pub total_revenue: Option<f64>,
    pub total_expenses: Option<f64>,
    pub net_assets: Option<f64>,
    pub tuition_revenue: Option<f64>,
    pub contributions: Option<f64>,
    pub investment_income: Option<f64>,
}

/// Ratios computed from a facts snapshot. A `None` means the input did not
/// support the calculation, never that the calculation failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub expense_ratio: Option<f64>,
    pub operating_surplus_deficit: Option<f64>,
    pub runway_years: Option<f64>,
    pub tuition_dependency: Option<f64>,
}

/// Ordinal distress scale, least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistressLevel {
    Stable,
    Watch,
    Elevated,
    Critical,
}

impl DistressLevel {
    pub const fn label(self) -> &'static str {
        match self {
            DistressLevel::Stable => "stable",
            DistressLevel::Watch => "watch",
            DistressLevel::Elevated => "elevated",
            DistressLevel::Critical => "critical",
        }
    }

    /// Pain label fed to the composite scorer when no explicit base score is
    /// supplied. Flows through the same normalization table as caller-provided
    /// labels.
    pub const fn pain_label(self) -> &'static str {
        match self {
            DistressLevel::Critical => "CRITICAL",
            DistressLevel::Elevated => "ELEVATED",
            DistressLevel::Watch => "MODERATE",
            DistressLevel::Stable => "LOW",
        }
    }
}

/// Severity of a static distress indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalSeverity {
    Info,
    Warning,
    Critical,
}

/// One reported observation from the static signal feed (credit downgrades,
/// enrollment drops, leadership departures already on record).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalIndicator {
    #[serde(rename = "type")]
    pub kind: String,
    pub signal: String,
    pub severity: SignalSeverity,
    pub detected_at: Option<NaiveDate>,
    pub source_url: Option<String>,
}

/// Real-time intelligence category. Exactly three exist per scoring pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntelCategory {
    EnrollmentTrends,
    LeadershipChanges,
    AccreditationStatus,
}

impl IntelCategory {
    pub const ALL: [IntelCategory; 3] = [
        IntelCategory::EnrollmentTrends,
        IntelCategory::LeadershipChanges,
        IntelCategory::AccreditationStatus,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            IntelCategory::EnrollmentTrends => "enrollment_trends",
            IntelCategory::LeadershipChanges => "leadership_changes",
            IntelCategory::AccreditationStatus => "accreditation_status",
        }
    }
}

/// Binary trust classification applied to an extracted claim. `NotAvailable`
/// marks stand-in signals produced when extraction degrades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Credibility {
    #[serde(rename = "TRUSTED")]
    Trusted,
    #[serde(rename = "UNTRUSTED")]
    Untrusted,
    #[serde(rename = "N/A")]
    NotAvailable,
}

/// One extracted claim with its provenance and trust classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntelSignal {
    pub finding: String,
    pub source: String,
    pub credibility: Credibility,
}

impl IntelSignal {
    /// Stand-in produced when the extraction collaborator could not deliver a
    /// usable claim for a category.
    pub fn unavailable() -> Self {
        IntelSignal {
            finding: "Unavailable".to_string(),
            source: "N/A".to_string(),
            credibility: Credibility::NotAvailable,
        }
    }
}

/// The full extracted triple, one signal per category. Extraction failure
/// degrades to the `unavailable` triple, never to a missing structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSet {
    pub enrollment_trends: IntelSignal,
    pub leadership_changes: IntelSignal,
    pub accreditation_status: IntelSignal,
}

impl SignalSet {
    pub fn unavailable() -> Self {
        SignalSet {
            enrollment_trends: IntelSignal::unavailable(),
            leadership_changes: IntelSignal::unavailable(),
            accreditation_status: IntelSignal::unavailable(),
        }
    }

    pub fn get(&self, category: IntelCategory) -> &IntelSignal {
        match category {
            IntelCategory::EnrollmentTrends => &self.enrollment_trends,
            IntelCategory::LeadershipChanges => &self.leadership_changes,
            IntelCategory::AccreditationStatus => &self.accreditation_status,
        }
    }
}

/// Base-score input for the composite scorer: either an explicit numeric pain
/// level or a pain label resolved via the fixed normalization table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BaseScore {
    Numeric(f64),
    Label(String),
}

/// Discrete action priority derived from the final composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UrgencyFlag {
    Immediate,
    High,
    Monitor,
}

impl UrgencyFlag {
    pub const fn label(self) -> &'static str {
        match self {
            UrgencyFlag::Immediate => "IMMEDIATE",
            UrgencyFlag::High => "HIGH",
            UrgencyFlag::Monitor => "MONITOR",
        }
    }
}

/// Anonymized display name for external materials.
pub fn blinded_display_name(org_type: InstitutionType, region: Region) -> String {
    format!(
        "Representative {} ({})",
        org_type.display_label(),
        region.label()
    )
}
