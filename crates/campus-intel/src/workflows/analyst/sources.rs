use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Ein, FinancialFacts, InstitutionRecord, IntelCategory, SignalSet};

/// Terminal status of one collaborator stage. Collaborators recover their own
/// failures into an `Error` marker; nothing here is a Rust error path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Success,
    Skipped,
    Error,
}

/// Raw reconnaissance bundle: one opaque search payload per category, plus
/// the query accounting the external budget enforcer reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconOutcome {
    pub status: StageStatus,
    pub error: Option<String>,
    pub raw_results: BTreeMap<IntelCategory, serde_json::Value>,
    pub queries_executed: u8,
    pub queries_budget: u8,
    pub retrieved_at: DateTime<Utc>,
}

impl ReconOutcome {
    pub fn failed(error: impl Into<String>, retrieved_at: DateTime<Utc>) -> Self {
        ReconOutcome {
            status: StageStatus::Error,
            error: Some(error.into()),
            raw_results: BTreeMap::new(),
            queries_executed: 0,
            queries_budget: QUERY_BUDGET,
            retrieved_at,
        }
    }

    pub fn skipped(retrieved_at: DateTime<Utc>) -> Self {
        ReconOutcome {
            status: StageStatus::Skipped,
            error: None,
            raw_results: BTreeMap::new(),
            queries_executed: 0,
            queries_budget: QUERY_BUDGET,
            retrieved_at,
        }
    }
}

/// Fixed per-institution search budget enforced by the recon collaborator.
pub const QUERY_BUDGET: u8 = 3;

/// Structured extraction result. Failure degrades to the unavailable signal
/// triple so downstream consumers always see a complete structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionOutcome {
    pub status: StageStatus,
    pub error: Option<String>,
    pub signals: SignalSet,
    pub extracted_at: DateTime<Utc>,
}

impl ExtractionOutcome {
    pub fn succeeded(signals: SignalSet, extracted_at: DateTime<Utc>) -> Self {
        ExtractionOutcome {
            status: StageStatus::Success,
            error: None,
            signals,
            extracted_at,
        }
    }

    pub fn failed(error: impl Into<String>, extracted_at: DateTime<Utc>) -> Self {
        ExtractionOutcome {
            status: StageStatus::Error,
            error: Some(error.into()),
            signals: SignalSet::unavailable(),
            extracted_at,
        }
    }
}

/// External web-reconnaissance collaborator. Owns timeouts, retries, and the
/// query budget; the scoring core only consumes the finished outcome.
pub trait Recon {
    fn execute(&self, institution: &InstitutionRecord) -> ReconOutcome;
}

/// External extraction collaborator reducing raw search payloads to the
/// structured signal triple.
pub trait SignalExtractor {
    fn extract(&self, recon: &ReconOutcome, institution: &InstitutionRecord) -> ExtractionOutcome;
}

/// External filings collaborator resolving an EIN to a facts snapshot and
/// institution metadata.
pub trait FinancialFactsProvider {
    fn fetch(&self, ein: &Ein) -> Result<(FinancialFacts, InstitutionRecord), ProviderError>;
}

/// Failure reported by the filings collaborator.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("no filings found for EIN {0}")]
    NotFound(String),
    #[error("filings source unavailable: {0}")]
    Unavailable(String),
}
