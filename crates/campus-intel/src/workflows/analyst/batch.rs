use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::cohort::CohortMember;
use super::domain::{DistressLevel, UrgencyFlag};
use super::sources::FinancialFactsProvider;
use super::{AnalysisRequest, AnalystService, Recon, RunStatus, SignalExtractor};

/// Per-institution outcome of a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchRowStatus {
    Succeeded,
    Failed,
    Skipped,
}

impl BatchRowStatus {
    pub const fn label(self) -> &'static str {
        match self {
            BatchRowStatus::Succeeded => "succeeded",
            BatchRowStatus::Failed => "failed",
            BatchRowStatus::Skipped => "skipped",
        }
    }
}

/// One report row. `score_delta` is `None` whenever the enriched score does
/// not exist, so an unknown movement is never reported as "no change".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRow {
    pub name: String,
    pub ein: String,
    pub status: BatchRowStatus,
    pub distress_level: Option<DistressLevel>,
    pub composite_score: Option<u8>,
    pub urgency_flag: Option<UrgencyFlag>,
    pub score_delta: Option<i16>,
    pub error: Option<String>,
}

/// Cohort-level rollup used to judge whether scoring differentiated at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub score_differentiation: bool,
    pub urgency_variation: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub rows: Vec<BatchRow>,
    pub summary: CohortSummary,
    pub completed_at: DateTime<Utc>,
}

/// Score a cohort strictly sequentially. A failed institution produces a
/// failed row and the run continues; nothing here retries or blocks.
pub fn run_cohort<P, R, X>(
    provider: &P,
    service: &AnalystService<R, X>,
    cohort: &[CohortMember],
    now: DateTime<Utc>,
) -> BatchReport
where
    P: FinancialFactsProvider,
    R: Recon,
    X: SignalExtractor,
{
    let mut rows = Vec::with_capacity(cohort.len());

    for member in cohort {
        info!(institution = %member.name, ein = %member.ein.formatted(), "scoring institution");
        rows.push(score_member(provider, service, member, now));
    }

    let summary = summarize(&rows);
    info!(
        total = summary.total,
        succeeded = summary.succeeded,
        failed = summary.failed,
        "cohort run finished"
    );

    BatchReport {
        rows,
        summary,
        completed_at: now,
    }
}

fn score_member<P, R, X>(
    provider: &P,
    service: &AnalystService<R, X>,
    member: &CohortMember,
    now: DateTime<Utc>,
) -> BatchRow
where
    P: FinancialFactsProvider,
    R: Recon,
    X: SignalExtractor,
{
    let (facts, institution) = match provider.fetch(&member.ein) {
        Ok(fetched) => fetched,
        Err(error) => {
            warn!(institution = %member.name, %error, "filings fetch failed");
            return BatchRow {
                name: member.name.clone(),
                ein: member.ein.formatted(),
                status: BatchRowStatus::Failed,
                distress_level: None,
                composite_score: None,
                urgency_flag: None,
                score_delta: None,
                error: Some(error.to_string()),
            };
        }
    };

    let request = AnalysisRequest {
        institution,
        facts,
        indicators: Vec::new(),
        base_score: member.base_score.clone(),
    };
    let outcome = service.analyze(&request, now);

    let v2 = outcome.profile.v2_signals.as_ref();
    let status = match outcome.run.status {
        RunStatus::Complete => BatchRowStatus::Succeeded,
        RunStatus::Skipped => BatchRowStatus::Skipped,
        RunStatus::Failed => BatchRowStatus::Failed,
    };

    BatchRow {
        name: member.name.clone(),
        ein: member.ein.formatted(),
        status,
        distress_level: Some(outcome.profile.signals.distress_level),
        composite_score: v2.map(|block| block.composite_score),
        urgency_flag: v2.map(|block| block.urgency_flag),
        score_delta: v2
            .map(|block| i16::from(block.composite_score) - i16::from(block.v1_base_score)),
        error: outcome.run.error,
    }
}

fn summarize(rows: &[BatchRow]) -> CohortSummary {
    let scores: BTreeSet<u8> = rows.iter().filter_map(|row| row.composite_score).collect();
    let urgencies: BTreeSet<&'static str> = rows
        .iter()
        .filter_map(|row| row.urgency_flag.map(UrgencyFlag::label))
        .collect();

    CohortSummary {
        total: rows.len(),
        succeeded: count_status(rows, BatchRowStatus::Succeeded),
        failed: count_status(rows, BatchRowStatus::Failed),
        skipped: count_status(rows, BatchRowStatus::Skipped),
        score_differentiation: scores.len() > 1,
        urgency_variation: urgencies.len() > 1,
    }
}

fn count_status(rows: &[BatchRow], status: BatchRowStatus) -> usize {
    rows.iter().filter(|row| row.status == status).count()
}
