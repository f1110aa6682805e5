use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::domain::{InstitutionRecord, SignalSet};
use super::sources::{
    ExtractionOutcome, Recon, ReconOutcome, SignalExtractor, StageStatus, QUERY_BUDGET,
};
use super::{AnalysisRequest, AnalystConfig, AnalystService};

/// Router builder exposing the scoring pipeline over HTTP.
pub fn profile_router() -> Router {
    Router::new().route("/api/v1/profiles/score", post(score_handler))
}

/// Scoring request: the analysis inputs plus, optionally, the signal triple
/// the external extraction collaborator already produced. Omitting `intel`
/// requests a baseline-only profile.
#[derive(Debug, Deserialize)]
pub struct ScoreProfileRequest {
    #[serde(flatten)]
    pub analysis: AnalysisRequest,
    #[serde(default)]
    pub intel: Option<SignalSet>,
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
}

pub(crate) async fn score_handler(Json(request): Json<ScoreProfileRequest>) -> Response {
    let now = request.generated_at.unwrap_or_else(Utc::now);
    let enriched = request.intel.is_some();

    let service = AnalystService::new(
        Arc::new(ForwardedRecon { executed: enriched }),
        Arc::new(ForwardedExtraction {
            signals: request.intel.clone(),
        }),
        AnalystConfig {
            enable_v2_enrichment: enriched,
            default_base_score: None,
        },
    );

    let outcome = service.analyze(&request.analysis, now);
    (StatusCode::OK, Json(outcome)).into_response()
}

/// Stand-in recon collaborator for callers that ran reconnaissance upstream
/// and forward only the finished extraction.
struct ForwardedRecon {
    executed: bool,
}

impl Recon for ForwardedRecon {
    fn execute(&self, _institution: &InstitutionRecord) -> ReconOutcome {
        let mut outcome = ReconOutcome::skipped(Utc::now());
        if self.executed {
            outcome.status = StageStatus::Success;
            outcome.queries_executed = QUERY_BUDGET;
        }
        outcome
    }
}

struct ForwardedExtraction {
    signals: Option<SignalSet>,
}

impl SignalExtractor for ForwardedExtraction {
    fn extract(&self, _recon: &ReconOutcome, _institution: &InstitutionRecord) -> ExtractionOutcome {
        match &self.signals {
            Some(signals) => ExtractionOutcome::succeeded(signals.clone(), Utc::now()),
            None => ExtractionOutcome::failed("no extracted signals forwarded", Utc::now()),
        }
    }
}
