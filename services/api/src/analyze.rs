use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use campus_intel::config::AppConfig;
use campus_intel::error::AppError;
use campus_intel::workflows::analyst::{
    batch::run_cohort, dossier::render_dossier, parse_cohort, AnalysisRequest, AnalystService,
    BaseScore, BatchReport, Ein, FinancialFactsProvider,
};
use chrono::Utc;
use clap::Args;

use crate::infra::{fixture_indicators, FixtureExtractor, FixtureFilings, FixtureRecon};

#[derive(Args, Debug)]
pub(crate) struct AnalyzeArgs {
    /// Target EIN, with or without the hyphen (e.g. 23-1352607)
    #[arg(long)]
    pub(crate) ein: String,
    /// Explicit base score: a numeric pain level or a pain label
    #[arg(long)]
    pub(crate) base_score: Option<String>,
    /// Skip real-time enrichment and emit the baseline profile only
    #[arg(long)]
    pub(crate) no_enrichment: bool,
    /// Print the profile as JSON instead of the markdown dossier
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct BatchArgs {
    /// Cohort CSV with Name, EIN, and optional Base Score columns
    #[arg(long)]
    pub(crate) cohort: PathBuf,
    /// Print the full report as JSON instead of the row table
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let mut analyst_config = AppConfig::load()?.analyst;
    if args.no_enrichment {
        analyst_config.enable_v2_enrichment = false;
    }

    let filings = FixtureFilings::default();
    let (facts, institution) = filings.fetch(&Ein(args.ein.clone()))?;
    let indicators = fixture_indicators(&institution.name);

    let service = AnalystService::new(
        Arc::new(FixtureRecon),
        Arc::new(FixtureExtractor),
        analyst_config,
    );

    let request = AnalysisRequest {
        institution,
        facts,
        indicators,
        base_score: args.base_score.as_deref().map(parse_base_score),
    };
    let outcome = service.analyze(&request, Utc::now());

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&outcome.profile).map_err(std::io::Error::other)?
        );
    } else {
        println!("{}", render_dossier(&outcome.profile));
    }

    println!(
        "run status: {} (phases: {})",
        outcome.run.status.label(),
        outcome.run.phases_executed.join(" -> ")
    );
    Ok(())
}

pub(crate) fn run_batch(args: BatchArgs) -> Result<(), AppError> {
    let analyst_config = AppConfig::load()?.analyst;
    let cohort = parse_cohort(File::open(&args.cohort)?)?;

    let filings = FixtureFilings::default();
    let service = AnalystService::new(
        Arc::new(FixtureRecon),
        Arc::new(FixtureExtractor),
        analyst_config,
    );

    let report = run_cohort(&filings, &service, &cohort, Utc::now());

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).map_err(std::io::Error::other)?
        );
        return Ok(());
    }

    render_batch_report(&report);
    Ok(())
}

fn render_batch_report(report: &BatchReport) {
    println!(
        "{:<28} {:<12} {:<10} {:<9} {:<9} {:<7} error",
        "institution", "ein", "status", "score", "urgency", "delta"
    );
    for row in &report.rows {
        println!(
            "{:<28} {:<12} {:<10} {:<9} {:<9} {:<7} {}",
            row.name,
            row.ein,
            row.status.label(),
            display_option(row.composite_score),
            row.urgency_flag
                .map(|flag| flag.label().to_string())
                .unwrap_or_else(|| "-".to_string()),
            display_option(row.score_delta),
            row.error.as_deref().unwrap_or("-"),
        );
    }

    let summary = &report.summary;
    println!(
        "\n{} scored: {} succeeded, {} failed, {} skipped",
        summary.total, summary.succeeded, summary.failed, summary.skipped
    );
    println!(
        "score differentiation: {} | urgency variation: {}",
        summary.score_differentiation, summary.urgency_variation
    );
}

fn display_option<T: std::fmt::Display>(value: Option<T>) -> String {
    value
        .map(|inner| inner.to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn parse_base_score(raw: &str) -> BaseScore {
    match raw.trim().parse::<f64>() {
        Ok(value) => BaseScore::Numeric(value),
        Err(_) => BaseScore::Label(raw.trim().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_score_argument_accepts_numbers_and_labels() {
        assert_eq!(parse_base_score("62"), BaseScore::Numeric(62.0));
        assert_eq!(
            parse_base_score(" SEVERE "),
            BaseScore::Label("SEVERE".to_string())
        );
    }
}
