use std::fmt::Write;

use super::domain::{DistressLevel, SignalIndicator, SignalSeverity};
use super::profile::Profile;

/// Render a profile as a human-readable markdown dossier. Rendering only;
/// where the document goes is the caller's concern.
pub fn render_dossier(profile: &Profile) -> String {
    let mut out = String::new();
    let financials = &profile.financials;
    let calculated = &financials.calculated;
    let distress_level = profile.signals.distress_level;

    let _ = writeln!(out, "# Prospect Dossier: {}\n", profile.institution.name);
    let _ = writeln!(out, "| Field | Value |");
    let _ = writeln!(out, "|-------|-------|");
    let _ = writeln!(
        out,
        "| Generated | {} |",
        profile.meta.generated_at.format("%Y-%m-%d %H:%M:%S")
    );
    let _ = writeln!(out, "| Agent | {} |", profile.meta.generated_by);
    let _ = writeln!(out, "| EIN | {} |", profile.institution.ein);
    let _ = writeln!(
        out,
        "| Data Source | {} ({}) |\n",
        financials.data_source.form, financials.fiscal_year
    );

    let _ = writeln!(out, "## Executive Summary\n");
    let _ = writeln!(out, "**Institution:** {}  ", profile.institution.name);
    let _ = writeln!(out, "**Health Status:** {}  ", health_status(distress_level));
    let _ = writeln!(
        out,
        "**Distress Level:** {}\n",
        distress_level.label().to_uppercase()
    );

    let _ = writeln!(out, "## Financial Overview (FY{})\n", financials.fiscal_year);
    let _ = writeln!(out, "| Metric | Value |");
    let _ = writeln!(out, "|--------|-------|");
    let _ = writeln!(
        out,
        "| Total Revenue | {} |",
        fmt_currency(financials.total_revenue)
    );
    let _ = writeln!(
        out,
        "| Total Expenses | {} |",
        fmt_currency(financials.total_expenses)
    );
    let _ = writeln!(
        out,
        "| Operating Result | {} |",
        fmt_currency(financials.operating_surplus_deficit)
    );
    let _ = writeln!(
        out,
        "| Net Assets | {} |\n",
        fmt_currency(financials.net_assets)
    );

    let _ = writeln!(out, "### Calculated Indicators\n");
    let _ = writeln!(out, "| Indicator | Value | Interpretation |");
    let _ = writeln!(out, "|-----------|-------|----------------|");
    let _ = writeln!(
        out,
        "| Expense Ratio | {} | {} |",
        calculated
            .expense_ratio
            .map(|ratio| format!("{:.1}%", ratio * 100.0))
            .unwrap_or_else(|| "N/A".to_string()),
        expense_interpretation(calculated.expense_ratio)
    );
    let _ = writeln!(
        out,
        "| Runway (Years) | {} | {} |\n",
        calculated
            .runway_years
            .map(|years| format!("{years:.1}"))
            .unwrap_or_else(|| "N/A".to_string()),
        runway_interpretation(calculated.runway_years)
    );

    let _ = writeln!(out, "## Distress Signals\n");
    let _ = writeln!(out, "{}\n", format_indicators(&profile.signals.indicators));

    if let Some(v2) = &profile.v2_signals {
        let _ = writeln!(out, "## Real-Time Intelligence\n");
        let _ = writeln!(
            out,
            "**Composite Score:** {} ({} base + {} amplification)  ",
            v2.composite_score, v2.v1_base_score, v2.v2_contribution
        );
        let _ = writeln!(out, "**Urgency Flag:** {}\n", v2.urgency_flag.label());
        if v2.signal_breakdown.is_empty() {
            let _ = writeln!(out, "*(No trusted amplifying signals)*\n");
        } else {
            for contribution in &v2.signal_breakdown {
                let _ = writeln!(
                    out,
                    "- +{} {}: {}",
                    contribution.points,
                    contribution.category.label(),
                    contribution.finding_snippet
                );
            }
            let _ = writeln!(out);
        }
    }

    let _ = writeln!(out, "## Engagement Recommendation\n");
    let _ = writeln!(out, "{}\n", recommendation(distress_level));

    let _ = writeln!(out, "## Blinded Presentation\n");
    let _ = writeln!(out, "> **{}**", profile.blinded_presentation.display_name);
    let _ = writeln!(
        out,
        "> Expense ratio: {} | Runway: {}\n",
        calculated
            .expense_ratio
            .map(|ratio| format!("{:.0}%", ratio * 100.0))
            .unwrap_or_else(|| "N/A".to_string()),
        calculated
            .runway_years
            .map(|years| format!("{years:.1} years"))
            .unwrap_or_else(|| "N/A".to_string())
    );
    let _ = writeln!(
        out,
        "*Schema Version: {}*",
        profile.meta.schema_version
    );

    out
}

/// Compact currency rendering: `$81.1M`, `$450.0K`, `$900`, `N/A`.
pub fn fmt_currency(value: Option<f64>) -> String {
    let Some(value) = value else {
        return "N/A".to_string();
    };

    if value.abs() >= 1_000_000.0 {
        format!("${:.1}M", value / 1_000_000.0)
    } else if value.abs() >= 1_000.0 {
        format!("${:.1}K", value / 1_000.0)
    } else {
        format!("${value:.0}")
    }
}

const fn health_status(level: DistressLevel) -> &'static str {
    match level {
        DistressLevel::Critical => "CRITICAL",
        DistressLevel::Elevated => "ELEVATED RISK",
        DistressLevel::Watch => "WATCH",
        DistressLevel::Stable => "STABLE",
    }
}

fn expense_interpretation(ratio: Option<f64>) -> &'static str {
    match ratio {
        Some(ratio) if ratio > 1.0 => "Deficit spending",
        Some(_) => "Within budget",
        None => "—",
    }
}

fn runway_interpretation(years: Option<f64>) -> &'static str {
    match years {
        Some(years) if years < 2.0 => "Critical (<2 years)",
        Some(years) if years < 4.0 => "Limited (<4 years)",
        Some(_) => "—",
        None => "No measurable burn",
    }
}

fn format_indicators(indicators: &[SignalIndicator]) -> String {
    if indicators.is_empty() {
        return "*(No active distress signals detected)*".to_string();
    }

    indicators
        .iter()
        .map(|indicator| {
            let date = indicator
                .detected_at
                .map(|date| date.to_string())
                .unwrap_or_else(|| "Unknown date".to_string());
            format!(
                "- [{}] **{}** — {}: {}",
                severity_tag(indicator.severity),
                date,
                indicator.kind,
                indicator.signal
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

const fn severity_tag(severity: SignalSeverity) -> &'static str {
    match severity {
        SignalSeverity::Critical => "CRITICAL",
        SignalSeverity::Warning => "WARNING",
        SignalSeverity::Info => "INFO",
    }
}

const fn recommendation(level: DistressLevel) -> &'static str {
    match level {
        DistressLevel::Critical => {
            "**PRIORITY: HIGH**\n\nCritical distress indicators present. Immediate outreach \
             recommended: operational triage, financial stabilization, leadership advisory."
        }
        DistressLevel::Elevated => {
            "**PRIORITY: MEDIUM-HIGH**\n\nElevated risk indicators present. Proactive outreach \
             recommended: financial health assessment, operational efficiency review."
        }
        DistressLevel::Watch => {
            "**PRIORITY: MEDIUM**\n\nEarly warning indicators present. Add to watch list and \
             consider outreach if additional signals emerge."
        }
        DistressLevel::Stable => {
            "**PRIORITY: LOW**\n\nInstitution appears financially stable. Monitor only unless \
             new distress signals emerge."
        }
    }
}
