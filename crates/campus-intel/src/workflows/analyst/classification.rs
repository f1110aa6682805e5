use super::domain::{DistressLevel, SignalIndicator, SignalSeverity};

/// Map derived ratios and static indicator counts to a distress level.
///
/// First matching rule wins, most severe first. An undefined ratio never
/// promotes: absence of evidence is not distress evidence.
pub fn classify(
    expense_ratio: Option<f64>,
    runway_years: Option<f64>,
    indicators: &[SignalIndicator],
) -> DistressLevel {
    let critical_count = count_severity(indicators, SignalSeverity::Critical);
    let warning_count = count_severity(indicators, SignalSeverity::Warning);

    let ratio_above = |threshold: f64| expense_ratio.is_some_and(|ratio| ratio > threshold);
    let runway_below = |threshold: f64| runway_years.is_some_and(|years| years < threshold);

    if ratio_above(1.2) || runway_below(2.0) || critical_count >= 2 {
        return DistressLevel::Critical;
    }

    if ratio_above(1.0) || runway_below(4.0) || critical_count >= 1 {
        return DistressLevel::Elevated;
    }

    if ratio_above(0.95) || warning_count >= 2 {
        return DistressLevel::Watch;
    }

    DistressLevel::Stable
}

fn count_severity(indicators: &[SignalIndicator], severity: SignalSeverity) -> usize {
    indicators
        .iter()
        .filter(|indicator| indicator.severity == severity)
        .count()
}
