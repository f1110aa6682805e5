use super::domain::{DerivedMetrics, FinancialFacts};

/// Derive the calculated ratio block from one filing snapshot. Total: every
/// division is guarded, any field may be absent, and no input combination
/// panics.
pub fn derive_metrics(facts: &FinancialFacts) -> DerivedMetrics {
    let operating_surplus_deficit = match (facts.total_revenue, facts.total_expenses) {
        (Some(revenue), Some(expenses)) => Some(revenue - expenses),
        _ => None,
    };

    let expense_ratio = match (facts.total_revenue, facts.total_expenses) {
        (Some(revenue), Some(expenses)) if revenue > 0.0 => Some(round3(expenses / revenue)),
        _ => None,
    };

    // Runway is only meaningful while reserves are being burned. A surplus
    // position yields None; so does a deficit with depleted net assets, which
    // callers must detect separately via `net_assets <= 0`.
    let runway_years = match (operating_surplus_deficit, facts.net_assets) {
        (Some(deficit), Some(net_assets)) if deficit < 0.0 && net_assets > 0.0 => {
            Some(round1(net_assets / deficit.abs()))
        }
        _ => None,
    };

    // Tuition present-as-zero is a real observation (0.0), distinct from an
    // absent figure (None).
    let tuition_dependency = match (facts.tuition_revenue, facts.total_revenue) {
        (Some(tuition), Some(revenue)) if revenue > 0.0 => Some(round3(tuition / revenue)),
        _ => None,
    };

    DerivedMetrics {
        expense_ratio,
        operating_surplus_deficit,
        runway_years,
        tuition_dependency,
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
