use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::credibility::{gate, ScoreContribution};
use super::domain::{BaseScore, IntelCategory, SignalSet, UrgencyFlag};

/// Fallback when a base-score label is not in the normalization table.
const UNKNOWN_LABEL_SCORE: f64 = 50.0;

/// Composite urgency score: a clamped baseline plus credibility-gated
/// amplification, saturating at 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeScore {
    pub composite_score: u8,
    pub urgency_flag: UrgencyFlag,
    pub v1_base_score: u8,
    pub v2_contribution: u8,
    pub signal_breakdown: Vec<ScoreContribution>,
    pub calculated_at: DateTime<Utc>,
}

/// Resolve a base-score input to a clamped numeric baseline.
///
/// Labels map through a fixed table, case-insensitively; an unknown label
/// resolves to the mid-range default rather than failing the pass.
pub fn normalize_base_score(base: &BaseScore) -> f64 {
    match base {
        BaseScore::Numeric(value) => value.clamp(0.0, 100.0),
        BaseScore::Label(label) => match label.trim().to_ascii_uppercase().as_str() {
            "CRITICAL" => 85.0,
            "SEVERE" => 75.0,
            "ELEVATED" => 65.0,
            "MODERATE" => 50.0,
            "LOW" => 25.0,
            "MINIMAL" => 10.0,
            _ => UNKNOWN_LABEL_SCORE,
        },
    }
}

/// Score one extracted signal set against a baseline.
///
/// Deterministic given fixed inputs and the injected clock. The breakdown
/// lists every amplification applied, one entry per contributing category.
pub fn score(base: &BaseScore, signals: &SignalSet, calculated_at: DateTime<Utc>) -> CompositeScore {
    let base_score = normalize_base_score(base);

    let signal_breakdown: Vec<ScoreContribution> = IntelCategory::ALL
        .iter()
        .filter_map(|&category| gate(category, signals.get(category)))
        .collect();

    let amplification: u8 = signal_breakdown
        .iter()
        .map(|contribution| contribution.points)
        .sum();

    // Floor after saturation so amplification is never inflated by rounding.
    let composite_score = (base_score + f64::from(amplification)).min(100.0).floor() as u8;

    CompositeScore {
        composite_score,
        urgency_flag: urgency_for(composite_score),
        v1_base_score: base_score.floor() as u8,
        v2_contribution: amplification,
        signal_breakdown,
        calculated_at,
    }
}

const fn urgency_for(composite_score: u8) -> UrgencyFlag {
    if composite_score >= 90 {
        UrgencyFlag::Immediate
    } else if composite_score >= 75 {
        UrgencyFlag::High
    } else {
        UrgencyFlag::Monitor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::analyst::domain::{Credibility, IntelSignal};
    use chrono::TimeZone;

    fn frozen_clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 3, 12, 0, 0).single().expect("valid timestamp")
    }

    fn trusted(finding: &str) -> IntelSignal {
        IntelSignal {
            finding: finding.to_string(),
            source: "Higher Ed Chronicle, 2025-01-30".to_string(),
            credibility: Credibility::Trusted,
        }
    }

    fn all_trusted_matching() -> SignalSet {
        SignalSet {
            enrollment_trends: trusted("enrollment decline of 9%"),
            leadership_changes: trusted("interim president appointed"),
            accreditation_status: trusted("accreditor placed school on probation"),
        }
    }

    #[test]
    fn label_table_normalizes_case_insensitively() {
        assert_eq!(
            normalize_base_score(&BaseScore::Label("critical".to_string())),
            85.0
        );
        assert_eq!(
            normalize_base_score(&BaseScore::Label(" Severe ".to_string())),
            75.0
        );
        assert_eq!(
            normalize_base_score(&BaseScore::Label("MINIMAL".to_string())),
            10.0
        );
    }

    #[test]
    fn unknown_label_resolves_to_midrange() {
        assert_eq!(
            normalize_base_score(&BaseScore::Label("CATASTROPHIC".to_string())),
            50.0
        );
    }

    #[test]
    fn numeric_base_clamps_to_valid_range() {
        assert_eq!(normalize_base_score(&BaseScore::Numeric(-10.0)), 0.0);
        assert_eq!(normalize_base_score(&BaseScore::Numeric(140.0)), 100.0);
        assert_eq!(normalize_base_score(&BaseScore::Numeric(62.0)), 62.0);
    }

    #[test]
    fn trusted_probation_signal_lifts_base_to_high() {
        let signals = SignalSet {
            accreditation_status: trusted("placed on probation by regional accreditor"),
            ..SignalSet::unavailable()
        };

        let result = score(&BaseScore::Numeric(55.0), &signals, frozen_clock());

        assert_eq!(result.v2_contribution, 20);
        assert_eq!(result.composite_score, 75);
        assert_eq!(result.urgency_flag, UrgencyFlag::High);
        assert_eq!(result.signal_breakdown.len(), 1);
        assert_eq!(
            result.signal_breakdown[0].category,
            IntelCategory::AccreditationStatus
        );
    }

    #[test]
    fn composite_saturates_at_one_hundred() {
        let result = score(&BaseScore::Numeric(100.0), &all_trusted_matching(), frozen_clock());

        assert_eq!(result.v2_contribution, 45);
        assert_eq!(result.composite_score, 100);
        assert_eq!(result.urgency_flag, UrgencyFlag::Immediate);
    }

    #[test]
    fn composite_never_drops_below_base() {
        let result = score(&BaseScore::Numeric(40.0), &SignalSet::unavailable(), frozen_clock());
        assert_eq!(result.composite_score, 40);
        assert_eq!(result.v2_contribution, 0);
        assert!(result.signal_breakdown.is_empty());
    }

    #[test]
    fn fractional_amplified_score_floors() {
        let signals = SignalSet {
            enrollment_trends: trusted("applications dropped sharply"),
            ..SignalSet::unavailable()
        };

        let result = score(&BaseScore::Numeric(64.7), &signals, frozen_clock());
        assert_eq!(result.composite_score, 74);
        assert_eq!(result.urgency_flag, UrgencyFlag::Monitor);
    }

    #[test]
    fn amplification_is_monotonic_in_matching_trusted_signals() {
        let base = BaseScore::Numeric(10.0);
        let none = score(&base, &SignalSet::unavailable(), frozen_clock());

        let one = score(
            &base,
            &SignalSet {
                enrollment_trends: trusted("enrollment fell again"),
                ..SignalSet::unavailable()
            },
            frozen_clock(),
        );

        let three = score(&base, &all_trusted_matching(), frozen_clock());

        assert!(none.composite_score <= one.composite_score);
        assert!(one.composite_score <= three.composite_score);
    }

    #[test]
    fn untrusted_signals_contribute_nothing() {
        let signals = SignalSet {
            leadership_changes: IntelSignal {
                finding: "provost resignation rumored on forums".to_string(),
                source: "campus message board".to_string(),
                credibility: Credibility::Untrusted,
            },
            ..SignalSet::unavailable()
        };

        let result = score(&BaseScore::Numeric(70.0), &signals, frozen_clock());
        assert_eq!(result.v2_contribution, 0);
        assert_eq!(result.composite_score, 70);
    }

    #[test]
    fn scoring_is_deterministic_under_a_frozen_clock() {
        let base = BaseScore::Label("SEVERE".to_string());
        let signals = all_trusted_matching();

        let first = score(&base, &signals, frozen_clock());
        let second = score(&base, &signals, frozen_clock());
        assert_eq!(first, second);
    }
}
