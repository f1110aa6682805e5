use serde::{Deserialize, Serialize};

use super::domain::{Credibility, IntelCategory, IntelSignal};

const ENROLLMENT_KEYWORDS: [&str; 6] = ["decline", "drop", "fell", "decreased", "loss", "reduced"];
const LEADERSHIP_KEYWORDS: [&str; 6] = [
    "interim",
    "resignation",
    "resigned",
    "departure",
    "departed",
    "turnover",
];
const ACCREDITATION_KEYWORDS: [&str; 6] = [
    "probation",
    "warning",
    "closure",
    "alert",
    "violation",
    "sanction",
];

const SNIPPET_LIMIT: usize = 80;

/// One amplification applied to the composite score, traceable to a single
/// category and finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreContribution {
    #[serde(rename = "signal")]
    pub category: IntelCategory,
    #[serde(rename = "amplification")]
    pub points: u8,
    pub finding_snippet: String,
}

/// Decide whether one extracted signal contributes amplification.
///
/// Trust gates content: only `Trusted` signals are considered at all, and a
/// trusted signal still contributes nothing unless its finding matches the
/// category's trigger keywords. Returns at most one contribution, so a
/// category can never double-count within a pass.
pub fn gate(category: IntelCategory, signal: &IntelSignal) -> Option<ScoreContribution> {
    if signal.credibility != Credibility::Trusted {
        return None;
    }

    let finding = signal.finding.to_lowercase();
    let matched = keywords(category)
        .iter()
        .any(|keyword| finding.contains(keyword));

    matched.then(|| ScoreContribution {
        category,
        points: category_points(category),
        finding_snippet: snippet(&signal.finding),
    })
}

pub const fn category_points(category: IntelCategory) -> u8 {
    match category {
        IntelCategory::EnrollmentTrends => 10,
        IntelCategory::LeadershipChanges => 15,
        IntelCategory::AccreditationStatus => 20,
    }
}

const fn keywords(category: IntelCategory) -> &'static [&'static str] {
    match category {
        IntelCategory::EnrollmentTrends => &ENROLLMENT_KEYWORDS,
        IntelCategory::LeadershipChanges => &LEADERSHIP_KEYWORDS,
        IntelCategory::AccreditationStatus => &ACCREDITATION_KEYWORDS,
    }
}

fn snippet(finding: &str) -> String {
    match finding.char_indices().nth(SNIPPET_LIMIT) {
        Some((offset, _)) => finding[..offset].to_string(),
        None => finding.to_string(),
    }
}
