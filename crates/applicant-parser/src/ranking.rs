//! Composite applicant score and cohort ranking
//!
//! Step 2 CK performance carries most of the weight, followed by a Step 1
//! pass, exam failures, visa sponsorship need and ECFMG certification.

use std::path::Path;

use crate::error::ParseError;
use crate::types::{ApplicationRecord, Certification, RankingInfo};

const STEP2_WEIGHT: f64 = 0.55;
const STEP1_WEIGHT: f64 = 0.25;
const FAILURE_WEIGHT: f64 = 0.10;
const VISA_WEIGHT: f64 = 0.05;
const ECFMG_WEIGHT: f64 = 0.05;

/// Step 2 scores at or below this contribute nothing
const STEP2_FLOOR: f64 = 180.0;
/// Points above the floor that earn the full Step 2 component
const STEP2_SPAN: f64 = 100.0;
/// Credit for a Step 2 pass with no reported score
const STEP2_UNSCORED_PASS: f64 = 0.7;
/// Failures beyond this count no further
const MAX_FAILURES: u32 = 3;

/// Score in [0, 1], rounded to four decimals
pub fn application_score(record: &ApplicationRecord) -> f64 {
    let step1 = &record.usmle.step1;
    let step2 = &record.usmle.step2_ck;

    let s1_pass = if step1.passed { 1.0 } else { 0.0 };
    let s2_pass = if step2.passed { 1.0 } else { 0.0 };

    let s2_component = match step2
        .score
        .as_deref()
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|s| !s.is_nan() && *s != 0.0)
    {
        Some(score) => ((score - STEP2_FLOOR) / STEP2_SPAN).clamp(0.0, 1.0),
        None => s2_pass * STEP2_UNSCORED_PASS,
    };

    let failures = (step1.failures + step2.failures).min(MAX_FAILURES);
    let failure_component = (1.0 - f64::from(failures) / f64::from(MAX_FAILURES)).max(0.0);

    let visa_needed = record.visa.visa_sponsorship_needed.as_deref() == Some("Yes");
    let ecfmg_yes = record.ecfmg_status_report.certified == Certification::Yes;

    let score = STEP2_WEIGHT * s2_component
        + STEP1_WEIGHT * s1_pass
        + FAILURE_WEIGHT * failure_component
        + VISA_WEIGHT * if visa_needed { 0.0 } else { 1.0 }
        + ECFMG_WEIGHT * if ecfmg_yes { 1.0 } else { 0.0 };

    (score * 10_000.0).round() / 10_000.0
}

/// Place `candidate` within `cohort`, highest score first
///
/// The candidate is ranked after any cohort member with an equal score.
pub fn rank_against(cohort: &[ApplicationRecord], candidate: &ApplicationRecord) -> RankingInfo {
    let candidate_score = application_score(candidate);

    let mut scores: Vec<(f64, bool)> = cohort
        .iter()
        .map(|record| (application_score(record), false))
        .collect();
    scores.push((candidate_score, true));

    // stable sort keeps the candidate behind equal scores
    scores.sort_by(|a, b| b.0.total_cmp(&a.0));

    let total = scores.len();
    let rank = scores
        .iter()
        .position(|(_, is_candidate)| *is_candidate)
        .map_or(total, |i| i + 1);
    let better_than = total - rank;
    let percentile = ((better_than as f64 / total as f64) * 100.0).round() as u32;

    RankingInfo {
        rank,
        total_candidates: total,
        percentile,
        score: candidate_score,
        better_than,
    }
}

/// Read a cohort of records from a JSON array
pub fn load_cohort(path: impl AsRef<Path>) -> Result<Vec<ApplicationRecord>, ParseError> {
    let data = std::fs::read_to_string(path)?;
    let cohort = serde_json::from_str(&data)?;
    Ok(cohort)
}
