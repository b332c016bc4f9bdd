//! Record types produced by the parser
//!
//! JSON field names follow the wire format consumed by the RankRx front end.

use serde::{Deserialize, Serialize};

/// Outcome of a single dated exam row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttemptStatus {
    #[serde(rename = "PASS")]
    Pass,
    #[serde(rename = "FAIL")]
    Fail,
}

impl AttemptStatus {
    /// Interpret a raw status token such as "PASS", "fail" or "P A S S"
    pub fn from_token(token: &str) -> Option<Self> {
        let compact: String = token
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_uppercase();
        match compact.as_str() {
            "PASS" => Some(AttemptStatus::Pass),
            "FAIL" => Some(AttemptStatus::Fail),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptStatus::Pass => "PASS",
            AttemptStatus::Fail => "FAIL",
        }
    }
}

/// One recorded exam attempt, keyed by its normalized date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamAttempt {
    /// Date as rendered in the document (e.g. "2/02/2021")
    pub date: String,
    /// Month/day without leading zeros; deduplication key only
    pub normalized_date: String,
    pub status: AttemptStatus,
    pub score: Option<String>,
}

/// Aggregated outcome for one USMLE step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    /// Whether any block for this step was found at all
    pub present: bool,
    pub passed: bool,
    /// Date, as written, of the last pass encountered in scan order
    pub pass_date: Option<String>,
    pub score: Option<String>,
    /// Distinct dates whose final status is FAIL
    pub failures: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisaInfo {
    pub authorized_to_work_us: Option<String>,
    pub current_work_authorization: Option<String>,
    pub visa_sponsorship_needed: Option<String>,
    pub visa_sponsorship_sought: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsmleResults {
    pub step1: StepResult,
    pub step2_ck: StepResult,
}

/// ECFMG certification value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Certification {
    Yes,
    No,
    #[default]
    #[serde(rename = "Not Available")]
    NotAvailable,
}

impl Certification {
    /// Map a captured "Yes" / "No" / "Not Available" value, ignoring case
    pub fn from_capture(value: &str) -> Self {
        let lowered = value.trim().to_lowercase();
        match lowered.as_str() {
            "yes" => Certification::Yes,
            "no" => Certification::No,
            _ => Certification::NotAvailable,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcfmgStatus {
    pub present: bool,
    pub certified: Certification,
}

/// Structured record for one application document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub visa: VisaInfo,
    pub usmle: UsmleResults,
    pub ecfmg_status_report: EcfmgStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

/// Error-shaped record returned when a document cannot be read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseFailure {
    pub error: String,
    pub file: String,
}

/// Result of parsing one document file
///
/// Serialized untagged: either the full record or `{error, file}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParseOutcome {
    Parsed(ApplicationRecord),
    Failed(ParseFailure),
}

impl ParseOutcome {
    pub fn file(&self) -> Option<&str> {
        match self {
            ParseOutcome::Parsed(record) => record.file.as_deref(),
            ParseOutcome::Failed(failure) => Some(failure.file.as_str()),
        }
    }

    pub fn record(&self) -> Option<&ApplicationRecord> {
        match self {
            ParseOutcome::Parsed(record) => Some(record),
            ParseOutcome::Failed(_) => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ParseOutcome::Failed(_))
    }
}

/// Position of one applicant within a cohort
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingInfo {
    /// 1-based position, highest score first
    pub rank: usize,
    pub total_candidates: usize,
    pub percentile: u32,
    pub score: f64,
    pub better_than: usize,
}
