//! USMLE step outcome extraction
//!
//! Every dated PASS/FAIL row inside a step's blocks becomes an attempt. Attempts
//! are deduplicated per calendar date through [`AttemptLedger`]; a later PASS
//! for the same date replaces what was recorded, a FAIL never does.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::patterns::{DATE_TOKEN, SCORE_BARE, SCORE_PAREN, STATUS_TOKEN};
use crate::types::{AttemptStatus, ExamAttempt, StepResult};

/// Deduplication key: month and day without leading zeros, year untouched
///
/// "2/02/2021" and "02/2/2021" both become "2/2/2021".
pub fn normalize_date(date: &str) -> String {
    let parts: Vec<&str> = date.split('/').collect();
    if parts.len() != 3 {
        return date.to_string();
    }
    format!(
        "{}/{}/{}",
        strip_leading_zeros(parts[0]),
        strip_leading_zeros(parts[1]),
        parts[2]
    )
}

fn strip_leading_zeros(part: &str) -> &str {
    let trimmed = part.trim_start_matches('0');
    if trimmed.is_empty() && !part.is_empty() {
        "0"
    } else {
        trimmed
    }
}

/// Read one line as a dated attempt; narrative and header lines yield `None`
pub fn attempt_from_line(line: &str) -> Option<ExamAttempt> {
    let date = DATE_TOKEN.find(line)?;
    let status = STATUS_TOKEN.find(line)?;
    let status = AttemptStatus::from_token(status.as_str())?;

    let score = SCORE_PAREN
        .captures(line)
        .or_else(|| SCORE_BARE.captures(line))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string());

    Some(ExamAttempt {
        date: date.as_str().to_string(),
        normalized_date: normalize_date(date.as_str()),
        status,
        score,
    })
}

/// Line separators recognised inside step blocks, a lone `\r` included
///
/// A `\r\n` pair leaves an empty piece that the blank-line filter drops.
fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Attempts from every non-blank line, in scan order, before deduplication
pub fn scan_attempts(text: &str) -> Vec<ExamAttempt> {
    text.split(is_line_break)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let attempt = attempt_from_line(line);
            if attempt.is_none() {
                trace!(line, "skipping line without date and status");
            }
            attempt
        })
        .collect()
}

/// Ordered map of attempts keyed by normalized date
///
/// Keys keep the position where they were first seen. Overwriting a key
/// replaces the attempt in place.
#[derive(Debug, Default)]
pub struct AttemptLedger {
    attempts: Vec<ExamAttempt>,
    index: HashMap<String, usize>,
}

impl AttemptLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the tie-break rule for one scanned attempt
    ///
    /// Returns true when the ledger changed.
    pub fn record(&mut self, attempt: ExamAttempt) -> bool {
        match self.index.get(&attempt.normalized_date) {
            None => {
                self.index
                    .insert(attempt.normalized_date.clone(), self.attempts.len());
                self.attempts.push(attempt);
                true
            }
            Some(&slot) if attempt.status == AttemptStatus::Pass => {
                self.attempts[slot] = attempt;
                true
            }
            Some(_) => false,
        }
    }

    pub fn attempts(&self) -> &[ExamAttempt] {
        &self.attempts
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    /// Collapse the ledger into a step result
    pub fn summarize(&self, present: bool) -> StepResult {
        let failures = self
            .attempts
            .iter()
            .filter(|a| a.status == AttemptStatus::Fail)
            .count() as u32;

        let passes: Vec<&ExamAttempt> = self
            .attempts
            .iter()
            .filter(|a| a.status == AttemptStatus::Pass)
            .collect();

        let pass_date = passes.last().map(|a| a.date.clone());
        let score = passes.iter().rev().find_map(|a| a.score.clone());

        StepResult {
            present,
            passed: !passes.is_empty(),
            pass_date,
            score,
            failures,
        }
    }
}

impl FromIterator<ExamAttempt> for AttemptLedger {
    fn from_iter<I: IntoIterator<Item = ExamAttempt>>(iter: I) -> Self {
        let mut ledger = AttemptLedger::new();
        for attempt in iter {
            ledger.record(attempt);
        }
        ledger
    }
}

/// Outcome for one step from the blocks matched for it
///
/// An empty slice means the step section never appeared in the document.
pub fn extract_step(blocks: &[&str]) -> StepResult {
    let present = !blocks.is_empty();
    let scan = blocks.join("\n");

    let ledger: AttemptLedger = scan_attempts(&scan).into_iter().collect();
    let result = ledger.summarize(present);

    debug!(
        blocks = blocks.len(),
        dates = ledger.len(),
        passed = result.passed,
        failures = result.failures,
        "step outcome extracted"
    );

    result
}
