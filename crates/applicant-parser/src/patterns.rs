//! Pattern library for application fields and USMLE step sections
//!
//! All field patterns are case-insensitive, multiline and dot-matches-newline,
//! and are compiled once. Step sections are isolated by header lines before
//! any dated row is read, so a Step 1 row printed on the same page as Step 2
//! is never counted against the wrong exam.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::types::AttemptStatus;

/// Status token, tolerant of spacing inside the word ("P A S S")
const STATUS: &str = r"(?:P\s*A\s*S\s*S|F\s*A\s*I\s*L)";

lazy_static! {
    /// "Authorized to Work in the U.S.: Yes|No"
    pub static ref AUTH: Regex =
        Regex::new(r"(?ims)Authorized\s*to\s*Work\s*in\s*the\s*U\.?S\.?\s*:\s*(Yes|No)").unwrap();

    /// "Current Work Authorization: <rest of line>"
    pub static ref WORK_AUTH: Regex =
        Regex::new(r"(?ims)Current\s*Work\s*Authorization\s*:\s*([^\n]+)").unwrap();

    /// "Visa Sponsorship Need(ed): Yes|No"
    pub static ref VISA_NEEDED: Regex =
        Regex::new(r"(?ims)Visa\s*Sponsorship\s*Need(?:ed)?\s*:\s*(Yes|No)").unwrap();

    /// "Visa Sponsorship Sought: <rest of line>"
    pub static ref VISA_SOUGHT: Regex =
        Regex::new(r"(?ims)Visa\s*Sponsorship\s*Sought\s*:\s*([^\n]+)").unwrap();

    /// "ECFMG Certified: Yes|No|Not Available"
    // leftmost alternative wins, so "Not Available" must be tried before "No"
    pub static ref ECFMG: Regex =
        Regex::new(r"(?ims)ECFMG\s*Certified\s*:\s*(Yes|Not Available|No)").unwrap();

    static ref STEP1_HEADER: Regex = Regex::new(r"(?i)USMLE\s*STEP\s*1").unwrap();
    static ref STEP2_HEADER: Regex = Regex::new(r"(?i)USMLE\s*STEP\s*2").unwrap();

    // Anchored at the start of the remaining text, i.e. the start of a line
    static ref STEP1_STOP: Regex = Regex::new(r"(?i)^USMLE\s*STEP\s*2").unwrap();
    static ref STEP2_STOP: Regex =
        Regex::new(r"(?i)^(?:USMLE\s*STEP\s*1|USMLE\s*STEP\s*3|ECFMG)").unwrap();

    /// Word-bounded PASS/FAIL token
    pub static ref STATUS_TOKEN: Regex = Regex::new(&format!(r"(?i)\b{STATUS}\b")).unwrap();

    /// First date on a row: D{1,2}/D{1,2}/D{2,4}
    pub static ref DATE_TOKEN: Regex = Regex::new(r"\d{1,2}/\d{1,2}/\d{2,4}\b").unwrap();

    /// Score in parentheses: "(210)"
    pub static ref SCORE_PAREN: Regex = Regex::new(r"\((\d{3})\)").unwrap();

    /// Bare score bounded by whitespace or end of line
    pub static ref SCORE_BARE: Regex = Regex::new(r"\s(\d{3})(?:\s|$)").unwrap();

    static ref ROW_DATE: Regex = Regex::new(r"\d{1,2}/\d{1,2}/\d{2,4}").unwrap();

    static ref ROW_ALT: Regex = Regex::new(&format!(
        r"(?i)(\d{{1,2}}/\d{{1,2}}/\d{{2,4}})\s+({STATUS})\b(?:.*?\b(\d{{3}})\b)?"
    ))
    .unwrap();
}

/// Which USMLE step a block belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Step1,
    Step2Ck,
}

impl Step {
    fn header(&self) -> &'static Regex {
        match self {
            Step::Step1 => &STEP1_HEADER,
            Step::Step2Ck => &STEP2_HEADER,
        }
    }

    fn stop(&self) -> &'static Regex {
        match self {
            Step::Step1 => &STEP1_STOP,
            Step::Step2Ck => &STEP2_STOP,
        }
    }
}

/// All non-overlapping blocks for `step`, in document order
///
/// A block starts where the step header matches, runs to the end of that
/// line, then absorbs each following line until one that begins with a
/// different step's header.
pub fn step_blocks(text: &str, step: Step) -> Vec<&str> {
    let header = step.header();
    let stop = step.stop();

    let mut blocks = Vec::new();
    let mut pos = 0;

    while let Some(found) = header.find_at(text, pos) {
        let start = found.start();
        let mut end = line_end(text, found.end());

        // `end` sits on a '\n' until the text runs out
        while end < text.len() {
            let next_line = end + 1;
            if stop.is_match(&text[next_line..]) {
                break;
            }
            end = line_end(text, next_line);
        }

        blocks.push(&text[start..end]);
        pos = end;
    }

    blocks
}

pub fn step1_blocks(text: &str) -> Vec<&str> {
    step_blocks(text, Step::Step1)
}

pub fn step2_blocks(text: &str) -> Vec<&str> {
    step_blocks(text, Step::Step2Ck)
}

fn line_end(text: &str, from: usize) -> usize {
    text[from..].find('\n').map_or(text.len(), |i| from + i)
}

/// First capture of `re` anywhere in `text`
pub fn first_capture<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// A dated row recognized by one of the combined row patterns
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatedRow {
    pub date: String,
    pub status: AttemptStatus,
    pub score: Option<String>,
}

/// Combined strategy: a date, then the first status on the same line that
/// is not followed by '/', then optionally the first "(ddd)" after it
pub fn match_row(line: &str) -> Option<DatedRow> {
    for date in ROW_DATE.find_iter(line) {
        let mut at = date.end();
        while let Some(status) = STATUS_TOKEN.find_at(line, at) {
            if line[status.end()..].starts_with('/') {
                at = status.end();
                continue;
            }
            let score = SCORE_PAREN
                .captures_at(line, status.end())
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string());
            return Some(DatedRow {
                date: date.as_str().to_string(),
                status: AttemptStatus::from_token(status.as_str())?,
                score,
            });
        }
    }
    None
}

/// Combined strategy: date, whitespace, status, then optionally the first
/// word-bounded three digit number on the rest of the line
pub fn match_row_alt(line: &str) -> Option<DatedRow> {
    let caps = ROW_ALT.captures(line)?;
    Some(DatedRow {
        date: caps.get(1)?.as_str().to_string(),
        status: AttemptStatus::from_token(caps.get(2)?.as_str())?,
        score: caps.get(3).map(|m| m.as_str().to_string()),
    })
}

/// Dated rows found line by line with the combined patterns
///
/// Header and footer noise often breaks these single-pattern matches, so
/// step outcomes use the line scan in `step` instead. This is kept for
/// diagnostics.
pub fn dated_rows(text: &str) -> Vec<DatedRow> {
    text.lines()
        .filter_map(|line| match_row(line).or_else(|| match_row_alt(line)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_auth_tolerates_spacing_and_periods() {
        assert_eq!(
            first_capture(&AUTH, "Authorized to Work in the US: No"),
            Some("No")
        );
        assert_eq!(
            first_capture(&AUTH, "authorized toWork in the U.S. : yes"),
            Some("yes")
        );
    }

    #[test]
    fn test_work_auth_captures_rest_of_line() {
        let text = "Current Work Authorization: H-1B Visa\nNext line";
        assert_eq!(first_capture(&WORK_AUTH, text), Some("H-1B Visa"));
    }

    #[test]
    fn test_visa_needed_accepts_need_and_needed() {
        assert_eq!(
            first_capture(&VISA_NEEDED, "Visa Sponsorship Need: Yes"),
            Some("Yes")
        );
        assert_eq!(
            first_capture(&VISA_NEEDED, "Visa Sponsorship Needed: No"),
            Some("No")
        );
    }

    #[test]
    fn test_ecfmg_not_available() {
        assert_eq!(
            first_capture(&ECFMG, "ECFMG Certified: Not Available"),
            Some("Not Available")
        );
    }

    #[test]
    fn test_step1_block_stops_before_step2_header() {
        let text = "Header\nUSMLE STEP 1 Results\n01/02/2020 PASS (230)\nUSMLE STEP 2 CK\n05/06/2021 PASS (250)";
        assert_eq!(
            step1_blocks(text),
            vec!["USMLE STEP 1 Results\n01/02/2020 PASS (230)"]
        );
    }

    #[test]
    fn test_step2_block_stops_before_step3_or_ecfmg() {
        let text = "USMLE STEP 2 CK\n05/06/2021 FAIL\nUSMLE Step 3\n07/08/2022 PASS\nUSMLE STEP 2 CS\nPASS\nECFMG Certified: Yes";
        assert_eq!(
            step2_blocks(text),
            vec!["USMLE STEP 2 CK\n05/06/2021 FAIL", "USMLE STEP 2 CS\nPASS"]
        );
    }

    #[test]
    fn test_step1_block_runs_to_end_of_text() {
        let text = "USMLE STEP 1\n01/02/2020 PASS\nfooter";
        assert_eq!(step1_blocks(text), vec![text]);
    }

    #[test]
    fn test_stop_header_only_counts_at_line_start() {
        let text = "USMLE STEP 1\nsee USMLE STEP 2 below\n01/02/2020 PASS\nUSMLE STEP 2";
        assert_eq!(
            step1_blocks(text),
            vec!["USMLE STEP 1\nsee USMLE STEP 2 below\n01/02/2020 PASS"]
        );
    }

    #[test]
    fn test_repeated_step1_headers_are_absorbed_into_one_block() {
        let text = "USMLE STEP 1\n01/02/2020 FAIL\nUSMLE STEP 1 (continued)\n03/04/2020 PASS";
        assert_eq!(step1_blocks(text).len(), 1);
    }

    #[test]
    fn test_step_blocks_split_by_other_step() {
        let text = "USMLE STEP 1\nA\nUSMLE STEP 2\nB\nUSMLE STEP 1\nC";
        assert_eq!(step1_blocks(text), vec!["USMLE STEP 1\nA", "USMLE STEP 1\nC"]);
        assert_eq!(step2_blocks(text), vec!["USMLE STEP 2\nB"]);
    }

    #[test]
    fn test_no_header_no_blocks() {
        assert!(step1_blocks("nothing here").is_empty());
        assert!(step2_blocks("").is_empty());
    }

    #[test]
    fn test_status_token_is_word_bounded() {
        assert!(STATUS_TOKEN.is_match("01/02/2020 P A S S"));
        assert!(!STATUS_TOKEN.is_match("01/02/2020 PASSED"));
        assert!(!STATUS_TOKEN.is_match("BYPASS"));
    }

    #[test]
    fn test_match_row_reads_paren_score() {
        assert_eq!(
            match_row("01/02/2020 Step 1 PASS (231)"),
            Some(DatedRow {
                date: "01/02/2020".to_string(),
                status: AttemptStatus::Pass,
                score: Some("231".to_string()),
            })
        );
    }

    #[test]
    fn test_match_row_skips_status_followed_by_slash() {
        let row = match_row("01/02/2020 PASS/FAIL exam FAIL").unwrap();
        assert_eq!(row.status, AttemptStatus::Fail);
        assert_eq!(row.score, None);
    }

    #[test]
    fn test_match_row_alt_reads_bare_score() {
        assert_eq!(
            match_row_alt("3/4/19 F A I L 188 points"),
            Some(DatedRow {
                date: "3/4/19".to_string(),
                status: AttemptStatus::Fail,
                score: Some("188".to_string()),
            })
        );
    }

    #[test]
    fn test_dated_rows_skips_narrative_lines() {
        let text = "USMLE STEP 1\nAttempted on 01/02/2020\n01/02/2020 FAIL (180)\n02/03/2021 PASS 215\n4/5/2021 PASS/ 222";
        let rows = dated_rows(text);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].score.as_deref(), Some("180"));
        // the primary strategy only reads parenthesized scores
        assert_eq!(rows[1].status, AttemptStatus::Pass);
        assert_eq!(rows[1].score, None);
        // "PASS/" defeats the primary strategy, the fallback still reads it
        assert_eq!(rows[2].date, "4/5/2021");
        assert_eq!(rows[2].score.as_deref(), Some("222"));
    }
}
