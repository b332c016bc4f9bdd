//! Record assembly: normalized text in, one application record out

use std::path::Path;

use tracing::{info, warn};

use crate::extract::{document_text, PdfTextExtractor, TextExtractor};
use crate::normalize::normalize;
use crate::patterns::{
    first_capture, step1_blocks, step2_blocks, AUTH, ECFMG, VISA_NEEDED, VISA_SOUGHT, WORK_AUTH,
};
use crate::step::extract_step;
use crate::types::{
    ApplicationRecord, Certification, EcfmgStatus, ParseFailure, ParseOutcome, UsmleResults,
    VisaInfo,
};

/// File name used when a path has no base name
pub const UNKNOWN_FILE: &str = "unknown";

/// Parse the text of one application document
///
/// Fields that never match are left absent; this never fails.
pub fn parse(text: &str) -> ApplicationRecord {
    let text = normalize(text);

    let visa = VisaInfo {
        authorized_to_work_us: capture(&AUTH, &text),
        current_work_authorization: capture(&WORK_AUTH, &text),
        visa_sponsorship_needed: capture(&VISA_NEEDED, &text),
        visa_sponsorship_sought: capture(&VISA_SOUGHT, &text),
    };

    let usmle = UsmleResults {
        step1: extract_step(&step1_blocks(&text)),
        step2_ck: extract_step(&step2_blocks(&text)),
    };

    let ecfmg_status_report = match first_capture(&ECFMG, &text) {
        Some(value) => EcfmgStatus {
            present: true,
            certified: Certification::from_capture(value),
        },
        None => EcfmgStatus::default(),
    };

    ApplicationRecord {
        visa,
        usmle,
        ecfmg_status_report,
        file: None,
    }
}

fn capture(re: &regex::Regex, text: &str) -> Option<String> {
    first_capture(re, text).map(|value| value.trim_end().to_string())
}

/// Parse document bytes with the given backend, naming the result `file_name`
///
/// Extraction problems become an error-shaped record.
pub fn parse_bytes(data: &[u8], file_name: &str, extractor: &dyn TextExtractor) -> ParseOutcome {
    match extractor.extract_pages(data) {
        Ok(pages) => {
            let mut record = parse(&document_text(&pages));
            record.file = Some(file_name.to_string());
            info!(
                file = file_name,
                pages = pages.len(),
                step1_passed = record.usmle.step1.passed,
                step2_passed = record.usmle.step2_ck.passed,
                "parsed application"
            );
            ParseOutcome::Parsed(record)
        }
        Err(e) => {
            warn!(file = file_name, backend = extractor.name(), error = %e, "failed to parse PDF");
            failure(file_name, e)
        }
    }
}

/// Parse a document on disk with the default PDF backend
pub fn parse_file(path: impl AsRef<Path>) -> ParseOutcome {
    parse_file_with(path, &PdfTextExtractor::new())
}

/// Parse a document on disk with a specific backend
pub fn parse_file_with(path: impl AsRef<Path>, extractor: &dyn TextExtractor) -> ParseOutcome {
    let path = path.as_ref();
    let file_name = file_name_of(path);

    match std::fs::read(path) {
        Ok(data) => parse_bytes(&data, &file_name, extractor),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read document");
            failure(&file_name, e)
        }
    }
}

/// Base name of `path`, or [`UNKNOWN_FILE`]
pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| UNKNOWN_FILE.to_string())
}

fn failure(file_name: &str, reason: impl std::fmt::Display) -> ParseOutcome {
    ParseOutcome::Failed(ParseFailure {
        error: format!("Failed to parse PDF: {}", reason),
        file: file_name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractionError;
    use crate::types::StepResult;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    struct FixedPages(Vec<&'static str>);

    impl TextExtractor for FixedPages {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn extract_pages(&self, _data: &[u8]) -> Result<Vec<String>, ExtractionError> {
            Ok(self.0.iter().map(|p| p.to_string()).collect())
        }
    }

    struct Broken;

    impl TextExtractor for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn extract_pages(&self, _data: &[u8]) -> Result<Vec<String>, ExtractionError> {
            Err(ExtractionError::PasswordProtected)
        }
    }

    #[test]
    fn test_only_authorization_line() {
        let record = parse("Authorized to Work in the U.S.: Yes");
        assert_eq!(
            record.visa,
            VisaInfo {
                authorized_to_work_us: Some("Yes".to_string()),
                ..VisaInfo::default()
            }
        );
    }

    #[test]
    fn test_all_visa_fields() {
        let text = "Authorized to Work in the U.S.: No\n\
                    Current Work Authorization: J-1 Exchange Visitor  \n\
                    Visa Sponsorship Needed: Yes\n\
                    Visa Sponsorship Sought: J-1\n";
        let record = parse(text);
        assert_eq!(record.visa.authorized_to_work_us.as_deref(), Some("No"));
        assert_eq!(
            record.visa.current_work_authorization.as_deref(),
            Some("J-1 Exchange Visitor")
        );
        assert_eq!(record.visa.visa_sponsorship_needed.as_deref(), Some("Yes"));
        assert_eq!(record.visa.visa_sponsorship_sought.as_deref(), Some("J-1"));
    }

    #[test]
    fn test_fields_split_by_nbsp_still_match() {
        let record = parse("ECFMG\u{00A0}Certified:\u{00A0}\u{00A0}Yes");
        assert_eq!(
            record.ecfmg_status_report,
            EcfmgStatus {
                present: true,
                certified: Certification::Yes,
            }
        );
    }

    #[test]
    fn test_missing_ecfmg_is_not_available() {
        let record = parse("USMLE STEP 1\n01/02/2020 PASS");
        assert_eq!(record.ecfmg_status_report, EcfmgStatus::default());
        assert_eq!(
            serde_json::to_value(&record.ecfmg_status_report).unwrap()["certified"],
            "Not Available"
        );
    }

    #[test]
    fn test_ecfmg_not_available_is_not_read_as_no() {
        let record = parse("ECFMG Certified: Not Available");
        assert_eq!(
            record.ecfmg_status_report,
            EcfmgStatus {
                present: true,
                certified: Certification::NotAvailable,
            }
        );
    }

    #[test]
    fn test_steps_on_one_page_stay_separate() {
        let text = "USMLE STEP 1\n\
                    01/02/2020 FAIL (180)\n\
                    06/07/2020 PASS (221)\n\
                    USMLE STEP 2 CK\n\
                    03/04/2021 PASS (247)\n\
                    ECFMG Certified: Yes";
        let record = parse(text);
        assert_eq!(
            record.usmle.step1,
            StepResult {
                present: true,
                passed: true,
                pass_date: Some("06/07/2020".to_string()),
                score: Some("221".to_string()),
                failures: 1,
            }
        );
        assert_eq!(
            record.usmle.step2_ck,
            StepResult {
                present: true,
                passed: true,
                pass_date: Some("03/04/2021".to_string()),
                score: Some("247".to_string()),
                failures: 0,
            }
        );
        assert_eq!(record.ecfmg_status_report.certified, Certification::Yes);
    }

    #[test]
    fn test_empty_text_gives_empty_record() {
        assert_eq!(parse(""), ApplicationRecord::default());
    }

    #[test]
    fn test_parse_bytes_sets_file() {
        let extractor = FixedPages(vec!["Visa Sponsorship Need: No", ""]);
        let outcome = parse_bytes(b"%PDF-", "applicant.pdf", &extractor);
        let record = outcome.record().unwrap();
        assert_eq!(record.file.as_deref(), Some("applicant.pdf"));
        assert_eq!(record.visa.visa_sponsorship_needed.as_deref(), Some("No"));
    }

    #[test]
    fn test_parse_bytes_reports_extraction_failure() {
        let outcome = parse_bytes(b"%PDF-", "locked.pdf", &Broken);
        assert_eq!(
            outcome,
            ParseOutcome::Failed(ParseFailure {
                error: "Failed to parse PDF: password-protected PDF".to_string(),
                file: "locked.pdf".to_string(),
            })
        );
    }

    #[test]
    fn test_parse_file_missing_path_is_error_record() {
        let outcome = parse_file("/definitely/not/here/app.pdf");
        assert!(outcome.is_failure());
        assert_eq!(outcome.file(), Some("app.pdf"));
    }

    #[test]
    fn test_file_name_of_root_is_unknown() {
        assert_eq!(file_name_of(Path::new("/")), UNKNOWN_FILE);
        assert_eq!(file_name_of(Path::new("dir/app.pdf")), "app.pdf");
    }

    proptest! {
        #[test]
        fn parse_is_stable_under_renormalization(text in "[ \t\u{00A0}a-zA-Z0-9/():.\n]{0,120}") {
            let once = normalize(&text);
            prop_assert_eq!(parse(&once), parse(&normalize(&once)));
        }

        #[test]
        fn parse_never_panics(text in "\\PC{0,200}") {
            let _ = parse(&text);
        }
    }
}
