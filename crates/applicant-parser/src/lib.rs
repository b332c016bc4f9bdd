//! Residency application parser
//!
//! Turns the ragged text recovered from an application PDF into a structured
//! record: work authorization and visa fields, USMLE Step 1 / Step 2 CK
//! outcomes, and ECFMG certification status.
//!
//! ```
//! use applicant_parser::parse;
//!
//! let record = parse("USMLE STEP 1\n01/02/2020 FAIL (180)\n01/02/2020 PASS (210)");
//! assert!(record.usmle.step1.passed);
//! assert_eq!(record.usmle.step1.failures, 0);
//! ```
//!
//! Parsing is a pure function of the input text. Nothing is shared between
//! calls, so any number of documents can be parsed in parallel.

pub mod error;
pub mod extract;
pub mod normalize;
pub mod patterns;
pub mod ranking;
pub mod record;
pub mod step;
pub mod types;

pub use error::{ExtractionError, ParseError};
pub use extract::{document_text, PdfTextExtractor, TextExtractor};
pub use normalize::normalize;
pub use ranking::{application_score, load_cohort, rank_against};
pub use record::{parse, parse_bytes, parse_file, parse_file_with};
pub use step::{extract_step, AttemptLedger};
pub use types::{
    ApplicationRecord, AttemptStatus, Certification, EcfmgStatus, ExamAttempt, ParseFailure,
    ParseOutcome, RankingInfo, StepResult, UsmleResults, VisaInfo,
};
