//! Whitespace cleanup for text recovered from PDF pages
//!
//! PDF text extraction leaves non-breaking spaces and ragged runs of spacing
//! between glyphs. Collapsing them lets tokens split by layout quirks (for
//! example "P  A S S") still line up with the pattern library. Line breaks are
//! kept exactly, since step rows are scanned line by line.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Runs of horizontal whitespace (never newlines)
    static ref HORIZONTAL_SPACE: Regex = Regex::new(r"[ \t]+").unwrap();
}

const NBSP: char = '\u{00A0}';

/// Replace non-breaking spaces and collapse space/tab runs to a single space
pub fn normalize(raw: &str) -> String {
    let spaced = raw.replace(NBSP, " ");
    HORIZONTAL_SPACE.replace_all(&spaced, " ").into_owned()
}
