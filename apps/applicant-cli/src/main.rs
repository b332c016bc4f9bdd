//! Batch parser for residency application PDFs
//!
//! Parses every file given on the command line and writes the records as a
//! pretty-printed JSON array, to stdout or to `--output`.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use applicant_parser::patterns::{dated_rows, step1_blocks, step2_blocks};
use applicant_parser::{
    document_text, load_cohort, normalize, parse_file, rank_against, ApplicationRecord,
    ParseOutcome, PdfTextExtractor, TextExtractor,
};
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for the batch parser
#[derive(Parser, Debug)]
#[command(name = "applicant-cli")]
#[command(about = "Parse residency application PDFs into JSON records")]
struct Args {
    /// PDF files to parse
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Write the JSON array here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON array of parsed applicants to rank each file against
    #[arg(long)]
    cohort: Option<PathBuf>,

    /// Log the dated rows found in each step section
    #[arg(long)]
    rows: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let started = Instant::now();

    if args.rows {
        for path in &args.files {
            log_dated_rows(path);
        }
    }

    let outcomes = parse_all(&args.files);

    if let Some(cohort_path) = &args.cohort {
        let cohort = load_cohort(cohort_path)
            .with_context(|| format!("failed to load cohort from {}", cohort_path.display()))?;
        for (file, record) in ranked_records(&outcomes) {
            let ranking = rank_against(&cohort, record);
            info!(
                "{}: rank {}/{} (score {:.4}, percentile {})",
                file, ranking.rank, ranking.total_candidates, ranking.score, ranking.percentile
            );
        }
    }

    write_output(&outcomes, args.output.as_deref())?;

    let failures = outcomes.iter().filter(|o| o.is_failure()).count();
    eprintln!(
        "Parsed {} PDF(s) in {:.2}s ({} failed)",
        outcomes.len(),
        started.elapsed().as_secs_f64(),
        failures
    );

    Ok(())
}

/// Parse each file in order; unreadable files become error records
fn parse_all(files: &[PathBuf]) -> Vec<ParseOutcome> {
    files.iter().map(parse_file).collect()
}

fn ranked_records(outcomes: &[ParseOutcome]) -> impl Iterator<Item = (&str, &ApplicationRecord)> {
    outcomes.iter().filter_map(|outcome| {
        outcome
            .record()
            .map(|record| (record.file.as_deref().unwrap_or("unknown"), record))
    })
}

fn write_output(outcomes: &[ParseOutcome], output: Option<&Path>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(outcomes)?;

    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!("Result saved to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", json)?;
        }
    }

    Ok(())
}

/// Diagnostic view of the combined row patterns for one file
fn log_dated_rows(path: &Path) {
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(e) => {
            warn!("{}: {}", path.display(), e);
            return;
        }
    };

    let pages = match PdfTextExtractor::new().extract_pages(&data) {
        Ok(pages) => pages,
        Err(e) => {
            warn!("{}: {}", path.display(), e);
            return;
        }
    };

    let text = normalize(&document_text(&pages));
    for (label, blocks) in [
        ("step1", step1_blocks(&text)),
        ("step2_ck", step2_blocks(&text)),
    ] {
        for row in blocks.iter().flat_map(|block| dated_rows(block)) {
            info!(
                "{} {}: {} {} {}",
                path.display(),
                label,
                row.date,
                row.status.as_str(),
                row.score.as_deref().unwrap_or("-")
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_keeps_order_and_failures() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.pdf");
        let second = dir.path().join("second.pdf");
        std::fs::write(&first, b"not a pdf").unwrap();

        let outcomes = parse_all(&[first, second]);
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].file(), Some("first.pdf"));
        assert_eq!(outcomes[1].file(), Some("second.pdf"));
        assert!(outcomes.iter().all(|o| o.is_failure()));
    }

    #[test]
    fn test_write_output_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("parsed.json");
        let outcomes = vec![ParseOutcome::Parsed(ApplicationRecord {
            file: Some("a.pdf".to_string()),
            ..ApplicationRecord::default()
        })];

        write_output(&outcomes, Some(&out)).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(written[0]["file"], "a.pdf");
        assert_eq!(written[0]["ecfmg_status_report"]["certified"], "Not Available");
    }

    #[test]
    fn test_ranked_records_skip_failures() {
        let outcomes = vec![
            ParseOutcome::Parsed(ApplicationRecord {
                file: Some("ok.pdf".to_string()),
                ..ApplicationRecord::default()
            }),
            parse_file("/missing/bad.pdf"),
        ];
        let files: Vec<&str> = ranked_records(&outcomes).map(|(file, _)| file).collect();
        assert_eq!(files, vec!["ok.pdf"]);
    }
}
