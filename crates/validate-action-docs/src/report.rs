//! Run results and how they are printed.

use action_docs_examples::Diagnostic;
use colored::Colorize;
use serde::Serialize;
use std::io::{self, Write};

/// The diagnostics of one documentation file or manifest description.
#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    /// Display path, relative to the repository root
    pub source: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// A manifest that could not be loaded.
#[derive(Debug, Clone, Serialize)]
pub struct LoadFailure {
    pub source: String,
    pub error: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub files_scanned: usize,
    pub diagnostics: usize,
    pub load_failures: usize,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.diagnostics == 0 && self.load_failures == 0
    }
}

/// Everything a run found.
#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    pub reports: Vec<SourceReport>,
    pub load_failures: Vec<LoadFailure>,
    pub summary: RunSummary,
}

/// Human-readable output: one `path:line:column ✗ message` line per
/// diagnostic, then a summary.
pub fn write_text(out: &mut impl Write, outcome: &RunOutcome) -> io::Result<()> {
    for failure in &outcome.load_failures {
        writeln!(
            out,
            "{} {} failed to load: {}",
            failure.source,
            "✗".red(),
            failure.error
        )?;
    }
    for report in &outcome.reports {
        for diagnostic in &report.diagnostics {
            writeln!(
                out,
                "{}:{}:{} {} {}",
                report.source,
                diagnostic.line,
                diagnostic.column,
                "✗".red(),
                diagnostic.message
            )?;
        }
    }

    let summary = &outcome.summary;
    let counts = format!(
        "{} files checked, {} problems, {} manifests failed to load",
        summary.files_scanned, summary.diagnostics, summary.load_failures
    );
    if summary.is_success() {
        writeln!(out, "{} {}", "✓".green(), counts)
    } else {
        writeln!(out, "{} {}", "✗".red(), counts.bold())
    }
}

#[derive(Serialize)]
struct DiagnosticRecord<'a> {
    source: &'a str,
    #[serde(flatten)]
    diagnostic: &'a Diagnostic,
}

/// JSONL output: one object per load failure and per diagnostic.
pub fn write_json(out: &mut impl Write, outcome: &RunOutcome) -> anyhow::Result<()> {
    for failure in &outcome.load_failures {
        writeln!(out, "{}", serde_json::to_string(failure)?)?;
    }
    for report in &outcome.reports {
        for diagnostic in &report.diagnostics {
            let record = DiagnosticRecord {
                source: &report.source,
                diagnostic,
            };
            writeln!(out, "{}", serde_json::to_string(&record)?)?;
        }
    }
    Ok(())
}
