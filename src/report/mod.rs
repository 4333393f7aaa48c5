pub mod types;

pub use types::Report;

use crate::digest::{ChangeKind, PatchDigest};
use colored::Colorize;
use serde::Serialize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report file: {0}")]
    FileWrite(#[from] std::io::Error),

    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// `[{ "source": ..., "digest": [hunks] }]`
    #[default]
    Json,
    /// Human-readable listing of every change
    Summary,
    /// Flat `(path, line, character)` lookup positions
    Targets,
}

/// Build a Report from per-patch digests, computing totals.
pub fn build(patches: Vec<PatchDigest>) -> Report {
    let hunks = patches.iter().flat_map(|p| p.hunks.iter());
    let (mut additions, mut deletions, mut identifiers, mut hunk_count) = (0, 0, 0, 0);
    for hunk in hunks {
        hunk_count += 1;
        additions += hunk.additions();
        deletions += hunk.deletions();
        identifiers += hunk.changes.iter().map(|c| c.identifiers.len()).sum::<usize>();
    }

    Report {
        patches,
        hunks: hunk_count,
        additions,
        deletions,
        identifiers,
    }
}

/// Output the report to stdout (default) or to a file.
///
/// A summary goes to the terminal in colour, or to a file as markdown.
#[instrument(skip(report), fields(patches = report.patches.len(), hunks = report.hunks))]
pub fn output(
    report: &Report,
    format: OutputFormat,
    pretty: bool,
    output_path: Option<&Path>,
) -> Result<(), ReportError> {
    let rendered = match (format, output_path) {
        (OutputFormat::Json, _) => render_json(&report.patches, pretty)?,
        (OutputFormat::Targets, _) => render_json(&report.lookup_targets(), pretty)?,
        (OutputFormat::Summary, None) => {
            debug!("writing summary to terminal");
            print_terminal_report(report);
            return Ok(());
        }
        (OutputFormat::Summary, Some(_)) => render_markdown(report),
    };

    match output_path {
        None => {
            debug!("writing report to stdout");
            println!("{rendered}");
        }
        Some(path) => {
            debug!(path = %path.display(), "writing report to file");
            std::fs::write(path, rendered)?;
        }
    }
    Ok(())
}

fn render_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String, ReportError> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(rendered)
}

/// Print the report to the terminal with colors:
///
/// ```text
/// ═══ a.py → a.py ═══
/// @@ hunk 1 (+1 -1)
///   -     1  y = 2  [y@0]
///   +     1  y = 3  [y@0]
/// ```
fn print_terminal_report(report: &Report) {
    println!();
    for patch in &report.patches {
        println!("{}", format!("# {}", patch.source).bold());
        for (index, hunk) in patch.hunks.iter().enumerate() {
            println!(
                "═══ {} → {} ═══",
                hunk.old_file.as_deref().unwrap_or("(none)"),
                hunk.new_file.as_deref().unwrap_or("(none)")
            );
            println!(
                "@@ hunk {} ({} {})",
                index + 1,
                format!("+{}", hunk.additions()).green(),
                format!("-{}", hunk.deletions()).red()
            );
            for change in &hunk.changes {
                let marker = match change.kind {
                    ChangeKind::Addition => "+".green().bold(),
                    ChangeKind::Deletion => "-".red().bold(),
                };
                println!(
                    "  {} {:>5}  {}  {}",
                    marker,
                    change.line,
                    change.text,
                    identifier_list(change).dimmed()
                );
            }
        }
        println!();
    }
    println!(
        "{} hunks | +{} -{} | {} identifiers",
        report.hunks, report.additions, report.deletions, report.identifiers
    );
}

fn render_markdown(report: &Report) -> String {
    let mut md = String::new();
    for patch in &report.patches {
        md.push_str(&format!("# {}\n\n", patch.source));
        for (index, hunk) in patch.hunks.iter().enumerate() {
            md.push_str(&format!(
                "## Hunk {}: `{}` → `{}`\n\n",
                index + 1,
                hunk.old_file.as_deref().unwrap_or("(none)"),
                hunk.new_file.as_deref().unwrap_or("(none)")
            ));
            md.push_str("| | Line | Text | Identifiers |\n|---|---|---|---|\n");
            for change in &hunk.changes {
                let marker = match change.kind {
                    ChangeKind::Addition => "+",
                    ChangeKind::Deletion => "-",
                };
                md.push_str(&format!(
                    "| {} | {} | `{}` | {} |\n",
                    marker,
                    change.line,
                    change.text.replace('|', "\\|"),
                    identifier_list(change)
                ));
            }
            md.push('\n');
        }
    }
    md.push_str(&format!(
        "**{} hunks | +{} -{} | {} identifiers**\n",
        report.hunks, report.additions, report.deletions, report.identifiers
    ));
    md
}

fn identifier_list(change: &crate::digest::Change) -> String {
    let items: Vec<String> = change
        .identifiers
        .iter()
        .map(|i| format!("{}@{}", i.name, i.character))
        .collect();
    format!("[{}]", items.join(", "))
}
