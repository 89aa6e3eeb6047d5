use std::io::Write;

use owo_colors::OwoColorize;

use wellsift_core::DocumentOutcome;
use wellsift_ingest::RunSummary;
use wellsift_store::{StatusCounts, WellRow};

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// One line per processed document, printed above the progress bar.
pub fn outcome_line(filename: &str, outcome: &DocumentOutcome, color: ColorMode) -> String {
    match outcome {
        DocumentOutcome::Stored {
            well_id,
            stimulations,
        } => {
            if color.enabled() {
                format!(
                    "{} {} (well {}, {} stimulation rows)",
                    "STORED".green(),
                    filename,
                    well_id,
                    stimulations
                )
            } else {
                format!("STORED {filename} (well {well_id}, {stimulations} stimulation rows)")
            }
        }
        DocumentOutcome::Skipped => {
            if color.enabled() {
                format!("{}", format!("SKIPPED {filename} (already ingested)").dimmed())
            } else {
                format!("SKIPPED {filename} (already ingested)")
            }
        }
        DocumentOutcome::Rejected => {
            if color.enabled() {
                format!("{} {} (no API number)", "REJECTED".yellow(), filename)
            } else {
                format!("REJECTED {filename} (no API number)")
            }
        }
        DocumentOutcome::Errored { message } => {
            if color.enabled() {
                format!("{} {} ({})", "ERROR".red(), filename, message)
            } else {
                format!("ERROR {filename} ({message})")
            }
        }
    }
}

pub fn print_run_summary(
    w: &mut dyn Write,
    summary: &RunSummary,
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w)?;
    writeln!(w, "Processed {} documents:", summary.total())?;
    if color.enabled() {
        writeln!(w, "  {} stored", summary.stored.green())?;
        writeln!(w, "  {} skipped (already ingested)", summary.skipped)?;
        writeln!(w, "  {} rejected (no API number)", summary.rejected.yellow())?;
        writeln!(w, "  {} errored", summary.errored.red())?;
    } else {
        writeln!(w, "  {} stored", summary.stored)?;
        writeln!(w, "  {} skipped (already ingested)", summary.skipped)?;
        writeln!(w, "  {} rejected (no API number)", summary.rejected)?;
        writeln!(w, "  {} errored", summary.errored)?;
    }
    Ok(())
}

pub fn print_wells(
    w: &mut dyn Write,
    wells: &[WellRow],
    counts: StatusCounts,
    color: ColorMode,
) -> std::io::Result<()> {
    for well in wells {
        let name = well.well_name.as_deref().unwrap_or("(unnamed)");
        let county = well.county.as_deref().unwrap_or("-");
        if color.enabled() {
            let status = match well.qc_status.as_str() {
                "valid" => format!("{}", "valid".green()),
                "needs_review" => format!("{}", "needs_review".yellow()),
                other => format!("{}", other.red()),
            };
            writeln!(w, "{:<14} {:<40} {:<12} {}", well.api, name, county, status)?;
        } else {
            writeln!(
                w,
                "{:<14} {:<40} {:<12} {}",
                well.api, name, county, well.qc_status
            )?;
        }
    }
    writeln!(w)?;
    writeln!(
        w,
        "{} wells: {} valid, {} needs review, {} invalid",
        wells.len(),
        counts.valid,
        counts.needs_review,
        counts.invalid
    )?;
    Ok(())
}
