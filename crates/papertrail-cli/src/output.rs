use std::io::Write;

use owo_colors::OwoColorize;
use papertrail_core::{IngestEvent, RunSummary};

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Print one progress event as a human-readable line.
pub fn print_event(w: &mut dyn Write, event: &IngestEvent, color: ColorMode) -> std::io::Result<()> {
    match event {
        IngestEvent::Fetching { target } => {
            writeln!(w, "Fetching {}...", target)?;
        }
        IngestEvent::FetchFailed { target, error } => {
            if color.enabled() {
                writeln!(w, "{} {} ({})", "FAILED:".red(), target, error)?;
            } else {
                writeln!(w, "FAILED: {} ({})", target, error)?;
            }
        }
        IngestEvent::Extracting { file } => {
            writeln!(w, "Extracting record from {}...", file)?;
        }
        IngestEvent::NoRecord { target } => {
            if color.enabled() {
                writeln!(w, "{} no record could be extracted from {}", "SKIPPED:".yellow(), target)?;
            } else {
                writeln!(w, "SKIPPED: no record could be extracted from {}", target)?;
            }
        }
        IngestEvent::CheckingDuplicate { title } => {
            let shown = if title.is_empty() { "(untitled)" } else { title.as_str() };
            writeln!(w, "Checking for an existing entry for \"{}\"...", shown)?;
        }
        IngestEvent::Written { title } => {
            if color.enabled() {
                writeln!(w, "{} \"{}\"", "ADDED:".green(), title)?;
            } else {
                writeln!(w, "ADDED: \"{}\"", title)?;
            }
        }
        IngestEvent::DuplicateSkip { title } => {
            if color.enabled() {
                writeln!(w, "{} duplicate entry found for \"{}\"", "SKIPPED:".yellow(), title)?;
            } else {
                writeln!(w, "SKIPPED: duplicate entry found for \"{}\"", title)?;
            }
        }
        IngestEvent::Declined { target } => {
            if color.enabled() {
                writeln!(w, "{} {} (untitled, not confirmed)", "SKIPPED:".yellow(), target)?;
            } else {
                writeln!(w, "SKIPPED: {} (untitled, not confirmed)", target)?;
            }
        }
        IngestEvent::CatalogFailed { target, error } => {
            if color.enabled() {
                writeln!(w, "{} catalog error for {}: {}", "FAILED:".red(), target, error)?;
            } else {
                writeln!(w, "FAILED: catalog error for {}: {}", target, error)?;
            }
        }
        IngestEvent::Expanding { doi, count } => {
            let line = format!("Following {} reference(s) of {}", count, doi);
            if color.enabled() {
                writeln!(w, "{}", line.dimmed())?;
            } else {
                writeln!(w, "{}", line)?;
            }
        }
        IngestEvent::ReferenceLookupFailed { doi, error } => {
            if color.enabled() {
                writeln!(w, "{} could not fetch references of {}: {}", "WARNING:".yellow(), doi, error)?;
            } else {
                writeln!(w, "WARNING: could not fetch references of {}: {}", doi, error)?;
            }
        }
        IngestEvent::AlreadyVisited { doi } => {
            let line = format!("Already processed {}, skipping", doi);
            if color.enabled() {
                writeln!(w, "{}", line.dimmed())?;
            } else {
                writeln!(w, "{}", line)?;
            }
        }
    }
    Ok(())
}

/// Print the end-of-run tallies.
pub fn print_summary(w: &mut dyn Write, summary: &RunSummary, color: ColorMode) -> std::io::Result<()> {
    writeln!(w)?;
    let headline = format!(
        "Done: {} added, {} duplicate(s) skipped",
        summary.written, summary.duplicates
    );
    if color.enabled() {
        writeln!(w, "{}", headline.bold())?;
    } else {
        writeln!(w, "{}", headline)?;
    }

    if summary.declined > 0 {
        writeln!(w, "  {} untitled record(s) declined", summary.declined)?;
    }
    if summary.unavailable > 0 {
        writeln!(w, "  {} reference(s) unavailable", summary.unavailable)?;
    }
    if summary.failed > 0 {
        writeln!(w, "  {} reference(s) failed", summary.failed)?;
    }
    Ok(())
}
