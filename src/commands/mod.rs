pub mod chapters;
pub mod convert;
pub mod fields;
pub mod job;

use anyhow::{anyhow, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};

use crate::naming::{FormatTemplate, NamingFields};
use crate::pipeline::{ConversionOutcome, ConvertEvent};
use crate::timeline::format_millis;

/// Output file for a book: destination joined with the rendered template
pub(crate) fn output_path(
    dest: &Path,
    template: &FormatTemplate,
    fields: &NamingFields,
) -> Result<PathBuf> {
    let relative = template.generate_path(fields).map_err(|missing| {
        anyhow!(
            "Naming template needs metadata the book does not have: {}",
            missing.join(", ")
        )
    })?;
    Ok(dest.join(relative))
}

/// Print conversion progress lines unless quiet
pub(crate) fn print_event(event: &ConvertEvent, quiet: bool) {
    if quiet {
        return;
    }
    match event {
        ConvertEvent::PartsFound(count) => {
            println!("  {} {} part(s)", "Parts:".cyan(), count);
        }
        ConvertEvent::Downloading { index, total } => {
            println!("  {} part {}/{}", "Downloading:".cyan(), index + 1, total);
        }
        ConvertEvent::CoverFetched(path) => {
            println!("  {} {}", "Cover:".cyan(), path.display());
        }
        ConvertEvent::CoverSkipped(reason) => {
            println!("  {} skipped ({})", "Cover:".yellow(), reason);
        }
        ConvertEvent::ChaptersBuilt {
            chapters,
            total_millis,
        } => {
            println!(
                "  {} {} chapter(s), {}",
                "Chapters:".cyan(),
                chapters,
                format_millis(*total_millis)
            );
        }
        ConvertEvent::Muxing(output) => {
            println!("  {} {}", "Muxing:".cyan(), output.display());
        }
        ConvertEvent::Tagged(_) => {}
    }
}

/// One line describing a finished file
pub(crate) fn print_outcome(outcome: &ConversionOutcome) {
    let mut line = format!(
        "{} {} ({} chapters",
        "Created".green(),
        outcome.output.display(),
        outcome.chapters
    );
    if let Some(ref summary) = outcome.summary {
        if let Some(secs) = summary.duration_seconds {
            line.push_str(&format!(", {}", format_millis(secs * 1000)));
        }
    }
    line.push(')');
    if let Some(ref summary) = outcome.summary {
        match (&summary.title, &summary.artist) {
            (Some(title), Some(artist)) if !artist.is_empty() => {
                line.push_str(&format!(" \"{}\" read by {}", title, artist));
            }
            (Some(title), _) => line.push_str(&format!(" \"{}\"", title)),
            _ => {}
        }
    }
    println!("{}", line);
}
