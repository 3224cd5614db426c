use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

use crate::libby::{document_path, LibbyMetadata};
use crate::pipeline::PreparedBook;
use crate::timeline::{format_millis, Timeline};

/// Run the chapters command - show the chapter timeline for a document
pub fn run(path: &Path, json: bool, ffmetadata: bool) -> Result<()> {
    let metadata = LibbyMetadata::load(path)
        .with_context(|| format!("Failed to load {:?}", document_path(path)))?;
    let prepared = PreparedBook::from_metadata(&metadata)?;

    if ffmetadata {
        print!("{}", prepared.sidecar);
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&prepared.timeline)?);
        return Ok(());
    }

    if !prepared.book.title.is_empty() {
        println!("{}", prepared.book.title.bold());
    }
    if let Some(author) = prepared.book.author() {
        println!("  {} {}", "Author:".cyan(), author);
    }
    if let Some(narrator) = prepared.book.narrator() {
        println!("  {} {}", "Narrator:".cyan(), narrator);
    }
    println!(
        "  {} {}",
        "Length:".cyan(),
        format_millis(prepared.timeline.total_millis)
    );
    print_table(&prepared.timeline);

    Ok(())
}

/// Chapter table: number, start, length, title
pub(crate) fn print_table(timeline: &Timeline) {
    if timeline.is_empty() {
        println!("  {}", "(no chapters)".dimmed());
        return;
    }

    let width = timeline.chapters.len().to_string().len();
    for (i, chapter) in timeline.chapters.iter().enumerate() {
        println!(
            "  {:>width$}  {}  {}  {}",
            i + 1,
            format_millis(chapter.start_millis).green(),
            format_millis(chapter.duration_millis()).dimmed(),
            chapter.title,
            width = width
        );
    }
}
