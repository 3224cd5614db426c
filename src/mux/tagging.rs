use anyhow::{Context, Result};
use std::path::Path;

use crate::libby::BookMetadata;

/// What ended up in the finished file
#[derive(Debug, Clone, Default)]
pub struct OutputSummary {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub duration_seconds: Option<u64>,
}

/// Add the tags the FFMETADATA sidecar has no key for: the narrator as the
/// iTunes NARRATOR freeform atom, and the year
pub fn apply_book_tags(path: &Path, book: &BookMetadata) -> Result<()> {
    let mut tag = mp4ameta::Tag::read_from_path(path)
        .with_context(|| format!("Failed to read m4b file for tagging: {}", path.display()))?;

    let narrator_ident = mp4ameta::FreeformIdent::new("com.apple.iTunes", "NARRATOR");
    if let Some(narrator) = book.narrator() {
        tag.set_data(narrator_ident, mp4ameta::Data::Utf8(narrator.to_string()));
    }

    if let Some(ref year) = book.year {
        tag.set_year(year.clone());
    }

    tag.write_to_path(path)
        .with_context(|| format!("Failed to write tags to: {}", path.display()))?;

    Ok(())
}

/// Read back the headline tags of a finished m4b
pub fn read_summary(path: &Path) -> Result<OutputSummary> {
    let tag = mp4ameta::Tag::read_from_path(path)
        .with_context(|| format!("Failed to read m4b file: {}", path.display()))?;

    Ok(OutputSummary {
        title: tag.title().map(String::from),
        artist: tag.artist().map(String::from),
        duration_seconds: tag.duration().map(|d| d.as_secs()),
    })
}
