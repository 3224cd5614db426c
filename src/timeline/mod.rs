//! Chapter timeline: from per-part chapter markers to absolute chapter times

mod chapters;
mod spine;

pub use chapters::{resolve_chapters, ChapterMarker, ResolvedChapter};
pub use spine::{SpineEntry, SpineOffsets};

use serde::Serialize;

use crate::error::Result;

/// Truncate a second value to whole milliseconds
pub fn seconds_to_millis(seconds: f64) -> u64 {
    (seconds * 1000.0).floor() as u64
}

/// Resolved chapter table for one book
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Timeline {
    pub chapters: Vec<ResolvedChapter>,
    pub total_millis: u64,
}

impl Timeline {
    /// Build the chapter table for a book.
    ///
    /// Errors name the offending marker by its position in the document,
    /// including markers that would be dropped as repeats.
    pub fn build(spine: &[SpineEntry], markers: &[ChapterMarker]) -> Result<Self> {
        let offsets = SpineOffsets::resolve(spine)?;
        let chapters = resolve_chapters(markers, &offsets)?;

        Ok(Self {
            chapters,
            total_millis: seconds_to_millis(offsets.total_seconds()),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }
}

/// Format milliseconds as HH:MM:SS.mmm
pub fn format_millis(millis: u64) -> String {
    let hours = millis / 3_600_000;
    let minutes = (millis % 3_600_000) / 60_000;
    let seconds = (millis % 60_000) / 1000;
    let ms = millis % 1000;
    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, ms)
}
