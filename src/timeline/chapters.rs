use serde::Serialize;

use super::seconds_to_millis;
use super::spine::SpineOffsets;
use crate::error::{ConvertError, Result};

/// A chapter boundary as authored: relative to the start of one spine entry
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterMarker {
    pub title: String,
    pub spine_index: usize,
    pub offset_seconds: f64,
}

impl ChapterMarker {
    pub fn new(title: impl Into<String>, spine_index: usize, offset_seconds: f64) -> Self {
        Self {
            title: title.into(),
            spine_index,
            offset_seconds,
        }
    }
}

/// A chapter placed on the merged track, `[start_millis, end_millis)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedChapter {
    pub title: String,
    pub start_millis: u64,
    pub end_millis: u64,
}

impl ResolvedChapter {
    pub fn duration_millis(&self) -> u64 {
        self.end_millis - self.start_millis
    }
}

/// Collapse runs of markers that repeat the previous retained title.
///
/// A chapter split across several parts shows up as one marker per part, all
/// with the same title; only the first of each run survives. Survivors keep
/// their position in `markers` so errors can point back at the document.
pub fn dedup_markers(markers: &[ChapterMarker]) -> Vec<(usize, &ChapterMarker)> {
    let mut retained: Vec<(usize, &ChapterMarker)> = Vec::with_capacity(markers.len());

    for (position, marker) in markers.iter().enumerate() {
        match retained.last() {
            Some((_, last)) if last.title == marker.title => {}
            _ => retained.push((position, marker)),
        }
    }

    retained
}

/// Check that every marker points at an existing spine entry with a sane offset
pub fn validate_markers(markers: &[ChapterMarker], offsets: &SpineOffsets) -> Result<()> {
    for (i, marker) in markers.iter().enumerate() {
        if marker.spine_index >= offsets.len() {
            return Err(ConvertError::invalid(
                format!("chapters[{}].spine", i),
                format!(
                    "index {} out of range, book has {} spine entries",
                    marker.spine_index,
                    offsets.len()
                ),
            ));
        }
        if !marker.offset_seconds.is_finite() || marker.offset_seconds < 0.0 {
            return Err(ConvertError::invalid(
                format!("chapters[{}].offset", i),
                format!("expected a non-negative number of seconds, got {}", marker.offset_seconds),
            ));
        }
    }
    Ok(())
}

/// Place markers on the merged track.
///
/// Markers are validated, collapsed with [`dedup_markers`], then resolved.
/// Each chapter ends where the next one starts; the last one ends with the
/// track. Every absolute second value is truncated to milliseconds on its own,
/// so adjacent chapters always share the exact same boundary. The first
/// chapter always opens the track at 0.
///
/// Starts may repeat (distinct titles at the same instant stay as separate,
/// empty chapters) but never go backwards.
pub fn resolve_chapters(
    markers: &[ChapterMarker],
    offsets: &SpineOffsets,
) -> Result<Vec<ResolvedChapter>> {
    validate_markers(markers, offsets)?;

    let retained = dedup_markers(markers);
    let total_millis = seconds_to_millis(offsets.total_seconds());

    let mut starts = Vec::with_capacity(retained.len());
    for (_, marker) in &retained {
        // validate_markers guarantees the index is in range
        let spine_start = offsets.start_of(marker.spine_index).unwrap_or_default();
        starts.push(seconds_to_millis(spine_start + marker.offset_seconds));
    }

    for (i, pair) in starts.windows(2).enumerate() {
        let (previous, current) = (pair[0], pair[1]);
        if current < previous {
            let (position, marker) = retained[i + 1];
            return Err(ConvertError::invalid(
                format!("chapters[{}]", position),
                format!(
                    "chapter '{}' starts at {} ms, before the preceding chapter '{}' at {} ms",
                    marker.title,
                    current,
                    retained[i].1.title,
                    previous
                ),
            ));
        }
    }

    if let (Some(&last_start), Some(&(position, last))) = (starts.last(), retained.last()) {
        if last_start > total_millis {
            return Err(ConvertError::invalid(
                format!("chapters[{}]", position),
                format!(
                    "chapter '{}' starts at {} ms, past the end of the book ({} ms)",
                    last.title, last_start, total_millis
                ),
            ));
        }
    }

    if let Some(first) = starts.first_mut() {
        *first = 0;
    }

    let chapters = retained
        .iter()
        .enumerate()
        .map(|(i, (_, marker))| ResolvedChapter {
            title: marker.title.clone(),
            start_millis: starts[i],
            end_millis: starts.get(i + 1).copied().unwrap_or(total_millis),
        })
        .collect();

    Ok(chapters)
}
