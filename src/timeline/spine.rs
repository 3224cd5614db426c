use serde::{Deserialize, Serialize};

use crate::error::{ConvertError, Result};

/// One audio part of the book, in playback order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpineEntry {
    /// Length of the part in seconds
    pub duration: f64,
}

impl SpineEntry {
    pub fn new(duration: f64) -> Self {
        Self { duration }
    }
}

/// Where each spine entry starts once all parts are concatenated
#[derive(Debug, Clone, PartialEq)]
pub struct SpineOffsets {
    starts: Vec<f64>,
    total: f64,
}

impl SpineOffsets {
    /// Running prefix sum over the part durations
    pub fn resolve(spine: &[SpineEntry]) -> Result<Self> {
        if spine.is_empty() {
            return Err(ConvertError::invalid("spine", "no spine entries"));
        }

        let mut starts = Vec::with_capacity(spine.len());
        let mut cursor = 0.0_f64;

        for (i, entry) in spine.iter().enumerate() {
            if !entry.duration.is_finite() || entry.duration <= 0.0 {
                return Err(ConvertError::invalid(
                    format!("spine[{}].duration", i),
                    format!("expected a positive number of seconds, got {}", entry.duration),
                ));
            }
            starts.push(cursor);
            cursor += entry.duration;
        }

        Ok(Self {
            starts,
            total: cursor,
        })
    }

    /// Absolute start (seconds) of the spine entry at `index`
    pub fn start_of(&self, index: usize) -> Option<f64> {
        self.starts.get(index).copied()
    }

    pub fn total_seconds(&self) -> f64 {
        self.total
    }

    pub fn len(&self) -> usize {
        self.starts.len()
    }
}
