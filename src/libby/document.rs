use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::book::{BookMetadata, Creator};
use crate::error::{ConvertError, Result};
use crate::timeline::{ChapterMarker, SpineEntry};

/// Relative location of the metadata document inside a book folder
pub const METADATA_PATH: &str = "metadata/metadata.json";

/// The metadata.json document exported alongside the MP3 parts
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LibbyMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub creator: Option<Vec<Creator>>,
    #[serde(default)]
    pub description: Option<Description>,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub spine: Option<Vec<SpineEntry>>,
    #[serde(default)]
    pub chapters: Option<Vec<RawChapter>>,
    #[serde(default)]
    pub year: Option<Year>,
}

/// Either a plain string or the `{ "short": ..., "full": ... }` object form
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Description {
    Text(String),
    Parts {
        #[serde(default)]
        short: Option<String>,
        #[serde(default)]
        full: Option<String>,
    },
}

impl Description {
    fn text(&self) -> &str {
        match self {
            Description::Text(s) => s.as_str(),
            Description::Parts { short, full } => short
                .as_deref()
                .or(full.as_deref())
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Year {
    Number(i64),
    Text(String),
}

/// Chapter entry as it appears in the document
#[derive(Debug, Clone, Deserialize)]
pub struct RawChapter {
    pub title: String,
    pub spine: i64,
    pub offset: f64,
}

impl LibbyMetadata {
    /// Parse a metadata document from its JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ConvertError::invalid("metadata.json", e.to_string()))
    }

    /// Load `metadata/metadata.json` from a book folder, or a document file directly
    pub fn load(path: &Path) -> Result<Self> {
        let file = document_path(path);
        if !file.is_file() {
            return Err(ConvertError::invalid(
                "metadata.json",
                format!("not found at {}", file.display()),
            ));
        }
        let content = std::fs::read_to_string(&file)?;
        Self::from_json(&content)
    }

    /// Book-level fields used for tags and naming
    pub fn book(&self) -> BookMetadata {
        BookMetadata {
            title: self.title.clone().unwrap_or_default(),
            creators: self.creator.clone().unwrap_or_default(),
            description: self
                .description
                .as_ref()
                .map(|d| d.text().to_string())
                .unwrap_or_default(),
            cover_url: self.cover_url.clone().filter(|u| !u.trim().is_empty()),
            year: self.year.as_ref().and_then(|y| match y {
                Year::Number(n) => Some(n.to_string()),
                Year::Text(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
            }),
        }
    }

    pub fn spine(&self) -> &[SpineEntry] {
        self.spine.as_deref().unwrap_or_default()
    }

    /// Chapter markers in document order, with spine references checked for sign
    pub fn chapter_markers(&self) -> Result<Vec<ChapterMarker>> {
        let raw = self.chapters.as_deref().unwrap_or_default();

        raw.iter()
            .enumerate()
            .map(|(i, chapter)| {
                let spine_index = usize::try_from(chapter.spine).map_err(|_| {
                    ConvertError::invalid(
                        format!("chapters[{}].spine", i),
                        format!("expected a spine index, got {}", chapter.spine),
                    )
                })?;
                Ok(ChapterMarker::new(
                    chapter.title.clone(),
                    spine_index,
                    chapter.offset,
                ))
            })
            .collect()
    }
}

/// Resolve a book folder to its metadata document; files are returned as-is
pub fn document_path(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(METADATA_PATH)
    } else {
        path.to_path_buf()
    }
}
