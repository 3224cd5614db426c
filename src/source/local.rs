use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::libby::{LibbyMetadata, METADATA_PATH};

/// Image extensions recognized as a local cover next to metadata.json
const COVER_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// A downloaded book folder: `*.mp3` parts plus `metadata/metadata.json`
#[derive(Debug, Clone)]
pub struct LocalBook {
    pub dir: PathBuf,
    pub metadata: LibbyMetadata,
    /// Absolute part paths, in playback order
    pub parts: Vec<PathBuf>,
    pub cover: Option<PathBuf>,
}

impl LocalBook {
    /// Folder name, used when the document has no title
    pub fn folder_name(&self) -> Option<String> {
        self.dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
    }
}

/// Load a book folder
pub fn load_book_dir(dir: &Path) -> Result<LocalBook> {
    if !dir.is_dir() {
        bail!("Not a directory: {:?}", dir);
    }

    let dir = dir
        .canonicalize()
        .with_context(|| format!("Failed to resolve {:?}", dir))?;

    let metadata = LibbyMetadata::load(&dir)
        .with_context(|| format!("Failed to load {:?}", dir.join(METADATA_PATH)))?;

    let parts = find_parts(&dir)?;
    if parts.is_empty() {
        bail!("No MP3 files found in {:?}", dir);
    }

    let spine_len = metadata.spine().len();
    if parts.len() != spine_len {
        warn!(
            "{:?} has {} MP3 file(s) but the metadata lists {} spine entries; chapter times follow the metadata",
            dir,
            parts.len(),
            spine_len
        );
    }

    let cover = find_local_cover(&dir);
    if let Some(ref cover) = cover {
        debug!("Using local cover {:?}", cover);
    }

    Ok(LocalBook {
        dir,
        metadata,
        parts,
        cover,
    })
}

/// MP3 files directly inside `dir`, sorted by file name
pub fn find_parts(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut parts: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {:?}", dir))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_mp3_file(p))
        .collect();

    parts.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(parts)
}

/// Cover image saved next to the metadata document (metadata/cover.jpg etc.)
pub fn find_local_cover(dir: &Path) -> Option<PathBuf> {
    let metadata_dir = dir.join("metadata");
    COVER_EXTENSIONS
        .iter()
        .map(|ext| metadata_dir.join(format!("cover.{}", ext)))
        .find(|p| p.is_file())
}

/// Every folder under `root` (including `root`) that holds a metadata document
pub fn find_book_dirs(root: &Path) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
        .map(|e| e.into_path())
        .filter(|p| p.join(METADATA_PATH).is_file())
        .collect();

    dirs.sort();
    dirs
}

/// Check if a path is an mp3 file
fn is_mp3_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase() == "mp3")
        .unwrap_or(false)
}
