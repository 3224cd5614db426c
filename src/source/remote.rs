//! Job payloads pushed from the browser: metadata plus signed part URLs

use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::config::DownloadConfig;
use crate::error::{ConvertError, Result};
use crate::libby::LibbyMetadata;

/// `{ "metadata": {...}, "urls": [{ "url": ..., "index": ... }] }`
#[derive(Debug, Clone, Deserialize)]
pub struct JobPayload {
    pub metadata: LibbyMetadata,
    pub urls: Vec<PartUrl>,
}

/// Location of one audio part
#[derive(Debug, Clone, Deserialize)]
pub struct PartUrl {
    pub url: String,
    /// 0-based spine position of the part
    pub index: i64,
}

impl JobPayload {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ConvertError::invalid("job", e.to_string()))
    }

    /// `(parts, spine entries)` when the part count disagrees with the spine
    pub fn spine_mismatch(&self) -> Option<(usize, usize)> {
        let spine_len = self.metadata.spine().len();
        (self.urls.len() != spine_len).then_some((self.urls.len(), spine_len))
    }

    /// Part URLs sorted by index, checked to form `0..urls.len()` exactly
    pub fn ordered_parts(&self) -> Result<Vec<&PartUrl>> {
        if self.urls.is_empty() {
            return Err(ConvertError::invalid("urls", "job has no part URLs"));
        }

        let count = self.urls.len() as i64;
        let mut seen = HashSet::new();
        for (i, part) in self.urls.iter().enumerate() {
            if part.index < 0 || part.index >= count {
                return Err(ConvertError::invalid(
                    format!("urls[{}].index", i),
                    format!("index {} out of range for {} parts", part.index, count),
                ));
            }
            if !seen.insert(part.index) {
                return Err(ConvertError::invalid(
                    format!("urls[{}].index", i),
                    format!("duplicate index {}", part.index),
                ));
            }
        }

        let mut ordered: Vec<&PartUrl> = self.urls.iter().collect();
        ordered.sort_by_key(|p| p.index);
        Ok(ordered)
    }
}

/// File name for a downloaded part: 1-based, zero padded
pub fn part_file_name(index: usize) -> String {
    format!("{:03}.mp3", index + 1)
}

/// HTTP client carrying the configured user agent
pub fn build_client(config: &DownloadConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(config.user_agent.as_str())
        .build()
        .map_err(|e| ConvertError::TransientFetchFailure {
            what: "HTTP client".to_string(),
            reason: e.to_string(),
        })
}

/// Download every part into `dest_dir`, in index order.
///
/// `on_part` is called with (position, total) before each download.
pub async fn download_parts<F>(
    client: &reqwest::Client,
    parts: &[&PartUrl],
    dest_dir: &Path,
    timeout: Duration,
    mut on_part: F,
) -> Result<Vec<PathBuf>>
where
    F: FnMut(usize, usize),
{
    let mut paths = Vec::with_capacity(parts.len());

    for (i, part) in parts.iter().enumerate() {
        on_part(i, parts.len());
        let dest = dest_dir.join(part_file_name(i));
        fetch_to_file(client, &part.url, &dest, timeout)
            .await
            .map_err(|reason| ConvertError::PartDownload { index: i, reason })?;
        paths.push(dest);
    }

    Ok(paths)
}

/// Fetch `url` into `dest`. `file://` URLs are copied from disk.
///
/// Errors are returned as plain text so callers can pick the error kind.
pub async fn fetch_to_file(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    timeout: Duration,
) -> std::result::Result<u64, String> {
    let parsed = reqwest::Url::parse(url).map_err(|e| format!("invalid URL {:?}: {}", url, e))?;

    if parsed.scheme() == "file" {
        let source = parsed
            .to_file_path()
            .map_err(|_| format!("invalid file URL {:?}", url))?;
        debug!("Copying {:?} to {:?}", source, dest);
        return fs::copy(&source, dest)
            .await
            .map_err(|e| format!("{:?}: {}", source, e));
    }

    debug!("Downloading {} to {:?}", parsed, dest);
    let mut response = client
        .get(parsed)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if !response.status().is_success() {
        return Err(format!("server returned status {}", response.status()));
    }

    let mut file = fs::File::create(dest)
        .await
        .map_err(|e| format!("{:?}: {}", dest, e))?;
    let mut written = 0u64;
    while let Some(chunk) = response.chunk().await.map_err(|e| e.to_string())? {
        file.write_all(&chunk)
            .await
            .map_err(|e| format!("{:?}: {}", dest, e))?;
        written += chunk.len() as u64;
    }
    file.flush()
        .await
        .map_err(|e| format!("{:?}: {}", dest, e))?;

    Ok(written)
}
