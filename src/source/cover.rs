use std::path::{Path, PathBuf};
use std::time::Duration;

use super::remote::fetch_to_file;
use crate::error::{ConvertError, Result};

/// Image extension taken from the URL path, `jpg` when there is none
pub fn cover_extension(url: &str) -> String {
    let path = reqwest::Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.split('?').next().unwrap_or_default().to_string());

    let file_name = path.rsplit('/').next().unwrap_or_default();
    match file_name.rsplit_once('.') {
        Some((_, ext))
            if !ext.is_empty() && ext.len() <= 4 && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            ext.to_ascii_lowercase()
        }
        _ => "jpg".to_string(),
    }
}

/// Download cover art into `dest_dir`; any failure is transient
pub async fn fetch_cover(
    client: &reqwest::Client,
    url: &str,
    dest_dir: &Path,
    timeout: Duration,
) -> Result<PathBuf> {
    let dest = dest_dir.join(format!("cover.{}", cover_extension(url)));

    let written = fetch_to_file(client, url, &dest, timeout)
        .await
        .map_err(|reason| ConvertError::TransientFetchFailure {
            what: "cover art".to_string(),
            reason,
        })?;

    if written == 0 {
        return Err(ConvertError::TransientFetchFailure {
            what: "cover art".to_string(),
            reason: "empty response".to_string(),
        });
    }

    Ok(dest)
}
