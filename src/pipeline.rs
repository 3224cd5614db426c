//! One conversion run: timeline and sidecar, cover, ffmpeg mux, tags

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{Config, DownloadConfig, EncodeConfig};
use crate::error::ConvertError;
use crate::ffmetadata;
use crate::libby::{BookMetadata, LibbyMetadata};
use crate::mux::{self, MuxPlan, OutputSummary};
use crate::source::{build_client, fetch_cover};
use crate::timeline::Timeline;

/// Progress notifications emitted while a book is converted
#[derive(Debug, Clone, PartialEq)]
pub enum ConvertEvent {
    PartsFound(usize),
    Downloading { index: usize, total: usize },
    CoverFetched(PathBuf),
    CoverSkipped(String),
    ChaptersBuilt { chapters: usize, total_millis: u64 },
    Muxing(PathBuf),
    Tagged(PathBuf),
}

/// Book fields, chapter timeline and sidecar text, all derived from the document.
///
/// This is the only place either driver turns metadata into chapters, and it
/// does no I/O: a document either yields a complete sidecar or an error.
#[derive(Debug, Clone)]
pub struct PreparedBook {
    pub book: BookMetadata,
    pub timeline: Timeline,
    pub sidecar: String,
}

impl PreparedBook {
    pub fn from_metadata(metadata: &LibbyMetadata) -> std::result::Result<Self, ConvertError> {
        let book = metadata.book();
        let markers = metadata.chapter_markers()?;
        let timeline = Timeline::build(metadata.spine(), &markers)?;
        let sidecar = ffmetadata::render(&book, &timeline);

        Ok(Self {
            book,
            timeline,
            sidecar,
        })
    }
}

/// Where cover art comes from, if anywhere
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverSource {
    Local(PathBuf),
    Remote(String),
}

impl CoverSource {
    /// Prefer a cover already on disk over the document's URL
    pub fn pick(local: Option<PathBuf>, book: &BookMetadata) -> Option<Self> {
        local
            .map(CoverSource::Local)
            .or_else(|| book.cover_url.clone().map(CoverSource::Remote))
    }
}

/// A book ready to be muxed
#[derive(Debug, Clone)]
pub struct ConversionJob {
    pub prepared: PreparedBook,
    /// Audio parts in playback order
    pub parts: Vec<PathBuf>,
    pub cover: Option<CoverSource>,
}

/// Result of a finished conversion
#[derive(Debug, Clone)]
pub struct ConversionOutcome {
    pub output: PathBuf,
    pub chapters: usize,
    pub summary: Option<OutputSummary>,
}

/// Runs conversion jobs with one set of encode/download settings
pub struct Converter {
    encode: EncodeConfig,
    download: DownloadConfig,
}

impl Converter {
    pub fn new(config: &Config) -> Self {
        Self {
            encode: config.encode.clone(),
            download: config.download.clone(),
        }
    }

    /// The ffmpeg invocation a job would get, with work files named relative
    /// to an unspecified work directory
    pub fn plan(&self, job: &ConversionJob, output: &Path) -> MuxPlan {
        let cover = job.cover.as_ref().map(|c| match c {
            CoverSource::Local(path) => path.clone(),
            CoverSource::Remote(url) => {
                PathBuf::from(format!("cover.{}", crate::source::cover::cover_extension(url)))
            }
        });
        MuxPlan::new(
            &self.encode,
            PathBuf::from("concat.txt"),
            PathBuf::from("chapters.txt"),
            cover,
            output.to_path_buf(),
        )
    }

    /// Convert a job into `output`.
    ///
    /// Work files live in a temporary directory that is removed afterwards.
    /// Cover problems only produce a warning; ffmpeg failures abort.
    pub fn convert<F>(
        &self,
        job: &ConversionJob,
        output: &Path,
        mut on_event: F,
    ) -> Result<ConversionOutcome>
    where
        F: FnMut(ConvertEvent),
    {
        if job.parts.is_empty() {
            anyhow::bail!("No audio parts to convert");
        }
        on_event(ConvertEvent::PartsFound(job.parts.len()));

        mux::check_ffmpeg(&self.encode.ffmpeg)?;

        let work_dir = tempfile::tempdir().context("Failed to create work directory")?;
        debug!("Work directory {:?}", work_dir.path());

        let timeline = &job.prepared.timeline;
        on_event(ConvertEvent::ChaptersBuilt {
            chapters: timeline.chapters.len(),
            total_millis: timeline.total_millis,
        });
        let (concat_list, sidecar) =
            mux::ffmpeg::write_inputs(work_dir.path(), &job.parts, &job.prepared.sidecar)?;

        let cover = match job.cover {
            Some(ref source) => self.resolve_cover(source, work_dir.path(), &mut on_event)?,
            None => None,
        };

        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        on_event(ConvertEvent::Muxing(output.to_path_buf()));
        let plan = MuxPlan::new(
            &self.encode,
            concat_list,
            sidecar,
            cover,
            output.to_path_buf(),
        );
        mux::ffmpeg::run(&plan)?;
        info!("Wrote {:?}", output);

        match mux::apply_book_tags(output, &job.prepared.book) {
            Ok(()) => on_event(ConvertEvent::Tagged(output.to_path_buf())),
            Err(e) => warn!("Could not add narrator/year tags to {:?}: {:#}", output, e),
        }

        let summary = match mux::read_summary(output) {
            Ok(summary) => Some(summary),
            Err(e) => {
                warn!("Could not read back {:?}: {:#}", output, e);
                None
            }
        };

        Ok(ConversionOutcome {
            output: output.to_path_buf(),
            chapters: timeline.chapters.len(),
            summary,
        })
    }

    /// Local covers are used as-is; remote ones are fetched into `work_dir`.
    /// A failed fetch is reported and the book goes on without a cover.
    fn resolve_cover<F>(
        &self,
        source: &CoverSource,
        work_dir: &Path,
        on_event: &mut F,
    ) -> Result<Option<PathBuf>>
    where
        F: FnMut(ConvertEvent),
    {
        let fetched = match source {
            CoverSource::Local(path) => Ok(path.clone()),
            CoverSource::Remote(url) => self.fetch_cover_sync(url, work_dir),
        };

        match fetched {
            Ok(path) => {
                on_event(ConvertEvent::CoverFetched(path.clone()));
                Ok(Some(path))
            }
            Err(e) if e.is_recoverable() => {
                warn!("{}; continuing without cover art", e);
                on_event(ConvertEvent::CoverSkipped(e.to_string()));
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Synchronous wrapper for the async cover download using tokio runtime
    fn fetch_cover_sync(
        &self,
        url: &str,
        work_dir: &Path,
    ) -> std::result::Result<PathBuf, ConvertError> {
        let rt = tokio::runtime::Runtime::new().map_err(|e| ConvertError::TransientFetchFailure {
            what: "cover art".to_string(),
            reason: format!("Failed to create tokio runtime: {}", e),
        })?;
        let client = build_client(&self.download)?;
        let timeout = Duration::from_secs(self.download.cover_timeout_secs);
        rt.block_on(fetch_cover(&client, url, work_dir, timeout))
    }
}
