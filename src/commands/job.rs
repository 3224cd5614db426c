use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

use super::{output_path, print_event, print_outcome};
use crate::config::Config;
use crate::naming::{FormatTemplate, NamingFields};
use crate::pipeline::{ConversionJob, ConvertEvent, Converter, CoverSource, PreparedBook};
use crate::source::{build_client, download_parts, JobPayload};

/// Run the job command - download the parts of a job payload and convert them
pub fn run(
    job_file: &Path,
    dest_override: Option<&Path>,
    format_override: Option<&str>,
    no_cover: bool,
    quiet: bool,
) -> Result<()> {
    let config = Config::load().context("Failed to load config")?;
    let dest = config.dest(dest_override);
    let template =
        FormatTemplate::parse(&config.format(format_override)).context("Failed to parse format string")?;

    let payload = JobPayload::from_json(&read_job(job_file)?)?;
    let parts = payload.ordered_parts()?;
    if let Some((part_count, spine_len)) = payload.spine_mismatch() {
        warn!(
            "Job has {} part URL(s) but the metadata lists {} spine entries; chapter times follow the metadata",
            part_count, spine_len
        );
    }

    // Chapters are checked before anything is downloaded
    let prepared = PreparedBook::from_metadata(&payload.metadata)?;
    let fields = NamingFields::from_book(&prepared.book, None);
    let output = output_path(&dest, &template, &fields)?;

    if !quiet {
        println!("{} {}", "Book:".bold(), fields.title);
    }

    let work_dir = tempfile::tempdir().context("Failed to create download directory")?;
    debug!("Downloading parts into {:?}", work_dir.path());

    let progress = if quiet {
        None
    } else {
        let pb = ProgressBar::new(parts.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} parts ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Some(pb)
    };

    let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    let client = build_client(&config.download)?;
    let timeout = Duration::from_secs(config.download.timeout_secs);

    let downloaded = rt.block_on(download_parts(
        &client,
        &parts,
        work_dir.path(),
        timeout,
        |index, total| {
            let event = ConvertEvent::Downloading { index, total };
            match progress {
                Some(ref pb) => pb.set_position(index as u64),
                None => print_event(&event, quiet),
            }
            debug!("{:?}", event);
        },
    ));
    let downloaded = match downloaded {
        Ok(paths) => paths,
        Err(e) => {
            if let Some(ref pb) = progress {
                pb.abandon();
            }
            return Err(e.into());
        }
    };
    if let Some(ref pb) = progress {
        pb.finish_and_clear();
    }

    let cover = if no_cover {
        None
    } else {
        CoverSource::pick(None, &prepared.book)
    };

    let job = ConversionJob {
        prepared,
        parts: downloaded,
        cover,
    };

    let converter = Converter::new(&config);
    let outcome = converter.convert(&job, &output, |event| print_event(&event, quiet))?;
    print_outcome(&outcome);

    Ok(())
}

/// Job JSON from a file, or from stdin when the path is `-`
fn read_job(job_file: &Path) -> Result<String> {
    if job_file == Path::new("-") {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .context("Failed to read job from stdin")?;
        return Ok(content);
    }

    std::fs::read_to_string(job_file).with_context(|| format!("Failed to read job file {:?}", job_file))
}
