use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

use crate::config::{AudioCodec, EncodeConfig};
use crate::error::{ConvertError, Result};

/// Concat demuxer list: one `file '<path>'` line per part
pub fn concat_manifest(parts: &[PathBuf]) -> String {
    parts
        .iter()
        .map(|p| format!("file '{}'", p.display().to_string().replace('\'', "'\\''")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Everything needed for the single ffmpeg pass that produces the m4b
#[derive(Debug, Clone)]
pub struct MuxPlan {
    pub ffmpeg: String,
    pub concat_list: PathBuf,
    pub sidecar: PathBuf,
    pub cover: Option<PathBuf>,
    pub output: PathBuf,
    pub codec: AudioCodec,
    pub bitrate: String,
}

impl MuxPlan {
    pub fn new(
        encode: &EncodeConfig,
        concat_list: PathBuf,
        sidecar: PathBuf,
        cover: Option<PathBuf>,
        output: PathBuf,
    ) -> Self {
        Self {
            ffmpeg: encode.ffmpeg.clone(),
            concat_list,
            sidecar,
            cover,
            output,
            codec: encode.codec,
            bitrate: encode.bitrate.clone(),
        }
    }

    /// Arguments: audio from input 0 (concat), tags and chapters from input 1
    /// (sidecar), optional attached picture from input 2
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();

        for arg in ["-y", "-f", "concat", "-safe", "0", "-i"] {
            args.push(arg.into());
        }
        args.push(self.concat_list.clone().into_os_string());
        args.push("-i".into());
        args.push(self.sidecar.clone().into_os_string());

        if let Some(ref cover) = self.cover {
            args.push("-i".into());
            args.push(cover.clone().into_os_string());
        }

        for arg in ["-map_metadata", "1", "-map_chapters", "1", "-map", "0:a"] {
            args.push(arg.into());
        }

        if self.cover.is_some() {
            for arg in [
                "-map",
                "2:v",
                "-c:v",
                "copy",
                "-disposition:v",
                "attached_pic",
            ] {
                args.push(arg.into());
            }
        }

        match self.codec {
            AudioCodec::Aac => {
                for arg in ["-c:a", "aac", "-b:a", self.bitrate.as_str()] {
                    args.push(arg.into());
                }
            }
            AudioCodec::Copy => {
                for arg in ["-c:a", "copy"] {
                    args.push(arg.into());
                }
            }
        }

        for arg in ["-f", "mp4", "-movflags", "+faststart"] {
            args.push(arg.into());
        }
        args.push(self.output.clone().into_os_string());

        args
    }

    /// Shell-like rendering of the command, for dry runs and logs
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.ffmpeg.clone()];
        for arg in self.args() {
            let arg = arg.to_string_lossy().to_string();
            if arg.contains(' ') || arg.is_empty() {
                parts.push(format!("\"{}\"", arg));
            } else {
                parts.push(arg);
            }
        }
        parts.join(" ")
    }
}

/// Check that the ffmpeg binary runs
pub fn check_ffmpeg(ffmpeg: &str) -> Result<()> {
    let output = Command::new(ffmpeg)
        .arg("-version")
        .output()
        .map_err(|e| ConvertError::ExternalToolFailure {
            tool: ffmpeg.to_string(),
            status: "not found".to_string(),
            diagnostic: format!(
                "Could not run {}. Install FFmpeg and make sure it is on your PATH: {}",
                ffmpeg, e
            ),
        })?;

    if !output.status.success() {
        return Err(ConvertError::ExternalToolFailure {
            tool: ffmpeg.to_string(),
            status: output.status.to_string(),
            diagnostic: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    debug!("{} is available", ffmpeg);
    Ok(())
}

/// Run the mux. On failure the error carries ffmpeg's stderr verbatim.
pub fn run(plan: &MuxPlan) -> Result<()> {
    debug!("Running: {}", plan.display_command());

    let output = Command::new(&plan.ffmpeg)
        .args(plan.args())
        .output()
        .map_err(|e| ConvertError::ExternalToolFailure {
            tool: plan.ffmpeg.clone(),
            status: "failed to start".to_string(),
            diagnostic: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(ConvertError::ExternalToolFailure {
            tool: plan.ffmpeg.clone(),
            status: output.status.to_string(),
            diagnostic: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    if !plan.output.exists() {
        return Err(ConvertError::ExternalToolFailure {
            tool: plan.ffmpeg.clone(),
            status: output.status.to_string(),
            diagnostic: format!("{} was not created", plan.output.display()),
        });
    }

    Ok(())
}

/// Write the concat list and sidecar into `work_dir`, returning their paths
pub fn write_inputs(work_dir: &Path, parts: &[PathBuf], sidecar: &str) -> Result<(PathBuf, PathBuf)> {
    let concat_list = work_dir.join("concat.txt");
    std::fs::write(&concat_list, concat_manifest(parts))?;

    let sidecar_path = work_dir.join("chapters.txt");
    std::fs::write(&sidecar_path, sidecar)?;

    Ok((concat_list, sidecar_path))
}
