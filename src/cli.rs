use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "libby2m4b")]
#[command(about = "Turn Libby audiobook downloads into chaptered m4b files")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase output verbosity
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a downloaded book folder (MP3 parts + metadata/metadata.json)
    Convert {
        /// Book folder, or a library root with --recursive
        book_dir: PathBuf,

        /// Destination directory (uses config default if not specified)
        output_dir: Option<PathBuf>,

        /// Convert every book folder found below BOOK_DIR
        #[arg(long)]
        recursive: bool,

        /// Naming template for the output path (uses config default if not specified)
        #[arg(long)]
        format: Option<String>,

        /// Show what would be done without running ffmpeg
        #[arg(long)]
        dry_run: bool,

        /// Skip books whose output file already exists
        #[arg(long)]
        skip_existing: bool,

        /// Do not embed cover art
        #[arg(long)]
        no_cover: bool,
    },

    /// Download and convert a job payload ({"metadata": ..., "urls": [...]})
    Job {
        /// Job JSON file, or - to read from stdin
        job_file: PathBuf,

        /// Destination directory (uses config default if not specified)
        #[arg(long)]
        dest: Option<PathBuf>,

        /// Naming template for the output path (uses config default if not specified)
        #[arg(long)]
        format: Option<String>,

        /// Do not embed cover art
        #[arg(long)]
        no_cover: bool,
    },

    /// Print the chapter table computed from a metadata document
    Chapters {
        /// metadata.json, or a book folder containing metadata/metadata.json
        path: PathBuf,

        /// Output as JSON
        #[arg(long, conflicts_with = "ffmetadata")]
        json: bool,

        /// Output the FFMETADATA sidecar handed to ffmpeg
        #[arg(long)]
        ffmetadata: bool,
    },

    /// List available naming template placeholders
    Fields,
}
