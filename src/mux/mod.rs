//! ffmpeg mux step and the tag touch-ups applied to its output

pub mod ffmpeg;
pub mod tagging;

pub use ffmpeg::{check_ffmpeg, MuxPlan};
pub use tagging::{apply_book_tags, read_summary, OutputSummary};
