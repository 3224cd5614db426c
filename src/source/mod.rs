//! Where the audio parts come from: a local book folder or a download job

pub mod cover;
pub mod local;
pub mod remote;

pub use cover::fetch_cover;
pub use local::{find_book_dirs, load_book_dir, LocalBook};
pub use remote::{build_client, download_parts, JobPayload};
