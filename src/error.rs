use thiserror::Error;

/// Errors raised while turning a book into an m4b
#[derive(Error, Debug)]
pub enum ConvertError {
    /// The metadata document (or job payload) cannot describe a valid book
    #[error("Invalid metadata: {field}: {reason}")]
    InvalidMetadata { field: String, reason: String },

    /// Best-effort fetch that the caller is expected to shrug off
    #[error("Could not fetch {what}: {reason}")]
    TransientFetchFailure { what: String, reason: String },

    /// Downloading one of the audio parts failed
    #[error("Failed to download part {index}: {reason}")]
    PartDownload { index: usize, reason: String },

    /// An external tool ran but did not succeed; `diagnostic` is its stderr, untouched
    #[error("{tool} failed ({status}):\n{diagnostic}")]
    ExternalToolFailure {
        tool: String,
        status: String,
        diagnostic: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConvertError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidMetadata {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Whether the conversion may carry on after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::TransientFetchFailure { .. })
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
