use thiserror::Error;

/// Failure taxonomy for every backend-facing operation.
///
/// Failures are caught at the user-triggered action and turned into
/// events; nothing propagates to a global handler.
#[derive(Debug, Error)]
pub enum StudioError {
    #[error("backend request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("backend returned {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("no usable API credential is configured")]
    CredentialMissing,

    #[error("model response contained no image part")]
    NoImageReturned,

    #[error("speech response contained no audio part")]
    NoAudioReturned,

    #[error("video operation finished without a downloadable resource")]
    NoVideoReturned,

    #[error("video render did not finish within {0} status checks")]
    TimedOut(u32),

    #[error("video render was cancelled")]
    Cancelled,

    #[error("failed to decode {what}: {detail}")]
    Decode { what: &'static str, detail: String },

    #[error("async runtime unavailable: {0}")]
    Runtime(String),
}

impl StudioError {
    /// True when the failure signals that the configured credential or
    /// model identity is invalid and the user should re-select a key.
    pub fn is_credential_missing(&self) -> bool {
        matches!(self, StudioError::CredentialMissing)
    }
}
