//! Error types for the Link runtime.

use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reconciling against the vendor SDK.
#[derive(Debug, Error)]
pub enum Error {
    /// The script reported load-complete but no factory was installed in the
    /// vendor global. There is no recovery path inside the adapter; the
    /// caller decides whether to retry, reload, or surface the failure.
    #[error("Link SDK unavailable: script loaded but no vendor factory is installed")]
    SdkUnavailable,

    /// The vendor factory refused to create a session.
    #[error("Failed to create vendor session: {0}")]
    CreateFailed(String),
}

impl Error {
    /// Returns true if this is the missing-global error.
    pub fn is_sdk_unavailable(&self) -> bool {
        matches!(self, Error::SdkUnavailable)
    }
}
