//! Option structs for vendor session operations.

use serde::{Deserialize, Serialize};

/// Options for a session `exit` request.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitOptions {
    /// Skip the vendor's exit confirmation flow and close immediately.
    pub force: bool,
}

impl ExitOptions {
    /// Creates new default options (non-forced).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates forced exit options, as used when a session is replaced.
    pub fn forced() -> Self {
        Self { force: true }
    }
}

/// Options for a session `open` request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenOptions {
    /// Institution to preselect in the vendor UI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub institution_id: Option<String>,
}

impl OpenOptions {
    /// Creates a new builder.
    pub fn builder() -> OpenOptionsBuilder {
        OpenOptionsBuilder::default()
    }
}

/// Builder for [`OpenOptions`].
#[derive(Debug, Clone, Default)]
pub struct OpenOptionsBuilder {
    inner: OpenOptions,
}

impl OpenOptionsBuilder {
    /// Sets the institution to preselect.
    pub fn institution_id(mut self, id: impl Into<String>) -> Self {
        self.inner.institution_id = Some(id.into());
        self
    }

    /// Builds the options.
    pub fn build(self) -> OpenOptions {
        self.inner
    }
}
