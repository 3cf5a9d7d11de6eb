//! Collaborator contracts for the vendor SDK.
//!
//! The vendor SDK's internals (embedded frame, OAuth redirect handling,
//! token exchange) are entirely opaque; this module only pins down the
//! surface the session manager drives: a factory that creates sessions and
//! the three session operations `open`, `exit`, `destroy`.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value, json};

use link_protocol::{ExitOptions, LinkConfig, OnLoad, OpenOptions};

use crate::error::Result;

/// Callback fired by the vendor when an `exit` request has completed.
pub type ExitCallback = Box<dyn FnOnce() + Send>;

/// Merged configuration handed to the vendor factory.
///
/// Built from the caller's [`LinkConfig`] with `on_load` replaced by the
/// manager's wrapper, which marks the session's frame-loaded flag before
/// invoking the caller's own callback.
#[derive(Clone)]
pub struct SessionConfig {
    /// Opaque link token.
    pub token: Option<String>,
    /// OAuth continuation redirect URI.
    pub received_redirect_uri: Option<String>,
    /// Opaque vendor options forwarded verbatim.
    pub extra: Map<String, Value>,
    /// Frame-loaded callback, already wrapped by the manager.
    pub on_load: OnLoad,
}

impl SessionConfig {
    /// Merges the caller's configuration with the manager's wrapped callback.
    pub fn merge(config: &LinkConfig, on_load: OnLoad) -> Self {
        Self {
            token: config.token.clone(),
            received_redirect_uri: config.received_redirect_uri.clone(),
            extra: config.extra.clone(),
            on_load,
        }
    }

    /// Renders the JSON shape a real vendor `create` call expects.
    ///
    /// The callback is not representable in JSON; bridging implementations
    /// register it separately.
    pub fn to_vendor_json(&self) -> Value {
        let mut value = Value::Object(self.extra.clone());
        if let Some(token) = &self.token {
            value["token"] = json!(token);
        }
        if let Some(uri) = &self.received_redirect_uri {
            value["receivedRedirectUri"] = json!(uri);
        }
        value
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("token", &self.token)
            .field("received_redirect_uri", &self.received_redirect_uri)
            .field("extra", &self.extra)
            .finish()
    }
}

/// One live vendor session, created by a [`VendorFactory`].
///
/// Operations mirror the vendor's session object. `exit` is asynchronous on
/// the vendor side; `on_exited` fires when the exit has completed, and
/// `destroy` must only ever be invoked from that callback so a destroy never
/// races a pending exit.
pub trait VendorSession: Send + Sync {
    /// Opens the vendor UI, optionally preselecting an institution.
    fn open(&self, options: Option<&OpenOptions>);

    /// Requests that the session exit; `on_exited` fires on completion.
    fn exit(&self, options: ExitOptions, on_exited: ExitCallback);

    /// Releases the session's resources. Call only after `exit` completed.
    fn destroy(&self);
}

/// The vendor's `create` entry point, installed into the
/// [`VendorGlobal`](crate::VendorGlobal) by the executed script.
pub trait VendorFactory: Send + Sync {
    /// Creates a session from the merged configuration.
    fn create(&self, config: SessionConfig) -> Result<Arc<dyn VendorSession>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use link_protocol::LinkConfig;
    use serde_json::json;

    #[test]
    fn merge_carries_caller_fields_verbatim() {
        let config = LinkConfig::builder()
            .token("link-sandbox-123")
            .vendor_option("env", json!("sandbox"))
            .build();

        let merged = SessionConfig::merge(&config, Arc::new(|| {}));
        assert_eq!(merged.token.as_deref(), Some("link-sandbox-123"));
        assert!(merged.received_redirect_uri.is_none());

        let value = merged.to_vendor_json();
        assert_eq!(value["token"], "link-sandbox-123");
        assert_eq!(value["env"], "sandbox");
    }

    #[test]
    fn vendor_json_includes_redirect_uri() {
        let config = LinkConfig::builder()
            .received_redirect_uri("https://host.example/oauth")
            .build();
        let merged = SessionConfig::merge(&config, Arc::new(|| {}));
        let value = merged.to_vendor_json();
        assert_eq!(value["receivedRedirectUri"], "https://host.example/oauth");
        assert!(value.get("token").is_none());
    }
}
