use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Callback invoked when the vendor session's embedded frame has loaded.
pub type OnLoad = Arc<dyn Fn() + Send + Sync>;

/// Caller-supplied configuration for a Link session.
///
/// The manager never mutates this; it reads the current value on every
/// reconciliation and augments it (wrapping `on_load`) when constructing a
/// session. A session is only warranted once `token` or
/// `received_redirect_uri` is present.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkConfig {
    /// Opaque link token obtained from the vendor's token endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Redirect URI the host was re-entered with, for OAuth continuation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received_redirect_uri: Option<String>,

    /// Invoked once the session's embedded frame has loaded.
    #[serde(skip)]
    pub on_load: Option<OnLoad>,

    /// Opaque vendor options forwarded verbatim to the session factory.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LinkConfig {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new builder.
    pub fn builder() -> LinkConfigBuilder {
        LinkConfigBuilder::default()
    }

    /// Returns true if this configuration warrants a session at all.
    pub fn warrants_session(&self) -> bool {
        self.token.is_some() || self.received_redirect_uri.is_some()
    }
}

impl fmt::Debug for LinkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkConfig")
            .field("token", &self.token)
            .field("received_redirect_uri", &self.received_redirect_uri)
            .field("on_load", &self.on_load.as_ref().map(|_| "Fn"))
            .field("extra", &self.extra)
            .finish()
    }
}

/// Builder for [`LinkConfig`].
#[derive(Clone, Default)]
pub struct LinkConfigBuilder {
    inner: LinkConfig,
}

impl LinkConfigBuilder {
    /// Sets the link token.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.inner.token = Some(token.into());
        self
    }

    /// Sets the OAuth continuation redirect URI.
    pub fn received_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.inner.received_redirect_uri = Some(uri.into());
        self
    }

    /// Sets the frame-loaded callback.
    pub fn on_load(mut self, on_load: impl Fn() + Send + Sync + 'static) -> Self {
        self.inner.on_load = Some(Arc::new(on_load));
        self
    }

    /// Adds an opaque vendor option, forwarded verbatim to the factory.
    pub fn vendor_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.inner.extra.insert(key.into(), value);
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> LinkConfig {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn warrants_session_requires_token_or_redirect() {
        assert!(!LinkConfig::new().warrants_session());
        assert!(LinkConfig::builder().token("abc").build().warrants_session());
        assert!(
            LinkConfig::builder()
                .received_redirect_uri("https://host.example/oauth")
                .build()
                .warrants_session()
        );
    }

    #[test]
    fn extra_options_flatten_into_vendor_shape() {
        let config = LinkConfig::builder()
            .token("link-sandbox-123")
            .vendor_option("env", json!("sandbox"))
            .vendor_option("product", json!(["auth", "transactions"]))
            .build();

        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["token"], "link-sandbox-123");
        assert_eq!(value["env"], "sandbox");
        assert_eq!(value["product"][0], "auth");
        // Absent fields are omitted entirely.
        assert!(value.get("receivedRedirectUri").is_none());
    }

    #[test]
    fn redirect_uri_uses_camel_case() {
        let config = LinkConfig::builder()
            .received_redirect_uri("https://host.example/oauth")
            .build();
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["receivedRedirectUri"], "https://host.example/oauth");
    }

    #[test]
    fn on_load_is_not_serialized() {
        let config = LinkConfig::builder().token("abc").on_load(|| {}).build();
        let value = serde_json::to_value(&config).unwrap();
        assert!(value.get("onLoad").is_none());
    }
}
