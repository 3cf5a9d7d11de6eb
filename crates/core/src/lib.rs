//! link: an observable session manager for a financial account-linking SDK
//!
//! This crate binds a mutable, observable configuration to **at most one**
//! live vendor-SDK session, recreating the session whenever the
//! configuration changes, and exposes readiness and control handles to the
//! caller. The vendor SDK itself, the host's script loading, and any UI are
//! external collaborators injected as traits (see `link-runtime`).
//!
//! # Example
//!
//! ```ignore
//! use link::{LinkConfig, LinkSessionManager, VendorGlobal, load_sdk};
//! use tokio::sync::watch;
//!
//! #[tokio::main]
//! async fn main() {
//!     // The host supplies the script loader; the executed script installs
//!     // the vendor factory into the global.
//!     let global = VendorGlobal::new();
//!     let sdk = load_sdk(&host_loader(), global);
//!
//!     let (config_tx, config_rx) = watch::channel(LinkConfig::new());
//!     let handle = LinkSessionManager::spawn(config_rx, sdk);
//!
//!     // No session yet: no token, and the script may still be loading.
//!     assert!(!handle.ready());
//!
//!     // Supplying a token triggers reconciliation once the SDK is loaded.
//!     config_tx.send_modify(|c| c.token = Some("link-sandbox-123".into()));
//!     handle.wait_ready().await;
//!     handle.open();
//! }
//! # fn host_loader() -> impl link::ScriptLoader { unimplemented!() }
//! ```

mod handle;
mod manager;
mod session;

pub use handle::LinkHandle;
pub use manager::LinkSessionManager;

pub use link_protocol::{ExitOptions, LinkConfig, LinkConfigBuilder, OnLoad, OpenOptions};
pub use link_runtime::{
    Error, ExitCallback, LINK_SDK_STABLE_URL, LoadCallback, Result, ScriptLoader, SdkHandle,
    SessionConfig, VendorFactory, VendorGlobal, VendorSession, load_sdk,
};
