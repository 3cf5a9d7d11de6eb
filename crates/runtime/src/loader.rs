//! Vendor script loading.
//!
//! The actual script injection belongs to the host environment; this module
//! only drives it and turns its one-shot completion callback into an
//! observable loading flag. No retry, timeout, or error channel exists: if
//! the load never completes the flag stays `true` forever and no session is
//! ever created downstream.

use tokio::sync::watch;

use crate::global::VendorGlobal;

/// The vendor's stable script bundle URL.
pub const LINK_SDK_STABLE_URL: &str = "https://cdn.plaid.com/link/v2/stable/link-initialize.js";

/// Completion callback handed to the host's script loader. Invoked exactly
/// once, when the script has finished loading and executing.
pub type LoadCallback = Box<dyn FnOnce() + Send>;

/// Host-environment script injection.
///
/// `load` begins fetching and executing the script asynchronously as soon as
/// it is called. De-duplication of repeated loads of the same URL across
/// multiple managers is the implementation's concern, not this crate's.
pub trait ScriptLoader: Send + Sync {
    /// Starts loading `url`, invoking `on_complete` exactly once when done.
    fn load(&self, url: &str, on_complete: LoadCallback);
}

/// Observation of one SDK load plus the vendor global it will populate.
///
/// Cloning shares the underlying load flag and global.
#[derive(Clone)]
pub struct SdkHandle {
    is_loading: watch::Receiver<bool>,
    global: VendorGlobal,
}

impl SdkHandle {
    /// Returns true while the script is still loading.
    pub fn is_loading(&self) -> bool {
        *self.is_loading.borrow()
    }

    /// Returns a receiver that changes when the load flag flips.
    pub fn loading_watch(&self) -> watch::Receiver<bool> {
        self.is_loading.clone()
    }

    /// Returns the vendor global the loaded script populates.
    pub fn global(&self) -> &VendorGlobal {
        &self.global
    }
}

impl std::fmt::Debug for SdkHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SdkHandle")
            .field("is_loading", &self.is_loading())
            .field("global", &self.global)
            .finish()
    }
}

/// Kicks off the SDK load and returns the handle to observe it.
///
/// The loading flag starts `true` and flips to `false` exactly once, when
/// the loader reports completion.
pub fn load_sdk(loader: &dyn ScriptLoader, global: VendorGlobal) -> SdkHandle {
    let (tx, rx) = watch::channel(true);
    tracing::debug!(target: "link.loader", url = LINK_SDK_STABLE_URL, "loading vendor SDK");
    loader.load(
        LINK_SDK_STABLE_URL,
        Box::new(move || {
            tracing::debug!(target: "link.loader", "vendor SDK load complete");
            // Receivers may already be gone if the manager was torn down
            // before the script finished.
            let _ = tx.send(false);
        }),
    );
    SdkHandle {
        is_loading: rx,
        global,
    }
}
