//! The live session slot entry.
//!
//! A session moves through `live → exiting → destroyed`; teardown is
//! fire-and-forget, and `destroy` runs only from the vendor's
//! exit-completion callback so it can never race a pending exit.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use link_protocol::ExitOptions;
use link_runtime::VendorSession;

/// One live vendor session plus the manager's frame-loaded observation.
pub(crate) struct ActiveSession {
    session: Arc<dyn VendorSession>,
    iframe_loaded: Arc<AtomicBool>,
}

impl ActiveSession {
    pub(crate) fn new(session: Arc<dyn VendorSession>, iframe_loaded: Arc<AtomicBool>) -> Self {
        Self {
            session,
            iframe_loaded,
        }
    }

    /// True once the session's own `onLoad` has fired.
    pub(crate) fn iframe_loaded(&self) -> bool {
        self.iframe_loaded.load(Ordering::SeqCst)
    }

    /// Clones out the vendor handle so callers can operate on it without
    /// holding the slot lock.
    pub(crate) fn vendor(&self) -> Arc<dyn VendorSession> {
        Arc::clone(&self.session)
    }

    /// Force-exits the session and destroys it once the vendor reports the
    /// exit complete. Consumes the entry: a torn-down session is never
    /// operated on again.
    pub(crate) fn teardown(self) {
        tracing::debug!(target: "link.session", "force-exiting session");
        let session = Arc::clone(&self.session);
        self.session.exit(
            ExitOptions::forced(),
            Box::new(move || {
                tracing::debug!(target: "link.session", "exit complete, destroying session");
                session.destroy();
            }),
        );
    }
}
