//! Caller-facing handle to a spawned session manager.

use std::sync::Arc;

use tokio::sync::watch;

use link_protocol::OpenOptions;
use link_runtime::Error;

use crate::manager::Shared;

/// Observable readiness plus the `open`/`exit` control surface.
///
/// All operations are safe to call at any time: when no session exists they
/// are silent no-ops, so callers never need to check for a session first.
/// Cloning shares the underlying manager state; dropping the last clone
/// ends the manager, tearing down any live session.
#[derive(Clone)]
pub struct LinkHandle {
    shared: Arc<Shared>,
    _guard: Arc<ShutdownGuard>,
}

/// Ends the reconciliation task when the last handle clone is dropped.
struct ShutdownGuard {
    shared: Arc<Shared>,
}

impl Drop for ShutdownGuard {
    fn drop(&mut self) {
        self.shared.request_shutdown();
    }
}

impl LinkHandle {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        let guard = Arc::new(ShutdownGuard {
            shared: Arc::clone(&shared),
        });
        Self {
            shared,
            _guard: guard,
        }
    }

    /// Derives current readiness: a session exists AND (the SDK finished
    /// loading OR the session's frame has signaled loaded).
    pub fn ready(&self) -> bool {
        self.shared.ready()
    }

    /// Returns a receiver that changes whenever readiness flips.
    pub fn ready_watch(&self) -> watch::Receiver<bool> {
        self.shared.ready_watch()
    }

    /// Waits until readiness becomes true.
    ///
    /// Returns false if the manager shut down before becoming ready. Note
    /// that a vendor script that never finishes loading stalls this forever;
    /// the adapter defines no load timeout.
    pub async fn wait_ready(&self) -> bool {
        let mut rx = self.shared.ready_watch();
        loop {
            if *rx.borrow_and_update() {
                return true;
            }
            if self.shared.is_stopped() || rx.changed().await.is_err() {
                return false;
            }
        }
    }

    /// Opens the vendor UI for the current session. No-op without a session.
    pub fn open(&self) {
        self.open_inner(None);
    }

    /// Opens the vendor UI with options. No-op without a session.
    pub fn open_with(&self, options: &OpenOptions) {
        self.open_inner(Some(options));
    }

    fn open_inner(&self, options: Option<&OpenOptions>) {
        if !self.shared.open_session(options) {
            tracing::debug!(target: "link.manager", "open called with no live session");
        }
    }

    /// Force-exits the current session and destroys it once the vendor
    /// reports the exit complete. No-op without a session.
    pub fn exit(&self) {
        self.shared.teardown_current();
        self.shared.publish_ready();
    }

    /// Ends the reconciliation task; any live session is torn down on the
    /// way out and later configuration changes are ignored. Dropping the
    /// last handle clone does the same.
    pub fn shutdown(&self) {
        self.shared.request_shutdown();
    }

    /// Takes the most recent reconciliation failure, if any.
    ///
    /// Reconciliation runs on a background task, so `SdkUnavailable` and
    /// factory failures surface here instead of unwinding into the caller.
    pub fn take_error(&self) -> Option<Error> {
        self.shared.take_error()
    }
}

impl std::fmt::Debug for LinkHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkHandle")
            .field("ready", &self.ready())
            .finish()
    }
}
