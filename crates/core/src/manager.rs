//! The Link Session Manager.
//!
//! Binds an observable [`LinkConfig`] to at most one live vendor session.
//! A background task re-runs reconciliation whenever the configuration or
//! the SDK load flag changes; the current session lives in a single slot
//! that is always torn down (force-exit, then destroy from the vendor's
//! exit-completion callback) before a replacement is created.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::{Notify, watch};

use link_protocol::{LinkConfig, OnLoad, OpenOptions};
use link_runtime::{Error, Result, SdkHandle, SessionConfig};

use crate::handle::LinkHandle;
use crate::session::ActiveSession;

/// State shared between the reconciliation task and every [`LinkHandle`].
pub(crate) struct Shared {
    sdk: SdkHandle,
    slot: Mutex<Option<ActiveSession>>,
    ready_tx: watch::Sender<bool>,
    // Held so the ready channel never closes while the manager is alive.
    ready_rx: watch::Receiver<bool>,
    last_error: Mutex<Option<Error>>,
    shutdown: Notify,
    stopped: AtomicBool,
}

impl Shared {
    fn new(sdk: SdkHandle) -> Self {
        let (ready_tx, ready_rx) = watch::channel(false);
        Self {
            sdk,
            slot: Mutex::new(None),
            ready_tx,
            ready_rx,
            last_error: Mutex::new(None),
            shutdown: Notify::new(),
            stopped: AtomicBool::new(false),
        }
    }

    /// Derives readiness from current state: a session exists AND (the SDK
    /// finished loading OR the session's frame has signaled loaded).
    pub(crate) fn ready(&self) -> bool {
        let slot = self.slot.lock();
        match slot.as_ref() {
            Some(active) => !self.sdk.is_loading() || active.iframe_loaded(),
            None => false,
        }
    }

    pub(crate) fn publish_ready(&self) {
        let ready = self.ready();
        self.ready_tx.send_if_modified(|current| {
            if *current != ready {
                *current = ready;
                true
            } else {
                false
            }
        });
    }

    pub(crate) fn ready_watch(&self) -> watch::Receiver<bool> {
        self.ready_rx.clone()
    }

    pub(crate) fn take_error(&self) -> Option<Error> {
        self.last_error.lock().take()
    }

    /// True once the reconciliation task has ended.
    pub(crate) fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Asks the reconciliation task to end; it tears down any live session
    /// on its way out. Invoked by `shutdown()` and by the last handle drop.
    pub(crate) fn request_shutdown(&self) {
        // notify_one stores a permit, so a request made before the task
        // reaches its select is not lost.
        self.shutdown.notify_one();
    }

    fn mark_stopped(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        // Wake ready watchers so they can observe the stop.
        self.ready_tx.send_modify(|_| {});
    }

    /// Removes and tears down the current session, if any. The slot lock is
    /// released before the vendor's exit is requested.
    pub(crate) fn teardown_current(&self) {
        let taken = self.slot.lock().take();
        if let Some(active) = taken {
            active.teardown();
        }
    }

    /// Opens the current session's vendor UI. Returns false when no session
    /// exists. The vendor call happens outside the slot lock.
    pub(crate) fn open_session(&self, options: Option<&OpenOptions>) -> bool {
        let session = self.slot.lock().as_ref().map(ActiveSession::vendor);
        match session {
            Some(session) => {
                session.open(options);
                true
            }
            None => false,
        }
    }

    pub(crate) fn with_session<R>(&self, f: impl FnOnce(&ActiveSession) -> R) -> Option<R> {
        self.slot.lock().as_ref().map(f)
    }

    /// One reconciliation pass over the current configuration and SDK state.
    ///
    /// Steps, in order:
    /// 1. SDK still loading: nothing to do yet.
    /// 2. No `token` and no `received_redirect_uri`: no session warranted.
    /// 3. Load complete but no factory installed: [`Error::SdkUnavailable`].
    /// 4. Tear down the existing session (force-exit, destroy on completion).
    /// 5. Create a replacement, wrapping the caller's `on_load` so the
    ///    frame-loaded flag is set exactly once per session.
    /// 6. Record it as current; the slot itself is the cleanup for the next
    ///    pass or for manager teardown.
    ///
    /// `loading` is the load state the caller observed; the run loop reads it
    /// through its own receiver so the flip a pass consumes is marked seen.
    pub(crate) fn reconcile(self: &Arc<Self>, config: &LinkConfig, loading: bool) -> Result<()> {
        if loading {
            tracing::trace!(target: "link.manager", "SDK still loading, skipping reconcile");
            return Ok(());
        }

        if !config.warrants_session() {
            tracing::trace!(target: "link.manager", "no token or redirect URI, no session warranted");
            return Ok(());
        }

        let factory = self
            .sdk
            .global()
            .factory()
            .ok_or(Error::SdkUnavailable)?;

        self.teardown_current();

        let iframe_loaded = Arc::new(AtomicBool::new(false));
        let wrapped = wrap_on_load(
            Arc::downgrade(self),
            Arc::clone(&iframe_loaded),
            config.on_load.clone(),
        );

        let session = factory.create(SessionConfig::merge(config, wrapped))?;
        tracing::debug!(
            target: "link.manager",
            has_token = config.token.is_some(),
            has_redirect_uri = config.received_redirect_uri.is_some(),
            "vendor session created"
        );
        *self.slot.lock() = Some(ActiveSession::new(session, iframe_loaded));
        Ok(())
    }

    fn reconcile_and_publish(self: &Arc<Self>, config: &LinkConfig, loading: bool) {
        if let Err(err) = self.reconcile(config, loading) {
            tracing::error!(target: "link.manager", error = %err, "reconciliation failed");
            *self.last_error.lock() = Some(err);
        }
        self.publish_ready();
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        // Manager teardown: no session outlives the manager.
        if let Some(active) = self.slot.get_mut().take() {
            active.teardown();
        }
    }
}

/// Wraps the caller's `on_load` so the manager observes the frame load.
///
/// The flag is per session and idempotent; the caller's callback runs after
/// it is set, matching the vendor's documented ordering.
fn wrap_on_load(
    shared: Weak<Shared>,
    iframe_loaded: Arc<AtomicBool>,
    caller: Option<OnLoad>,
) -> OnLoad {
    Arc::new(move || {
        iframe_loaded.store(true, Ordering::SeqCst);
        if let Some(shared) = shared.upgrade() {
            shared.publish_ready();
        }
        if let Some(caller) = &caller {
            caller();
        }
    })
}

/// Spawns the reconciliation task for one configuration stream.
pub struct LinkSessionManager;

impl LinkSessionManager {
    /// Binds `config_rx` to the SDK observation and returns the caller-facing
    /// handle.
    ///
    /// Reconciliation runs once immediately (covering an SDK that already
    /// finished loading) and again on every configuration or load-state
    /// change. The task ends when the configuration sender is dropped, when
    /// a handle calls `shutdown()`, or when the last handle clone is dropped;
    /// any live session is torn down at that point.
    pub fn spawn(config_rx: watch::Receiver<LinkConfig>, sdk: SdkHandle) -> LinkHandle {
        let shared = Arc::new(Shared::new(sdk));
        let handle = LinkHandle::new(Arc::clone(&shared));
        tokio::spawn(run(shared, config_rx));
        handle
    }
}

async fn run(shared: Arc<Shared>, mut config_rx: watch::Receiver<LinkConfig>) {
    let mut loading_rx = shared.sdk.loading_watch();
    // The load flag flips at most once; once its sender is gone there is
    // nothing left to watch on that side.
    let mut watch_loading = true;

    'reconcile: loop {
        // Mark the current load state seen before reconciling, so a flip
        // this pass already consumes does not wake the select again.
        let loading = *loading_rx.borrow_and_update();
        let config = config_rx.borrow_and_update().clone();
        shared.reconcile_and_publish(&config, loading);

        // Wait for an actual change; a closed loading channel is not one.
        loop {
            tokio::select! {
                _ = shared.shutdown.notified() => break 'reconcile,
                changed = config_rx.changed() => {
                    if changed.is_err() {
                        break 'reconcile;
                    }
                    continue 'reconcile;
                }
                changed = loading_rx.changed(), if watch_loading => {
                    match changed {
                        Ok(()) => continue 'reconcile,
                        Err(_) => watch_loading = false,
                    }
                }
            }
        }
    }

    tracing::debug!(target: "link.manager", "shutting down, tearing down any live session");
    shared.teardown_current();
    shared.publish_ready();
    shared.mark_stopped();
}

#[cfg(test)]
mod tests {
    use super::*;
    use link_runtime::{VendorFactory, VendorGlobal, VendorSession, load_sdk};
    use link_protocol::{ExitOptions, OpenOptions};
    use parking_lot::Mutex as PlMutex;
    use std::sync::atomic::AtomicUsize;

    /// Loader that completes synchronously unless told to stall.
    struct TestLoader {
        stall: bool,
        pending: PlMutex<Option<link_runtime::LoadCallback>>,
    }

    impl TestLoader {
        fn immediate() -> Self {
            Self {
                stall: false,
                pending: PlMutex::new(None),
            }
        }

        fn stalled() -> Self {
            Self {
                stall: true,
                pending: PlMutex::new(None),
            }
        }
    }

    impl link_runtime::ScriptLoader for TestLoader {
        fn load(&self, _url: &str, on_complete: link_runtime::LoadCallback) {
            if self.stall {
                *self.pending.lock() = Some(on_complete);
            } else {
                on_complete();
            }
        }
    }

    #[derive(Default)]
    struct SessionLog {
        events: PlMutex<Vec<String>>,
        created: AtomicUsize,
    }

    impl SessionLog {
        fn push(&self, event: impl Into<String>) {
            self.events.lock().push(event.into());
        }

        fn events(&self) -> Vec<String> {
            self.events.lock().clone()
        }
    }

    struct LoggingSession {
        id: usize,
        log: Arc<SessionLog>,
    }

    impl VendorSession for LoggingSession {
        fn open(&self, _options: Option<&OpenOptions>) {
            self.log.push(format!("open {}", self.id));
        }

        fn exit(&self, options: ExitOptions, on_exited: link_runtime::ExitCallback) {
            self.log
                .push(format!("exit {} force={}", self.id, options.force));
            on_exited();
        }

        fn destroy(&self) {
            self.log.push(format!("destroy {}", self.id));
        }
    }

    struct LoggingFactory {
        log: Arc<SessionLog>,
        // Wrapped on_load of the most recent session, so tests can fire the
        // vendor's frame-loaded signal.
        last_on_load: Arc<PlMutex<Option<OnLoad>>>,
    }

    impl VendorFactory for LoggingFactory {
        fn create(&self, config: SessionConfig) -> Result<Arc<dyn VendorSession>> {
            let id = self.log.created.fetch_add(1, Ordering::SeqCst) + 1;
            self.log.push(format!("create {}", id));
            *self.last_on_load.lock() = Some(Arc::clone(&config.on_load));
            Ok(Arc::new(LoggingSession {
                id,
                log: Arc::clone(&self.log),
            }))
        }
    }

    type OnLoadSlot = Arc<PlMutex<Option<OnLoad>>>;

    fn loaded_sdk_with_factory() -> (SdkHandle, Arc<SessionLog>, OnLoadSlot) {
        let log = Arc::new(SessionLog::default());
        let last_on_load: OnLoadSlot = Arc::default();
        let global = VendorGlobal::new();
        global.install(Arc::new(LoggingFactory {
            log: Arc::clone(&log),
            last_on_load: Arc::clone(&last_on_load),
        }));
        let sdk = load_sdk(&TestLoader::immediate(), global);
        (sdk, log, last_on_load)
    }

    fn fire_on_load(slot: &OnLoadSlot) {
        let on_load = slot.lock().clone().expect("no session created yet");
        on_load();
    }

    fn token_config(token: &str) -> LinkConfig {
        LinkConfig::builder().token(token).build()
    }

    #[test]
    fn reconcile_waits_for_load() {
        let loader = TestLoader::stalled();
        let global = VendorGlobal::new();
        let sdk = load_sdk(&loader, global);
        let shared = Arc::new(Shared::new(sdk));

        shared.reconcile(&token_config("abc"), shared.sdk.is_loading()).unwrap();
        assert!(!shared.ready());
        assert!(shared.with_session(|_| ()).is_none());
    }

    #[test]
    fn reconcile_waits_for_token_or_redirect_uri() {
        let (sdk, log, _) = loaded_sdk_with_factory();
        let shared = Arc::new(Shared::new(sdk));

        shared.reconcile(&LinkConfig::new(), shared.sdk.is_loading()).unwrap();
        assert!(log.events().is_empty());
        assert!(!shared.ready());
    }

    #[test]
    fn redirect_uri_alone_warrants_session() {
        let (sdk, log, _) = loaded_sdk_with_factory();
        let shared = Arc::new(Shared::new(sdk));

        let config = LinkConfig::builder()
            .received_redirect_uri("https://host.example/oauth")
            .build();
        shared.reconcile(&config, shared.sdk.is_loading()).unwrap();
        assert_eq!(log.events(), vec!["create 1"]);
    }

    #[test]
    fn reconcile_fails_without_vendor_factory() {
        let sdk = load_sdk(&TestLoader::immediate(), VendorGlobal::new());
        let shared = Arc::new(Shared::new(sdk));

        let err = shared.reconcile(&token_config("abc"), shared.sdk.is_loading()).unwrap_err();
        assert!(err.is_sdk_unavailable());
        assert!(!shared.ready());
        assert!(shared.with_session(|_| ()).is_none());
    }

    #[test]
    fn reconcile_creates_session_and_ready_follows_load() {
        let (sdk, log, _) = loaded_sdk_with_factory();
        let shared = Arc::new(Shared::new(sdk));

        shared.reconcile(&token_config("abc"), shared.sdk.is_loading()).unwrap();
        assert_eq!(log.events(), vec!["create 1"]);
        // Load is complete, so readiness does not need the frame flag.
        assert!(shared.ready());
    }

    #[test]
    fn replacement_tears_down_predecessor_first() {
        let (sdk, log, _) = loaded_sdk_with_factory();
        let shared = Arc::new(Shared::new(sdk));

        shared.reconcile(&token_config("abc"), shared.sdk.is_loading()).unwrap();
        shared.reconcile(&token_config("xyz"), shared.sdk.is_loading()).unwrap();

        assert_eq!(
            log.events(),
            vec!["create 1", "exit 1 force=true", "destroy 1", "create 2"]
        );
    }

    #[test]
    fn frame_load_flag_is_per_session_and_idempotent() {
        let (sdk, _log, on_load) = loaded_sdk_with_factory();
        let shared = Arc::new(Shared::new(sdk));

        shared.reconcile(&token_config("abc"), shared.sdk.is_loading()).unwrap();
        assert!(!shared.with_session(|s| s.iframe_loaded()).unwrap());

        fire_on_load(&on_load);
        fire_on_load(&on_load);
        assert!(shared.with_session(|s| s.iframe_loaded()).unwrap());

        // A replacement session starts with a fresh flag.
        shared.reconcile(&token_config("xyz"), shared.sdk.is_loading()).unwrap();
        assert!(!shared.with_session(|s| s.iframe_loaded()).unwrap());
    }

    #[test]
    fn caller_on_load_runs_after_flag_is_set() {
        let (sdk, _log, on_load) = loaded_sdk_with_factory();
        let shared = Arc::new(Shared::new(sdk));

        let flag_seen_by_caller = Arc::new(AtomicBool::new(false));
        let config = {
            let shared = Arc::downgrade(&shared);
            let flag_seen_by_caller = Arc::clone(&flag_seen_by_caller);
            LinkConfig::builder()
                .token("abc")
                .on_load(move || {
                    if let Some(shared) = shared.upgrade() {
                        flag_seen_by_caller.store(
                            shared.with_session(|s| s.iframe_loaded()).unwrap_or(false),
                            Ordering::SeqCst,
                        );
                    }
                })
                .build()
        };
        shared.reconcile(&config, shared.sdk.is_loading()).unwrap();

        fire_on_load(&on_load);
        assert!(flag_seen_by_caller.load(Ordering::SeqCst));
    }

    #[test]
    fn frame_load_makes_ready_even_while_loading() {
        // Readiness derivation: session AND (load complete OR frame loaded).
        // Exercise the frame-loaded branch with the load flag still true.
        let sdk = load_sdk(&TestLoader::stalled(), VendorGlobal::new());
        let shared = Arc::new(Shared::new(sdk));

        let log = Arc::new(SessionLog::default());
        let flag = Arc::new(AtomicBool::new(false));
        *shared.slot.lock() = Some(ActiveSession::new(
            Arc::new(LoggingSession { id: 1, log }),
            Arc::clone(&flag),
        ));

        assert!(!shared.ready());
        flag.store(true, Ordering::SeqCst);
        assert!(shared.ready());
    }

    #[test]
    fn teardown_current_is_noop_when_absent() {
        let (sdk, log, _) = loaded_sdk_with_factory();
        let shared = Arc::new(Shared::new(sdk));

        shared.teardown_current();
        assert!(log.events().is_empty());
    }

    #[test]
    fn drop_tears_down_live_session() {
        let (sdk, log, _) = loaded_sdk_with_factory();
        let shared = Arc::new(Shared::new(sdk));
        shared.reconcile(&token_config("abc"), shared.sdk.is_loading()).unwrap();

        drop(shared);
        assert_eq!(
            log.events(),
            vec!["create 1", "exit 1 force=true", "destroy 1"]
        );
    }
}
