use std::sync::Arc;

use parking_lot::Mutex;

use crate::vendor::VendorFactory;

/// Shared slot for the vendor's `create` factory.
///
/// In a real host this corresponds to the global object the executed vendor
/// script populates. It is passed around explicitly rather than read as a
/// true global so the manager stays testable without a script-loading
/// environment. Cloning shares the slot.
#[derive(Clone, Default)]
pub struct VendorGlobal {
    slot: Arc<Mutex<Option<Arc<dyn VendorFactory>>>>,
}

impl VendorGlobal {
    /// Creates an empty vendor global.
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the factory. Called by the host once the script has executed.
    pub fn install(&self, factory: Arc<dyn VendorFactory>) {
        tracing::debug!(target: "link.loader", "vendor factory installed");
        *self.slot.lock() = Some(factory);
    }

    /// Returns the installed factory, if any.
    pub fn factory(&self) -> Option<Arc<dyn VendorFactory>> {
        self.slot.lock().clone()
    }

    /// Returns true if a factory has been installed.
    pub fn is_installed(&self) -> bool {
        self.slot.lock().is_some()
    }
}

impl std::fmt::Debug for VendorGlobal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VendorGlobal")
            .field("installed", &self.is_installed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::vendor::{SessionConfig, VendorSession};

    struct NoopFactory;

    impl VendorFactory for NoopFactory {
        fn create(&self, _config: SessionConfig) -> Result<Arc<dyn VendorSession>> {
            unimplemented!("not exercised")
        }
    }

    #[test]
    fn clones_share_the_slot() {
        let global = VendorGlobal::new();
        let view = global.clone();
        assert!(!view.is_installed());

        global.install(Arc::new(NoopFactory));
        assert!(view.is_installed());
        assert!(view.factory().is_some());
    }
}
