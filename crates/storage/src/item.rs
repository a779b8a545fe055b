//! Fallback store: durable plain items, no attributes or expiry.
//!
//! A backend that fails once is not trusted again: the first error turns
//! the fallback tier off for every store on the host.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use sk_domain::diagnostics::{DiagnosticEvent, DiagnosticId};

use crate::error::{BackendError, StoreError};
use crate::host::StorageHost;
use crate::store::{EntryAttributes, KeyValueStore, StoreKind};

const STORE: &str = "fallback";

pub struct ItemStore {
    host: Arc<StorageHost>,
    enabled: AtomicBool,
}

impl ItemStore {
    pub(crate) fn new(host: Arc<StorageHost>) -> Self {
        Self {
            host,
            enabled: AtomicBool::new(true),
        }
    }

    pub fn host(&self) -> &Arc<StorageHost> {
        &self.host
    }

    fn check(&self) -> Result<(), StoreError> {
        if !self.enabled.load(Ordering::SeqCst) || !self.host.storage_gate() {
            return Err(StoreError::Disabled { store: STORE });
        }
        if !self.host.storage_available() {
            return Err(StoreError::Unavailable { store: STORE });
        }
        Ok(())
    }

    fn backend_failed(&self, id: DiagnosticId, message: &str, e: BackendError) -> StoreError {
        self.host.mark_storage_unavailable(&e.to_string());
        self.host
            .diagnostics()
            .record(DiagnosticEvent::warning(id, message).with_exception(&e));
        StoreError::Backend {
            store: STORE,
            source: e,
        }
    }
}

impl KeyValueStore for ItemStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Fallback
    }

    fn supports_attributes(&self) -> bool {
        false
    }

    fn is_enabled(&self) -> bool {
        self.check().is_ok()
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    fn try_get(&self, name: &str) -> Result<Option<String>, StoreError> {
        self.check()?;
        self.host.item_backend().get_item(name).map_err(|e| {
            self.backend_failed(
                DiagnosticId::CannotReadFallbackStore,
                "Failed read of fallback storage",
                e,
            )
        })
    }

    fn try_set(
        &self,
        name: &str,
        value: &str,
        _attrs: &EntryAttributes,
    ) -> Result<(), StoreError> {
        self.check()?;
        self.host.item_backend().set_item(name, value).map_err(|e| {
            self.backend_failed(
                DiagnosticId::CannotWriteFallbackStore,
                "Failed write to fallback storage",
                e,
            )
        })
    }

    fn try_delete(&self, name: &str) -> Result<(), StoreError> {
        self.check()?;
        self.host.item_backend().remove_item(name).map_err(|e| {
            self.backend_failed(
                DiagnosticId::FailedRemovalFromFallbackStore,
                "Failed removal of fallback storage item",
                e,
            )
        })
    }
}
