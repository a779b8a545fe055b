//! Two-tier key-value persistence for session identity.
//!
//! A [`StorageHost`] stands in for the hosting page: it owns the cookie and
//! item backends and every value shared by the stores built on it.  The
//! primary tier is a [`CookieStore`] (attributes, expiry); the fallback tier
//! is an [`ItemStore`] (plain, durable).  Both implement [`KeyValueStore`]
//! and go quiet instead of failing when their backend cannot be used.

pub mod backend;
pub mod cookie;
pub mod error;
pub mod host;
pub mod item;
pub mod same_site;
pub mod store;

pub use backend::{
    CookieBackend, FileCookieJar, FileItemStore, ItemBackend, MemoryCookieJar, MemoryItemStore,
};
pub use cookie::CookieStore;
pub use error::{BackendError, StoreError};
pub use host::{StorageHost, StorageHostBuilder};
pub use item::ItemStore;
pub use store::{EntryAttributes, KeyValueStore, StoreKind};
