//! Persistence media the stores sit on.
//!
//! [`CookieBackend`] is the `document.cookie` analogue: reads return the
//! whole jar as one string and writes apply a single assignment.
//! [`ItemBackend`] is the `localStorage` analogue.  Both report failures as
//! [`BackendError`]; the stores decide what a failure means.

mod file;
mod jar;
mod memory;

pub use file::{FileCookieJar, FileItemStore};
pub use jar::{CookieJar, StoredCookie};
pub use memory::{MemoryCookieJar, MemoryItemStore};

use crate::error::BackendError;

pub trait CookieBackend: Send + Sync {
    /// Every live cookie as `name=value; name2=value2`.
    fn read_all(&self) -> Result<String, BackendError>;

    /// Apply `name=<value>`, where `value` may carry `;attr=...` segments.
    fn write(&self, name: &str, value: &str) -> Result<(), BackendError>;
}

pub trait ItemBackend: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, BackendError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), BackendError>;
    fn remove_item(&self, key: &str) -> Result<(), BackendError>;
}
