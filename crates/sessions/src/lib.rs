//! Session and user identity for SessionKeep.
//!
//! A [`SessionManager`] keeps one session identity alive across page loads by
//! persisting it in the primary (cookie) tier with a mirror in the fallback
//! (item) tier.  [`UserContext`] does the same for the longer-lived
//! anonymous user id and the optional authenticated identity.

pub mod codec;
pub mod id;
pub mod lifecycle;
pub mod manager;
pub mod session;
pub mod user;

pub use codec::{decode, encode, DecodedRecord, SessionRecord};
pub use id::new_id;
pub use lifecycle::{check_expiry, ExpiryReason};
pub use manager::{session_storage_name, SessionManager, SESSION_STORAGE_NAME};
pub use session::Session;
pub use user::{validate_identifier, UserContext};
