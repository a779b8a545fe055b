use sk_domain::error::Error;

/// Failure reported by a persistence medium.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("quota exceeded")]
    QuotaExceeded,

    #[error("IO: {0}")]
    Io(String),
}

/// Why a store operation did not reach its backend, or what the backend
/// said when it did.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{store} store is disabled")]
    Disabled { store: &'static str },

    #[error("{store} store is unavailable")]
    Unavailable { store: &'static str },

    #[error("{store} backend failed: {source}")]
    Backend {
        store: &'static str,
        #[source]
        source: BackendError,
    },
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Error::StorageUnavailable(e.to_string())
    }
}
