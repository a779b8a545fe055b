/// Shared error type used across all SessionKeep crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// A write the caller asked for did not reach the persistence medium.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A persisted session record failed validation and was discarded.
    #[error("malformed session record: {0}")]
    MalformedRecord(String),

    /// Decoding a persisted record failed outright.
    #[error("error parsing session record [{value}]: {message}")]
    ParseException { value: String, message: String },

    /// A caller-supplied identifier contained a reserved delimiter.
    #[error("validation rejected: {0}")]
    ValidationRejected(String),
}

pub type Result<T> = std::result::Result<T, Error>;
