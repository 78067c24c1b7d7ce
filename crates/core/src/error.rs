//! Unified error types for nrfeed.
//!
//! Only `NotFound` and `UpstreamUnavailable` are meant to reach a client. Every
//! other variant is recovered inside the refresh pipeline by serving the last
//! known good document.

use tokio_rusqlite::rusqlite;

/// Unified error types for the nrfeed service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The feed identifier is not in the registry.
    #[error("NOT_FOUND: {0}")]
    NotFound(String),

    /// No document was ever produced for this feed and the upstream could not supply one.
    #[error("UPSTREAM_UNAVAILABLE: {0}")]
    UpstreamUnavailable(String),

    /// Transport error, timeout, or non-success status from the origin.
    #[error("UPSTREAM_FETCH_FAILED: {0}")]
    UpstreamFetchFailed(String),

    /// The upstream page could not be turned into a feed document.
    #[error("RENDER_FAILED: {0}")]
    RenderFailed(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Cache record could not be encoded.
    #[error("CACHE_ERROR: record encoding failed: {0}")]
    RecordEncoding(#[from] serde_json::Error),

    /// Lock file could not be opened or locked.
    #[error("LOCK_ERROR: {0}")]
    Lock(std::io::Error),

    /// Filesystem error outside the lock path (cache directory, registry file).
    #[error("IO_ERROR: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid source URL in the registry.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Feed registry could not be loaded.
    #[error("REGISTRY_ERROR: {0}")]
    Registry(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl Error {
    /// Whether this error may be shown to a client as-is.
    ///
    /// Everything else is an internal condition the refresh pipeline degrades around.
    pub fn is_client_facing(&self) -> bool {
        matches!(self, Error::NotFound(_) | Error::UpstreamUnavailable(_))
    }
}
