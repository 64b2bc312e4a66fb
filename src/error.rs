//! Error types for practica.
//!
//! All errors are strongly typed using thiserror. The taxonomy mirrors the
//! recovery policy: `FetchError` is caught per source during ingestion,
//! `StoreError` is fatal for the whole invocation, and rule matching has no
//! error path at all.

use thiserror::Error;

/// Errors raised while fetching or parsing an external feed.
///
/// These are always recovered at the orchestrator boundary: a failing source
/// is logged and skipped, never aborting the batch.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The server answered with a non-2xx status.
    #[error("HTTP status {status} fetching {url}")]
    Status {
        /// The URL that was fetched.
        url: String,
        /// The HTTP status code returned.
        status: u16,
    },

    /// The request failed before a response was obtained (DNS, TLS, timeout).
    #[error("network error fetching {url}: {message}")]
    Network {
        /// The URL that was fetched.
        url: String,
        /// Underlying transport error description.
        message: String,
    },

    /// The response body could not be parsed as a feed.
    #[error("malformed feed: {message}")]
    MalformedFeed {
        /// Parser error description.
        message: String,
    },

    /// The HTTP client itself could not be constructed.
    #[error("HTTP client setup failed: {message}")]
    ClientSetup {
        /// Builder error description.
        message: String,
    },
}

/// Errors raised by the knowledge-base store.
///
/// A broken store invalidates the whole run, so these propagate unhandled
/// to the caller instead of being converted into warnings.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem or commit failure.
    #[error("knowledge base I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Another process holds the exclusive lock on the store directory.
    #[error("knowledge base is already open in another process")]
    Locked,
}

/// Top-level error type for practica.
#[derive(Debug, Error)]
pub enum AdvisorError {
    /// Feed fetch or parse failure.
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Knowledge-base failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Settings could not be loaded.
    #[error("config error: {message}")]
    Config {
        /// What went wrong while loading settings.
        message: String,
    },
}

impl AdvisorError {
    /// Creates a config error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Returns true if this error is fatal for the whole invocation.
    ///
    /// Fetch errors are recoverable (the orchestrator skips the source);
    /// everything else aborts the run.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::Fetch(_))
    }
}

/// Result type alias for practica operations.
pub type AdvisorResult<T> = Result<T, AdvisorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_status_display() {
        let err = FetchError::Status {
            url: "https://example.org/feed".to_string(),
            status: 404,
        };
        let msg = format!("{err}");
        assert!(msg.contains("404"));
        assert!(msg.contains("example.org"));
    }

    #[test]
    fn store_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: StoreError = io.into();
        assert!(format!("{err}").contains("denied"));
    }

    #[test]
    fn fetch_errors_are_not_fatal() {
        let err: AdvisorError = FetchError::MalformedFeed {
            message: "unexpected EOF".to_string(),
        }
        .into();
        assert!(!err.is_fatal());
    }

    #[test]
    fn store_errors_are_fatal() {
        let err: AdvisorError = StoreError::Locked.into();
        assert!(err.is_fatal());
        assert!(format!("{err}").contains("another process"));
    }

    #[test]
    fn config_error_message() {
        let err = AdvisorError::config("settings.json: expected object");
        assert!(err.is_fatal());
        assert!(format!("{err}").contains("expected object"));
    }
}
