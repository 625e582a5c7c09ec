use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Shared error representation delivered to `error` callbacks.
///
/// Errors are reference counted so a single failure can be fanned out to every
/// observer registered on a subject.
pub type SharedError = Arc<dyn Error + Send + Sync>;

pub type Result<T> = std::result::Result<T, ObservableError>;

#[derive(Debug, Error)]
pub enum ObservableError {
    /// An error raised by a named producer, wrapping the underlying cause.
    #[error("{name} observable emitted an error")]
    InfoRoot {
        name: &'static str,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },

    #[error("{0} observable emitted an error")]
    Info(String),

    /// A completion signal was not fulfilled within the allotted time.
    #[error("timed out after {0:?} waiting for completion")]
    Timeout(Duration),

    #[error("tokio scheduler requested outside of a tokio runtime")]
    NoRuntime,
}

impl ObservableError {
    pub fn new(name: &'static str, source: impl Error + Send + Sync + 'static) -> Self {
        ObservableError::InfoRoot {
            name,
            source: Box::new(source),
        }
    }

    /// Converts into the form passed to `Observer::error`.
    #[must_use]
    pub fn into_shared(self) -> SharedError {
        Arc::new(self)
    }
}
