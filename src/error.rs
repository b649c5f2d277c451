use thiserror::Error;

/// Error surface of the lifecycle harness
#[derive(Error, Debug)]
pub enum Error {
    // Work-function failures (the only modeled failure in the lifecycle)
    #[error("Worker error: {0}")]
    Worker(String),

    // Signal subscription failures (surfaced by the entry points)
    #[error("Signal registration failed: {0}")]
    Signal(std::io::Error),

    // I/O errors (potentially transient)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a work-function error from any displayable reason
    pub fn worker(reason: impl Into<String>) -> Self {
        Self::Worker(reason.into())
    }

    /// Check whether this error originated in the work function itself
    #[must_use]
    pub const fn is_worker(&self) -> bool {
        matches!(self, Self::Worker(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_error_display() {
        let err = Error::worker("queue drained unexpectedly");
        assert_eq!(err.to_string(), "Worker error: queue drained unexpectedly");
        assert!(err.is_worker());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io.into();
        assert!(!err.is_worker());
        assert!(err.to_string().contains("missing"));
    }
}
