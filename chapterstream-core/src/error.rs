use thiserror::Error;

/// Failures the loader can observe. None of these are fatal to the host
/// page: batch operations catch them, log, and leave state untouched so the
/// next edge trigger can retry.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Transport-level fetch failure (connection refused, timeout, ...).
    /// Transient; nothing is marked failed for it.
    #[error("fetch failed: {0}")]
    Fetch(anyhow::Error),
    /// A neighbor book's base page could not be resolved into metadata.
    #[error("no metadata available for book {0}")]
    MissingMetadata(String),
}
