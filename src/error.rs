use std::io;

/// A specialized [`Result`](std::result::Result) type for tree delta
/// operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for path operations and delta traversals.
///
/// The engine performs no local recovery: the first error raised while
/// driving an [`Editor`](crate::Editor) aborts the traversal and is returned
/// to the caller unchanged. Errors reported by a supplied entity store or
/// editor are carried in the [`Io`](Error::Io) variant together with the
/// name of the failing operation.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The given string is not a well-formed URL for the attempted
    /// operation.
    #[error("malformed URL '{url}': {reason}")]
    MalformedUrl {
        /// The offending URL.
        url: String,
        /// Why it was rejected.
        reason: &'static str,
    },
    /// The given string is not a well-formed path for the attempted
    /// operation.
    #[error("malformed path '{path}': {reason}")]
    MalformedPath {
        /// The offending path.
        path: String,
        /// Why it was rejected.
        reason: &'static str,
    },
    /// A path that must be in canonical form is not.
    #[error("path '{0}' is not in canonical form")]
    NotCanonical(String),
    /// Two node identities share no common lineage.
    ///
    /// The delta engine never raises this itself (unrelated identities flow
    /// into the from-scratch branch of a replace); it is vocabulary for
    /// entity store implementations that are asked to relate nodes.
    #[error("node identities are unrelated")]
    Unrelated,
    /// An entity store or editor operation failed.
    #[error("{operation}: {source}")]
    Io {
        /// The store or editor operation that failed.
        operation: &'static str,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
    /// The traversal was interrupted by the caller's cancellation callback.
    ///
    /// The editor has observed a prefix of the edit stream and the edit
    /// should be abandoned.
    #[error("operation cancelled")]
    Cancelled,
    /// An internal consistency check failed.
    #[error("invariant violated: {0}")]
    Invariant(&'static str),
}

impl Error {
    /// Wraps an I/O error, attributing it to the named store or editor
    /// operation.
    #[inline]
    pub fn io(operation: &'static str, source: io::Error) -> Self {
        Self::Io { operation, source }
    }
}

impl From<io::Error> for Error {
    #[inline]
    fn from(value: io::Error) -> Self {
        Self::Io {
            operation: "i/o",
            source: value,
        }
    }
}
