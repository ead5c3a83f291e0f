//! Error types for bundle-manifest

/// Result type for bundle-manifest operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while parsing versions, ranges and manifest headers.
///
/// Parsing never falls back to a default on bad input: a value that is
/// present but unparsable is always one of these errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A version or version range could not be parsed.
    #[error("malformed version '{input}': {reason}")]
    MalformedVersion { input: String, reason: String },

    /// A header the bundle cannot be described without is absent.
    #[error("missing required manifest header: {header}")]
    MissingHeader { header: String },

    /// A header is present but violates the manifest or clause grammar.
    #[error("malformed {header} header: {reason}")]
    MalformedHeader { header: String, reason: String },
}

impl Error {
    pub(crate) fn version(input: &str, reason: impl Into<String>) -> Self {
        Self::MalformedVersion {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn header(header: &str, reason: impl Into<String>) -> Self {
        Self::MalformedHeader {
            header: header.to_string(),
            reason: reason.into(),
        }
    }
}
