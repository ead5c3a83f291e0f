use std::path::PathBuf;

/// Errors that can occur while indexing a repository or resolving a bundle.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A manifest in the repository or the request could not be parsed.
    #[error(transparent)]
    Manifest(#[from] bundle_manifest::Error),

    /// More than one provider satisfies a requirement under the
    /// `noambiguity` strategy.
    #[error(
        "ambiguous requirement on {requirement} {range}: provided by {}",
        .candidates.join(", ")
    )]
    AmbiguousRequirement {
        requirement: String,
        range: String,
        candidates: Vec<String>,
    },

    /// No provider satisfies a mandatory requirement.
    #[error("unresolved requirement on {requirement} {range}")]
    UnresolvedRequirement { requirement: String, range: String },

    /// Failed to parse resolver configuration TOML.
    #[error("failed to parse resolver configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Unknown value for the requirement strategy.
    #[error("unknown requirement strategy '{0}' (expected first, noambiguity or all)")]
    UnknownStrategy(String),

    /// The repository listing could not be parsed.
    #[error("failed to parse {format} repository listing at {path}: {message}")]
    ListingParse {
        path: PathBuf,
        format: String,
        message: String,
    },

    /// The listing file extension maps to no supported format.
    #[error("unsupported repository listing format: {extension}")]
    UnsupportedFormat { extension: String },

    /// The listing location uses a transport this crate does not implement.
    #[error("unsupported repository source: {0}")]
    UnsupportedSource(String),

    /// A listing entry is structurally invalid.
    #[error("invalid entry #{index} in repository listing: {reason}")]
    InvalidListingEntry { index: usize, reason: String },

    /// The resolver was asked for an index without a configured repository.
    #[error("resolver '{0}' has no repository configured")]
    NoRepository(String),

    /// An artifact was listed without anywhere to fetch it from.
    #[error("artifact {0} has no location")]
    MissingLocation(String),

    /// I/O error reading a listing, manifest or artifact.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
