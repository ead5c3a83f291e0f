//! Repository listing loading.
//!
//! A listing is a TOML, JSON or YAML file with a top-level `bundle` array:
//!
//! ```toml
//! [[bundle]]
//! location = "jars/com.example.base-1.2.3.jar"
//! manifest_file = "manifests/com.example.base.MF"
//!
//! [[bundle]]
//! location = "jars/com.example.app-1.0.0.jar"
//! manifest = """
//! Bundle-SymbolicName: com.example.app
//! Import-Package: com.example.base
//! """
//!
//! [[bundle]]
//! location = "jars/com.example.util-2.0.0.jar"
//! [bundle.headers]
//! Bundle-SymbolicName = "com.example.util"
//! Bundle-Version = "2.0.0"
//! ```
//!
//! Relative paths are resolved against the listing's directory.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use bundle_manifest::{BundleDescriptor, Manifest};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::index::IndexedBundle;

/// Where a repository listing lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositorySource {
    listing: PathBuf,
}

impl RepositorySource {
    pub fn new(listing: impl Into<PathBuf>) -> Self {
        Self {
            listing: listing.into(),
        }
    }

    /// Parse a plain path or a `file://` URL.
    ///
    /// Other URL schemes are rejected.
    pub fn parse(location: &str) -> Result<Self> {
        let location = location.trim();
        if let Some(path) = location.strip_prefix("file://") {
            return Ok(Self::new(path));
        }
        let has_scheme = location.split_once("://").is_some_and(|(scheme, _)| {
            !scheme.is_empty() && scheme.chars().all(|c| c.is_ascii_alphanumeric() || c == '+')
        });
        if has_scheme {
            return Err(Error::UnsupportedSource(location.to_string()));
        }
        Ok(Self::new(location))
    }

    pub fn path(&self) -> &Path {
        &self.listing
    }

    /// Read and parse every entry of the listing, in listing order.
    pub fn load(&self) -> Result<Vec<IndexedBundle>> {
        load_listing(&self.listing)
    }
}

impl fmt::Display for RepositorySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.listing.display())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Listing {
    #[serde(default)]
    bundle: Vec<ListingEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ListingEntry {
    location: Option<String>,
    manifest: Option<String>,
    manifest_file: Option<PathBuf>,
    headers: Option<BTreeMap<String, String>>,
}

/// Load the listing at `path`. The format follows the file extension.
pub fn load_listing(path: &Path) -> Result<Vec<IndexedBundle>> {
    let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let listing = parse_listing(path, &content)?;

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let base = dunce::canonicalize(parent).map_err(|e| Error::io(parent, e))?;

    let bundles = listing
        .bundle
        .into_iter()
        .enumerate()
        .map(|(index, entry)| entry.into_indexed(index, &base))
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(
        listing = %path.display(),
        bundles = bundles.len(),
        "Loaded repository listing"
    );
    Ok(bundles)
}

fn parse_listing(path: &Path, content: &str) -> Result<Listing> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let parse_error = |format: &str, message: String| Error::ListingParse {
        path: path.to_path_buf(),
        format: format.into(),
        message,
    };

    match extension.to_lowercase().as_str() {
        "toml" => toml::from_str(content).map_err(|e| parse_error("TOML", e.to_string())),
        "json" => serde_json::from_str(content).map_err(|e| parse_error("JSON", e.to_string())),
        "yaml" | "yml" => {
            serde_yaml::from_str(content).map_err(|e| parse_error("YAML", e.to_string()))
        }
        _ => Err(Error::UnsupportedFormat {
            extension: extension.to_string(),
        }),
    }
}

impl ListingEntry {
    fn into_indexed(self, index: usize, base: &Path) -> Result<IndexedBundle> {
        let invalid = |reason: String| Error::InvalidListingEntry { index, reason };

        let manifest = match (self.manifest, self.manifest_file, self.headers) {
            (Some(text), None, None) => Manifest::parse(&text).map_err(|e| invalid(e.to_string()))?,
            (None, Some(file), None) => {
                let file = base.join(file);
                let text = fs::read_to_string(&file).map_err(|e| Error::io(&file, e))?;
                Manifest::parse(&text).map_err(|e| invalid(format!("{}: {e}", file.display())))?
            }
            (None, None, Some(headers)) => Manifest::from_headers(headers),
            (None, None, None) => {
                return Err(invalid(
                    "expected one of `manifest`, `manifest_file` or `headers`".into(),
                ));
            }
            _ => {
                return Err(invalid(
                    "only one of `manifest`, `manifest_file` or `headers` may be given".into(),
                ));
            }
        };

        let descriptor = BundleDescriptor::from_manifest(&manifest).map_err(|e| invalid(e.to_string()))?;
        let location = self.location.map(|l| {
            let path = l.strip_prefix("file://").unwrap_or(&l);
            base.join(path).to_string_lossy().into_owned()
        });
        Ok(IndexedBundle::new(descriptor, location))
    }
}
