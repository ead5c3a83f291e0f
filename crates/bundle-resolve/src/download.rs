//! Artifact download and the local artifact cache.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::module::Artifact;

const CHECKSUM_PREFIX: &str = "sha256:";

/// Options for a download request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadOptions {
    /// Fetch again even when the artifact is already cached.
    pub force: bool,
}

/// Outcome of downloading one artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DownloadStatus {
    Successful,
    /// Already cached, nothing transferred.
    NoTransfer,
    Failed,
}

impl DownloadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadStatus::Successful => "successful",
            DownloadStatus::NoTransfer => "no-transfer",
            DownloadStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactDownloadReport {
    pub artifact: Artifact,
    pub status: DownloadStatus,
    /// Where the artifact sits in the cache.
    pub local_path: Option<PathBuf>,
    /// `sha256:<hex>` of the cached file.
    pub checksum: Option<String>,
    pub size: Option<u64>,
    /// Why the download failed.
    pub message: Option<String>,
}

impl ArtifactDownloadReport {
    fn cached(artifact: &Artifact, status: DownloadStatus, path: PathBuf, content: &[u8]) -> Self {
        Self {
            artifact: artifact.clone(),
            status,
            local_path: Some(path),
            checksum: Some(checksum(content)),
            size: Some(content.len() as u64),
            message: None,
        }
    }

    fn failed(artifact: &Artifact, error: &Error) -> Self {
        Self {
            artifact: artifact.clone(),
            status: DownloadStatus::Failed,
            local_path: None,
            checksum: None,
            size: None,
            message: Some(error.to_string()),
        }
    }
}

/// Reports for every artifact of a download request, in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadReport {
    pub artifacts: Vec<ArtifactDownloadReport>,
}

impl DownloadReport {
    pub fn artifact_report(&self, artifact: &Artifact) -> Option<&ArtifactDownloadReport> {
        self.artifacts.iter().find(|r| &r.artifact == artifact)
    }

    pub fn has_failures(&self) -> bool {
        self.artifacts
            .iter()
            .any(|r| r.status == DownloadStatus::Failed)
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

/// Fetches artifacts for a repository resolver.
pub trait ArtifactDownloader: Send + Sync {
    /// Fetch one artifact. Failures are reported, not raised.
    fn download(&self, artifact: &Artifact, options: &DownloadOptions) -> ArtifactDownloadReport;

    fn download_all(&self, artifacts: &[Artifact], options: &DownloadOptions) -> DownloadReport {
        DownloadReport {
            artifacts: artifacts
                .iter()
                .map(|artifact| self.download(artifact, options))
                .collect(),
        }
    }
}

/// Copies artifacts from their listed location into a local cache laid out
/// as `<root>/<name>/<revision>/<name>-<revision>.<ext>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsArtifactCache {
    root: PathBuf,
}

impl FsArtifactCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The platform cache directory, or the temp directory when the
    /// platform has none.
    pub fn default_root() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("bundle-resolve")
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Cache path of `artifact`.
    pub fn path_for(&self, artifact: &Artifact) -> PathBuf {
        self.root
            .join(&artifact.module.name)
            .join(artifact.module.revision.to_string())
            .join(artifact.file_name())
    }

    fn fetch(&self, artifact: &Artifact, target: &Path) -> Result<Vec<u8>> {
        let location = artifact
            .location
            .as_deref()
            .ok_or_else(|| Error::MissingLocation(artifact.to_string()))?;
        let source = Path::new(location.strip_prefix("file://").unwrap_or(location));
        let content = fs::read(source).map_err(|e| Error::io(source, e))?;
        write_atomic(target, &content)?;
        Ok(content)
    }
}

impl Default for FsArtifactCache {
    fn default() -> Self {
        Self::new(Self::default_root())
    }
}

impl ArtifactDownloader for FsArtifactCache {
    fn download(&self, artifact: &Artifact, options: &DownloadOptions) -> ArtifactDownloadReport {
        let target = self.path_for(artifact);

        if !options.force && target.is_file() {
            return match fs::read(&target) {
                Ok(content) => {
                    tracing::debug!(artifact = %artifact, "Artifact already cached");
                    ArtifactDownloadReport::cached(artifact, DownloadStatus::NoTransfer, target, &content)
                }
                Err(e) => ArtifactDownloadReport::failed(artifact, &Error::io(&target, e)),
            };
        }

        match self.fetch(artifact, &target) {
            Ok(content) => {
                tracing::info!(
                    artifact = %artifact,
                    path = %target.display(),
                    size = content.len(),
                    "Downloaded artifact"
                );
                ArtifactDownloadReport::cached(artifact, DownloadStatus::Successful, target, &content)
            }
            Err(error) => {
                tracing::warn!(artifact = %artifact, error = %error, "Artifact download failed");
                ArtifactDownloadReport::failed(artifact, &error)
            }
        }
    }
}

/// `sha256:<hex>` of `content`.
pub fn checksum(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{}{:x}", CHECKSUM_PREFIX, hasher.finalize())
}

/// Write through a locked, uniquely named temp file in the target
/// directory, then rename over the target. Concurrent writers of the same
/// artifact each get their own temp file; the last rename wins.
fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;

    let mut temp_file = NamedTempFile::new_in(parent).map_err(|e| Error::io(parent, e))?;
    let temp_path = temp_file.path().to_path_buf();
    temp_file
        .as_file()
        .lock_exclusive()
        .map_err(|e| Error::io(&temp_path, e))?;
    temp_file
        .write_all(content)
        .map_err(|e| Error::io(&temp_path, e))?;
    temp_file
        .as_file()
        .sync_all()
        .map_err(|e| Error::io(&temp_path, e))?;
    temp_file
        .as_file()
        .unlock()
        .map_err(|e| Error::io(&temp_path, e))?;

    temp_file
        .persist(path)
        .map(|_| ())
        .map_err(|e| Error::io(path, e.error))
}
