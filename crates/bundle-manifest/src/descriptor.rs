//! Bundle descriptors: the structured form of a bundle manifest.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::manifest::Manifest;
use crate::range::VersionRange;
use crate::version::Version;

/// Whether a requirement must be satisfied for the bundle to resolve.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    #[default]
    Mandatory,
    Optional,
}

impl Resolution {
    pub fn is_optional(self) -> bool {
        self == Resolution::Optional
    }

    /// Interpret a `resolution:=` directive; `None` means mandatory.
    pub(crate) fn from_directive(header: &str, value: Option<&str>) -> Result<Self> {
        match value {
            None | Some("mandatory") => Ok(Resolution::Mandatory),
            Some("optional") => Ok(Resolution::Optional),
            Some(other) => Err(Error::header(
                header,
                format!("unknown resolution directive '{other}'"),
            )),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Resolution::Mandatory => "mandatory",
            Resolution::Optional => "optional",
        })
    }
}

/// A package offered by a bundle (`Export-Package`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportEntry {
    pub package: String,
    pub version: Version,
    /// Packages named by the `uses:=` directive.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub uses: Vec<String>,
    /// Arbitrary matching attributes other than the version.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

/// A package needed by a bundle (`Import-Package`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportEntry {
    pub package: String,
    pub range: VersionRange,
    pub resolution: Resolution,
}

/// A whole bundle needed by a bundle (`Require-Bundle`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequireBundleEntry {
    pub symbolic_name: String,
    pub range: VersionRange,
    pub resolution: Resolution,
    /// `visibility:=reexport`: the required bundle's packages are passed on
    /// to whoever requires this bundle.
    #[serde(default)]
    pub reexport: bool,
}

/// Identity and requirements of one bundle.
///
/// Descriptors are values: once built (normally by
/// [`BundleDescriptor::parse`]) they are never mutated, and the `with_*`
/// builders consume and return a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleDescriptor {
    symbolic_name: String,
    version: Version,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    manifest_version: Option<u32>,
    #[serde(default)]
    exports: Vec<ExportEntry>,
    #[serde(default)]
    imports: Vec<ImportEntry>,
    #[serde(default)]
    requires: Vec<RequireBundleEntry>,
}

impl BundleDescriptor {
    /// A bundle with no exports or requirements.
    pub fn new(symbolic_name: impl Into<String>, version: Version) -> Self {
        Self {
            symbolic_name: symbolic_name.into(),
            version,
            name: None,
            description: None,
            manifest_version: None,
            exports: Vec::new(),
            imports: Vec::new(),
            requires: Vec::new(),
        }
    }

    /// Parse `MANIFEST.MF` text into a descriptor.
    pub fn parse(manifest: &str) -> Result<Self> {
        Self::from_manifest(&Manifest::parse(manifest)?)
    }

    /// Build a descriptor from parsed headers.
    pub fn from_manifest(manifest: &Manifest) -> Result<Self> {
        crate::parser::parse_bundle(manifest)
    }

    pub fn with_export(mut self, export: ExportEntry) -> Self {
        self.exports.push(export);
        self
    }

    pub fn with_import(mut self, import: ImportEntry) -> Self {
        self.imports.push(import);
        self
    }

    pub fn with_require(mut self, require: RequireBundleEntry) -> Self {
        self.requires.push(require);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_manifest_version(mut self, manifest_version: u32) -> Self {
        self.manifest_version = Some(manifest_version);
        self
    }

    pub fn symbolic_name(&self) -> &str {
        &self.symbolic_name
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    /// `Bundle-Name`, the human readable name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// `Bundle-ManifestVersion`; `2` for OSGi R4 and later.
    pub fn manifest_version(&self) -> Option<u32> {
        self.manifest_version
    }

    pub fn exports(&self) -> &[ExportEntry] {
        &self.exports
    }

    pub fn imports(&self) -> &[ImportEntry] {
        &self.imports
    }

    pub fn requires(&self) -> &[RequireBundleEntry] {
        &self.requires
    }

    /// The export entry for `package`, if this bundle exports it.
    pub fn export(&self, package: &str) -> Option<&ExportEntry> {
        self.exports.iter().find(|e| e.package == package)
    }

    pub fn exports_package(&self, package: &str) -> bool {
        self.export(package).is_some()
    }
}

impl fmt::Display for BundleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{}", self.symbolic_name, self.version)
    }
}

impl ExportEntry {
    pub fn new(package: impl Into<String>, version: Version) -> Self {
        Self {
            package: package.into(),
            version,
            uses: Vec::new(),
            attributes: BTreeMap::new(),
        }
    }
}

impl ImportEntry {
    pub fn new(package: impl Into<String>, range: VersionRange, resolution: Resolution) -> Self {
        Self {
            package: package.into(),
            range,
            resolution,
        }
    }
}

impl RequireBundleEntry {
    pub fn new(symbolic_name: impl Into<String>, range: VersionRange, resolution: Resolution) -> Self {
        Self {
            symbolic_name: symbolic_name.into(),
            range,
            resolution,
            reexport: false,
        }
    }

    pub fn reexported(mut self) -> Self {
        self.reexport = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders_accumulate_entries() {
        let bundle = BundleDescriptor::new("a", Version::new(1, 0, 0))
            .with_export(ExportEntry::new("a.api", Version::new(1, 0, 0)))
            .with_import(ImportEntry::new("b.api", VersionRange::ANY, Resolution::Optional))
            .with_require(RequireBundleEntry::new("c", VersionRange::ANY, Resolution::Mandatory));

        assert!(bundle.exports_package("a.api"));
        assert!(!bundle.exports_package("b.api"));
        assert!(bundle.imports()[0].resolution.is_optional());
        assert_eq!(bundle.requires()[0].symbolic_name, "c");
        assert_eq!(bundle.to_string(), "a;1.0.0");
    }

    #[test]
    fn test_resolution_directive() {
        assert_eq!(
            Resolution::from_directive("Import-Package", None).unwrap(),
            Resolution::Mandatory
        );
        assert_eq!(
            Resolution::from_directive("Import-Package", Some("optional")).unwrap(),
            Resolution::Optional
        );
        assert!(Resolution::from_directive("Import-Package", Some("dynamic")).is_err());
    }
}
