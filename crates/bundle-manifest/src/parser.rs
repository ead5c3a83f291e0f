//! Manifest headers to [`BundleDescriptor`].
//!
//! Recognised headers:
//!
//! | Header | Parameters |
//! |---|---|
//! | `Bundle-SymbolicName` | required; directives such as `singleton:=true` are dropped |
//! | `Bundle-Version` | defaults to `0.0.0` |
//! | `Export-Package` | `version` (exact, default `0.0.0`), `uses:=` |
//! | `Import-Package` | `version` (range, default `>=0.0.0`), `resolution:=` |
//! | `Require-Bundle` | `bundle-version` (range), `resolution:=`, `visibility:=` |
//!
//! Every other header is ignored.

use crate::clause::{Clause, parse_clauses};
use crate::descriptor::{BundleDescriptor, ExportEntry, ImportEntry, RequireBundleEntry, Resolution};
use crate::error::{Error, Result};
use crate::manifest::Manifest;
use crate::range::VersionRange;
use crate::version::Version;

pub const BUNDLE_SYMBOLIC_NAME: &str = "Bundle-SymbolicName";
pub const BUNDLE_VERSION: &str = "Bundle-Version";
pub const BUNDLE_NAME: &str = "Bundle-Name";
pub const BUNDLE_DESCRIPTION: &str = "Bundle-Description";
pub const BUNDLE_MANIFEST_VERSION: &str = "Bundle-ManifestVersion";
pub const EXPORT_PACKAGE: &str = "Export-Package";
pub const IMPORT_PACKAGE: &str = "Import-Package";
pub const REQUIRE_BUNDLE: &str = "Require-Bundle";

/// Build a bundle descriptor from manifest headers.
pub fn parse_bundle(manifest: &Manifest) -> Result<BundleDescriptor> {
    let symbolic_name = parse_symbolic_name(manifest)?;
    let version = match manifest.get(BUNDLE_VERSION) {
        Some(text) => Version::parse(text)?,
        None => Version::ZERO,
    };

    let mut bundle = BundleDescriptor::new(symbolic_name, version);

    if let Some(name) = manifest.get(BUNDLE_NAME) {
        bundle = bundle.with_name(name);
    }
    if let Some(description) = manifest.get(BUNDLE_DESCRIPTION) {
        bundle = bundle.with_description(description);
    }
    if let Some(text) = manifest.get(BUNDLE_MANIFEST_VERSION) {
        let manifest_version = text.trim().parse::<u32>().map_err(|_| {
            Error::header(BUNDLE_MANIFEST_VERSION, format!("'{text}' is not a number"))
        })?;
        bundle = bundle.with_manifest_version(manifest_version);
    }

    for clause in clauses(manifest, EXPORT_PACKAGE)? {
        let version = match clause
            .attribute("version")
            .or_else(|| clause.attribute("specification-version"))
        {
            Some(text) => Version::parse(text)?,
            None => Version::ZERO,
        };
        let uses: Vec<String> = clause
            .directive("uses")
            .map(|u| {
                u.split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let mut attributes = clause.attributes.clone();
        attributes.remove("version");
        attributes.remove("specification-version");

        for package in &clause.names {
            let mut export = ExportEntry::new(package.clone(), version.clone());
            export.uses = uses.clone();
            export.attributes = attributes.clone();
            bundle = bundle.with_export(export);
        }
    }

    for clause in clauses(manifest, IMPORT_PACKAGE)? {
        let range = parse_range(clause.attribute("version"))?;
        let resolution = Resolution::from_directive(IMPORT_PACKAGE, clause.directive("resolution"))?;
        for package in &clause.names {
            bundle = bundle.with_import(ImportEntry::new(package.clone(), range.clone(), resolution));
        }
    }

    for clause in clauses(manifest, REQUIRE_BUNDLE)? {
        let range = parse_range(
            clause
                .attribute("bundle-version")
                .or_else(|| clause.attribute("version")),
        )?;
        let resolution = Resolution::from_directive(REQUIRE_BUNDLE, clause.directive("resolution"))?;
        let reexport = match clause.directive("visibility") {
            None | Some("private") => false,
            Some("reexport") => true,
            Some(other) => {
                return Err(Error::header(
                    REQUIRE_BUNDLE,
                    format!("unknown visibility directive '{other}'"),
                ));
            }
        };
        for name in &clause.names {
            let mut require = RequireBundleEntry::new(name.clone(), range.clone(), resolution);
            require.reexport = reexport;
            bundle = bundle.with_require(require);
        }
    }

    Ok(bundle)
}

fn parse_symbolic_name(manifest: &Manifest) -> Result<String> {
    let value = manifest
        .get(BUNDLE_SYMBOLIC_NAME)
        .ok_or_else(|| Error::MissingHeader {
            header: BUNDLE_SYMBOLIC_NAME.to_string(),
        })?;
    if value.trim().is_empty() {
        return Err(Error::header(BUNDLE_SYMBOLIC_NAME, "empty symbolic name"));
    }
    let clauses = parse_clauses(BUNDLE_SYMBOLIC_NAME, value)?;
    match clauses.as_slice() {
        [clause] if clause.names.len() == 1 => Ok(clause.names[0].clone()),
        _ => Err(Error::header(
            BUNDLE_SYMBOLIC_NAME,
            format!("expected exactly one symbolic name, got '{value}'"),
        )),
    }
}

fn clauses(manifest: &Manifest, header: &str) -> Result<Vec<Clause>> {
    match manifest.get(header) {
        Some(value) if !value.trim().is_empty() => parse_clauses(header, value),
        _ => Ok(Vec::new()),
    }
}

fn parse_range(text: Option<&str>) -> Result<VersionRange> {
    text.map(VersionRange::parse)
        .transpose()
        .map(Option::unwrap_or_default)
}
