//! OSGi bundle manifest parsing.
//!
//! Turns `MANIFEST.MF` text into an immutable [`BundleDescriptor`]: the
//! bundle identity plus its exported packages, imported packages and
//! required bundles, each carrying a version or [`VersionRange`].
//!
//! # Example
//!
//! ```
//! use bundle_manifest::{BundleDescriptor, Version};
//!
//! let bundle = BundleDescriptor::parse(
//!     "Bundle-SymbolicName: com.example.app\n\
//!      Bundle-Version: 1.0.0\n\
//!      Import-Package: com.example.api;version=\"[1.0,2.0)\"\n",
//! )
//! .unwrap();
//!
//! assert_eq!(bundle.symbolic_name(), "com.example.app");
//! assert!(bundle.imports()[0].range.contains(&Version::new(1, 5, 0)));
//! ```

pub mod clause;
pub mod descriptor;
pub mod error;
pub mod manifest;
pub mod parser;
pub mod range;
pub mod version;

pub use clause::{Clause, parse_clauses};
pub use descriptor::{BundleDescriptor, ExportEntry, ImportEntry, RequireBundleEntry, Resolution};
pub use error::{Error, Result};
pub use manifest::Manifest;
pub use range::{UpperBound, VersionRange};
pub use version::Version;
