//! Package manifests: the in-memory store and its package.json I/O
//!
//! - **store**: `ManifestStore` and `PackageManifest`, the data the release engine works on
//! - **package_json**: discovery of package directories and manifest read/write-back

pub mod package_json;
pub mod store;

pub use store::{ManifestStore, PackageManifest};
