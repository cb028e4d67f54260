//! package.json discovery, reading and write-back
//!
//! Every immediate subdirectory of the packages root that holds a
//! `package.json` is one package. Broken manifests are skipped with a
//! warning rather than failing the whole run.

use super::store::{ManifestStore, PackageManifest};
use crate::core::error::{ConfigError, PublishError, PublishResult, ResultExt};
use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "package.json";

/// Scan `root` for package directories and load their manifests.
pub fn discover(root: &Path) -> PublishResult<ManifestStore> {
  if !root.is_dir() {
    return Err(ConfigError::PackagesDirNotFound {
      path: root.to_path_buf(),
    }
    .into());
  }

  let mut store = ManifestStore::new();
  for dir in package_dirs(root)? {
    match read_manifest(&dir) {
      Ok(manifest) => {
        debug!("found package {} in {}", manifest.name, dir.display());
        if let Some(previous) = store.insert(manifest) {
          warn!(
            "package name '{}' declared twice; using {} instead of {}",
            previous.name,
            dir.display(),
            previous.directory.display()
          );
        }
      }
      Err(e) => warn!("unable to load {}: {}", dir.join(MANIFEST_FILE).display(), e),
    }
  }

  Ok(store)
}

/// Immediate subdirectories of `root` containing a package.json, sorted.
fn package_dirs(root: &Path) -> PublishResult<Vec<PathBuf>> {
  let mut dirs = Vec::new();
  let entries = fs::read_dir(root).with_context(|| format!("Failed to read directory {}", root.display()))?;

  for entry in entries {
    let path = entry?.path();
    if path.is_dir() && path.join(MANIFEST_FILE).is_file() {
      dirs.push(path);
    }
  }

  dirs.sort();
  Ok(dirs)
}

/// Read and parse `<dir>/package.json`.
pub fn read_manifest(dir: &Path) -> PublishResult<PackageManifest> {
  let path = dir.join(MANIFEST_FILE);
  let content = fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
  let document = parse_document(&content).with_context(|| format!("Failed to parse {}", path.display()))?;
  PackageManifest::from_document(document, dir)
}

/// Parse package.json text, tolerating a leading UTF-8 BOM.
pub fn parse_document(content: &str) -> PublishResult<Value> {
  let content = content.strip_prefix('\u{feff}').unwrap_or(content);
  Ok(serde_json::from_str(content)?)
}

/// Serialize a manifest with two-space indentation.
pub fn render_manifest(manifest: &PackageManifest) -> PublishResult<String> {
  let document = manifest.to_document();
  let mut buf = Vec::new();
  let formatter = serde_json::ser::PrettyFormatter::with_indent(b"  ");
  let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
  document.serialize(&mut serializer)?;
  String::from_utf8(buf).map_err(|e| PublishError::message(format!("UTF-8 conversion error: {}", e)))
}

/// Write the manifest back to `<directory>/package.json`.
pub fn write_manifest(manifest: &PackageManifest) -> PublishResult<()> {
  let path = manifest.directory.join(MANIFEST_FILE);
  let content = render_manifest(manifest)?;
  fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
  debug!("wrote {}", path.display());
  Ok(())
}
