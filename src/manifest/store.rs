//! In-memory manifest store
//!
//! Maps package name → manifest (version, dependencies, directory). Built by
//! discovery from disk, then handed to the release engine, which only reads
//! it or mutates versions and dependency constraints in place.

use crate::core::error::{PublishError, PublishResult};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// A single package manifest (the fields of package.json the engine uses).
#[derive(Debug, Clone, PartialEq)]
pub struct PackageManifest {
  pub name: String,
  pub version: String,
  /// Dependency name → version constraint, exactly as declared
  pub dependencies: BTreeMap<String, String>,
  /// Package directory; only used by I/O collaborators
  pub directory: PathBuf,
  /// Full original document, so unknown fields survive write-back
  document: Map<String, Value>,
}

impl PackageManifest {
  #[cfg(test)]
  pub fn new(name: impl Into<String>, version: impl Into<String>, directory: impl Into<PathBuf>) -> Self {
    Self {
      name: name.into(),
      version: version.into(),
      dependencies: BTreeMap::new(),
      directory: directory.into(),
      document: Map::new(),
    }
  }

  /// Builder-style helper to declare a dependency
  #[cfg(test)]
  pub fn with_dependency(mut self, name: impl Into<String>, constraint: impl Into<String>) -> Self {
    self.dependencies.insert(name.into(), constraint.into());
    self
  }

  /// Does this package declare `name` as a dependency?
  pub fn depends_on(&self, name: &str) -> bool {
    self.dependencies.contains_key(name)
  }

  /// Build a manifest from a parsed package.json document.
  ///
  /// `name` is required. A missing `version` is kept as an empty string and
  /// rejected later by the bump policy. Non-string dependency values stay in
  /// the document but are not part of the dependency graph.
  pub fn from_document(document: Value, directory: &Path) -> PublishResult<Self> {
    let Value::Object(document) = document else {
      return Err(PublishError::message(format!(
        "package.json in {} is not a JSON object",
        directory.display()
      )));
    };

    let name = document
      .get("name")
      .and_then(Value::as_str)
      .filter(|n| !n.is_empty())
      .ok_or_else(|| PublishError::message(format!("package.json in {} has no name", directory.display())))?
      .to_string();

    let version = document
      .get("version")
      .and_then(Value::as_str)
      .unwrap_or_default()
      .to_string();

    let dependencies = document
      .get("dependencies")
      .and_then(Value::as_object)
      .map(|deps| {
        deps
          .iter()
          .filter_map(|(dep, constraint)| constraint.as_str().map(|c| (dep.clone(), c.to_string())))
          .collect()
      })
      .unwrap_or_default();

    Ok(Self {
      name,
      version,
      dependencies,
      directory: directory.to_path_buf(),
      document,
    })
  }

  /// Render the manifest back into a package.json document.
  ///
  /// Key order of the original document is kept; only `version` and the
  /// string entries of `dependencies` are replaced.
  pub fn to_document(&self) -> Value {
    let mut document = self.document.clone();
    document.insert("name".to_string(), Value::String(self.name.clone()));
    document.insert("version".to_string(), Value::String(self.version.clone()));

    if !self.dependencies.is_empty() || document.contains_key("dependencies") {
      let deps = document
        .entry("dependencies")
        .or_insert_with(|| Value::Object(Map::new()));
      if let Value::Object(deps) = deps {
        for (dep, constraint) in &self.dependencies {
          deps.insert(dep.clone(), Value::String(constraint.clone()));
        }
      }
    }

    Value::Object(document)
  }
}

/// All known packages, in discovery order.
#[derive(Debug, Clone, Default)]
pub struct ManifestStore {
  manifests: Vec<PackageManifest>,
  index: HashMap<String, usize>,
}

impl ManifestStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Insert a manifest. A second manifest with the same name replaces the
  /// first but keeps its position; the replaced one is returned.
  pub fn insert(&mut self, manifest: PackageManifest) -> Option<PackageManifest> {
    match self.index.get(&manifest.name) {
      Some(&idx) => Some(std::mem::replace(&mut self.manifests[idx], manifest)),
      None => {
        self.index.insert(manifest.name.clone(), self.manifests.len());
        self.manifests.push(manifest);
        None
      }
    }
  }

  pub fn get(&self, name: &str) -> Option<&PackageManifest> {
    self.index.get(name).map(|&idx| &self.manifests[idx])
  }

  pub fn get_mut(&mut self, name: &str) -> Option<&mut PackageManifest> {
    self.index.get(name).map(|&idx| &mut self.manifests[idx])
  }

  pub fn contains(&self, name: &str) -> bool {
    self.index.contains_key(name)
  }

  /// Package names in discovery order
  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.manifests.iter().map(|m| m.name.as_str())
  }

  pub fn iter(&self) -> impl Iterator<Item = &PackageManifest> {
    self.manifests.iter()
  }

  pub fn len(&self) -> usize {
    self.manifests.len()
  }

  pub fn is_empty(&self) -> bool {
    self.manifests.is_empty()
  }
}

impl FromIterator<PackageManifest> for ManifestStore {
  fn from_iter<I: IntoIterator<Item = PackageManifest>>(iter: I) -> Self {
    let mut store = ManifestStore::new();
    for manifest in iter {
      store.insert(manifest);
    }
    store
  }
}
