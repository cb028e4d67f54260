//! Dependency constraint rewriting
//!
//! Once new versions are known, every package in the publish set that
//! declares a dependency on a bumped package gets that constraint replaced
//! by the new version string, verbatim.

use super::resolve::PublishSet;
use crate::manifest::ManifestStore;
use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;

/// Package name → resulting version
pub type VersionMap = BTreeMap<String, String>;

/// One replaced dependency constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rewrite {
  pub package: String,
  pub dependency: String,
  pub from: String,
  pub to: String,
}

/// Point dependency constraints of the publish set at the new versions.
///
/// Constraints on packages outside `versions` are left alone, as are
/// packages outside `set`.
pub fn rewrite(manifests: &mut ManifestStore, set: &PublishSet, versions: &VersionMap) -> Vec<Rewrite> {
  let mut rewrites = Vec::new();

  for name in set.iter() {
    let Some(manifest) = manifests.get_mut(name) else {
      continue;
    };

    for (dependency, constraint) in manifest.dependencies.iter_mut() {
      let Some(new_version) = versions.get(dependency) else {
        continue;
      };
      if *constraint == *new_version {
        continue;
      }

      debug!("{}: {} {} -> {}", name, dependency, constraint, new_version);
      rewrites.push(Rewrite {
        package: name.to_string(),
        dependency: dependency.clone(),
        from: std::mem::replace(constraint, new_version.clone()),
        to: new_version.clone(),
      });
    }
  }

  rewrites
}
