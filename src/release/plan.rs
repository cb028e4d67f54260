//! Release orchestration: targets + manifests + directives → release plan
//!
//! The orchestrator runs the pure stages in a fixed order and performs no
//! I/O. The resulting `ReleasePlan` says, for each package in publish order,
//! which version it ends up with and whether it is installed and published
//! or skipped, plus the manifests the caller should write back.
//!
//! ```text
//! resolve → bump → rewrite → schedule
//! ```

use super::directives::Directives;
use super::resolve::{PublishSet, Targets, resolve};
use super::rewrite::{Rewrite, VersionMap, rewrite};
use super::schedule::schedule;
use super::version::bump;
use crate::core::error::{PublishError, PublishResult};
use crate::manifest::{ManifestStore, PackageManifest};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// Plan identifier (SHA256 of the publish order and version map)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanId(String);

impl PlanId {
  /// Create a plan ID from plan contents
  pub fn from_contents(contents: &[u8]) -> Self {
    let mut hasher = Sha256::new();
    hasher.update(contents);
    let result = hasher.finalize();
    Self(format!("{:x}", result))
  }

  /// Get the short ID (first 12 characters)
  pub fn short(&self) -> &str {
    &self.0[..12.min(self.0.len())]
  }
}

impl fmt::Display for PlanId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.short())
  }
}

/// Whether versions are advanced or reported as they are
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanMode {
  /// Resolve targets, bump versions, rewrite dependencies
  Bump,
  /// Every package at its current version
  List,
}

/// What happens to one package when the plan is executed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PublishAction {
  /// Run install, then publish, in the package directory
  Publish,
  /// Reported only
  Skip { reason: String },
}

/// One entry of the publish order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedPackage {
  pub name: String,
  pub previous_version: String,
  pub version: String,
  pub directory: PathBuf,
  #[serde(flatten)]
  pub action: PublishAction,
}

/// Non-fatal findings made while planning
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanWarning {
  /// A requested target has no local package
  UnknownTarget { name: String },
  /// A package whose version could not be bumped; excluded from the run
  MalformedVersion {
    package: String,
    version: String,
    reason: String,
  },
}

impl fmt::Display for PlanWarning {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PlanWarning::UnknownTarget { name } => write!(f, "target '{}' not found in packages; skipped", name),
      PlanWarning::MalformedVersion {
        package,
        version,
        reason,
      } => write!(f, "'{}' has malformed version '{}' ({}); excluded", package, version, reason),
    }
  }
}

/// Complete, reviewable outcome of planning a release run
#[derive(Debug, Clone, Serialize)]
pub struct ReleasePlan {
  pub id: PlanId,
  pub mode: PlanMode,
  pub directives: Directives,
  /// Packages in publish order
  pub packages: Vec<PlannedPackage>,
  /// Resulting version of every planned package
  pub versions: VersionMap,
  pub rewrites: Vec<Rewrite>,
  pub warnings: Vec<PlanWarning>,
  /// Updated manifests to persist (empty unless the run writes)
  #[serde(skip)]
  pub writes: Vec<PackageManifest>,
}

impl ReleasePlan {
  /// Package names in publish order
  pub fn order(&self) -> Vec<&str> {
    self.packages.iter().map(|p| p.name.as_str()).collect()
  }

  pub fn is_empty(&self) -> bool {
    self.packages.is_empty()
  }

  /// Packages left out because their version could not be bumped
  pub fn excluded(&self) -> Vec<&str> {
    self
      .warnings
      .iter()
      .filter_map(|w| match w {
        PlanWarning::MalformedVersion { package, .. } => Some(package.as_str()),
        PlanWarning::UnknownTarget { .. } => None,
      })
      .collect()
  }

  /// Number of packages that will actually be published
  pub fn publish_count(&self) -> usize {
    self
      .packages
      .iter()
      .filter(|p| p.action == PublishAction::Publish)
      .count()
  }
}

/// Drives resolve → bump → rewrite → schedule under one set of directives.
pub struct ReleaseOrchestrator<'a> {
  directives: &'a Directives,
}

impl<'a> ReleaseOrchestrator<'a> {
  pub fn new(directives: &'a Directives) -> Self {
    Self { directives }
  }

  /// Plan a release run over a private copy of the manifests.
  ///
  /// # Errors
  /// - `NoTargets` when `targets` is empty
  /// - `Cycle` when the publish set cannot be ordered
  pub fn plan(&self, mut manifests: ManifestStore, targets: &Targets) -> PublishResult<ReleasePlan> {
    if targets.is_empty() {
      return Err(PublishError::NoTargets);
    }

    let previous: HashMap<String, String> = manifests
      .iter()
      .map(|m| (m.name.clone(), m.version.clone()))
      .collect();
    let mut warnings = Vec::new();

    let (mode, set, versions, rewrites) = if self.directives.bumps_versions() {
      let (set, versions, rewrites) = self.bump_stage(&mut manifests, targets, &mut warnings)?;
      (PlanMode::Bump, set, versions, rewrites)
    } else {
      let set: PublishSet = manifests.names().collect();
      let versions: VersionMap = manifests
        .iter()
        .map(|m| (m.name.clone(), m.version.clone()))
        .collect();
      (PlanMode::List, set, versions, Vec::new())
    };

    let order = schedule(&set, &manifests)?;
    info!("packages sorted: {}", order.join(", "));

    let action = if self.directives.dry_run {
      PublishAction::Skip {
        reason: "dry run".to_string(),
      }
    } else {
      PublishAction::Publish
    };

    let mut packages = Vec::with_capacity(order.len());
    for name in &order {
      let Some(manifest) = manifests.get(name) else {
        continue;
      };
      packages.push(PlannedPackage {
        name: name.clone(),
        previous_version: previous.get(name).cloned().unwrap_or_default(),
        version: manifest.version.clone(),
        directory: manifest.directory.clone(),
        action: action.clone(),
      });
    }

    let writes = if mode == PlanMode::Bump && self.directives.persists_manifests() {
      order.iter().filter_map(|name| manifests.get(name).cloned()).collect()
    } else {
      Vec::new()
    };

    let id = plan_id(&packages, &versions)?;

    Ok(ReleasePlan {
      id,
      mode,
      directives: self.directives.clone(),
      packages,
      versions,
      rewrites,
      warnings,
      writes,
    })
  }

  /// Resolve the publish set, bump its members and rewrite constraints.
  ///
  /// Unknown targets and packages with malformed versions leave the set
  /// here, each with a warning.
  fn bump_stage(
    &self,
    manifests: &mut ManifestStore,
    targets: &Targets,
    warnings: &mut Vec<PlanWarning>,
  ) -> PublishResult<(PublishSet, VersionMap, Vec<Rewrite>)> {
    let resolution = resolve(manifests, targets);
    let mut set = resolution.set;
    info!("dependencies collected: {} package(s)", set.len());

    for name in resolution.unknown_targets {
      set.remove(&name);
      warnings.push(PlanWarning::UnknownTarget { name });
    }

    let mut versions = VersionMap::new();
    let members: Vec<String> = set.iter().map(String::from).collect();
    for name in members {
      let Some(manifest) = manifests.get_mut(&name) else {
        continue;
      };
      match bump(manifest, self.directives) {
        Ok(version) => {
          versions.insert(name, version);
        }
        Err(PublishError::MalformedVersion {
          package,
          version,
          reason,
        }) => {
          warn!("{}: malformed version '{}' ({}); excluding from release", package, version, reason);
          set.remove(&package);
          warnings.push(PlanWarning::MalformedVersion {
            package,
            version,
            reason,
          });
        }
        Err(e) => return Err(e),
      }
    }

    let rewrites = rewrite(manifests, &set, &versions);
    info!("versions updated: {} dependency constraint(s) rewritten", rewrites.len());

    Ok((set, versions, rewrites))
  }
}

fn plan_id(packages: &[PlannedPackage], versions: &VersionMap) -> PublishResult<PlanId> {
  let order: Vec<&str> = packages.iter().map(|p| p.name.as_str()).collect();
  let contents = serde_json::to_vec(&(order, versions))?;
  Ok(PlanId::from_contents(&contents))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn store() -> ManifestStore {
    [
      PackageManifest::new("app", "2.1.0-beta", "packages/app")
        .with_dependency("ui", "^1.0.0")
        .with_dependency("core", "^1.0.0")
        .with_dependency("react", "^18.2.0"),
      PackageManifest::new("core", "1.0.0", "packages/core"),
      PackageManifest::new("docs", "0.1.0", "packages/docs"),
      PackageManifest::new("ui", "1.0.3", "packages/ui").with_dependency("core", "^1.0.0"),
    ]
    .into_iter()
    .collect()
  }

  fn named(names: &[&str]) -> Targets {
    Targets::Named(names.iter().map(|n| n.to_string()).collect())
  }

  #[test]
  fn test_no_targets() {
    let directives = Directives::default();
    let err = ReleaseOrchestrator::new(&directives)
      .plan(store(), &Targets::Named(vec![]))
      .unwrap_err();
    assert!(matches!(err, PublishError::NoTargets));
  }

  #[test]
  fn test_bump_plan() {
    let directives = Directives::default();
    let plan = ReleaseOrchestrator::new(&directives).plan(store(), &named(&["core"])).unwrap();

    assert_eq!(plan.mode, PlanMode::Bump);
    assert_eq!(plan.order(), vec!["core", "ui", "app"]);
    assert_eq!(plan.versions["core"], "1.0.1");
    assert_eq!(plan.versions["ui"], "1.0.4");
    assert_eq!(plan.versions["app"], "2.1.1-beta");
    assert!(!plan.versions.contains_key("docs"));
    assert_eq!(plan.publish_count(), 3);
    assert_eq!(plan.packages[0].previous_version, "1.0.0");

    let app = plan.writes.iter().find(|m| m.name == "app").unwrap();
    assert_eq!(app.dependencies["core"], "1.0.1");
    assert_eq!(app.dependencies["ui"], "1.0.4");
    assert_eq!(app.dependencies["react"], "^18.2.0");
    assert_eq!(plan.writes.len(), 3);
    assert_eq!(plan.rewrites.len(), 3);
  }

  #[test]
  fn test_dry_run_skips_and_writes_nothing() {
    let directives = Directives {
      dry_run: true,
      ..Default::default()
    };
    let plan = ReleaseOrchestrator::new(&directives).plan(store(), &named(&["ui"])).unwrap();

    assert_eq!(plan.order(), vec!["ui", "app"]);
    assert_eq!(plan.versions["ui"], "1.0.4");
    assert!(plan.writes.is_empty());
    assert_eq!(plan.publish_count(), 0);
    assert!(
      plan
        .packages
        .iter()
        .all(|p| matches!(&p.action, PublishAction::Skip { reason } if reason == "dry run"))
    );
  }

  #[test]
  fn test_list_mode_uses_current_versions_for_everything() {
    let directives = Directives {
      write_mode: false,
      ..Default::default()
    };
    let plan = ReleaseOrchestrator::new(&directives).plan(store(), &named(&["ui"])).unwrap();

    assert_eq!(plan.mode, PlanMode::List);
    assert_eq!(plan.packages.len(), 4);
    assert_eq!(plan.versions["app"], "2.1.0-beta");
    assert_eq!(plan.versions["docs"], "0.1.0");
    assert!(plan.rewrites.is_empty());
    assert!(plan.writes.is_empty());
    let order = plan.order();
    let pos = |n: &str| order.iter().position(|o| *o == n).unwrap();
    assert!(pos("core") < pos("ui"));
    assert!(pos("ui") < pos("app"));
  }

  #[test]
  fn test_unknown_target_is_warned_and_dropped() {
    let directives = Directives::default();
    let plan = ReleaseOrchestrator::new(&directives)
      .plan(store(), &named(&["ghost", "docs"]))
      .unwrap();

    assert_eq!(plan.order(), vec!["docs"]);
    assert_eq!(
      plan.warnings,
      vec![PlanWarning::UnknownTarget {
        name: "ghost".to_string()
      }]
    );
  }

  #[test]
  fn test_malformed_version_is_excluded_but_dependents_stay() {
    let mut store = store();
    store.get_mut("ui").unwrap().version = "1.0".to_string();
    let directives = Directives::default();
    let plan = ReleaseOrchestrator::new(&directives).plan(store, &named(&["core"])).unwrap();

    assert_eq!(plan.order(), vec!["core", "app"]);
    assert!(!plan.versions.contains_key("ui"));
    assert_eq!(plan.excluded(), vec!["ui"]);
    assert!(matches!(&plan.warnings[0], PlanWarning::MalformedVersion { package, .. } if package == "ui"));

    let app = plan.writes.iter().find(|m| m.name == "app").unwrap();
    assert_eq!(app.dependencies["ui"], "^1.0.0");
    assert_eq!(app.dependencies["core"], "1.0.1");
  }

  #[test]
  fn test_cycle_aborts_planning() {
    let mut store = store();
    store.insert(PackageManifest::new("core", "1.0.0", "packages/core").with_dependency("app", "^2.0.0"));
    let directives = Directives::default();
    let err = ReleaseOrchestrator::new(&directives)
      .plan(store, &named(&["core"]))
      .unwrap_err();

    match err {
      PublishError::Cycle { packages } => {
        assert!(packages.contains(&"core".to_string()));
        assert!(packages.contains(&"app".to_string()));
      }
      other => panic!("expected cycle error, got {other}"),
    }
  }

  #[test]
  fn test_plan_id_is_stable() {
    let directives = Directives::default();
    let a = ReleaseOrchestrator::new(&directives).plan(store(), &named(&["core"])).unwrap();
    let b = ReleaseOrchestrator::new(&directives).plan(store(), &named(&["core"])).unwrap();
    assert_eq!(a.id, b.id);
    assert_eq!(a.id.short().len(), 12);
  }

  #[test]
  fn test_plan_serializes_to_json() {
    let directives = Directives {
      dry_run: true,
      ..Default::default()
    };
    let plan = ReleaseOrchestrator::new(&directives).plan(store(), &named(&["core"])).unwrap();
    let json = serde_json::to_value(&plan).unwrap();

    assert_eq!(json["mode"], "bump");
    assert_eq!(json["packages"][0]["name"], "core");
    assert_eq!(json["packages"][0]["action"], "skip");
    assert_eq!(json["packages"][0]["reason"], "dry run");
    assert_eq!(json["versions"]["core"], "1.0.1");
    assert!(json.get("writes").is_none());
  }
}
