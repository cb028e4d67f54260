//! Publish set resolution
//!
//! Starting from the requested targets, every package that depends on a
//! package being published must be published too, transitively. Targets that
//! no local manifest declares stay in the set but propagate nothing.

use crate::manifest::ManifestStore;
use log::{debug, warn};
use serde::Serialize;
use std::collections::{HashSet, VecDeque};

/// Sentinel target selecting every known package
pub const ALL_TARGETS: &str = "all";

/// What the caller asked to publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Targets {
  /// Every package in the store
  All,
  /// Named packages, in the order given
  Named(Vec<String>),
}

impl Targets {
  /// Interpret positional arguments: a lone `all` selects everything.
  pub fn from_args(args: Vec<String>) -> Self {
    if args.len() == 1 && args[0] == ALL_TARGETS {
      Targets::All
    } else {
      Targets::Named(args)
    }
  }

  pub fn is_empty(&self) -> bool {
    matches!(self, Targets::Named(names) if names.is_empty())
  }
}

/// Insertion-ordered set of package names selected for this run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PublishSet {
  members: Vec<String>,
  #[serde(skip)]
  lookup: HashSet<String>,
}

impl PublishSet {
  pub fn new() -> Self {
    Self::default()
  }

  /// Add a name; returns false if it was already present.
  pub fn insert(&mut self, name: impl Into<String>) -> bool {
    let name = name.into();
    if self.lookup.contains(&name) {
      return false;
    }
    self.lookup.insert(name.clone());
    self.members.push(name);
    true
  }

  pub fn contains(&self, name: &str) -> bool {
    self.lookup.contains(name)
  }

  pub fn iter(&self) -> impl Iterator<Item = &str> {
    self.members.iter().map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.members.len()
  }

  /// Drop a name, keeping the order of the rest.
  pub fn remove(&mut self, name: &str) -> bool {
    if !self.lookup.remove(name) {
      return false;
    }
    self.members.retain(|m| m != name);
    true
  }
}

impl<S: Into<String>> FromIterator<S> for PublishSet {
  fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
    let mut set = PublishSet::new();
    for name in iter {
      set.insert(name);
    }
    set
  }
}

/// Result of resolving targets against the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
  pub set: PublishSet,
  /// Requested targets with no manifest in the store
  pub unknown_targets: Vec<String>,
}

/// Compute the publish set for `targets`.
///
/// Algorithm:
/// 1. `all` → every package, no graph walk
/// 2. otherwise seed the set with the targets and the queue with the ones
///    that have a local manifest
/// 3. pop a name, add every not-yet-selected package that depends on it to
///    both the set and the queue
///
/// Each package enters the queue at most once, so this terminates in
/// O(packages²) dependency lookups.
pub fn resolve(manifests: &ManifestStore, targets: &Targets) -> Resolution {
  let names = match targets {
    Targets::All => {
      return Resolution {
        set: manifests.names().collect(),
        unknown_targets: Vec::new(),
      };
    }
    Targets::Named(names) => names,
  };

  let mut set = PublishSet::new();
  let mut queue = VecDeque::new();
  for name in names {
    if set.insert(name.as_str()) && manifests.contains(name) {
      queue.push_back(name.clone());
    }
  }

  let unknown_targets: Vec<String> = set
    .iter()
    .filter(|n| !manifests.contains(n))
    .map(|n| n.to_string())
    .collect();
  for name in &unknown_targets {
    warn!("target '{}' has no local package; it will not pull in dependents", name);
  }

  while let Some(current) = queue.pop_front() {
    for manifest in manifests.iter() {
      if set.contains(&manifest.name) || !manifest.depends_on(&current) {
        continue;
      }
      debug!("{} depends on {}; adding to publish set", manifest.name, current);
      set.insert(manifest.name.as_str());
      queue.push_back(manifest.name.clone());
    }
  }

  Resolution { set, unknown_targets }
}
