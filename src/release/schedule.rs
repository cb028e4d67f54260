//! Publish ordering
//!
//! Builds a directed graph over the publish set where an edge points from a
//! dependency to its dependent, then runs Kahn's algorithm so every package
//! comes after its in-set ("shallow") dependencies. If the ready queue runs
//! dry before every package is emitted, the leftovers contain a cycle; the
//! packages on it are named via Tarjan's SCC algorithm.

use super::resolve::PublishSet;
use crate::core::error::{PublishError, PublishResult};
use crate::manifest::ManifestStore;
use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, VecDeque};

/// Dependency graph restricted to the publish set
pub struct PublishGraph {
  /// Nodes: package names, in publish-set order
  /// Edges: dependency → dependent
  graph: DiGraph<String, ()>,
}

impl PublishGraph {
  /// Build the graph of shallow dependencies for `set`.
  ///
  /// Only dependencies that are themselves in the set produce edges. Set
  /// members without a manifest become isolated nodes.
  pub fn build(set: &PublishSet, manifests: &ManifestStore) -> Self {
    let mut graph = DiGraph::new();
    let mut node_map = HashMap::new();

    for name in set.iter() {
      let idx = graph.add_node(name.to_string());
      node_map.insert(name.to_string(), idx);
    }

    for name in set.iter() {
      let Some(manifest) = manifests.get(name) else {
        continue;
      };
      let dependent_idx = node_map[name];
      for dependency in manifest.dependencies.keys() {
        if let Some(&dependency_idx) = node_map.get(dependency) {
          graph.add_edge(dependency_idx, dependent_idx, ());
        }
      }
    }

    Self { graph }
  }

  /// Order the set so dependencies are published before dependents.
  ///
  /// Ties are broken by publish-set order, so the same input always yields
  /// the same order.
  ///
  /// # Errors
  /// Returns `PublishError::Cycle` naming every package on a cycle.
  pub fn publish_order(&self) -> PublishResult<Vec<String>> {
    let mut in_degree: Vec<usize> = self
      .graph
      .node_indices()
      .map(|idx| self.graph.neighbors_directed(idx, Direction::Incoming).count())
      .collect();

    let mut ready: VecDeque<NodeIndex> = self
      .graph
      .node_indices()
      .filter(|idx| in_degree[idx.index()] == 0)
      .collect();
    let mut order = Vec::with_capacity(self.graph.node_count());

    while let Some(idx) = ready.pop_front() {
      order.push(self.graph[idx].clone());

      let mut dependents: Vec<NodeIndex> = self.graph.neighbors_directed(idx, Direction::Outgoing).collect();
      dependents.sort();
      for dependent in dependents {
        in_degree[dependent.index()] -= 1;
        if in_degree[dependent.index()] == 0 {
          ready.push_back(dependent);
        }
      }
    }

    if order.len() < self.graph.node_count() {
      let packages: Vec<String> = self.find_cycles().into_iter().flatten().collect();
      return Err(PublishError::Cycle { packages });
    }

    Ok(order)
  }

  /// Strongly connected components that form cycles (size > 1, or a
  /// package depending on itself), each in set order.
  pub fn find_cycles(&self) -> Vec<Vec<String>> {
    let mut cycles: Vec<Vec<NodeIndex>> = tarjan_scc(&self.graph)
      .into_iter()
      .filter(|component| component.len() > 1 || self.graph.contains_edge(component[0], component[0]))
      .map(|mut component| {
        component.sort();
        component
      })
      .collect();
    cycles.sort();

    cycles
      .into_iter()
      .map(|component| component.into_iter().map(|idx| self.graph[idx].clone()).collect())
      .collect()
  }

}

/// Order `set` for publishing; see [`PublishGraph::publish_order`].
pub fn schedule(set: &PublishSet, manifests: &ManifestStore) -> PublishResult<Vec<String>> {
  PublishGraph::build(set, manifests).publish_order()
}
