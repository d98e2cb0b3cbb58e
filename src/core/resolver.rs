//! Dependency resolution for workflow nodes.
//!
//! Edges are implicit: a node depends on every node its virtual blocks
//! reference. [`resolve`] runs Kahn's algorithm with a FIFO ready queue seeded
//! in node-insertion order, which makes the output a pure function of the
//! node map (including its order).
//!
//! When the sort stalls, every node left unscheduled is reported as part of
//! the cycle, including nodes that are merely downstream of one. Callers treat
//! that set as "all nodes currently blocked".

use petgraph::algo::{astar, is_cyclic_directed};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

use super::textblock::NodeId;
use super::workflow::NodeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyErrorKind {
    Cycle,
    Missing,
}

/// Why a node map could not be scheduled.
///
/// For `Missing`, `node_ids` is exactly `[dependent, missing_target]`.
/// For `Cycle`, it is the unscheduled set in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("{message}")]
pub struct DependencyError {
    #[serde(rename = "type")]
    pub kind: DependencyErrorKind,
    pub node_ids: Vec<NodeId>,
    pub message: String,
}

impl DependencyError {
    fn missing(dependent: &str, dependent_name: &str, target: &str) -> Self {
        Self {
            kind: DependencyErrorKind::Missing,
            node_ids: vec![dependent.to_string(), target.to_string()],
            message: format!(
                "Node \"{}\" depends on missing node \"{}\"",
                dependent_name, target
            ),
        }
    }

    fn cycle(node_ids: Vec<NodeId>) -> Self {
        let message = format!(
            "Circular dependency detected involving nodes: {}",
            node_ids.join(", ")
        );
        Self {
            kind: DependencyErrorKind::Cycle,
            node_ids,
            message,
        }
    }
}

/// A linear schedule consistent with every dependency edge.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionOrder(Vec<NodeId>);

impl ExecutionOrder {
    pub fn as_slice(&self) -> &[NodeId] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NodeId> {
        self.0.iter()
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.0.iter().position(|n| n == id)
    }

    pub fn into_inner(self) -> Vec<NodeId> {
        self.0
    }
}

impl<'a> IntoIterator for &'a ExecutionOrder {
    type Item = &'a NodeId;
    type IntoIter = std::slice::Iter<'a, NodeId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Compute a deterministic execution order for `nodes`.
pub fn resolve(nodes: &NodeMap) -> Result<ExecutionOrder, DependencyError> {
    let count = nodes.len();
    let mut in_degree = vec![0usize; count];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); count];

    for (i, (id, node)) in nodes.iter().enumerate() {
        for dep in node.dependencies() {
            let Some(j) = nodes.position_of(&dep) else {
                return Err(DependencyError::missing(id, &node.name, &dep));
            };
            in_degree[i] += 1;
            dependents[j].push(i);
        }
    }

    let ids: Vec<&NodeId> = nodes.ids().collect();
    let mut queue: VecDeque<usize> = (0..count).filter(|&i| in_degree[i] == 0).collect();
    let mut order: Vec<NodeId> = Vec::with_capacity(count);
    let mut emitted = vec![false; count];

    while let Some(current) = queue.pop_front() {
        order.push(ids[current].clone());
        emitted[current] = true;
        for &dependent in &dependents[current] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                queue.push_back(dependent);
            }
        }
    }

    if order.len() != count {
        let leftover = (0..count)
            .filter(|&i| !emitted[i])
            .map(|i| ids[i].clone())
            .collect();
        return Err(DependencyError::cycle(leftover));
    }

    Ok(ExecutionOrder(order))
}

/// Read-only dependency view handed to the executor.
///
/// Backed by a `DiGraph` whose edges point from a dependency to its
/// dependents. Unlike [`resolve`], lookups tolerate references to absent
/// nodes: such references show up in [`dependencies`](Self::dependencies)
/// but never as edges.
#[derive(Debug, Clone)]
pub struct DependencyGraph<'a> {
    nodes: &'a NodeMap,
    graph: DiGraph<NodeId, ()>,
    /// Mapping from NodeId to petgraph's NodeIndex.
    node_indices: HashMap<NodeId, NodeIndex>,
    dependencies: Vec<Vec<NodeId>>,
}

impl<'a> DependencyGraph<'a> {
    pub fn new(nodes: &'a NodeMap) -> Self {
        let mut graph = DiGraph::with_capacity(nodes.len(), 0);
        let mut node_indices = HashMap::with_capacity(nodes.len());
        for id in nodes.ids() {
            let index = graph.add_node(id.clone());
            node_indices.insert(id.clone(), index);
        }

        let dependencies: Vec<Vec<NodeId>> = nodes.values().map(|n| n.dependencies()).collect();
        for (id, deps) in nodes.ids().zip(&dependencies) {
            let to = node_indices[id];
            for dep in deps {
                if let Some(&from) = node_indices.get(dep) {
                    graph.add_edge(from, to, ());
                }
            }
        }

        Self {
            nodes,
            graph,
            node_indices,
            dependencies,
        }
    }

    pub fn dependencies(&self, id: &str) -> &[NodeId] {
        self.node_indices
            .get(id)
            .map(|i| self.dependencies[i.index()].as_slice())
            .unwrap_or(&[])
    }

    /// Direct dependents of `id`, in node-insertion order.
    pub fn dependents(&self, id: &str) -> Vec<NodeId> {
        let Some(&index) = self.node_indices.get(id) else {
            return Vec::new();
        };
        let mut dependents: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(index, Direction::Outgoing)
            .collect();
        dependents.sort_unstable();
        dependents
            .into_iter()
            .map(|i| self.graph[i].clone())
            .collect()
    }

    /// Nodes without dependencies, in insertion order.
    pub fn entry_points(&self) -> Vec<&NodeId> {
        self.nodes
            .ids()
            .zip(&self.dependencies)
            .filter(|(_, deps)| deps.is_empty())
            .map(|(id, _)| id)
            .collect()
    }

    /// True when every dependency of `id` has completed.
    pub fn can_execute(&self, id: &str, completed: &HashSet<NodeId>) -> bool {
        self.node_indices.contains_key(id)
            && self.dependencies(id).iter().all(|d| completed.contains(d))
    }

    /// Shortest chain of dependency edges leading from `from` to `to`
    /// (each step goes from a node to one of its dependents).
    pub fn find_path(&self, from: &str, to: &str) -> Option<Vec<NodeId>> {
        let start = *self.node_indices.get(from)?;
        let goal = *self.node_indices.get(to)?;
        let (_, path) = astar(&self.graph, start, |n| n == goal, |_| 1usize, |_| 0)?;
        Some(path.into_iter().map(|i| self.graph[i].clone()).collect())
    }

    /// Whether any cycle exists among present nodes; dangling references are ignored.
    pub fn has_cycle(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    pub fn execution_order(&self) -> Result<ExecutionOrder, DependencyError> {
        resolve(self.nodes)
    }
}
