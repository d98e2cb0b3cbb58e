//! Workflow documents: an ordered node map plus identity.
//!
//! Node insertion order is significant. It is the tie-break the resolver uses
//! when several nodes are ready at once, so two equal workflows built in the
//! same order always schedule identically.

use serde::de::Deserializer;
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::node::NodeDefinition;
use super::resolver::{self, DependencyError, ExecutionOrder};
use super::textblock::{generate_id, NodeId};
use crate::{Error, ErrorContext, Result};

/// Insertion-ordered map from node id to node.
///
/// Re-inserting an existing id replaces the value and keeps its position.
/// On the wire it is an array of `[id, node]` pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeMap {
    entries: Vec<(NodeId, NodeDefinition)>,
    index: HashMap<NodeId, usize>,
}

impl NodeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&NodeDefinition> {
        self.index.get(id).map(|&i| &self.entries[i].1)
    }

    /// Position of `id` in insertion order.
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn ids(&self) -> impl Iterator<Item = &NodeId> {
        self.entries.iter().map(|(id, _)| id)
    }

    pub fn values(&self) -> impl Iterator<Item = &NodeDefinition> {
        self.entries.iter().map(|(_, node)| node)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &NodeDefinition)> {
        self.entries.iter().map(|(id, node)| (id, node))
    }

    pub fn inserted(&self, node: NodeDefinition) -> Self {
        let mut next = self.clone();
        next.insert_in_place(node.id().to_string(), node);
        next
    }

    pub fn removed(&self, id: &str) -> Self {
        if !self.contains(id) {
            return self.clone();
        }
        self.entries
            .iter()
            .filter(|(key, _)| key != id)
            .cloned()
            .collect()
    }

    fn insert_in_place(&mut self, id: NodeId, node: NodeDefinition) {
        match self.index.get(&id) {
            Some(&i) => self.entries[i].1 = node,
            None => {
                self.index.insert(id.clone(), self.entries.len());
                self.entries.push((id, node));
            }
        }
    }
}

impl FromIterator<(NodeId, NodeDefinition)> for NodeMap {
    fn from_iter<I: IntoIterator<Item = (NodeId, NodeDefinition)>>(iter: I) -> Self {
        let mut map = NodeMap::new();
        for (id, node) in iter {
            map.insert_in_place(id, node);
        }
        map
    }
}

impl FromIterator<NodeDefinition> for NodeMap {
    fn from_iter<I: IntoIterator<Item = NodeDefinition>>(iter: I) -> Self {
        iter.into_iter()
            .map(|node| (node.id().to_string(), node))
            .collect()
    }
}

impl Serialize for NodeMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.entries.len()))?;
        for entry in &self.entries {
            seq.serialize_element(entry)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for NodeMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let entries = Vec::<(NodeId, NodeDefinition)>::deserialize(deserializer)?;
        Ok(entries.into_iter().collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    id: String,
    pub name: String,
    pub nodes: NodeMap,
}

impl WorkflowDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
            nodes: NodeMap::new(),
        }
    }

    pub fn with_nodes(name: impl Into<String>, nodes: Vec<NodeDefinition>) -> Self {
        Self {
            nodes: nodes.into_iter().collect(),
            ..Self::new(name)
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    pub fn add_node(&self, node: NodeDefinition) -> Self {
        Self {
            nodes: self.nodes.inserted(node),
            ..self.clone()
        }
    }

    pub fn remove_node(&self, id: &str) -> Self {
        Self {
            nodes: self.nodes.removed(id),
            ..self.clone()
        }
    }

    /// Replace a node with `f(node)`; an unknown id yields an unchanged copy.
    pub fn update_node<F>(&self, id: &str, f: F) -> Self
    where
        F: FnOnce(&NodeDefinition) -> NodeDefinition,
    {
        let Some(node) = self.nodes.get(id) else {
            return self.clone();
        };
        let mut next = self.clone();
        next.nodes.insert_in_place(id.to_string(), f(node));
        next
    }

    pub fn node(&self, id: &str) -> Option<&NodeDefinition> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> Vec<&NodeDefinition> {
        self.nodes.values().collect()
    }

    pub fn resolve(&self) -> std::result::Result<ExecutionOrder, DependencyError> {
        resolver::resolve(&self.nodes)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a stored document. Node entries whose key disagrees with the
    /// node's own id are rejected.
    pub fn from_json(data: &str) -> Result<Self> {
        let workflow: WorkflowDefinition = serde_json::from_str(data)?;
        if let Some((key, node)) = workflow.nodes.iter().find(|(key, node)| key.as_str() != node.id()) {
            return Err(Error::validation_with_context(
                format!("node entry key \"{}\" does not match node id \"{}\"", key, node.id()),
                ErrorContext::new()
                    .with_field_path(format!("workflow.nodes[{}]", key))
                    .with_source("workflow_loader"),
            ));
        }
        Ok(workflow)
    }
}
