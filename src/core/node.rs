//! Addressable LLM-call units.

use serde::{Deserialize, Serialize};

use super::config::NodeConfiguration;
use super::textblock::{generate_id, NodeId};

/// Canvas coordinate. Carried for the editor, ignored by scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDefinition {
    id: NodeId,
    pub name: String,
    #[serde(default)]
    pub position: Position,
    #[serde(default, alias = "apiConfig")]
    pub config: NodeConfiguration,
}

impl NodeDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
            position: Position::default(),
            config: NodeConfiguration::new(),
        }
    }

    /// Build a node with a caller-chosen id (imports, tests).
    pub fn with_id(id: impl Into<NodeId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::new(name)
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn with_config(mut self, config: NodeConfiguration) -> Self {
        self.config = config;
        self
    }

    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    pub fn moved_to(&self, position: Position) -> Self {
        Self {
            position,
            ..self.clone()
        }
    }

    pub fn map_config<F>(&self, f: F) -> Self
    where
        F: FnOnce(&NodeConfiguration) -> NodeConfiguration,
    {
        Self {
            config: f(&self.config),
            ..self.clone()
        }
    }

    pub fn dependencies(&self) -> Vec<NodeId> {
        self.config.dependencies()
    }
}
