//! Prompt composition primitives.
//!
//! A prompt is an ordered [`TextBlockList`] of literal [`TextBlock`]s and
//! [`VirtualTextBlockDef`]s. A virtual block stands for the final output of
//! another node; it carries no resolved value, the executor fills it in.
//!
//! Every edit returns a new list and leaves the receiver untouched, so a
//! scheduler and an editor can hold the same list without coordination.

use serde::{Deserialize, Serialize};

/// Identifier of a block inside a [`TextBlockList`].
pub type TextBlockId = String;

/// Identifier of a node in a workflow.
pub type NodeId = String;

/// Generate a fresh opaque identifier.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Literal text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBlock {
    pub id: TextBlockId,
    pub content: String,
}

impl TextBlock {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            content: content.into(),
        }
    }

    /// Same block id, different content.
    pub fn with_content(&self, content: impl Into<String>) -> Self {
        Self {
            id: self.id.clone(),
            content: content.into(),
        }
    }
}

/// Reference to the output of `source_node_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualTextBlockDef {
    pub id: TextBlockId,
    pub source_node_id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl VirtualTextBlockDef {
    pub fn new(source_node_id: impl Into<NodeId>) -> Self {
        Self {
            id: generate_id(),
            source_node_id: source_node_id.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// Either kind of block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AnyTextBlock {
    Text(TextBlock),
    Virtual(VirtualTextBlockDef),
}

impl AnyTextBlock {
    pub fn text(content: impl Into<String>) -> Self {
        AnyTextBlock::Text(TextBlock::new(content))
    }

    pub fn virtual_ref(source_node_id: impl Into<NodeId>) -> Self {
        AnyTextBlock::Virtual(VirtualTextBlockDef::new(source_node_id))
    }

    pub fn id(&self) -> &str {
        match self {
            AnyTextBlock::Text(b) => &b.id,
            AnyTextBlock::Virtual(b) => &b.id,
        }
    }

    /// The referenced node, if this is a virtual block.
    pub fn source_node_id(&self) -> Option<&str> {
        match self {
            AnyTextBlock::Text(_) => None,
            AnyTextBlock::Virtual(b) => Some(&b.source_node_id),
        }
    }
}

impl From<TextBlock> for AnyTextBlock {
    fn from(block: TextBlock) -> Self {
        AnyTextBlock::Text(block)
    }
}

impl From<VirtualTextBlockDef> for AnyTextBlock {
    fn from(block: VirtualTextBlockDef) -> Self {
        AnyTextBlock::Virtual(block)
    }
}

/// Ordered sequence of blocks; order is the concatenation order of the prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextBlockList {
    pub id: String,
    pub blocks: Vec<AnyTextBlock>,
}

impl Default for TextBlockList {
    fn default() -> Self {
        Self::new()
    }
}

impl TextBlockList {
    pub fn new() -> Self {
        Self::with_blocks(Vec::new())
    }

    pub fn with_blocks(blocks: Vec<AnyTextBlock>) -> Self {
        Self {
            id: generate_id(),
            blocks,
        }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn append(&self, block: impl Into<AnyTextBlock>) -> Self {
        let mut blocks = self.blocks.clone();
        blocks.push(block.into());
        self.replaced(blocks)
    }

    /// Insert at `index`; an index past the end appends.
    pub fn insert(&self, index: usize, block: impl Into<AnyTextBlock>) -> Self {
        let mut blocks = self.blocks.clone();
        let index = index.min(blocks.len());
        blocks.insert(index, block.into());
        self.replaced(blocks)
    }

    pub fn remove(&self, block_id: &str) -> Self {
        let blocks = self
            .blocks
            .iter()
            .filter(|b| b.id() != block_id)
            .cloned()
            .collect();
        self.replaced(blocks)
    }

    pub fn update<F>(&self, block_id: &str, f: F) -> Self
    where
        F: Fn(&AnyTextBlock) -> AnyTextBlock,
    {
        let blocks = self
            .blocks
            .iter()
            .map(|b| if b.id() == block_id { f(b) } else { b.clone() })
            .collect();
        self.replaced(blocks)
    }

    pub fn find(&self, block_id: &str) -> Option<&AnyTextBlock> {
        self.blocks.iter().find(|b| b.id() == block_id)
    }

    /// Distinct source node ids of the virtual blocks, in first-seen order.
    pub fn dependencies(&self) -> Vec<NodeId> {
        let mut deps: Vec<NodeId> = Vec::new();
        for id in self.blocks.iter().filter_map(AnyTextBlock::source_node_id) {
            if !deps.iter().any(|d| d == id) {
                deps.push(id.to_string());
            }
        }
        deps
    }

    /// True when every block is literal text with only whitespace.
    pub fn is_blank(&self) -> bool {
        self.blocks.iter().all(|b| match b {
            AnyTextBlock::Text(t) => t.content.trim().is_empty(),
            AnyTextBlock::Virtual(_) => false,
        })
    }

    fn replaced(&self, blocks: Vec<AnyTextBlock>) -> Self {
        Self {
            id: self.id.clone(),
            blocks,
        }
    }
}
