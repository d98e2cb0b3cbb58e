//! Workflow metadata: prompts, nodes, workflows and their dependency order.
//!
//! Everything here is plain data with value-returning edits. Runtime state
//! (resolved prompt text, node outputs) belongs to the executor, which consumes
//! [`ExecutionOrder`] and [`DependencyGraph`].
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`textblock`] | Literal and virtual prompt blocks |
//! | [`config`] | Connection, sampling parameters and prompts of a node |
//! | [`node`] | Node definitions |
//! | [`workflow`] | Ordered node maps and workflow documents |
//! | [`resolver`] | Execution order and dependency queries |
//! | [`validation`] | Advisory workflow checks |

pub mod config;
pub mod node;
pub mod resolver;
pub mod textblock;
pub mod validation;
pub mod workflow;

pub use config::{ApiConnection, ApiParameters, ConnectionPatch, NodeConfiguration, ParametersPatch};
pub use node::{NodeDefinition, Position};
pub use resolver::{resolve, DependencyError, DependencyErrorKind, DependencyGraph, ExecutionOrder};
pub use textblock::{generate_id, AnyTextBlock, NodeId, TextBlock, TextBlockId, TextBlockList, VirtualTextBlockDef};
pub use validation::{validate_workflow, ValidationReport};
pub use workflow::{NodeMap, WorkflowDefinition};
