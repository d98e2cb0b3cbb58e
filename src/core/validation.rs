//! Advisory checks over a whole workflow.

use serde::Serialize;

use super::resolver::DependencyGraph;
use super::workflow::WorkflowDefinition;

/// Problems found in a workflow. Nothing here blocks resolution; errors are
/// the conditions the resolver would reject.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

pub fn validate_workflow(workflow: &WorkflowDefinition) -> ValidationReport {
    let mut report = ValidationReport::default();

    if workflow.nodes.is_empty() {
        report.warnings.push("No nodes in workflow".to_string());
        return report;
    }

    for (id, node) in workflow.nodes.iter() {
        for dep in node.dependencies() {
            if dep == *id {
                report
                    .errors
                    .push(format!("Node \"{}\" references its own output", node.name));
            } else if !workflow.nodes.contains(&dep) {
                report.errors.push(format!(
                    "Node \"{}\" references non-existent node {}",
                    node.name, dep
                ));
            }
        }
    }

    if DependencyGraph::new(&workflow.nodes).has_cycle() && report.errors.is_empty() {
        report
            .errors
            .push("Cycle detected in workflow - cannot determine execution order".to_string());
    }

    let blank = workflow
        .nodes
        .values()
        .filter(|n| n.config.system_prompt.is_blank() && n.config.user_prompt.is_blank())
        .count();
    if blank > 0 {
        report
            .warnings
            .push(format!("{} nodes have empty prompts", blank));
    }

    report
}
