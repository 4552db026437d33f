//! Saved workflow (connection graph) documents.

use serde::{Deserialize, Serialize};

/// A saved workflow: component instances and the edges between their ports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub nodes: Vec<WorkflowNode>,
    #[serde(default)]
    pub edges: Vec<WorkflowEdge>,
}

impl Workflow {
    pub fn node(&self, id: &str) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// One component instance in a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowNode {
    pub id: String,
    /// Component type name, e.g. `catNode` or `CatNode`.
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowEdge {
    #[serde(default)]
    pub id: Option<String>,
    pub source: String,
    #[serde(rename = "sourceHandle", default)]
    pub source_handle: Option<String>,
    pub target: String,
    #[serde(rename = "targetHandle", default)]
    pub target_handle: Option<String>,
    #[serde(default)]
    pub data: Option<EdgeData>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeData {
    #[serde(default)]
    pub field: Option<String>,
}

impl WorkflowEdge {
    /// The data field carried by this edge: explicit `data.field`, then the
    /// source handle, then the target handle.
    pub fn field(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|d| d.field.as_deref())
            .or(self.source_handle.as_deref())
            .or(self.target_handle.as_deref())
    }

    /// Human-readable edge label.
    pub fn label(&self) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => format!(
                "{}:{} -> {}:{}",
                self.source,
                self.source_handle.as_deref().unwrap_or("*"),
                self.target,
                self.target_handle.as_deref().unwrap_or("*")
            ),
        }
    }
}
