use super::definition::{InputModel, OutputModel, StepModel};
use crate::error::ModelError;
use serde::{Deserialize, Serialize};

/// A connection as stored in a document: just the two connection ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionDefinition {
    pub source: String,
    pub destination: String,
}

/// The serialized form of a workflow the in-memory model loads from.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkflowDocument {
    #[serde(default)]
    pub steps: Vec<StepModel>,
    #[serde(default)]
    pub inputs: Vec<InputModel>,
    #[serde(default)]
    pub outputs: Vec<OutputModel>,
    #[serde(default)]
    pub connections: Vec<ConnectionDefinition>,
}

impl WorkflowDocument {
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        serde_json::from_str(json).map_err(|e| ModelError::JsonParseError(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, ModelError> {
        serde_json::to_string_pretty(self).map_err(|e| ModelError::JsonParseError(e.to_string()))
    }
}

/// Conversion from a custom workflow format into a [`WorkflowDocument`].
///
/// Implement this on your own document types to load them into a
/// [`WorkflowModel`](super::WorkflowModel) without writing JSON first.
///
/// ```rust,no_run
/// use workflow_canvas::error::ModelError;
/// use workflow_canvas::model::{IntoWorkflow, StepModel, WorkflowDocument};
///
/// struct Pipeline {
///     stages: Vec<String>,
/// }
///
/// impl IntoWorkflow for Pipeline {
///     fn into_workflow(self) -> Result<WorkflowDocument, ModelError> {
///         let steps = self
///             .stages
///             .iter()
///             .enumerate()
///             .map(|(i, name)| StepModel::new(name).at(i as f64 * 200.0, 0.0))
///             .collect();
///         Ok(WorkflowDocument {
///             steps,
///             ..Default::default()
///         })
///     }
/// }
/// ```
pub trait IntoWorkflow {
    fn into_workflow(self) -> Result<WorkflowDocument, ModelError>;
}

impl IntoWorkflow for WorkflowDocument {
    fn into_workflow(self) -> Result<WorkflowDocument, ModelError> {
        Ok(self)
    }
}
