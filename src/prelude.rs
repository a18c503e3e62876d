//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits of the
//! workflow-canvas crate, so a host can get going with a single `use`.
//!
//! # Example
//!
//! ```rust,no_run
//! use workflow_canvas::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let json = std::fs::read_to_string("path/to/workflow.json")?;
//! let model = WorkflowModel::from_json(&json)?;
//!
//! let workflow = Workflow::new(Scene::new(Rect::new(0.0, 0.0, 1024.0, 768.0)), model)?;
//! workflow.set_scale(0.5)?;
//! # Ok(())
//! # }
//! ```

// Orchestration
pub use crate::graph::{GraphConfig, IdSource, SequenceIdSource, WeakWorkflow, Workflow};
pub use crate::plugins::{Plugin, PluginHooks};

// Rendering primitives
pub use crate::graph::{Connectable, ConnectionId, Direction, Edge, GraphNode, StepNode};
pub use crate::graph::edge::make_connection_path;

// Model
pub use crate::model::{
    InputModel, ModelEvent, ModelEventKind, ModelSource, OutputModel, ParameterType, StepModel,
    WorkflowDocument, WorkflowModel,
};

// Scene and geometry
pub use crate::geometry::{Matrix, Point, Rect};
pub use crate::scene::{ElementId, Scene, SceneSnapshot, Selector, TemplateParser};

// Events
pub use crate::events::{GraphEvent, PointerEvent, PointerKind};

// Error types
pub use crate::error::{GraphError, ModelError, RenderDefect};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
