//! Rendering of workflow models into a [`Scene`](crate::scene::Scene).
//!
//! [`GraphNode`] and [`Edge`] turn model entities into markup fragments,
//! [`StepNode`] patches a rendered step in place, and [`Workflow`] ties them
//! to a model's mutation events, the pan and zoom matrix and the plugins.

pub mod connectable;
pub mod edge;
pub mod graph_node;
pub mod step_node;
pub mod workflow;

pub use connectable::*;
pub use edge::*;
pub use graph_node::*;
pub use step_node::*;
pub use workflow::{
    GraphConfig, IdSource, SequenceIdSource, WeakWorkflow, Workflow, WorkflowBuilder,
};

#[cfg(feature = "random-ids")]
pub use workflow::RandomIdSource;
