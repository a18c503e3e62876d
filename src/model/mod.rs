//! The workflow model collaborator.
//!
//! The engine only reads a model through [`ModelSource`]. [`WorkflowModel`]
//! is the in-memory implementation used by the tools and tests.

pub mod definition;
pub mod document;
pub mod event;
pub mod source;
pub mod workflow_model;

pub use definition::*;
pub use document::*;
pub use event::*;
pub use source::*;
pub use workflow_model::*;
