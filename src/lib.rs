//! # workflow-canvas - Interactive Workflow Graph Engine
//!
//! **workflow-canvas** renders a directed workflow (steps, workflow inputs and
//! outputs, and the connections between their ports) into a retained,
//! SVG-like scene, and keeps that scene in sync with the workflow model as it
//! mutates. It is headless: the host feeds pointer input in and reads the scene
//! (or its markup) out.
//!
//! ## Core Workflow
//!
//! 1.  **Load a model**: build a [`WorkflowModel`](model::WorkflowModel) in code,
//!     from JSON, or from your own format through the
//!     [`IntoWorkflow`](model::IntoWorkflow) trait. Any type implementing
//!     [`ModelSource`](model::ModelSource) works.
//! 2.  **Create a scene**: a [`Scene`](scene::Scene) sized to the host viewport.
//! 3.  **Build the workflow**: [`Workflow::builder`](graph::Workflow::builder)
//!     attaches plugins, draws the model and subscribes to its events.
//! 4.  **Interact**: mutate the model and the scene is patched incrementally;
//!     zoom, pan and fit through the workflow; feed pointer events through
//!     [`Workflow::dispatch_pointer`](graph::Workflow::dispatch_pointer).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use workflow_canvas::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let model = WorkflowModel::new();
//!     model.add_step(StepModel::new("A").with_output("out").at(0.0, 0.0))?;
//!     model.add_step(StepModel::new("B").with_input("in").at(300.0, 0.0))?;
//!     model.connect("out/A/out", "in/B/in")?;
//!
//!     let scene = Scene::new(Rect::new(0.0, 0.0, 800.0, 600.0));
//!     let workflow = Workflow::builder(scene, model.clone()).build()?;
//!     workflow.fit_to_viewport(false)?;
//!
//!     // Later mutations patch the rendered scene in place.
//!     model.add_step(StepModel::new("C").at(600.0, 0.0))?;
//!
//!     let scene = workflow.scene();
//!     println!("{}", scene.to_markup(scene.root()));
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod events;
pub mod geometry;
pub mod graph;
pub mod model;
pub mod plugins;
pub mod prelude;
pub mod scene;
