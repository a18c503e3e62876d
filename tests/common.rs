//! Common test utilities for building workflow models, scenes and plugins.
#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use workflow_canvas::prelude::*;

pub const VIEWPORT_WIDTH: f64 = 800.0;
pub const VIEWPORT_HEIGHT: f64 = 600.0;

/// A scene sized like a typical embedding canvas.
pub fn viewport_scene() -> Scene {
    Scene::new(Rect::new(0.0, 0.0, VIEWPORT_WIDTH, VIEWPORT_HEIGHT))
}

/// Two steps and one connection between them.
///
/// Logic: `A.out` at (0, 0) -> `B.in` at (300, 0)
pub fn ab_model() -> WorkflowModel {
    let model = WorkflowModel::new();
    model
        .add_step(StepModel::new("A").with_output("out").at(0.0, 0.0))
        .expect("step A");
    model
        .add_step(StepModel::new("B").with_input("in").at(300.0, 0.0))
        .expect("step B");
    model.connect("out/A/out", "in/B/in").expect("A -> B");
    model
}

/// A workflow input feeding a step which feeds a workflow output.
pub fn pipeline_model() -> WorkflowModel {
    let model = WorkflowModel::new();
    model
        .add_input(
            InputModel::new("reads")
                .with_type(ParameterType::new("File"))
                .at(0.0, 0.0),
        )
        .expect("input");
    model
        .add_step(
            StepModel::new("align")
                .with_label("Align reads")
                .with_input("reads")
                .with_input("reference")
                .with_output("bam")
                .at(250.0, 0.0),
        )
        .expect("step");
    model
        .add_output(OutputModel::new("aligned").at(500.0, 0.0))
        .expect("output");
    model.connect("out/reads/reads", "in/align/reads").expect("reads -> align");
    model.connect("out/align/bam", "in/aligned/aligned").expect("align -> aligned");
    model
}

/// Two steps placed far apart, wider than any viewport.
pub fn wide_model(distance: f64) -> WorkflowModel {
    let model = WorkflowModel::new();
    model
        .add_step(StepModel::new("left").at(0.0, 0.0))
        .expect("left");
    model
        .add_step(StepModel::new("right").at(distance, 0.0))
        .expect("right");
    model
}

pub fn draw(model: &WorkflowModel) -> Workflow {
    Workflow::new(viewport_scene(), model.clone()).expect("workflow should draw")
}

pub fn count(workflow: &Workflow, selector: &str) -> usize {
    let scene = workflow.scene();
    scene
        .query_selector_all(scene.root(), selector)
        .expect("valid selector")
        .len()
}

pub fn find(workflow: &Workflow, selector: &str) -> Option<ElementId> {
    let scene = workflow.scene();
    scene
        .query_selector(scene.root(), selector)
        .expect("valid selector")
}

/// The numbers of an `M x y C ...` path, in order.
pub fn path_numbers(d: &str) -> Vec<f64> {
    d.split_whitespace()
        .filter_map(|token| token.parse::<f64>().ok())
        .collect()
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {} to be close to {}",
        actual,
        expected
    );
}

/// Records every hook it receives, in order, into a shared log.
pub struct RecordingPlugin {
    pub log: Rc<RefCell<Vec<String>>>,
    pub after_render: Option<PluginHooks>,
    pub workflow: Option<WeakWorkflow>,
}

impl RecordingPlugin {
    pub fn new(log: Rc<RefCell<Vec<String>>>) -> Self {
        Self {
            log,
            after_render: None,
            workflow: None,
        }
    }

    fn record(&self, entry: &str) {
        self.log.borrow_mut().push(entry.to_string());
    }
}

impl Plugin for RecordingPlugin {
    fn register_workflow(&mut self, workflow: WeakWorkflow) {
        self.workflow = Some(workflow);
        self.record("register_workflow");
    }

    fn register_on_before_change(&mut self, _hooks: PluginHooks) {
        self.record("register_on_before_change");
    }

    fn register_on_after_change(&mut self, _hooks: PluginHooks) {
        self.record("register_on_after_change");
    }

    fn register_on_after_render(&mut self, hooks: PluginHooks) {
        self.after_render = Some(hooks);
        self.record("register_on_after_render");
    }

    fn after_model_change(&mut self) {
        self.record("after_model_change");
    }

    fn after_render(&mut self) {
        self.record("after_render");
    }

    fn on_editable_state_change(&mut self, enabled: bool) {
        self.record(&format!("on_editable_state_change({})", enabled));
    }

    fn destroy(&mut self) {
        self.record("destroy");
    }
}

/// A plugin that does nothing, used to check plugin lookup by type.
pub struct QuietPlugin;

impl Plugin for QuietPlugin {}
