//! End-to-end tests: drawing workflows, keeping them in sync with the model,
//! pan and zoom, gestures, plugins and teardown.
mod common;
use common::*;
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use workflow_canvas::graph::{NODE_RADIUS, PORT_RADIUS};
use workflow_canvas::model::{ConnectionModel, Disposer, Endpoint, EndpointKind, ModelListener};
use workflow_canvas::prelude::*;

fn snapshot(workflow: &Workflow) -> SceneSnapshot {
    let scene = workflow.scene();
    scene.snapshot(scene.root()).expect("root exists")
}

fn edge_path(workflow: &Workflow) -> String {
    let scene = workflow.scene();
    let path = scene
        .query_selector(scene.root(), ".edge .sub-edge.outer")
        .expect("valid selector")
        .expect("an edge is drawn");
    scene.attribute(path, "d").expect("path data").to_string()
}

// --- Drawing ---

#[test]
fn test_ab_scenario_draws_two_nodes_and_one_edge() {
    let workflow = draw(&ab_model());

    assert_eq!(count(&workflow, ".node.step"), 2);
    assert_eq!(count(&workflow, ".edge"), 1);

    let scene = workflow.scene();
    let edge = scene
        .query_selector(scene.root(), ".edge")
        .expect("valid")
        .expect("edge");
    assert_eq!(scene.attribute(edge, "data-source-connection"), Some("out/A/out"));
    assert_eq!(scene.attribute(edge, "data-destination-connection"), Some("in/B/in"));
    assert_eq!(scene.attribute(edge, "data-source-node"), Some("A"));
    assert_eq!(scene.attribute(edge, "data-destination-port"), Some("in"));

    // Edges paint underneath the nodes.
    let group = workflow.workflow_group();
    assert_eq!(scene.children(group).first(), Some(&edge));
}

#[test]
fn test_edge_path_runs_between_port_positions() {
    let workflow = draw(&ab_model());
    let numbers = path_numbers(&edge_path(&workflow));
    assert_eq!(numbers.len(), 8);

    // A single output port sits on the right rim, a single input on the left.
    let rim = NODE_RADIUS + PORT_RADIUS;
    let expected = [rim, 0.0, 150.0, 0.0, 150.0, 0.0, 300.0 - rim, 0.0];
    for (actual, expected) in numbers.iter().zip(expected) {
        assert_close(*actual, expected);
    }
}

#[test]
fn test_pipeline_renders_inputs_outputs_and_labels() {
    let workflow = draw(&pipeline_model());

    assert_eq!(count(&workflow, ".node.input.type-File"), 1);
    assert_eq!(count(&workflow, ".node.output"), 1);
    assert_eq!(count(&workflow, ".node.input .node-icon.icon-file-input"), 1);
    assert_eq!(count(&workflow, ".edge"), 2);
    // Both step inputs are drawn, connected or not.
    assert_eq!(count(&workflow, r#".step[data-id="align"] .port.input-port"#), 2);

    let title = find(&workflow, r#".step[data-id="align"] .title"#).expect("title");
    assert_eq!(workflow.scene().text(title), Some("Align reads"));
}

#[test]
fn test_draw_is_idempotent() {
    let workflow = draw(&pipeline_model());
    let first = snapshot(&workflow);
    workflow.draw().expect("redraw");
    assert_eq!(snapshot(&workflow), first);
}

#[test]
fn test_markup_output_contains_rendered_nodes() {
    let workflow = draw(&ab_model());
    let scene = workflow.scene();
    let markup = scene.to_markup(scene.root());
    assert!(markup.starts_with("<svg class=\"graph-1\">"));
    assert!(markup.contains("data-id=\"A\""));
    assert!(markup.contains("class=\"sub-edge outer\""));
}

#[test]
fn test_spawning_an_existing_edge_updates_it_in_place() {
    let workflow = draw(&ab_model());
    let group = workflow.workflow_group();
    let existing = find(&workflow, ".edge").expect("edge");

    // Argument order does not matter: the input side is always the destination.
    let spawned = Edge::spawn_between_connection_ids(
        &mut workflow.scene_mut(),
        group,
        "in/B/in",
        "out/A/out",
    )
    .expect("ports are rendered");

    assert_eq!(spawned, existing);
    assert_eq!(count(&workflow, ".edge"), 1);
}

#[test]
fn test_highlighted_edges_survive_redraw() {
    let workflow = draw(&ab_model());
    let edge = find(&workflow, ".edge").expect("edge");
    workflow.scene_mut().add_class(edge, "highlighted");

    workflow.redraw_edges().expect("redraw");
    assert_eq!(count(&workflow, ".edge.highlighted"), 1);
    assert!(!workflow.scene().contains(edge));
}

#[test]
fn test_workflow_ids_tag_the_scene_root() {
    let workflow = draw(&ab_model());
    assert_eq!(workflow.svg_id(), "graph-1");

    let custom = Workflow::builder(viewport_scene(), ab_model())
        .with_id_source(SequenceIdSource::new("canvas"))
        .build()
        .expect("draw");
    assert_eq!(custom.svg_id(), "canvas-1");
    let scene = custom.scene();
    assert!(scene.has_class(scene.root(), "canvas-1"));
}

// --- Model events ---

#[test]
fn test_model_mutations_patch_the_scene() {
    let model = ab_model();
    let workflow = draw(&model);

    model
        .add_step(StepModel::new("C").with_input("in").at(600.0, 0.0))
        .expect("add C");
    assert_eq!(count(&workflow, ".node.step"), 3);

    model.add_output_port("B", "result").expect("add port");
    assert!(find(&workflow, r#".port.output-port[data-connection-id="out/B/result"]"#).is_some());

    model.connect("out/B/result", "in/C/in").expect("connect");
    assert_eq!(count(&workflow, ".edge"), 2);
    assert!(find(&workflow, ".edge.B.C").is_some());

    model.set_step_label("B", "Renamed").expect("label");
    let title = find(&workflow, r#".step[data-id="B"] .title"#).expect("title");
    assert_eq!(workflow.scene().text(title), Some("Renamed"));

    model.remove_output_port("B", "result").expect("remove port");
    assert_eq!(count(&workflow, ".edge"), 1);
    assert!(find(&workflow, r#".port[data-connection-id="out/B/result"]"#).is_none());

    model.remove_step("A").expect("remove A");
    assert_eq!(count(&workflow, ".node.step"), 2);
    assert_eq!(count(&workflow, ".edge"), 0);
}

#[test]
fn test_disconnect_removes_only_that_edge() {
    let model = pipeline_model();
    let workflow = draw(&model);

    model.disconnect("out/reads/reads", "in/align/reads").expect("disconnect");
    assert_eq!(count(&workflow, ".edge"), 1);
    assert!(find(&workflow, r#".edge[data-source-connection="out/align/bam"]"#).is_some());
}

#[test]
fn test_workflow_inputs_and_outputs_follow_the_model() {
    let model = pipeline_model();
    let workflow = draw(&model);

    model
        .add_input(InputModel::new("reference").at(0.0, 150.0))
        .expect("add input");
    assert_eq!(count(&workflow, ".node.input"), 2);

    model.remove_input("reads").expect("remove input");
    assert_eq!(count(&workflow, ".node.input"), 1);
    assert_eq!(count(&workflow, ".edge"), 1);

    model.remove_output("aligned").expect("remove output");
    assert_eq!(count(&workflow, ".node.output"), 0);
    assert_eq!(count(&workflow, ".edge"), 0);
}

#[test]
fn test_hidden_ports_and_steps_are_not_drawn() {
    let model = WorkflowModel::new();
    model
        .add_step(StepModel::new("A").with_output("out").at(0.0, 0.0))
        .expect("A");
    model
        .add_step(StepModel::new("B").with_hidden_input("in").at(300.0, 0.0))
        .expect("B");
    model.connect("out/A/out", "in/B/in").expect("connect");
    let workflow = draw(&model);

    assert_eq!(count(&workflow, ".edge"), 0);
    assert_eq!(count(&workflow, ".port.input-port"), 0);

    model.show_input_port("B", "in").expect("show");
    assert_eq!(count(&workflow, r#".step[data-id="B"] .port.input-port"#), 1);

    let mut hidden = StepModel::new("ghost");
    hidden.visible = false;
    model.add_step(hidden).expect("ghost");
    assert!(find(&workflow, r#".step[data-id="ghost"]"#).is_none());
}

#[test]
fn test_connections_to_hidden_ports_leave_the_scene_alone() {
    let model = WorkflowModel::new();
    model
        .add_step(StepModel::new("A").with_output("out").at(0.0, 0.0))
        .expect("A");
    model
        .add_step(StepModel::new("B").with_hidden_input("in").at(300.0, 0.0))
        .expect("B");
    let workflow = draw(&model);
    let before = snapshot(&workflow);
    let version = workflow.scene().version();

    model.connect("out/A/out", "in/B/in").expect("connect");
    assert_eq!(workflow.scene().version(), version);
    assert_eq!(count(&workflow, ".edge"), 0);

    model.disconnect("out/A/out", "in/B/in").expect("disconnect");
    assert_eq!(workflow.scene().version(), version);
    assert_eq!(snapshot(&workflow), before);
}

/// Serves a well-formed model plus connections the engine cannot draw.
struct FlawedModel {
    inner: WorkflowModel,
    extra: Vec<ConnectionModel>,
}

impl ModelSource for FlawedModel {
    fn identity(&self) -> usize {
        self.inner.identity()
    }

    fn steps(&self) -> Vec<StepModel> {
        self.inner.steps()
    }

    fn inputs(&self) -> Vec<InputModel> {
        self.inner.inputs()
    }

    fn outputs(&self) -> Vec<OutputModel> {
        self.inner.outputs()
    }

    fn connections(&self) -> Vec<ConnectionModel> {
        let mut connections = self.extra.clone();
        connections.extend(self.inner.connections());
        connections
    }

    fn on(&self, kind: ModelEventKind, listener: ModelListener) -> Disposer {
        self.inner.on(kind, listener)
    }
}

fn endpoint(id: &str, kind: EndpointKind) -> Endpoint {
    Endpoint {
        id: id.to_string(),
        kind,
        visible: true,
    }
}

#[test]
fn test_broken_edges_do_not_abort_the_draw() {
    let flawed = FlawedModel {
        inner: ab_model(),
        extra: vec![
            ConnectionModel {
                source: endpoint("out/A/out", EndpointKind::StepOutput),
                destination: endpoint("out/A/out", EndpointKind::StepOutput),
            },
            ConnectionModel {
                source: endpoint("out/A/out", EndpointKind::StepOutput),
                destination: endpoint("in/B/missing", EndpointKind::StepInput),
            },
        ],
    };
    let workflow = Workflow::new(viewport_scene(), flawed).expect("draw survives bad edges");

    assert_eq!(count(&workflow, ".node"), 2);
    assert_eq!(count(&workflow, ".edge"), 1);
    let edge = find(&workflow, ".edge").expect("edge");
    let scene = workflow.scene();
    assert_eq!(scene.attribute(edge, "data-destination-connection"), Some("in/B/in"));
    drop(scene);

    workflow.redraw_edges().expect("redraw");
    assert_eq!(count(&workflow, ".edge"), 1);
}

#[test]
fn test_hiding_a_port_drops_its_edges() {
    let model = ab_model();
    let workflow = draw(&model);

    model.hide_input_port("B", "in").expect("hide");
    assert_eq!(count(&workflow, ".edge"), 0);
    assert_eq!(count(&workflow, ".port.input-port"), 0);
    // The output side of A is untouched.
    assert_eq!(count(&workflow, ".port.output-port"), 1);
}

#[test]
fn test_showing_a_port_again_restores_its_edges() {
    let model = ab_model();
    let workflow = draw(&model);

    model.hide_input_port("B", "in").expect("hide");
    model.show_input_port("B", "in").expect("show");

    assert_eq!(count(&workflow, ".edge"), 1);
    let patched = edge_path(&workflow);
    workflow.draw().expect("redraw");
    assert_eq!(count(&workflow, ".edge"), 1);
    assert_eq!(edge_path(&workflow), patched);
}

#[test]
fn test_hiding_one_port_keeps_the_other_port_elements() {
    let model = pipeline_model();
    let workflow = draw(&model);
    let kept = find(&workflow, r#".port[data-connection-id="in/align/reads"]"#).expect("reads port");

    model.hide_input_port("align", "reference").expect("hide");

    assert_eq!(count(&workflow, r#".step[data-id="align"] .port.input-port"#), 1);
    assert_eq!(
        find(&workflow, r#".port[data-connection-id="in/align/reads"]"#),
        Some(kept)
    );
    // The step shrinks to fit its busier side, now a single port.
    let outer = find(&workflow, r#".step[data-id="align"] .core .outer"#).expect("circle");
    let radius = NODE_RADIUS + PORT_RADIUS;
    assert_eq!(
        workflow.scene().attribute(outer, "r"),
        Some(radius.to_string().as_str())
    );
}

#[test]
fn test_draw_model_rebinds_subscriptions() {
    let first = ab_model();
    let log = Rc::new(RefCell::new(Vec::new()));
    let workflow = Workflow::builder(viewport_scene(), first.clone())
        .with_plugin(RecordingPlugin::new(Rc::clone(&log)))
        .build()
        .expect("draw");
    assert!(first.listener_count() > 0);

    let second = pipeline_model();
    workflow.draw_model(second.clone()).expect("redraw");
    assert_eq!(first.listener_count(), 0);
    assert_eq!(count(&workflow, ".node"), 3);

    first.add_step(StepModel::new("stray")).expect("stray");
    assert!(find(&workflow, r#".step[data-id="stray"]"#).is_none());

    second.add_step(StepModel::new("sort")).expect("sort");
    assert!(find(&workflow, r#".step[data-id="sort"]"#).is_some());

    let model_changes = log
        .borrow()
        .iter()
        .filter(|entry| *entry == "after_model_change")
        .count();
    assert_eq!(model_changes, 2);
}

// --- Pan and zoom ---

#[test]
fn test_scale_at_point_keeps_the_cursor_fixed() {
    let workflow = draw(&ab_model());
    workflow.set_scale(0.8).expect("scale");

    let before = workflow
        .transform_screen_ctm_to_canvas(200.0, 150.0)
        .expect("invertible");
    workflow.scale_at_point(1.7, 200.0, 150.0).expect("zoom");
    let after = workflow
        .transform_screen_ctm_to_canvas(200.0, 150.0)
        .expect("invertible");

    assert_close(after.x, before.x);
    assert_close(after.y, before.y);
    assert_eq!(workflow.scale(), 1.7);
}

#[test]
fn test_set_scale_is_exact_and_not_clamped() {
    let workflow = draw(&ab_model());
    workflow.set_scale(5.0).expect("scale");

    assert_eq!(workflow.scale(), 5.0);
    let transform = workflow.transform();
    assert_eq!(transform.a, 5.0);
    assert_eq!(transform.d, 5.0);
    assert!(transform.is_uniform_scale());
}

#[test]
fn test_labels_get_the_compensating_scale() {
    let workflow = draw(&ab_model());
    workflow.set_scale(0.5).expect("scale");

    assert_close(workflow.label_scale(), 1.5);
    let title = find(&workflow, r#".step[data-id="A"] .title"#).expect("title");
    let matrix = workflow.scene().local_transform(title);
    assert_close(matrix.a, 1.5);
    assert_close(matrix.d, 1.5);
}

#[test]
fn test_zooming_around_the_center_keeps_the_center() {
    let workflow = draw(&ab_model());
    workflow.set_scale(2.0).expect("scale");
    let center = workflow
        .transform_screen_ctm_to_canvas(VIEWPORT_WIDTH / 2.0, VIEWPORT_HEIGHT / 2.0)
        .expect("invertible");
    assert_close(center.x, VIEWPORT_WIDTH / 2.0);
    assert_close(center.y, VIEWPORT_HEIGHT / 2.0);
}

#[test]
fn test_fit_to_viewport_shrinks_and_centers() {
    let workflow = draw(&wide_model(3000.0));
    workflow.fit_to_viewport(false).expect("fit");

    let scale = workflow.scale();
    assert!(scale <= 1.0);
    assert!(scale >= workflow.min_scale());
    assert!(scale < 0.5);

    let scene = workflow.scene();
    let bounds = scene.screen_bounds(workflow.workflow_group());
    let center = bounds.center();
    assert_close(center.x, VIEWPORT_WIDTH / 2.0);
    assert_close(center.y, VIEWPORT_HEIGHT / 2.0);
}

#[test]
fn test_fit_respects_min_scale_unless_ignored() {
    let clamped = draw(&wide_model(100_000.0));
    clamped.fit_to_viewport(false).expect("fit");
    assert_eq!(clamped.scale(), clamped.min_scale());

    let free = draw(&wide_model(100_000.0));
    free.fit_to_viewport(true).expect("fit");
    assert!(free.scale() < free.min_scale());
    assert!(free.scale() > 0.0);
}

#[test]
fn test_fit_never_zooms_in() {
    let workflow = draw(&ab_model());
    workflow.set_scale(0.3).expect("scale");
    workflow.fit_to_viewport(false).expect("fit");
    assert_eq!(workflow.scale(), 1.0);
}

#[test]
fn test_fit_of_an_empty_workflow_keeps_unit_scale() {
    let workflow = draw(&WorkflowModel::new());
    workflow.fit_to_viewport(false).expect("fit");
    assert_eq!(workflow.scale(), 1.0);
}

#[test]
fn test_fit_on_an_empty_viewport_fails() {
    let scene = Scene::new(Rect::new(0.0, 0.0, 0.0, 0.0));
    assert!(!Workflow::can_draw_in(&scene));
    let workflow = Workflow::new(scene, ab_model()).expect("draw");
    let result = workflow.fit_to_viewport(false);
    assert!(matches!(result, Err(GraphError::EmptyViewport { .. })));
}

#[test]
fn test_fit_uses_the_current_viewport_and_config() {
    let config = GraphConfig {
        min_scale: 0.5,
        ..GraphConfig::default()
    };
    let workflow = Workflow::builder(viewport_scene(), wide_model(3000.0))
        .with_config(config)
        .build()
        .expect("draw");
    workflow.fit_to_viewport(false).expect("fit");
    assert_eq!(workflow.scale(), 0.5);

    workflow
        .set_viewport(Rect::new(0.0, 0.0, 4000.0, 1000.0))
        .expect("resize");
    workflow.fit_to_viewport(false).expect("fit");
    assert_eq!(workflow.scale(), 1.0);
    let scene = workflow.scene();
    let center = scene.screen_bounds(workflow.workflow_group()).center();
    assert_close(center.x, 2000.0);
    assert_close(center.y, 500.0);
}

#[test]
fn test_graph_config_fills_missing_fields() {
    let config: GraphConfig = serde_json::from_str(r#"{"max_scale": 4.0}"#).expect("valid");
    assert_eq!(config.max_scale, 4.0);
    assert_eq!(config.min_scale, GraphConfig::default().min_scale);
    assert_eq!(config.fit_padding, 100.0);
}

#[test]
fn test_reset_transform_restores_identity() {
    let workflow = draw(&ab_model());
    workflow.set_scale(0.4).expect("scale");
    workflow.fit_to_viewport(false).expect("fit");

    workflow.reset_transform().expect("reset");
    assert_eq!(workflow.transform(), Matrix::IDENTITY);
    assert_eq!(workflow.scale(), 1.0);
    assert_eq!(workflow.label_scale(), 1.0);
}

// --- Gestures ---

#[test]
fn test_dragging_the_pan_handle_moves_the_workflow() {
    let workflow = draw(&ab_model());
    let handle = workflow.pan_handle();

    workflow
        .dispatch_pointer(&PointerEvent::new(PointerKind::Down, 10.0, 10.0, Some(handle)))
        .expect("down");
    workflow
        .dispatch_pointer(&PointerEvent::new(PointerKind::Move, 25.0, 15.0, Some(handle)))
        .expect("move");
    workflow
        .dispatch_pointer(&PointerEvent::new(PointerKind::Move, 40.0, 30.0, Some(handle)))
        .expect("move");
    workflow
        .dispatch_pointer(&PointerEvent::new(PointerKind::Up, 40.0, 30.0, Some(handle)))
        .expect("up");

    let transform = workflow.transform();
    assert_eq!(transform.e, 30.0);
    assert_eq!(transform.f, 20.0);
    assert_eq!(transform.a, 1.0);

    // A second drag continues from where the first one left off.
    workflow
        .dispatch_pointer(&PointerEvent::new(PointerKind::Down, 0.0, 0.0, Some(handle)))
        .expect("down");
    workflow
        .dispatch_pointer(&PointerEvent::new(PointerKind::Move, -10.0, 0.0, Some(handle)))
        .expect("move");
    assert_eq!(workflow.transform().e, 20.0);
}

#[test]
fn test_hovered_node_is_brought_to_front() {
    let workflow = draw(&ab_model());
    let group = workflow.workflow_group();
    let node_a = find(&workflow, r#".step[data-id="A"]"#).expect("A");
    let circle = find(&workflow, r#".step[data-id="A"] .core .outer"#).expect("circle");
    assert_ne!(workflow.scene().children(group).last(), Some(&node_a));

    workflow
        .dispatch_pointer(&PointerEvent::new(PointerKind::Over, 0.0, 0.0, Some(circle)))
        .expect("over");
    assert_eq!(workflow.scene().children(group).last(), Some(&node_a));
    assert_eq!(workflow.find_parent(circle, "node"), Some(node_a));
}

// --- Plugins and lifecycle ---

#[test]
fn test_plugin_hooks_run_in_order() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let workflow = Workflow::builder(viewport_scene(), ab_model())
        .with_plugin(RecordingPlugin::new(Rc::clone(&log)))
        .build()
        .expect("draw");

    workflow.enable_editing(false).expect("editing");
    assert!(!workflow.is_editing_enabled());
    workflow.destroy().expect("destroy");

    assert_eq!(
        *log.borrow(),
        vec![
            "register_workflow",
            "register_on_before_change",
            "register_on_after_change",
            "register_on_after_render",
            "after_model_change",
            "after_render",
            "on_editable_state_change(false)",
            "destroy",
        ]
    );
}

#[test]
fn test_plugins_are_found_by_type() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let workflow = Workflow::builder(viewport_scene(), ab_model())
        .with_plugin(QuietPlugin)
        .with_plugin(RecordingPlugin::new(log))
        .build()
        .expect("draw");

    let recording = workflow
        .get_plugin::<RecordingPlugin>()
        .expect("plugin is attached");
    let handle = recording
        .borrow()
        .workflow
        .clone()
        .expect("workflow was registered");
    let upgraded = handle.upgrade().expect("workflow is alive");
    assert_eq!(upgraded.svg_id(), workflow.svg_id());

    let bare = Workflow::new(viewport_scene(), ab_model()).expect("draw");
    assert!(bare.get_plugin::<RecordingPlugin>().is_none());
}

#[test]
fn test_plugin_render_announcements_reach_hub_and_plugins() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let workflow = Workflow::builder(viewport_scene(), ab_model())
        .with_plugin(RecordingPlugin::new(Rc::clone(&log)))
        .build()
        .expect("draw");

    let heard = Rc::new(Cell::new(0));
    let counter = Rc::clone(&heard);
    workflow
        .on(GraphEvent::AfterRender, move |_| counter.set(counter.get() + 1))
        .expect("known event");

    let hooks = workflow
        .get_plugin::<RecordingPlugin>()
        .expect("plugin")
        .borrow()
        .after_render
        .clone()
        .expect("hooks were handed over");
    assert_eq!(hooks.event(), GraphEvent::AfterRender);
    log.borrow_mut().clear();

    hooks.emit(&Value::Null);
    assert_eq!(heard.get(), 1);
    assert_eq!(*log.borrow(), vec!["after_render"]);

    // A full draw announces itself the same way.
    workflow.draw().expect("redraw");
    assert_eq!(heard.get(), 2);

    // So does a host emitting on the workflow directly.
    log.borrow_mut().clear();
    let reached = workflow
        .emit(GraphEvent::AfterRender, &Value::Null)
        .expect("known event");
    assert_eq!(reached, 1);
    assert_eq!(heard.get(), 3);
    assert_eq!(*log.borrow(), vec!["after_render"]);

    // Other events stay on the hub.
    workflow
        .emit(GraphEvent::SelectionChange, &Value::Null)
        .expect("known event");
    assert_eq!(*log.borrow(), vec!["after_render"]);
}

#[test]
fn test_destroyed_workflow_refuses_work() {
    let model = ab_model();
    let workflow = draw(&model);
    workflow.destroy().expect("destroy");

    assert!(workflow.is_destroyed());
    assert_eq!(count(&workflow, ".node"), 0);
    assert_eq!(model.listener_count(), 0);
    {
        let scene = workflow.scene();
        assert!(!scene.has_class(scene.root(), workflow.svg_id()));
    }

    assert!(matches!(
        workflow.set_scale(1.0),
        Err(GraphError::Destroyed { method: "set_scale" })
    ));
    assert!(matches!(workflow.draw(), Err(GraphError::Destroyed { .. })));
    assert!(matches!(workflow.destroy(), Err(GraphError::Destroyed { .. })));
    assert!(workflow.fit_to_viewport(false).is_err());
    assert!(workflow.reset_transform().is_err());
    assert!(workflow.enable_editing(true).is_err());
    assert!(
        workflow
            .dispatch_pointer(&PointerEvent::new(PointerKind::Down, 0.0, 0.0, None))
            .is_err()
    );

    let heard = Rc::new(Cell::new(0));
    let counter = Rc::clone(&heard);
    assert!(matches!(
        workflow.on(GraphEvent::AfterRender, move |_| counter.set(counter.get() + 1)),
        Err(GraphError::Destroyed { method: "on" })
    ));
    assert!(matches!(
        workflow.emit(GraphEvent::AfterRender, &Value::Null),
        Err(GraphError::Destroyed { method: "emit" })
    ));
    assert_eq!(heard.get(), 0);

    // The model keeps working, the scene no longer follows it.
    model.add_step(StepModel::new("late")).expect("model still works");
    assert_eq!(count(&workflow, ".node"), 0);
}

#[test]
fn test_no_callbacks_run_after_destroy() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let workflow = Workflow::builder(viewport_scene(), ab_model())
        .with_plugin(RecordingPlugin::new(Rc::clone(&log)))
        .build()
        .expect("draw");

    let heard = Rc::new(Cell::new(0));
    let counter = Rc::clone(&heard);
    workflow
        .on(GraphEvent::AfterRender, move |_| counter.set(counter.get() + 1))
        .expect("known event");
    let hooks = workflow
        .get_plugin::<RecordingPlugin>()
        .expect("plugin")
        .borrow()
        .after_render
        .clone()
        .expect("hooks");

    workflow.destroy().expect("destroy");
    let entries = log.borrow().len();

    hooks.emit(&Value::Null);
    assert_eq!(heard.get(), 0);
    assert_eq!(log.borrow().len(), entries);
}
