//! Unit tests for the scene, geometry, event and model building blocks.
mod common;
use common::*;
use serde_json::{Value, json};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use workflow_canvas::error::{SelectorError, TemplateError};
use workflow_canvas::events::{DomEvents, EventHub};
use workflow_canvas::model::{EndpointKind, ModelListener};
use workflow_canvas::prelude::*;
use workflow_canvas::scene::Compound;

// --- Geometry ---

#[test]
fn test_matrix_inverse_round_trips_points() {
    let matrix = Matrix::identity().translate(40.0, -12.0).scale(2.5);
    let inverse = matrix.inverse().expect("matrix should be invertible");
    let point = Point::new(17.0, 3.0);

    let back = inverse.apply(matrix.apply(point));
    assert_close(back.x, point.x);
    assert_close(back.y, point.y);
    assert!(matrix.multiply(&inverse).approx_eq(&Matrix::IDENTITY, 1e-9));
}

#[test]
fn test_singular_matrix_has_no_inverse() {
    let collapsed = Matrix::scaling(0.0, 1.0);
    assert!(collapsed.inverse().is_none());
}

#[test]
fn test_transform_attribute_formatting() {
    let matrix = Matrix::new(0.5, 0.0, 0.0, 0.5, 10.0, -20.25);
    assert_eq!(matrix.to_transform_attr(), "matrix(0.5,0,0,0.5,10,-20.25)");
    assert_eq!(
        Matrix::parse_transform_attr("matrix(0.5,0,0,0.5,10,-20.25)"),
        Some(matrix)
    );
}

#[test]
fn test_connection_path_control_points() {
    let right = make_connection_path(0.0, 0.0, 100.0, 50.0, Some(Direction::Right));
    assert_eq!(right, "M 0 0 C 50 0 50 50 100 50");

    let left = make_connection_path(0.0, 0.0, 100.0, 50.0, Some(Direction::Left));
    assert_eq!(left, "M 0 0 C -50 0 150 50 100 50");

    let midpoint = make_connection_path(10.0, 0.0, 30.0, 8.0, None);
    assert_eq!(midpoint, "M 10 0 C 20 0 20 8 30 8");
}

#[test]
fn test_backwards_connection_path_still_leaves_to_the_right() {
    let path = make_connection_path(200.0, 0.0, 0.0, 0.0, Some(Direction::Right));
    let numbers = path_numbers(&path);
    // Source control point sits to the right of the source.
    assert!(numbers[2] > numbers[0]);
    // Destination control point sits to the left of the destination.
    assert!(numbers[4] < numbers[6]);
}

// --- Scene and templates ---

#[test]
fn test_template_parses_nested_markup_with_entities() {
    let mut scene = viewport_scene();
    let markup = r#"<g class="node step" data-id="a&amp;b"><text class="title">x &lt; y</text></g>"#;
    let node = TemplateParser::parse(&mut scene, markup)
        .expect("markup should parse")
        .expect("one element");

    assert!(scene.has_class(node, "node"));
    assert!(scene.has_class(node, "step"));
    assert_eq!(scene.attribute(node, "data-id"), Some("a&b"));
    let title = scene.query(node, &Selector::class("title")).expect("title");
    assert_eq!(scene.text(title), Some("x < y"));
    // Parsed fragments start detached.
    assert!(!scene.is_attached(node));
}

#[test]
fn test_template_markup_round_trip_preserves_structure() {
    let mut scene = viewport_scene();
    let markup = concat!(
        r#"<g class="edge" data-source-connection="out/A/out">"#,
        r#"<path class="sub-edge outer" d="M 0 0 C 1 1 2 2 3 3"/>"#,
        r#"<text transform="matrix(2,0,0,2,5,6)">label</text>"#,
        "</g>"
    );
    let first = TemplateParser::parse(&mut scene, markup)
        .expect("parse")
        .expect("element");
    let serialized = scene.to_markup(first);
    let second = TemplateParser::parse(&mut scene, &serialized)
        .expect("reparse")
        .expect("element");

    assert_eq!(scene.snapshot(first), scene.snapshot(second));
    let text = scene
        .query(second, &Selector::new(Compound::new().tag("text")))
        .expect("text");
    assert_eq!(
        scene.transform(text),
        Some(Matrix::new(2.0, 0.0, 0.0, 2.0, 5.0, 6.0))
    );
}

#[test]
fn test_template_rejects_mismatched_tags() {
    let mut scene = viewport_scene();
    let before = scene.len();
    let result = TemplateParser::parse(&mut scene, "<g><text></g>");
    assert!(matches!(
        result,
        Err(TemplateError::MismatchedClosingTag { .. })
    ));
    // Nothing half-built is left behind.
    assert_eq!(scene.len(), before);
}

#[test]
fn test_template_whitespace_yields_nothing() {
    let mut scene = viewport_scene();
    assert_eq!(TemplateParser::parse(&mut scene, "   ").expect("parse"), None);
}

#[test]
fn test_selector_parsing_and_display() {
    let selector: Selector = r#"g.node.step[data-id="A"] .title"#.parse().expect("valid");
    assert_eq!(selector.to_string(), r#"g.node.step[data-id="A"] .title"#);

    assert!(matches!("".parse::<Selector>(), Err(SelectorError::Empty)));
    assert!(matches!(
        "[data-id=\"A\"".parse::<Selector>(),
        Err(SelectorError::Invalid { .. })
    ));
}

#[test]
fn test_selector_scoping_excludes_the_scope_itself() {
    let mut scene = viewport_scene();
    let root = scene.root();
    let outer = TemplateParser::parse(
        &mut scene,
        r#"<g class="node"><g class="node inner"><circle class="port"/></g></g>"#,
    )
    .expect("parse")
    .expect("element");
    scene.append_child(root, outer);

    let nodes = scene.query_selector_all(outer, ".node").expect("valid");
    assert_eq!(nodes.len(), 1);
    assert!(scene.has_class(nodes[0], "inner"));

    // Ancestor compounds may match outside the scope, like querySelectorAll.
    let inner = nodes[0];
    let ports = scene.query_selector_all(inner, ".node .port").expect("valid");
    assert_eq!(ports.len(), 1);
}

#[test]
fn test_descendant_selectors_require_the_ancestor() {
    let mut scene = viewport_scene();
    let root = scene.root();
    for markup in [
        r#"<g class="node"><text class="label">inside</text></g>"#,
        r#"<g class="legend"><text class="label">outside</text></g>"#,
    ] {
        let el = TemplateParser::parse(&mut scene, markup)
            .expect("parse")
            .expect("element");
        scene.append_child(root, el);
    }

    let labels = scene.query_selector_all(root, ".node .label").expect("valid");
    assert_eq!(labels.len(), 1);
    assert_eq!(scene.text(labels[0]), Some("inside"));
    assert_eq!(scene.query_selector_all(root, ".label").expect("valid").len(), 2);
}

#[test]
fn test_screen_bounds_follow_nested_transforms() {
    let mut scene = viewport_scene();
    let root = scene.root();
    let group = TemplateParser::parse(
        &mut scene,
        concat!(
            r#"<g transform="matrix(2,0,0,2,100,50)">"#,
            r#"<g transform="matrix(1,0,0,1,10,0)"><circle cx="0" cy="0" r="5"/></g>"#,
            "</g>"
        ),
    )
    .expect("parse")
    .expect("element");
    scene.append_child(root, group);

    let bounds = scene.screen_bounds(group);
    assert_close(bounds.x, 110.0);
    assert_close(bounds.y, 40.0);
    assert_close(bounds.width, 20.0);
    assert_close(bounds.height, 20.0);
}

#[test]
fn test_snapshot_survives_binary_round_trip() {
    let mut scene = viewport_scene();
    let root = scene.root();
    let node = TemplateParser::parse(&mut scene, r#"<g class="node"><text>hi</text></g>"#)
        .expect("parse")
        .expect("element");
    scene.append_child(root, node);

    let snapshot = scene.snapshot(root).expect("root exists");
    let bytes = snapshot.to_bytes().expect("encode");
    let restored = SceneSnapshot::from_bytes(&bytes).expect("decode");
    assert_eq!(snapshot, restored);
    assert_eq!(restored.find_all("node").len(), 1);
}

// --- Event hub ---

#[test]
fn test_hub_delivers_in_registration_order() {
    let hub = EventHub::new(GraphEvent::ALL);
    let calls = Rc::new(RefCell::new(Vec::new()));

    for name in ["first", "second"] {
        let calls = Rc::clone(&calls);
        hub.on(GraphEvent::AfterChange, move |payload| {
            calls.borrow_mut().push(format!("{}:{}", name, payload["step"]));
        })
        .expect("known event");
    }

    let delivered = hub
        .emit(GraphEvent::AfterChange, &json!({ "step": 1 }))
        .expect("known event");
    assert_eq!(delivered, 2);
    assert_eq!(*calls.borrow(), vec!["first:1", "second:1"]);
}

#[test]
fn test_hub_off_and_empty() {
    let hub = EventHub::new(GraphEvent::ALL);
    let hits = Rc::new(Cell::new(0));
    let counter = Rc::clone(&hits);
    let id = hub
        .on(GraphEvent::SelectionChange, move |_| counter.set(counter.get() + 1))
        .expect("known event");

    assert!(hub.off(GraphEvent::SelectionChange, id).expect("known event"));
    assert!(!hub.off(GraphEvent::SelectionChange, id).expect("known event"));
    hub.emit(GraphEvent::SelectionChange, &Value::Null).expect("known event");
    assert_eq!(hits.get(), 0);

    hub.on(GraphEvent::SelectionChange, |_| {}).expect("known event");
    hub.empty();
    assert_eq!(hub.handler_count(GraphEvent::SelectionChange), 0);
    assert!(hub.supports(GraphEvent::SelectionChange));
}

#[test]
fn test_hub_refuses_events_outside_its_vocabulary() {
    let hub = EventHub::new([GraphEvent::AfterRender]);
    let result = hub.on(GraphEvent::BeforeChange, |_| {});
    assert!(matches!(result, Err(GraphError::UnregisteredEvent(_))));
    assert!(hub.emit(GraphEvent::BeforeChange, &Value::Null).is_err());
}

#[test]
fn test_hub_subscription_during_emit_waits_for_next_emit() {
    let hub = Rc::new(EventHub::new(GraphEvent::ALL));
    let late_hits = Rc::new(Cell::new(0));

    let inner_hub = Rc::clone(&hub);
    let inner_hits = Rc::clone(&late_hits);
    hub.on(GraphEvent::AfterRender, move |_| {
        let hits = Rc::clone(&inner_hits);
        inner_hub
            .on(GraphEvent::AfterRender, move |_| hits.set(hits.get() + 1))
            .expect("known event");
    })
    .expect("known event");

    assert_eq!(hub.emit(GraphEvent::AfterRender, &Value::Null).expect("emit"), 1);
    assert_eq!(late_hits.get(), 0);
    hub.emit(GraphEvent::AfterRender, &Value::Null).expect("emit");
    assert_eq!(late_hits.get(), 1);
}

#[test]
fn test_event_names_parse() {
    assert_eq!(
        "app.create.step".parse::<GraphEvent>().expect("known"),
        GraphEvent::AppCreateStep
    );
    assert_eq!(GraphEvent::AfterRender.to_string(), "afterRender");
    assert!(matches!(
        "app.create.nothing".parse::<GraphEvent>(),
        Err(GraphError::UnknownEventName(_))
    ));
}

// --- Pointer gestures ---

fn scene_with_handle() -> (Scene, ElementId, ElementId) {
    let mut scene = viewport_scene();
    let root = scene.root();
    let handle = TemplateParser::parse(
        &mut scene,
        r#"<g class="handle"><circle class="grip" cx="0" cy="0" r="4"/></g>"#,
    )
    .expect("parse")
    .expect("element");
    scene.append_child(root, handle);
    let grip = scene.query(handle, &Selector::class("grip")).expect("grip");
    (scene, handle, grip)
}

#[test]
fn test_drag_reports_cumulative_deltas_to_the_delegated_element() {
    let (mut scene, handle, grip) = scene_with_handle();
    let mut dom = DomEvents::new();
    let moves = Rc::new(RefCell::new(Vec::new()));
    let phases = Rc::new(RefCell::new(Vec::new()));

    let (m, start, end) = (Rc::clone(&moves), Rc::clone(&phases), Rc::clone(&phases));
    dom.drag(
        Selector::class("handle"),
        move |_, dx, dy, element| m.borrow_mut().push((dx, dy, element)),
        move |_, _, _| start.borrow_mut().push("start"),
        move |_, _, _| end.borrow_mut().push("end"),
    );

    dom.dispatch(&mut scene, &PointerEvent::new(PointerKind::Down, 10.0, 10.0, Some(grip)));
    assert!(dom.is_dragging());
    dom.dispatch(&mut scene, &PointerEvent::new(PointerKind::Move, 15.0, 12.0, Some(grip)));
    dom.dispatch(&mut scene, &PointerEvent::new(PointerKind::Move, 30.0, 40.0, None));
    dom.dispatch(&mut scene, &PointerEvent::new(PointerKind::Up, 30.0, 40.0, None));

    assert!(!dom.is_dragging());
    assert_eq!(*moves.borrow(), vec![(5.0, 2.0, handle), (20.0, 30.0, handle)]);
    assert_eq!(*phases.borrow(), vec!["start", "end"]);
}

#[test]
fn test_drags_are_tracked_per_pointer() {
    let (mut scene, _, grip) = scene_with_handle();
    let mut dom = DomEvents::new();
    let moves = Rc::new(Cell::new(0));
    let m = Rc::clone(&moves);
    dom.drag(
        Selector::class("handle"),
        move |_, _, _, _| m.set(m.get() + 1),
        |_, _, _| {},
        |_, _, _| {},
    );

    dom.dispatch(
        &mut scene,
        &PointerEvent::new(PointerKind::Down, 0.0, 0.0, Some(grip)).with_pointer(1),
    );
    dom.dispatch(
        &mut scene,
        &PointerEvent::new(PointerKind::Move, 5.0, 5.0, None).with_pointer(2),
    );
    assert_eq!(moves.get(), 0);
    dom.dispatch(
        &mut scene,
        &PointerEvent::new(PointerKind::Move, 5.0, 5.0, None).with_pointer(1),
    );
    assert_eq!(moves.get(), 1);
}

#[test]
fn test_over_listeners_are_quiet_while_dragging() {
    let (mut scene, _, grip) = scene_with_handle();
    let mut dom = DomEvents::new();
    let overs = Rc::new(Cell::new(0));
    let o = Rc::clone(&overs);
    dom.drag(Selector::class("handle"), |_, _, _, _| {}, |_, _, _| {}, |_, _, _| {});
    dom.on(PointerKind::Over, Some(Selector::class("handle")), move |_, _, _| {
        o.set(o.get() + 1)
    });

    dom.dispatch(&mut scene, &PointerEvent::new(PointerKind::Over, 0.0, 0.0, Some(grip)));
    assert_eq!(overs.get(), 1);
    dom.dispatch(&mut scene, &PointerEvent::new(PointerKind::Down, 0.0, 0.0, Some(grip)));
    dom.dispatch(&mut scene, &PointerEvent::new(PointerKind::Over, 0.0, 0.0, Some(grip)));
    assert_eq!(overs.get(), 1);
}

#[test]
fn test_hover_enter_and_leave() {
    let (mut scene, handle, grip) = scene_with_handle();
    let mut dom = DomEvents::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    let (h, e, l) = (Rc::clone(&log), Rc::clone(&log), Rc::clone(&log));
    dom.hover(
        handle,
        move |_, _, _| h.borrow_mut().push("hover"),
        move |_, _, _| e.borrow_mut().push("enter"),
        move |_, _, _| l.borrow_mut().push("leave"),
    );

    let root = scene.root();
    for target in [Some(grip), Some(grip), Some(root)] {
        dom.dispatch(&mut scene, &PointerEvent::new(PointerKind::Move, 0.0, 0.0, target));
    }
    assert_eq!(*log.borrow(), vec!["enter", "hover", "leave"]);

    dom.detach_all();
    assert_eq!(dom.listener_count(), 0);
}

// --- Model ---

#[test]
fn test_model_loads_from_json() {
    let json = r#"{
        "steps": [
            {"id": "A", "out": [{"id": "out"}], "position": {"x": 0.0, "y": 0.0}},
            {"id": "B", "in": [{"id": "in"}], "run": {"class": "CommandLineTool", "position": {"x": 300.0, "y": 10.0}}}
        ],
        "inputs": [{"id": "reads", "type": {"type": "File"}}],
        "connections": [
            {"source": "out/A/out", "destination": "in/B/in"},
            {"source": "out/reads/reads", "destination": "in/B/in"}
        ]
    }"#;
    let model = WorkflowModel::from_json(json).expect("document should load");

    let b = model.step("B").expect("step B");
    assert_eq!(b.position, Some(Point::new(300.0, 10.0)));
    assert_eq!(b.inputs[0].connection_id, "in/B/in");

    let connections = model.connections();
    assert_eq!(connections.len(), 2);
    assert_eq!(connections[1].source.kind, EndpointKind::WorkflowInput);
    assert_eq!(connections[1].destination.kind, EndpointKind::StepInput);
}

#[test]
fn test_model_rejects_unknown_endpoints_and_duplicates() {
    let model = ab_model();
    assert!(matches!(
        model.connect("out/A/out", "in/B/in"),
        Err(ModelError::DuplicateConnection { .. })
    ));
    assert!(matches!(
        model.connect("out/A/missing", "in/B/in"),
        Err(ModelError::UnknownEndpoint(id)) if id == "out/A/missing"
    ));
    assert!(matches!(
        model.add_step(StepModel::new("A")),
        Err(ModelError::DuplicateNode(_))
    ));
    assert!(matches!(
        model.disconnect("out/A/out", "in/A/in"),
        Err(ModelError::ConnectionNotFound { .. })
    ));
}

#[test]
fn test_model_json_round_trip_keeps_connections() {
    let model = pipeline_model();
    let json = model.to_document().to_json().expect("serialize");
    let reloaded = WorkflowModel::from_json(&json).expect("reload");
    assert_eq!(reloaded.connections(), model.connections());
    assert_eq!(reloaded.steps(), model.steps());
}

#[test]
fn test_removing_a_step_disconnects_it_first() {
    let model = ab_model();
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut disposers = Vec::new();
    for kind in [ModelEventKind::ConnectionRemove, ModelEventKind::StepRemove] {
        let log = Rc::clone(&log);
        let listener: ModelListener = Rc::new(move |event: &ModelEvent| {
            log.borrow_mut().push(event.kind());
        });
        disposers.push(model.on(kind, listener));
    }

    model.remove_step("B").expect("remove");
    assert_eq!(
        *log.borrow(),
        vec![ModelEventKind::ConnectionRemove, ModelEventKind::StepRemove]
    );
    assert!(model.connections().is_empty());

    for disposer in disposers {
        disposer.dispose();
    }
    assert_eq!(model.listener_count(), 0);
}

#[test]
fn test_model_handles_share_identity() {
    let model = WorkflowModel::new();
    let handle = model.clone();
    assert_eq!(model.identity(), handle.identity());
    assert_ne!(model.identity(), WorkflowModel::new().identity());
}

#[test]
fn test_connection_ids_parse() {
    let id = Edge::parse_connection_id("out/step_1/result");
    assert_eq!(id.node_id, "step_1");
    assert_eq!(id.port_id, "result");
    assert!(Edge::parse_connection_id("not-an-id").is_empty());
    assert!(ConnectionId::is_input("in/B/in"));
}
