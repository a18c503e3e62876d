use super::edge::Edge;
use super::graph_node::{GraphNode, NodeModel};
use super::step_node::StepNode;
use crate::error::GraphError;
use crate::events::{DomEvents, EventHub, GraphEvent, HandlerId, PointerEvent, PointerKind};
use crate::geometry::{Matrix, Point, Rect};
use crate::graph::connectable::Connectable;
use crate::model::{ModelEvent, ModelEventKind, ModelListener, ModelSource, Disposer};
use crate::plugins::{Plugin, PluginHooks};
use crate::scene::{Compound, ElementId, Scene, Selector, TemplateParser};
use ahash::AHashSet;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use tracing::{debug, trace, warn};

/// Tunables of a [`Workflow`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub min_scale: f64,
    pub max_scale: f64,
    /// Space kept free around the workflow by [`Workflow::fit_to_viewport`].
    pub fit_padding: f64,
    /// Distance between a node's rim and its title.
    pub label_offset: f64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.2,
            max_scale: 2.0,
            fit_padding: 100.0,
            label_offset: 30.0,
        }
    }
}

/// Produces the instance id a workflow tags its scene root with.
pub trait IdSource {
    fn next_id(&mut self) -> String;
}

/// Deterministic ids: `graph-1`, `graph-2`, ...
#[derive(Debug, Clone)]
pub struct SequenceIdSource {
    prefix: String,
    next: u64,
}

impl SequenceIdSource {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            next: 1,
        }
    }
}

impl Default for SequenceIdSource {
    fn default() -> Self {
        Self::new("graph")
    }
}

impl IdSource for SequenceIdSource {
    fn next_id(&mut self) -> String {
        let id = format!("{}-{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}

/// Random ids made of ASCII letters.
#[cfg(feature = "random-ids")]
#[derive(Debug, Clone)]
pub struct RandomIdSource {
    length: usize,
}

#[cfg(feature = "random-ids")]
impl RandomIdSource {
    pub fn new(length: usize) -> Self {
        Self { length }
    }
}

#[cfg(feature = "random-ids")]
impl Default for RandomIdSource {
    fn default() -> Self {
        Self::new(6)
    }
}

#[cfg(feature = "random-ids")]
impl IdSource for RandomIdSource {
    fn next_id(&mut self) -> String {
        use rand::Rng;
        const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
        let mut rng = rand::rng();
        (0..self.length)
            .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
            .collect()
    }
}

struct PluginSlot {
    hooks: Rc<RefCell<dyn Plugin>>,
    instance: Rc<dyn Any>,
}

#[derive(Debug, Clone, Copy)]
struct ViewState {
    doc_scale: f64,
    label_scale: f64,
    editing_enabled: bool,
    destroyed: bool,
    pending_first_draw: bool,
}

pub(crate) struct WorkflowCore {
    scene: RefCell<Scene>,
    dom: RefCell<DomEvents>,
    hub: EventHub<GraphEvent>,
    model: RefCell<Rc<dyn ModelSource>>,
    view: Cell<ViewState>,
    config: GraphConfig,
    svg_id: String,
    workflow_group: ElementId,
    pan_handle: ElementId,
    plugins: Vec<PluginSlot>,
    disposers: RefCell<Vec<Disposer>>,
    pending: RefCell<VecDeque<ModelEvent>>,
}

/// Builder for [`Workflow`]. The first draw happens in [`WorkflowBuilder::build`].
pub struct WorkflowBuilder {
    scene: Scene,
    model: Rc<dyn ModelSource>,
    plugins: Vec<PluginSlot>,
    editing_enabled: bool,
    config: GraphConfig,
    id_source: Box<dyn IdSource>,
}

impl WorkflowBuilder {
    pub fn new(scene: Scene, model: impl ModelSource + 'static) -> Self {
        Self {
            scene,
            model: Rc::new(model),
            plugins: Vec::new(),
            editing_enabled: true,
            config: GraphConfig::default(),
            id_source: Box::new(SequenceIdSource::default()),
        }
    }

    pub fn with_plugin<P: Plugin + 'static>(mut self, plugin: P) -> Self {
        let shared = Rc::new(RefCell::new(plugin));
        let instance: Rc<dyn Any> = shared.clone();
        self.plugins.push(PluginSlot {
            hooks: shared,
            instance,
        });
        self
    }

    pub fn with_editing_enabled(mut self, enabled: bool) -> Self {
        self.editing_enabled = enabled;
        self
    }

    pub fn with_config(mut self, config: GraphConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_id_source(mut self, id_source: impl IdSource + 'static) -> Self {
        self.id_source = Box::new(id_source);
        self
    }

    /// Prepares the scene root, hooks plugins up and draws the model.
    pub fn build(mut self) -> Result<Workflow, GraphError> {
        let svg_id = self.id_source.next_id();
        let mut scene = self.scene;
        let root = scene.root();
        scene.clear_children(root);
        scene.add_class(root, &svg_id);

        let parts = TemplateParser::parse_all(
            &mut scene,
            concat!(
                r#"<rect x="0" y="0" width="100%" height="100%" class="pan-handle" transform="matrix(1,0,0,1,0,0)"/>"#,
                r#"<g class="workflow" transform="matrix(1,0,0,1,0,0)"/>"#,
            ),
        )?;
        for part in &parts {
            scene.append_child(root, *part);
        }
        let pan_handle = scene
            .query(root, &Selector::class("pan-handle"))
            .ok_or_else(|| GraphError::MissingElement("pan-handle".to_string()))?;
        let workflow_group = scene
            .query(root, &Selector::class("workflow"))
            .ok_or_else(|| GraphError::MissingElement("workflow".to_string()))?;

        let core = Rc::new(WorkflowCore {
            scene: RefCell::new(scene),
            dom: RefCell::new(DomEvents::new()),
            hub: EventHub::new(GraphEvent::ALL),
            model: RefCell::new(self.model),
            view: Cell::new(ViewState {
                doc_scale: 1.0,
                label_scale: 1.0,
                editing_enabled: self.editing_enabled,
                destroyed: false,
                pending_first_draw: true,
            }),
            config: self.config,
            svg_id,
            workflow_group,
            pan_handle,
            plugins: self.plugins,
            disposers: RefCell::new(Vec::new()),
            pending: RefCell::new(VecDeque::new()),
        });
        let workflow = Workflow { core };

        let weak = workflow.downgrade();
        workflow
            .core
            .invoke_plugins("register_workflow", |p| p.register_workflow(weak.clone()));
        workflow.core.hook_plugins();

        debug!(id = %workflow.core.svg_id, plugins = workflow.core.plugins.len(), "workflow created");
        workflow.draw()?;
        Ok(workflow)
    }
}

/// Non-owning handle to a [`Workflow`], the form plugins keep.
#[derive(Clone)]
pub struct WeakWorkflow {
    core: Weak<WorkflowCore>,
}

impl WeakWorkflow {
    pub fn upgrade(&self) -> Option<Workflow> {
        self.core.upgrade().map(|core| Workflow { core })
    }
}

/// Renders a workflow model into a [`Scene`] and keeps it in sync.
///
/// After the first draw, each model mutation event patches just the affected
/// fragments. The workflow group's matrix is the single source of truth for
/// pan and zoom.
///
/// `Workflow` is a cheap, clonable handle. It is single-threaded: none of its
/// methods may be called from inside a gesture callback, which only ever gets
/// the scene.
#[derive(Clone)]
pub struct Workflow {
    core: Rc<WorkflowCore>,
}

impl Workflow {
    pub fn builder(scene: Scene, model: impl ModelSource + 'static) -> WorkflowBuilder {
        WorkflowBuilder::new(scene, model)
    }

    /// Shorthand for a workflow with no plugins and the default config.
    pub fn new(scene: Scene, model: impl ModelSource + 'static) -> Result<Self, GraphError> {
        Self::builder(scene, model).build()
    }

    /// A scene is drawable when its viewport has width.
    pub fn can_draw_in(scene: &Scene) -> bool {
        scene.viewport().width != 0.0
    }

    pub fn downgrade(&self) -> WeakWorkflow {
        WeakWorkflow {
            core: Rc::downgrade(&self.core),
        }
    }

    // --- Accessors ---

    pub fn scene(&self) -> Ref<'_, Scene> {
        self.core.scene.borrow()
    }

    pub fn scene_mut(&self) -> RefMut<'_, Scene> {
        self.core.scene.borrow_mut()
    }

    /// Gesture layer, for plugins that add their own drags.
    pub fn dom_events(&self) -> RefMut<'_, DomEvents> {
        self.core.dom.borrow_mut()
    }

    pub fn svg_id(&self) -> &str {
        &self.core.svg_id
    }

    /// The group carrying the pan and zoom matrix.
    pub fn workflow_group(&self) -> ElementId {
        self.core.workflow_group
    }

    pub fn pan_handle(&self) -> ElementId {
        self.core.pan_handle
    }

    pub fn config(&self) -> &GraphConfig {
        &self.core.config
    }

    pub fn model(&self) -> Rc<dyn ModelSource> {
        Rc::clone(&self.core.model.borrow())
    }

    pub fn scale(&self) -> f64 {
        self.core.view.get().doc_scale
    }

    pub fn label_scale(&self) -> f64 {
        self.core.view.get().label_scale
    }

    pub fn min_scale(&self) -> f64 {
        self.core.config.min_scale
    }

    pub fn max_scale(&self) -> f64 {
        self.core.config.max_scale
    }

    pub fn is_editing_enabled(&self) -> bool {
        self.core.view.get().editing_enabled
    }

    pub fn is_destroyed(&self) -> bool {
        self.core.is_destroyed()
    }

    /// Current matrix of the workflow group.
    pub fn transform(&self) -> Matrix {
        self.scene().local_transform(self.core.workflow_group)
    }

    // --- Drawing ---

    /// Redraws the bound model from scratch.
    pub fn draw(&self) -> Result<(), GraphError> {
        let model = self.model();
        self.core.draw(model)
    }

    /// Binds `model`, replacing the previous subscriptions, and redraws.
    pub fn draw_model(&self, model: impl ModelSource + 'static) -> Result<(), GraphError> {
        self.core.draw(Rc::new(model))
    }

    /// Rebuilds every edge from the model. Highlighted edges stay highlighted.
    pub fn redraw_edges(&self) -> Result<(), GraphError> {
        self.core.assert_not_destroyed("redraw_edges")?;
        let mut scene = self.core.scene.borrow_mut();
        self.core.redraw_edges(&mut scene);
        Ok(())
    }

    // --- Transform ---

    /// Zooms to `scale` keeping the screen point `(x, y)` in place.
    pub fn scale_at_point(&self, scale: f64, x: f64, y: f64) -> Result<(), GraphError> {
        self.core.assert_not_destroyed("scale_at_point")?;
        let mut scene = self.core.scene.borrow_mut();
        self.core.commit_scale(&mut scene, scale, x, y)
    }

    /// Zooms around the viewport center. The value is taken as is, without clamping.
    pub fn set_scale(&self, scale: f64) -> Result<(), GraphError> {
        self.core.assert_not_destroyed("set_scale")?;
        let mut scene = self.core.scene.borrow_mut();
        let center = scene.viewport().center();
        self.core.commit_scale(&mut scene, scale, center.x, center.y)
    }

    /// Scales the workflow down until it fits the viewport, then centers it.
    ///
    /// Never zooms in past 1. Unless `ignore_scale_limits` is set, never zooms
    /// out below the configured minimum.
    pub fn fit_to_viewport(&self, ignore_scale_limits: bool) -> Result<(), GraphError> {
        self.core.assert_not_destroyed("fit_to_viewport")?;
        let core = &self.core;
        let group = core.workflow_group;
        let mut scene = core.scene.borrow_mut();

        let client = scene.viewport();
        if client.width == 0.0 || client.height == 0.0 {
            return Err(GraphError::EmptyViewport {
                width: client.width,
                height: client.height,
            });
        }

        core.commit_scale(&mut scene, 1.0, 0.0, 0.0)?;
        let matrix = scene.local_transform(group);
        scene.set_transform(
            group,
            Matrix {
                e: 0.0,
                f: 0.0,
                ..matrix
            },
        );

        let bounds = scene.screen_bounds(group);
        let padding = core.config.fit_padding;
        let vertical = bounds.height / (client.height - padding).max(1.0);
        let horizontal = bounds.width / (client.width - padding).max(1.0);
        let factor = vertical.max(horizontal);

        let mut scale = if factor > 0.0 {
            (core.view.get().doc_scale / factor).min(1.0)
        } else {
            1.0
        };
        if !ignore_scale_limits {
            scale = scale.max(core.config.min_scale);
        }
        core.commit_scale(&mut scene, scale, 0.0, 0.0)?;

        let scaled = scene.screen_bounds(group);
        let move_x = client.left() - scaled.left() + (client.width - scaled.width).abs() / 2.0;
        let move_y = client.top() - scaled.top() + (client.height - scaled.height).abs() / 2.0;
        let matrix = scene.local_transform(group);
        scene.set_transform(
            group,
            Matrix {
                e: matrix.e + move_x,
                f: matrix.f + move_y,
                ..matrix
            },
        );

        debug!(scale, move_x, move_y, "fitted workflow to viewport");
        Ok(())
    }

    /// Back to the identity matrix at scale 1.
    pub fn reset_transform(&self) -> Result<(), GraphError> {
        self.core.assert_not_destroyed("reset_transform")?;
        let mut scene = self.core.scene.borrow_mut();
        scene.set_transform(self.core.workflow_group, Matrix::IDENTITY);
        self.core.commit_scale(&mut scene, 1.0, 0.0, 0.0)
    }

    /// Maps a screen point into the workflow group's coordinates.
    pub fn transform_screen_ctm_to_canvas(&self, x: f64, y: f64) -> Result<Point, GraphError> {
        let scene = self.core.scene.borrow();
        self.core.screen_to_canvas(&scene, x, y)
    }

    // --- Lifecycle ---

    /// Flips the editing flag and tells plugins. Enforcing it is up to them.
    pub fn enable_editing(&self, enabled: bool) -> Result<(), GraphError> {
        self.core.assert_not_destroyed("enable_editing")?;
        self.core.invoke_plugins("on_editable_state_change", |p| {
            p.on_editable_state_change(enabled)
        });
        self.core.update_view(|v| v.editing_enabled = enabled);
        Ok(())
    }

    /// Detaches everything and marks the workflow unusable.
    ///
    /// No callback from this instance runs afterwards, and every other mutating
    /// method fails with [`GraphError::Destroyed`].
    pub fn destroy(&self) -> Result<(), GraphError> {
        let core = &self.core;
        core.assert_not_destroyed("destroy")?;
        {
            let mut scene = core.scene.borrow_mut();
            let root = scene.root();
            scene.remove_class(root, &core.svg_id);
            core.clear_canvas(&mut scene);
        }
        core.hub.empty();
        core.invoke_plugins("destroy", |p| p.destroy());

        let disposers: Vec<Disposer> = core.disposers.borrow_mut().drain(..).collect();
        for disposer in disposers {
            disposer.dispose();
        }
        core.pending.borrow_mut().clear();
        core.update_view(|v| v.destroyed = true);
        debug!(id = %core.svg_id, "workflow destroyed");
        Ok(())
    }

    /// The first attached plugin of type `T`.
    pub fn get_plugin<T: Plugin + 'static>(&self) -> Option<Rc<RefCell<T>>> {
        self.core
            .plugins
            .iter()
            .find_map(|slot| Rc::clone(&slot.instance).downcast::<RefCell<T>>().ok())
    }

    // --- Events ---

    pub fn on(
        &self,
        event: GraphEvent,
        handler: impl Fn(&Value) + 'static,
    ) -> Result<HandlerId, GraphError> {
        self.core.assert_not_destroyed("on")?;
        self.core.hub.on(event, handler)
    }

    pub fn off(&self, event: GraphEvent, id: HandlerId) -> Result<bool, GraphError> {
        self.core.assert_not_destroyed("off")?;
        self.core.hub.off(event, id)
    }

    /// Publishes a lifecycle event on the hub.
    ///
    /// `afterRender` also runs every plugin's [`Plugin::after_render`] hook,
    /// after the hub subscribers.
    pub fn emit(&self, event: GraphEvent, payload: &Value) -> Result<usize, GraphError> {
        self.core.assert_not_destroyed("emit")?;
        let heard = self.core.hub.emit(event, payload)?;
        if event == GraphEvent::AfterRender {
            self.core
                .invoke_plugins("after_render", |plugin| plugin.after_render());
        }
        Ok(heard)
    }

    /// Feeds one pointer sample into the gesture layer.
    pub fn dispatch_pointer(&self, event: &PointerEvent) -> Result<(), GraphError> {
        self.core.assert_not_destroyed("dispatch_pointer")?;
        {
            let mut dom = self.core.dom.borrow_mut();
            let mut scene = self.core.scene.borrow_mut();
            dom.dispatch(&mut scene, event);
        }
        self.core.flush_model_events();
        Ok(())
    }

    /// The host resized the drawing surface.
    pub fn set_viewport(&self, viewport: Rect) -> Result<(), GraphError> {
        self.core.assert_not_destroyed("set_viewport")?;
        self.core.scene.borrow_mut().set_viewport(viewport);
        Ok(())
    }

    /// Nearest ancestor-or-self of `element` carrying `class`.
    pub fn find_parent(&self, element: ElementId, class: &str) -> Option<ElementId> {
        self.scene().closest_with_class(element, class)
    }
}

impl WorkflowCore {
    pub(crate) fn hub(&self) -> &EventHub<GraphEvent> {
        &self.hub
    }

    pub(crate) fn is_destroyed(&self) -> bool {
        self.view.get().destroyed
    }

    fn update_view(&self, f: impl FnOnce(&mut ViewState)) {
        let mut view = self.view.get();
        f(&mut view);
        self.view.set(view);
    }

    fn assert_not_destroyed(&self, method: &'static str) -> Result<(), GraphError> {
        if self.is_destroyed() {
            return Err(GraphError::Destroyed { method });
        }
        Ok(())
    }

    /// Runs `f` on every plugin in order. A plugin already running a hook is skipped.
    pub(crate) fn invoke_plugins(&self, hook: &'static str, f: impl Fn(&mut dyn Plugin)) {
        for slot in &self.plugins {
            match slot.hooks.try_borrow_mut() {
                Ok(mut plugin) => f(&mut *plugin),
                Err(_) => warn!(hook, "plugin is busy, skipping re-entrant hook"),
            }
        }
    }

    fn hook_plugins(self: &Rc<Self>) {
        let weak = Rc::downgrade(self);
        for slot in &self.plugins {
            let mut plugin = slot.hooks.borrow_mut();
            plugin.register_on_before_change(PluginHooks::new(weak.clone(), GraphEvent::BeforeChange));
            plugin.register_on_after_change(PluginHooks::new(weak.clone(), GraphEvent::AfterChange));
            plugin.register_on_after_render(PluginHooks::new(weak.clone(), GraphEvent::AfterRender));
        }
    }

    fn subscribe(self: &Rc<Self>, model: &Rc<dyn ModelSource>) {
        let disposers: Vec<Disposer> = ModelEventKind::ALL
            .into_iter()
            .map(|kind| {
                let weak = Rc::downgrade(self);
                let listener: ModelListener = Rc::new(move |event: &ModelEvent| {
                    if let Some(core) = weak.upgrade() {
                        core.enqueue_model_event(event);
                    }
                });
                model.on(kind, listener)
            })
            .collect();
        self.disposers.borrow_mut().extend(disposers);
    }

    fn draw(self: &Rc<Self>, model: Rc<dyn ModelSource>) -> Result<(), GraphError> {
        self.assert_not_destroyed("draw")?;

        let model_changed = self.model.borrow().identity() != model.identity();
        if model_changed || self.view.get().pending_first_draw {
            self.update_view(|v| v.pending_first_draw = false);

            let previous: Vec<Disposer> = self.disposers.borrow_mut().drain(..).collect();
            for disposer in previous {
                disposer.dispose();
            }
            self.pending.borrow_mut().clear();
            *self.model.borrow_mut() = Rc::clone(&model);
            self.subscribe(&model);
            self.invoke_plugins("after_model_change", |p| p.after_model_change());
        }

        {
            let mut scene = self.scene.borrow_mut();
            let group = self.workflow_group;
            let old_transform = scene.local_transform(group);

            self.clear_canvas(&mut scene);
            let rendered = self.render_nodes(&mut scene, &*model);
            self.redraw_edges(&mut scene);

            for node in scene.query_all(group, &Selector::class("node")) {
                scene.move_to_end(node);
            }
            self.add_event_listeners();

            scene.set_transform(group, old_transform);
            let scale = self.view.get().doc_scale;
            self.commit_scale(&mut scene, scale, 0.0, 0.0)?;
            debug!(nodes = rendered, version = scene.version(), "workflow drawn");
        }

        self.invoke_plugins("after_render", |p| p.after_render());
        self.hub.emit(GraphEvent::AfterRender, &Value::Null)?;
        self.flush_model_events();
        Ok(())
    }

    fn render_nodes(&self, scene: &mut Scene, model: &dyn ModelSource) -> usize {
        let steps = model.steps();
        let inputs = model.inputs();
        let outputs = model.outputs();
        let nodes = steps
            .iter()
            .map(NodeModel::Step)
            .chain(inputs.iter().map(NodeModel::Input))
            .chain(outputs.iter().map(NodeModel::Output))
            .filter(|node| node.is_visible());

        let mut rendered = 0;
        for node in nodes {
            if self.append_node(scene, node).is_some() {
                rendered += 1;
            }
        }
        rendered
    }

    fn append_node(&self, scene: &mut Scene, node: NodeModel<'_>) -> Option<ElementId> {
        let label_scale = self.view.get().label_scale;
        let markup =
            GraphNode::make_template_with_offset(node, label_scale, self.config.label_offset);
        match TemplateParser::parse(scene, &markup) {
            Ok(Some(element)) => {
                scene.append_child(self.workflow_group, element);
                Some(element)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(node_id = node.id(), error = %e, "skipping node that failed to render");
                None
            }
        }
    }

    fn redraw_edges(&self, scene: &mut Scene) {
        let group = self.workflow_group;
        let mut highlighted = AHashSet::new();
        for edge in scene.query_all(group, &Selector::class("edge")) {
            if scene.has_class(edge, "highlighted") {
                let source = scene.attribute(edge, "data-source-connection").unwrap_or_default();
                let destination = scene
                    .attribute(edge, "data-destination-connection")
                    .unwrap_or_default();
                highlighted.insert(format!("{}{}", source, destination));
            }
            scene.remove(edge);
        }

        let connections = self.model.borrow().connections();
        let view: &Scene = scene;
        let templates = connections
            .iter()
            .filter_map(|connection| {
                let states = if highlighted.contains(&connection.edge_key()) {
                    "highlighted"
                } else {
                    ""
                };
                match Edge::make_template(connection, view, group, states) {
                    Ok(markup) => Some((connection.edge_key(), markup)),
                    Err(defect) => {
                        warn!(%defect, "skipping edge");
                        None
                    }
                }
            })
            .collect_vec();

        let mut edges = Vec::with_capacity(templates.len());
        for (key, markup) in &templates {
            match TemplateParser::parse_all(scene, markup) {
                Ok(parsed) => edges.extend(parsed),
                Err(e) => warn!(edge = %key, error = %e, "edge markup could not be instantiated"),
            }
        }
        let first = scene.children(group).first().copied();
        for edge in &edges {
            scene.insert_before(group, *edge, first);
        }
        trace!(edges = edges.len(), "edges redrawn");
    }

    fn clear_canvas(&self, scene: &mut Scene) {
        self.dom.borrow_mut().detach_all();
        let group = self.workflow_group;
        scene.clear_children(group);
        scene.set_transform(group, Matrix::IDENTITY);
        scene.set_attribute(group, "class", "workflow");
    }

    /// Canvas panning and bring-to-front on hover.
    fn add_event_listeners(&self) {
        let group = self.workflow_group;
        let mut dom = self.dom.borrow_mut();

        let start = Rc::new(Cell::new(Point::ORIGIN));
        let captured = Rc::clone(&start);
        dom.drag(
            Selector::class("pan-handle"),
            move |scene, dx, dy, _| {
                let origin = start.get();
                let matrix = scene.local_transform(group);
                scene.set_transform(
                    group,
                    Matrix {
                        e: origin.x + dx,
                        f: origin.y + dy,
                        ..matrix
                    },
                );
            },
            move |scene, _, _| {
                let matrix = scene.local_transform(group);
                captured.set(Point::new(matrix.e, matrix.f));
            },
            |_, _, _| {},
        );

        let dragged_edge = Selector::new(Compound::new().class("edge").class("dragged"));
        dom.on(
            PointerKind::Over,
            Some(Selector::class("node")),
            move |scene, _, node| {
                if scene.query(group, &dragged_edge).is_some() {
                    return;
                }
                scene.move_to_end(node);
            },
        );
    }

    fn screen_to_canvas(&self, scene: &Scene, x: f64, y: f64) -> Result<Point, GraphError> {
        let inverse = scene
            .screen_ctm(self.workflow_group)
            .inverse()
            .ok_or(GraphError::SingularTransform)?;
        Ok(inverse.apply(Point::new(x, y)))
    }

    /// Sets the zoom level so that the screen point `(x, y)` stays put.
    ///
    /// Node labels get the compensating label scale on their own matrices.
    fn commit_scale(&self, scene: &mut Scene, scale: f64, x: f64, y: f64) -> Result<(), GraphError> {
        let group = self.workflow_group;
        let coords = self.screen_to_canvas(scene, x, y)?;
        let current = scene.local_transform(group);

        let next = Matrix {
            a: scale,
            d: scale,
            e: current.e + current.a * coords.x - scale * coords.x,
            f: current.f + current.a * coords.y - scale * coords.y,
            ..current
        };
        scene.set_transform(group, next);

        let label_scale = 1.0 + (1.0 - scale) / (scale * 2.0);
        let labels = Selector::class("node").descendant(Compound::new().class("label"));
        for label in scene.query_all(group, &labels) {
            let matrix = scene.local_transform(label);
            scene.set_transform(
                label,
                Matrix {
                    a: label_scale,
                    d: label_scale,
                    ..matrix
                },
            );
        }

        self.update_view(|v| {
            v.doc_scale = scale;
            v.label_scale = label_scale;
        });
        trace!(scale, label_scale, "scale committed");
        Ok(())
    }

    // --- Model events ---

    fn enqueue_model_event(&self, event: &ModelEvent) {
        if self.is_destroyed() {
            return;
        }
        self.pending.borrow_mut().push_back(event.clone());
        self.flush_model_events();
    }

    /// Applies queued model events. Events arriving while the scene is busy
    /// wait here until the current borrow ends.
    fn flush_model_events(&self) {
        loop {
            let Ok(mut scene) = self.scene.try_borrow_mut() else {
                trace!("scene busy, deferring model events");
                return;
            };
            let Some(event) = self.pending.borrow_mut().pop_front() else {
                return;
            };
            self.apply_model_event(&mut scene, &event);
        }
    }

    fn apply_model_event(&self, scene: &mut Scene, event: &ModelEvent) {
        let group = self.workflow_group;
        trace!(event = %event.kind(), "model event");
        match event {
            ModelEvent::StepChange(step) => {
                let selector = node_selector("step", "data-id", &step.id)
                    .descendant(Compound::new().class("title"));
                if let Some(title) = scene.query(group, &selector) {
                    scene.set_text(title, step.label_or_id());
                }
            }
            ModelEvent::StepCreate(step) => {
                if step.is_visible() {
                    let mut step = step.clone();
                    step.normalize();
                    self.append_node(scene, NodeModel::Step(&step));
                }
            }
            ModelEvent::StepRemove(step) => {
                self.remove_node(scene, node_selector("step", "data-connection-id", &step.id));
            }
            ModelEvent::InputCreate(input) => {
                if input.is_visible() {
                    self.append_node(scene, NodeModel::Input(input));
                }
            }
            ModelEvent::InputRemove(input) => {
                if input.is_visible() {
                    self.remove_node(
                        scene,
                        node_selector("input", "data-connection-id", input.connection_id()),
                    );
                }
            }
            ModelEvent::OutputCreate(output) => {
                if output.is_visible() {
                    self.append_node(scene, NodeModel::Output(output));
                }
            }
            ModelEvent::OutputRemove(output) => {
                if output.is_visible() {
                    self.remove_node(
                        scene,
                        node_selector("output", "data-connection-id", output.connection_id()),
                    );
                }
            }
            ModelEvent::InPortShow { port, step } => {
                self.update_step(scene, step);
                self.restore_edges_to(scene, &port.connection_id);
            }
            ModelEvent::OutPortCreate { step, .. } => {
                self.update_step(scene, step);
            }
            ModelEvent::InPortHide { port, step } => {
                self.update_step(scene, step);
                self.remove_edges_at(scene, "data-destination-connection", &port.connection_id);
            }
            ModelEvent::OutPortRemove { port, step } => {
                self.update_step(scene, step);
                self.remove_edges_at(scene, "data-source-connection", &port.connection_id);
            }
            ModelEvent::ConnectionCreate {
                source,
                destination,
            } => {
                if !source.is_visible() || !destination.is_visible() {
                    return;
                }
                if let Err(defect) =
                    Edge::spawn_between_connection_ids(scene, group, &source.id, &destination.id)
                {
                    warn!(%defect, "could not draw new connection");
                }
            }
            ModelEvent::ConnectionRemove {
                source,
                destination,
            } => {
                if !source.is_visible() || !destination.is_visible() {
                    return;
                }
                match Edge::find_edge(scene, group, &source.id, &destination.id) {
                    Some(edge) => {
                        scene.remove(edge);
                    }
                    None => trace!(
                        source = %source.id,
                        destination = %destination.id,
                        "no edge to remove"
                    ),
                }
            }
        }
    }

    fn remove_node(&self, scene: &mut Scene, selector: Selector) {
        match scene.query(self.workflow_group, &selector) {
            Some(node) => {
                scene.remove(node);
            }
            None => warn!(selector = %selector, "node to remove is not rendered"),
        }
    }

    fn update_step(&self, scene: &mut Scene, step: &crate::model::StepModel) {
        let selector = node_selector("step", "data-connection-id", &step.id);
        let Some(element) = scene.query(self.workflow_group, &selector) else {
            warn!(node_id = %step.id, "step to update is not rendered");
            return;
        };
        let label_scale = self.view.get().label_scale;
        let node = StepNode::new(element, step.clone());
        if let Err(defect) = node.update_with_offset(scene, label_scale, self.config.label_offset) {
            warn!(node_id = %step.id, %defect, "step update failed");
        }
    }

    /// Redraws the model's visible connections ending at `connection_id`.
    fn restore_edges_to(&self, scene: &mut Scene, connection_id: &str) {
        let connections = self.model.borrow().connections();
        for connection in connections
            .iter()
            .filter(|c| c.is_visible() && c.destination.id == connection_id)
        {
            if let Err(defect) = Edge::spawn_between_connection_ids(
                scene,
                self.workflow_group,
                &connection.source.id,
                &connection.destination.id,
            ) {
                warn!(%defect, "could not restore edge to shown port");
            }
        }
    }

    fn remove_edges_at(&self, scene: &mut Scene, attribute: &str, connection_id: &str) {
        let selector = Selector::new(Compound::new().class("edge").attr(attribute, connection_id));
        for edge in scene.query_all(self.workflow_group, &selector) {
            scene.remove(edge);
        }
    }
}

/// `.node.<kind>[<attribute>="<value>"]`
fn node_selector(kind: &str, attribute: &str, value: &str) -> Selector {
    Selector::new(
        Compound::new()
            .class("node")
            .class(kind)
            .attr(attribute, value),
    )
}
