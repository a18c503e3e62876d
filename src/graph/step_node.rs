use super::connectable::PortSide;
use super::graph_node::{DEFAULT_LABEL_OFFSET, GraphNode, NodeModel};
use crate::error::RenderDefect;
use crate::model::StepModel;
use crate::scene::{Compound, ElementId, Scene, ScenePatch, Selector, TemplateParser};
use tracing::{trace, warn};

/// A rendered step fragment paired with the model it should reflect.
pub struct StepNode {
    element: ElementId,
    model: StepModel,
}

impl StepNode {
    pub fn new(element: ElementId, model: StepModel) -> Self {
        Self { element, model }
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn model(&self) -> &StepModel {
        &self.model
    }

    pub fn update(&self, scene: &mut Scene, label_scale: f64) -> Result<(), RenderDefect> {
        self.update_with_offset(scene, label_scale, DEFAULT_LABEL_OFFSET)
    }

    /// Brings the fragment in line with the model's ports and label.
    ///
    /// Port fragments the model no longer shows are dropped, missing ones are
    /// instantiated, and every remaining port is laid out again for the new
    /// radius. Ports that survive keep their element, so anything a plugin hung
    /// on them stays attached.
    pub fn update_with_offset(
        &self,
        scene: &mut Scene,
        label_scale: f64,
        label_offset: f64,
    ) -> Result<(), RenderDefect> {
        if !scene.contains(self.element) {
            return Err(RenderDefect::NodeNotFound(self.model.id.clone()));
        }

        let node = NodeModel::Step(&self.model);
        let layout = GraphNode::patch_model_ports(node);
        let radius = layout.radius();

        let mut patches = Vec::new();
        for side in [PortSide::In, PortSide::Out] {
            let rendered = scene.query_all(
                self.element,
                &Selector::new(Compound::new().class("port").class(side.port_class())),
            );
            let wanted = layout.visible(side);
            let total = wanted.len();

            for &existing in &rendered {
                let still_wanted = scene
                    .attribute(existing, "data-port-id")
                    .is_some_and(|id| wanted.iter().any(|p| p.id == id));
                if !still_wanted {
                    patches.push(ScenePatch::Remove(existing));
                }
            }

            for (index, port) in wanted.into_iter().enumerate() {
                let matrix = GraphNode::create_port_matrix(total, index, radius, side);
                let existing = rendered
                    .iter()
                    .copied()
                    .find(|&el| scene.attribute(el, "data-port-id") == Some(port.id.as_str()));
                match existing {
                    Some(element) => patches.push(ScenePatch::SetTransform {
                        element,
                        transform: matrix,
                    }),
                    None => {
                        let markup = GraphNode::make_port_template(port, side, &matrix);
                        let Some(child) = TemplateParser::parse(scene, &markup)? else {
                            continue;
                        };
                        patches.push(ScenePatch::Append {
                            parent: self.element,
                            child,
                        });
                    }
                }
            }
        }

        for (class, r) in [("outer", radius), ("inner", radius * 0.75)] {
            let selector = Selector::class("core").descendant(Compound::new().class(class));
            if let Some(circle) = scene.query(self.element, &selector) {
                patches.push(ScenePatch::SetAttribute {
                    element: circle,
                    name: "r".to_string(),
                    value: crate::geometry::matrix::format_number(r),
                });
            }
        }

        match scene.query(self.element, &Selector::class("title")) {
            Some(title) => {
                patches.push(ScenePatch::SetTransform {
                    element: title,
                    transform: GraphNode::title_matrix(radius, label_scale, label_offset),
                });
                patches.push(ScenePatch::SetText {
                    element: title,
                    text: self.model.label_or_id().to_string(),
                });
            }
            None => warn!(node_id = %self.model.id, "step fragment has no title"),
        }

        trace!(node_id = %self.model.id, patches = patches.len(), "updating step fragment");
        scene.apply_all(patches);
        Ok(())
    }
}
