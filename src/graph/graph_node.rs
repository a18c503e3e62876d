use crate::geometry::{Matrix, Point};
use crate::graph::connectable::{Connectable, PortSide};
use crate::model::{InputModel, OutputModel, ParameterType, PortModel, StepModel};
use crate::scene::{escape_attribute, escape_text};
use itertools::Itertools;

/// Base radius of a node with no ports.
pub const NODE_RADIUS: f64 = 30.0;
/// Extra radius per port on the busier side, also the port handle spacing.
pub const PORT_RADIUS: f64 = 5.0;
/// Vertical distance of the title from the node's rim.
pub const DEFAULT_LABEL_OFFSET: f64 = 30.0;

const PORT_ARC_DEGREES: f64 = 140.0;

/// Visual category of a node fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Step,
    Input,
    Output,
}

impl NodeKind {
    pub fn class(&self) -> &'static str {
        match self {
            NodeKind::Step => "step",
            NodeKind::Input => "input",
            NodeKind::Output => "output",
        }
    }
}

/// Borrowed view of anything that renders as a node.
#[derive(Debug, Clone, Copy)]
pub enum NodeModel<'a> {
    Step(&'a StepModel),
    Input(&'a InputModel),
    Output(&'a OutputModel),
}

impl<'a> NodeModel<'a> {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeModel::Step(_) => NodeKind::Step,
            NodeModel::Input(_) => NodeKind::Input,
            NodeModel::Output(_) => NodeKind::Output,
        }
    }

    pub fn id(&self) -> &'a str {
        match *self {
            NodeModel::Step(s) => &s.id,
            NodeModel::Input(i) => &i.id,
            NodeModel::Output(o) => &o.id,
        }
    }

    pub fn label_or_id(&self) -> &'a str {
        match *self {
            NodeModel::Step(s) => s.label_or_id(),
            NodeModel::Input(i) => i.label_or_id(),
            NodeModel::Output(o) => o.label_or_id(),
        }
    }

    pub fn position(&self) -> Point {
        let position = match self {
            NodeModel::Step(s) => s.position,
            NodeModel::Input(i) => i.position,
            NodeModel::Output(o) => o.position,
        };
        position.unwrap_or(Point::ORIGIN)
    }

    pub fn param_type(&self) -> Option<&'a ParameterType> {
        match *self {
            NodeModel::Step(_) => None,
            NodeModel::Input(i) => i.param_type.as_ref(),
            NodeModel::Output(o) => o.param_type.as_ref(),
        }
    }
}

impl Connectable for NodeModel<'_> {
    fn connection_id(&self) -> &str {
        match self {
            NodeModel::Step(s) => s.connection_id(),
            NodeModel::Input(i) => i.connection_id(),
            NodeModel::Output(o) => o.connection_id(),
        }
    }

    fn is_visible(&self) -> bool {
        match self {
            NodeModel::Step(s) => s.is_visible(),
            NodeModel::Input(i) => i.is_visible(),
            NodeModel::Output(o) => o.is_visible(),
        }
    }
}

/// The ports a node fragment draws on each side.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PortLayout {
    pub inputs: Vec<PortModel>,
    pub outputs: Vec<PortModel>,
}

impl PortLayout {
    /// Visible ports of one side, in drawing order (descending port id).
    pub fn visible(&self, side: PortSide) -> Vec<&PortModel> {
        let ports = match side {
            PortSide::In => &self.inputs,
            PortSide::Out => &self.outputs,
        };
        ports
            .iter()
            .filter(|p| p.visible)
            .sorted_by(|a, b| b.id.cmp(&a.id))
            .collect()
    }

    /// Radius that leaves room for the busier side.
    pub fn radius(&self) -> f64 {
        let max_ports = self
            .visible(PortSide::In)
            .len()
            .max(self.visible(PortSide::Out).len());
        NODE_RADIUS + max_ports as f64 * PORT_RADIUS
    }
}

/// Renders step, input and output nodes to markup.
pub struct GraphNode;

impl GraphNode {
    /// Port layout of a node.
    ///
    /// Workflow inputs get a single output port and workflow outputs a single
    /// input port, both carrying the node's own connection id, so edges can
    /// attach to them like to any step port.
    pub fn patch_model_ports(model: NodeModel<'_>) -> PortLayout {
        let own_port = |id: &str, connection_id: &str| PortModel {
            id: id.to_string(),
            label: None,
            visible: true,
            connection_id: connection_id.to_string(),
        };
        match model {
            NodeModel::Step(step) => PortLayout {
                inputs: step.inputs.clone(),
                outputs: step.outputs.clone(),
            },
            NodeModel::Input(input) => PortLayout {
                inputs: Vec::new(),
                outputs: vec![own_port(&input.id, input.connection_id())],
            },
            NodeModel::Output(output) => PortLayout {
                inputs: vec![own_port(&output.id, output.connection_id())],
                outputs: Vec::new(),
            },
        }
    }

    pub fn make_template(model: NodeModel<'_>, label_scale: f64) -> String {
        Self::make_template_with_offset(model, label_scale, DEFAULT_LABEL_OFFSET)
    }

    /// Markup of a whole node fragment, positioned at the model's coordinates.
    pub fn make_template_with_offset(
        model: NodeModel<'_>,
        label_scale: f64,
        label_offset: f64,
    ) -> String {
        let layout = Self::patch_model_ports(model);
        let radius = layout.radius();
        let position = model.position();

        let mut classes = vec!["node".to_string(), model.kind().class().to_string()];
        if let Some(param_type) = model.param_type() {
            classes.push(format!("type-{}", param_type.type_name));
            if let Some(items) = &param_type.items {
                classes.push(format!("items-{}", items));
            }
        }

        let transform = Matrix::translation(position.x.trunc(), position.y.trunc());
        let title_transform = Self::title_matrix(radius, label_scale, label_offset);

        let ports = [PortSide::In, PortSide::Out]
            .into_iter()
            .flat_map(|side| {
                let visible = layout.visible(side);
                let total = visible.len();
                visible
                    .into_iter()
                    .enumerate()
                    .map(move |(i, port)| {
                        Self::make_port_template(
                            port,
                            side,
                            &Self::create_port_matrix(total, i, radius, side),
                        )
                    })
                    .collect::<Vec<_>>()
            })
            .join("");

        format!(
            concat!(
                r#"<g tabindex="-1" class="{classes}" data-connection-id="{connection_id}" "#,
                r#"transform="{transform}" data-id="{id}">"#,
                r#"<g class="core" transform="matrix(1,0,0,1,0,0)">"#,
                r#"<circle cx="0" cy="0" r="{outer}" class="outer"/>"#,
                r#"<circle cx="0" cy="0" r="{inner}" class="inner"/>"#,
                "{icon}</g>",
                r#"<text transform="{title_transform}" class="title label">{label}</text>"#,
                "{ports}</g>"
            ),
            classes = escape_attribute(&classes.join(" ")),
            connection_id = escape_attribute(model.connection_id()),
            transform = transform.to_transform_attr(),
            id = escape_attribute(model.id()),
            outer = fmt_len(radius),
            inner = fmt_len(radius * 0.75),
            icon = Self::make_icon_fragment(model),
            title_transform = title_transform.to_transform_attr(),
            label = escape_text(model.label_or_id()),
            ports = ports,
        )
    }

    /// Markup of a single port group. The transform places it on the node's rim.
    pub fn make_port_template(port: &PortModel, side: PortSide, transform: &Matrix) -> String {
        format!(
            concat!(
                r#"<g class="port {class}" transform="{transform}" "#,
                r#"data-connection-id="{connection_id}" data-port-id="{port_id}">"#,
                r#"<g class="io-port"><circle cx="0" cy="0" r="7" class="port-handle"/></g>"#,
                r#"<text x="0" y="0" transform="matrix(1,0,0,1,0,0)" class="label unselectable">{label}</text>"#,
                "</g>"
            ),
            class = side.port_class(),
            transform = transform.to_transform_attr(),
            connection_id = escape_attribute(&port.connection_id),
            port_id = escape_attribute(&port.id),
            label = escape_text(port.label.as_deref().unwrap_or(&port.id)),
        )
    }

    /// Places port `index` of `total` on a 140 degree arc around the node.
    ///
    /// Outputs fan out on the right from top to bottom, inputs on the left from
    /// bottom to top. The counter-rotation keeps the port group itself upright.
    pub fn create_port_matrix(total: usize, index: usize, radius: f64, side: PortSide) -> Matrix {
        let step = (index + 1) as f64 * PORT_ARC_DEGREES / (total + 1) as f64;
        let angle = match side {
            PortSide::Out => -PORT_ARC_DEGREES / 2.0 + step,
            PortSide::In => 180.0 + PORT_ARC_DEGREES / 2.0 - step,
        };
        Matrix::identity()
            .rotate(angle)
            .translate(radius, 0.0)
            .rotate(-angle)
    }

    pub fn title_matrix(radius: f64, label_scale: f64, label_offset: f64) -> Matrix {
        Matrix::new(label_scale, 0.0, 0.0, label_scale, 0.0, radius + label_offset)
    }

    fn make_icon_fragment(model: NodeModel<'_>) -> String {
        let icon = match model {
            NodeModel::Step(step) => {
                match step.run.as_ref().and_then(|r| r.class.as_deref()) {
                    Some("Workflow") => Some(NodeIcon::Workflow),
                    Some("CommandLineTool") => Some(NodeIcon::Tool),
                    _ => None,
                }
            }
            NodeModel::Input(input) => input.param_type.as_ref().map(|t| {
                if t.is_file_like() {
                    NodeIcon::FileInput
                } else {
                    NodeIcon::Input
                }
            }),
            NodeModel::Output(output) => output.param_type.as_ref().map(|t| {
                if t.is_file_like() {
                    NodeIcon::FileOutput
                } else {
                    NodeIcon::Output
                }
            }),
        };
        icon.map(NodeIcon::markup).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy)]
enum NodeIcon {
    Workflow,
    Tool,
    FileInput,
    FileOutput,
    Input,
    Output,
}

impl NodeIcon {
    fn name(self) -> &'static str {
        match self {
            NodeIcon::Workflow => "workflow",
            NodeIcon::Tool => "tool",
            NodeIcon::FileInput => "file-input",
            NodeIcon::FileOutput => "file-output",
            NodeIcon::Input => "input",
            NodeIcon::Output => "output",
        }
    }

    /// Glyph outline, drawn in a 20x20 box centered on the node.
    fn path(self) -> &'static str {
        match self {
            NodeIcon::Workflow => "M -6 0 L 6 -6 M -6 0 L 6 6 M -9 -3 L -3 -3 L -3 3 L -9 3 Z",
            NodeIcon::Tool => "M -9 -7 L -3 0 L -9 7 M 0 7 L 9 7",
            NodeIcon::FileInput => "M -9 0 L 2 0 M -2 -4 L 2 0 L -2 4 M 0 -9 L 9 -9 L 9 9 L 0 9",
            NodeIcon::FileOutput => "M -9 -9 L 0 -9 M -9 -9 L -9 9 L 0 9 M -2 0 L 9 0 M 5 -4 L 9 0 L 5 4",
            NodeIcon::Input => "M -9 0 L 3 0 M -1 -4 L 3 0 L -1 4",
            NodeIcon::Output => "M -3 0 L 9 0 M 5 -4 L 9 0 L 5 4",
        }
    }

    fn markup(self) -> String {
        format!(
            r#"<g class="node-icon icon-{}"><path d="{}"/></g>"#,
            self.name(),
            self.path()
        )
    }
}

fn fmt_len(value: f64) -> String {
    crate::geometry::matrix::format_number(value)
}
