use crate::geometry::Point;
use crate::graph::connectable::{Connectable, ConnectionId, PortSide};
use serde::{Deserialize, Serialize};

fn visible_by_default() -> bool {
    true
}

/// A named attachment point on a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortModel {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default = "visible_by_default")]
    pub visible: bool,
    #[serde(skip)]
    pub connection_id: String,
}

impl PortModel {
    pub fn new(side: PortSide, step_id: &str, port_id: &str) -> Self {
        Self {
            id: port_id.to_string(),
            label: None,
            visible: true,
            connection_id: ConnectionId::new(side, step_id, port_id).to_string(),
        }
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }
}

impl Connectable for PortModel {
    fn connection_id(&self) -> &str {
        &self.connection_id
    }

    fn is_visible(&self) -> bool {
        self.visible
    }
}

/// What a step executes; only used to pick an icon and as a position fallback.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RunModel {
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub position: Option<Point>,
}

/// An executable unit of the workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepModel {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(rename = "in", default)]
    pub inputs: Vec<PortModel>,
    #[serde(rename = "out", default)]
    pub outputs: Vec<PortModel>,
    #[serde(default)]
    pub position: Option<Point>,
    #[serde(default)]
    pub run: Option<RunModel>,
    #[serde(default = "visible_by_default")]
    pub visible: bool,
}

impl StepModel {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            label: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
            position: None,
            run: None,
            visible: true,
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn with_input(mut self, port_id: &str) -> Self {
        self.inputs.push(PortModel::new(PortSide::In, &self.id, port_id));
        self
    }

    pub fn with_hidden_input(mut self, port_id: &str) -> Self {
        self.inputs
            .push(PortModel::new(PortSide::In, &self.id, port_id).hidden());
        self
    }

    pub fn with_output(mut self, port_id: &str) -> Self {
        self.outputs.push(PortModel::new(PortSide::Out, &self.id, port_id));
        self
    }

    pub fn with_run_class(mut self, class: &str) -> Self {
        self.run.get_or_insert_with(RunModel::default).class = Some(class.to_string());
        self
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Some(Point::new(x, y));
        self
    }

    pub fn label_or_id(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }

    pub fn input(&self, port_id: &str) -> Option<&PortModel> {
        self.inputs.iter().find(|p| p.id == port_id)
    }

    pub fn output(&self, port_id: &str) -> Option<&PortModel> {
        self.outputs.iter().find(|p| p.id == port_id)
    }

    /// Fills in port connection ids and moves a position recorded on `run` onto the step.
    pub(crate) fn normalize(&mut self) {
        for port in &mut self.inputs {
            port.connection_id = ConnectionId::new(PortSide::In, &self.id, &port.id).to_string();
        }
        for port in &mut self.outputs {
            port.connection_id = ConnectionId::new(PortSide::Out, &self.id, &port.id).to_string();
        }
        if self.position.is_none() {
            if let Some(run) = self.run.as_mut() {
                self.position = run.position.take();
            }
        }
    }
}

impl Connectable for StepModel {
    fn connection_id(&self) -> &str {
        &self.id
    }

    fn is_visible(&self) -> bool {
        self.visible
    }
}

/// Declared type of a workflow parameter, e.g. `File` or `array` of `File`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterType {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub items: Option<String>,
}

impl ParameterType {
    pub fn new(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            items: None,
        }
    }

    pub fn array_of(items: &str) -> Self {
        Self {
            type_name: "array".to_string(),
            items: Some(items.to_string()),
        }
    }

    /// A file or an array of files.
    pub fn is_file_like(&self) -> bool {
        self.type_name == "File"
            || (self.type_name == "array" && self.items.as_deref() == Some("File"))
    }
}

/// Shared shape of workflow inputs and outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterModel {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(rename = "type", default)]
    pub param_type: Option<ParameterType>,
    #[serde(default)]
    pub position: Option<Point>,
    #[serde(default = "visible_by_default")]
    pub visible: bool,
    #[serde(skip)]
    pub connection_id: String,
}

impl ParameterModel {
    fn new(id: &str, side: PortSide) -> Self {
        Self {
            id: id.to_string(),
            label: None,
            param_type: None,
            position: None,
            visible: true,
            connection_id: ConnectionId::new(side, id, id).to_string(),
        }
    }

    pub fn label_or_id(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }
}

/// A parameter the workflow receives. Its connection id sits on the `out` side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputModel(pub ParameterModel);

/// A result the workflow produces. Its connection id sits on the `in` side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputModel(pub ParameterModel);

macro_rules! parameter_builders {
    ($name:ident, $side:expr) => {
        impl $name {
            pub fn new(id: &str) -> Self {
                Self(ParameterModel::new(id, $side))
            }

            pub fn with_label(mut self, label: &str) -> Self {
                self.0.label = Some(label.to_string());
                self
            }

            pub fn with_type(mut self, param_type: ParameterType) -> Self {
                self.0.param_type = Some(param_type);
                self
            }

            pub fn hidden(mut self) -> Self {
                self.0.visible = false;
                self
            }

            pub fn at(mut self, x: f64, y: f64) -> Self {
                self.0.position = Some(Point::new(x, y));
                self
            }

            pub(crate) fn normalize(&mut self) {
                self.0.connection_id = ConnectionId::new($side, &self.0.id, &self.0.id).to_string();
            }
        }

        impl std::ops::Deref for $name {
            type Target = ParameterModel;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl Connectable for $name {
            fn connection_id(&self) -> &str {
                &self.0.connection_id
            }

            fn is_visible(&self) -> bool {
                self.0.visible
            }
        }
    };
}

parameter_builders!(InputModel, PortSide::Out);
parameter_builders!(OutputModel, PortSide::In);

/// What kind of port a connection endpoint resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndpointKind {
    StepInput,
    StepOutput,
    WorkflowInput,
    WorkflowOutput,
}

/// One end of a connection, resolved against the current model.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub id: String,
    pub kind: EndpointKind,
    pub visible: bool,
}

impl Connectable for Endpoint {
    fn connection_id(&self) -> &str {
        &self.id
    }

    fn is_visible(&self) -> bool {
        self.visible
    }
}

/// A directed data-flow link between two endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionModel {
    pub source: Endpoint,
    pub destination: Endpoint,
}

impl ConnectionModel {
    pub fn is_visible(&self) -> bool {
        self.source.visible && self.destination.visible
    }

    /// Key used to recognise the same edge across redraws.
    pub fn edge_key(&self) -> String {
        format!("{}{}", self.source.id, self.destination.id)
    }
}
