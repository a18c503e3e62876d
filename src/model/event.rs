use super::definition::{Endpoint, InputModel, OutputModel, PortModel, StepModel};
use std::fmt;

/// Mutation notifications a workflow model publishes.
///
/// Payloads are owned snapshots taken right after the mutation, so a listener
/// never needs to call back into the model to see the new state.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelEvent {
    StepChange(StepModel),
    StepCreate(StepModel),
    StepRemove(StepModel),
    InputCreate(InputModel),
    InputRemove(InputModel),
    OutputCreate(OutputModel),
    OutputRemove(OutputModel),
    InPortShow { port: PortModel, step: StepModel },
    InPortHide { port: PortModel, step: StepModel },
    OutPortCreate { port: PortModel, step: StepModel },
    OutPortRemove { port: PortModel, step: StepModel },
    ConnectionCreate { source: Endpoint, destination: Endpoint },
    ConnectionRemove { source: Endpoint, destination: Endpoint },
}

impl ModelEvent {
    pub fn kind(&self) -> ModelEventKind {
        match self {
            ModelEvent::StepChange(_) => ModelEventKind::StepChange,
            ModelEvent::StepCreate(_) => ModelEventKind::StepCreate,
            ModelEvent::StepRemove(_) => ModelEventKind::StepRemove,
            ModelEvent::InputCreate(_) => ModelEventKind::InputCreate,
            ModelEvent::InputRemove(_) => ModelEventKind::InputRemove,
            ModelEvent::OutputCreate(_) => ModelEventKind::OutputCreate,
            ModelEvent::OutputRemove(_) => ModelEventKind::OutputRemove,
            ModelEvent::InPortShow { .. } => ModelEventKind::InPortShow,
            ModelEvent::InPortHide { .. } => ModelEventKind::InPortHide,
            ModelEvent::OutPortCreate { .. } => ModelEventKind::OutPortCreate,
            ModelEvent::OutPortRemove { .. } => ModelEventKind::OutPortRemove,
            ModelEvent::ConnectionCreate { .. } => ModelEventKind::ConnectionCreate,
            ModelEvent::ConnectionRemove { .. } => ModelEventKind::ConnectionRemove,
        }
    }
}

/// Subscription key for [`ModelEvent`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelEventKind {
    StepChange,
    StepCreate,
    StepRemove,
    InputCreate,
    InputRemove,
    OutputCreate,
    OutputRemove,
    InPortShow,
    InPortHide,
    OutPortCreate,
    OutPortRemove,
    ConnectionCreate,
    ConnectionRemove,
}

impl ModelEventKind {
    pub const ALL: [ModelEventKind; 13] = [
        ModelEventKind::StepChange,
        ModelEventKind::StepCreate,
        ModelEventKind::StepRemove,
        ModelEventKind::InputCreate,
        ModelEventKind::InputRemove,
        ModelEventKind::OutputCreate,
        ModelEventKind::OutputRemove,
        ModelEventKind::InPortShow,
        ModelEventKind::InPortHide,
        ModelEventKind::OutPortCreate,
        ModelEventKind::OutPortRemove,
        ModelEventKind::ConnectionCreate,
        ModelEventKind::ConnectionRemove,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ModelEventKind::StepChange => "step.change",
            ModelEventKind::StepCreate => "step.create",
            ModelEventKind::StepRemove => "step.remove",
            ModelEventKind::InputCreate => "input.create",
            ModelEventKind::InputRemove => "input.remove",
            ModelEventKind::OutputCreate => "output.create",
            ModelEventKind::OutputRemove => "output.remove",
            ModelEventKind::InPortShow => "step.inPort.show",
            ModelEventKind::InPortHide => "step.inPort.hide",
            ModelEventKind::OutPortCreate => "step.outPort.create",
            ModelEventKind::OutPortRemove => "step.outPort.remove",
            ModelEventKind::ConnectionCreate => "connection.create",
            ModelEventKind::ConnectionRemove => "connection.remove",
        }
    }
}

impl fmt::Display for ModelEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
