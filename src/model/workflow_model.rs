use super::definition::{
    ConnectionModel, Endpoint, EndpointKind, InputModel, OutputModel, PortModel, StepModel,
};
use super::document::{ConnectionDefinition, IntoWorkflow, WorkflowDocument};
use super::event::{ModelEvent, ModelEventKind};
use super::source::{Disposer, ModelListener, ModelSource};
use crate::error::ModelError;
use crate::graph::connectable::{ConnectionId, PortSide};
use ahash::AHashMap;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::debug;

#[derive(Default)]
struct ModelState {
    steps: Vec<StepModel>,
    inputs: Vec<InputModel>,
    outputs: Vec<OutputModel>,
    connections: Vec<(String, String)>,
}

impl ModelState {
    fn step(&self, id: &str) -> Result<&StepModel, ModelError> {
        self.steps
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| ModelError::NodeNotFound(id.to_string()))
    }

    fn step_mut(&mut self, id: &str) -> Result<&mut StepModel, ModelError> {
        self.steps
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| ModelError::NodeNotFound(id.to_string()))
    }

    fn resolve(&self, id: &str) -> Option<Endpoint> {
        let cid = ConnectionId::parse(id);
        let endpoint = |kind, visible| Endpoint {
            id: id.to_string(),
            kind,
            visible,
        };
        match cid.side()? {
            PortSide::Out => {
                if let Some(step) = self.steps.iter().find(|s| s.id == cid.node_id) {
                    let port = step.output(&cid.port_id)?;
                    return Some(endpoint(EndpointKind::StepOutput, step.visible && port.visible));
                }
                self.inputs
                    .iter()
                    .find(|i| i.id == cid.node_id && i.id == cid.port_id)
                    .map(|i| endpoint(EndpointKind::WorkflowInput, i.visible))
            }
            PortSide::In => {
                if let Some(step) = self.steps.iter().find(|s| s.id == cid.node_id) {
                    let port = step.input(&cid.port_id)?;
                    return Some(endpoint(EndpointKind::StepInput, step.visible && port.visible));
                }
                self.outputs
                    .iter()
                    .find(|o| o.id == cid.node_id && o.id == cid.port_id)
                    .map(|o| endpoint(EndpointKind::WorkflowOutput, o.visible))
            }
        }
    }

    fn connection(&self, source: &str, destination: &str) -> Option<ConnectionModel> {
        Some(ConnectionModel {
            source: self.resolve(source)?,
            destination: self.resolve(destination)?,
        })
    }

    /// Drops every connection for which `touches` holds, returning them resolved.
    fn take_connections(&mut self, touches: impl Fn(&str) -> bool) -> Vec<ConnectionModel> {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.connections)
            .into_iter()
            .partition(|(s, d)| touches(s) || touches(d));
        self.connections = kept;
        removed
            .iter()
            .filter_map(|(s, d)| self.connection(s, d))
            .collect()
    }
}

#[derive(Default)]
struct ListenerTable {
    next_id: u64,
    entries: AHashMap<ModelEventKind, Vec<(u64, ModelListener)>>,
}

/// An in-memory workflow model that publishes a [`ModelEvent`] for every mutation.
///
/// `WorkflowModel` is a cheap handle: clones share the same state and listeners,
/// and report the same [`ModelSource::identity`]. Events are delivered
/// synchronously, after the state change, in subscription order.
#[derive(Clone, Default)]
pub struct WorkflowModel {
    state: Rc<RefCell<ModelState>>,
    listeners: Rc<RefCell<ListenerTable>>,
}

impl WorkflowModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a model from any format that converts into a [`WorkflowDocument`].
    pub fn from_document(source: impl IntoWorkflow) -> Result<Self, ModelError> {
        let document = source.into_workflow()?;
        let model = Self::new();
        {
            let mut state = model.state.borrow_mut();
            for mut step in document.steps {
                if state.steps.iter().any(|s| s.id == step.id) {
                    return Err(ModelError::DuplicateNode(step.id));
                }
                step.normalize();
                state.steps.push(step);
            }
            for mut input in document.inputs {
                if state.inputs.iter().any(|i| i.id == input.id) {
                    return Err(ModelError::DuplicateNode(input.id.clone()));
                }
                input.normalize();
                state.inputs.push(input);
            }
            for mut output in document.outputs {
                if state.outputs.iter().any(|o| o.id == output.id) {
                    return Err(ModelError::DuplicateNode(output.id.clone()));
                }
                output.normalize();
                state.outputs.push(output);
            }
            for ConnectionDefinition {
                source,
                destination,
            } in document.connections
            {
                for id in [&source, &destination] {
                    if state.resolve(id).is_none() {
                        return Err(ModelError::UnknownEndpoint(id.clone()));
                    }
                }
                state.connections.push((source, destination));
            }
        }
        debug!(
            steps = model.state.borrow().steps.len(),
            connections = model.state.borrow().connections.len(),
            "workflow model loaded"
        );
        Ok(model)
    }

    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        Self::from_document(WorkflowDocument::from_json(json)?)
    }

    pub fn to_document(&self) -> WorkflowDocument {
        let state = self.state.borrow();
        WorkflowDocument {
            steps: state.steps.clone(),
            inputs: state.inputs.clone(),
            outputs: state.outputs.clone(),
            connections: state
                .connections
                .iter()
                .map(|(s, d)| ConnectionDefinition {
                    source: s.clone(),
                    destination: d.clone(),
                })
                .collect(),
        }
    }

    pub fn step(&self, id: &str) -> Option<StepModel> {
        self.state.borrow().step(id).ok().cloned()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .borrow()
            .entries
            .values()
            .map(Vec::len)
            .sum()
    }

    fn emit(&self, event: ModelEvent) {
        let listeners: Vec<ModelListener> = self
            .listeners
            .borrow()
            .entries
            .get(&event.kind())
            .map(|list| list.iter().map(|(_, l)| Rc::clone(l)).collect())
            .unwrap_or_default();
        for listener in listeners {
            listener(&event);
        }
    }

    fn emit_all(&self, events: Vec<ModelEvent>) {
        for event in events {
            self.emit(event);
        }
    }

    // --- Steps ---

    pub fn add_step(&self, mut step: StepModel) -> Result<(), ModelError> {
        step.normalize();
        {
            let mut state = self.state.borrow_mut();
            if state.steps.iter().any(|s| s.id == step.id) {
                return Err(ModelError::DuplicateNode(step.id));
            }
            state.steps.push(step.clone());
        }
        self.emit(ModelEvent::StepCreate(step));
        Ok(())
    }

    /// Removes a step, first disconnecting everything attached to it.
    pub fn remove_step(&self, id: &str) -> Result<(), ModelError> {
        let mut events = Vec::new();
        {
            let mut state = self.state.borrow_mut();
            let step = state.step(id)?.clone();
            let port_ids: Vec<String> = step
                .inputs
                .iter()
                .chain(step.outputs.iter())
                .map(|p| p.connection_id.clone())
                .collect();
            for connection in state.take_connections(|cid| port_ids.iter().any(|p| p == cid)) {
                events.push(ModelEvent::ConnectionRemove {
                    source: connection.source,
                    destination: connection.destination,
                });
            }
            state.steps.retain(|s| s.id != id);
            events.push(ModelEvent::StepRemove(step));
        }
        self.emit_all(events);
        Ok(())
    }

    pub fn set_step_label(&self, id: &str, label: &str) -> Result<(), ModelError> {
        let step = {
            let mut state = self.state.borrow_mut();
            let step = state.step_mut(id)?;
            step.label = Some(label.to_string());
            step.clone()
        };
        self.emit(ModelEvent::StepChange(step));
        Ok(())
    }

    // --- Workflow inputs and outputs ---

    pub fn add_input(&self, mut input: InputModel) -> Result<(), ModelError> {
        input.normalize();
        {
            let mut state = self.state.borrow_mut();
            if state.inputs.iter().any(|i| i.id == input.id) {
                return Err(ModelError::DuplicateNode(input.id.clone()));
            }
            state.inputs.push(input.clone());
        }
        self.emit(ModelEvent::InputCreate(input));
        Ok(())
    }

    pub fn remove_input(&self, id: &str) -> Result<(), ModelError> {
        let mut events = Vec::new();
        {
            let mut state = self.state.borrow_mut();
            let input = state
                .inputs
                .iter()
                .find(|i| i.id == id)
                .cloned()
                .ok_or_else(|| ModelError::NodeNotFound(id.to_string()))?;
            let cid = input.connection_id.clone();
            for connection in state.take_connections(|c| c == cid) {
                events.push(ModelEvent::ConnectionRemove {
                    source: connection.source,
                    destination: connection.destination,
                });
            }
            state.inputs.retain(|i| i.id != id);
            events.push(ModelEvent::InputRemove(input));
        }
        self.emit_all(events);
        Ok(())
    }

    pub fn add_output(&self, mut output: OutputModel) -> Result<(), ModelError> {
        output.normalize();
        {
            let mut state = self.state.borrow_mut();
            if state.outputs.iter().any(|o| o.id == output.id) {
                return Err(ModelError::DuplicateNode(output.id.clone()));
            }
            state.outputs.push(output.clone());
        }
        self.emit(ModelEvent::OutputCreate(output));
        Ok(())
    }

    pub fn remove_output(&self, id: &str) -> Result<(), ModelError> {
        let mut events = Vec::new();
        {
            let mut state = self.state.borrow_mut();
            let output = state
                .outputs
                .iter()
                .find(|o| o.id == id)
                .cloned()
                .ok_or_else(|| ModelError::NodeNotFound(id.to_string()))?;
            let cid = output.connection_id.clone();
            for connection in state.take_connections(|c| c == cid) {
                events.push(ModelEvent::ConnectionRemove {
                    source: connection.source,
                    destination: connection.destination,
                });
            }
            state.outputs.retain(|o| o.id != id);
            events.push(ModelEvent::OutputRemove(output));
        }
        self.emit_all(events);
        Ok(())
    }

    // --- Ports ---

    fn set_input_visibility(
        &self,
        step_id: &str,
        port_id: &str,
        visible: bool,
    ) -> Result<(PortModel, StepModel), ModelError> {
        let mut state = self.state.borrow_mut();
        let step = state.step_mut(step_id)?;
        let port = step
            .inputs
            .iter_mut()
            .find(|p| p.id == port_id)
            .ok_or_else(|| ModelError::PortNotFound {
                step_id: step_id.to_string(),
                port_id: port_id.to_string(),
            })?;
        port.visible = visible;
        let port = port.clone();
        Ok((port, step.clone()))
    }

    pub fn show_input_port(&self, step_id: &str, port_id: &str) -> Result<(), ModelError> {
        let (port, step) = self.set_input_visibility(step_id, port_id, true)?;
        self.emit(ModelEvent::InPortShow { port, step });
        Ok(())
    }

    pub fn hide_input_port(&self, step_id: &str, port_id: &str) -> Result<(), ModelError> {
        let (port, step) = self.set_input_visibility(step_id, port_id, false)?;
        self.emit(ModelEvent::InPortHide { port, step });
        Ok(())
    }

    pub fn add_output_port(&self, step_id: &str, port_id: &str) -> Result<(), ModelError> {
        let (port, step) = {
            let mut state = self.state.borrow_mut();
            let step = state.step_mut(step_id)?;
            if step.output(port_id).is_some() {
                return Err(ModelError::DuplicateNode(format!("{}/{}", step_id, port_id)));
            }
            let port = PortModel::new(PortSide::Out, step_id, port_id);
            step.outputs.push(port.clone());
            (port, step.clone())
        };
        self.emit(ModelEvent::OutPortCreate { port, step });
        Ok(())
    }

    pub fn remove_output_port(&self, step_id: &str, port_id: &str) -> Result<(), ModelError> {
        let mut events = Vec::new();
        {
            let mut state = self.state.borrow_mut();
            let port = state
                .step(step_id)?
                .output(port_id)
                .cloned()
                .ok_or_else(|| ModelError::PortNotFound {
                    step_id: step_id.to_string(),
                    port_id: port_id.to_string(),
                })?;
            let cid = port.connection_id.clone();
            for connection in state.take_connections(|c| c == cid) {
                events.push(ModelEvent::ConnectionRemove {
                    source: connection.source,
                    destination: connection.destination,
                });
            }
            let step = state.step_mut(step_id)?;
            step.outputs.retain(|p| p.id != port_id);
            events.push(ModelEvent::OutPortRemove {
                port,
                step: step.clone(),
            });
        }
        self.emit_all(events);
        Ok(())
    }

    // --- Connections ---

    pub fn connect(&self, source: &str, destination: &str) -> Result<(), ModelError> {
        let connection = {
            let mut state = self.state.borrow_mut();
            if state
                .connections
                .iter()
                .any(|(s, d)| s == source && d == destination)
            {
                return Err(ModelError::DuplicateConnection {
                    source_id: source.to_string(),
                    destination_id: destination.to_string(),
                });
            }
            let connection = state.connection(source, destination).ok_or_else(|| {
                let unknown = if state.resolve(source).is_none() {
                    source
                } else {
                    destination
                };
                ModelError::UnknownEndpoint(unknown.to_string())
            })?;
            state
                .connections
                .push((source.to_string(), destination.to_string()));
            connection
        };
        self.emit(ModelEvent::ConnectionCreate {
            source: connection.source,
            destination: connection.destination,
        });
        Ok(())
    }

    pub fn disconnect(&self, source: &str, destination: &str) -> Result<(), ModelError> {
        let connection = {
            let mut state = self.state.borrow_mut();
            let index = state
                .connections
                .iter()
                .position(|(s, d)| s == source && d == destination)
                .ok_or_else(|| ModelError::ConnectionNotFound {
                    source_id: source.to_string(),
                    destination_id: destination.to_string(),
                })?;
            let connection = state.connection(source, destination);
            state.connections.remove(index);
            connection
        };
        if let Some(connection) = connection {
            self.emit(ModelEvent::ConnectionRemove {
                source: connection.source,
                destination: connection.destination,
            });
        }
        Ok(())
    }
}

impl ModelSource for WorkflowModel {
    fn identity(&self) -> usize {
        Rc::as_ptr(&self.state) as usize
    }

    fn steps(&self) -> Vec<StepModel> {
        self.state.borrow().steps.clone()
    }

    fn inputs(&self) -> Vec<InputModel> {
        self.state.borrow().inputs.clone()
    }

    fn outputs(&self) -> Vec<OutputModel> {
        self.state.borrow().outputs.clone()
    }

    fn connections(&self) -> Vec<ConnectionModel> {
        let state = self.state.borrow();
        state
            .connections
            .iter()
            .filter_map(|(s, d)| state.connection(s, d))
            .collect()
    }

    fn on(&self, kind: ModelEventKind, listener: ModelListener) -> Disposer {
        let id = {
            let mut table = self.listeners.borrow_mut();
            let id = table.next_id;
            table.next_id += 1;
            table.entries.entry(kind).or_default().push((id, listener));
            id
        };
        let weak: Weak<RefCell<ListenerTable>> = Rc::downgrade(&self.listeners);
        Disposer::new(move || {
            if let Some(table) = weak.upgrade() {
                if let Some(list) = table.borrow_mut().entries.get_mut(&kind) {
                    list.retain(|(l, _)| *l != id);
                }
            }
        })
    }
}
