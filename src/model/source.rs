use super::definition::{ConnectionModel, InputModel, OutputModel, StepModel};
use super::event::{ModelEvent, ModelEventKind};
use std::fmt;
use std::rc::Rc;

pub type ModelListener = Rc<dyn Fn(&ModelEvent)>;

/// Undoes one subscription when disposed. Dropping it without calling
/// [`Disposer::dispose`] leaves the subscription in place.
pub struct Disposer(Option<Box<dyn FnOnce()>>);

impl Disposer {
    pub fn new(dispose: impl FnOnce() + 'static) -> Self {
        Self(Some(Box::new(dispose)))
    }

    pub fn noop() -> Self {
        Self(None)
    }

    pub fn dispose(mut self) {
        if let Some(f) = self.0.take() {
            f();
        }
    }
}

impl fmt::Debug for Disposer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Disposer").field(&self.0.is_some()).finish()
    }
}

/// The view of a workflow model the graph engine needs.
///
/// The engine never mutates a model; it reads the current node, port and
/// connection lists and listens for change events.
pub trait ModelSource {
    /// Identity of the underlying model. Handles sharing state report the same value.
    fn identity(&self) -> usize;

    fn steps(&self) -> Vec<StepModel>;

    fn inputs(&self) -> Vec<InputModel>;

    fn outputs(&self) -> Vec<OutputModel>;

    fn connections(&self) -> Vec<ConnectionModel>;

    /// Subscribes `listener` to events of `kind`.
    fn on(&self, kind: ModelEventKind, listener: ModelListener) -> Disposer;
}
