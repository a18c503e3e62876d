use crate::error::GraphError;
use ahash::AHashMap;
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::fmt::Display;
use std::hash::Hash;
use std::rc::Rc;

/// Handle returned by [`EventHub::on`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

type Handler = Rc<dyn Fn(&Value)>;

/// Publish/subscribe channel scoped to one graph instance.
///
/// The hub is built with a closed vocabulary. The event type already rules out
/// misspelled names at compile time; the vocabulary narrows it further so a hub
/// can refuse events it was never meant to carry.
///
/// Subscribers of the same event are called in registration order. Handlers may
/// subscribe, unsubscribe or emit from inside a callback; an `emit` always
/// delivers to the subscribers present when it started.
pub struct EventHub<E> {
    vocabulary: Vec<E>,
    handlers: RefCell<AHashMap<E, Vec<(HandlerId, Handler)>>>,
    next_id: Cell<u64>,
}

impl<E> EventHub<E>
where
    E: Copy + Eq + Hash + Display,
{
    pub fn new(vocabulary: impl IntoIterator<Item = E>) -> Self {
        let mut unique = Vec::new();
        for event in vocabulary {
            if !unique.contains(&event) {
                unique.push(event);
            }
        }
        Self {
            vocabulary: unique,
            handlers: RefCell::new(AHashMap::new()),
            next_id: Cell::new(0),
        }
    }

    pub fn vocabulary(&self) -> &[E] {
        &self.vocabulary
    }

    pub fn supports(&self, event: E) -> bool {
        self.vocabulary.contains(&event)
    }

    fn ensure_known(&self, event: E) -> Result<(), GraphError> {
        if self.supports(event) {
            Ok(())
        } else {
            Err(GraphError::UnregisteredEvent(event.to_string()))
        }
    }

    pub fn on(&self, event: E, handler: impl Fn(&Value) + 'static) -> Result<HandlerId, GraphError> {
        self.ensure_known(event)?;
        let id = HandlerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.handlers
            .borrow_mut()
            .entry(event)
            .or_default()
            .push((id, Rc::new(handler)));
        Ok(id)
    }

    /// Removes one subscription. Returns whether it was still registered.
    pub fn off(&self, event: E, id: HandlerId) -> Result<bool, GraphError> {
        self.ensure_known(event)?;
        let mut handlers = self.handlers.borrow_mut();
        let Some(list) = handlers.get_mut(&event) else {
            return Ok(false);
        };
        let before = list.len();
        list.retain(|(h, _)| *h != id);
        Ok(before != list.len())
    }

    /// Calls every subscriber of `event`. Returns how many were called.
    pub fn emit(&self, event: E, payload: &Value) -> Result<usize, GraphError> {
        self.ensure_known(event)?;
        let snapshot: Vec<Handler> = self
            .handlers
            .borrow()
            .get(&event)
            .map(|list| list.iter().map(|(_, h)| Rc::clone(h)).collect())
            .unwrap_or_default();

        for handler in &snapshot {
            handler(payload);
        }
        Ok(snapshot.len())
    }

    /// Drops every subscriber; the vocabulary is kept.
    pub fn empty(&self) {
        self.handlers.borrow_mut().clear();
    }

    pub fn handler_count(&self, event: E) -> usize {
        self.handlers
            .borrow()
            .get(&event)
            .map(Vec::len)
            .unwrap_or(0)
    }
}
