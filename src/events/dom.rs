use crate::geometry::Point;
use crate::scene::{ElementId, Scene, Selector};
use tracing::trace;

/// Kind of low-level pointer input fed in by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerKind {
    Down,
    Move,
    Up,
    Over,
}

/// One pointer sample in screen coordinates.
///
/// `target` is the innermost element under the pointer, as hit-tested by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub pointer_id: u32,
    pub kind: PointerKind,
    pub x: f64,
    pub y: f64,
    pub target: Option<ElementId>,
}

impl PointerEvent {
    pub fn new(kind: PointerKind, x: f64, y: f64, target: Option<ElementId>) -> Self {
        Self {
            pointer_id: 0,
            kind,
            x,
            y,
            target,
        }
    }

    pub fn with_pointer(mut self, pointer_id: u32) -> Self {
        self.pointer_id = pointer_id;
        self
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Handle returned by every registration, usable with [`DomEvents::off`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type MoveFn = Box<dyn FnMut(&mut Scene, f64, f64, ElementId)>;
type PhaseFn = Box<dyn FnMut(&mut Scene, &PointerEvent, ElementId)>;

enum ListenerKind {
    Drag {
        selector: Selector,
        on_move: MoveFn,
        on_start: PhaseFn,
        on_end: PhaseFn,
    },
    Event {
        kind: PointerKind,
        selector: Option<Selector>,
        handler: PhaseFn,
    },
    Hover {
        element: ElementId,
        hovering: bool,
        on_hover: PhaseFn,
        on_enter: PhaseFn,
        on_leave: PhaseFn,
    },
}

struct Listener {
    id: ListenerId,
    kind: ListenerKind,
}

/// State of one press-move-release sequence, keyed by pointer.
#[derive(Debug, Clone, Copy)]
struct ActiveDrag {
    listener: ListenerId,
    pointer_id: u32,
    origin: Point,
    element: ElementId,
}

/// Gesture recognition over a [`Scene`].
///
/// Listeners are delegated: a listener registered for a selector fires when the
/// event target or one of its ancestors matches, and receives that matching
/// element. Callbacks get mutable access to the scene and nothing else, so a
/// gesture cannot reach back into the listener table while it is being dispatched.
#[derive(Default)]
pub struct DomEvents {
    listeners: Vec<Listener>,
    active: Vec<ActiveDrag>,
    next_id: u64,
}

impl DomEvents {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&mut self, kind: ListenerKind) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push(Listener { id, kind });
        id
    }

    /// Recognizes drags that start on an element matching `selector`.
    ///
    /// `on_start` runs once at press time, `on_move` receives the cumulative
    /// delta from the press point, and `on_end` runs once at release wherever
    /// the pointer is by then.
    pub fn drag(
        &mut self,
        selector: Selector,
        on_move: impl FnMut(&mut Scene, f64, f64, ElementId) + 'static,
        on_start: impl FnMut(&mut Scene, &PointerEvent, ElementId) + 'static,
        on_end: impl FnMut(&mut Scene, &PointerEvent, ElementId) + 'static,
    ) -> ListenerId {
        self.register(ListenerKind::Drag {
            selector,
            on_move: Box::new(on_move),
            on_start: Box::new(on_start),
            on_end: Box::new(on_end),
        })
    }

    /// Generic delegated listener. With no selector the handler receives the raw target.
    pub fn on(
        &mut self,
        kind: PointerKind,
        selector: Option<Selector>,
        handler: impl FnMut(&mut Scene, &PointerEvent, ElementId) + 'static,
    ) -> ListenerId {
        self.register(ListenerKind::Event {
            kind,
            selector,
            handler: Box::new(handler),
        })
    }

    /// Tracks the pointer entering, moving over and leaving one specific element.
    pub fn hover(
        &mut self,
        element: ElementId,
        on_hover: impl FnMut(&mut Scene, &PointerEvent, ElementId) + 'static,
        on_enter: impl FnMut(&mut Scene, &PointerEvent, ElementId) + 'static,
        on_leave: impl FnMut(&mut Scene, &PointerEvent, ElementId) + 'static,
    ) -> ListenerId {
        self.register(ListenerKind::Hover {
            element,
            hovering: false,
            on_hover: Box::new(on_hover),
            on_enter: Box::new(on_enter),
            on_leave: Box::new(on_leave),
        })
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| l.id != id);
        self.active.retain(|a| a.listener != id);
        before != self.listeners.len()
    }

    /// Removes the generic listeners of one kind. Returns how many were removed.
    pub fn detach(&mut self, kind: PointerKind) -> usize {
        let before = self.listeners.len();
        self.listeners
            .retain(|l| !matches!(&l.kind, ListenerKind::Event { kind: k, .. } if *k == kind));
        before - self.listeners.len()
    }

    /// Removes every listener and abandons any gesture in flight.
    pub fn detach_all(&mut self) {
        self.listeners.clear();
        self.active.clear();
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_dragging(&self) -> bool {
        !self.active.is_empty()
    }

    /// Feeds one pointer sample through every listener.
    pub fn dispatch(&mut self, scene: &mut Scene, event: &PointerEvent) {
        match event.kind {
            PointerKind::Down => self.press(scene, event),
            PointerKind::Move => self.motion(scene, event),
            PointerKind::Up => self.release(scene, event),
            PointerKind::Over => {}
        }

        // Hover style listeners stay quiet while a drag is in progress.
        if event.kind == PointerKind::Over && self.is_dragging() {
            return;
        }
        self.dispatch_generic(scene, event);
        if matches!(event.kind, PointerKind::Move | PointerKind::Over) {
            self.track_hover(scene, event);
        }
    }

    fn press(&mut self, scene: &mut Scene, event: &PointerEvent) {
        let Some(target) = event.target else {
            return;
        };
        for listener in &mut self.listeners {
            let ListenerKind::Drag {
                selector, on_start, ..
            } = &mut listener.kind
            else {
                continue;
            };
            let Some(element) = delegate_target(scene, target, selector) else {
                continue;
            };
            trace!(pointer = event.pointer_id, selector = %selector, "drag start");
            self.active.push(ActiveDrag {
                listener: listener.id,
                pointer_id: event.pointer_id,
                origin: event.position(),
                element,
            });
            on_start(scene, event, element);
        }
    }

    fn motion(&mut self, scene: &mut Scene, event: &PointerEvent) {
        for drag in self.active.iter().filter(|a| a.pointer_id == event.pointer_id) {
            let Some(listener) = self.listeners.iter_mut().find(|l| l.id == drag.listener) else {
                continue;
            };
            if let ListenerKind::Drag { on_move, .. } = &mut listener.kind {
                on_move(
                    scene,
                    event.x - drag.origin.x,
                    event.y - drag.origin.y,
                    drag.element,
                );
            }
        }
    }

    fn release(&mut self, scene: &mut Scene, event: &PointerEvent) {
        let (finished, remaining): (Vec<_>, Vec<_>) = self
            .active
            .drain(..)
            .partition(|a| a.pointer_id == event.pointer_id);
        self.active = remaining;

        for drag in finished {
            let Some(listener) = self.listeners.iter_mut().find(|l| l.id == drag.listener) else {
                continue;
            };
            if let ListenerKind::Drag { on_end, .. } = &mut listener.kind {
                trace!(pointer = event.pointer_id, "drag end");
                on_end(scene, event, drag.element);
            }
        }
    }

    fn dispatch_generic(&mut self, scene: &mut Scene, event: &PointerEvent) {
        for listener in &mut self.listeners {
            let ListenerKind::Event {
                kind,
                selector,
                handler,
            } = &mut listener.kind
            else {
                continue;
            };
            if *kind != event.kind {
                continue;
            }
            let matched = match (selector, event.target) {
                (Some(selector), Some(target)) => delegate_target(scene, target, selector),
                (Some(_), None) => None,
                (None, target) => Some(target.unwrap_or_else(|| scene.root())),
            };
            if let Some(element) = matched {
                handler(scene, event, element);
            }
        }
    }

    fn track_hover(&mut self, scene: &mut Scene, event: &PointerEvent) {
        for listener in &mut self.listeners {
            let ListenerKind::Hover {
                element,
                hovering,
                on_hover,
                on_enter,
                on_leave,
            } = &mut listener.kind
            else {
                continue;
            };
            let inside = event
                .target
                .is_some_and(|t| t == *element || scene.ancestors(t).any(|a| a == *element));

            match (*hovering, inside) {
                (false, true) => {
                    *hovering = true;
                    on_enter(scene, event, *element);
                }
                (true, true) => on_hover(scene, event, *element),
                (true, false) => {
                    *hovering = false;
                    on_leave(scene, event, *element);
                }
                (false, false) => {}
            }
        }
    }
}

/// Nearest element from `target` upwards that matches `selector`.
fn delegate_target(scene: &Scene, target: ElementId, selector: &Selector) -> Option<ElementId> {
    std::iter::once(target)
        .chain(scene.ancestors(target))
        .find(|el| selector.matches(scene, *el))
}
