use super::element::{Element, ElementId};
use super::selector::Selector;
use crate::geometry::{Matrix, Rect};
use slotmap::SlotMap;

/// A retained, DOM-like scene: an arena of elements with a single `svg` root.
///
/// Every structural or attribute mutation bumps [`Scene::version`], which lets
/// callers tell whether anything changed between two reads without diffing.
#[derive(Debug, Clone)]
pub struct Scene {
    elements: SlotMap<ElementId, Element>,
    root: ElementId,
    viewport: Rect,
    version: u64,
}

impl Scene {
    /// Creates an empty scene whose root occupies `viewport` in screen space.
    pub fn new(viewport: Rect) -> Self {
        let mut elements = SlotMap::with_key();
        let root = elements.insert(Element::new("svg"));
        Self {
            elements,
            root,
            viewport,
            version: 0,
        }
    }

    pub fn root(&self) -> ElementId {
        self.root
    }

    /// The root's client bounding rectangle.
    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Rect) {
        self.viewport = viewport;
        self.bump();
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    fn bump(&mut self) {
        self.version += 1;
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.len() <= 1
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(id)
    }

    /// True when `id` is reachable from the root.
    pub fn is_attached(&self, id: ElementId) -> bool {
        id == self.root || self.ancestors(id).any(|a| a == self.root)
    }

    // --- Construction ---

    /// Creates a detached element.
    pub fn create_element(&mut self, tag: &str) -> ElementId {
        self.bump();
        self.elements.insert(Element::new(tag))
    }

    /// Appends `child` as the last child of `parent`, detaching it from any previous parent.
    pub fn append_child(&mut self, parent: ElementId, child: ElementId) -> bool {
        self.insert_before(parent, child, None)
    }

    /// Inserts `child` into `parent` right before `reference`.
    ///
    /// When `reference` is `None` or is not a child of `parent`, the child is appended.
    pub fn insert_before(
        &mut self,
        parent: ElementId,
        child: ElementId,
        reference: Option<ElementId>,
    ) -> bool {
        if parent == child
            || !self.contains(parent)
            || !self.contains(child)
            || self.ancestors(parent).any(|a| a == child)
        {
            return false;
        }
        self.detach(child);

        let Some(parent_el) = self.elements.get_mut(parent) else {
            return false;
        };
        let index = reference
            .and_then(|r| parent_el.children.iter().position(|c| *c == r))
            .unwrap_or(parent_el.children.len());
        parent_el.children.insert(index, child);
        if let Some(child_el) = self.elements.get_mut(child) {
            child_el.parent = Some(parent);
        }
        self.bump();
        true
    }

    /// Removes `id` from its parent without freeing it.
    pub fn detach(&mut self, id: ElementId) -> bool {
        let Some(parent) = self.elements.get(id).and_then(|e| e.parent) else {
            return false;
        };
        if let Some(parent_el) = self.elements.get_mut(parent) {
            parent_el.children.retain(|c| *c != id);
        }
        if let Some(el) = self.elements.get_mut(id) {
            el.parent = None;
        }
        self.bump();
        true
    }

    /// Detaches `id` and frees it together with its whole subtree. The root cannot be removed.
    pub fn remove(&mut self, id: ElementId) -> bool {
        if id == self.root || !self.contains(id) {
            return false;
        }
        self.detach(id);
        let subtree = self.descendants(id).collect::<Vec<_>>();
        for el in subtree {
            self.elements.remove(el);
        }
        self.bump();
        true
    }

    /// Frees every child subtree of `id`.
    pub fn clear_children(&mut self, id: ElementId) {
        let children = self
            .elements
            .get(id)
            .map(|e| e.children.clone())
            .unwrap_or_default();
        for child in children {
            self.remove(child);
        }
    }

    /// Re-appends `id` to its own parent so it paints last.
    pub fn move_to_end(&mut self, id: ElementId) -> bool {
        match self.parent(id) {
            Some(parent) => self.append_child(parent, id),
            None => false,
        }
    }

    // --- Attributes ---

    pub fn add_class(&mut self, id: ElementId, class: &str) {
        if let Some(el) = self.elements.get_mut(id) {
            if el.add_class(class) {
                self.bump();
            }
        }
    }

    pub fn remove_class(&mut self, id: ElementId, class: &str) {
        if let Some(el) = self.elements.get_mut(id) {
            if el.remove_class(class) {
                self.bump();
            }
        }
    }

    pub fn has_class(&self, id: ElementId, class: &str) -> bool {
        self.get(id).is_some_and(|e| e.has_class(class))
    }

    /// Sets an attribute. `class` replaces the class list; use [`Scene::set_transform`] for transforms.
    pub fn set_attribute(&mut self, id: ElementId, name: &str, value: &str) {
        if let Some(el) = self.elements.get_mut(id) {
            if name == "class" {
                el.set_class_list(value);
            } else {
                el.set_attribute(name, value);
            }
            self.bump();
        }
    }

    pub fn remove_attribute(&mut self, id: ElementId, name: &str) {
        if let Some(el) = self.elements.get_mut(id) {
            if el.remove_attribute(name) {
                self.bump();
            }
        }
    }

    pub fn attribute(&self, id: ElementId, name: &str) -> Option<&str> {
        self.get(id).and_then(|e| e.attribute(name))
    }

    pub fn set_text(&mut self, id: ElementId, text: &str) {
        if let Some(el) = self.elements.get_mut(id) {
            el.text = Some(text.to_string());
            self.bump();
        }
    }

    pub fn text(&self, id: ElementId) -> Option<&str> {
        self.get(id).and_then(|e| e.text())
    }

    pub fn set_transform(&mut self, id: ElementId, transform: Matrix) {
        if let Some(el) = self.elements.get_mut(id) {
            el.transform = Some(transform);
            self.bump();
        }
    }

    pub fn transform(&self, id: ElementId) -> Option<Matrix> {
        self.get(id).and_then(|e| e.transform)
    }

    // --- Traversal ---

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.get(id).and_then(|e| e.parent)
    }

    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.get(id).map(|e| e.children()).unwrap_or(&[])
    }

    /// Ancestors of `id`, nearest first, not including `id` itself.
    pub fn ancestors(&self, id: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        std::iter::successors(self.parent(id), move |current| self.parent(*current))
    }

    /// `id` and all of its descendants in document order.
    pub fn descendants(&self, id: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        let mut stack = if self.contains(id) { vec![id] } else { vec![] };
        std::iter::from_fn(move || {
            let current = stack.pop()?;
            stack.extend(self.children(current).iter().rev().copied());
            Some(current)
        })
    }

    // --- Queries ---

    /// First descendant of `scope` (excluding `scope`) matching `selector`, in document order.
    pub fn query(&self, scope: ElementId, selector: &Selector) -> Option<ElementId> {
        self.descendants(scope)
            .skip(1)
            .find(|id| selector.matches(self, *id))
    }

    /// Every descendant of `scope` matching `selector`, in document order.
    pub fn query_all(&self, scope: ElementId, selector: &Selector) -> Vec<ElementId> {
        self.descendants(scope)
            .skip(1)
            .filter(|id| selector.matches(self, *id))
            .collect()
    }

    /// String form of [`Scene::query`].
    pub fn query_selector(
        &self,
        scope: ElementId,
        selector: &str,
    ) -> Result<Option<ElementId>, crate::error::SelectorError> {
        Ok(self.query(scope, &selector.parse()?))
    }

    /// String form of [`Scene::query_all`].
    pub fn query_selector_all(
        &self,
        scope: ElementId,
        selector: &str,
    ) -> Result<Vec<ElementId>, crate::error::SelectorError> {
        Ok(self.query_all(scope, &selector.parse()?))
    }

    /// Nearest element, starting at `id` itself, that carries `class`.
    pub fn closest_with_class(&self, id: ElementId, class: &str) -> Option<ElementId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|el| self.has_class(*el, class))
    }
}
