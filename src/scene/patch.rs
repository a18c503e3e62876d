use super::element::ElementId;
use super::tree::Scene;
use crate::geometry::Matrix;

/// A single, self-contained scene mutation.
///
/// Model event handlers read the scene to work out what has to change and produce
/// a list of patches; only then is the scene borrowed mutably and the list committed.
#[derive(Debug, Clone, PartialEq)]
pub enum ScenePatch {
    Append {
        parent: ElementId,
        child: ElementId,
    },
    InsertBefore {
        parent: ElementId,
        child: ElementId,
        reference: Option<ElementId>,
    },
    Remove(ElementId),
    SetText {
        element: ElementId,
        text: String,
    },
    SetAttribute {
        element: ElementId,
        name: String,
        value: String,
    },
    SetTransform {
        element: ElementId,
        transform: Matrix,
    },
    AddClass {
        element: ElementId,
        class: String,
    },
    RemoveClass {
        element: ElementId,
        class: String,
    },
}

impl Scene {
    pub fn apply(&mut self, patch: ScenePatch) {
        match patch {
            ScenePatch::Append { parent, child } => {
                self.append_child(parent, child);
            }
            ScenePatch::InsertBefore {
                parent,
                child,
                reference,
            } => {
                self.insert_before(parent, child, reference);
            }
            ScenePatch::Remove(id) => {
                self.remove(id);
            }
            ScenePatch::SetText { element, text } => self.set_text(element, &text),
            ScenePatch::SetAttribute {
                element,
                name,
                value,
            } => self.set_attribute(element, &name, &value),
            ScenePatch::SetTransform { element, transform } => {
                self.set_transform(element, transform)
            }
            ScenePatch::AddClass { element, class } => self.add_class(element, &class),
            ScenePatch::RemoveClass { element, class } => self.remove_class(element, &class),
        }
    }

    pub fn apply_all(&mut self, patches: impl IntoIterator<Item = ScenePatch>) {
        for patch in patches {
            self.apply(patch);
        }
    }
}
