use super::element::ElementId;
use super::tree::Scene;
use crate::error::SnapshotError;
use crate::geometry::Matrix;
use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Read, Write};

/// An immutable copy of a scene subtree with arena ids stripped.
///
/// Two snapshots compare equal when the rendered output would be identical, which
/// makes them the natural unit for idempotence checks and for persisting a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSnapshot {
    pub tag: String,
    pub classes: Vec<String>,
    pub attributes: Vec<(String, String)>,
    pub transform: Option<Matrix>,
    pub text: Option<String>,
    pub children: Vec<SceneSnapshot>,
}

impl Scene {
    /// Captures `id` and its subtree. Returns `None` for a stale id.
    pub fn snapshot(&self, id: ElementId) -> Option<SceneSnapshot> {
        let el = self.get(id)?;
        Some(SceneSnapshot {
            tag: el.tag().to_string(),
            classes: el.classes().to_vec(),
            attributes: el.attributes().to_vec(),
            transform: el.transform(),
            text: el.text().map(str::to_string),
            children: el
                .children()
                .iter()
                .filter_map(|child| self.snapshot(*child))
                .collect(),
        })
    }
}

impl SceneSnapshot {
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Every node of the subtree, self included, in document order.
    pub fn iter(&self) -> impl Iterator<Item = &SceneSnapshot> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let current = stack.pop()?;
            stack.extend(current.children.iter().rev());
            Some(current)
        })
    }

    /// Every node in the subtree carrying `class`.
    pub fn find_all(&self, class: &str) -> Vec<&SceneSnapshot> {
        self.iter().filter(|s| s.has_class(class)).collect()
    }

    /// Encodes the snapshot with the standard bincode configuration.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        encode_to_vec(self, standard())
            .map_err(|e| SnapshotError::Generic(format!("Serialization failed: {}", e)))
    }

    /// Deserializes a snapshot from a byte slice.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        decode_from_slice(bytes, standard())
            .map(|(snapshot, _)| snapshot)
            .map_err(|e| SnapshotError::Generic(format!("Deserialization failed: {}", e)))
    }

    /// Saves the snapshot to a file.
    pub fn save(&self, path: &str) -> Result<(), SnapshotError> {
        let bytes = self.to_bytes()?;
        let mut file = fs::File::create(path).map_err(|e| {
            SnapshotError::Generic(format!("Could not create file '{}': {}", path, e))
        })?;
        file.write_all(&bytes).map_err(|e| {
            SnapshotError::Generic(format!("Could not write to file '{}': {}", path, e))
        })
    }

    /// Loads a snapshot previously written with [`SceneSnapshot::save`].
    pub fn from_file(path: &str) -> Result<Self, SnapshotError> {
        let mut file = fs::File::open(path)
            .map_err(|e| SnapshotError::Generic(format!("Could not open file '{}': {}", path, e)))?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(|e| {
            SnapshotError::Generic(format!("Could not read from file '{}': {}", path, e))
        })?;
        Self::from_bytes(&bytes)
    }
}
