//! The retained scene the engine renders into.
//!
//! A [`Scene`] is a small DOM: an arena of SVG-like elements addressed by
//! [`ElementId`], queried with CSS-style [`Selector`]s, mutated through
//! [`ScenePatch`]es and serialized to and from markup.

mod bounds;
pub mod element;
pub mod markup;
pub mod patch;
pub mod selector;
pub mod snapshot;
pub mod template;
pub mod tree;

pub use element::*;
pub use markup::{escape_attribute, escape_text};
pub use patch::*;
pub use selector::*;
pub use snapshot::*;
pub use template::*;
pub use tree::*;
