pub mod dom;
pub mod hub;
pub mod lifecycle;

pub use dom::*;
pub use hub::*;
pub use lifecycle::*;
