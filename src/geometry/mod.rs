pub mod matrix;
pub mod rect;

pub use matrix::*;
pub use rect::*;
