pub mod common;
pub mod image;
pub mod outcome;
pub mod text;

pub use common::*;
pub use image::*;
pub use outcome::*;
pub use text::*;
