mod collection;
mod document;
mod image;

pub use collection::*;
pub use document::*;
pub use image::*;
