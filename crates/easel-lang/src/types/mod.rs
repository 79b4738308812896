pub mod color;
pub mod draw;
pub mod image;
pub mod mat;
pub mod registry;
