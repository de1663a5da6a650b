//! Color representation shared by the graphics backends and the scene.

pub mod color;

pub use color::Color;
