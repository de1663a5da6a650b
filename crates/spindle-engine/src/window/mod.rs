//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and the single Window, wires them to the GPU
//! layer and feeds redraw notifications to a [`FrameDriver`](crate::driver::FrameDriver).

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
