//! spindle engine crate.
//!
//! A minimal renderer: shader programs, static geometry, a perspective camera
//! and a per-frame scene, drawn through a small [`gfx::GraphicsContext`]
//! trait with a wgpu backend and a headless recording backend. The platform
//! pieces (window runtime, device, input, frame clock) drive it.

pub mod core;
pub mod device;
pub mod driver;
pub mod gfx;
pub mod input;
pub mod logging;
pub mod paint;
pub mod render;
pub mod time;
pub mod window;
