use winit::window::{Window, WindowId};

use crate::device::{Gpu, GpuFrame, SurfaceErrorAction};
use crate::input::{InputFrame, InputState};
use crate::time::FrameTime;

use super::app::AppControl;

/// Per-window handles and immutable window metadata.
pub struct WindowCtx<'a> {
    pub id:     WindowId,
    pub window: &'a Window,
}

impl<'a> WindowCtx<'a> {
    /// Width over height of the drawable area; `1.0` while minimized.
    pub fn aspect(&self) -> f32 {
        let size = self.window.inner_size();
        if size.width == 0 || size.height == 0 {
            return 1.0;
        }
        size.width as f32 / size.height as f32
    }
}

/// Per-frame context passed to `core::App::on_frame`.
///
/// Lifetimes:
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window-borrow lifetime carried by `Gpu<'w>`
pub struct FrameCtx<'a, 'w> {
    pub window:      WindowCtx<'a>,
    pub gpu:         &'a mut Gpu<'w>,
    pub input:       &'a InputState,
    pub input_frame: &'a InputFrame,
    pub time:        FrameTime,
}

impl<'a, 'w> FrameCtx<'a, 'w> {
    /// Acquires the next surface texture, lets `draw` encode into it, then
    /// submits and presents.
    ///
    /// Surface errors skip the frame (`Continue`) unless fatal (`Exit`). A
    /// skipped frame does not call `draw`.
    pub fn present<F>(&mut self, draw: F) -> AppControl
    where
        F: FnOnce(&mut GpuFrame) -> AppControl,
    {
        let mut frame = match self.gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                log::debug!("surface error: {err:?}");
                let action = self.gpu.handle_surface_error(err);
                if action == SurfaceErrorAction::Fatal {
                    log::error!("unrecoverable surface error; exiting");
                    return AppControl::Exit;
                }
                return AppControl::Continue;
            }
        };

        let control = draw(&mut frame);

        self.window.window.pre_present_notify();
        self.gpu.submit(frame);

        control
    }
}
