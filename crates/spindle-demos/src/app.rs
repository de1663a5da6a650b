use rand::rngs::StdRng;
use spindle_engine::core::{App, AppControl, FrameCtx};
use spindle_engine::gfx::WgpuContext;
use spindle_engine::input::Key;
use spindle_engine::render::{CommandSender, Scene, SceneCommand, SceneState};
use winit::event::WindowEvent;
use winit::window::WindowId;

use crate::demos::{random_color, DemoKind};

/// Windowed host for one demo scene.
///
/// The wgpu context is created on the first frame, once a device exists.
/// Activations (click, Space, Enter) queue a random recolor; Escape quits.
pub struct DemoApp {
    kind: DemoKind,
    scene: Scene,
    commands: CommandSender,
    gl: Option<WgpuContext>,
    rng: StdRng,
}

impl DemoApp {
    pub fn new(kind: DemoKind, scene: Scene, rng: StdRng) -> Self {
        let commands = scene.commands();
        Self { kind, scene, commands, gl: None, rng }
    }
}

impl App for DemoApp {
    fn on_window_event(&mut self, _window_id: WindowId, event: &WindowEvent) -> AppControl {
        if let WindowEvent::Resized(size) = event {
            if size.width > 0 && size.height > 0 {
                let aspect = size.width as f32 / size.height as f32;
                if let Err(e) = self.scene.set_aspect(aspect) {
                    log::warn!("ignoring resize: {e}");
                }
            }
        }
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if ctx.input_frame.key_pressed(Key::Escape) {
            log::info!("escape pressed; exiting");
            return AppControl::Exit;
        }
        for _ in 0..ctx.input_frame.activations() {
            self.commands
                .send(SceneCommand::SetColor(random_color(&mut self.rng)));
        }

        let gl = self.gl.get_or_insert_with(|| WgpuContext::new(&*ctx.gpu));

        if self.scene.state() == SceneState::Uninitialized {
            if let Err(e) = self.scene.set_aspect(ctx.window.aspect()) {
                log::warn!("initial aspect rejected: {e}");
            }
            if let Err(e) = self.scene.initialize(gl) {
                log::error!("{:?} demo failed to start: {e}", self.kind);
                return AppControl::Exit;
            }
        }

        if let Err(e) = self.scene.render(gl, ctx.time.elapsed) {
            log::error!("render failed: {e}");
            gl.discard_pending();
            return AppControl::Exit;
        }

        let control = ctx.present(|frame| {
            gl.flush(frame);
            AppControl::Continue
        });
        // Nothing left after a flush; a skipped frame leaves its draws here.
        gl.discard_pending();
        control
    }

    fn on_exit(&mut self) {
        if let Some(gl) = self.gl.as_mut() {
            self.scene.dispose(gl);
        }
    }
}
