use crossbeam_channel::{Receiver, Sender};
use glam::Vec3;

/// One-shot scene mutation requested from outside the tick.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SceneCommand {
    /// Writes the program's `color` uniform.
    SetColor(Vec3),
}

/// Cloneable handle for queueing [`SceneCommand`]s.
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: Sender<SceneCommand>,
}

impl CommandSender {
    /// Queues `command` for the next tick. Returns `false` once the scene is gone.
    pub fn send(&self, command: SceneCommand) -> bool {
        self.tx.send(command).is_ok()
    }
}

/// Receiving end owned by the scene.
#[derive(Debug)]
pub(crate) struct CommandQueue {
    tx: Sender<SceneCommand>,
    rx: Receiver<SceneCommand>,
}

impl CommandQueue {
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self { tx, rx }
    }

    pub fn sender(&self) -> CommandSender {
        CommandSender { tx: self.tx.clone() }
    }

    /// Removes every command queued so far, in send order.
    pub fn drain(&self) -> Vec<SceneCommand> {
        self.rx.try_iter().collect()
    }
}
