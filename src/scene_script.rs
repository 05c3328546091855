use std::collections::VecDeque;

use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

use crate::{
    coherent_noise::CoherentNoise,
    game_object::{ObjectId, SceneObjects},
    input::{InputEvent, InputState, Key},
    physics::Contact,
};

/// Discrete, edge-triggered commands broadcast to every script.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScriptSignal {
    Descend,
    Ascend,
    Release,
}

/// Things scripts report back to the scheduler.
#[derive(Clone, Debug, PartialEq)]
pub enum SceneEvent {
    Consumed {
        hook: ObjectId,
        object: ObjectId,
        name: String,
    },
    Released {
        hook: ObjectId,
        object: ObjectId,
    },
    Grabbed {
        hook: ObjectId,
        object: ObjectId,
    },
}

pub struct ScriptContext<'a> {
    pub objects: &'a mut SceneObjects,
    pub rng: &'a mut SmallRng,
    pub noise: &'a dyn CoherentNoise,
    /// Monotonic scene clock in seconds.
    pub time: f32,
    /// Horizontal steer input in `[-1, 1]`.
    pub steer: f32,
    /// Scripts created during this call; started by the runner.
    pub spawned: &'a mut Vec<Box<dyn SceneScript>>,
    pub events: &'a mut Vec<SceneEvent>,
}

pub trait SceneScript {
    /// Scene object this script drives, if any. Scripts whose object has been
    /// despawned are dropped by the runner.
    fn object(&self) -> Option<ObjectId> {
        None
    }

    fn start(&mut self, _context: &mut ScriptContext<'_>) -> Result<(), String> {
        Ok(())
    }

    fn update(&mut self, dt: f32, context: &mut ScriptContext<'_>) -> Result<(), String>;

    fn fixed_update(&mut self, _dt: f32, _context: &mut ScriptContext<'_>) -> Result<(), String> {
        Ok(())
    }

    fn on_contact(
        &mut self,
        _contact: &Contact,
        _context: &mut ScriptContext<'_>,
    ) -> Result<(), String> {
        Ok(())
    }

    fn on_signal(&mut self, _signal: ScriptSignal) {}

    fn is_finished(&self) -> bool {
        false
    }
}

struct ScriptSlot {
    script: Box<dyn SceneScript>,
    started: bool,
}

#[derive(Default)]
pub struct SceneRunner {
    scripts: Vec<ScriptSlot>,
}

impl SceneRunner {
    pub fn with_scripts(scripts: Vec<Box<dyn SceneScript>>) -> Self {
        Self {
            scripts: scripts
                .into_iter()
                .map(|script| ScriptSlot {
                    script,
                    started: false,
                })
                .collect(),
        }
    }

    pub fn add(&mut self, script: Box<dyn SceneScript>) {
        self.scripts.push(ScriptSlot {
            script,
            started: false,
        });
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }

    pub fn send_signal(&mut self, signal: ScriptSignal) {
        for slot in &mut self.scripts {
            slot.script.on_signal(signal);
        }
    }

    /// Starts any scripts that have not run yet, including ones spawned
    /// during start.
    pub fn start_pending(&mut self, context: &mut ScriptContext<'_>) {
        loop {
            for slot in self.scripts.iter_mut().filter(|slot| !slot.started) {
                slot.started = true;
                if let Err(err) = slot.script.start(context) {
                    log::error!("script start failed: {err}");
                }
            }

            if context.spawned.is_empty() {
                break;
            }
            let spawned: Vec<_> = context.spawned.drain(..).collect();
            for script in spawned {
                self.add(script);
            }
        }
    }

    pub fn update(&mut self, dt: f32, context: &mut ScriptContext<'_>) {
        self.start_pending(context);

        for slot in &mut self.scripts {
            if let Err(err) = slot.script.update(dt, context) {
                log::error!("script update failed: {err}");
            }
        }

        self.start_pending(context);
        self.prune(context.objects);
    }

    pub fn fixed_update(&mut self, dt: f32, context: &mut ScriptContext<'_>) {
        self.start_pending(context);

        for slot in &mut self.scripts {
            if let Err(err) = slot.script.fixed_update(dt, context) {
                log::error!("script fixed update failed: {err}");
            }
        }
    }

    /// Delivers a contact to the scripts attached to `contact.this`.
    pub fn dispatch_contact(&mut self, contact: &Contact, context: &mut ScriptContext<'_>) {
        for slot in &mut self.scripts {
            if slot.script.object() != Some(contact.this) {
                continue;
            }
            // The object may have been consumed by an earlier contact this step.
            if !context.objects.contains(contact.this) {
                break;
            }
            if let Err(err) = slot.script.on_contact(contact, context) {
                log::error!("script contact handler failed: {err}");
            }
        }
    }

    fn prune(&mut self, objects: &SceneObjects) {
        self.scripts.retain(|slot| {
            !slot.script.is_finished()
                && slot.script.object().is_none_or(|id| objects.contains(id))
        });
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum InputCommand {
    Press(Key),
    Release(Key),
    Wait(f32),
}

pub fn press(key: Key) -> InputCommand {
    InputCommand::Press(key)
}

pub fn release(key: Key) -> InputCommand {
    InputCommand::Release(key)
}

pub fn wait(seconds: f32) -> InputCommand {
    InputCommand::Wait(seconds.max(0.0))
}

/// Replays a list of timed key presses into an [`InputState`].
pub struct InputTimeline {
    pending: VecDeque<InputCommand>,
    wait_remaining: f32,
}

impl InputTimeline {
    pub fn new(commands: Vec<InputCommand>) -> Self {
        Self {
            pending: commands.into(),
            wait_remaining: 0.0,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.pending.is_empty() && self.wait_remaining <= 0.0
    }

    pub fn update(&mut self, mut dt: f32, input: &mut InputState) {
        loop {
            if self.wait_remaining > 0.0 {
                if dt <= 0.0 {
                    break;
                }

                if dt >= self.wait_remaining {
                    dt -= self.wait_remaining;
                    self.wait_remaining = 0.0;
                } else {
                    self.wait_remaining -= dt;
                    break;
                }
            }

            let Some(command) = self.pending.pop_front() else {
                break;
            };

            match command {
                InputCommand::Wait(seconds) => {
                    self.wait_remaining = seconds.max(0.0);
                }
                InputCommand::Press(key) => {
                    input.on_event(InputEvent::KeyPressed(key));
                }
                InputCommand::Release(key) => {
                    input.on_event(InputEvent::KeyReleased(key));
                }
            }
        }
    }
}
