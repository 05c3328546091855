//! Scene scaffolding for unit tests: owns everything a [`ScriptContext`]
//! borrows so scripts can be driven one frame at a time.

use rand::{SeedableRng, rngs::SmallRng};

use crate::{
    coherent_noise::FlatNoise,
    game_object::SceneObjects,
    scene_script::{SceneEvent, SceneScript, ScriptContext},
};

pub struct TestScene {
    pub objects: SceneObjects,
    pub rng: SmallRng,
    pub noise: FlatNoise,
    pub spawned: Vec<Box<dyn SceneScript>>,
    pub events: Vec<SceneEvent>,
    pub time: f32,
    pub steer: f32,
}

impl TestScene {
    pub fn new() -> Self {
        Self::with_noise(0.5)
    }

    pub fn with_noise(value: f32) -> Self {
        Self {
            objects: SceneObjects::new(),
            rng: SmallRng::seed_from_u64(7),
            noise: FlatNoise(value),
            spawned: Vec::new(),
            events: Vec::new(),
            time: 0.0,
            steer: 0.0,
        }
    }

    pub fn context(&mut self) -> ScriptContext<'_> {
        ScriptContext {
            objects: &mut self.objects,
            rng: &mut self.rng,
            noise: &self.noise,
            time: self.time,
            steer: self.steer,
            spawned: &mut self.spawned,
            events: &mut self.events,
        }
    }

    pub fn start(&mut self, script: &mut dyn SceneScript) {
        script.start(&mut self.context()).unwrap();
    }

    /// Advances the clock and runs one frame update followed by attachment
    /// resolution.
    pub fn frame(&mut self, script: &mut dyn SceneScript, dt: f32) {
        self.time += dt;
        script.update(dt, &mut self.context()).unwrap();
        self.objects.resolve_attachments();
    }
}
