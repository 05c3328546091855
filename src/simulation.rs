use rand::{SeedableRng, rngs::SmallRng};

use crate::{
    coherent_noise::{CoherentNoise, PerlinNoise},
    config::SceneConfig,
    game_object::SceneObjects,
    input::{Action, ActionMap, InputEvent, InputState, Key},
    physics::PhysicsWorld,
    scene_objects,
    scene_script::{InputTimeline, SceneEvent, SceneRunner, SceneScript, ScriptContext, ScriptSignal},
};

// Upper bound on catch-up physics steps in one frame; extra backlog is dropped.
const MAX_PHYSICS_STEPS_PER_FRAME: u32 = 8;

/// Drives one scene: input, fixed-rate physics with contact dispatch, and the
/// per-frame script update.
pub struct Simulation {
    objects: SceneObjects,
    physics: PhysicsWorld,
    runner: SceneRunner,
    rng: SmallRng,
    noise: Box<dyn CoherentNoise>,
    input: InputState,
    action_map: ActionMap,
    timeline: InputTimeline,
    spawned: Vec<Box<dyn SceneScript>>,
    events: Vec<SceneEvent>,
    event_log: Vec<SceneEvent>,
    time: f32,
    steer: f32,
    accumulator: f32,
    score: u32,
    exit_requested: bool,
}

impl Simulation {
    pub fn from_config(config: &SceneConfig) -> Self {
        let mut objects = SceneObjects::new();
        let scripts = scene_objects::create_initial_scene_scripts(config, &mut objects);

        Self {
            objects,
            physics: PhysicsWorld::new(config.physics),
            runner: SceneRunner::with_scripts(scripts),
            rng: SmallRng::seed_from_u64(config.seed),
            noise: Box::new(PerlinNoise::new(config.noise_seed)),
            input: InputState::default(),
            action_map: ActionMap::default(),
            timeline: InputTimeline::new(config.input_script.clone()),
            spawned: Vec::new(),
            events: Vec::new(),
            event_log: Vec::new(),
            time: 0.0,
            steer: 0.0,
            accumulator: 0.0,
            score: 0,
            exit_requested: false,
        }
    }

    pub fn with_noise(mut self, noise: Box<dyn CoherentNoise>) -> Self {
        self.noise = noise;
        self
    }

    pub fn objects(&self) -> &SceneObjects {
        &self.objects
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn events(&self) -> &[SceneEvent] {
        &self.event_log
    }

    pub fn active_scripts(&self) -> usize {
        self.runner.len()
    }

    pub fn is_exit_requested(&self) -> bool {
        self.exit_requested
    }

    pub fn press(&mut self, key: Key) {
        self.input.on_event(InputEvent::KeyPressed(key));
    }

    pub fn release(&mut self, key: Key) {
        self.input.on_event(InputEvent::KeyReleased(key));
    }

    fn split(&mut self) -> (&mut SceneRunner, &mut PhysicsWorld, ScriptContext<'_>) {
        let context = ScriptContext {
            objects: &mut self.objects,
            rng: &mut self.rng,
            noise: self.noise.as_ref(),
            time: self.time,
            steer: self.steer,
            spawned: &mut self.spawned,
            events: &mut self.events,
        };
        (&mut self.runner, &mut self.physics, context)
    }

    fn dispatch_input(&mut self) {
        if self.action_map.just_pressed(Action::Exit, &self.input) {
            self.exit_requested = true;
        }

        let commands = [
            (Action::Descend, ScriptSignal::Descend),
            (Action::Ascend, ScriptSignal::Ascend),
            (Action::Release, ScriptSignal::Release),
        ];
        for (action, signal) in commands {
            if self.action_map.just_pressed(action, &self.input) {
                self.runner.send_signal(signal);
            }
        }

        self.steer = self.action_map.steer_axis(&self.input);
    }

    fn fixed_step(&mut self, dt: f32) {
        let (runner, physics, mut context) = self.split();
        runner.fixed_update(dt, &mut context);

        let contacts = physics.step(&mut *context.objects, dt);
        for contact in &contacts {
            runner.dispatch_contact(contact, &mut context);
        }
    }

    fn collect_events(&mut self) {
        for event in self.events.drain(..) {
            if let SceneEvent::Consumed { name, .. } = &event {
                self.score = self.score.saturating_add(1);
                log::info!("scored '{name}' (total {})", self.score);
            }
            self.event_log.push(event);
        }
    }

    /// Advances the scene by one rendered frame of `dt` seconds.
    pub fn step_frame(&mut self, dt: f32) {
        let dt = dt.max(0.0);

        self.timeline.update(dt, &mut self.input);
        self.dispatch_input();

        let fixed_dt = self.physics.config().fixed_dt;
        self.accumulator += dt;
        let mut steps = 0;
        while self.accumulator >= fixed_dt && steps < MAX_PHYSICS_STEPS_PER_FRAME {
            self.fixed_step(fixed_dt);
            self.accumulator -= fixed_dt;
            steps += 1;
        }
        if steps == MAX_PHYSICS_STEPS_PER_FRAME && self.accumulator >= fixed_dt {
            log::warn!(
                "physics fell behind by {:.3}s; dropping backlog",
                self.accumulator
            );
            self.accumulator = 0.0;
        }

        self.time += dt;
        {
            let (runner, _, mut context) = self.split();
            runner.update(dt, &mut context);
        }
        self.objects.resolve_attachments();

        self.collect_events();
        self.input.end_frame();
    }

    /// Runs whole frames until `seconds` have elapsed or exit was requested.
    pub fn run_for(&mut self, seconds: f32, frame_dt: f32) -> u64 {
        let frame_dt = frame_dt.max(1e-4);
        let frames = (seconds.max(0.0) / frame_dt).ceil() as u64;

        let mut ran = 0;
        for _ in 0..frames {
            if self.exit_requested {
                break;
            }
            self.step_frame(frame_dt);
            ran += 1;
        }
        ran
    }
}
