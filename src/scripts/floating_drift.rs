use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use rand_distr::{Distribution, UnitDisc};
use serde::{Deserialize, Serialize};

use crate::{
    game_object::{GameObject2D, ObjectId},
    math::{exp_factor, move_towards_vec},
    scene_script::{SceneScript, ScriptContext},
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftConfig {
    pub sway_amplitude: f32,
    pub bob_amplitude: f32,
    /// Bob cycles per second.
    pub bob_frequency: f32,
    pub noise_strength: f32,
    pub noise_frequency: f32,
    /// Radius of the wander disc around spawn.
    pub drift_distance: f32,
    /// Chance per tick of picking a new wander point.
    pub wander_chance: f32,
    /// Units per second used to pull an out-of-range wander point back in.
    pub relax_speed: f32,
    /// How far below its spawn height the target may sink.
    pub floor_depth: f32,
    pub max_distance_from_start: f32,
    /// Position-driven follow rate (per second).
    pub follow_rate: f32,
    /// Velocity-driven: desired velocity per unit of distance to target.
    pub nudge_strength: f32,
    /// Velocity-driven: how quickly velocity blends toward the desired one.
    pub velocity_blend: f32,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            sway_amplitude: 0.3,
            bob_amplitude: 0.15,
            bob_frequency: 0.4,
            noise_strength: 0.1,
            noise_frequency: 0.3,
            drift_distance: 1.0,
            wander_chance: 0.01,
            relax_speed: 0.5,
            floor_depth: 1.0,
            max_distance_from_start: 2.0,
            follow_rate: 2.0,
            nudge_strength: 1.5,
            velocity_blend: 3.0,
        }
    }
}

/// How the drift target is applied to the object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriftMotion {
    /// Steer the body's velocity toward the target; external forces still act.
    Velocity,
    /// Move the pose directly with exponential smoothing.
    Position,
}

impl DriftMotion {
    /// Dynamic bodies are steered through velocity, everything else by pose.
    pub fn for_object(object: &GameObject2D) -> Self {
        if object.body.as_ref().is_some_and(|body| body.is_dynamic()) {
            Self::Velocity
        } else {
            Self::Position
        }
    }

    fn apply(self, object: &mut GameObject2D, target: Vec2, config: &DriftConfig, dt: f32) {
        match self {
            Self::Velocity => {
                let Some(body) = object.body.as_mut() else {
                    return;
                };
                let desired = (target - object.position) * config.nudge_strength;
                body.velocity = body
                    .velocity
                    .lerp(desired, exp_factor(config.velocity_blend, dt));
            }
            Self::Position => {
                object.position = object
                    .position
                    .lerp(target, exp_factor(config.follow_rate, dt));
            }
        }
    }
}

// Loose debris: sways, bobs and occasionally wanders around its spawn point.
pub struct FloatingDriftScript {
    object: ObjectId,
    config: DriftConfig,
    spawn: Vec2,
    wander: Vec2,
    phase: f32,
    was_enabled: bool,
}

impl FloatingDriftScript {
    pub fn new(object: ObjectId, config: DriftConfig) -> Self {
        Self {
            object,
            config,
            spawn: Vec2::ZERO,
            wander: Vec2::ZERO,
            phase: 0.0,
            was_enabled: true,
        }
    }

    pub fn spawn_point(&self) -> Vec2 {
        self.spawn
    }

    pub fn wander_offset(&self) -> Vec2 {
        self.wander
    }

    #[cfg(test)]
    fn set_wander_offset(&mut self, offset: Vec2) {
        self.wander = offset;
    }

    fn update_wander(&mut self, dt: f32, context: &mut ScriptContext<'_>) {
        if context.rng.random::<f32>() < self.config.wander_chance {
            let [x, y]: [f32; 2] = UnitDisc.sample(&mut *context.rng);
            self.wander = Vec2::new(x, y) * self.config.drift_distance;
        }

        let limit = self.config.drift_distance.max(0.0);
        if self.wander.length() > limit {
            let inside = self.wander.clamp_length_max(limit);
            self.wander = move_towards_vec(self.wander, inside, self.config.relax_speed * dt);
        }
    }

    pub fn target(&self, time: f32, context: &ScriptContext<'_>) -> Vec2 {
        let config = &self.config;
        let n = time * config.noise_frequency;

        let sway = (context.noise.sample(self.phase + n, self.phase) * 2.0 - 1.0)
            * config.sway_amplitude;
        let bob = (time * config.bob_frequency * TAU + self.phase).sin() * config.bob_amplitude
            + (context.noise.sample(self.phase, self.phase + n) * 2.0 - 1.0)
                * config.noise_strength;

        let mut target = self.spawn + Vec2::new(sway, bob) + self.wander;
        target.y = target.y.max(self.spawn.y - config.floor_depth);

        let offset = (target - self.spawn).clamp_length_max(config.max_distance_from_start.max(0.0));
        self.spawn + offset
    }
}

impl SceneScript for FloatingDriftScript {
    fn object(&self) -> Option<ObjectId> {
        Some(self.object)
    }

    fn start(&mut self, context: &mut ScriptContext<'_>) -> Result<(), String> {
        let object = context
            .objects
            .get(self.object)
            .ok_or_else(|| format!("drift object {:?} not found", self.object))?;

        self.spawn = object.position;
        self.was_enabled = object.drift_enabled;
        self.phase = context.rng.random_range(0.0..100.0);
        Ok(())
    }

    fn update(&mut self, dt: f32, context: &mut ScriptContext<'_>) -> Result<(), String> {
        let dt = dt.max(0.0);
        let (enabled, position) = context
            .objects
            .get(self.object)
            .map(|object| (object.drift_enabled && !object.is_attached(), object.position))
            .ok_or_else(|| format!("drift object {:?} not found", self.object))?;

        if !enabled {
            self.was_enabled = false;
            return Ok(());
        }
        if !self.was_enabled {
            // Re-anchor where we were let go. The wander point stays put in
            // the world, so a far drop relaxes back toward the disc.
            let wander_point = self.spawn + self.wander;
            self.spawn = position;
            self.wander = wander_point - position;
            self.was_enabled = true;
        }

        self.update_wander(dt, context);
        let target = self.target(context.time, context);

        let Some(object) = context.objects.get_mut(self.object) else {
            return Ok(());
        };
        let motion = DriftMotion::for_object(object);
        motion.apply(object, target, &self.config, dt);
        Ok(())
    }
}
