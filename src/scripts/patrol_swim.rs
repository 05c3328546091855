use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    game_object::ObjectId,
    math::{clamp01, smooth_damp},
    scene_script::{SceneScript, ScriptContext},
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatrolConfig {
    pub base_speed: f32,
    pub speed_variance: f32,
    pub noise_frequency: f32,
    /// Half-width of the patrol band around the start position.
    pub patrol_distance: f32,
    pub bob_amplitude: f32,
    /// Bob cycles per second.
    pub bob_frequency: f32,
    pub bob_noise: f32,
    pub bob_smooth_time: f32,
    pub max_tilt_degrees: f32,
    pub tilt_smooth_time: f32,
    /// Set when the sprite art faces left, which mirrors facing and tilt.
    pub sprite_faces_left: bool,
    pub start_direction: f32,
}

impl Default for PatrolConfig {
    fn default() -> Self {
        Self {
            base_speed: 1.25,
            speed_variance: 0.5,
            noise_frequency: 0.35,
            patrol_distance: 4.0,
            bob_amplitude: 0.2,
            bob_frequency: 0.5,
            bob_noise: 0.1,
            bob_smooth_time: 0.35,
            max_tilt_degrees: 10.0,
            tilt_smooth_time: 0.25,
            sprite_faces_left: false,
            start_direction: 1.0,
        }
    }
}

// Back-and-forth patrol with noisy speed, a bobbing swim line and a tilt that
// leans into the direction of travel.
pub struct PatrolSwimScript {
    object: ObjectId,
    config: PatrolConfig,
    start: Vec2,
    direction: f32,
    phase: f32,
    speed: f32,
    bob_velocity: f32,
    tilt: f32,
    tilt_velocity: f32,
    base_scale_x: f32,
}

impl PatrolSwimScript {
    pub fn new(object: ObjectId, config: PatrolConfig) -> Self {
        let direction = if config.start_direction < 0.0 { -1.0 } else { 1.0 };
        Self {
            object,
            config,
            start: Vec2::ZERO,
            direction,
            phase: 0.0,
            speed: 0.0,
            bob_velocity: 0.0,
            tilt: 0.0,
            tilt_velocity: 0.0,
            base_scale_x: 1.0,
        }
    }

    pub fn direction(&self) -> f32 {
        self.direction
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn start_position(&self) -> Vec2 {
        self.start
    }

    /// Sign applied to `scale.x` so the sprite faces its travel direction.
    pub fn facing_sign(&self) -> f32 {
        if self.config.sprite_faces_left {
            -self.direction
        } else {
            self.direction
        }
    }

    fn top_speed(&self) -> f32 {
        (self.config.base_speed + self.config.speed_variance.max(0.0)).max(1e-4)
    }

    /// Moves along x and reflects at the patrol band edges. The direction is
    /// set to point back inward, so it changes at most once per crossing.
    fn advance_patrol(&mut self, x: f32, dt: f32) -> f32 {
        let next = x + self.direction * self.speed * dt;
        let offset = next - self.start.x;
        let limit = self.config.patrol_distance;

        if offset.abs() >= limit {
            self.direction = -offset.signum();
            self.start.x + limit * offset.signum()
        } else {
            next
        }
    }
}

impl SceneScript for PatrolSwimScript {
    fn object(&self) -> Option<ObjectId> {
        Some(self.object)
    }

    fn start(&mut self, context: &mut ScriptContext<'_>) -> Result<(), String> {
        let object = context
            .objects
            .get(self.object)
            .ok_or_else(|| format!("patrol object {:?} not found", self.object))?;

        self.start = object.position;
        self.base_scale_x = object.scale.x.abs();
        // Random phase keeps neighbouring swimmers out of lockstep.
        self.phase = context.rng.random_range(0.0..1000.0);
        Ok(())
    }

    fn update(&mut self, dt: f32, context: &mut ScriptContext<'_>) -> Result<(), String> {
        let dt = dt.max(0.0);
        let t = context.time;
        let config = &self.config;

        let speed_noise = context
            .noise
            .sample(self.phase + t * config.noise_frequency, self.phase);
        self.speed = (config.base_speed + speed_noise * config.speed_variance).max(0.0);

        let bob_noise = context
            .noise
            .sample(self.phase, self.phase + t * config.noise_frequency);
        let target_y = self.start.y
            + (t * config.bob_frequency * TAU + self.phase).sin() * config.bob_amplitude
            + (bob_noise - 0.5) * config.bob_noise;

        let normalized_speed = clamp01(self.speed / self.top_speed());

        let position = context
            .objects
            .get(self.object)
            .map(|object| object.position)
            .ok_or_else(|| format!("patrol object {:?} not found", self.object))?;

        let x = self.advance_patrol(position.x, dt);
        let y = smooth_damp(
            position.y,
            target_y,
            &mut self.bob_velocity,
            self.config.bob_smooth_time,
            dt,
        );

        let mut target_tilt =
            self.direction * normalized_speed * self.config.max_tilt_degrees.to_radians();
        if self.config.sprite_faces_left {
            target_tilt = -target_tilt;
        }
        self.tilt = smooth_damp(
            self.tilt,
            target_tilt,
            &mut self.tilt_velocity,
            self.config.tilt_smooth_time,
            dt,
        );

        let facing = self.facing_sign();
        let velocity = Vec2::new(self.direction * self.speed, self.bob_velocity);
        let object = context
            .objects
            .get_mut(self.object)
            .ok_or_else(|| format!("patrol object {:?} not found", self.object))?;

        object.position = Vec2::new(x, y);
        object.rotation = self.tilt;
        object.scale.x = self.base_scale_x * facing;
        if let Some(body) = object.body.as_mut().filter(|body| !body.is_dynamic()) {
            body.velocity = velocity;
        }

        Ok(())
    }
}
