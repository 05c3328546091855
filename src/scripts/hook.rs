//! Crane hook: swings on a rope from a pivot, drops on command, grabs the first
//! piece of trash it touches and reels it back up to be scored.
//!
//! State flow is strictly `Swinging -> Dropping -> Reeling -> Swinging`.
//! Dropping starts only from the top of the rope; Reeling is the only way back.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    game_object::{Attachment, ObjectId, ObjectKind, RenderLayer, compose_pose},
    math::{exp_factor, move_towards, move_towards_vec},
    physics::{BodyMode, Contact, ContactKind},
    scene_script::{SceneEvent, SceneScript, ScriptContext, ScriptSignal},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HookState {
    Swinging,
    Dropping,
    Reeling,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HookConfig {
    pub swing_speed: f32,
    pub max_swing_angle_degrees: f32,
    pub manual_strength_degrees: f32,
    /// Angular acceleration per radian of error.
    pub stiffness: f32,
    /// Per-tick multiplier on angular velocity.
    pub damping: f32,
    pub swing_rope_length: f32,
    pub max_rope_length: f32,
    pub rope_speed: f32,
    /// Rope lengths within this of the minimum count as "at top".
    pub top_tolerance: f32,
    /// Follow rate of the rendered hook toward its rope end; 0 snaps.
    pub position_smoothing: f32,
    pub auto_return_on_grab: bool,
    /// Grab point relative to the hook.
    pub grab_offset: Vec2,
    /// Carried object's resting offset relative to the grab point.
    pub carry_offset: Vec2,
    pub snap_carried: bool,
    pub carry_follow_rate: f32,
    pub carry_layer: RenderLayer,
    pub carry_z_index: i32,
    pub release_spread: f32,
    pub release_min_drop: f32,
    pub release_max_drop: f32,
    /// Seconds a manually released object is ignored by this hook's grab.
    pub regrab_delay: f32,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            swing_speed: 1.2,
            max_swing_angle_degrees: 35.0,
            manual_strength_degrees: 20.0,
            stiffness: 40.0,
            damping: 0.92,
            swing_rope_length: 0.8,
            max_rope_length: 6.0,
            rope_speed: 3.0,
            top_tolerance: 1e-3,
            position_smoothing: 20.0,
            auto_return_on_grab: true,
            grab_offset: Vec2::new(0.0, -0.3),
            carry_offset: Vec2::new(0.0, -0.2),
            snap_carried: false,
            carry_follow_rate: 12.0,
            carry_layer: RenderLayer::Rig,
            carry_z_index: 5,
            release_spread: 0.6,
            release_min_drop: 0.3,
            release_max_drop: 0.8,
            regrab_delay: 0.5,
        }
    }
}

pub struct HookScript {
    object: ObjectId,
    pivot: Option<ObjectId>,
    fallback_pivot: Option<Vec2>,
    config: HookConfig,
    state: HookState,
    angle: f32,
    angular_velocity: f32,
    rope_length: f32,
    rope_target: f32,
    carried: Option<ObjectId>,
    release_requested: bool,
    just_released: Option<(ObjectId, f32)>,
}

impl HookScript {
    pub fn new(object: ObjectId, pivot: Option<ObjectId>, config: HookConfig) -> Self {
        let rope_length = config.swing_rope_length;
        Self {
            object,
            pivot,
            fallback_pivot: None,
            config,
            state: HookState::Swinging,
            angle: 0.0,
            angular_velocity: 0.0,
            rope_length,
            rope_target: rope_length,
            carried: None,
            release_requested: false,
            just_released: None,
        }
    }

    pub fn state(&self) -> HookState {
        self.state
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn rope_length(&self) -> f32 {
        self.rope_length
    }

    pub fn rope_target(&self) -> f32 {
        self.rope_target
    }

    pub fn carried(&self) -> Option<ObjectId> {
        self.carried
    }

    pub fn is_at_top(&self) -> bool {
        self.rope_length <= self.config.swing_rope_length + self.config.top_tolerance
    }

    fn enter(&mut self, state: HookState) {
        log::debug!("hook {:?}: {:?} -> {:?}", self.object, self.state, state);
        self.state = state;
        self.rope_target = match state {
            HookState::Dropping => self.config.max_rope_length,
            HookState::Swinging | HookState::Reeling => self.config.swing_rope_length,
        };
    }

    fn pivot_position(&self, context: &ScriptContext<'_>) -> Option<Vec2> {
        self.pivot
            .and_then(|id| context.objects.get(id))
            .map(|pivot| pivot.position)
            .or(self.fallback_pivot)
    }

    fn target_angle(&self, time: f32, steer: f32) -> f32 {
        let manual = steer.clamp(-1.0, 1.0) * self.config.manual_strength_degrees.to_radians();
        match self.state {
            HookState::Swinging => {
                (time * self.config.swing_speed).sin() * self.config.max_swing_angle_degrees.to_radians()
                    + manual
            }
            HookState::Dropping | HookState::Reeling => manual,
        }
    }

    fn step_swing(&mut self, dt: f32, time: f32, steer: f32) {
        let target = self.target_angle(time, steer);
        self.angular_velocity += (target - self.angle) * self.config.stiffness * dt;
        self.angular_velocity *= self.config.damping;
        self.angle += self.angular_velocity * dt;
    }

    fn step_rope(&mut self, dt: f32) {
        let min = self.config.swing_rope_length;
        let max = self.config.max_rope_length.max(min);
        self.rope_length =
            move_towards(self.rope_length, self.rope_target, self.config.rope_speed * dt).clamp(min, max);
    }

    /// Takes `target` if the hook is free and the object is loose trash.
    ///
    /// Reparenting, freezing the body and disabling drift all happen here, so
    /// no half-grabbed state is ever visible. Returns whether the grab happened.
    pub fn grab(&mut self, target: ObjectId, context: &mut ScriptContext<'_>) -> bool {
        if self.carried.is_some() || target == self.object {
            return false;
        }
        if self.just_released.is_some_and(|(id, _)| id == target) {
            return false;
        }
        if self.state == HookState::Swinging && !self.config.auto_return_on_grab {
            return false;
        }
        let eligible = context
            .objects
            .get(target)
            .is_some_and(|object| object.kind == ObjectKind::Trash && !object.is_attached());
        if !eligible {
            return false;
        }

        if let Err(err) = context.objects.attach(target, self.object) {
            log::warn!("hook {:?} failed to grab {target:?}: {err}", self.object);
            return false;
        }
        if let Some(object) = context.objects.get_mut(target) {
            if let Some(body) = object.body.as_mut() {
                body.mode = BodyMode::Kinematic;
                body.velocity = Vec2::ZERO;
                body.angular_velocity = 0.0;
            }
            object.drift_enabled = false;
        }

        self.carried = Some(target);
        context.events.push(SceneEvent::Grabbed {
            hook: self.object,
            object: target,
        });
        log::debug!("hook {:?} grabbed {target:?}", self.object);

        if self.config.auto_return_on_grab && self.state != HookState::Reeling {
            self.enter(HookState::Reeling);
        }
        true
    }

    /// Lets go of the carried object. Consumed objects are despawned and
    /// scored; dropped ones get their physics and drift back plus a small kick.
    pub fn release(&mut self, consume: bool, context: &mut ScriptContext<'_>) {
        let Some(id) = self.carried.take() else {
            return;
        };
        context.objects.detach(id);

        if consume {
            if let Some(object) = context.objects.despawn(id) {
                log::info!("hook {:?} scored '{}'", self.object, object.name);
                context.events.push(SceneEvent::Consumed {
                    hook: self.object,
                    object: id,
                    name: object.name,
                });
            }
            return;
        }

        let low = self.config.release_min_drop.min(self.config.release_max_drop);
        let high = self.config.release_min_drop.max(self.config.release_max_drop);
        let kick = Vec2::new(
            context.rng.random_range(-1.0..=1.0) * self.config.release_spread,
            -context.rng.random_range(low..=high),
        );

        if let Some(object) = context.objects.get_mut(id) {
            if let Some(body) = object.body.as_mut() {
                body.mode = BodyMode::Dynamic;
                body.velocity = kick;
            }
            object.drift_enabled = true;
        }
        self.just_released = Some((id, self.config.regrab_delay));
        context.events.push(SceneEvent::Released {
            hook: self.object,
            object: id,
        });
    }

    /// Pulls the carried object toward its resting offset and re-applies its
    /// render order. Runs every tick so outside edits cannot stick.
    fn hold_carried(&mut self, dt: f32, context: &mut ScriptContext<'_>) {
        let Some(id) = self.carried else {
            return;
        };
        let Some((hook_position, hook_rotation)) = context
            .objects
            .get(self.object)
            .map(|hook| (hook.position, hook.rotation))
        else {
            return;
        };
        let Some(object) = context.objects.get_mut(id) else {
            self.carried = None;
            return;
        };

        let resting = self.config.grab_offset + self.config.carry_offset;
        let mut attachment = match object.attachment {
            Some(attachment) if attachment.parent == self.object => attachment,
            _ => {
                // Someone detached or reparented it; take it back.
                Attachment {
                    parent: self.object,
                    local_offset: resting,
                    local_rotation: 0.0,
                }
            }
        };

        if self.config.snap_carried {
            attachment.local_offset = resting;
            attachment.local_rotation = 0.0;
        } else {
            let t = exp_factor(self.config.carry_follow_rate, dt);
            let step = (resting - attachment.local_offset).length() * t;
            attachment.local_offset = move_towards_vec(attachment.local_offset, resting, step);
            attachment.local_rotation += (0.0 - attachment.local_rotation) * t;
        }

        let (position, rotation) = compose_pose(
            hook_position,
            hook_rotation,
            attachment.local_offset,
            attachment.local_rotation,
        );
        object.attachment = Some(attachment);
        object.position = position;
        object.rotation = rotation;
        object.layer = self.config.carry_layer;
        object.z_index = self.config.carry_z_index;
        object.drift_enabled = false;
        if let Some(body) = object.body.as_mut() {
            body.mode = BodyMode::Kinematic;
            body.velocity = Vec2::ZERO;
        }
    }

    #[cfg(test)]
    fn set_rope_length(&mut self, length: f32) {
        self.rope_length = length;
    }
}

impl SceneScript for HookScript {
    fn object(&self) -> Option<ObjectId> {
        Some(self.object)
    }

    fn start(&mut self, context: &mut ScriptContext<'_>) -> Result<(), String> {
        let hook = context
            .objects
            .get(self.object)
            .ok_or_else(|| format!("hook object {:?} not found", self.object))?;

        let pivot_found = self.pivot.is_some_and(|id| context.objects.contains(id));
        if !pivot_found {
            log::warn!(
                "hook '{}' has no pivot configured; swinging from its own position",
                hook.name
            );
            self.fallback_pivot = Some(hook.position);
        }
        Ok(())
    }

    fn update(&mut self, dt: f32, context: &mut ScriptContext<'_>) -> Result<(), String> {
        let dt = dt.max(0.0);

        if std::mem::take(&mut self.release_requested) {
            self.release(false, context);
        }
        if self.carried.is_some_and(|id| !context.objects.contains(id)) {
            self.carried = None;
        }
        self.just_released = self
            .just_released
            .map(|(id, remaining)| (id, remaining - dt))
            .filter(|(_, remaining)| *remaining > 0.0);

        self.step_swing(dt, context.time, context.steer);
        self.step_rope(dt);

        if self.state == HookState::Reeling && self.is_at_top() {
            self.rope_length = self.config.swing_rope_length;
            self.enter(HookState::Swinging);
            self.release(true, context);
        }

        let pivot = match self.pivot_position(context) {
            Some(pivot) => pivot,
            None => {
                // Pivot object vanished after start; hold where we are.
                let position = context
                    .objects
                    .get(self.object)
                    .map(|hook| hook.position)
                    .ok_or_else(|| format!("hook object {:?} not found", self.object))?;
                self.fallback_pivot = Some(position);
                position
            }
        };
        let rope_end = pivot + Vec2::new(self.angle.sin(), -self.angle.cos()) * self.rope_length;

        let hook = context
            .objects
            .get_mut(self.object)
            .ok_or_else(|| format!("hook object {:?} not found", self.object))?;
        hook.position = if self.config.position_smoothing > 0.0 {
            hook.position
                .lerp(rope_end, exp_factor(self.config.position_smoothing, dt))
        } else {
            rope_end
        };
        hook.rotation = self.angle;

        self.hold_carried(dt, context);
        Ok(())
    }

    fn on_contact(
        &mut self,
        contact: &Contact,
        context: &mut ScriptContext<'_>,
    ) -> Result<(), String> {
        if contact.kind == ContactKind::Overlap && contact.is_enter() {
            self.grab(contact.other, context);
        }
        Ok(())
    }

    fn on_signal(&mut self, signal: ScriptSignal) {
        match signal {
            ScriptSignal::Descend => {
                if self.state == HookState::Swinging && self.is_at_top() {
                    self.enter(HookState::Dropping);
                }
            }
            ScriptSignal::Ascend => {
                if self.state == HookState::Dropping {
                    self.enter(HookState::Reeling);
                }
            }
            ScriptSignal::Release => {
                if self.carried.is_some() {
                    self.release_requested = true;
                }
            }
        }
    }
}
