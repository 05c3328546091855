//! Minimal 2D rigid-body layer: fixed-step integration of [`Body`] state and
//! circle-collider contact reporting.
//!
//! Contact *response* (bounce, spin) is left to scripts; this module only
//! integrates forces, keeps solid colliders from interpenetrating and reports
//! which pairs touch.

use std::collections::BTreeSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::game_object::{ObjectId, ObjectKind, SceneObjects};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyMode {
    /// Integrated from forces each physics step.
    Dynamic,
    /// Moved only by direct pose assignment; velocity is informational.
    Kinematic,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Body {
    pub velocity: Vec2,
    pub angular_velocity: f32,
    pub mass: f32,
    pub linear_drag: f32,
    pub angular_drag: f32,
    pub gravity_scale: f32,
    pub mode: BodyMode,
    force: Vec2,
}

impl Body {
    pub fn dynamic(mass: f32) -> Self {
        Self {
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            mass: mass.max(1e-3),
            linear_drag: 0.0,
            angular_drag: 0.05,
            gravity_scale: 1.0,
            mode: BodyMode::Dynamic,
            force: Vec2::ZERO,
        }
    }

    pub fn kinematic() -> Self {
        Self {
            mode: BodyMode::Kinematic,
            gravity_scale: 0.0,
            ..Self::dynamic(1.0)
        }
    }

    pub fn with_gravity_scale(mut self, gravity_scale: f32) -> Self {
        self.gravity_scale = gravity_scale;
        self
    }

    pub fn is_dynamic(&self) -> bool {
        self.mode == BodyMode::Dynamic
    }

    pub fn add_force(&mut self, force: Vec2) {
        self.force += force;
    }

    pub fn pending_force(&self) -> Vec2 {
        self.force
    }

    fn clear_accumulators(&mut self) {
        self.force = Vec2::ZERO;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    pub radius: f32,
    /// Triggers report overlaps but are never pushed apart.
    pub is_trigger: bool,
}

impl Collider {
    pub fn solid(radius: f32) -> Self {
        Self {
            radius,
            is_trigger: false,
        }
    }

    pub fn trigger(radius: f32) -> Self {
        Self {
            radius,
            is_trigger: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContactKind {
    Collision,
    Overlap,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContactPhase {
    Enter,
    Stay,
}

/// One side of a touching pair, seen from `this`.
#[derive(Clone, Copy, Debug)]
pub struct Contact {
    pub this: ObjectId,
    pub other: ObjectId,
    pub other_kind: ObjectKind,
    pub kind: ContactKind,
    pub phase: ContactPhase,
    /// Unit vector pointing from `other` toward `this`.
    pub normal: Vec2,
    /// `None` when the centres coincide and no surface point can be derived.
    pub point: Option<Vec2>,
    /// `this` velocity minus `other` velocity.
    pub relative_velocity: Vec2,
    pub other_velocity: Vec2,
    /// `this` position minus `other` position.
    pub separation: Vec2,
}

impl Contact {
    pub fn is_enter(&self) -> bool {
        self.phase == ContactPhase::Enter
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: Vec2,
    pub fixed_dt: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, -9.81),
            fixed_dt: 0.02,
        }
    }
}

struct Probe {
    id: ObjectId,
    kind: ObjectKind,
    position: Vec2,
    velocity: Vec2,
    radius: f32,
    is_trigger: bool,
    movable: bool,
    parent: Option<ObjectId>,
}

pub struct PhysicsWorld {
    config: PhysicsConfig,
    touching: BTreeSet<(ObjectId, ObjectId)>,
}

impl PhysicsWorld {
    pub fn new(config: PhysicsConfig) -> Self {
        Self {
            config,
            touching: BTreeSet::new(),
        }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Integrates every free dynamic body, separates solid overlaps and returns
    /// contacts for this step (both sides of each pair).
    pub fn step(&mut self, objects: &mut SceneObjects, dt: f32) -> Vec<Contact> {
        let dt = dt.max(0.0);
        self.integrate(objects, dt);
        self.detect(objects)
    }

    fn integrate(&self, objects: &mut SceneObjects, dt: f32) {
        let gravity = self.config.gravity;

        for (_, object) in objects.iter_mut() {
            let attached = object.is_attached();
            let Some(body) = object.body.as_mut() else {
                continue;
            };

            if body.is_dynamic() && !attached && dt > 0.0 {
                let acceleration = body.force / body.mass + gravity * body.gravity_scale;
                body.velocity += acceleration * dt;
                body.velocity *= 1.0 / (1.0 + dt * body.linear_drag);

                body.angular_velocity *= 1.0 / (1.0 + dt * body.angular_drag);

                object.position += body.velocity * dt;
                object.rotation += body.angular_velocity * dt;
            }

            body.clear_accumulators();
        }
    }

    fn detect(&mut self, objects: &mut SceneObjects) -> Vec<Contact> {
        let probes: Vec<Probe> = objects
            .iter()
            .filter_map(|(id, object)| {
                let collider = object.collider?;
                Some(Probe {
                    id,
                    kind: object.kind,
                    position: object.position,
                    velocity: object.body.as_ref().map_or(Vec2::ZERO, |b| b.velocity),
                    radius: collider.radius.max(0.0),
                    is_trigger: collider.is_trigger,
                    movable: !object.is_attached()
                        && object.body.as_ref().is_some_and(Body::is_dynamic),
                    parent: object.attachment.map(|a| a.parent),
                })
            })
            .collect();

        let mut contacts = Vec::new();
        let mut touching = BTreeSet::new();
        let mut pushes: Vec<(ObjectId, Vec2)> = Vec::new();

        for (index, a) in probes.iter().enumerate() {
            for b in probes.iter().skip(index + 1) {
                // Carried objects do not collide with their carrier.
                if a.parent == Some(b.id) || b.parent == Some(a.id) {
                    continue;
                }

                let delta = a.position - b.position;
                let distance = delta.length();
                let reach = a.radius + b.radius;
                if distance >= reach {
                    continue;
                }

                let pair = (a.id, b.id);
                touching.insert(pair);
                let phase = if self.touching.contains(&pair) {
                    ContactPhase::Stay
                } else {
                    ContactPhase::Enter
                };
                let kind = if a.is_trigger || b.is_trigger {
                    ContactKind::Overlap
                } else {
                    ContactKind::Collision
                };

                let coincident = distance <= f32::EPSILON;
                let normal = if coincident { Vec2::Y } else { delta / distance };
                let point = (!coincident).then(|| b.position + normal * b.radius);

                contacts.push(Contact {
                    this: a.id,
                    other: b.id,
                    other_kind: b.kind,
                    kind,
                    phase,
                    normal,
                    point,
                    relative_velocity: a.velocity - b.velocity,
                    other_velocity: b.velocity,
                    separation: delta,
                });
                contacts.push(Contact {
                    this: b.id,
                    other: a.id,
                    other_kind: a.kind,
                    kind,
                    phase,
                    normal: -normal,
                    point,
                    relative_velocity: b.velocity - a.velocity,
                    other_velocity: a.velocity,
                    separation: -delta,
                });

                if kind == ContactKind::Collision && !coincident {
                    let depth = reach - distance;
                    match (a.movable, b.movable) {
                        (true, true) => {
                            pushes.push((a.id, normal * depth * 0.5));
                            pushes.push((b.id, -normal * depth * 0.5));
                        }
                        (true, false) => pushes.push((a.id, normal * depth)),
                        (false, true) => pushes.push((b.id, -normal * depth)),
                        (false, false) => {}
                    }
                }
            }
        }

        for (id, push) in pushes {
            if let Some(object) = objects.get_mut(id) {
                object.position += push;
            }
        }

        self.touching = touching;
        contacts
    }
}
