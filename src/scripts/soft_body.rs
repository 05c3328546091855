use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    game_object::ObjectId,
    math::{clamp01, lerp, reflect},
    physics::{Contact, ContactKind},
    scene_script::{SceneScript, ScriptContext},
};

/// Share of the other body's velocity carried into a bounce.
pub const OTHER_VELOCITY_SHARE: f32 = 0.25;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoftBodyConfig {
    /// Upward acceleration; applied as a force scaled by mass.
    pub buoyancy: f32,
    /// Speeds below this are zeroed to stop jitter.
    pub min_speed: f32,
    pub bounce: f32,
    pub min_impact_factor: f32,
    /// Relative speed that counts as a full-strength impact.
    pub impact_normalization: f32,
    pub spin_strength: f32,
    pub overlap_push: f32,
    pub linear_drag: f32,
    pub angular_drag: f32,
}

impl Default for SoftBodyConfig {
    fn default() -> Self {
        Self {
            buoyancy: 0.6,
            min_speed: 0.02,
            bounce: 0.6,
            min_impact_factor: 0.3,
            impact_normalization: 4.0,
            spin_strength: 3.0,
            overlap_push: 0.8,
            linear_drag: 1.5,
            angular_drag: 1.0,
        }
    }
}

/// `lerp(min_factor, 1, clamp01(magnitude / normalization))`.
///
/// Soft touches bottom out at `min_factor`, never at zero. A non-positive
/// normalization treats every contact as a full impact.
pub fn impact_factor(magnitude: f32, normalization: f32, min_factor: f32) -> f32 {
    if normalization <= 0.0 {
        return 1.0;
    }
    lerp(min_factor, 1.0, clamp01(magnitude / normalization))
}

/// Velocity after bouncing off a contact with unit `normal`.
pub fn bounce_velocity(
    relative_velocity: Vec2,
    other_velocity: Vec2,
    normal: Vec2,
    bounce: f32,
    impact: f32,
) -> Vec2 {
    reflect(relative_velocity, normal) * bounce * impact + other_velocity * OTHER_VELOCITY_SHARE
}

/// Random tumble; stiffer (bouncier) bodies spin less.
pub fn spin_impulse(rng: &mut impl Rng, strength: f32, bounce: f32, impact: f32) -> f32 {
    rng.random_range(-1.0..=1.0) * strength * (1.0 - bounce) * impact
}

/// Outward velocity change for overlap-only contacts.
pub fn overlap_push(separation: Vec2, strength: f32, impact: f32) -> Vec2 {
    separation.normalize_or(Vec2::Y) * strength * impact
}

// Underwater contact response: buoyancy, jitter suppression, bounce and tumble.
pub struct SoftBodyScript {
    object: ObjectId,
    config: SoftBodyConfig,
}

impl SoftBodyScript {
    pub fn new(object: ObjectId, config: SoftBodyConfig) -> Self {
        Self { object, config }
    }
}

impl SceneScript for SoftBodyScript {
    fn object(&self) -> Option<ObjectId> {
        Some(self.object)
    }

    fn start(&mut self, context: &mut ScriptContext<'_>) -> Result<(), String> {
        let object = context
            .objects
            .get_mut(self.object)
            .ok_or_else(|| format!("soft body object {:?} not found", self.object))?;

        match object.body.as_mut() {
            Some(body) => {
                body.linear_drag = self.config.linear_drag.max(0.0);
                body.angular_drag = self.config.angular_drag.max(0.0);
            }
            None => log::warn!("soft body script on '{}' without a body", object.name),
        }
        Ok(())
    }

    fn update(&mut self, _dt: f32, _context: &mut ScriptContext<'_>) -> Result<(), String> {
        Ok(())
    }

    fn fixed_update(&mut self, _dt: f32, context: &mut ScriptContext<'_>) -> Result<(), String> {
        let Some(object) = context.objects.get_mut(self.object) else {
            return Ok(());
        };
        if object.is_attached() {
            return Ok(());
        }
        let Some(body) = object.body.as_mut().filter(|body| body.is_dynamic()) else {
            return Ok(());
        };

        let lift = Vec2::Y * self.config.buoyancy * body.mass;
        body.add_force(lift);
        if body.velocity.length() < self.config.min_speed {
            body.velocity = Vec2::ZERO;
        }
        Ok(())
    }

    fn on_contact(
        &mut self,
        contact: &Contact,
        context: &mut ScriptContext<'_>,
    ) -> Result<(), String> {
        if !contact.is_enter() {
            return Ok(());
        }
        let config = &self.config;

        let impact = impact_factor(
            contact.relative_velocity.length(),
            config.impact_normalization,
            config.min_impact_factor,
        );
        let (velocity, spin) = match contact.kind {
            ContactKind::Collision => {
                if contact.point.is_none() {
                    return Ok(());
                }
                let velocity = bounce_velocity(
                    contact.relative_velocity,
                    contact.other_velocity,
                    contact.normal,
                    config.bounce,
                    impact,
                );
                let spin = spin_impulse(&mut *context.rng, config.spin_strength, config.bounce, impact);
                (Some(velocity), spin)
            }
            ContactKind::Overlap => {
                let spin = spin_impulse(
                    &mut *context.rng,
                    config.spin_strength * 0.5,
                    config.bounce,
                    impact,
                );
                (None, spin)
            }
        };

        let Some(object) = context.objects.get_mut(self.object) else {
            return Ok(());
        };
        if object.is_attached() {
            return Ok(());
        }
        let Some(body) = object.body.as_mut().filter(|body| body.is_dynamic()) else {
            return Ok(());
        };

        match velocity {
            Some(velocity) => body.velocity = velocity,
            None => body.velocity += overlap_push(contact.separation, config.overlap_push, impact),
        }
        body.angular_velocity += spin;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        game_object::{GameObject2D, ObjectKind, RenderLayer},
        physics::{Body, ContactPhase},
        test_support::TestScene,
    };
    use approx::assert_relative_eq;
    use rand::{SeedableRng, rngs::SmallRng};
    use rstest::rstest;

    fn spawn_body(scene: &mut TestScene, velocity: Vec2) -> ObjectId {
        spawn_body_with_mass(scene, velocity, 2.0)
    }

    fn spawn_body_with_mass(scene: &mut TestScene, velocity: Vec2, mass: f32) -> ObjectId {
        let mut body = Body::dynamic(mass);
        body.velocity = velocity;
        scene.objects.spawn(
            GameObject2D::new("can", ObjectKind::Trash, Vec2::ZERO, RenderLayer::Debris, 0)
                .with_body(body),
        )
    }

    fn contact(this: ObjectId, kind: ContactKind, velocity: Vec2, point: Option<Vec2>) -> Contact {
        Contact {
            this,
            other: ObjectId(99),
            other_kind: ObjectKind::Fish,
            kind,
            phase: ContactPhase::Enter,
            normal: Vec2::X,
            point,
            relative_velocity: velocity,
            other_velocity: Vec2::ZERO,
            separation: Vec2::new(0.5, 0.0),
        }
    }

    #[test]
    fn head_on_elastic_reflection_preserves_speed() {
        let incoming = Vec2::new(-3.0, 0.0);
        let out = bounce_velocity(incoming, Vec2::ZERO, Vec2::X, 1.0, 1.0);
        assert_relative_eq!(out.length(), incoming.length());
        assert_relative_eq!(out.x, 3.0);
    }

    #[rstest]
    #[case(0.0, 0.3)]
    #[case(2.0, 0.65)]
    #[case(4.0, 1.0)]
    #[case(40.0, 1.0)]
    fn impact_factor_scales_with_magnitude(#[case] magnitude: f32, #[case] expected: f32) {
        assert_relative_eq!(impact_factor(magnitude, 4.0, 0.3), expected, epsilon = 1e-6);
    }

    #[test]
    fn moving_other_body_imparts_a_quarter_of_its_velocity() {
        let out = bounce_velocity(Vec2::ZERO, Vec2::new(4.0, 0.0), Vec2::X, 0.5, 1.0);
        assert_relative_eq!(out.x, 1.0);
    }

    #[test]
    fn elastic_bodies_do_not_spin() {
        let mut rng = SmallRng::seed_from_u64(1);
        for _ in 0..20 {
            assert_eq!(spin_impulse(&mut rng, 5.0, 1.0, 1.0), 0.0);
        }
    }

    #[test]
    fn overlap_push_points_away_from_other() {
        let push = overlap_push(Vec2::new(0.0, -2.0), 0.8, 0.5);
        assert_relative_eq!(push.y, -0.4);
        assert_relative_eq!(push.x, 0.0);
    }

    #[test]
    fn buoyancy_scales_with_mass() {
        let mut scene = TestScene::new();
        let id = spawn_body(&mut scene, Vec2::new(0.0, -1.0));
        let mut script = SoftBodyScript::new(id, SoftBodyConfig::default());
        scene.start(&mut script);

        script.fixed_update(0.02, &mut scene.context()).unwrap();

        let body = scene.objects.get(id).unwrap().body.as_ref().unwrap();
        assert_relative_eq!(body.pending_force().y, 1.2);
    }

    #[test]
    fn slow_bodies_are_stilled() {
        let mut scene = TestScene::new();
        let id = spawn_body(&mut scene, Vec2::new(0.01, 0.0));
        let mut script = SoftBodyScript::new(id, SoftBodyConfig::default());

        script.fixed_update(0.02, &mut scene.context()).unwrap();

        let body = scene.objects.get(id).unwrap().body.as_ref().unwrap();
        assert_eq!(body.velocity, Vec2::ZERO);
    }

    #[test]
    fn collision_without_contact_point_is_ignored() {
        let mut scene = TestScene::new();
        let id = spawn_body(&mut scene, Vec2::new(-2.0, 0.0));
        let mut script = SoftBodyScript::new(id, SoftBodyConfig::default());

        let hit = contact(id, ContactKind::Collision, Vec2::new(-2.0, 0.0), None);
        script.on_contact(&hit, &mut scene.context()).unwrap();

        let body = scene.objects.get(id).unwrap().body.as_ref().unwrap();
        assert_eq!(body.velocity, Vec2::new(-2.0, 0.0));
        assert_eq!(body.angular_velocity, 0.0);
    }

    #[test]
    fn collision_reflects_velocity() {
        let mut scene = TestScene::new();
        let id = spawn_body(&mut scene, Vec2::new(-4.0, 0.0));
        let config = SoftBodyConfig {
            bounce: 0.5,
            ..SoftBodyConfig::default()
        };
        let mut script = SoftBodyScript::new(id, config);

        let hit = contact(id, ContactKind::Collision, Vec2::new(-4.0, 0.0), Some(Vec2::ZERO));
        script.on_contact(&hit, &mut scene.context()).unwrap();

        let body = scene.objects.get(id).unwrap().body.as_ref().unwrap();
        assert_relative_eq!(body.velocity.x, 2.0);
    }

    #[test]
    fn stay_contacts_do_not_respond() {
        let mut scene = TestScene::new();
        let id = spawn_body(&mut scene, Vec2::new(-4.0, 0.0));
        let mut script = SoftBodyScript::new(id, SoftBodyConfig::default());

        let mut hit = contact(id, ContactKind::Collision, Vec2::new(-4.0, 0.0), Some(Vec2::ZERO));
        hit.phase = ContactPhase::Stay;
        script.on_contact(&hit, &mut scene.context()).unwrap();

        let body = scene.objects.get(id).unwrap().body.as_ref().unwrap();
        assert_eq!(body.velocity, Vec2::new(-4.0, 0.0));
    }

    #[test]
    fn overlap_adds_outward_push() {
        let mut scene = TestScene::new();
        let id = spawn_body(&mut scene, Vec2::ZERO);
        let mut script = SoftBodyScript::new(id, SoftBodyConfig::default());

        let touch = contact(id, ContactKind::Overlap, Vec2::ZERO, None);
        script.on_contact(&touch, &mut scene.context()).unwrap();

        let body = scene.objects.get(id).unwrap().body.as_ref().unwrap();
        // Zero relative speed still pushes at the impact floor.
        assert_relative_eq!(body.velocity.x, 0.8 * 0.3);
    }

    #[test]
    fn collision_spin_ignores_mass() {
        let mut scene = TestScene::new();
        let id = spawn_body_with_mass(&mut scene, Vec2::new(-8.0, 0.0), 0.3);
        let config = SoftBodyConfig::default();
        let mut script = SoftBodyScript::new(id, config.clone());

        let mut replay = scene.rng.clone();
        let expected = spin_impulse(&mut replay, config.spin_strength, config.bounce, 1.0);

        let hit = contact(id, ContactKind::Collision, Vec2::new(-8.0, 0.0), Some(Vec2::ZERO));
        script.on_contact(&hit, &mut scene.context()).unwrap();

        let spin = scene.objects.get(id).unwrap().body.as_ref().unwrap().angular_velocity;
        assert_relative_eq!(spin, expected);
        assert!(spin.abs() <= config.spin_strength * (1.0 - config.bounce) + 1e-6);
    }

    #[test]
    fn overlap_spins_at_half_strength() {
        let mut scene = TestScene::new();
        let id = spawn_body_with_mass(&mut scene, Vec2::new(-8.0, 0.0), 0.3);
        let config = SoftBodyConfig::default();
        let mut script = SoftBodyScript::new(id, config.clone());

        let mut replay = scene.rng.clone();
        let expected = spin_impulse(&mut replay, config.spin_strength * 0.5, config.bounce, 1.0);

        let touch = contact(id, ContactKind::Overlap, Vec2::new(-8.0, 0.0), None);
        script.on_contact(&touch, &mut scene.context()).unwrap();

        let spin = scene.objects.get(id).unwrap().body.as_ref().unwrap().angular_velocity;
        assert_relative_eq!(spin, expected);
        assert!(spin.abs() <= 0.5 * config.spin_strength * (1.0 - config.bounce) + 1e-6);
    }
}
