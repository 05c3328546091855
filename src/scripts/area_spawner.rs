use glam::Vec2;
use rand::{Rng, seq::IndexedRandom};
use serde::{Deserialize, Serialize};

use crate::{
    game_object::{GameObject2D, ObjectId, ObjectKind, RenderLayer},
    physics::{Body, Collider},
    scene_script::{SceneScript, ScriptContext},
    scripts::{
        floating_drift::{DriftConfig, FloatingDriftScript},
        soft_body::{SoftBodyConfig, SoftBodyScript},
    },
};

/// Axis-aligned spawn rectangle. Corners may be given in any order.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnRegion {
    pub min: Vec2,
    pub max: Vec2,
}

impl SpawnRegion {
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        let (min, max) = (self.min.min(self.max), self.min.max(self.max));
        point.cmpge(min).all() && point.cmple(max).all()
    }

    pub fn sample(&self, rng: &mut impl Rng) -> Vec2 {
        let (min, max) = (self.min.min(self.max), self.min.max(self.max));
        Vec2::new(
            rng.random_range(min.x..=max.x),
            rng.random_range(min.y..=max.y),
        )
    }
}

/// One trash variant the spawner can place.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrefabConfig {
    pub name: String,
    pub radius: f32,
    pub scale: f32,
    pub layer: RenderLayer,
    pub z_index: i32,
    pub mass: f32,
    pub gravity_scale: f32,
    pub soft_body: SoftBodyConfig,
    pub drift: DriftConfig,
}

impl Default for PrefabConfig {
    fn default() -> Self {
        Self {
            name: "trash".to_owned(),
            radius: 0.25,
            scale: 1.0,
            layer: RenderLayer::Debris,
            z_index: 0,
            mass: 1.0,
            gravity_scale: 0.1,
            soft_body: SoftBodyConfig::default(),
            drift: DriftConfig::default(),
        }
    }
}

impl PrefabConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    fn instantiate(&self, position: Vec2) -> GameObject2D {
        GameObject2D::new(
            self.name.clone(),
            ObjectKind::Trash,
            position,
            self.layer,
            self.z_index,
        )
        .with_scale(Vec2::splat(self.scale))
        .with_body(Body::dynamic(self.mass).with_gravity_scale(self.gravity_scale))
        .with_collider(Collider::solid(self.radius))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnerConfig {
    pub region: Option<SpawnRegion>,
    pub count: usize,
    pub prefabs: Vec<PrefabConfig>,
}

// Scatters trash uniformly inside a rectangle once, at scene start. Overlaps
// between spawned pieces are allowed.
pub struct AreaSpawnerScript {
    config: SpawnerConfig,
    spawned: Vec<ObjectId>,
    finished: bool,
}

impl AreaSpawnerScript {
    pub fn new(config: SpawnerConfig) -> Self {
        Self {
            config,
            spawned: Vec::new(),
            finished: false,
        }
    }

    pub fn spawned(&self) -> &[ObjectId] {
        &self.spawned
    }
}

impl SceneScript for AreaSpawnerScript {
    fn start(&mut self, context: &mut ScriptContext<'_>) -> Result<(), String> {
        self.finished = true;

        let Some(region) = self.config.region else {
            log::error!("area spawner has no spawn region; skipping spawn");
            return Ok(());
        };
        if self.config.prefabs.is_empty() {
            log::error!("area spawner has no prefabs; skipping spawn");
            return Ok(());
        }

        for _ in 0..self.config.count {
            let position = region.sample(&mut *context.rng);
            let Some(prefab) = self.config.prefabs.choose(&mut *context.rng) else {
                continue;
            };

            let id = context.objects.spawn(prefab.instantiate(position));
            context
                .spawned
                .push(Box::new(FloatingDriftScript::new(id, prefab.drift.clone())));
            context
                .spawned
                .push(Box::new(SoftBodyScript::new(id, prefab.soft_body.clone())));
            self.spawned.push(id);
        }

        log::info!("area spawner placed {} objects", self.spawned.len());
        Ok(())
    }

    fn update(&mut self, _dt: f32, _context: &mut ScriptContext<'_>) -> Result<(), String> {
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestScene;

    fn region() -> SpawnRegion {
        SpawnRegion::new(Vec2::new(4.0, -1.0), Vec2::new(-4.0, -3.0))
    }

    fn config(count: usize) -> SpawnerConfig {
        SpawnerConfig {
            region: Some(region()),
            count,
            prefabs: vec![PrefabConfig::named("can"), PrefabConfig::named("bag")],
        }
    }

    #[test]
    fn spawns_count_objects_inside_region() {
        let mut scene = TestScene::new();
        let mut spawner = AreaSpawnerScript::new(config(40));
        scene.start(&mut spawner);

        assert_eq!(spawner.spawned().len(), 40);
        assert_eq!(scene.objects.count_kind(ObjectKind::Trash), 40);
        for id in spawner.spawned() {
            let object = scene.objects.get(*id).unwrap();
            assert!(region().contains(object.position), "{:?}", object.position);
            assert!(object.body.as_ref().unwrap().is_dynamic());
        }
        assert!(spawner.is_finished());
    }

    #[test]
    fn queues_drift_and_soft_body_per_object() {
        let mut scene = TestScene::new();
        let mut spawner = AreaSpawnerScript::new(config(3));
        scene.start(&mut spawner);

        assert_eq!(scene.spawned.len(), 6);
    }

    #[test]
    fn uses_every_prefab_variant() {
        let mut scene = TestScene::new();
        let mut spawner = AreaSpawnerScript::new(config(60));
        scene.start(&mut spawner);

        let names: Vec<&str> = spawner
            .spawned()
            .iter()
            .map(|id| scene.objects.get(*id).unwrap().name.as_str())
            .collect();
        assert!(names.contains(&"can"));
        assert!(names.contains(&"bag"));
    }

    #[test]
    fn missing_region_spawns_nothing() {
        let mut scene = TestScene::new();
        let mut spawner = AreaSpawnerScript::new(SpawnerConfig {
            region: None,
            ..config(10)
        });
        scene.start(&mut spawner);

        assert!(scene.objects.is_empty());
        assert!(spawner.is_finished());
    }

    #[test]
    fn empty_prefab_list_spawns_nothing() {
        let mut scene = TestScene::new();
        let mut spawner = AreaSpawnerScript::new(SpawnerConfig {
            prefabs: Vec::new(),
            ..config(10)
        });
        scene.start(&mut spawner);

        assert!(scene.objects.is_empty());
    }

    #[test]
    fn degenerate_region_still_samples() {
        let mut scene = TestScene::new();
        let point = SpawnRegion::new(Vec2::ONE, Vec2::ONE).sample(&mut scene.rng);
        assert_eq!(point, Vec2::ONE);
    }
}
