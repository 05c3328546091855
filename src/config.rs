use std::{fs, path::Path};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{
    error::ConfigError,
    game_object::{ObjectKind, RenderLayer},
    input::Key,
    physics::PhysicsConfig,
    scene_script::{InputCommand, press, release, wait},
    scripts::{
        area_spawner::{PrefabConfig, SpawnRegion, SpawnerConfig},
        hook::HookConfig,
        patrol_swim::PatrolConfig,
    },
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HookSetup {
    pub name: String,
    pub position: Vec2,
    /// Rope anchor. Without one the hook swings from its own start position.
    pub pivot: Option<Vec2>,
    pub grab_radius: f32,
    pub tuning: HookConfig,
}

impl Default for HookSetup {
    fn default() -> Self {
        Self {
            name: "hook".to_owned(),
            position: Vec2::new(0.0, 3.2),
            pivot: Some(Vec2::new(0.0, 4.0)),
            grab_radius: 0.35,
            tuning: HookConfig::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwimmerSetup {
    pub name: String,
    pub kind: ObjectKind,
    pub position: Vec2,
    pub scale: f32,
    pub radius: f32,
    pub layer: RenderLayer,
    pub z_index: i32,
    pub tuning: PatrolConfig,
}

impl Default for SwimmerSetup {
    fn default() -> Self {
        Self {
            name: "fish".to_owned(),
            kind: ObjectKind::Fish,
            position: Vec2::ZERO,
            scale: 1.0,
            radius: 0.3,
            layer: RenderLayer::Creatures,
            z_index: 0,
            tuning: PatrolConfig::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub seed: u64,
    pub noise_seed: u32,
    pub physics: PhysicsConfig,
    pub hooks: Vec<HookSetup>,
    pub swimmers: Vec<SwimmerSetup>,
    pub spawners: Vec<SpawnerConfig>,
    /// Timed key presses replayed into the input state.
    pub input_script: Vec<InputCommand>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            noise_seed: 0,
            physics: PhysicsConfig::default(),
            hooks: vec![HookSetup::default()],
            swimmers: default_swimmers(),
            spawners: vec![SpawnerConfig {
                region: Some(SpawnRegion::new(Vec2::new(-3.0, -3.5), Vec2::new(3.0, 0.5))),
                count: 12,
                prefabs: vec![
                    PrefabConfig::named("bottle"),
                    PrefabConfig {
                        radius: 0.2,
                        mass: 0.6,
                        ..PrefabConfig::named("can")
                    },
                    PrefabConfig {
                        radius: 0.35,
                        mass: 0.3,
                        gravity_scale: 0.05,
                        ..PrefabConfig::named("bag")
                    },
                ],
            }],
            input_script: default_input_script(),
        }
    }
}

fn default_swimmers() -> Vec<SwimmerSetup> {
    vec![
        SwimmerSetup {
            name: "clownfish".to_owned(),
            position: Vec2::new(-1.0, -1.0),
            ..SwimmerSetup::default()
        },
        SwimmerSetup {
            name: "tang".to_owned(),
            position: Vec2::new(2.0, -2.5),
            tuning: PatrolConfig {
                start_direction: -1.0,
                sprite_faces_left: true,
                ..PatrolConfig::default()
            },
            ..SwimmerSetup::default()
        },
        SwimmerSetup {
            name: "turtle".to_owned(),
            kind: ObjectKind::Turtle,
            position: Vec2::new(0.0, -3.5),
            scale: 1.6,
            radius: 0.6,
            tuning: PatrolConfig {
                base_speed: 0.6,
                speed_variance: 0.2,
                patrol_distance: 5.0,
                max_tilt_degrees: 5.0,
                ..PatrolConfig::default()
            },
            ..SwimmerSetup::default()
        },
    ]
}

fn default_input_script() -> Vec<InputCommand> {
    let mut commands = Vec::new();
    for _ in 0..3 {
        commands.extend([
            wait(1.5),
            press(Key::Down),
            wait(0.1),
            release(Key::Down),
            wait(2.2),
            press(Key::Up),
            wait(0.1),
            release(Key::Up),
            wait(2.5),
        ]);
    }
    commands
}

impl SceneConfig {
    pub fn from_json_str(raw: &str, origin: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(|source| ConfigError::Parse {
            path: origin.to_owned(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_json_str(&raw, &path.display().to_string())
    }

    pub fn save_to_json_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;

        fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    /// Rejects tunings the simulation cannot run with. Missing pivots and
    /// spawn regions are allowed; they are handled at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let physics = &self.physics;
        if !(physics.fixed_dt > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "physics.fixed_dt must be positive, got {}",
                physics.fixed_dt
            )));
        }

        for hook in &self.hooks {
            let tuning = &hook.tuning;
            if tuning.swing_rope_length < 0.0 || tuning.swing_rope_length > tuning.max_rope_length {
                return Err(ConfigError::Invalid(format!(
                    "hook '{}': rope lengths must satisfy 0 <= swing ({}) <= max ({})",
                    hook.name, tuning.swing_rope_length, tuning.max_rope_length
                )));
            }
            if tuning.rope_speed <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "hook '{}': rope_speed must be positive",
                    hook.name
                )));
            }
            if !(0.0..=1.0).contains(&tuning.damping) {
                return Err(ConfigError::Invalid(format!(
                    "hook '{}': damping must be within [0, 1], got {}",
                    hook.name, tuning.damping
                )));
            }
        }

        for swimmer in &self.swimmers {
            if !(swimmer.tuning.patrol_distance > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "swimmer '{}': patrol_distance must be positive",
                    swimmer.name
                )));
            }
        }

        for spawner in &self.spawners {
            let bad_prefab = spawner
                .prefabs
                .iter()
                .find(|prefab| prefab.radius < 0.0 || prefab.mass <= 0.0);
            if let Some(prefab) = bad_prefab {
                return Err(ConfigError::Invalid(format!(
                    "prefab '{}': radius must be >= 0 and mass > 0",
                    prefab.name
                )));
            }
        }

        Ok(())
    }
}
