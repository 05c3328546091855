use glam::Vec2;
use rstest::rstest;
use tidepool::{
    SceneConfig, Simulation,
    coherent_noise::FlatNoise,
    config::HookSetup,
    game_object::ObjectKind,
    input::Key,
    physics::PhysicsConfig,
    scene_script::SceneEvent,
    scripts::{
        area_spawner::{PrefabConfig, SpawnRegion, SpawnerConfig},
        floating_drift::DriftConfig,
        hook::HookConfig,
        soft_body::SoftBodyConfig,
    },
};

const FRAME: f32 = 1.0 / 60.0;

fn still_trash(name: &str) -> PrefabConfig {
    PrefabConfig {
        gravity_scale: 0.0,
        soft_body: SoftBodyConfig {
            buoyancy: 0.0,
            ..SoftBodyConfig::default()
        },
        drift: DriftConfig {
            sway_amplitude: 0.0,
            bob_amplitude: 0.0,
            noise_strength: 0.0,
            drift_distance: 0.0,
            wander_chance: 0.0,
            ..DriftConfig::default()
        },
        ..PrefabConfig::named(name)
    }
}

/// One hook hanging straight down from (0, 4) over a single piece of trash.
fn catch_scene() -> SceneConfig {
    SceneConfig {
        physics: PhysicsConfig {
            gravity: Vec2::ZERO,
            ..PhysicsConfig::default()
        },
        hooks: vec![HookSetup {
            tuning: HookConfig {
                max_swing_angle_degrees: 0.0,
                position_smoothing: 0.0,
                ..HookConfig::default()
            },
            ..HookSetup::default()
        }],
        swimmers: Vec::new(),
        spawners: vec![SpawnerConfig {
            region: Some(SpawnRegion::new(Vec2::ZERO, Vec2::ZERO)),
            count: 1,
            prefabs: vec![still_trash("bottle")],
        }],
        input_script: Vec::new(),
        ..SceneConfig::default()
    }
}

#[test]
fn dropped_hook_catches_and_scores_trash() {
    let mut sim = Simulation::from_config(&catch_scene()).with_noise(Box::new(FlatNoise(0.5)));
    sim.step_frame(FRAME);
    assert_eq!(sim.objects().count_kind(ObjectKind::Trash), 1);

    sim.press(Key::Down);
    sim.step_frame(FRAME);
    sim.release(Key::Down);

    sim.run_for(5.0, FRAME);

    assert_eq!(sim.score(), 1);
    assert_eq!(sim.objects().count_kind(ObjectKind::Trash), 0);
    assert!(matches!(sim.events().first(), Some(SceneEvent::Grabbed { .. })));
    assert!(matches!(
        sim.events().last(),
        Some(SceneEvent::Consumed { name, .. }) if name == "bottle"
    ));
}

#[test]
fn released_trash_is_not_scored() {
    let mut sim = Simulation::from_config(&catch_scene()).with_noise(Box::new(FlatNoise(0.5)));
    sim.press(Key::Down);
    sim.step_frame(FRAME);
    sim.release(Key::Down);

    let mut grabbed = false;
    for _ in 0..300 {
        sim.step_frame(FRAME);
        if sim
            .events()
            .iter()
            .any(|event| matches!(event, SceneEvent::Grabbed { .. }))
        {
            grabbed = true;
            break;
        }
    }
    assert!(grabbed, "hook never reached the trash");

    sim.press(Key::Space);
    sim.step_frame(FRAME);
    sim.release(Key::Space);
    sim.run_for(3.0, FRAME);

    assert_eq!(sim.score(), 0);
    assert_eq!(sim.objects().count_kind(ObjectKind::Trash), 1);
    assert!(
        sim.events()
            .iter()
            .any(|event| matches!(event, SceneEvent::Released { .. }))
    );
}

#[test]
fn spawner_without_region_leaves_scene_empty_of_trash() {
    let mut config = catch_scene();
    config.spawners[0].region = None;

    let mut sim = Simulation::from_config(&config);
    sim.run_for(1.0, FRAME);

    assert_eq!(sim.objects().count_kind(ObjectKind::Trash), 0);
    assert_eq!(sim.score(), 0);
}

#[rstest]
#[case(1)]
#[case(7)]
#[case(42)]
fn default_scene_keeps_swimmers_and_hook_in_bounds(#[case] seed: u64) {
    let mut config = SceneConfig {
        seed,
        noise_seed: seed as u32,
        ..SceneConfig::default()
    };
    config.hooks[0].tuning.position_smoothing = 0.0;

    let bands: Vec<(String, f32, f32)> = config
        .swimmers
        .iter()
        .map(|swimmer| {
            (
                swimmer.name.clone(),
                swimmer.position.x,
                swimmer.tuning.patrol_distance,
            )
        })
        .collect();
    let max_rope = config.hooks[0].tuning.max_rope_length;

    let mut sim = Simulation::from_config(&config);
    for _ in 0..(12.0 / FRAME) as usize {
        sim.step_frame(FRAME);

        let objects = sim.objects();
        for (_, object) in objects.iter() {
            if let Some((_, start_x, distance)) =
                bands.iter().find(|(name, _, _)| *name == object.name)
            {
                assert!(
                    (object.position.x - start_x).abs() <= distance + 1e-4,
                    "{} left its band at {:?}",
                    object.name,
                    object.position
                );
            }
        }

        let pivot = objects
            .iter()
            .find(|(_, object)| object.kind == ObjectKind::Pivot)
            .map(|(_, object)| object.position)
            .unwrap();
        let hook = objects
            .iter()
            .find(|(_, object)| object.kind == ObjectKind::Hook)
            .map(|(_, object)| object.position)
            .unwrap();
        assert!(hook.distance(pivot) <= max_rope + 1e-3);
    }

    let consumed = sim
        .events()
        .iter()
        .filter(|event| matches!(event, SceneEvent::Consumed { .. }))
        .count();
    assert_eq!(sim.score() as usize, consumed);
    assert!(sim.objects().count_kind(ObjectKind::Trash) + consumed <= 12);
}

#[test]
fn escape_stops_the_run() {
    let mut config = catch_scene();
    config.input_script = vec![
        tidepool::scene_script::wait(0.5),
        tidepool::scene_script::press(Key::Escape),
    ];

    let mut sim = Simulation::from_config(&config);
    let frames = sim.run_for(10.0, FRAME);

    assert!(sim.is_exit_requested());
    assert!(frames < 60);
}
