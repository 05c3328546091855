use glam::Vec2;

use crate::{
    config::{HookSetup, SceneConfig, SwimmerSetup},
    game_object::{GameObject2D, ObjectKind, RenderLayer, SceneObjects},
    physics::{Body, Collider},
    scene_script::SceneScript,
    scripts::{AreaSpawnerScript, HookScript, PatrolSwimScript},
};

fn hook_script(setup: &HookSetup, objects: &mut SceneObjects) -> Box<dyn SceneScript> {
    let pivot = setup.pivot.map(|position| {
        objects.spawn(GameObject2D::new(
            format!("{}_pivot", setup.name),
            ObjectKind::Pivot,
            position,
            RenderLayer::Rig,
            0,
        ))
    });

    let hook = objects.spawn(
        GameObject2D::new(
            setup.name.clone(),
            ObjectKind::Hook,
            setup.position,
            RenderLayer::Rig,
            2,
        )
        .with_body(Body::kinematic())
        .with_collider(Collider::trigger(setup.grab_radius)),
    );

    Box::new(HookScript::new(hook, pivot, setup.tuning.clone()))
}

fn swimmer_script(setup: &SwimmerSetup, objects: &mut SceneObjects) -> Box<dyn SceneScript> {
    let swimmer = objects.spawn(
        GameObject2D::new(
            setup.name.clone(),
            setup.kind,
            setup.position,
            setup.layer,
            setup.z_index,
        )
        .with_scale(Vec2::splat(setup.scale))
        .with_body(Body::kinematic())
        .with_collider(Collider::solid(setup.radius)),
    );

    Box::new(PatrolSwimScript::new(swimmer, setup.tuning.clone()))
}

/// Spawns the static part of the scene and returns the scripts that drive it.
/// Trash is placed later by the spawners' `start`.
pub fn create_initial_scene_scripts(
    config: &SceneConfig,
    objects: &mut SceneObjects,
) -> Vec<Box<dyn SceneScript>> {
    let mut scripts: Vec<Box<dyn SceneScript>> = Vec::new();

    for setup in &config.hooks {
        scripts.push(hook_script(setup, objects));
    }
    for setup in &config.swimmers {
        scripts.push(swimmer_script(setup, objects));
    }
    for spawner in &config.spawners {
        scripts.push(Box::new(AreaSpawnerScript::new(spawner.clone())));
    }

    scripts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scene_builds_rig_and_swimmers() {
        let config = SceneConfig::default();
        let mut objects = SceneObjects::new();

        let scripts = create_initial_scene_scripts(&config, &mut objects);

        assert_eq!(scripts.len(), 1 + 3 + 1);
        assert_eq!(objects.count_kind(ObjectKind::Hook), 1);
        assert_eq!(objects.count_kind(ObjectKind::Pivot), 1);
        assert_eq!(objects.count_kind(ObjectKind::Fish), 2);
        assert_eq!(objects.count_kind(ObjectKind::Turtle), 1);
        assert_eq!(objects.count_kind(ObjectKind::Trash), 0);
    }

    #[test]
    fn hook_without_pivot_spawns_no_pivot_object() {
        let config = SceneConfig {
            hooks: vec![HookSetup {
                pivot: None,
                ..HookSetup::default()
            }],
            swimmers: Vec::new(),
            spawners: Vec::new(),
            ..SceneConfig::default()
        };
        let mut objects = SceneObjects::new();

        create_initial_scene_scripts(&config, &mut objects);

        assert_eq!(objects.count_kind(ObjectKind::Pivot), 0);
        assert_eq!(objects.len(), 1);
    }
}
