pub mod area_spawner;
pub mod floating_drift;
pub mod hook;
pub mod patrol_swim;
pub mod soft_body;

pub use area_spawner::AreaSpawnerScript;
pub use floating_drift::FloatingDriftScript;
pub use hook::{HookScript, HookState};
pub use patrol_swim::PatrolSwimScript;
pub use soft_body::SoftBodyScript;
