pub mod coherent_noise;
pub mod config;
pub mod error;
pub mod game_object;
pub mod input;
pub mod logging;
pub mod math;
pub mod physics;
pub mod scene_objects;
pub mod scene_script;
pub mod scripts;
pub mod simulation;

#[cfg(test)]
mod test_support;

pub use config::SceneConfig;
pub use error::ConfigError;
pub use simulation::Simulation;
