use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use tidepool::{SceneConfig, Simulation, game_object::ObjectKind, logging};

/// Headless run of the underwater trash-fishing scene
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scene config (JSON). Uses the built-in scene when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Simulated seconds to run
    #[arg(long, default_value_t = 20.0)]
    seconds: f32,

    /// Frames per simulated second
    #[arg(long, default_value_t = 60.0)]
    fps: f32,

    /// Override the scene's random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Write the effective config to this path and exit
    #[arg(long)]
    dump_config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.verbose);

    let mut config = match &args.config {
        Some(path) => match SceneConfig::load_from_json_file(path) {
            Ok(config) => config,
            Err(err) => {
                log::error!("{err}");
                return ExitCode::FAILURE;
            }
        },
        None => SceneConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    if let Some(path) = &args.dump_config {
        if let Err(err) = config.save_to_json_file(path) {
            log::error!("{err}");
            return ExitCode::FAILURE;
        }
        log::info!("wrote scene config to {}", path.display());
        return ExitCode::SUCCESS;
    }

    if !(args.fps > 0.0) {
        log::error!("--fps must be positive, got {}", args.fps);
        return ExitCode::FAILURE;
    }

    let mut simulation = Simulation::from_config(&config);
    let frames = simulation.run_for(args.seconds, 1.0 / args.fps);

    let objects = simulation.objects();
    log::info!(
        "ran {frames} frames ({:.1}s): score {}, {} trash left, {} scripts active",
        simulation.time(),
        simulation.score(),
        objects.count_kind(ObjectKind::Trash),
        simulation.active_scripts(),
    );
    if simulation.is_exit_requested() {
        log::info!("exit requested");
    }

    ExitCode::SUCCESS
}
