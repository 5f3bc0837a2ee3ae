use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;

use visage_core::capture::infrastructure::still_image_source::StillImageSourceFactory;
use visage_core::detection::infrastructure::recorded_detector::RecordedDetectorFactory;
use visage_core::session::domain::landmark_config::LandmarkConfig;
use visage_core::session::domain::landmark_events::{LandmarkEvent, LandmarkEventKind};
use visage_core::session::infrastructure::interval_tick_scheduler::IntervalTickScheduler;
use visage_core::session::landmark_loop_manager::LandmarkLoopManager;
use visage_core::shared::constants::DEFAULT_TICK_RATE_HZ;

/// Runs the face landmark loop over a still image with a recorded detector.
#[derive(Parser)]
#[command(name = "visage")]
struct Cli {
    /// Image served as the live frame source.
    #[arg(long)]
    image: PathBuf,

    /// JSON recording of detection passes to replay.
    #[arg(long)]
    recording: PathBuf,

    /// JSON config file (defaults to the platform config dir if present).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum number of faces to track.
    #[arg(long)]
    max_faces: Option<usize>,

    /// Request refined landmarks around eyes and lips.
    #[arg(long)]
    refine_landmarks: bool,

    /// Report x-coordinates as captured instead of mirrored.
    #[arg(long)]
    no_mirror: bool,

    /// Emulated display refresh rate.
    #[arg(long, default_value_t = DEFAULT_TICK_RATE_HZ)]
    fps: u32,

    /// Number of ticks to run before disposing.
    #[arg(long, default_value = "90")]
    ticks: usize,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let config = build_config(&cli)?;
    let scheduler = Arc::new(IntervalTickScheduler::new(cli.fps)?);
    let detector_factory = RecordedDetectorFactory::load(&cli.recording)?;

    let mut manager =
        LandmarkLoopManager::new(config, Box::new(detector_factory), scheduler.clone())
            .with_frame_source_factory(Box::new(StillImageSourceFactory::new(&cli.image)));

    manager.on(LandmarkEventKind::FaceDetected, |event: &LandmarkEvent<'_>| {
        if let LandmarkEvent::FaceDetected(faces) = event {
            let vertex_count = faces.first().map_or(0, |face| face.keypoints.len());
            log::info!("Faces: {}, vertices: {vertex_count}", faces.len());
        }
    });
    manager.on(LandmarkEventKind::Error, |event: &LandmarkEvent<'_>| {
        if let LandmarkEvent::Error(e) = event {
            log::info!("Error event: {e}");
        }
    });

    manager.initialize(None)?;

    let timeout = scheduler.period() * 4;
    for _ in 0..cli.ticks {
        let Some(tick) = scheduler.next_tick(timeout) else {
            log::warn!("No tick pending; loop is {}", manager.state());
            break;
        };
        manager.fire(tick);
    }

    manager.dispose();
    if let Some(summary) = manager.stats().summary_string() {
        log::info!("{summary}");
    }
    Ok(())
}

fn build_config(cli: &Cli) -> Result<LandmarkConfig, Box<dyn std::error::Error>> {
    let path = cli
        .config
        .clone()
        .or_else(|| LandmarkConfig::default_path().filter(|p| p.exists()));
    let mut config = match path {
        Some(path) => {
            log::info!("Loading config from {}", path.display());
            LandmarkConfig::load(&path)?
        }
        None => LandmarkConfig::default(),
    };

    if let Some(max_faces) = cli.max_faces {
        config.max_faces = max_faces;
    }
    if cli.refine_landmarks {
        config.refine_landmarks = true;
    }
    if cli.no_mirror {
        config.mirror = false;
    }
    Ok(config.normalized())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.image.exists() {
        return Err(format!("Image file not found: {}", cli.image.display()).into());
    }
    if !cli.recording.exists() {
        return Err(format!("Recording not found: {}", cli.recording.display()).into());
    }
    if cli.fps == 0 {
        return Err("FPS must be at least 1".into());
    }
    if cli.max_faces == Some(0) {
        return Err("Max faces must be at least 1".into());
    }
    Ok(())
}
