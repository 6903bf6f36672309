//! PingLens - ping readout and face contour probe
//!
//! Crops a fixed region out of a game screenshot or video frame, hands it to
//! a text recognizer or face detector and shows what was found.

mod app;
mod capture;
mod config;
mod dashboard;
mod shared;
mod storage;
mod vision;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app::ProbeController;
use crate::config::AppConfig;
use crate::vision::{
    CommandFaceDetector, DisplayTarget, FaceDetector, ProfileId, TesseractCli, TextRecognizer,
    UnconfiguredFaceDetector,
};

/// PingLens - read ping values and face contours from game captures
#[derive(Parser, Debug)]
#[command(name = "ping-lens")]
#[command(about = "Reads ping readouts and face contours out of game screenshots and video frames")]
struct Args {
    /// Run without a window, printing results to stdout
    #[arg(long)]
    headless: bool,

    /// Region profile (pubg, wild-rift, wild-rift-720p)
    #[arg(short, long)]
    profile: Option<ProfileId>,

    /// Use this image instead of the profile's reference screenshot
    #[arg(short, long)]
    image: Option<PathBuf>,

    /// Video to poll (defaults to wr.mp4 in the download directory)
    #[arg(long)]
    video: Option<PathBuf>,

    /// Headless display target as WIDTHxHEIGHT
    #[arg(long, value_parser = parse_display)]
    display: Option<DisplayTarget>,

    /// What to run in headless mode
    #[arg(short, long, value_enum, default_value_t = Action::Text)]
    action: Action,

    /// Write the recognition input (with face contours, if any) to this PNG
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file (defaults to the per-user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Action {
    /// Run text recognition once
    Text,
    /// Run face detection once
    Face,
    /// Poll frames from the video
    Video,
}

fn parse_display(value: &str) -> Result<DisplayTarget, String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", value))?;
    let width = width.trim().parse::<u32>().map_err(|e| format!("bad width: {}", e))?;
    let height = height.trim().parse::<u32>().map_err(|e| format!("bad height: {}", e))?;
    DisplayTarget::new(width, height).map_err(|e| e.to_string())
}

/// Where the configuration came from
enum ConfigOrigin {
    Loaded(PathBuf),
    Created(PathBuf),
    Defaults(String),
}

impl fmt::Display for ConfigOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigOrigin::Loaded(path) => write!(f, "loaded from {}", path.display()),
            ConfigOrigin::Created(path) => write!(f, "defaults written to {}", path.display()),
            ConfigOrigin::Defaults(reason) => write!(f, "defaults ({})", reason),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Configuration comes first so its log level can seed the filter
    let (mut config, origin) = load_or_create_config(args.config.as_deref())?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("PingLens starting...");
    info!("Configuration: {}", origin);

    if let Some(profile) = args.profile {
        config.general.default_profile = profile;
    }
    if let Some(display) = args.display {
        config.display.width = display.width;
        config.display.height = display.height;
    }

    let video_path = match args.video.clone().or_else(|| config.video.path.clone()) {
        Some(path) => path,
        None => storage::default_video_path()?,
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("ping-lens-worker")
        .build()
        .context("Failed to start tokio runtime")?;

    let tesseract = TesseractCli::new(&config.recognition);
    info!("Text recognition through {}", tesseract.program());
    let text: Arc<dyn TextRecognizer> = Arc::new(tesseract);
    let faces: Arc<dyn FaceDetector> =
        match CommandFaceDetector::from_command(&config.recognition.face_detector_command) {
            Some(detector) => Arc::new(detector),
            None => {
                info!("No face detector command configured");
                Arc::new(UnconfiguredFaceDetector)
            }
        };

    let profile = config.general.default_profile;
    let mut controller = ProbeController::new(config, runtime.handle().clone(), text, faces);
    match &args.image {
        Some(path) => controller.select_image_file(profile, path),
        None => controller.select_profile(profile),
    }

    if args.headless {
        let shutdown = CancellationToken::new();
        let signal = shutdown.clone();
        runtime.spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                signal.cancel();
            }
        });
        run_headless(&mut controller, &args, video_path, &shutdown)?;
    } else {
        info!("Running in dashboard mode");
        if let Err(e) = dashboard::run_dashboard(controller, video_path) {
            error!("Dashboard error: {}", e);
        }
    }

    info!("PingLens shutdown complete");
    Ok(())
}

/// Load configuration from an explicit path, or from the per-user location,
/// writing defaults there on first run
fn load_or_create_config(explicit: Option<&Path>) -> Result<(AppConfig, ConfigOrigin)> {
    if let Some(path) = explicit {
        let config = config::load_config(path)?;
        return Ok((config, ConfigOrigin::Loaded(path.to_path_buf())));
    }

    let path = match storage::default_config_path() {
        Ok(path) => path,
        Err(e) => return Ok((AppConfig::default(), ConfigOrigin::Defaults(e.to_string()))),
    };

    if path.exists() {
        return match config::load_config(&path) {
            Ok(config) => Ok((config, ConfigOrigin::Loaded(path))),
            Err(e) => Ok((AppConfig::default(), ConfigOrigin::Defaults(format!("{:#}", e)))),
        };
    }

    let config = AppConfig::default();
    match config::save_config(&config, &path) {
        Ok(()) => Ok((config, ConfigOrigin::Created(path))),
        Err(e) => Ok((config, ConfigOrigin::Defaults(format!("{:#}", e)))),
    }
}

/// Drive the controller from the terminal until the chosen action settles
fn run_headless(
    controller: &mut ProbeController,
    args: &Args,
    video_path: PathBuf,
    shutdown: &CancellationToken,
) -> Result<()> {
    let display = &controller.config().display;
    let (width, height) = (display.width, display.height);
    controller.measure_display(width, height)?;

    if args.action != Action::Video && controller.prepared().is_none() {
        let reason = controller.state().last_error.clone().unwrap_or_default();
        bail!("Nothing to recognize for profile {}: {}", controller.profile(), reason);
    }

    match args.action {
        Action::Text => {
            controller.run_text_recognition();
        }
        Action::Face => {
            controller.run_face_detection();
        }
        Action::Video => {
            info!("Polling {}", video_path.display());
            controller.start_video(video_path)?;
        }
    }

    let mut last_frame = 0;
    let mut last_label = controller.state().status_label.clone();
    while !controller.is_idle() {
        if shutdown.is_cancelled() && controller.state().video_running {
            warn!("Interrupted, stopping video");
            controller.stop_video();
        }
        if !controller.wait_event(Duration::from_millis(100)) {
            continue;
        }

        let state = controller.state();
        if state.frame_index != last_frame || state.status_label != last_label {
            println!("[frame {}] {}", state.frame_index, state.status_label);
            last_frame = state.frame_index;
            last_label = state.status_label.clone();
        }
    }

    let state = controller.state();
    println!("{}", state.status_label);
    if let Some(notice) = &state.notice {
        println!("{}", notice);
    }

    if let Some(path) = &args.output {
        let image = controller
            .face_overlay()
            .or_else(|| controller.prepared().map(|p| &p.recognition_input));
        match image {
            Some(image) => {
                image
                    .save(path)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                info!("Wrote {}", path.display());
            }
            None => warn!("No image to write to {}", path.display()),
        }
    }

    if let Some(e) = &controller.state().last_error {
        bail!("{}", e);
    }
    Ok(())
}
