//! Application Configuration
//!
//! User settings and preferences stored in TOML format.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::vision::ProfileId;

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// General settings
    pub general: GeneralConfig,
    /// Display target used when no window measures one
    pub display: DisplaySettings,
    /// Reference asset settings
    pub assets: AssetSettings,
    /// Video polling settings
    pub video: VideoSettings,
    /// Recognition backend settings
    pub recognition: RecognitionSettings,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Default tracing filter when RUST_LOG is unset
    pub log_level: String,
    /// Profile selected at startup
    pub default_profile: ProfileId,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            default_profile: ProfileId::Pubg,
        }
    }
}

/// Display target for headless runs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub width: u32,
    pub height: u32,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        // Portrait phone-sized surface
        Self {
            width: 1080,
            height: 1920,
        }
    }
}

/// Where bundled reference screenshots live
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetSettings {
    pub dir: PathBuf,
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("assets"),
        }
    }
}

/// How the poller advances relative to recognition completions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FramePacing {
    /// Wait for each frame's recognition before requesting the next
    #[default]
    AwaitCompletion,
    /// Advance every tick; requests may overlap and complete out of order
    FireAndForget,
}

/// Video polling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoSettings {
    /// Video file; defaults to `wr.mp4` in the user's download directory
    pub path: Option<PathBuf>,
    /// Delay between polling ticks in milliseconds
    pub tick_interval_ms: u64,
    /// Seconds of video between consecutive frames
    pub frame_step_secs: u64,
    pub pacing: FramePacing,
    /// Stop after this many frames
    pub max_frames: Option<u64>,
    pub ffmpeg_program: String,
    pub ffprobe_program: String,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            path: None,
            tick_interval_ms: 10,
            frame_step_secs: 1,
            pacing: FramePacing::AwaitCompletion,
            max_frames: None,
            ffmpeg_program: "ffmpeg".to_string(),
            ffprobe_program: "ffprobe".to_string(),
        }
    }
}

impl VideoSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

/// Recognition backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionSettings {
    pub tesseract_program: String,
    /// Tesseract language code (e.g., "eng")
    pub language: String,
    /// Tesseract page segmentation mode
    pub page_segmentation: u8,
    /// Face detector command line; the image path is appended
    pub face_detector_command: Vec<String>,
    /// Substring that marks a ping readout
    pub ping_marker: String,
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self {
            tesseract_program: "tesseract".to_string(),
            language: "eng".to_string(),
            page_segmentation: 6,
            face_detector_command: Vec::new(),
            ping_marker: crate::vision::interpret::PING_MARKER.to_string(),
        }
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
