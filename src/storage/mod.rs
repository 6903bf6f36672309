//! Storage Layer
//!
//! Resolves per-user directories for configuration and default inputs.

use anyhow::Result;
use std::path::PathBuf;

/// File name of the default probe video
pub const DEFAULT_VIDEO_NAME: &str = "wr.mp4";

fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "pinglens", "PingLens")
        .ok_or_else(|| anyhow::anyhow!("Could not determine project directories"))
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = project_dirs()?.config_dir().to_path_buf();
    std::fs::create_dir_all(&config_dir)?;
    Ok(config_dir)
}

/// Default location of the configuration file
pub fn default_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.toml"))
}

/// Default video input: `wr.mp4` in the user's download directory
pub fn default_video_path() -> Result<PathBuf> {
    let user_dirs = directories::UserDirs::new()
        .ok_or_else(|| anyhow::anyhow!("Could not determine user directories"))?;

    let downloads = user_dirs
        .download_dir()
        .map(|d| d.to_path_buf())
        .unwrap_or_else(|| user_dirs.home_dir().join("Download"));

    Ok(downloads.join(DEFAULT_VIDEO_NAME))
}
