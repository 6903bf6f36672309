//! Capture Layer
//!
//! Produces source images for the probe: reference screenshots loaded from
//! the asset directory, and frames decoded from a local video.

pub mod assets;
pub mod frame;
pub mod video;

use std::path::PathBuf;
use thiserror::Error;

pub use assets::AssetStore;
pub use frame::SourceFrame;
pub use video::{frame_timestamp, FfmpegFrameSource, FrameSource};

/// Errors while loading or decoding source images
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("asset '{name}' not found in {dir}")]
    AssetNotFound { name: String, dir: PathBuf },
    #[error("failed to decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to run {program}: {source}")]
    Tool {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} failed on {path}: {message}")]
    ToolFailed {
        program: String,
        path: PathBuf,
        message: String,
    },
    #[error("unexpected video metadata: {0}")]
    Metadata(String),
}
