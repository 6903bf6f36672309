//! Reference screenshot loading

use image::RgbaImage;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::frame::{FrameOrigin, SourceFrame};
use super::CaptureError;

/// Directory of bundled reference screenshots, addressed by logical name
#[derive(Debug, Clone)]
pub struct AssetStore {
    dir: PathBuf,
}

impl AssetStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load and decode an asset by name
    pub fn load(&self, name: &str) -> Result<SourceFrame, CaptureError> {
        let path = self.dir.join(name);
        if !path.is_file() {
            return Err(CaptureError::AssetNotFound {
                name: name.to_string(),
                dir: self.dir.clone(),
            });
        }

        let image = decode_file(&path)?;
        debug!("Loaded asset {} ({}x{})", name, image.width(), image.height());
        Ok(SourceFrame::new(image, FrameOrigin::Asset(name.to_string())))
    }
}

/// Decode an image file from any path
pub fn load_image_file(path: &Path) -> Result<SourceFrame, CaptureError> {
    let image = decode_file(path)?;
    Ok(SourceFrame::new(image, FrameOrigin::File(path.to_path_buf())))
}

fn decode_file(path: &Path) -> Result<RgbaImage, CaptureError> {
    let image = image::open(path).map_err(|source| CaptureError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(image.to_rgba8())
}
