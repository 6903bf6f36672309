//! Frame data structures for source images

use image::RgbaImage;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Where a source image came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOrigin {
    /// Bundled reference screenshot
    Asset(String),
    /// Image file given explicitly
    File(PathBuf),
}

impl fmt::Display for FrameOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameOrigin::Asset(name) => write!(f, "asset {}", name),
            FrameOrigin::File(path) => write!(f, "file {}", path.display()),
        }
    }
}

/// An immutable decoded source image.
///
/// Replaced wholesale on each selection; requests carry a clone of the
/// `Arc`, never a reference into controller state.
#[derive(Debug, Clone)]
pub struct SourceFrame {
    pub image: Arc<RgbaImage>,
    pub origin: FrameOrigin,
}

impl SourceFrame {
    /// Wrap a decoded image
    pub fn new(image: RgbaImage, origin: FrameOrigin) -> Self {
        Self {
            image: Arc::new(image),
            origin,
        }
    }

    /// Get frame dimensions as (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions_and_origin() {
        let frame = SourceFrame::new(RgbaImage::new(1920, 1080), FrameOrigin::File(PathBuf::from("shot.png")));
        assert_eq!(frame.dimensions(), (1920, 1080));
        assert_eq!(frame.origin.to_string(), "file shot.png");
        assert_eq!(FrameOrigin::Asset("pubg_hd.png".into()).to_string(), "asset pubg_hd.png");
    }
}
