//! Region extraction and scaling
//!
//! Turns a source screenshot into the two images the probe works with: a
//! preview of the whole frame fitted to the display, and the profile region
//! cropped out and fitted to the same display for recognition.

use image::imageops::{self, FilterType};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use super::region::RegionProfile;
use super::VisionError;

/// Pixel size of the surface an image is rendered into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplayTarget {
    pub width: u32,
    pub height: u32,
}

impl DisplayTarget {
    /// Create a display target, rejecting unmeasured (zero) surfaces
    pub fn new(width: u32, height: u32) -> Result<Self, VisionError> {
        if width == 0 || height == 0 {
            return Err(VisionError::InvalidDisplayTarget { width, height });
        }
        Ok(Self { width, height })
    }
}

impl fmt::Display for DisplayTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Output of the recognition pipeline for one source image
#[derive(Debug, Clone)]
pub struct PreparedFrame {
    /// Whole source frame fitted to the display
    pub preview: Arc<RgbaImage>,
    /// Profile region fitted to the display, handed to recognizers
    pub recognition_input: Arc<RgbaImage>,
    /// Source dimensions before scaling
    pub source_size: (u32, u32),
}

/// Compute fitted dimensions for a source inside a target box.
///
/// The scale factor is `max(sw / tw, sh / th)`. Dimensions are divided by it
/// and truncated. Integer arithmetic keeps the limiting axis exactly on the
/// target; the other axis is floored and clamped to at least one pixel.
pub fn fitted_size(source: (u32, u32), target: DisplayTarget) -> (u32, u32) {
    let (sw, sh) = (source.0 as u64, source.1 as u64);
    let (tw, th) = (target.width as u64, target.height as u64);

    // sw / tw >= sh / th  <=>  sw * th >= sh * tw
    let (w, h) = if sw * th >= sh * tw {
        (tw, sh * tw / sw)
    } else {
        (sw * th / sh, th)
    };

    (w.max(1) as u32, h.max(1) as u32)
}

/// Uniformly scale an image so it fits the display target
pub fn scale_to_fit(source: &RgbaImage, target: DisplayTarget) -> Result<RgbaImage, VisionError> {
    let target = DisplayTarget::new(target.width, target.height)?;
    let (sw, sh) = source.dimensions();
    if sw == 0 || sh == 0 {
        return Err(VisionError::EmptyImage);
    }

    let (w, h) = fitted_size((sw, sh), target);
    debug!("Scaling {}x{} to {}x{} for target {}", sw, sh, w, h, target);

    Ok(imageops::resize(source, w, h, FilterType::Triangle))
}

/// Extract the profile rectangle from the source image.
///
/// Fails without touching any pixels if the rectangle is not fully inside
/// the image.
pub fn crop_region(source: &RgbaImage, profile: &RegionProfile) -> Result<RgbaImage, VisionError> {
    let (iw, ih) = source.dimensions();
    let rect = profile.rect;

    if !rect.fits_within(iw, ih) {
        return Err(VisionError::RegionOutOfBounds {
            profile: profile.id,
            rect,
            image_width: iw,
            image_height: ih,
        });
    }

    Ok(imageops::crop_imm(source, rect.x, rect.y, rect.width, rect.height).to_image())
}

/// Produce the preview and the recognition input for a source image
pub fn prepare_for_recognition(
    source: &RgbaImage,
    profile: &RegionProfile,
    display: DisplayTarget,
) -> Result<PreparedFrame, VisionError> {
    let preview = scale_to_fit(source, display)?;
    let cropped = crop_region(source, profile)?;
    let recognition_input = scale_to_fit(&cropped, display)?;

    Ok(PreparedFrame {
        preview: Arc::new(preview),
        recognition_input: Arc::new(recognition_input),
        source_size: source.dimensions(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::region::{ProfileId, RegionRect};
    use image::Rgba;

    fn solid(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]))
    }

    fn target(width: u32, height: u32) -> DisplayTarget {
        DisplayTarget::new(width, height).unwrap()
    }

    #[test]
    fn test_landscape_into_portrait() {
        // factor = max(1920/1080, 1080/1920) = 1.778; 1080 / 1.778 = 607.5 -> 607
        let scaled = scale_to_fit(&solid(1920, 1080), target(1080, 1920)).unwrap();
        assert_eq!(scaled.dimensions(), (1080, 607));
    }

    #[test]
    fn test_fit_touches_one_axis() {
        let sources = [(1920, 1080), (72, 48), (48, 35), (1000, 1000), (3, 997), (1281, 719)];
        let targets = [(1080, 1920), (1080, 720), (640, 640), (17, 5), (1, 1)];

        for &(sw, sh) in &sources {
            for &(tw, th) in &targets {
                let (w, h) = fitted_size((sw, sh), target(tw, th));
                assert!(w <= tw && h <= th, "{}x{} into {}x{} gave {}x{}", sw, sh, tw, th, w, h);
                assert!(w == tw || h == th, "{}x{} into {}x{} gave {}x{}", sw, sh, tw, th, w, h);
            }
        }
    }

    #[test]
    fn test_fit_preserves_aspect_ratio() {
        let cases = [((1920, 1080), (1080, 1920)), ((72, 48), (1080, 1920)), ((48, 35), (1080, 1584))];

        for ((sw, sh), (tw, th)) in cases {
            let (w, h) = fitted_size((sw, sh), target(tw, th));
            let source_ratio = sw as f64 / sh as f64;
            // One pixel of truncation on the shorter side bounds the error
            let low = w as f64 / (h as f64 + 1.0);
            let high = (w as f64 + 1.0) / h as f64;
            assert!(low <= source_ratio && source_ratio <= high, "{}x{} -> {}x{}", sw, sh, w, h);
        }
    }

    #[test]
    fn test_crop_upscales_to_display() {
        let scaled = scale_to_fit(&solid(72, 48), target(1080, 1920)).unwrap();
        assert_eq!(scaled.dimensions(), (1080, 720));
    }

    #[test]
    fn test_zero_target_rejected() {
        let err = scale_to_fit(&solid(10, 10), DisplayTarget { width: 0, height: 100 }).unwrap_err();
        assert!(matches!(err, VisionError::InvalidDisplayTarget { width: 0, height: 100 }));
        assert!(DisplayTarget::new(100, 0).is_err());
    }

    #[test]
    fn test_degenerate_axis_clamped() {
        let (w, h) = fitted_size((4000, 1), target(100, 100));
        assert_eq!((w, h), (100, 1));
    }

    #[test]
    fn test_crop_in_bounds() {
        let mut source = solid(1920, 1080);
        source.put_pixel(80, 1032, Rgba([255, 0, 0, 255]));
        source.put_pixel(151, 1079, Rgba([0, 255, 0, 255]));

        let cropped = crop_region(&source, ProfileId::Pubg.profile()).unwrap();

        assert_eq!(cropped.dimensions(), (72, 48));
        assert_eq!(*cropped.get_pixel(0, 0), Rgba([255, 0, 0, 255]));
        assert_eq!(*cropped.get_pixel(71, 47), Rgba([0, 255, 0, 255]));
        assert_eq!(*cropped.get_pixel(1, 1), Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_crop_out_of_bounds() {
        let err = crop_region(&solid(1000, 1000), ProfileId::Pubg.profile()).unwrap_err();
        match err {
            VisionError::RegionOutOfBounds { profile, rect, image_width, image_height } => {
                assert_eq!(profile, ProfileId::Pubg);
                assert_eq!(rect, RegionRect { x: 80, y: 1032, width: 72, height: 48 });
                assert_eq!((image_width, image_height), (1000, 1000));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_crop_exactly_at_edge() {
        // WildRift 720p region ends at (1074, 124)
        let cropped = crop_region(&solid(1074, 124), ProfileId::WildRift720p.profile()).unwrap();
        assert_eq!(cropped.dimensions(), (48, 35));
        assert!(crop_region(&solid(1073, 124), ProfileId::WildRift720p.profile()).is_err());
    }

    #[test]
    fn test_prepare_scales_both_independently() {
        let prepared =
            prepare_for_recognition(&solid(1920, 1080), ProfileId::Pubg.profile(), target(1080, 1920))
                .unwrap();

        assert_eq!(prepared.source_size, (1920, 1080));
        assert_eq!(prepared.preview.dimensions(), (1080, 607));
        assert_eq!(prepared.recognition_input.dimensions(), (1080, 720));
    }

    #[test]
    fn test_prepare_fails_on_small_source() {
        let result =
            prepare_for_recognition(&solid(1280, 720), ProfileId::WildRift.profile(), target(1080, 1920));
        assert!(matches!(result, Err(VisionError::RegionOutOfBounds { .. })));
    }
}
