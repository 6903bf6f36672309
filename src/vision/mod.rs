//! Vision Layer
//!
//! Region profiles, the crop/scale pipeline that feeds recognition, the
//! recognition engine boundary and interpretation of its results.
//! Supported backends:
//! - tesseract CLI for text
//! - an external JSON-emitting command for face contours

pub mod face_command;
pub mod interpret;
pub mod recognizer;
pub mod region;
pub mod scale;
pub mod tesseract;

use thiserror::Error;

pub use face_command::CommandFaceDetector;
pub use interpret::{draw_face_contours, find_ping, summarize_faces};
pub use recognizer::{
    Face, FaceDetector, RecognitionError, TextBlock, TextRecognizer, UnconfiguredFaceDetector,
};
pub use region::{ProfileId, RegionRect};
pub use scale::{prepare_for_recognition, DisplayTarget, PreparedFrame};
pub use tesseract::TesseractCli;

/// Errors from the region extraction pipeline
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VisionError {
    #[error("region {rect} of profile {profile} is out of bounds for a {image_width}x{image_height} image")]
    RegionOutOfBounds {
        profile: ProfileId,
        rect: RegionRect,
        image_width: u32,
        image_height: u32,
    },
    #[error("display target {width}x{height} has not been measured")]
    InvalidDisplayTarget { width: u32, height: u32 },
    #[error("source image is empty")]
    EmptyImage,
}
