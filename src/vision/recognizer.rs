//! Recognition engine boundary
//!
//! Text recognition and face detection are external capabilities. The probe
//! hands them an image and reads back text blocks or face contours.

use async_trait::async_trait;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported by a recognition engine
#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("failed to launch recognizer '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("recognizer '{program}' exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("invalid recognizer output: {0}")]
    InvalidOutput(String),
    #[error("failed to stage image for recognition: {0}")]
    Staging(String),
    #[error("recognizer is not configured")]
    NotConfigured,
}

/// A block of text found by the recognizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBlock {
    /// Full text of the block
    pub text: String,
}

impl TextBlock {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Facial feature a contour outlines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContourKind {
    Face,
    LeftEyebrowTop,
    LeftEyebrowBottom,
    RightEyebrowTop,
    RightEyebrowBottom,
    LeftEye,
    RightEye,
    UpperLipTop,
    UpperLipBottom,
    LowerLipTop,
    LowerLipBottom,
    NoseBridge,
    NoseBottom,
    LeftCheek,
    RightCheek,
}

/// Ordered outline points for one facial feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceContour {
    pub kind: ContourKind,
    pub points: Vec<(f32, f32)>,
}

/// A detected face
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Face {
    /// Bounding box (x, y, width, height) in recognition-input pixels
    pub bounds: Option<(f32, f32, f32, f32)>,
    pub contours: Vec<FaceContour>,
}

impl Face {
    /// Total number of contour points across all features
    pub fn point_count(&self) -> usize {
        self.contours.iter().map(|c| c.points.len()).sum()
    }
}

/// Extracts text blocks from an image
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn recognize_text(&self, image: &RgbaImage) -> Result<Vec<TextBlock>, RecognitionError>;
}

/// Detects faces and their contours in an image
#[async_trait]
pub trait FaceDetector: Send + Sync {
    async fn detect_faces(&self, image: &RgbaImage) -> Result<Vec<Face>, RecognitionError>;
}

/// Write an image to a temporary PNG so command-line engines can read it.
///
/// The file is removed when the returned handle is dropped.
pub(crate) fn stage_png(image: &RgbaImage) -> Result<tempfile::NamedTempFile, RecognitionError> {
    let file = tempfile::Builder::new()
        .prefix("ping-lens-")
        .suffix(".png")
        .tempfile()
        .map_err(|e| RecognitionError::Staging(e.to_string()))?;

    image
        .save_with_format(file.path(), image::ImageFormat::Png)
        .map_err(|e| RecognitionError::Staging(e.to_string()))?;

    Ok(file)
}

/// Face detector used when no detector command is configured
pub struct UnconfiguredFaceDetector;

#[async_trait]
impl FaceDetector for UnconfiguredFaceDetector {
    async fn detect_faces(&self, _image: &RgbaImage) -> Result<Vec<Face>, RecognitionError> {
        Err(RecognitionError::NotConfigured)
    }
}
