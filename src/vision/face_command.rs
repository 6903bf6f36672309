//! External face-detector command backend
//!
//! Launches a configured command with the staged image path appended and
//! reads a JSON array of faces from its stdout:
//!
//! ```json
//! [{ "bounds": [x, y, w, h], "contours": { "face": [[x, y], ...], "left_eye": [...] } }]
//! ```

use async_trait::async_trait;
use image::RgbaImage;
use serde::de::IntoDeserializer;
use serde::Deserialize;
use std::collections::BTreeMap;
use tokio::process::Command;
use tracing::{debug, warn};

use super::recognizer::{stage_png, ContourKind, Face, FaceContour, FaceDetector, RecognitionError};

#[derive(Debug, Deserialize)]
struct RawFace {
    #[serde(default)]
    bounds: Option<[f32; 4]>,
    #[serde(default)]
    contours: BTreeMap<String, Vec<[f32; 2]>>,
}

/// Face detector that shells out to a user-supplied command
#[derive(Debug, Clone)]
pub struct CommandFaceDetector {
    program: String,
    args: Vec<String>,
}

impl CommandFaceDetector {
    /// Build a detector from a command line (program followed by arguments)
    pub fn from_command(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

#[async_trait]
impl FaceDetector for CommandFaceDetector {
    async fn detect_faces(&self, image: &RgbaImage) -> Result<Vec<Face>, RecognitionError> {
        let staged = stage_png(image)?;

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(staged.path())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| RecognitionError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(RecognitionError::Failed {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let faces = parse_faces(&String::from_utf8_lossy(&output.stdout))?;
        debug!("{}: {} faces", self.program, faces.len());
        Ok(faces)
    }
}

/// Parse detector JSON output into faces, skipping unknown contour names
pub fn parse_faces(json: &str) -> Result<Vec<Face>, RecognitionError> {
    let raw: Vec<RawFace> =
        serde_json::from_str(json.trim()).map_err(|e| RecognitionError::InvalidOutput(e.to_string()))?;

    Ok(raw
        .into_iter()
        .map(|face| {
            let contours = face
                .contours
                .into_iter()
                .filter_map(|(name, points)| {
                    let kind = contour_kind(&name)?;
                    Some(FaceContour {
                        kind,
                        points: points.into_iter().map(|[x, y]| (x, y)).collect(),
                    })
                })
                .collect();

            Face {
                bounds: face.bounds.map(|[x, y, w, h]| (x, y, w, h)),
                contours,
            }
        })
        .collect())
}

fn contour_kind(name: &str) -> Option<ContourKind> {
    let deserializer: serde::de::value::StrDeserializer<'_, serde::de::value::Error> =
        name.into_deserializer();
    match ContourKind::deserialize(deserializer) {
        Ok(kind) => Some(kind),
        Err(_) => {
            warn!("Ignoring unknown face contour '{}'", name);
            None
        }
    }
}
