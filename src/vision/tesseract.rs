//! Tesseract command-line backend
//!
//! Runs the `tesseract` binary on a staged PNG and splits its plain-text
//! output into blocks. Tesseract separates paragraphs with blank lines, which
//! is the closest match to the block granularity the probe reads.

use async_trait::async_trait;
use image::RgbaImage;
use std::time::Instant;
use tokio::process::Command;
use tracing::debug;

use super::recognizer::{stage_png, RecognitionError, TextBlock, TextRecognizer};
use crate::config::RecognitionSettings;

/// Text recognizer backed by the tesseract CLI
#[derive(Debug, Clone)]
pub struct TesseractCli {
    program: String,
    language: String,
    page_segmentation: u8,
}

impl TesseractCli {
    /// Create a recognizer from settings
    pub fn new(settings: &RecognitionSettings) -> Self {
        Self {
            program: settings.tesseract_program.clone(),
            language: settings.language.clone(),
            page_segmentation: settings.page_segmentation,
        }
    }

    /// Program this recognizer launches
    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl TextRecognizer for TesseractCli {
    async fn recognize_text(&self, image: &RgbaImage) -> Result<Vec<TextBlock>, RecognitionError> {
        let start = Instant::now();
        let staged = stage_png(image)?;

        let output = Command::new(&self.program)
            .arg(staged.path())
            .arg("stdout")
            .arg("--psm")
            .arg(self.page_segmentation.to_string())
            .arg("-l")
            .arg(&self.language)
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

        let blocks = split_blocks(&String::from_utf8_lossy(&output.stdout));
        debug!(
            "tesseract: {} blocks from {}x{} in {:?}",
            blocks.len(),
            image.width(),
            image.height(),
            start.elapsed()
        );

        Ok(blocks)
    }
}

/// Split tesseract plain-text output into blocks on blank lines
pub fn split_blocks(output: &str) -> Vec<TextBlock> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                blocks.push(TextBlock::new(current.join("\n")));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }

    if !current.is_empty() {
        blocks.push(TextBlock::new(current.join("\n")));
    }

    blocks
}
