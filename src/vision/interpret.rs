//! Recognition result interpretation
//!
//! Reads a ping value out of recognized text blocks and summarizes or draws
//! detected faces.

use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

use super::recognizer::{ContourKind, Face, TextBlock};

/// Substring marking a ping readout
pub const PING_MARKER: &str = "ms";

/// Ping readout found in recognized text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingReading {
    /// Block text as returned by the recognizer
    pub raw: String,
    /// Text shown on the status label
    pub display: String,
}

impl PingReading {
    /// Label text for this reading
    pub fn label(&self) -> String {
        format!("Detected Ping: {}", self.display)
    }
}

/// Pick the first block containing `marker`, in engine order
pub fn find_ping(blocks: &[TextBlock], marker: &str) -> Option<PingReading> {
    let block = blocks.iter().find(|b| b.text.contains(marker))?;
    let display = trim_ping(&block.text).unwrap_or_else(|| block.text.clone());
    Some(PingReading {
        raw: block.text.clone(),
        display,
    })
}

/// Drop the last two characters of a readout.
///
/// Returns `None` when the text is shorter than two characters; callers show
/// the raw text instead.
pub fn trim_ping(text: &str) -> Option<String> {
    let count = text.chars().count();
    if count < 2 {
        return None;
    }
    Some(text.chars().take(count - 2).collect())
}

/// Summary of a face detection pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceSummary {
    pub faces: usize,
    pub contour_points: usize,
}

impl FaceSummary {
    /// Status label text, or `None` when nothing was found
    pub fn label(&self) -> Option<String> {
        if self.faces == 0 {
            return None;
        }
        Some(format!(
            "Detected {} face(s), {} contour points",
            self.faces, self.contour_points
        ))
    }
}

/// Count faces and contour points
pub fn summarize_faces(faces: &[Face]) -> FaceSummary {
    FaceSummary {
        faces: faces.len(),
        contour_points: faces.iter().map(Face::point_count).sum(),
    }
}

const CONTOUR_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);
const POINT_COLOR: Rgba<u8> = Rgba([0, 200, 255, 255]);
const BOUNDS_COLOR: Rgba<u8> = Rgba([255, 64, 64, 255]);

fn is_closed(kind: ContourKind) -> bool {
    matches!(kind, ContourKind::Face | ContourKind::LeftEye | ContourKind::RightEye)
}

/// Coordinates farther than this multiple of the canvas size are not drawn
const DRAW_REACH: f32 = 4.0;

/// Whether a detector coordinate pair is finite and close enough to the
/// canvas to be drawn without overflowing pixel arithmetic
fn drawable(point: (f32, f32), reach: f32) -> bool {
    let (x, y) = point;
    x.is_finite() && y.is_finite() && x.abs() <= reach && y.abs() <= reach
}

/// Render face bounds and contours onto a copy of the recognition input.
///
/// Points and bounds with non-finite or far out-of-canvas coordinates are
/// skipped, as are segments touching such a point.
pub fn draw_face_contours(image: &RgbaImage, faces: &[Face]) -> RgbaImage {
    let mut canvas = image.clone();
    let reach = image.width().max(image.height()).max(1) as f32 * DRAW_REACH;

    for face in faces {
        if let Some((x, y, w, h)) = face.bounds {
            if drawable((x, y), reach) && drawable((w, h), reach) && w >= 1.0 && h >= 1.0 {
                let rect = Rect::at(x as i32, y as i32).of_size(w as u32, h as u32);
                draw_hollow_rect_mut(&mut canvas, rect, BOUNDS_COLOR);
            }
        }

        for contour in &face.contours {
            let points = &contour.points;
            let mut segment = |start: (f32, f32), end: (f32, f32)| {
                if drawable(start, reach) && drawable(end, reach) {
                    draw_line_segment_mut(&mut canvas, start, end, CONTOUR_COLOR);
                }
            };
            for pair in points.windows(2) {
                segment(pair[0], pair[1]);
            }
            if is_closed(contour.kind) && points.len() > 2 {
                segment(points[points.len() - 1], points[0]);
            }
            for &(px, py) in points.iter().filter(|&&p| drawable(p, reach)) {
                draw_filled_circle_mut(&mut canvas, (px as i32, py as i32), 2, POINT_COLOR);
            }
        }
    }

    canvas
}
