//! Message types delivered from recognition tasks and the poller to the controller

use image::RgbaImage;
use std::sync::Arc;

use crate::vision::{Face, PreparedFrame, RecognitionError, TextBlock};

/// Identifier of a manually triggered recognition request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

/// What triggered a recognition request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOrigin {
    /// A button press or CLI action
    Manual(RequestId),
    /// A frame of a polling run
    Frame { run: u64, index: u64 },
}

/// Kind of recognition performed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognitionKind {
    Text,
    Face,
}

/// Why a polling run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStop {
    /// The video has no frame at the requested timestamp
    EndOfStream,
    /// The configured frame limit was reached
    FrameLimit,
    /// Stopped by a new selection or an explicit stop
    Cancelled,
    /// The frame source failed
    Failed(String),
}

/// Events drained by the controller on its own thread
#[derive(Debug)]
pub enum ProbeEvent {
    /// Text recognition finished
    TextRecognized {
        origin: RequestOrigin,
        result: Result<Vec<TextBlock>, RecognitionError>,
    },
    /// Face detection finished
    FacesDetected {
        origin: RequestOrigin,
        input: Arc<RgbaImage>,
        result: Result<Vec<Face>, RecognitionError>,
    },
    /// The poller prepared a new frame
    FramePrepared {
        run: u64,
        index: u64,
        frame: PreparedFrame,
    },
    /// The poller could not prepare a frame
    FrameSkipped { run: u64, index: u64, reason: String },
    /// A polling run ended
    PollingFinished { run: u64, frames: u64, reason: PollStop },
}
