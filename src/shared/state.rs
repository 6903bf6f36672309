//! Runtime state of the probe screen

/// Label shown before any reading is available
pub const EMPTY_LABEL: &str = "-";

/// State rendered by the dashboard and reported by the CLI
#[derive(Debug, Clone)]
pub struct ProbeState {
    /// Status label text
    pub status_label: String,
    /// Whether the text recognition control is enabled
    pub text_enabled: bool,
    /// Whether the face detection control is enabled
    pub face_enabled: bool,
    /// Whether a video polling run is active
    pub video_running: bool,
    /// Index of the last frame prepared by the poller
    pub frame_index: u64,
    /// Short-lived notice (e.g., "No face found")
    pub notice: Option<String>,
    /// Last error message (if any)
    pub last_error: Option<String>,
}

impl Default for ProbeState {
    fn default() -> Self {
        Self {
            status_label: EMPTY_LABEL.to_string(),
            text_enabled: true,
            face_enabled: true,
            video_running: false,
            frame_index: 0,
            notice: None,
            last_error: None,
        }
    }
}

impl ProbeState {
    /// Reset for a new selection
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Clear any error state
    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Set an error message
    pub fn set_error(&mut self, error: impl Into<String>) {
        self.last_error = Some(error.into());
    }
}
