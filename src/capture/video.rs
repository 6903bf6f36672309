//! Video frame extraction
//!
//! Frames are requested by timestamp. The ffmpeg-backed source probes the
//! file once with ffprobe, then decodes one RGBA frame per request.

use async_trait::async_trait;
use image::RgbaImage;
use serde::Deserialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

use super::CaptureError;
use crate::config::VideoSettings;

/// Timestamp of the frame the poller requests at a given index
pub fn frame_timestamp(index: u64, step_secs: u64) -> Duration {
    Duration::from_secs(index.saturating_mul(step_secs))
}

/// Source of decoded video frames
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Decode the frame at or just after `timestamp`; `None` past the end
    async fn frame_at(&self, timestamp: Duration) -> Result<Option<RgbaImage>, CaptureError>;
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Video metadata needed to decode raw frames
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub duration: Option<Duration>,
}

/// Parse `ffprobe -of json` output
pub fn parse_probe(json: &str) -> Result<VideoInfo, CaptureError> {
    let probe: ProbeOutput =
        serde_json::from_str(json).map_err(|e| CaptureError::Metadata(e.to_string()))?;

    let stream = probe
        .streams
        .iter()
        .find(|s| s.width.is_some() && s.height.is_some())
        .ok_or_else(|| CaptureError::Metadata("no video stream".to_string()))?;

    let (width, height) = (stream.width.unwrap_or(0), stream.height.unwrap_or(0));
    if width == 0 || height == 0 {
        return Err(CaptureError::Metadata(format!("bad frame size {}x{}", width, height)));
    }

    let duration = probe
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
        .map(Duration::from_secs_f64);

    Ok(VideoInfo { width, height, duration })
}

/// Frame source that drives the ffmpeg CLI
#[derive(Debug, Clone)]
pub struct FfmpegFrameSource {
    path: PathBuf,
    ffmpeg: String,
    info: VideoInfo,
}

impl FfmpegFrameSource {
    /// Probe a video file and prepare to decode frames from it
    pub async fn open(path: &Path, settings: &VideoSettings) -> Result<Self, CaptureError> {
        let output = Command::new(&settings.ffprobe_program)
            .args(["-v", "error", "-select_streams", "v:0"])
            .args(["-show_entries", "stream=width,height:format=duration"])
            .args(["-of", "json"])
            .arg(path)
            .output()
            .await
            .map_err(|source| CaptureError::Tool {
                program: settings.ffprobe_program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(CaptureError::ToolFailed {
                program: settings.ffprobe_program.clone(),
                path: path.to_path_buf(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let info = parse_probe(&String::from_utf8_lossy(&output.stdout))?;
        info!(
            "Opened video {} ({}x{}, {:?})",
            path.display(),
            info.width,
            info.height,
            info.duration
        );

        Ok(Self {
            path: path.to_path_buf(),
            ffmpeg: settings.ffmpeg_program.clone(),
            info,
        })
    }
}

/// ffmpeg arguments decoding the first keyframe at or after `timestamp`.
///
/// Input seeking stays accurate, so frames before `timestamp` are discarded,
/// and `-skip_frame nokey` makes the decoder emit keyframes only.
fn frame_args(path: &Path, timestamp: Duration) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-v", "error", "-skip_frame", "nokey", "-ss"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push(format!("{:.3}", timestamp.as_secs_f64()).into());
    args.push("-i".into());
    args.push(path.as_os_str().to_owned());
    args.extend(
        ["-frames:v", "1", "-f", "rawvideo", "-pix_fmt", "rgba", "-"]
            .into_iter()
            .map(OsString::from),
    );
    args
}

#[async_trait]
impl FrameSource for FfmpegFrameSource {
    async fn frame_at(&self, timestamp: Duration) -> Result<Option<RgbaImage>, CaptureError> {
        if let Some(duration) = self.info.duration {
            if timestamp > duration {
                return Ok(None);
            }
        }

        let output = Command::new(&self.ffmpeg)
            .args(frame_args(&self.path, timestamp))
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| CaptureError::Tool {
                program: self.ffmpeg.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(CaptureError::ToolFailed {
                program: self.ffmpeg.clone(),
                path: self.path.clone(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        // Seeking past the last frame yields no data rather than an error
        if output.stdout.is_empty() {
            return Ok(None);
        }

        let expected = self.info.width as usize * self.info.height as usize * 4;
        if output.stdout.len() != expected {
            return Err(CaptureError::Metadata(format!(
                "frame at {:?} has {} bytes, expected {}",
                timestamp,
                output.stdout.len(),
                expected
            )));
        }

        debug!("Decoded frame at {:?}", timestamp);
        Ok(RgbaImage::from_raw(self.info.width, self.info.height, output.stdout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_timestamp() {
        assert_eq!(frame_timestamp(1, 1), Duration::from_secs(1));
        assert_eq!(frame_timestamp(7, 2), Duration::from_secs(14));
        assert_eq!(frame_timestamp(u64::MAX, 2), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn test_parse_probe() {
        let json = r#"{
            "programs": [],
            "streams": [{"width": 1920, "height": 1080}],
            "format": {"duration": "12.500000"}
        }"#;
        let info = parse_probe(json).unwrap();
        assert_eq!((info.width, info.height), (1920, 1080));
        assert_eq!(info.duration, Some(Duration::from_millis(12500)));
    }

    #[test]
    fn test_parse_probe_without_duration() {
        let info = parse_probe(r#"{"streams": [{"width": 1280, "height": 720}]}"#).unwrap();
        assert_eq!(info.duration, None);
    }

    #[test]
    fn test_parse_probe_rejects_missing_stream() {
        assert!(matches!(parse_probe(r#"{"streams": []}"#), Err(CaptureError::Metadata(_))));
        assert!(matches!(parse_probe("garbage"), Err(CaptureError::Metadata(_))));
        assert!(parse_probe(r#"{"streams": [{"width": 0, "height": 720}]}"#).is_err());
    }

    #[test]
    fn test_frame_args_seek_to_next_keyframe() {
        let args = frame_args(Path::new("wr.mp4"), Duration::from_secs(3));
        let args: Vec<&str> = args.iter().filter_map(|a| a.to_str()).collect();
        let position = |flag: &str| args.iter().position(|a| *a == flag).unwrap();

        assert_eq!(args[position("-skip_frame") + 1], "nokey");
        assert_eq!(args[position("-ss") + 1], "3.000");
        assert_eq!(args[position("-i") + 1], "wr.mp4");
        // Both are input options and must come before the input
        assert!(position("-skip_frame") < position("-i"));
        assert!(position("-ss") < position("-i"));
        assert!(!args.contains(&"-noaccurate_seek"));
    }

    #[tokio::test]
    async fn test_open_missing_tool() {
        let settings = VideoSettings {
            ffprobe_program: "ping-lens-no-such-ffprobe".to_string(),
            ..Default::default()
        };
        let result = FfmpegFrameSource::open(Path::new("wr.mp4"), &settings).await;
        assert!(matches!(result, Err(CaptureError::Tool { .. })));
    }
}
