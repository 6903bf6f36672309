//! Probe Controller
//!
//! Owns the mutable state of the probe screen: the selected profile, the
//! source image snapshot, the lazily measured display target and the status
//! shown to the user. Recognition and polling run on the tokio runtime and
//! report back through `ProbeEvent`s, which the controller drains on its own
//! thread.

pub mod dispatch;
pub mod poller;

use anyhow::{bail, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use image::RgbaImage;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::capture::{assets::load_image_file, AssetStore, CaptureError, FfmpegFrameSource, FrameSource, SourceFrame};
use crate::config::AppConfig;
use crate::shared::{PollStop, ProbeEvent, ProbeState, RequestId, RequestOrigin};
use crate::vision::{
    draw_face_contours, find_ping, prepare_for_recognition, summarize_faces, DisplayTarget, Face, FaceDetector,
    PreparedFrame, ProfileId, RecognitionError, TextBlock, TextRecognizer, VisionError,
};

use dispatch::RecognitionDispatcher;
use poller::{run_poller, PollerConfig};

/// Notice shown when face detection finds nothing
pub const NO_FACE_NOTICE: &str = "No face found";

/// A running poller
struct ActiveRun {
    run: u64,
    token: CancellationToken,
}

/// Single owner of the probe screen state
pub struct ProbeController {
    config: AppConfig,
    assets: AssetStore,
    dispatcher: RecognitionDispatcher,
    events_tx: Sender<ProbeEvent>,
    events: Receiver<ProbeEvent>,
    state: ProbeState,
    profile: ProfileId,
    source: Option<SourceFrame>,
    prepared: Option<PreparedFrame>,
    display: Option<DisplayTarget>,
    face_overlay: Option<Arc<RgbaImage>>,
    /// Manual results with an id below this were requested for an older selection
    stale_before: RequestId,
    active_run: Option<ActiveRun>,
    next_run: u64,
    /// Bumped whenever an image view changes
    generation: u64,
}

impl ProbeController {
    pub fn new(
        config: AppConfig,
        runtime: Handle,
        text: Arc<dyn TextRecognizer>,
        faces: Arc<dyn FaceDetector>,
    ) -> Self {
        let (events_tx, events) = unbounded();
        let dispatcher = RecognitionDispatcher::new(runtime, text, faces, events_tx.clone());
        let assets = AssetStore::new(config.assets.dir.clone());
        info!("Reference screenshots from {}", assets.dir().display());
        let profile = config.general.default_profile;
        let stale_before = dispatcher.next_request_id();

        Self {
            config,
            assets,
            dispatcher,
            events_tx,
            events,
            state: ProbeState::default(),
            profile,
            source: None,
            prepared: None,
            display: None,
            face_overlay: None,
            stale_before,
            active_run: None,
            next_run: 1,
            generation: 0,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn state(&self) -> &ProbeState {
        &self.state
    }

    pub fn profile(&self) -> ProfileId {
        self.profile
    }

    pub fn source(&self) -> Option<&SourceFrame> {
        self.source.as_ref()
    }

    pub fn prepared(&self) -> Option<&PreparedFrame> {
        self.prepared.as_ref()
    }

    pub fn display(&self) -> Option<DisplayTarget> {
        self.display
    }

    /// Recognition input with detected face contours drawn on it
    pub fn face_overlay(&self) -> Option<&Arc<RgbaImage>> {
        self.face_overlay.as_ref()
    }

    /// Changes whenever the preview, recognition input or overlay changes
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True when nothing is in flight and no event is waiting
    pub fn is_idle(&self) -> bool {
        self.dispatcher.in_flight() == 0 && self.active_run.is_none() && self.events.is_empty()
    }

    /// Record the display target. Only the first measurement is kept.
    pub fn measure_display(&mut self, width: u32, height: u32) -> Result<(), VisionError> {
        if let Some(measured) = self.display {
            debug!("Display target already measured as {}", measured);
            return Ok(());
        }

        let target = DisplayTarget::new(width, height)?;
        info!("Display target measured: {}", target);
        self.display = Some(target);
        self.prepare();
        Ok(())
    }

    /// Select a profile and load its bundled reference screenshot
    pub fn select_profile(&mut self, profile: ProfileId) {
        let loaded = self.assets.load(profile.profile().asset);
        self.replace_source(profile, loaded);
    }

    /// Select a profile but take the source image from a file
    pub fn select_image_file(&mut self, profile: ProfileId, path: &Path) {
        let loaded = load_image_file(path);
        self.replace_source(profile, loaded);
    }

    fn replace_source(&mut self, profile: ProfileId, loaded: Result<SourceFrame, CaptureError>) {
        let cancelled = self.dispatcher.cancel_all();
        if cancelled > 0 {
            debug!("Cancelled {} in-flight request(s)", cancelled);
        }
        self.stop_video();

        self.stale_before = self.dispatcher.next_request_id();
        self.state.reset();
        self.profile = profile;
        self.prepared = None;
        self.face_overlay = None;
        self.generation += 1;

        self.source = match loaded {
            Ok(frame) => {
                info!("Selected {} ({}, {:?})", profile, frame.origin, frame.dimensions());
                Some(frame)
            }
            Err(e) => {
                warn!("No image for {}: {}", profile, e);
                self.state.set_error(e.to_string());
                None
            }
        };
        self.prepare();
    }

    /// Run the region pipeline once both the image and the display target are known
    fn prepare(&mut self) {
        let (Some(source), Some(display)) = (&self.source, self.display) else {
            return;
        };

        match prepare_for_recognition(&source.image, self.profile.profile(), display) {
            Ok(prepared) => {
                debug!(
                    "Prepared {} {:?}: preview {:?}, recognition input {:?}",
                    source.origin,
                    prepared.source_size,
                    prepared.preview.dimensions(),
                    prepared.recognition_input.dimensions()
                );
                self.prepared = Some(prepared);
            }
            Err(e) => {
                warn!("Cannot prepare {}: {}", source.origin, e);
                self.state.set_error(e.to_string());
                self.prepared = None;
            }
        }
        self.generation += 1;
    }

    /// Send the current recognition input to the text recognizer
    pub fn run_text_recognition(&mut self) -> Option<RequestId> {
        if !self.state.text_enabled {
            debug!("Text recognition already running");
            return None;
        }
        let Some(prepared) = &self.prepared else {
            warn!("Text recognition requested with no prepared image");
            return None;
        };

        let input = prepared.recognition_input.clone();
        self.state.text_enabled = false;
        self.state.clear_error();
        let id = self.dispatcher.submit_text(input);
        info!("Text recognition {:?} submitted", id);
        Some(id)
    }

    /// Send the current recognition input to the face detector
    pub fn run_face_detection(&mut self) -> Option<RequestId> {
        if !self.state.face_enabled {
            debug!("Face detection already running");
            return None;
        }
        let Some(prepared) = &self.prepared else {
            warn!("Face detection requested with no prepared image");
            return None;
        };

        let input = prepared.recognition_input.clone();
        self.state.face_enabled = false;
        self.state.clear_error();
        self.state.notice = None;
        let id = self.dispatcher.submit_faces(input);
        info!("Face detection {:?} submitted", id);
        Some(id)
    }

    /// Start polling frames from a video file through ffmpeg
    pub fn start_video(&mut self, path: PathBuf) -> Result<u64> {
        let settings = self.config.video.clone();
        self.launch_poller(async move {
            let source = FfmpegFrameSource::open(&path, &settings).await?;
            Ok::<_, CaptureError>(Arc::new(source) as Arc<dyn FrameSource>)
        })
    }

    /// Start polling frames from an already opened source
    pub fn start_video_with(&mut self, source: Arc<dyn FrameSource>) -> Result<u64> {
        self.launch_poller(async move { Ok::<_, CaptureError>(source) })
    }

    fn launch_poller<F>(&mut self, open: F) -> Result<u64>
    where
        F: Future<Output = Result<Arc<dyn FrameSource>, CaptureError>> + Send + 'static,
    {
        let Some(display) = self.display else {
            bail!("display target has not been measured yet");
        };
        self.stop_video();

        let run = self.next_run;
        self.next_run += 1;

        let config = PollerConfig {
            run,
            profile: self.profile,
            display,
            interval: self.config.video.tick_interval(),
            frame_step_secs: self.config.video.frame_step_secs,
            pacing: self.config.video.pacing,
            max_frames: self.config.video.max_frames,
        };
        let token = CancellationToken::new();
        let cancel = token.clone();
        let recognizer = self.dispatcher.text_recognizer();
        let events = self.events_tx.clone();

        self.dispatcher.runtime().spawn(async move {
            let (frames, reason) = match open.await {
                Ok(source) => run_poller(source, recognizer, config, events.clone(), cancel).await,
                Err(e) => {
                    error!("Failed to open video: {}", e);
                    (0, PollStop::Failed(e.to_string()))
                }
            };
            let _ = events.send(ProbeEvent::PollingFinished { run, frames, reason });
        });

        self.active_run = Some(ActiveRun { run, token });
        self.state.video_running = true;
        self.state.frame_index = 0;
        self.state.clear_error();
        info!("Video run {} started", run);
        Ok(run)
    }

    /// Stop the active polling run, if any
    pub fn stop_video(&mut self) {
        if let Some(active) = self.active_run.take() {
            active.token.cancel();
            info!("Video run {} stopped", active.run);
        }
        self.state.video_running = false;
    }

    /// Apply every event already waiting; returns how many were applied
    pub fn process_events(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events.try_recv() {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    /// Block for up to `timeout` for one event and apply it
    pub fn wait_event(&mut self, timeout: Duration) -> bool {
        match self.events.recv_timeout(timeout) {
            Ok(event) => {
                self.apply(event);
                true
            }
            Err(_) => false,
        }
    }

    fn is_current_run(&self, run: u64) -> bool {
        self.active_run.as_ref().is_some_and(|a| a.run == run)
    }

    fn is_current(&self, origin: RequestOrigin) -> bool {
        match origin {
            RequestOrigin::Manual(id) => id >= self.stale_before,
            RequestOrigin::Frame { run, .. } => self.is_current_run(run),
        }
    }

    fn apply(&mut self, event: ProbeEvent) {
        match event {
            ProbeEvent::TextRecognized { origin, result } => {
                if !self.is_current(origin) {
                    debug!("Dropping stale text result {:?}", origin);
                    return;
                }
                if let RequestOrigin::Manual(_) = origin {
                    self.state.text_enabled = true;
                }
                self.apply_text(origin, result);
            }
            ProbeEvent::FacesDetected { origin, input, result } => {
                if !self.is_current(origin) {
                    debug!("Dropping stale face result {:?}", origin);
                    return;
                }
                self.state.face_enabled = true;
                self.apply_faces(&input, result);
            }
            ProbeEvent::FramePrepared { run, index, frame } => {
                if !self.is_current_run(run) {
                    return;
                }
                self.state.frame_index = index;
                self.state.clear_error();
                self.prepared = Some(frame);
                self.face_overlay = None;
                self.generation += 1;
            }
            ProbeEvent::FrameSkipped { run, index, reason } => {
                if self.is_current_run(run) {
                    self.state.frame_index = index;
                    self.state.set_error(reason);
                }
            }
            ProbeEvent::PollingFinished { run, frames, reason } => {
                if !self.is_current_run(run) {
                    return;
                }
                info!("Video run {} finished after {} frame(s): {:?}", run, frames, reason);
                self.active_run = None;
                self.state.video_running = false;
                if let PollStop::Failed(message) = reason {
                    self.state.set_error(message);
                }
            }
        }
    }

    fn apply_text(&mut self, origin: RequestOrigin, result: Result<Vec<TextBlock>, RecognitionError>) {
        let blocks = match result {
            Ok(blocks) => {
                self.state.clear_error();
                blocks
            }
            Err(e) => {
                error!("Text recognition {:?} failed: {}", origin, e);
                self.state.set_error(e.to_string());
                return;
            }
        };

        match find_ping(&blocks, &self.config.recognition.ping_marker) {
            Some(reading) => {
                debug!("Ping readout {:?} from {:?}", reading.raw, origin);
                self.state.status_label = reading.label();
            }
            None => debug!("No ping readout among {} block(s)", blocks.len()),
        }
    }

    fn apply_faces(&mut self, input: &RgbaImage, result: Result<Vec<Face>, RecognitionError>) {
        let faces = match result {
            Ok(faces) => faces,
            Err(e) => {
                error!("Face detection failed: {}", e);
                self.state.set_error(e.to_string());
                return;
            }
        };

        let summary = summarize_faces(&faces);
        match summary.label() {
            Some(label) => {
                info!("{}", label);
                self.state.notice = Some(label);
                self.face_overlay = Some(Arc::new(draw_face_contours(input, &faces)));
            }
            None => {
                self.state.notice = Some(NO_FACE_NOTICE.to_string());
                self.face_overlay = None;
            }
        }
        self.generation += 1;
    }
}

impl Drop for ProbeController {
    fn drop(&mut self) {
        self.dispatcher.cancel_all();
        self.stop_video();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FramePacing;
    use crate::shared::EMPTY_LABEL;
    use crate::vision::recognizer::{ContourKind, FaceContour};
    use async_trait::async_trait;
    use image::Rgba;
    use std::time::Instant;
    use tempfile::TempDir;

    struct FixedText(Vec<&'static str>);

    #[async_trait]
    impl TextRecognizer for FixedText {
        async fn recognize_text(&self, _image: &RgbaImage) -> Result<Vec<TextBlock>, RecognitionError> {
            Ok(self.0.iter().map(|t| TextBlock::new(*t)).collect())
        }
    }

    struct StalledText;

    #[async_trait]
    impl TextRecognizer for StalledText {
        async fn recognize_text(&self, _image: &RgbaImage) -> Result<Vec<TextBlock>, RecognitionError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(vec![TextBlock::new("99ms")])
        }
    }

    /// Answers "41ms" after a short delay
    struct LaggingText;

    #[async_trait]
    impl TextRecognizer for LaggingText {
        async fn recognize_text(&self, _image: &RgbaImage) -> Result<Vec<TextBlock>, RecognitionError> {
            tokio::time::sleep(Duration::from_millis(80)).await;
            Ok(vec![TextBlock::new("41ms")])
        }
    }

    struct BrokenText;

    #[async_trait]
    impl TextRecognizer for BrokenText {
        async fn recognize_text(&self, _image: &RgbaImage) -> Result<Vec<TextBlock>, RecognitionError> {
            Err(RecognitionError::InvalidOutput("garbled".to_string()))
        }
    }

    struct FixedFaces(Vec<Face>);

    #[async_trait]
    impl FaceDetector for FixedFaces {
        async fn detect_faces(&self, _image: &RgbaImage) -> Result<Vec<Face>, RecognitionError> {
            Ok(self.0.clone())
        }
    }

    struct ShortVideo(u64);

    #[async_trait]
    impl FrameSource for ShortVideo {
        async fn frame_at(&self, timestamp: Duration) -> Result<Option<RgbaImage>, CaptureError> {
            if timestamp.as_secs() > self.0 {
                return Ok(None);
            }
            Ok(Some(RgbaImage::new(1100, 130)))
        }
    }

    struct Fixture {
        _dir: TempDir,
        runtime: tokio::runtime::Runtime,
        config: AppConfig,
    }

    /// Asset directory holding a 1100x130 `snap_sd.png` and a 1000x100 `pubg_hd.png`
    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        RgbaImage::from_pixel(1100, 130, Rgba([10, 20, 30, 255]))
            .save(dir.path().join("snap_sd.png"))
            .unwrap();
        RgbaImage::from_pixel(1000, 100, Rgba([0, 0, 0, 255]))
            .save(dir.path().join("pubg_hd.png"))
            .unwrap();

        let mut config = AppConfig::default();
        config.assets.dir = dir.path().to_path_buf();
        config.video.tick_interval_ms = 1;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();

        Fixture { _dir: dir, runtime, config }
    }

    fn controller(fx: &Fixture, text: impl TextRecognizer + 'static, faces: impl FaceDetector + 'static) -> ProbeController {
        let mut controller = ProbeController::new(fx.config.clone(), fx.runtime.handle().clone(), Arc::new(text), Arc::new(faces));
        controller.measure_display(96, 128).unwrap();
        controller
    }

    fn settle(controller: &mut ProbeController) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while !controller.is_idle() && Instant::now() < deadline {
            controller.wait_event(Duration::from_millis(20));
        }
        controller.process_events();
    }

    #[test]
    fn test_text_recognition_updates_label() {
        let fx = fixture();
        let mut controller = controller(&fx, FixedText(vec!["hello", "23ms", "150ms!"]), FixedFaces(vec![]));
        controller.select_profile(ProfileId::WildRift720p);

        let prepared = controller.prepared().unwrap();
        assert_eq!(prepared.recognition_input.dimensions(), (96, 70));

        assert!(controller.run_text_recognition().is_some());
        assert!(!controller.state().text_enabled);
        // A second press while busy is ignored
        assert!(controller.run_text_recognition().is_none());

        settle(&mut controller);
        assert_eq!(controller.state().status_label, "Detected Ping: 23");
        assert!(controller.state().text_enabled);
    }

    #[test]
    fn test_no_match_leaves_label() {
        let fx = fixture();
        let mut controller = controller(&fx, FixedText(vec!["hello"]), FixedFaces(vec![]));
        controller.select_profile(ProfileId::WildRift720p);

        controller.run_text_recognition().unwrap();
        settle(&mut controller);

        assert_eq!(controller.state().status_label, EMPTY_LABEL);
        assert!(controller.state().last_error.is_none());
    }

    #[test]
    fn test_recognition_error_reenables_control() {
        let fx = fixture();
        let mut controller = controller(&fx, BrokenText, FixedFaces(vec![]));
        controller.select_profile(ProfileId::WildRift720p);

        controller.run_text_recognition().unwrap();
        settle(&mut controller);

        assert_eq!(controller.state().status_label, EMPTY_LABEL);
        assert!(controller.state().text_enabled);
        assert!(controller.state().last_error.as_deref().unwrap().contains("garbled"));
    }

    #[test]
    fn test_missing_asset_is_noop() {
        let fx = fixture();
        let mut controller = controller(&fx, FixedText(vec!["23ms"]), FixedFaces(vec![]));
        controller.select_profile(ProfileId::WildRift);

        assert!(controller.source().is_none());
        assert!(controller.prepared().is_none());
        assert!(controller.run_text_recognition().is_none());
        assert!(controller.run_face_detection().is_none());
        assert!(controller.state().text_enabled);
    }

    #[test]
    fn test_out_of_bounds_region_reported() {
        let fx = fixture();
        let mut controller = controller(&fx, FixedText(vec!["23ms"]), FixedFaces(vec![]));
        controller.select_profile(ProfileId::Pubg);

        assert!(controller.source().is_some());
        assert!(controller.prepared().is_none());
        assert!(controller.state().last_error.as_deref().unwrap().contains("out of bounds"));
    }

    #[test]
    fn test_reselect_cancels_in_flight() {
        let fx = fixture();
        let mut controller = controller(&fx, StalledText, FixedFaces(vec![]));
        controller.select_profile(ProfileId::WildRift720p);
        controller.run_text_recognition().unwrap();

        controller.select_profile(ProfileId::WildRift720p);

        assert!(controller.state().text_enabled);
        assert!(!controller.wait_event(Duration::from_millis(200)));
        assert_eq!(controller.state().status_label, EMPTY_LABEL);
    }

    #[test]
    fn test_display_measured_once() {
        let fx = fixture();
        let mut controller = controller(&fx, FixedText(vec![]), FixedFaces(vec![]));
        controller.measure_display(10, 10).unwrap();
        assert_eq!(controller.display(), Some(DisplayTarget::new(96, 128).unwrap()));

        let mut fresh = ProbeController::new(
            fx.config.clone(),
            fx.runtime.handle().clone(),
            Arc::new(FixedText(vec![])),
            Arc::new(FixedFaces(vec![])),
        );
        assert!(matches!(fresh.measure_display(0, 10), Err(VisionError::InvalidDisplayTarget { .. })));
        assert!(fresh.display().is_none());
    }

    #[test]
    fn test_no_face_notice() {
        let fx = fixture();
        let mut controller = controller(&fx, FixedText(vec![]), FixedFaces(vec![]));
        controller.select_profile(ProfileId::WildRift720p);

        controller.run_face_detection().unwrap();
        settle(&mut controller);

        assert_eq!(controller.state().notice.as_deref(), Some(NO_FACE_NOTICE));
        assert!(controller.state().face_enabled);
        assert!(controller.face_overlay().is_none());
    }

    #[test]
    fn test_face_overlay_drawn() {
        let fx = fixture();
        let face = Face {
            bounds: Some((10.0, 10.0, 40.0, 40.0)),
            contours: vec![FaceContour {
                kind: ContourKind::Face,
                points: vec![(12.0, 12.0), (30.0, 14.0), (20.0, 40.0)],
            }],
        };
        let mut controller = controller(&fx, FixedText(vec![]), FixedFaces(vec![face]));
        controller.select_profile(ProfileId::WildRift720p);

        controller.run_face_detection().unwrap();
        settle(&mut controller);

        assert_eq!(controller.state().notice.as_deref(), Some("Detected 1 face(s), 3 contour points"));
        assert_eq!(controller.face_overlay().unwrap().dimensions(), (96, 70));
    }

    #[test]
    fn test_video_run_updates_frames_and_label() {
        let fx = fixture();
        let mut controller = controller(&fx, FixedText(vec!["41ms"]), FixedFaces(vec![]));
        controller.select_profile(ProfileId::WildRift720p);

        controller.start_video_with(Arc::new(ShortVideo(3))).unwrap();
        assert!(controller.state().video_running);
        settle(&mut controller);

        assert!(!controller.state().video_running);
        assert_eq!(controller.state().frame_index, 3);
        assert_eq!(controller.state().status_label, "Detected Ping: 41");
    }

    #[test]
    fn test_fire_and_forget_results_land_before_run_ends() {
        let mut fx = fixture();
        fx.config.video.pacing = FramePacing::FireAndForget;
        let mut controller = controller(&fx, LaggingText, FixedFaces(vec![]));
        controller.select_profile(ProfileId::WildRift720p);

        controller.start_video_with(Arc::new(ShortVideo(3))).unwrap();
        settle(&mut controller);

        assert!(!controller.state().video_running);
        assert_eq!(controller.state().frame_index, 3);
        assert_eq!(controller.state().status_label, "Detected Ping: 41");
    }

    #[test]
    fn test_video_run_clears_selection_error() {
        let fx = fixture();
        let mut controller = controller(&fx, FixedText(vec!["41ms"]), FixedFaces(vec![]));
        // A failed selection leaves an error behind
        controller.select_image_file(ProfileId::WildRift720p, &fx.config.assets.dir.join("missing.png"));
        assert!(controller.state().last_error.is_some());

        controller.start_video_with(Arc::new(ShortVideo(3))).unwrap();
        settle(&mut controller);

        assert!(controller.state().last_error.is_none());
        assert_eq!(controller.state().frame_index, 3);
        assert_eq!(controller.state().status_label, "Detected Ping: 41");
    }

    #[test]
    fn test_video_requires_display() {
        let fx = fixture();
        let mut controller = ProbeController::new(
            fx.config.clone(),
            fx.runtime.handle().clone(),
            Arc::new(FixedText(vec![])),
            Arc::new(FixedFaces(vec![])),
        );
        assert!(controller.start_video_with(Arc::new(ShortVideo(1))).is_err());
        assert!(!controller.state().video_running);
    }

    #[test]
    fn test_reselect_stops_video() {
        let fx = fixture();
        let mut controller = controller(&fx, StalledText, FixedFaces(vec![]));
        controller.select_profile(ProfileId::WildRift720p);
        controller.start_video_with(Arc::new(ShortVideo(100))).unwrap();

        controller.select_profile(ProfileId::WildRift720p);
        assert!(!controller.state().video_running);

        // Events of the cancelled run are ignored
        std::thread::sleep(Duration::from_millis(100));
        controller.process_events();
        assert_eq!(controller.state().frame_index, 0);
        assert!(controller.state().last_error.is_none());
    }
}
