//! Recognition dispatch
//!
//! Submits recognition work to the tokio runtime and delivers completions to
//! the controller over a channel. Every submission gets a cancellable handle.

use crossbeam_channel::Sender;
use image::RgbaImage;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::shared::{ProbeEvent, RecognitionKind, RequestId, RequestOrigin};
use crate::vision::{FaceDetector, TextRecognizer};

/// Handle to an in-flight recognition request
#[derive(Debug)]
pub struct RecognitionHandle {
    id: RequestId,
    kind: RecognitionKind,
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl RecognitionHandle {
    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn kind(&self) -> RecognitionKind {
        self.kind
    }

    /// Cancel the request; its completion will not be delivered
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawns recognition requests onto a runtime
pub struct RecognitionDispatcher {
    runtime: Handle,
    text: Arc<dyn TextRecognizer>,
    faces: Arc<dyn FaceDetector>,
    events: Sender<ProbeEvent>,
    next_id: AtomicU64,
    in_flight: Mutex<Vec<RecognitionHandle>>,
}

impl RecognitionDispatcher {
    pub fn new(
        runtime: Handle,
        text: Arc<dyn TextRecognizer>,
        faces: Arc<dyn FaceDetector>,
        events: Sender<ProbeEvent>,
    ) -> Self {
        Self {
            runtime,
            text,
            faces,
            events,
            next_id: AtomicU64::new(1),
            in_flight: Mutex::new(Vec::new()),
        }
    }

    pub fn runtime(&self) -> &Handle {
        &self.runtime
    }

    pub fn text_recognizer(&self) -> Arc<dyn TextRecognizer> {
        self.text.clone()
    }

    /// Id the next submission will receive
    pub fn next_request_id(&self) -> RequestId {
        RequestId(self.next_id.load(Ordering::SeqCst))
    }

    /// Submit an image for text recognition
    pub fn submit_text(&self, image: Arc<RgbaImage>) -> RequestId {
        let id = self.allocate_id();
        let token = CancellationToken::new();
        let child = token.clone();
        let recognizer = self.text.clone();
        let events = self.events.clone();

        let task = self.runtime.spawn(async move {
            tokio::select! {
                _ = child.cancelled() => {
                    debug!("Text request {:?} cancelled", id);
                }
                result = recognizer.recognize_text(&image) => {
                    if !child.is_cancelled() {
                        let _ = events.send(ProbeEvent::TextRecognized {
                            origin: RequestOrigin::Manual(id),
                            result,
                        });
                    }
                }
            }
        });

        self.track(RecognitionHandle {
            id,
            kind: RecognitionKind::Text,
            token,
            task,
        });
        id
    }

    /// Submit an image for face detection
    pub fn submit_faces(&self, image: Arc<RgbaImage>) -> RequestId {
        let id = self.allocate_id();
        let token = CancellationToken::new();
        let child = token.clone();
        let detector = self.faces.clone();
        let events = self.events.clone();
        let probe = image.clone();

        let task = self.runtime.spawn(async move {
            tokio::select! {
                _ = child.cancelled() => {
                    debug!("Face request {:?} cancelled", id);
                }
                result = detector.detect_faces(&probe) => {
                    if !child.is_cancelled() {
                        let _ = events.send(ProbeEvent::FacesDetected {
                            origin: RequestOrigin::Manual(id),
                            input: image,
                            result,
                        });
                    }
                }
            }
        });

        self.track(RecognitionHandle {
            id,
            kind: RecognitionKind::Face,
            token,
            task,
        });
        id
    }

    /// Cancel every in-flight request, returning how many were still running
    pub fn cancel_all(&self) -> usize {
        let mut in_flight = self.in_flight.lock();
        let running = in_flight.iter().filter(|h| !h.is_finished()).count();
        for handle in in_flight.drain(..) {
            if !handle.is_finished() {
                debug!("Cancelling {:?} request {:?}", handle.kind(), handle.id());
            }
            handle.cancel();
        }
        running
    }

    /// Number of requests that have not completed yet
    pub fn in_flight(&self) -> usize {
        let mut in_flight = self.in_flight.lock();
        in_flight.retain(|h| !h.is_finished());
        in_flight.len()
    }

    fn allocate_id(&self) -> RequestId {
        RequestId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn track(&self, handle: RecognitionHandle) {
        let mut in_flight = self.in_flight.lock();
        in_flight.retain(|h| !h.is_finished());
        in_flight.push(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::{Face, RecognitionError, TextBlock};
    use async_trait::async_trait;
    use crossbeam_channel::unbounded;
    use std::time::Duration;

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
            Ok(vec![TextBlock::new("late ms")])
        }
    }

    struct NoFaces;

    #[async_trait]
    impl FaceDetector for NoFaces {
        async fn detect_faces(&self, _image: &RgbaImage) -> Result<Vec<Face>, RecognitionError> {
            Ok(vec![])
        }
    }

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap()
    }

    #[test]
    fn test_text_completion_delivered() {
        let rt = runtime();
        let (tx, rx) = unbounded();
        let dispatcher =
            RecognitionDispatcher::new(rt.handle().clone(), Arc::new(FixedText(vec!["23ms"])), Arc::new(NoFaces), tx);

        let id = dispatcher.submit_text(Arc::new(RgbaImage::new(4, 4)));

        match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
            ProbeEvent::TextRecognized { origin, result } => {
                assert_eq!(origin, RequestOrigin::Manual(id));
                assert_eq!(result.unwrap(), vec![TextBlock::new("23ms")]);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_ids_increase() {
        let rt = runtime();
        let (tx, _rx) = unbounded();
        let dispatcher =
            RecognitionDispatcher::new(rt.handle().clone(), Arc::new(FixedText(vec![])), Arc::new(NoFaces), tx);

        assert_eq!(dispatcher.next_request_id(), RequestId(1));
        let a = dispatcher.submit_text(Arc::new(RgbaImage::new(1, 1)));
        let b = dispatcher.submit_faces(Arc::new(RgbaImage::new(1, 1)));
        assert!(a < b);
        assert_eq!(dispatcher.next_request_id(), RequestId(3));
    }

    #[test]
    fn test_cancelled_request_not_delivered() {
        let rt = runtime();
        let (tx, rx) = unbounded();
        let dispatcher =
            RecognitionDispatcher::new(rt.handle().clone(), Arc::new(StalledText), Arc::new(NoFaces), tx);

        dispatcher.submit_text(Arc::new(RgbaImage::new(4, 4)));
        assert_eq!(dispatcher.in_flight(), 1);

        assert_eq!(dispatcher.cancel_all(), 1);
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
        assert_eq!(dispatcher.in_flight(), 0);
    }

    #[test]
    fn test_face_completion_carries_input() {
        let rt = runtime();
        let (tx, rx) = unbounded();
        let dispatcher =
            RecognitionDispatcher::new(rt.handle().clone(), Arc::new(FixedText(vec![])), Arc::new(NoFaces), tx);

        let input = Arc::new(RgbaImage::new(6, 5));
        dispatcher.submit_faces(input.clone());

        match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
            ProbeEvent::FacesDetected { input: delivered, result, .. } => {
                assert!(Arc::ptr_eq(&input, &delivered));
                assert!(result.unwrap().is_empty());
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
