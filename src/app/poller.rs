//! Video polling loop
//!
//! On every tick, fetches the frame at the current index, prepares it and
//! sends the crop to text recognition. The index starts at 1 and each index
//! is `frame_step_secs` seconds of video. Fire-and-forget recognitions still
//! in flight when the frames run out are awaited before the run returns, so
//! their results reach the controller while the run is current.

use crossbeam_channel::Sender;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::capture::{frame_timestamp, FrameSource};
use crate::config::FramePacing;
use crate::shared::{PollStop, ProbeEvent, RequestOrigin};
use crate::vision::{prepare_for_recognition, DisplayTarget, ProfileId, TextRecognizer};

/// Parameters of one polling run
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Run identifier carried by every event
    pub run: u64,
    pub profile: ProfileId,
    pub display: DisplayTarget,
    pub interval: Duration,
    pub frame_step_secs: u64,
    pub pacing: FramePacing,
    pub max_frames: Option<u64>,
}

/// Poll frames until the source runs dry, the limit is hit or the run is cancelled.
///
/// Returns the number of frames fetched and why the run stopped.
pub async fn run_poller(
    source: Arc<dyn FrameSource>,
    recognizer: Arc<dyn TextRecognizer>,
    config: PollerConfig,
    events: Sender<ProbeEvent>,
    cancel: CancellationToken,
) -> (u64, PollStop) {
    let mut pending = JoinSet::new();
    let (frames, stop) = poll_frames(source, recognizer, &config, &events, &cancel, &mut pending).await;
    if stop == PollStop::Cancelled || pending.is_empty() {
        // Dropping the set aborts whatever is left
        return (frames, stop);
    }

    debug!("Polling run {} waiting for {} recognition(s)", config.run, pending.len());
    tokio::select! {
        _ = cancel.cancelled() => (frames, PollStop::Cancelled),
        _ = async { while pending.join_next().await.is_some() {} } => (frames, stop),
    }
}

async fn poll_frames(
    source: Arc<dyn FrameSource>,
    recognizer: Arc<dyn TextRecognizer>,
    config: &PollerConfig,
    events: &Sender<ProbeEvent>,
    cancel: &CancellationToken,
    pending: &mut JoinSet<()>,
) -> (u64, PollStop) {
    let profile = config.profile.profile();
    let mut ticker = tokio::time::interval(config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut index: u64 = 1;
    let mut frames: u64 = 0;

    info!(
        "Polling run {} started: profile {}, display {}, {:?}",
        config.run, config.profile, config.display, config.pacing
    );

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return (frames, PollStop::Cancelled),
            _ = ticker.tick() => {}
        }

        if config.max_frames.is_some_and(|max| frames >= max) {
            return (frames, PollStop::FrameLimit);
        }

        let timestamp = frame_timestamp(index, config.frame_step_secs);
        let fetched = tokio::select! {
            _ = cancel.cancelled() => return (frames, PollStop::Cancelled),
            fetched = source.frame_at(timestamp) => fetched,
        };

        let image = match fetched {
            Ok(Some(image)) => image,
            Ok(None) => {
                info!("Polling run {} reached end of stream at {:?}", config.run, timestamp);
                return (frames, PollStop::EndOfStream);
            }
            Err(e) => {
                error!("Failed to fetch frame {} at {:?}: {}", index, timestamp, e);
                return (frames, PollStop::Failed(e.to_string()));
            }
        };
        frames += 1;

        match prepare_for_recognition(&image, profile, config.display) {
            Ok(prepared) => {
                let input = prepared.recognition_input.clone();
                let _ = events.send(ProbeEvent::FramePrepared {
                    run: config.run,
                    index,
                    frame: prepared,
                });

                let origin = RequestOrigin::Frame { run: config.run, index };
                match config.pacing {
                    FramePacing::AwaitCompletion => {
                        let result = tokio::select! {
                            _ = cancel.cancelled() => return (frames, PollStop::Cancelled),
                            result = recognizer.recognize_text(&input) => result,
                        };
                        let _ = events.send(ProbeEvent::TextRecognized { origin, result });
                    }
                    FramePacing::FireAndForget => {
                        let recognizer = recognizer.clone();
                        let events = events.clone();
                        let token = cancel.child_token();
                        while pending.try_join_next().is_some() {}
                        pending.spawn(async move {
                            tokio::select! {
                                _ = token.cancelled() => {}
                                result = recognizer.recognize_text(&input) => {
                                    if !token.is_cancelled() {
                                        let _ = events.send(ProbeEvent::TextRecognized { origin, result });
                                    }
                                }
                            }
                        });
                    }
                }
            }
            Err(e) => {
                warn!("Skipping frame {}: {}", index, e);
                let _ = events.send(ProbeEvent::FrameSkipped {
                    run: config.run,
                    index,
                    reason: e.to_string(),
                });
            }
        }

        debug!("Frame {} dispatched", index);
        index += 1;
    }
}
