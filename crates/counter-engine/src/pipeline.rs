//! Frame pipeline.
//!
//! A producer pulls frames from a [`FrameSource`] on a blocking worker and
//! hands them to a single consumer that drives the [`RepCounter`]. With the
//! default [`DeliveryPolicy::LatestOnly`] the hand-off is a one-frame slot:
//! when the consumer falls behind, the newest frame overwrites the unread
//! one and the stale frame counts as dropped.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, watch};

use repcount_common::error::{RepcountError, RepcountResult};
use repcount_pose_model::exercise::Stage;
use repcount_pose_model::landmark::LandmarkFrame;

use crate::session::{FrameDisposition, RepCounter, SessionSnapshot};
use crate::source::FrameSource;

/// Queue depth used by [`DeliveryPolicy::Lossless`].
const LOSSLESS_QUEUE_DEPTH: usize = 64;

/// How frames travel from the source to the counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeliveryPolicy {
    /// Keep only the most recent unprocessed frame. Used for live input.
    #[default]
    LatestOnly,
    /// Bounded queue; the source waits for the counter. Used for offline
    /// replay where every frame must be counted.
    Lossless,
}

/// Runtime statistics from a pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    /// Frames delivered by the source.
    pub frames_received: u64,

    /// Frames handed to the counter.
    pub frames_processed: u64,

    /// Frames overwritten before the counter reached them, or left unread
    /// at stop.
    pub frames_dropped: u64,
}

impl PipelineStats {
    /// Drop rate as a percentage.
    pub fn drop_rate(&self) -> f64 {
        if self.frames_received == 0 {
            return 0.0;
        }
        self.frames_dropped as f64 / self.frames_received as f64 * 100.0
    }
}

/// One stage change observed by the consumer, in frame order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageChange {
    /// Frames seen by the session up to and including this one.
    pub frame: u64,
    pub stage: Stage,
    pub count: u32,
    pub rep_counted: bool,
    pub feedback: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ControlCommand {
    Stop,
    Reset,
}

/// Cloneable handle for controlling a running pipeline from another task.
#[derive(Debug, Clone)]
pub struct PipelineControl {
    stop_flag: Arc<AtomicBool>,
    commands: mpsc::UnboundedSender<ControlCommand>,
}

impl PipelineControl {
    /// Stop processing. No frame is handed to the counter after this returns.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        let _ = self.commands.send(ControlCommand::Stop);
    }

    /// Reset the running session's count and stage.
    pub fn reset(&self) -> RepcountResult<()> {
        self.commands
            .send(ControlCommand::Reset)
            .map_err(|_| RepcountError::session("Pipeline is gone"))
    }

    pub fn is_stopped(&self) -> bool {
        self.stop_flag.load(Ordering::SeqCst)
    }
}

/// Drives a [`RepCounter`] from a [`FrameSource`].
pub struct FramePipeline {
    counter: RepCounter,
    source: Option<Box<dyn FrameSource>>,
    policy: DeliveryPolicy,
    stop_flag: Arc<AtomicBool>,
    commands_tx: mpsc::UnboundedSender<ControlCommand>,
    commands_rx: mpsc::UnboundedReceiver<ControlCommand>,
    stage_changes: Option<mpsc::UnboundedSender<StageChange>>,
}

impl FramePipeline {
    /// The counter must already be started before [`FramePipeline::run`].
    pub fn new(counter: RepCounter, source: Box<dyn FrameSource>) -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        Self {
            counter,
            source: Some(source),
            policy: DeliveryPolicy::default(),
            stop_flag: Arc::new(AtomicBool::new(false)),
            commands_tx,
            commands_rx,
            stage_changes: None,
        }
    }

    pub fn with_policy(mut self, policy: DeliveryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn control(&self) -> PipelineControl {
        PipelineControl {
            stop_flag: self.stop_flag.clone(),
            commands: self.commands_tx.clone(),
        }
    }

    /// Get the stop flag for external coordination.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.counter.subscribe()
    }

    /// Every stage change of the next [`FramePipeline::run`], none merged.
    /// The stream ends when that run returns.
    pub fn stage_changes(&mut self) -> mpsc::UnboundedReceiver<StageChange> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.stage_changes = Some(tx);
        rx
    }

    pub fn counter(&self) -> &RepCounter {
        &self.counter
    }

    pub fn into_counter(self) -> RepCounter {
        self.counter
    }

    /// Process frames until the source is exhausted, the pipeline is
    /// stopped, or the source fails. The session is stopped on return.
    pub async fn run(&mut self) -> RepcountResult<PipelineStats> {
        if !self.counter.is_running() {
            return Err(RepcountError::session("Pipeline requires a running session"));
        }
        let source = self
            .source
            .take()
            .ok_or_else(|| RepcountError::session("Frame source already consumed"))?;

        tracing::info!(source = %source.name(), policy = ?self.policy, "Frame pipeline started");

        let received = Arc::new(AtomicU64::new(0));
        let (sender, mut frames) = frame_slot(self.policy);
        let producer = {
            let stop_flag = self.stop_flag.clone();
            let received = received.clone();
            tokio::task::spawn_blocking(move || produce(source, sender, &stop_flag, &received))
        };

        let stage_changes = self.stage_changes.take();
        let mut processed = 0u64;
        loop {
            tokio::select! {
                biased;

                Some(command) = self.commands_rx.recv() => match command {
                    ControlCommand::Stop => break,
                    ControlCommand::Reset => {
                        if let Err(e) = self.counter.reset() {
                            tracing::warn!(error = %e, "Reset ignored");
                        }
                    }
                },

                frame = frames.next() => {
                    let Some(frame) = frame else { break };
                    if self.stop_flag.load(Ordering::SeqCst) {
                        break;
                    }
                    let disposition = self.counter.on_frame(&frame);
                    processed += 1;
                    if let Some(tx) = &stage_changes {
                        report_stage_change(&self.counter, &disposition, tx);
                    }
                }
            }
        }

        self.stop_flag.store(true, Ordering::SeqCst);
        drop(frames);
        drop(stage_changes);

        let produced = producer
            .await
            .map_err(|e| RepcountError::source(format!("Frame producer failed: {e}")))
            .and_then(|result| result);

        let frames_received = received.load(Ordering::SeqCst);
        let stats = PipelineStats {
            frames_received,
            frames_processed: processed,
            frames_dropped: frames_received.saturating_sub(processed),
        };

        if self.counter.is_running() {
            self.counter.stop()?;
        }

        produced?;

        tracing::info!(
            received = stats.frames_received,
            processed = stats.frames_processed,
            dropped = stats.frames_dropped,
            "Frame pipeline stopped"
        );
        Ok(stats)
    }
}

fn report_stage_change(
    counter: &RepCounter,
    disposition: &FrameDisposition,
    tx: &mpsc::UnboundedSender<StageChange>,
) {
    let FrameDisposition::Measured {
        stage,
        transition: Some(_),
        rep_counted,
    } = disposition
    else {
        return;
    };
    let Some(session) = counter.session() else {
        return;
    };
    // A closed receiver only means nobody is watching.
    let _ = tx.send(StageChange {
        frame: session.frames_seen(),
        stage: *stage,
        count: session.count(),
        rep_counted: *rep_counted,
        feedback: session.last_feedback().to_string(),
    });
}

fn produce(
    mut source: Box<dyn FrameSource>,
    sender: FrameSender,
    stop_flag: &AtomicBool,
    received: &AtomicU64,
) -> RepcountResult<()> {
    while !stop_flag.load(Ordering::SeqCst) {
        match source.next_frame() {
            Ok(Some(frame)) => {
                received.fetch_add(1, Ordering::SeqCst);
                if !sender.deliver(frame) {
                    break;
                }
            }
            Ok(None) => {
                tracing::debug!(source = %source.name(), "Frame source exhausted");
                break;
            }
            Err(e) => {
                tracing::warn!(source = %source.name(), error = %e, "Frame source failed");
                return Err(match e {
                    RepcountError::Source { .. } => e,
                    other => RepcountError::source(format!("{}: {other}", source.name())),
                });
            }
        }
    }
    Ok(())
}

enum FrameSender {
    Latest(watch::Sender<Option<LandmarkFrame>>),
    Queued(mpsc::Sender<LandmarkFrame>),
}

impl FrameSender {
    /// Returns false once the consumer is gone.
    fn deliver(&self, frame: LandmarkFrame) -> bool {
        match self {
            Self::Latest(tx) => {
                if tx.is_closed() {
                    return false;
                }
                tx.send_replace(Some(frame));
                true
            }
            Self::Queued(tx) => tx.blocking_send(frame).is_ok(),
        }
    }
}

enum FrameReceiver {
    Latest(watch::Receiver<Option<LandmarkFrame>>),
    Queued(mpsc::Receiver<LandmarkFrame>),
}

impl FrameReceiver {
    /// Next frame to process, or `None` once the producer has finished and
    /// nothing is left unread.
    async fn next(&mut self) -> Option<LandmarkFrame> {
        match self {
            Self::Latest(rx) => loop {
                rx.changed().await.ok()?;
                if let Some(frame) = rx.borrow_and_update().clone() {
                    return Some(frame);
                }
            },
            Self::Queued(rx) => rx.recv().await,
        }
    }
}

fn frame_slot(policy: DeliveryPolicy) -> (FrameSender, FrameReceiver) {
    match policy {
        DeliveryPolicy::LatestOnly => {
            let (tx, rx) = watch::channel(None);
            (FrameSender::Latest(tx), FrameReceiver::Latest(rx))
        }
        DeliveryPolicy::Lossless => {
            let (tx, rx) = mpsc::channel(LOSSLESS_QUEUE_DEPTH);
            (FrameSender::Queued(tx), FrameReceiver::Queued(rx))
        }
    }
}
