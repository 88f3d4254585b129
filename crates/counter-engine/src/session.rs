//! Counter session lifecycle.
//!
//! A [`RepCounter`] moves between `Idle` and `Running`. While running it
//! owns one [`CounterSession`] and mutates it for every frame; after each
//! frame and each control call it publishes a [`SessionSnapshot`] through a
//! `tokio::sync::watch` channel so readers never touch the live session.

use std::collections::BTreeMap;

use serde::Serialize;
use tokio::sync::watch;

use repcount_common::clock::SessionClock;
use repcount_common::error::{RepcountError, RepcountResult};
use repcount_core::{ExerciseProfile, FrameEvaluation, RepetitionMachine, Transition};
use repcount_pose_model::exercise::{ExerciseKind, Stage};
use repcount_pose_model::landmark::LandmarkFrame;

/// Counter lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Running,
}

/// What happened to a frame handed to [`RepCounter::on_frame`].
#[derive(Debug, Clone, PartialEq)]
pub enum FrameDisposition {
    /// No session was running.
    Ignored,
    /// The validity gate rejected the frame.
    Rejected { missing: Vec<usize> },
    /// The frame was measured; the stage may have changed.
    Measured {
        stage: Stage,
        transition: Option<Transition>,
        rep_counted: bool,
    },
}

/// Mutable state of one counting session.
#[derive(Debug, Clone)]
pub struct CounterSession {
    machine: RepetitionMachine,
    stage: Stage,
    count: u32,
    goal: Option<u32>,
    last_feedback: String,
    last_angles: BTreeMap<String, f64>,
    frames_seen: u64,
    frames_rejected: u64,
    degenerate_angles: u64,
    clock: SessionClock,
}

impl CounterSession {
    /// Fresh session at the exercise's initial stage with the ready prompt.
    pub fn new(kind: ExerciseKind, goal: Option<u32>) -> Self {
        let machine = RepetitionMachine::for_kind(kind);
        let stage = machine.profile().initial_stage;
        let last_feedback = machine.profile().feedback.ready.to_string();
        Self {
            machine,
            stage,
            last_feedback,
            count: 0,
            goal,
            last_angles: BTreeMap::new(),
            frames_seen: 0,
            frames_rejected: 0,
            degenerate_angles: 0,
            clock: SessionClock::start(),
        }
    }

    pub fn kind(&self) -> ExerciseKind {
        self.machine.profile().kind
    }

    pub fn profile(&self) -> &ExerciseProfile {
        self.machine.profile()
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn goal(&self) -> Option<u32> {
        self.goal
    }

    /// Counting continues past the goal; this is informational only.
    pub fn goal_reached(&self) -> bool {
        self.goal.is_some_and(|goal| self.count >= goal)
    }

    pub fn last_feedback(&self) -> &str {
        &self.last_feedback
    }

    pub fn last_angles(&self) -> &BTreeMap<String, f64> {
        &self.last_angles
    }

    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }

    pub fn frames_rejected(&self) -> u64 {
        self.frames_rejected
    }

    /// Measured frames where at least one side used the fallback angle.
    pub fn degenerate_angles(&self) -> u64 {
        self.degenerate_angles
    }

    pub fn clock(&self) -> &SessionClock {
        &self.clock
    }

    /// Gate, measure and step one frame, updating count, stage and feedback.
    pub fn apply(&mut self, frame: &LandmarkFrame) -> FrameDisposition {
        self.frames_seen += 1;

        match self.machine.evaluate(self.stage, frame) {
            FrameEvaluation::Rejected { missing, feedback } => {
                self.frames_rejected += 1;
                self.last_feedback = feedback.to_string();
                tracing::debug!(
                    exercise = %self.kind(),
                    missing = ?missing,
                    "Frame rejected by validity gate"
                );
                FrameDisposition::Rejected { missing }
            }
            FrameEvaluation::Measured { angles, outcome } => {
                if angles.degenerate_sides > 0 {
                    self.degenerate_angles += 1;
                    if self.degenerate_angles == 1 {
                        tracing::warn!(
                            exercise = %self.kind(),
                            "Degenerate joint geometry; angles fall back to 180°"
                        );
                    }
                }
                self.last_angles = angles.labelled();
                self.stage = outcome.stage;

                if let Some(feedback) = outcome.feedback {
                    self.last_feedback = feedback.to_string();
                }
                if let Some(transition) = outcome.transition {
                    tracing::debug!(
                        exercise = %self.kind(),
                        ?transition,
                        stage = %self.stage,
                        angle = angles.average,
                        "Stage transition"
                    );
                }
                if outcome.rep_counted {
                    self.count = self.count.saturating_add(1);
                    tracing::info!(exercise = %self.kind(), count = self.count, "Repetition counted");
                    if self.goal == Some(self.count) {
                        tracing::info!(goal = self.count, "Goal reached");
                    }
                }

                FrameDisposition::Measured {
                    stage: self.stage,
                    transition: outcome.transition,
                    rep_counted: outcome.rep_counted,
                }
            }
        }
    }

    /// Back to zero reps at the initial stage. Exercise, goal and frame
    /// counters are kept.
    pub fn reset(&mut self) {
        self.count = 0;
        self.stage = self.profile().initial_stage;
        self.last_feedback.clear();
        self.last_angles.clear();
    }
}

/// Read-only view of a counter, published after every change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub kind: Option<ExerciseKind>,
    pub state: SessionState,
    pub count: u32,
    pub stage: Option<Stage>,
    pub last_feedback: String,
    pub last_angles: BTreeMap<String, f64>,
    pub goal: Option<u32>,
    pub goal_reached: bool,
    pub frames_seen: u64,
    pub frames_rejected: u64,
    /// Wall-clock session start (RFC 3339).
    pub started_at: Option<String>,
}

impl SessionSnapshot {
    /// Snapshot of a counter that has never been started.
    pub fn idle() -> Self {
        Self {
            kind: None,
            state: SessionState::Idle,
            count: 0,
            stage: None,
            last_feedback: String::new(),
            last_angles: BTreeMap::new(),
            goal: None,
            goal_reached: false,
            frames_seen: 0,
            frames_rejected: 0,
            started_at: None,
        }
    }

    fn capture(state: SessionState, session: &CounterSession) -> Self {
        Self {
            kind: Some(session.kind()),
            state,
            count: session.count,
            stage: Some(session.stage),
            last_feedback: session.last_feedback.clone(),
            last_angles: session.last_angles.clone(),
            goal: session.goal,
            goal_reached: session.goal_reached(),
            frames_seen: session.frames_seen,
            frames_rejected: session.frames_rejected,
            started_at: Some(session.clock.epoch_wall().to_string()),
        }
    }
}

/// A rep counter with an `Idle → Running → Idle` lifecycle.
///
/// Control calls (`start`, `stop`, `reset`) and frames must come from a
/// single owner; other tasks observe it through [`RepCounter::subscribe`].
#[derive(Debug)]
pub struct RepCounter {
    state: SessionState,
    session: Option<CounterSession>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
}

impl Default for RepCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl RepCounter {
    pub fn new() -> Self {
        let (snapshot_tx, _) = watch::channel(SessionSnapshot::idle());
        Self {
            state: SessionState::Idle,
            session: None,
            snapshot_tx,
        }
    }

    /// Start a fresh session, discarding any previous one.
    pub fn start(&mut self, kind: ExerciseKind, goal: Option<u32>) -> RepcountResult<()> {
        if self.state == SessionState::Running {
            return Err(RepcountError::session("Session already running"));
        }

        tracing::info!(exercise = %kind, goal = ?goal, "Starting counter session");

        self.session = Some(CounterSession::new(kind, goal));
        self.state = SessionState::Running;
        self.publish();
        Ok(())
    }

    /// Stop accepting frames. The final state stays readable until the
    /// next `start`.
    pub fn stop(&mut self) -> RepcountResult<SessionSnapshot> {
        if self.state != SessionState::Running {
            return Err(RepcountError::session("No session running"));
        }

        self.state = SessionState::Idle;
        if let Some(session) = &self.session {
            tracing::info!(
                exercise = %session.kind(),
                count = session.count,
                frames_seen = session.frames_seen,
                frames_rejected = session.frames_rejected,
                elapsed_secs = session.clock.elapsed_secs(),
                "Counter session stopped"
            );
        }
        self.publish();
        Ok(self.snapshot())
    }

    /// Zero the count and return to the initial stage. Works while running
    /// or after a stop; repeated calls are no-ops.
    pub fn reset(&mut self) -> RepcountResult<()> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| RepcountError::session("No session to reset"))?;

        session.reset();
        tracing::info!(exercise = %session.kind(), "Counter session reset");
        self.publish();
        Ok(())
    }

    /// Process one frame. Frames arriving while idle are ignored.
    pub fn on_frame(&mut self, frame: &LandmarkFrame) -> FrameDisposition {
        if self.state != SessionState::Running {
            return FrameDisposition::Ignored;
        }
        let Some(session) = self.session.as_mut() else {
            return FrameDisposition::Ignored;
        };

        let disposition = session.apply(frame);
        self.publish();
        disposition
    }

    /// Process flat estimator output (`x, y, visibility` per landmark).
    ///
    /// A buffer of the wrong length is a malformed frame and is reported
    /// without touching the session.
    pub fn on_flat_frame(&mut self, data: &[f64]) -> RepcountResult<FrameDisposition> {
        let frame =
            LandmarkFrame::from_flat(data).map_err(|e| RepcountError::frame(e.to_string()))?;
        Ok(self.on_frame(&frame))
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    /// The current or most recently stopped session.
    pub fn session(&self) -> Option<&CounterSession> {
        self.session.as_ref()
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_tx.subscribe()
    }

    fn publish(&self) {
        let snapshot = match &self.session {
            Some(session) => SessionSnapshot::capture(self.state, session),
            None => SessionSnapshot::idle(),
        };
        // Stored even when nobody is subscribed.
        self.snapshot_tx.send_replace(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repcount_pose_model::landmark::*;

    fn squat_frame(angle: f64, visibility: f64) -> LandmarkFrame {
        let theta = angle.to_radians();
        let mut frame = LandmarkFrame::empty();
        for (hip, knee, ankle, vx) in [
            (LEFT_HIP, LEFT_KNEE, LEFT_ANKLE, 0.4),
            (RIGHT_HIP, RIGHT_KNEE, RIGHT_ANKLE, 0.6),
        ] {
            frame.set(hip, Some(LandmarkPoint::new(vx, 0.3, visibility))).unwrap();
            frame.set(knee, Some(LandmarkPoint::new(vx, 0.5, visibility))).unwrap();
            frame
                .set(
                    ankle,
                    Some(LandmarkPoint::new(
                        vx + 0.2 * theta.sin(),
                        0.5 - 0.2 * theta.cos(),
                        visibility,
                    )),
                )
                .unwrap();
        }
        frame
    }

    #[test]
    fn test_start_sets_ready_state() {
        let mut counter = RepCounter::new();
        counter.start(ExerciseKind::Squat, Some(10)).unwrap();

        let snap = counter.snapshot();
        assert_eq!(snap.state, SessionState::Running);
        assert_eq!(snap.kind, Some(ExerciseKind::Squat));
        assert_eq!(snap.stage, Some(Stage::Stand));
        assert_eq!(snap.count, 0);
        assert_eq!(snap.goal, Some(10));
        assert_eq!(snap.last_feedback, "Stand in frame to begin");
        assert!(snap.started_at.is_some());
    }

    #[test]
    fn test_double_start_is_rejected() {
        let mut counter = RepCounter::new();
        counter.start(ExerciseKind::PushUp, None).unwrap();
        let err = counter.start(ExerciseKind::Squat, None).unwrap_err();
        assert!(matches!(err, RepcountError::Session { .. }));
        assert_eq!(counter.snapshot().kind, Some(ExerciseKind::PushUp));
    }

    #[test]
    fn test_stop_while_idle_is_rejected() {
        let mut counter = RepCounter::new();
        assert!(counter.stop().is_err());
    }

    #[test]
    fn test_reset_before_start_is_rejected() {
        let mut counter = RepCounter::new();
        let err = counter.reset().unwrap_err();
        assert!(matches!(err, RepcountError::Session { .. }));
        assert_eq!(counter.snapshot(), SessionSnapshot::idle());
    }

    #[test]
    fn test_frames_count_and_publish() {
        let mut counter = RepCounter::new();
        let rx = counter.subscribe();
        counter.start(ExerciseKind::Squat, Some(2)).unwrap();

        for angle in [170.0, 115.0, 110.0, 165.0] {
            counter.on_frame(&squat_frame(angle, 0.9));
        }

        let snap = rx.borrow().clone();
        assert_eq!(snap.count, 2);
        assert_eq!(snap.stage, Some(Stage::Stand));
        assert!(snap.goal_reached);
        assert_eq!(snap.frames_seen, 4);
        assert_eq!(snap.last_feedback, "Great squat! Go for another one");
        assert_eq!(snap.last_angles.len(), 3);
    }

    #[test]
    fn test_rejected_frame_sets_feedback_only() {
        let mut counter = RepCounter::new();
        counter.start(ExerciseKind::Squat, None).unwrap();

        let frame = squat_frame(100.0, 0.9)
            .with_point(LEFT_KNEE, LandmarkPoint::new(0.4, 0.5, 0.5))
            .unwrap();
        let disposition = counter.on_frame(&frame);

        assert_eq!(
            disposition,
            FrameDisposition::Rejected {
                missing: vec![LEFT_KNEE]
            }
        );
        let snap = counter.snapshot();
        assert_eq!(snap.stage, Some(Stage::Stand));
        assert_eq!(snap.count, 0);
        assert_eq!(snap.frames_rejected, 1);
        assert_eq!(snap.last_feedback, "Please ensure your full body is visible");
    }

    #[test]
    fn test_frames_after_stop_are_ignored() {
        let mut counter = RepCounter::new();
        counter.start(ExerciseKind::Squat, None).unwrap();
        counter.on_frame(&squat_frame(110.0, 0.9));
        let stopped = counter.stop().unwrap();
        assert_eq!(stopped.count, 1);
        assert_eq!(stopped.state, SessionState::Idle);

        assert_eq!(
            counter.on_frame(&squat_frame(170.0, 0.9)),
            FrameDisposition::Ignored
        );
        assert_eq!(counter.snapshot(), stopped);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut counter = RepCounter::new();
        counter.start(ExerciseKind::Squat, None).unwrap();
        counter.on_frame(&squat_frame(110.0, 0.9));

        counter.reset().unwrap();
        let once = counter.snapshot();
        counter.reset().unwrap();
        assert_eq!(counter.snapshot(), once);

        assert_eq!(once.count, 0);
        assert_eq!(once.stage, Some(Stage::Stand));
        assert!(once.last_feedback.is_empty());
        assert!(once.last_angles.is_empty());
        assert_eq!(once.kind, Some(ExerciseKind::Squat));
        assert_eq!(once.state, SessionState::Running);
    }

    #[test]
    fn test_reset_after_stop_keeps_idle() {
        let mut counter = RepCounter::new();
        counter.start(ExerciseKind::Crunch, None).unwrap();
        counter.stop().unwrap();
        counter.reset().unwrap();
        assert_eq!(counter.state(), SessionState::Idle);
        assert_eq!(counter.snapshot().stage, Some(Stage::Down));
    }

    #[test]
    fn test_restart_discards_previous_session() {
        let mut counter = RepCounter::new();
        counter.start(ExerciseKind::Squat, None).unwrap();
        counter.on_frame(&squat_frame(110.0, 0.9));
        counter.stop().unwrap();

        counter.start(ExerciseKind::PushUp, Some(5)).unwrap();
        let snap = counter.snapshot();
        assert_eq!(snap.count, 0);
        assert_eq!(snap.kind, Some(ExerciseKind::PushUp));
        assert_eq!(snap.stage, Some(Stage::Up));
        assert_eq!(snap.frames_seen, 0);
    }

    #[test]
    fn test_flat_frame_boundary() {
        let mut counter = RepCounter::new();
        counter.start(ExerciseKind::Squat, None).unwrap();

        let err = counter.on_flat_frame(&[0.5; 10]).unwrap_err();
        assert!(matches!(err, RepcountError::Frame { .. }));
        assert_eq!(counter.snapshot().frames_seen, 0);

        let disposition = counter
            .on_flat_frame(&[0.9; LANDMARK_COUNT * FLAT_STRIDE])
            .unwrap();
        assert!(matches!(disposition, FrameDisposition::Measured { .. }));
        assert_eq!(counter.snapshot().frames_seen, 1);
        assert_eq!(counter.session().unwrap().degenerate_angles(), 1);
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut counter = RepCounter::new();
        counter.start(ExerciseKind::PushUp, None).unwrap();
        let json = serde_json::to_value(counter.snapshot()).unwrap();
        assert_eq!(json["kind"], "push_up");
        assert_eq!(json["state"], "running");
        assert_eq!(json["stage"], "up");
    }
}
