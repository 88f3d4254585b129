//! Per-exercise counting configuration.
//!
//! | Exercise | Joint (per side)       | Enter  | Exit   | Initial | Counts on |
//! |----------|------------------------|--------|--------|---------|-----------|
//! | Squat    | hip–knee–ankle         | < 120° | > 160° | Stand   | both      |
//! | Push-up  | shoulder–elbow–wrist   | < 90°  | > 160° | Up      | exit      |
//! | Crunch   | shoulder–hip–knee      | < 45°  | > 100° | Down    | exit      |
//!
//! The gap between enter and exit is the hysteresis band; it must stay wider
//! than frame-to-frame angle jitter.

use serde::Serialize;

use repcount_pose_model::exercise::{ExerciseKind, Stage};
use repcount_pose_model::landmark::*;

/// Minimum visibility every required landmark must exceed.
pub const VISIBILITY_THRESHOLD: f64 = 0.65;

/// Three landmark indices; the angle is measured at `vertex`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JointTriple {
    pub a: usize,
    pub vertex: usize,
    pub c: usize,
}

impl JointTriple {
    pub const fn new(a: usize, vertex: usize, c: usize) -> Self {
        Self { a, vertex, c }
    }

    pub fn indices(&self) -> [usize; 3] {
        [self.a, self.vertex, self.c]
    }
}

/// Direction of a stage change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    /// Resting stage → contracted stage (angle fell below `enter_threshold`).
    Enter,
    /// Contracted stage → resting stage (angle rose above `exit_threshold`).
    Exit,
}

/// Which transitions increment the rep count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CountRule {
    OnEnter,
    OnExit,
    OnBoth,
}

impl CountRule {
    pub fn counts(&self, transition: Transition) -> bool {
        matches!(
            (self, transition),
            (Self::OnBoth, _)
                | (Self::OnEnter, Transition::Enter)
                | (Self::OnExit, Transition::Exit)
        )
    }
}

/// User-facing prompts for one exercise. Advisory only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeedbackText {
    /// Shown while the gate rejects frames.
    pub invalid_pose: &'static str,
    /// Shown when a session starts.
    pub ready: &'static str,
    /// Shown on the enter transition.
    pub entered: &'static str,
    /// Shown on the exit transition.
    pub completed: &'static str,
}

impl FeedbackText {
    pub fn for_transition(&self, transition: Transition) -> &'static str {
        match transition {
            Transition::Enter => self.entered,
            Transition::Exit => self.completed,
        }
    }
}

/// Fixed counting configuration for one exercise.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExerciseProfile {
    pub kind: ExerciseKind,
    /// Left and right joint triples; their angles are averaged.
    pub joints: [JointTriple; 2],
    /// Sorted, de-duplicated union of the joint triples' indices.
    pub required_landmarks: Vec<usize>,
    pub visibility_threshold: f64,
    /// Resting → contracted when the average angle drops below this.
    pub enter_threshold: f64,
    /// Contracted → resting when the average angle rises above this.
    pub exit_threshold: f64,
    pub initial_stage: Stage,
    pub contracted_stage: Stage,
    pub count_on: CountRule,
    pub feedback: FeedbackText,
}

impl ExerciseProfile {
    /// The built-in profile for `kind`.
    pub fn for_kind(kind: ExerciseKind) -> Self {
        match kind {
            ExerciseKind::Squat => Self::build(
                kind,
                [
                    JointTriple::new(LEFT_HIP, LEFT_KNEE, LEFT_ANKLE),
                    JointTriple::new(RIGHT_HIP, RIGHT_KNEE, RIGHT_ANKLE),
                ],
                120.0,
                160.0,
                CountRule::OnBoth,
                FeedbackText {
                    invalid_pose: "Please ensure your full body is visible",
                    ready: "Stand in frame to begin",
                    entered: "Good! Now stand up",
                    completed: "Great squat! Go for another one",
                },
            ),
            ExerciseKind::PushUp => Self::build(
                kind,
                [
                    JointTriple::new(LEFT_SHOULDER, LEFT_ELBOW, LEFT_WRIST),
                    JointTriple::new(RIGHT_SHOULDER, RIGHT_ELBOW, RIGHT_WRIST),
                ],
                90.0,
                160.0,
                CountRule::OnExit,
                FeedbackText {
                    invalid_pose: "Please ensure your full body is visible",
                    ready: "Get into push-up position to begin",
                    entered: "Good! Now push back up",
                    completed: "Great push-up! Go for another one",
                },
            ),
            ExerciseKind::Crunch => Self::build(
                kind,
                [
                    JointTriple::new(LEFT_SHOULDER, LEFT_HIP, LEFT_KNEE),
                    JointTriple::new(RIGHT_SHOULDER, RIGHT_HIP, RIGHT_KNEE),
                ],
                45.0,
                100.0,
                CountRule::OnExit,
                FeedbackText {
                    invalid_pose: "Please ensure your upper body is visible",
                    ready: "Position yourself to start counting crunches",
                    entered: "Good! Now lower back down",
                    completed: "Great crunch! Go for another one",
                },
            ),
        }
    }

    /// All built-in profiles, in [`ExerciseKind::ALL`] order.
    pub fn all() -> Vec<Self> {
        ExerciseKind::ALL.into_iter().map(Self::for_kind).collect()
    }

    fn build(
        kind: ExerciseKind,
        joints: [JointTriple; 2],
        enter_threshold: f64,
        exit_threshold: f64,
        count_on: CountRule,
        feedback: FeedbackText,
    ) -> Self {
        let [initial_stage, contracted_stage] = kind.stages();

        let mut required_landmarks: Vec<usize> =
            joints.iter().flat_map(JointTriple::indices).collect();
        required_landmarks.sort_unstable();
        required_landmarks.dedup();

        Self {
            kind,
            joints,
            required_landmarks,
            visibility_threshold: VISIBILITY_THRESHOLD,
            enter_threshold,
            exit_threshold,
            initial_stage,
            contracted_stage,
            count_on,
            feedback,
        }
    }

    /// Width of the hysteresis band in degrees.
    pub fn hysteresis_band(&self) -> f64 {
        self.exit_threshold - self.enter_threshold
    }
}
