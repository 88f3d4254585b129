//! The repetition state machine.
//!
//! # Algorithm
//!
//! 1. **Gate** the frame: reject it unless every required landmark is visible.
//! 2. **Measure** the joint angle on both sides and average them.
//! 3. **Step** the two-stage hysteresis machine with the averaged angle:
//!    - resting stage and `angle < enter_threshold` → contracted stage
//!    - contracted stage and `angle > exit_threshold` → resting stage
//! 4. **Count** only on an actual stage change, per the profile's
//!    [`CountRule`](crate::profile::CountRule).
//!
//! A stage that merely stays past its threshold for many frames is a level,
//! not an edge, and never counts again. NaN angles fail both comparisons and
//! leave the stage untouched.

use std::collections::BTreeMap;

use serde::Serialize;

use repcount_pose_model::exercise::{ExerciseKind, Stage};
use repcount_pose_model::landmark::LandmarkFrame;

use crate::angle::{joint_angle_checked, AngleReading, FALLBACK_ANGLE_DEGREES};
use crate::gate;
use crate::profile::{ExerciseProfile, JointTriple, Transition};

/// Result of feeding one averaged angle to the machine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StepOutcome {
    /// Stage after this step.
    pub stage: Stage,
    /// The edge taken, if the stage changed.
    pub transition: Option<Transition>,
    /// Whether this step completes a repetition.
    pub rep_counted: bool,
    /// Prompt accompanying the transition.
    pub feedback: Option<&'static str>,
}

/// Per-frame joint angles. Read-only diagnostics; never fed back.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct JointAngles {
    pub left: f64,
    pub right: f64,
    pub average: f64,
    /// Number of sides that used the fallback angle.
    pub degenerate_sides: u8,
}

impl JointAngles {
    /// Labelled view used by session snapshots.
    pub fn labelled(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("left".to_string(), self.left),
            ("right".to_string(), self.right),
            ("average".to_string(), self.average),
        ])
    }
}

/// What the machine did with one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum FrameEvaluation {
    /// The validity gate rejected the frame; nothing was measured.
    Rejected {
        missing: Vec<usize>,
        feedback: &'static str,
    },
    /// The frame was measured and the machine stepped.
    Measured {
        angles: JointAngles,
        outcome: StepOutcome,
    },
}

/// Two-stage hysteresis machine parameterized by an [`ExerciseProfile`].
///
/// The machine holds no mutable state; the caller owns the current stage.
#[derive(Debug, Clone)]
pub struct RepetitionMachine {
    profile: ExerciseProfile,
}

impl RepetitionMachine {
    pub fn new(profile: ExerciseProfile) -> Self {
        Self { profile }
    }

    /// Machine for a built-in exercise profile.
    pub fn for_kind(kind: ExerciseKind) -> Self {
        Self::new(ExerciseProfile::for_kind(kind))
    }

    pub fn profile(&self) -> &ExerciseProfile {
        &self.profile
    }

    /// Advance from `stage` given the averaged joint angle.
    ///
    /// A stage outside this profile's pair is returned unchanged.
    pub fn step(&self, stage: Stage, angle: f64) -> StepOutcome {
        let p = &self.profile;

        let transition = if stage == p.initial_stage && angle < p.enter_threshold {
            Some(Transition::Enter)
        } else if stage == p.contracted_stage && angle > p.exit_threshold {
            Some(Transition::Exit)
        } else {
            None
        };

        match transition {
            Some(t) => StepOutcome {
                stage: match t {
                    Transition::Enter => p.contracted_stage,
                    Transition::Exit => p.initial_stage,
                },
                transition: Some(t),
                rep_counted: p.count_on.counts(t),
                feedback: Some(p.feedback.for_transition(t)),
            },
            None => StepOutcome {
                stage,
                transition: None,
                rep_counted: false,
                feedback: None,
            },
        }
    }

    /// Left, right and averaged joint angles for a frame.
    ///
    /// Missing landmarks count as degenerate geometry and yield the
    /// fallback angle for that side.
    pub fn measure(&self, frame: &LandmarkFrame) -> JointAngles {
        let [left_joint, right_joint] = self.profile.joints;
        let left = side_angle(frame, left_joint);
        let right = side_angle(frame, right_joint);

        JointAngles {
            left: left.degrees,
            right: right.degrees,
            average: (left.degrees + right.degrees) / 2.0,
            degenerate_sides: left.degenerate as u8 + right.degenerate as u8,
        }
    }

    /// Gate, measure and step for one frame.
    pub fn evaluate(&self, stage: Stage, frame: &LandmarkFrame) -> FrameEvaluation {
        let missing = gate::missing_landmarks(frame, &self.profile);
        if !missing.is_empty() {
            return FrameEvaluation::Rejected {
                missing,
                feedback: self.profile.feedback.invalid_pose,
            };
        }

        let angles = self.measure(frame);
        if angles.degenerate_sides > 0 {
            tracing::debug!(
                exercise = %self.profile.kind,
                sides = angles.degenerate_sides,
                "Degenerate joint geometry, using fallback angle"
            );
        }

        FrameEvaluation::Measured {
            angles,
            outcome: self.step(stage, angles.average),
        }
    }
}

fn side_angle(frame: &LandmarkFrame, joint: JointTriple) -> AngleReading {
    match (frame.get(joint.a), frame.get(joint.vertex), frame.get(joint.c)) {
        (Some(a), Some(b), Some(c)) => joint_angle_checked(a.position(), b.position(), c.position()),
        _ => AngleReading {
            degrees: FALLBACK_ANGLE_DEGREES,
            degenerate: true,
        },
    }
}
