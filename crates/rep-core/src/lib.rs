//! RepCount Core: the repetition counter
//!
//! Turns a stream of landmark frames into stage transitions and rep counts:
//! - **Validity Gate:** Reject frames without confidently observed joints
//! - **Angle Calculator:** Included joint angle from three landmarks
//! - **Exercise Profiles:** Fixed joint triples and thresholds per exercise
//! - **Repetition Machine:** Two-stage hysteresis that counts on edges
//!
//! This crate is pure computation. No I/O, no clocks, no threads.
//! All inputs are data; all outputs are data.

pub mod angle;
pub mod gate;
pub mod machine;
pub mod profile;

pub use angle::{joint_angle_checked, joint_angle_degrees, AngleReading, FALLBACK_ANGLE_DEGREES};
pub use gate::{is_valid, missing_landmarks};
pub use machine::{FrameEvaluation, JointAngles, RepetitionMachine, StepOutcome};
pub use profile::{CountRule, ExerciseProfile, FeedbackText, JointTriple, Transition};
