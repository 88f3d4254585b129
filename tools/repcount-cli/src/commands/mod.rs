pub mod challenges;
pub mod config;
pub mod count;
pub mod profiles;
pub mod validate;

use repcount_common::error::RepcountError;
use repcount_pose_model::exercise::ExerciseKind;

/// Parse a user-supplied exercise name.
pub fn parse_exercise(name: &str) -> anyhow::Result<ExerciseKind> {
    name.parse().map_err(|e| {
        RepcountError::config(format!("{e} (expected squat, push-up or crunch)")).into()
    })
}
