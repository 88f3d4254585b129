//! Exercise kinds and repetition stages.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Supported exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    Squat,
    PushUp,
    Crunch,
}

/// One of the two named phases of a repetition cycle.
///
/// Each exercise uses exactly two of these; see [`ExerciseKind::stages`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Stand,
    Squat,
    Up,
    Down,
}

impl ExerciseKind {
    pub const ALL: [ExerciseKind; 3] = [Self::Squat, Self::PushUp, Self::Crunch];

    /// The two stages of this exercise's cycle, resting stage first.
    pub fn stages(&self) -> [Stage; 2] {
        match self {
            Self::Squat => [Stage::Stand, Stage::Squat],
            Self::PushUp => [Stage::Up, Stage::Down],
            Self::Crunch => [Stage::Down, Stage::Up],
        }
    }

    /// Whether `stage` belongs to this exercise.
    pub fn has_stage(&self, stage: Stage) -> bool {
        self.stages().contains(&stage)
    }

    /// Display label, e.g. "Push-up".
    pub fn label(&self) -> &'static str {
        match self {
            Self::Squat => "Squat",
            Self::PushUp => "Push-up",
            Self::Crunch => "Crunch",
        }
    }

    /// Canonical lower-case identifier, e.g. "push-up".
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Squat => "squat",
            Self::PushUp => "push-up",
            Self::Crunch => "crunch",
        }
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ExerciseKind {
    type Err = ModelError;

    /// Accepts plain names and the counter route slugs used by the web UI
    /// (`squat-counter`, `pushup-counter`, `crunches-counter`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        let name = normalized
            .strip_suffix("-counter")
            .unwrap_or(&normalized)
            .trim_end_matches('s');

        match name {
            "squat" => Ok(Self::Squat),
            "push-up" | "pushup" => Ok(Self::PushUp),
            "crunch" | "crunche" => Ok(Self::Crunch),
            _ => Err(ModelError::UnknownExercise {
                name: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Stand => "stand",
            Self::Squat => "squat",
            Self::Up => "up",
            Self::Down => "down",
        };
        f.pad(name)
    }
}
