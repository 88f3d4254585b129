//! Preset exercise challenges.
//!
//! A challenge only selects an exercise and a goal for a new session; the
//! counter never changes behavior when the goal is reached.

use serde::Serialize;

use crate::exercise::ExerciseKind;

/// A named exercise goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Challenge {
    pub title: &'static str,
    pub description: &'static str,
    pub kind: ExerciseKind,
    pub goal: u32,
}

/// The built-in challenge catalog.
pub static CHALLENGES: [Challenge; 6] = [
    Challenge {
        title: "Squat Master",
        description: "Complete 10 Squats!",
        kind: ExerciseKind::Squat,
        goal: 10,
    },
    Challenge {
        title: "Pushup Beast",
        description: "Do 20 Pushups!",
        kind: ExerciseKind::PushUp,
        goal: 20,
    },
    Challenge {
        title: "Core Crusher",
        description: "Finish 15 Crunches!",
        kind: ExerciseKind::Crunch,
        goal: 15,
    },
    Challenge {
        title: "Endurance King",
        description: "Do 50 Squats!",
        kind: ExerciseKind::Squat,
        goal: 50,
    },
    Challenge {
        title: "Iron Chest",
        description: "Complete 50 Pushups!",
        kind: ExerciseKind::PushUp,
        goal: 50,
    },
    Challenge {
        title: "Abs of Steel",
        description: "Finish 30 Crunches!",
        kind: ExerciseKind::Crunch,
        goal: 30,
    },
];

/// Look up a challenge by title, ignoring case and surrounding whitespace.
pub fn find_challenge(title: &str) -> Option<&'static Challenge> {
    let wanted = title.trim();
    CHALLENGES
        .iter()
        .find(|c| c.title.eq_ignore_ascii_case(wanted))
}
