//! Show the exercise profiles.

use repcount_core::{CountRule, ExerciseProfile};
use repcount_pose_model::landmark::landmark_name;

pub fn run() -> anyhow::Result<()> {
    for profile in ExerciseProfile::all() {
        let [left, right] = profile.joints;
        let joint = left
            .indices()
            .map(|i| landmark_name(i).trim_start_matches("left_"))
            .join("-");

        println!("{}:", profile.kind);
        println!(
            "  Joint: {joint} (left {:?}, right {:?})",
            left.indices(),
            right.indices()
        );
        println!(
            "  Stages: {} -> {} when angle < {}°, back when angle > {}°",
            profile.initial_stage,
            profile.contracted_stage,
            profile.enter_threshold,
            profile.exit_threshold
        );
        println!(
            "  Counts on: {}",
            match profile.count_on {
                CountRule::OnEnter => "entering the contracted stage",
                CountRule::OnExit => "returning to the resting stage",
                CountRule::OnBoth => "both transitions",
            }
        );
        println!("  Visibility: > {}", profile.visibility_threshold);
        println!();
    }
    Ok(())
}
