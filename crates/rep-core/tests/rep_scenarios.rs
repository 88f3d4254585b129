use proptest::prelude::*;

use repcount_core::{
    is_valid, joint_angle_degrees, ExerciseProfile, FrameEvaluation, RepetitionMachine,
    FALLBACK_ANGLE_DEGREES,
};
use repcount_pose_model::exercise::{ExerciseKind, Stage};
use repcount_pose_model::landmark::*;

/// A frame where both of the profile's joints bend to `angle` degrees.
fn frame_with_angle(profile: &ExerciseProfile, angle: f64, visibility: f64) -> LandmarkFrame {
    let mut frame = LandmarkFrame::empty();
    let theta = angle.to_radians();
    for (side, joint) in profile.joints.iter().enumerate() {
        let vx = 0.3 + 0.4 * side as f64;
        let vy = 0.5;
        let points = [
            (joint.a, vx, vy - 0.2),
            (joint.vertex, vx, vy),
            (joint.c, vx + 0.2 * theta.sin(), vy - 0.2 * theta.cos()),
        ];
        for (index, x, y) in points {
            frame
                .set(index, Some(LandmarkPoint::new(x, y, visibility)))
                .unwrap();
        }
    }
    frame
}

struct Trace {
    stages: Vec<Stage>,
    counts: Vec<u32>,
}

fn replay(kind: ExerciseKind, angles: &[f64]) -> Trace {
    let machine = RepetitionMachine::for_kind(kind);
    let mut stage = machine.profile().initial_stage;
    let mut count = 0u32;
    let mut trace = Trace {
        stages: vec![],
        counts: vec![],
    };

    for &angle in angles {
        let frame = frame_with_angle(machine.profile(), angle, 0.95);
        if let FrameEvaluation::Measured { outcome, .. } = machine.evaluate(stage, &frame) {
            stage = outcome.stage;
            count += outcome.rep_counted as u32;
        }
        trace.stages.push(stage);
        trace.counts.push(count);
    }
    trace
}

#[test]
fn push_up_scenario_counts_on_return_to_up() {
    let trace = replay(ExerciseKind::PushUp, &[170.0, 170.0, 85.0, 82.0, 165.0]);

    assert_eq!(
        trace.stages,
        vec![Stage::Up, Stage::Up, Stage::Down, Stage::Down, Stage::Up]
    );
    assert_eq!(trace.counts, vec![0, 0, 0, 0, 1]);
}

#[test]
fn squat_scenario_counts_each_transition_once() {
    let trace = replay(ExerciseKind::Squat, &[170.0, 115.0, 110.0, 165.0]);

    assert_eq!(
        trace.stages,
        vec![Stage::Stand, Stage::Squat, Stage::Squat, Stage::Stand]
    );
    assert_eq!(trace.counts, vec![0, 1, 1, 2]);
}

#[test]
fn low_visibility_knee_is_rejected() {
    let profile = ExerciseProfile::for_kind(ExerciseKind::Squat);
    let frame = frame_with_angle(&profile, 100.0, 0.95)
        .with_point(LEFT_KNEE, LandmarkPoint::new(0.3, 0.5, 0.5))
        .unwrap();

    assert!(!is_valid(&frame, &profile));

    let machine = RepetitionMachine::new(profile);
    match machine.evaluate(Stage::Stand, &frame) {
        FrameEvaluation::Rejected { missing, feedback } => {
            assert_eq!(missing, vec![LEFT_KNEE]);
            assert!(!feedback.is_empty());
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[test]
fn coincident_shoulder_and_elbow_yields_fallback() {
    let shoulder = (0.42, 0.31);
    let elbow = shoulder;
    let wrist = (0.55, 0.48);

    let angle = joint_angle_degrees(shoulder, elbow, wrist);
    assert_eq!(angle, FALLBACK_ANGLE_DEGREES);
    assert!(!angle.is_nan());
}

#[test]
fn synthetic_frames_produce_requested_angle() {
    for kind in ExerciseKind::ALL {
        let machine = RepetitionMachine::for_kind(kind);
        for angle in [30.0, 90.0, 135.0, 175.0] {
            let measured = machine.measure(&frame_with_angle(machine.profile(), angle, 0.9));
            assert!(
                (measured.average - angle).abs() < 1e-6,
                "{kind}: wanted {angle}, got {}",
                measured.average
            );
        }
    }
}

fn exercise_kind() -> impl Strategy<Value = ExerciseKind> {
    prop_oneof![
        Just(ExerciseKind::Squat),
        Just(ExerciseKind::PushUp),
        Just(ExerciseKind::Crunch),
    ]
}

proptest! {
    #[test]
    fn right_angles_measure_ninety(
        bx in 0.1f64..0.9, by in 0.1f64..0.9,
        len_a in 0.01f64..0.5, len_c in 0.01f64..0.5,
        rot in 0.0f64..std::f64::consts::TAU,
    ) {
        let a = (bx + len_a * rot.cos(), by + len_a * rot.sin());
        let c = (bx - len_c * rot.sin(), by + len_c * rot.cos());
        let angle = joint_angle_degrees(a, (bx, by), c);
        prop_assert!((angle - 90.0).abs() < 1e-6);
    }

    #[test]
    fn angles_stay_in_range(
        coords in proptest::array::uniform6(-2.0f64..2.0),
    ) {
        let angle = joint_angle_degrees(
            (coords[0], coords[1]),
            (coords[2], coords[3]),
            (coords[4], coords[5]),
        );
        prop_assert!(!angle.is_nan());
        prop_assert!((0.0..=180.0 + 1e-9).contains(&angle));
    }

    #[test]
    fn count_never_decreases_and_stage_stays_in_pair(
        kind in exercise_kind(),
        angles in proptest::collection::vec(0.0f64..180.0, 1..80),
    ) {
        let trace = replay(kind, &angles);
        for window in trace.counts.windows(2) {
            prop_assert!(window[1] >= window[0]);
        }
        for stage in trace.stages {
            prop_assert!(kind.has_stage(stage));
        }
    }

    #[test]
    fn reps_never_exceed_edges(
        kind in exercise_kind(),
        angles in proptest::collection::vec(0.0f64..180.0, 1..80),
    ) {
        let trace = replay(kind, &angles);
        let edges = trace
            .stages
            .windows(2)
            .filter(|w| w[0] != w[1])
            .count()
            + usize::from(trace.stages.first() != Some(&kind.stages()[0]));
        prop_assert!(trace.counts.last().copied().unwrap_or(0) as usize <= edges);
    }

    #[test]
    fn rejected_frames_never_move_the_machine(
        kind in exercise_kind(),
        angle in 0.0f64..180.0,
        visibility in 0.0f64..=0.65,
        contracted in any::<bool>(),
    ) {
        let machine = RepetitionMachine::for_kind(kind);
        let profile = machine.profile().clone();
        let stage = if contracted { profile.contracted_stage } else { profile.initial_stage };

        let frame = frame_with_angle(&profile, angle, 0.95)
            .with_point(profile.joints[1].vertex, LandmarkPoint::new(0.7, 0.5, visibility))
            .unwrap();

        let is_rejected = matches!(
            machine.evaluate(stage, &frame),
            FrameEvaluation::Rejected { .. }
        );
        prop_assert!(is_rejected);
    }
}
