use proptest::prelude::*;

use repcount_pose_model::*;

#[test]
fn stream_file_keeps_missing_slots() {
    let jsonl = concat!(
        "# {\"schema_version\":\"1.0\",\"source\":\"blazepose\",\"fps\":30}\n",
        "{\"t\":0,\"landmarks\":[{\"x\":0.5,\"y\":0.1,\"visibility\":0.99},null]}\n",
        "# mid-stream comment\n",
        "{\"landmarks\":[]}\n",
    );

    let frames = parse_frames(jsonl).unwrap();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].get(NOSE).map(|p| p.visibility), Some(0.99));
    assert!(frames[0].get(1).is_none());
    assert!(frames[0].get(LEFT_KNEE).is_none());
    assert_eq!(frames[1].timestamp_ns(), None);
    assert_eq!(frames[1].points().count(), LANDMARK_COUNT);

    let header = parse_header(jsonl).unwrap();
    assert_eq!(header.source.as_deref(), Some("blazepose"));
}

#[test]
fn oversized_frame_is_rejected_on_parse() {
    let points = vec!["null"; LANDMARK_COUNT + 1].join(",");
    let line = format!("{{\"landmarks\":[{points}]}}");
    assert!(parse_frames(&line).is_err());
}

#[test]
fn route_slugs_select_exercises() {
    assert_eq!("squat-counter".parse::<ExerciseKind>().unwrap(), ExerciseKind::Squat);
    assert_eq!("pushup-counter".parse::<ExerciseKind>().unwrap(), ExerciseKind::PushUp);
    assert_eq!("crunches-counter".parse::<ExerciseKind>().unwrap(), ExerciseKind::Crunch);
    assert!("plank".parse::<ExerciseKind>().is_err());
}

proptest! {
    #[test]
    fn flat_input_requires_exact_length(len in 0usize..200) {
        let data = vec![0.5; len];
        let result = LandmarkFrame::from_flat(&data);
        prop_assert_eq!(result.is_ok(), len == LANDMARK_COUNT * FLAT_STRIDE);
    }

    #[test]
    fn flat_input_preserves_values(
        values in proptest::collection::vec(0.0f64..1.0, LANDMARK_COUNT * FLAT_STRIDE),
        index in 0usize..LANDMARK_COUNT,
    ) {
        let frame = LandmarkFrame::from_flat(&values).unwrap();
        let point = frame.get(index).unwrap();
        prop_assert_eq!(point.x, values[index * FLAT_STRIDE]);
        prop_assert_eq!(point.y, values[index * FLAT_STRIDE + 1]);
        prop_assert_eq!(point.visibility, values[index * FLAT_STRIDE + 2]);
    }

    #[test]
    fn out_of_range_reads_are_none(index in LANDMARK_COUNT..1000usize) {
        let frame = LandmarkFrame::from_flat(&vec![0.9; LANDMARK_COUNT * FLAT_STRIDE]).unwrap();
        prop_assert!(frame.get(index).is_none());
    }

    #[test]
    fn visibility_gate_is_strict(visibility in 0.0f64..1.0, threshold in 0.0f64..1.0) {
        let point = LandmarkPoint::new(0.5, 0.5, visibility);
        prop_assert_eq!(point.is_visible(threshold), visibility > threshold);
    }
}
