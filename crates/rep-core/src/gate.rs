//! Validity gate.
//!
//! A frame may only drive the counter when every landmark the exercise
//! needs was observed with visibility strictly above the profile threshold.
//! Rejection is the normal state while the subject is out of frame.

use repcount_pose_model::landmark::LandmarkFrame;

use crate::profile::ExerciseProfile;

/// Whether `frame` has every required landmark confidently observed.
pub fn is_valid(frame: &LandmarkFrame, profile: &ExerciseProfile) -> bool {
    profile
        .required_landmarks
        .iter()
        .all(|&index| passes(frame, profile, index))
}

/// Required landmarks that are missing or under-confident, in index order.
pub fn missing_landmarks(frame: &LandmarkFrame, profile: &ExerciseProfile) -> Vec<usize> {
    profile
        .required_landmarks
        .iter()
        .copied()
        .filter(|&index| !passes(frame, profile, index))
        .collect()
}

fn passes(frame: &LandmarkFrame, profile: &ExerciseProfile, index: usize) -> bool {
    frame
        .get(index)
        .is_some_and(|p| p.is_visible(profile.visibility_threshold))
}

#[cfg(test)]
mod tests {
    use super::*;
    use repcount_pose_model::exercise::ExerciseKind;
    use repcount_pose_model::landmark::*;

    fn visible_frame(profile: &ExerciseProfile) -> LandmarkFrame {
        let mut frame = LandmarkFrame::empty();
        for &index in &profile.required_landmarks {
            frame
                .set(index, Some(LandmarkPoint::new(0.5, index as f64 / 40.0, 0.9)))
                .unwrap();
        }
        frame
    }

    #[test]
    fn test_all_visible_passes() {
        let profile = ExerciseProfile::for_kind(ExerciseKind::Squat);
        let frame = visible_frame(&profile);
        assert!(is_valid(&frame, &profile));
        assert!(missing_landmarks(&frame, &profile).is_empty());
    }

    #[test]
    fn test_low_visibility_knee_rejects() {
        let profile = ExerciseProfile::for_kind(ExerciseKind::Squat);
        let frame = visible_frame(&profile)
            .with_point(LEFT_KNEE, LandmarkPoint::new(0.4, 0.6, 0.5))
            .unwrap();
        assert!(!is_valid(&frame, &profile));
        assert_eq!(missing_landmarks(&frame, &profile), vec![LEFT_KNEE]);
    }

    #[test]
    fn test_threshold_itself_rejects() {
        let profile = ExerciseProfile::for_kind(ExerciseKind::PushUp);
        let frame = visible_frame(&profile)
            .with_point(RIGHT_WRIST, LandmarkPoint::new(0.4, 0.6, 0.65))
            .unwrap();
        assert!(!is_valid(&frame, &profile));
    }

    #[test]
    fn test_missing_point_rejects() {
        let profile = ExerciseProfile::for_kind(ExerciseKind::Crunch);
        let mut frame = visible_frame(&profile);
        frame.set(RIGHT_HIP, None).unwrap();
        frame.set(LEFT_SHOULDER, None).unwrap();
        assert_eq!(
            missing_landmarks(&frame, &profile),
            vec![LEFT_SHOULDER, RIGHT_HIP]
        );
    }

    #[test]
    fn test_unrelated_landmarks_are_ignored() {
        let profile = ExerciseProfile::for_kind(ExerciseKind::Squat);
        let frame = visible_frame(&profile)
            .with_point(NOSE, LandmarkPoint::new(0.5, 0.1, 0.0))
            .unwrap();
        assert!(is_valid(&frame, &profile));
    }
}
