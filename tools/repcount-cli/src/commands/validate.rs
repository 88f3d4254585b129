//! Validate a landmark stream against the exercise profiles.

use std::collections::BTreeMap;
use std::path::PathBuf;

use repcount_core::{missing_landmarks, ExerciseProfile, RepetitionMachine};
use repcount_pose_model::exercise::ExerciseKind;
use repcount_pose_model::landmark::{landmark_name, LandmarkFrame};
use repcount_pose_model::stream::{parse_frames, parse_header};

use super::parse_exercise;

/// How many of the most frequently missing landmarks to list.
const TOP_MISSING: usize = 3;

#[derive(Debug, Default, PartialEq)]
struct GateReport {
    passed: usize,
    rejected: usize,
    degenerate: usize,
    missing: BTreeMap<usize, usize>,
}

impl GateReport {
    /// Missing landmarks, most frequent first.
    fn top_missing(&self) -> Vec<(usize, usize)> {
        let mut ranked: Vec<_> = self.missing.iter().map(|(&i, &n)| (i, n)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(TOP_MISSING);
        ranked
    }
}

fn check_gate(frames: &[LandmarkFrame], profile: &ExerciseProfile) -> GateReport {
    let machine = RepetitionMachine::new(profile.clone());
    let mut report = GateReport::default();

    for frame in frames {
        let missing = missing_landmarks(frame, profile);
        if missing.is_empty() {
            report.passed += 1;
            if machine.measure(frame).degenerate_sides > 0 {
                report.degenerate += 1;
            }
        } else {
            report.rejected += 1;
            for index in missing {
                *report.missing.entry(index).or_default() += 1;
            }
        }
    }
    report
}

/// Indices of frames whose timestamp goes backwards.
fn timestamp_regressions(frames: &[LandmarkFrame]) -> Vec<usize> {
    let mut last = None;
    let mut regressions = vec![];
    for (i, frame) in frames.iter().enumerate() {
        if let Some(t) = frame.timestamp_ns() {
            if last.is_some_and(|prev| t < prev) {
                regressions.push(i);
            }
            last = Some(t);
        }
    }
    regressions
}

pub fn run(path: PathBuf, exercise: Option<String>) -> anyhow::Result<()> {
    println!("Validating landmark stream at: {}", path.display());

    let content = std::fs::read_to_string(&path)
        .map_err(|e| anyhow::anyhow!("Failed to read stream: {e}"))?;
    let frames =
        parse_frames(&content).map_err(|e| anyhow::anyhow!("Failed to parse stream: {e}"))?;

    match parse_header(&content) {
        Some(header) => {
            println!("  Schema: {}", header.schema_version);
            if let Some(source) = &header.source {
                println!("  Source: {source}");
            }
            if let Some(fps) = header.fps {
                println!("  FPS: {fps}");
            }
        }
        None => println!("  Header: none"),
    }
    println!("  Frames: {}", frames.len());

    let regressions = timestamp_regressions(&frames);
    if !regressions.is_empty() {
        println!(
            "  Timestamps: {} regression(s), first at frame {}",
            regressions.len(),
            regressions[0]
        );
    }
    println!();

    let kinds = match exercise {
        Some(name) => vec![parse_exercise(&name)?],
        None => ExerciseKind::ALL.to_vec(),
    };

    for kind in kinds {
        let profile = ExerciseProfile::for_kind(kind);
        let report = check_gate(&frames, &profile);

        println!("{kind}:");
        println!("  Usable frames: {}", report.passed);
        println!("  Rejected frames: {}", report.rejected);
        if report.degenerate > 0 {
            println!("  Degenerate joint geometry: {}", report.degenerate);
        }
        for (index, count) in report.top_missing() {
            println!("    {} ({index}) missing in {count} frame(s)", landmark_name(index));
        }
        println!();
    }

    if !regressions.is_empty() {
        println!("Stream has out-of-order timestamps; replay pacing may be uneven.");
    }

    Ok(())
}
