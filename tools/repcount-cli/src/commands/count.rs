//! Replay a landmark stream through a counting session.

use std::path::PathBuf;

use serde::Serialize;

use repcount_common::config::AppConfig;
use repcount_counter_engine::{
    DeliveryPolicy, FramePipeline, PipelineStats, RepCounter, ReplaySource, SessionSnapshot,
    StageChange,
};
use repcount_pose_model::challenge::find_challenge;
use repcount_pose_model::exercise::ExerciseKind;

use super::parse_exercise;

pub struct CountArgs {
    pub path: PathBuf,
    pub exercise: Option<String>,
    pub challenge: Option<String>,
    pub goal: Option<u32>,
    pub realtime: bool,
    pub json: bool,
}

/// Exercise, goal and pacing after merging flags, challenge and config.
#[derive(Debug, PartialEq)]
struct CountPlan {
    kind: ExerciseKind,
    goal: Option<u32>,
    realtime: bool,
}

fn resolve_plan(config: &AppConfig, args: &CountArgs) -> anyhow::Result<CountPlan> {
    let explicit = args.exercise.as_deref().map(parse_exercise).transpose()?;

    let (kind, challenge_goal) = match &args.challenge {
        Some(title) => {
            let challenge = find_challenge(title)
                .ok_or_else(|| anyhow::anyhow!("Unknown challenge: {title}"))?;
            if let Some(kind) = explicit.filter(|k| *k != challenge.kind) {
                anyhow::bail!(
                    "Challenge '{}' is a {} challenge, not {}",
                    challenge.title,
                    challenge.kind,
                    kind
                );
            }
            (challenge.kind, Some(challenge.goal))
        }
        None => match explicit {
            Some(kind) => (kind, None),
            None => (parse_exercise(&config.counter.exercise)?, None),
        },
    };

    Ok(CountPlan {
        kind,
        goal: args.goal.or(challenge_goal).or(config.counter.goal),
        realtime: args.realtime || config.counter.realtime,
    })
}

#[derive(Serialize)]
struct CountReport<'a> {
    snapshot: &'a SessionSnapshot,
    stats: &'a PipelineStats,
}

pub async fn run(config: &AppConfig, args: CountArgs) -> anyhow::Result<()> {
    let plan = resolve_plan(config, &args)?;
    tracing::debug!(
        exercise = %plan.kind,
        goal = ?plan.goal,
        realtime = plan.realtime,
        "Resolved count plan"
    );

    let mut source = ReplaySource::open(&args.path)
        .map_err(|e| anyhow::anyhow!("Failed to load stream: {e}"))?;
    let policy = if plan.realtime {
        source = source.realtime(config.counter.replay_fps);
        DeliveryPolicy::LatestOnly
    } else {
        DeliveryPolicy::Lossless
    };

    if !args.json {
        println!("Counting {} in: {}", plan.kind, args.path.display());
        if let Some(goal) = plan.goal {
            println!("  Goal: {goal}");
        }
        println!("  Frames: {}", source.remaining());
        if plan.realtime {
            println!("  Pacing: {} fps", source.fps().unwrap_or(config.counter.replay_fps));
        }
        println!();
    }

    let mut counter = RepCounter::new();
    counter.start(plan.kind, plan.goal)?;

    let mut pipeline = FramePipeline::new(counter, Box::new(source)).with_policy(policy);

    let control = pipeline.control();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            control.stop();
        }
    });

    let progress = (!args.json).then(|| tokio::spawn(print_progress(pipeline.stage_changes())));

    let result = pipeline.run().await;
    interrupt.abort();
    if let Some(progress) = progress {
        let _ = progress.await;
    }
    let stats = result?;

    let snapshot = pipeline.counter().snapshot();
    if args.json {
        let report = CountReport {
            snapshot: &snapshot,
            stats: &stats,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!();
    println!("Repetitions: {}", snapshot.count);
    if let Some(goal) = snapshot.goal {
        let status = if snapshot.goal_reached {
            "reached"
        } else {
            "not reached"
        };
        println!("  Goal: {goal} ({status})");
    }
    println!(
        "  Frames: {} processed, {} rejected, {} dropped ({:.1}%)",
        stats.frames_processed,
        snapshot.frames_rejected,
        stats.frames_dropped,
        stats.drop_rate()
    );
    if let Some(session) = pipeline.counter().session() {
        if session.degenerate_angles() > 0 {
            println!("  Degenerate joint geometry: {} frame(s)", session.degenerate_angles());
        }
        println!("  Elapsed: {:.2}s", session.clock().elapsed_secs());
    }

    Ok(())
}

/// Print every stage change until the pipeline run ends.
async fn print_progress(mut changes: tokio::sync::mpsc::UnboundedReceiver<StageChange>) {
    while let Some(change) = changes.recv().await {
        println!("{}", progress_line(&change));
    }
}

fn progress_line(change: &StageChange) -> String {
    format!(
        "  [frame {:>5}] {:<6} count {:>3}  {}",
        change.frame, change.stage, change.count, change.feedback
    )
}
