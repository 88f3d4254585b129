//! List the preset challenges.

use repcount_pose_model::challenge::CHALLENGES;

pub fn run() -> anyhow::Result<()> {
    println!("Challenges:");
    for challenge in &CHALLENGES {
        println!(
            "  {:<16} {:<8} goal {:>3}  {}",
            challenge.title,
            challenge.kind.label(),
            challenge.goal,
            challenge.description
        );
    }
    println!();
    println!("Start one with: repcount count <PATH> --challenge \"<title>\"");
    Ok(())
}
