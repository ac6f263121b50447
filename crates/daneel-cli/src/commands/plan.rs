//! `daneel plan`: load robot/goal/world, run the executive, write the
//! trajectory.

use daneel_lib::{Config, MotionExecutive};

use crate::cli::PlanParams;

use super::io;

pub fn run(params: PlanParams) -> Result<(), String> {
    let robot = io::load_robot(&params.robot)?;
    let goal = io::load_goal(&params.goal)?;
    let config = match &params.config {
        Some(path) => Config::load(path).map_err(|e| e.to_string())?,
        None => Config::default(),
    };

    let mut executive =
        MotionExecutive::new(&robot.chain, config).map_err(|e| e.to_string())?;
    if let Some(world_path) = &params.world {
        io::apply_world_file(&mut executive, io::load_world_file(world_path)?)?;
    }

    let result = executive.execute(&goal);
    if !result.is_success() {
        return Err(format!(
            "motion failed: {:?}{}",
            result.code,
            result
                .message
                .as_deref()
                .map(|m| format!(" ({m})"))
                .unwrap_or_default()
        ));
    }

    let text = serde_json::to_string_pretty(&result.trajectories)
        .map_err(|e| e.to_string())?;
    match &params.out {
        Some(path) => std::fs::write(path, text).map_err(|e| e.to_string())?,
        None => println!("{text}"),
    }

    let ticks: usize = result.trajectories.iter().map(|t| t.len()).sum();
    eprintln!(
        "planned {} command(s), {} tick(s) total",
        result.trajectories.len(),
        ticks
    );
    Ok(())
}
