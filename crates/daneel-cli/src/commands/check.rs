//! `daneel check`: validate input files without planning.

use daneel_core::{paths, Blackboard};
use daneel_expr::Robot;

use crate::cli::CheckParams;

use super::io;

pub fn run(params: CheckParams) -> Result<(), String> {
    let robot_file = io::load_robot(&params.robot)?;
    let mut bb = Blackboard::new();
    let robot = Robot::from_spec(&robot_file.chain, 1.0, 0.001, |name| {
        bb.to_symbol(&paths::joint_position(name))
    })
    .map_err(|e| e.to_string())?;

    let joints = robot.controlled_joint_names();
    println!(
        "robot ok: {} controllable joint(s), {} link(s)",
        joints.len(),
        robot.links().len()
    );

    if let Some(goal_path) = &params.goal {
        let goal = io::load_goal(goal_path)?;
        for (i, cmd) in goal.cmds.iter().enumerate() {
            for jc in &cmd.joint_constraints {
                robot
                    .joint(&jc.joint_name)
                    .map_err(|e| format!("cmd {i}: {e}"))?;
            }
            for spec in &cmd.constraints {
                daneel_goals::goal_from_json(&spec.kind, &spec.parameters)
                    .map_err(|e| format!("cmd {i}: {e}"))?;
            }
        }
        println!("goal ok: {} command(s)", goal.cmds.len());
    }

    if let Some(world_path) = &params.world {
        let bodies = io::load_world_file(world_path)?;
        println!("world ok: {} body(ies)", bodies.len());
    }

    Ok(())
}
