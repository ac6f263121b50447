//! `daneel dump`: compile the first command's goal set and print the
//! evaluator layout.

use daneel_core::{paths, Blackboard};
use daneel_expr::Robot;
use daneel_lib::Config;
use daneel_qp::QpProblemBuilder;

use crate::cli::DumpParams;

use super::io;

pub fn run(params: DumpParams) -> Result<(), String> {
    let robot_file = io::load_robot(&params.robot)?;
    let goal = io::load_goal(&params.goal)?;
    let config = match &params.config {
        Some(path) => Config::load(path).map_err(|e| e.to_string())?,
        None => Config::default(),
    };

    let Some(cmd) = goal.cmds.first() else {
        return Err("goal contains no commands".to_owned());
    };

    let mut bb = Blackboard::new();
    let robot = Robot::from_spec(
        &robot_file.chain,
        config.default_joint_vel_limit,
        config.default_joint_weight,
        |name| bb.to_symbol(&paths::joint_position(name)),
    )
    .map_err(|e| e.to_string())?;
    for name in robot.controlled_joint_names() {
        bb.set(&paths::joint_position(&name), 0.0);
    }

    let sample_period = 1.0 / config.tree_tick_rate;
    let mut builder = QpProblemBuilder::new().with_robot(&robot, sample_period);
    for jc in &cmd.joint_constraints {
        let g = daneel_goals::JointPosition::new(jc.joint_name.clone(), jc.goal_position);
        add_goal(&mut builder, &g, &mut bb, &robot)?;
    }
    for cc in &cmd.cartesian_constraints {
        match cc.kind {
            daneel_lib::CartesianConstraintKind::Translation3d => {
                let g = daneel_goals::CartesianPosition::new(
                    cc.root_link.clone(),
                    cc.tip_link.clone(),
                    cc.goal.pose,
                );
                add_goal(&mut builder, &g, &mut bb, &robot)?;
            }
            daneel_lib::CartesianConstraintKind::Rotation3d => {
                let g = daneel_goals::CartesianOrientationSlerp::new(
                    cc.root_link.clone(),
                    cc.tip_link.clone(),
                    cc.goal.pose,
                );
                add_goal(&mut builder, &g, &mut bb, &robot)?;
            }
        }
    }
    for spec in &cmd.constraints {
        let g = daneel_goals::goal_from_json(&spec.kind, &spec.parameters)
            .map_err(|e| e.to_string())?;
        g.install(&mut bb).map_err(|e| e.to_string())?;
        builder.add_soft_constraints(
            g.soft_constraints(&mut bb, &robot).map_err(|e| e.to_string())?,
        );
    }

    let problem = builder.build(None).map_err(|e| e.to_string())?;

    println!("joints:           {}", problem.joint_count());
    println!("hard constraints: {}", problem.hard_count());
    println!("soft constraints: {}", problem.soft_count());
    println!("bound symbols:    {}", problem.symbol_count());
    println!("tape ops:         {}", problem.op_count());
    if params.verbose {
        for name in problem.soft_names() {
            println!("  {name}");
        }
    }
    Ok(())
}

fn add_goal(
    builder: &mut QpProblemBuilder,
    goal: &impl daneel_goals::Goal,
    bb: &mut Blackboard,
    robot: &Robot,
) -> Result<(), String> {
    goal.install(bb).map_err(|e| e.to_string())?;
    builder.add_soft_constraints(goal.soft_constraints(bb, robot).map_err(|e| e.to_string())?);
    Ok(())
}
