//! Command-line definition and argument extraction.

use std::path::PathBuf;

use clap::{Arg, ArgAction, ArgMatches, Command};

pub fn build_cli() -> Command {
    Command::new("daneel")
        .about("Whole-body constraint-based motion control")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("plan")
                .about("Plan a motion and write the trajectory")
                .arg(robot_arg())
                .arg(goal_arg())
                .arg(
                    Arg::new("world")
                        .long("world")
                        .value_name("FILE")
                        .help("World bodies (JSON)"),
                )
                .arg(config_arg())
                .arg(
                    Arg::new("out")
                        .long("out")
                        .short('o')
                        .value_name("FILE")
                        .help("Trajectory output (JSON); stdout if omitted"),
                ),
        )
        .subcommand(
            Command::new("check")
                .about("Validate robot, goal, and world files without planning")
                .arg(robot_arg())
                .arg(
                    Arg::new("goal")
                        .long("goal")
                        .value_name("FILE")
                        .help("Motion goal (JSON)"),
                )
                .arg(
                    Arg::new("world")
                        .long("world")
                        .value_name("FILE")
                        .help("World bodies (JSON)"),
                ),
        )
        .subcommand(
            Command::new("dump")
                .about("Compile a goal set and print the evaluator layout")
                .arg(robot_arg())
                .arg(goal_arg())
                .arg(config_arg())
                .arg(
                    Arg::new("verbose")
                        .long("verbose")
                        .short('v')
                        .action(ArgAction::SetTrue)
                        .help("List every soft constraint"),
                ),
        )
}

fn robot_arg() -> Arg {
    Arg::new("robot")
        .long("robot")
        .value_name("FILE")
        .required(true)
        .help("Robot description (TOML)")
}

fn goal_arg() -> Arg {
    Arg::new("goal")
        .long("goal")
        .value_name("FILE")
        .required(true)
        .help("Motion goal (JSON)")
}

fn config_arg() -> Arg {
    Arg::new("config")
        .long("config")
        .value_name("FILE")
        .help("Configuration (TOML); defaults apply if omitted")
}

pub struct PlanParams {
    pub robot: PathBuf,
    pub goal: PathBuf,
    pub world: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub out: Option<PathBuf>,
}

impl PlanParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            robot: path(m, "robot"),
            goal: path(m, "goal"),
            world: opt_path(m, "world"),
            config: opt_path(m, "config"),
            out: opt_path(m, "out"),
        }
    }
}

pub struct CheckParams {
    pub robot: PathBuf,
    pub goal: Option<PathBuf>,
    pub world: Option<PathBuf>,
}

impl CheckParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            robot: path(m, "robot"),
            goal: opt_path(m, "goal"),
            world: opt_path(m, "world"),
        }
    }
}

pub struct DumpParams {
    pub robot: PathBuf,
    pub goal: PathBuf,
    pub config: Option<PathBuf>,
    pub verbose: bool,
}

impl DumpParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            robot: path(m, "robot"),
            goal: path(m, "goal"),
            config: opt_path(m, "config"),
            verbose: m.get_flag("verbose"),
        }
    }
}

fn path(m: &ArgMatches, id: &str) -> PathBuf {
    PathBuf::from(m.get_one::<String>(id).expect("required arg"))
}

fn opt_path(m: &ArgMatches, id: &str) -> Option<PathBuf> {
    m.get_one::<String>(id).map(PathBuf::from)
}
