mod cli;
mod commands;

use cli::{build_cli, CheckParams, DumpParams, PlanParams};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let matches = build_cli().get_matches();

    let outcome = match matches.subcommand() {
        Some(("plan", m)) => commands::plan::run(PlanParams::from_matches(m)),
        Some(("check", m)) => commands::check::run(CheckParams::from_matches(m)),
        Some(("dump", m)) => commands::dump::run(DumpParams::from_matches(m)),
        _ => unreachable!("clap should have caught this"),
    };

    if let Err(message) = outcome {
        eprintln!("error: {message}");
        std::process::exit(1);
    }
}
