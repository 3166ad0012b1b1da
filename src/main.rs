use clap::{Parser, Subcommand};

mod commands;
mod output;
mod tty;

use commands::{logs, run, stages, target};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "flightcheck")]
#[command(version = VERSION)]
#[command(about = "End-to-end verification harness for content-generation deployments")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full verification pipeline against a target deployment
    Run(run::RunArgs),
    /// List the pipeline stage definitions
    Stages(stages::StagesArgs),
    /// Inspect and validate a target configuration
    Target(target::TargetArgs),
    /// Tail the service error log on a target host
    Logs(logs::LogsArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let (json_result, exit_code) = commands::run_json(cli.command);
    let _ = output::print_json_result(json_result);

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
