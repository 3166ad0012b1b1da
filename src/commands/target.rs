use clap::{Args, Subcommand};
use serde::Serialize;

use flightcheck::ssh::SshClient;
use flightcheck::target::{self, TargetConfig};

use crate::commands::CmdResult;

#[derive(Args)]
pub struct TargetArgs {
    #[command(subcommand)]
    command: TargetCommand,
}

#[derive(Subcommand)]
pub enum TargetCommand {
    /// Load, validate, and echo a target configuration
    Show {
        /// Target configuration file (JSON)
        path: String,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetOutput {
    pub command: String,
    pub path: String,
    pub target: TargetConfig,
    pub identity_file_resolved: Option<String>,
}

pub fn run(args: TargetArgs) -> CmdResult<TargetOutput> {
    match args.command {
        TargetCommand::Show { path } => show(&path),
    }
}

fn show(path: &str) -> CmdResult<TargetOutput> {
    let target = target::load(path)?;

    // Also surfaces a missing identity file now instead of at run time.
    let client = SshClient::from_target(&target)?;

    Ok((
        TargetOutput {
            command: "target.show".to_string(),
            path: path.to_string(),
            identity_file_resolved: client.identity_file,
            target,
        },
        0,
    ))
}
