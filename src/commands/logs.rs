use clap::Args;
use serde::Serialize;

use flightcheck::logs::{self, LogContent};
use flightcheck::ssh::SshClient;
use flightcheck::{target, Error};

use crate::commands::CmdResult;

#[derive(Args)]
pub struct LogsArgs {
    /// Target configuration file (JSON)
    pub target: String,
    /// Log file path (defaults to the target's errorLogPath)
    #[arg(long)]
    pub path: Option<String>,
    /// Number of lines to show
    #[arg(short = 'n', long, default_value = "20")]
    pub lines: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogsOutput {
    pub command: String,
    pub host: String,
    pub log: LogContent,
}

pub fn run(args: LogsArgs) -> CmdResult<LogsOutput> {
    let target = target::load(&args.target)?;

    let path = match args.path.or_else(|| target.error_log_path.clone()) {
        Some(path) => path,
        None => {
            return Err(Error::validation_invalid_argument(
                "path",
                "No log path given and the target has no errorLogPath",
                None,
            )
            .with_hint("Set errorLogPath in the target file or pass --path"))
        }
    };

    let client = SshClient::from_target(&target)?;
    let log = logs::show(&client, &path, args.lines)?;

    Ok((
        LogsOutput {
            command: "logs.show".to_string(),
            host: target.host.clone(),
            log,
        },
        0,
    ))
}
