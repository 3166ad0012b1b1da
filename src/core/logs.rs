//! Remote log retrieval.
//!
//! Tails service log files on the target host. Used by the `logs` command
//! and, best effort, by the pipeline epilogue to capture the service's error
//! log alongside the report.

use std::time::Duration;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::stage::RemoteExecutor;
use crate::utils::shell;

const TAIL_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogContent {
    pub path: String,
    pub lines: u32,
    pub content: String,
}

/// Shows the last N lines of a remote log file.
pub fn show(executor: &dyn RemoteExecutor, path: &str, lines: u32) -> Result<LogContent> {
    let command = format!("tail -n {} {}", lines, shell::quote_path(path));
    let output = executor.execute(&command, TAIL_TIMEOUT);

    if output.stdout.is_empty() && !output.stderr.is_empty() {
        return Err(Error::remote_command_failed(command, output.stderr));
    }

    Ok(LogContent {
        path: path.to_string(),
        lines,
        content: output.stdout,
    })
}
