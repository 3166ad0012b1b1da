use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::stage::{ExecOutput, RemoteExecutor};
use crate::target::TargetConfig;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub struct SshClient {
    pub host: String,
    pub user: String,
    pub port: u16,
    pub identity_file: Option<String>,
}

impl SshClient {
    pub fn from_target(target: &TargetConfig) -> Result<Self> {
        let identity_file = match &target.identity_file {
            Some(path) if !path.is_empty() => {
                let expanded = shellexpand::tilde(path).to_string();
                if !std::path::Path::new(&expanded).exists() {
                    return Err(Error::ssh_identity_file_not_found(
                        target.host.clone(),
                        expanded,
                    ));
                }
                Some(expanded)
            }
            _ => None,
        };

        Ok(Self {
            host: target.host.clone(),
            user: target.user.clone(),
            port: target.port,
            identity_file,
        })
    }

    fn build_ssh_args(&self, command: &str) -> Vec<String> {
        let mut args = Vec::new();

        if let Some(identity_file) = &self.identity_file {
            args.push("-i".to_string());
            args.push(identity_file.clone());
        }

        if self.port != 22 {
            args.push("-p".to_string());
            args.push(self.port.to_string());
        }

        // Timeout and keepalive options prevent hangs on stalled connections
        // or unexpected prompts. Host key checking is deliberately permissive:
        // the targets are ephemeral test machines that get reimaged between
        // runs, so pinned host keys would only produce false alarms. Do not
        // point this at anything that matters.
        args.extend([
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            "ConnectTimeout=10".to_string(),
            "-o".to_string(),
            "ServerAliveInterval=15".to_string(),
            "-o".to_string(),
            "ServerAliveCountMax=3".to_string(),
            "-o".to_string(),
            "StrictHostKeyChecking=no".to_string(),
            "-o".to_string(),
            "UserKnownHostsFile=/dev/null".to_string(),
        ]);

        args.push(format!("{}@{}", self.user, self.host));
        args.push(command.to_string());

        args
    }
}

impl RemoteExecutor for SshClient {
    /// Run one command on the target, bounded by `timeout`. A timed-out
    /// command is killed and surfaces whatever output it produced; no retry,
    /// and no distinction from any other failure.
    fn execute(&self, command: &str, timeout: Duration) -> ExecOutput {
        let args = self.build_ssh_args(command);

        let mut cmd = Command::new("ssh");
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                return ExecOutput {
                    stdout: String::new(),
                    stderr: format!("SSH error: {}", e),
                }
            }
        };

        // Drain both pipes off-thread so a large response body cannot fill
        // the pipe buffer and wedge the child while we wait on it.
        let stdout_reader = spawn_pipe_reader(child.stdout.take());
        let stderr_reader = spawn_pipe_reader(child.stderr.take());

        let timed_out = !wait_with_deadline(&mut child, timeout);

        let stdout = stdout_reader.join().unwrap_or_default();
        let mut stderr = stderr_reader.join().unwrap_or_default();

        if timed_out {
            if !stderr.is_empty() {
                stderr.push('\n');
            }
            stderr.push_str(&format!(
                "command timed out after {}s",
                timeout.as_secs()
            ));
        }

        ExecOutput { stdout, stderr }
    }
}

fn spawn_pipe_reader<R: Read + Send + 'static>(
    pipe: Option<R>,
) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// Wait for the child to exit before the deadline. Returns false (after
/// killing the child) when the deadline passes first.
fn wait_with_deadline(child: &mut Child, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;

    loop {
        match child.try_wait() {
            Ok(Some(_)) => return true,
            Ok(None) => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    return false;
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(_) => {
                let _ = child.kill();
                let _ = child.wait();
                return true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> SshClient {
        SshClient {
            host: "203.0.113.9".to_string(),
            user: "root".to_string(),
            port: 22,
            identity_file: None,
        }
    }

    #[test]
    fn ssh_args_use_permissive_host_keys() {
        let args = client().build_ssh_args("echo ok");
        assert!(args.contains(&"StrictHostKeyChecking=no".to_string()));
        assert!(args.contains(&"UserKnownHostsFile=/dev/null".to_string()));
        assert!(args.contains(&"BatchMode=yes".to_string()));
        assert_eq!(args.last().unwrap(), "echo ok");
    }

    #[test]
    fn ssh_args_include_user_host_pair() {
        let args = client().build_ssh_args("true");
        assert!(args.contains(&"root@203.0.113.9".to_string()));
    }

    #[test]
    fn non_default_port_is_passed() {
        let mut c = client();
        c.port = 2222;
        let args = c.build_ssh_args("true");
        let idx = args.iter().position(|a| a == "-p").unwrap();
        assert_eq!(args[idx + 1], "2222");
    }

    #[test]
    fn default_port_is_omitted() {
        let args = client().build_ssh_args("true");
        assert!(!args.contains(&"-p".to_string()));
    }

    #[test]
    fn identity_file_flag_precedes_options() {
        let mut c = client();
        c.identity_file = Some("/keys/probe".to_string());
        let args = c.build_ssh_args("true");
        assert_eq!(args[0], "-i");
        assert_eq!(args[1], "/keys/probe");
    }
}
