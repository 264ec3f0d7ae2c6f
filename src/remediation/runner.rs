use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;

/// Captured result of one subprocess. `status` is `None` when the process
/// never ran to completion (spawn failure, timeout, signal).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    fn not_run(reason: String) -> Self {
        Self {
            status: None,
            stdout: String::new(),
            stderr: reason,
        }
    }
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command` (program followed by arguments) inside `cwd`.
    /// Failures are reported through the output, never as an error.
    async fn run(&self, command: &[String], cwd: &Path) -> CommandOutput;
}

/// Runs commands as real child processes, killing any that outlive
/// `timeout`.
pub struct ProcessRunner {
    timeout: Duration,
}

impl ProcessRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, command: &[String], cwd: &Path) -> CommandOutput {
        let Some((program, args)) = command.split_first() else {
            return CommandOutput::not_run("Empty command".to_string());
        };

        tracing::info!(command = %shell_join(command), "Running command");

        let mut process = tokio::process::Command::new(program);
        process
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, process.output()).await {
            Ok(Ok(output)) => CommandOutput {
                status: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            },
            Ok(Err(e)) => CommandOutput::not_run(format!("Failed to run {program}: {e}")),
            Err(_) => CommandOutput::not_run(format!(
                "Command timed out after {}s: {}",
                self.timeout.as_secs(),
                shell_join(command)
            )),
        };

        if !output.success() {
            tracing::warn!(
                command = %shell_join(command),
                status = ?output.status,
                "Command failed"
            );
        }

        output
    }
}

/// POSIX shell quoting for one argument.
pub fn shell_quote(arg: &str) -> String {
    if arg.is_empty() {
        return "''".to_string();
    }
    let safe = arg
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "@%+=:,./-_".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r#"'"'"'"#))
    }
}

/// Render a command line the way a user would type it.
pub fn shell_join(command: &[String]) -> String {
    command
        .iter()
        .map(|arg| shell_quote(arg))
        .collect::<Vec<_>>()
        .join(" ")
}
