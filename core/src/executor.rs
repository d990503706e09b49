use std::process::{ExitStatus, Stdio};
use std::time::Instant;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::classifier::{classify_line, Channel, ClassifiedLine, Severity};
use crate::command::CommandSpec;
use crate::error::{DeployError, Result};

#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub program: String,
    pub success: bool,
    pub duration: f64,
    pub exit_code: Option<i32>,
    pub failure_reason: Option<String>,
    pub stdout_lines: usize,
    pub stderr_lines: usize,
    pub error_lines: usize,
}

impl ExecutionResult {
    /// Exit code 0 is the only success, whatever the child printed.
    pub fn into_result(self) -> Result<Self> {
        if self.success {
            return Ok(self);
        }

        Err(DeployError::ProcessExit {
            reason: self
                .failure_reason
                .clone()
                .unwrap_or_else(|| "Abnormal termination".to_string()),
            program: self.program,
            code: self.exit_code,
        })
    }
}

#[derive(Debug, Clone)]
pub enum StepUpdate {
    Started(String),
    Output(ClassifiedLine),
    ProcessStarted(u32),
    ProcessFinished(u32),
    Finished(ExecutionResult),
    Notice(String),
}

pub type UpdateSender = mpsc::UnboundedSender<StepUpdate>;

/// Launches external programs on behalf of the pipeline stages.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `command` to completion, forwarding its classified output as it
    /// arrives. Resolves only when the child exited with code 0.
    async fn run(&self, command: &CommandSpec, updates: &UpdateSender) -> Result<ExecutionResult>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, command: &CommandSpec, updates: &UpdateSender) -> Result<ExecutionResult> {
        execute_command(command, updates).await?.into_result()
    }
}

/// Spawns one child and drains both pipes concurrently. Returns the raw
/// outcome; only a failure to start the program is an error here.
pub async fn execute_command(
    command: &CommandSpec,
    updates: &UpdateSender,
) -> Result<ExecutionResult> {
    let start = Instant::now();
    let program = command.program.clone();

    let mut cmd = Command::new(&command.program);
    cmd.args(&command.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = &command.current_dir {
        cmd.current_dir(dir);
    }

    tracing::debug!(command = %command, dir = ?command.current_dir, "spawning");

    let mut child = cmd.spawn().map_err(|source| DeployError::ProcessLaunch {
        program: program.clone(),
        source,
    })?;

    let pid = child.id();
    if let Some(pid) = pid {
        let _ = updates.send(StepUpdate::ProcessStarted(pid));
    }

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| std::io::Error::other("failed to capture stdout"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| std::io::Error::other("failed to capture stderr"))?;

    let stdout_task = drain(stdout, Channel::Primary, program.clone(), updates.clone());
    let stderr_task = drain(stderr, Channel::Diagnostic, program.clone(), updates.clone());

    let status = child.wait().await?;

    let stdout_counts = stdout_task.await.map_err(std::io::Error::other)?;
    let stderr_counts = stderr_task.await.map_err(std::io::Error::other)?;

    if let Some(pid) = pid {
        let _ = updates.send(StepUpdate::ProcessFinished(pid));
    }

    let exit_code = status.code();
    let failure_reason = failure_reason(&status);

    tracing::debug!(program = %program, ?exit_code, "process exited");

    Ok(ExecutionResult {
        program,
        success: status.success(),
        duration: start.elapsed().as_secs_f64(),
        exit_code,
        failure_reason,
        stdout_lines: stdout_counts.lines,
        stderr_lines: stderr_counts.lines,
        error_lines: stdout_counts.errors + stderr_counts.errors,
    })
}

#[derive(Debug, Default, Clone, Copy)]
struct LineCounts {
    lines: usize,
    errors: usize,
}

fn drain<R>(reader: R, channel: Channel, program: String, updates: UpdateSender) -> JoinHandle<LineCounts>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut counts = LineCounts::default();
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let raw = String::from_utf8_lossy(&buf);
                    if let Some(line) = classify_line(channel, &program, &raw) {
                        counts.lines += 1;
                        if line.severity == Severity::Error {
                            counts.errors += 1;
                        }
                        let _ = updates.send(StepUpdate::Output(line));
                    }
                }
                Err(err) => {
                    tracing::warn!(%program, %channel, error = %err, "stopped reading output");
                    break;
                }
            }
        }

        counts
    })
}

fn failure_reason(status: &ExitStatus) -> Option<String> {
    if status.success() {
        return None;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;

        if let Some(signal) = status.signal() {
            return Some(format!("Signal {} ({})", signal, signal_name(signal)));
        }
    }

    match status.code() {
        Some(code) => Some(format!("Exit code {}", code)),
        None => Some("Abnormal termination".to_string()),
    }
}

#[cfg(unix)]
fn signal_name(signal: i32) -> &'static str {
    match signal {
        1 => "SIGHUP (Hangup)",
        2 => "SIGINT (Interrupt)",
        3 => "SIGQUIT (Quit)",
        6 => "SIGABRT (Abort)",
        9 => "SIGKILL (Killed)",
        11 => "SIGSEGV (Segmentation fault)",
        13 => "SIGPIPE (Broken pipe)",
        15 => "SIGTERM (Terminated)",
        _ => "Unknown signal",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(mut rx: mpsc::UnboundedReceiver<StepUpdate>) -> Vec<ClassifiedLine> {
        let mut lines = Vec::new();
        while let Ok(update) = rx.try_recv() {
            if let StepUpdate::Output(line) = update {
                lines.push(line);
            }
        }
        lines
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_streams_both_channels() {
        let (tx, rx) = mpsc::unbounded_channel();
        let command = CommandSpec::new("sh", ["-c", "echo '  hello  '; echo; echo oops >&2"]);

        let result = ProcessRunner::new().run(&command, &tx).await.unwrap();
        assert!(result.success);
        assert_eq!(result.exit_code, Some(0));
        assert_eq!(result.stdout_lines, 1);
        assert_eq!(result.stderr_lines, 1);
        assert_eq!(result.error_lines, 1);

        let lines = collect(rx);
        assert_eq!(lines.len(), 2);
        let hello = lines.iter().find(|l| l.channel == Channel::Primary).unwrap();
        assert_eq!(hello.text, "hello");
        assert_eq!(hello.severity, Severity::Normal);
        let oops = lines.iter().find(|l| l.channel == Channel::Diagnostic).unwrap();
        assert_eq!(oops.text, "oops");
        assert_eq!(oops.severity, Severity::Error);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_trailing_output_is_not_lost() {
        let (tx, rx) = mpsc::unbounded_channel();
        let command = CommandSpec::new("sh", ["-c", "for i in 1 2 3 4 5; do echo line$i; done; printf tail"]);

        ProcessRunner::new().run(&command, &tx).await.unwrap();

        let texts: Vec<String> = collect(rx).into_iter().map(|l| l.text).collect();
        assert_eq!(texts, vec!["line1", "line2", "line3", "line4", "line5", "tail"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_process_exit() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let command = CommandSpec::new("sh", ["-c", "echo fine; exit 3"]);

        let err = ProcessRunner::new().run(&command, &tx).await.unwrap_err();
        match err {
            DeployError::ProcessExit { program, code, reason } => {
                assert_eq!(program, "sh");
                assert_eq!(code, Some(3));
                assert_eq!(reason, "Exit code 3");
            }
            other => panic!("Expected ProcessExit, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stderr_output_does_not_fail_success() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let command = CommandSpec::new("sh", ["-c", "echo warning >&2; exit 0"]);

        let result = ProcessRunner::new().run(&command, &tx).await.unwrap();
        assert!(result.success);
        assert_eq!(result.error_lines, 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_signal_is_reported() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let command = CommandSpec::new("sh", ["-c", "kill -9 $$"]);

        let result = execute_command(&command, &tx).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.exit_code, None);
        assert_eq!(result.failure_reason.as_deref(), Some("Signal 9 (SIGKILL (Killed))"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_runs_in_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "x").unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        let command =
            CommandSpec::new("ls", Vec::<String>::new()).in_dir(Some(dir.path().to_path_buf()));

        ProcessRunner::new().run(&command, &tx).await.unwrap();

        let texts: Vec<String> = collect(rx).into_iter().map(|l| l.text).collect();
        assert_eq!(texts, vec!["marker.txt"]);
    }

    #[tokio::test]
    async fn test_missing_program_is_launch_error() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let command = CommandSpec::new("gkedeploy-definitely-not-installed", ["x"]);

        let err = ProcessRunner::new().run(&command, &tx).await.unwrap_err();
        assert!(matches!(err, DeployError::ProcessLaunch { ref program, .. } if program == "gkedeploy-definitely-not-installed"));
    }
}
