//! Test doubles for driving the pipeline without launching real tools.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::classifier::{classify_line, Channel};
use crate::command::CommandSpec;
use crate::error::{DeployError, Result};
use crate::executor::{CommandRunner, ExecutionResult, StepUpdate, UpdateSender};

/// Records every command it is asked to run instead of spawning it.
///
/// Commands whose rendered form contains a registered needle fail with the
/// configured exit code; every command emits the configured output lines.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<CommandSpec>>,
    failures: Vec<(String, i32)>,
    output: Vec<(Channel, String)>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_when(mut self, needle: &str, exit_code: i32) -> Self {
        self.failures.push((needle.to_string(), exit_code));
        self
    }

    pub fn with_output(mut self, channel: Channel, text: &str) -> Self {
        self.output.push((channel, text.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    /// Each recorded command rendered as a single shell-like line.
    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(ToString::to_string).collect()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, command: &CommandSpec, updates: &UpdateSender) -> Result<ExecutionResult> {
        self.calls.lock().unwrap().push(command.clone());

        let mut error_lines = 0;
        for (channel, text) in &self.output {
            if let Some(line) = classify_line(*channel, &command.program, text) {
                if line.is_error() {
                    error_lines += 1;
                }
                let _ = updates.send(StepUpdate::Output(line));
            }
        }

        let rendered = command.to_string();
        if let Some((_, code)) = self
            .failures
            .iter()
            .find(|(needle, _)| rendered.contains(needle.as_str()))
        {
            return Err(DeployError::ProcessExit {
                program: command.program.clone(),
                code: Some(*code),
                reason: format!("Exit code {}", code),
            });
        }

        Ok(ExecutionResult {
            program: command.program.clone(),
            success: true,
            duration: 0.0,
            exit_code: Some(0),
            failure_reason: None,
            stdout_lines: 0,
            stderr_lines: 0,
            error_lines,
        })
    }
}
