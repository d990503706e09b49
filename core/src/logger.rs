use std::io::Write;

use chrono::Local;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::classifier::{ClassifiedLine, Severity};
use crate::executor::StepUpdate;
use crate::stage_runner::PipelineReport;
use crate::stage_context::StageResult;

static ANSI_ESCAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").unwrap());

const GRAY: &str = "\x1b[90m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";
const GREEN: &str = "\x1b[32m";
const RESET: &str = "\x1b[0m";

const TIMESTAMP_FORMAT: &str = "%H:%M:%S";

/// Styles for operator-facing messages that did not come from a child process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Step,
    Success,
    Failure,
}

/// Maps classified output and pipeline progress onto the terminal.
pub struct Logger {
    use_colors: bool,
}

impl Logger {
    pub fn new() -> Self {
        Self {
            use_colors: atty::is(atty::Stream::Stdout),
        }
    }

    pub fn plain() -> Self {
        Self { use_colors: false }
    }

    pub fn handle_update(&self, update: &StepUpdate) {
        match update {
            StepUpdate::Started(description) => self.message(MessageKind::Step, description),
            StepUpdate::Output(line) => self.log_line(line),
            StepUpdate::Notice(notice) => self.message(MessageKind::Step, notice),
            StepUpdate::ProcessStarted(pid) => tracing::trace!(pid, "child started"),
            StepUpdate::ProcessFinished(pid) => tracing::trace!(pid, "child finished"),
            StepUpdate::Finished(result) => {
                tracing::debug!(program = %result.program, duration = result.duration, "step finished")
            }
        }
    }

    pub fn log_line(&self, line: &ClassifiedLine) {
        println!("{}", self.format_line(line));
        let _ = std::io::stdout().flush();
    }

    pub fn message(&self, kind: MessageKind, text: &str) {
        println!("{}", self.format_message(kind, text));
        let _ = std::io::stdout().flush();
    }

    pub fn error(&self, text: &str) {
        eprintln!("{}", self.format_message(MessageKind::Failure, text));
    }

    pub fn summary(&self, report: &PipelineReport) {
        let kind = if report.success() {
            MessageKind::Success
        } else {
            MessageKind::Failure
        };
        self.message(kind, &summarize(report));
    }

    pub fn format_line(&self, line: &ClassifiedLine) -> String {
        if self.use_colors {
            let color = match line.severity {
                Severity::Normal => GRAY,
                Severity::Error => RED,
            };
            format!("{}{}{}", color, line.text, RESET)
        } else {
            let text = strip_ansi(&line.text);
            let timestamp = line.timestamp.format(TIMESTAMP_FORMAT);
            match line.severity {
                Severity::Error if !text.starts_with("ERROR") => {
                    format!("[{}] ERROR {}", timestamp, text)
                }
                _ => format!("[{}] {}", timestamp, text),
            }
        }
    }

    pub fn format_message(&self, kind: MessageKind, text: &str) -> String {
        if !self.use_colors {
            return format!("[{}] {}", Local::now().format(TIMESTAMP_FORMAT), text);
        }

        let color = match kind {
            MessageKind::Step => CYAN,
            MessageKind::Success => GREEN,
            MessageKind::Failure => RED,
        };
        format!("{}{}{}", color, text, RESET)
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

fn summarize(report: &PipelineReport) -> String {
    let parts: Vec<String> = report
        .stages
        .iter()
        .filter_map(|(stage, result)| match result {
            StageResult::Success { duration, .. } => Some(format!("{} ok ({:.1}s)", stage, duration)),
            StageResult::Failed { duration, .. } => {
                Some(format!("{} failed ({:.1}s)", stage, duration))
            }
            StageResult::Skipped { .. } => None,
        })
        .collect();

    let status = if report.success() { "Done" } else { "Failed" };
    if parts.is_empty() {
        format!("{} in {:.1}s", status, report.duration)
    } else {
        format!("{} in {:.1}s: {}", status, report.duration, parts.join(", "))
    }
}

pub fn strip_ansi(s: &str) -> String {
    ANSI_ESCAPE.replace_all(s, "").to_string()
}
