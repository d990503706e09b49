use std::path::Path;

use super::entry::{Channel, ClassifiedLine, Severity};

/// gcloud writes its progress and status messages to stderr, so only lines
/// carrying this marker are real errors.
const STATUS_ON_STDERR_PROGRAM: &str = "gcloud";
const ERROR_MARKER: &str = "ERROR";

pub fn classify(channel: Channel, program: &str, text: &str) -> Severity {
    match channel {
        Channel::Primary => Severity::Normal,
        Channel::Diagnostic if writes_status_to_stderr(program) => {
            if text.trim().starts_with(ERROR_MARKER) {
                Severity::Error
            } else {
                Severity::Normal
            }
        }
        Channel::Diagnostic => Severity::Error,
    }
}

/// Trims a raw output line and classifies it. Blank lines yield nothing.
pub fn classify_line(channel: Channel, program: &str, raw: &str) -> Option<ClassifiedLine> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    Some(ClassifiedLine::new(
        classify(channel, program, text),
        channel,
        program.to_string(),
        text.to_string(),
    ))
}

fn writes_status_to_stderr(program: &str) -> bool {
    Path::new(program)
        .file_name()
        .map(|name| name == STATUS_ON_STDERR_PROGRAM)
        .unwrap_or(false)
}
