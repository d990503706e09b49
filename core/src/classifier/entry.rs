use std::fmt;

use chrono::{DateTime, Local};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Normal,
    Error,
}

/// Which of the child's output pipes a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Primary,
    Diagnostic,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Channel::Primary => "stdout",
            Channel::Diagnostic => "stderr",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone)]
pub struct ClassifiedLine {
    pub timestamp: DateTime<Local>,
    pub severity: Severity,
    pub channel: Channel,
    pub program: String,
    pub text: String,
}

impl ClassifiedLine {
    pub fn new(severity: Severity, channel: Channel, program: String, text: String) -> Self {
        Self {
            timestamp: Local::now(),
            severity,
            channel,
            program,
            text,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}
