use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Config file must specify \"{field}\" {hint}")]
    MissingField {
        field: &'static str,
        hint: &'static str,
    },
}

impl ConfigError {
    pub fn missing_field(&self) -> Option<&'static str> {
        match self {
            ConfigError::MissingField { field, .. } => Some(*field),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum DeployError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Version control error: {0}")]
    Vcs(String),

    #[error("Failed to launch {program}: {source}")]
    ProcessLaunch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} failed: {reason}")]
    ProcessExit {
        program: String,
        code: Option<i32>,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DeployError {
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            DeployError::ProcessExit { code, .. } => *code,
            _ => None,
        }
    }
}

pub type Result<T, E = DeployError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_message() {
        let err = ConfigError::MissingField {
            field: "gcr_host",
            hint: "(e.g. \"us.gcr.io\")",
        };
        assert_eq!(
            err.to_string(),
            "Config file must specify \"gcr_host\" (e.g. \"us.gcr.io\")"
        );
        assert_eq!(err.missing_field(), Some("gcr_host"));
    }

    #[test]
    fn test_process_exit_carries_code() {
        let err = DeployError::ProcessExit {
            program: "docker".to_string(),
            code: Some(125),
            reason: "Exit code 125".to_string(),
        };
        assert_eq!(err.exit_code(), Some(125));
        assert_eq!(err.to_string(), "docker failed: Exit code 125");
    }

    #[test]
    fn test_config_error_is_transparent() {
        let err: DeployError = ConfigError::MissingField {
            field: "cluster_zone",
            hint: "(e.g. \"us-east1-d\")",
        }
        .into();
        assert!(err.to_string().starts_with("Config file must specify \"cluster_zone\""));
        assert_eq!(err.exit_code(), None);
    }
}
