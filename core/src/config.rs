use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_CONFIG_FILE: &str = ".gkedeploy";

/// Validated project settings read from `.gkedeploy`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployConfig {
    pub gcr_host: String,
    pub project_id: String,
    pub deployment_name: String,
    pub cluster_name: String,
    pub cluster_zone: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    gcr_host: Option<String>,
    #[serde(default)]
    project_id: Option<String>,
    #[serde(default)]
    deployment_name: Option<String>,
    #[serde(default)]
    cluster_name: Option<String>,
    #[serde(default)]
    cluster_zone: Option<String>,
}

impl DeployConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_json(&content).map_err(|err| match err {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Fields are checked in a fixed order and only the first missing one is reported.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig =
            serde_json::from_str(content).map_err(|source| ConfigError::Parse {
                path: PathBuf::new(),
                source,
            })?;

        Ok(Self {
            gcr_host: required(raw.gcr_host, "gcr_host", "(e.g. \"us.gcr.io\")")?,
            project_id: required(
                raw.project_id,
                "project_id",
                "(can be found in google console)",
            )?,
            deployment_name: required(
                raw.deployment_name,
                "deployment_name",
                "(can be found in google console)",
            )?,
            cluster_name: required(
                raw.cluster_name,
                "cluster_name",
                "(can be found in google console)",
            )?,
            cluster_zone: required(raw.cluster_zone, "cluster_zone", "(e.g. \"us-east1-d\")")?,
        })
    }

    /// `<gcr_host>/<project_id>/<deployment_name>`
    pub fn image_repository(&self) -> String {
        format!("{}/{}/{}", self.gcr_host, self.project_id, self.deployment_name)
    }

    pub fn image_tag(&self, tag: &str) -> String {
        format!("{}:{}", self.image_repository(), tag)
    }

    /// Resolves a `-c` argument: expands `~`, and anchors relative paths at `working_dir`.
    pub fn resolve_path(path: &Path, working_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
        let expanded = PathBuf::from(expanded);

        if expanded.is_absolute() {
            expanded
        } else {
            working_dir.join(expanded)
        }
    }
}

fn required(
    value: Option<String>,
    field: &'static str,
    hint: &'static str,
) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ConfigError::MissingField { field, hint }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    const FIELDS: [&str; 5] = [
        "gcr_host",
        "project_id",
        "deployment_name",
        "cluster_name",
        "cluster_zone",
    ];

    fn full() -> Value {
        json!({
            "gcr_host": "us.gcr.io",
            "project_id": "my-proj",
            "deployment_name": "svc",
            "cluster_name": "prod",
            "cluster_zone": "us-east1-d",
        })
    }

    #[test]
    fn test_parse_full_config() {
        let config = DeployConfig::from_json(&full().to_string()).unwrap();
        assert_eq!(config.gcr_host, "us.gcr.io");
        assert_eq!(config.cluster_zone, "us-east1-d");
        assert_eq!(config.image_repository(), "us.gcr.io/my-proj/svc");
        assert_eq!(config.image_tag("a5cb4a3"), "us.gcr.io/my-proj/svc:a5cb4a3");
    }

    #[test]
    fn test_each_missing_field_is_named() {
        for field in FIELDS {
            let mut value = full();
            value.as_object_mut().unwrap().remove(field);

            let err = DeployConfig::from_json(&value.to_string()).unwrap_err();
            assert_eq!(err.missing_field(), Some(field));
        }
    }

    #[test]
    fn test_empty_string_counts_as_missing() {
        let mut value = full();
        value["project_id"] = json!("");

        let err = DeployConfig::from_json(&value.to_string()).unwrap_err();
        assert_eq!(err.missing_field(), Some("project_id"));
    }

    #[test]
    fn test_first_missing_field_wins() {
        let err = DeployConfig::from_json(r#"{"gcr_host": "us.gcr.io"}"#).unwrap_err();
        assert_eq!(err.missing_field(), Some("project_id"));

        let err = DeployConfig::from_json("{}").unwrap_err();
        assert_eq!(err.missing_field(), Some("gcr_host"));
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let mut value = full();
        value["extra"] = json!(42);
        assert!(DeployConfig::from_json(&value.to_string()).is_ok());
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let err = DeployConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));

        let err = DeployConfig::from_json(r#"{"gcr_host": 5}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, full().to_string()).unwrap();

        let config = DeployConfig::load_from_file(&path).unwrap();
        assert_eq!(config.deployment_name, "svc");
    }

    #[test]
    fn test_load_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DeployConfig::load_from_file(dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_parse_error_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "{ broken").unwrap();

        let err = DeployConfig::load_from_file(&path).unwrap_err();
        match err {
            ConfigError::Parse { path: p, .. } => assert_eq!(p, path),
            other => panic!("Expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_path() {
        let work = Path::new("/srv/app");
        assert_eq!(
            DeployConfig::resolve_path(Path::new(".gkedeploy"), work),
            PathBuf::from("/srv/app/.gkedeploy")
        );
        assert_eq!(
            DeployConfig::resolve_path(Path::new("/etc/gke.json"), work),
            PathBuf::from("/etc/gke.json")
        );
    }
}
