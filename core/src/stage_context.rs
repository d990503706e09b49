use std::path::{Path, PathBuf};

use crate::{
    command::{DeployCommands, DeployStep},
    config::DeployConfig,
    error::Result,
    stage::Stage,
    vcs::{Revision, VersionControl},
};

#[derive(Debug, Clone, PartialEq)]
pub enum StageResult {
    Success {
        duration: f64,
        steps_executed: usize,
    },
    Failed {
        error: String,
        duration: f64,
        steps_executed: usize,
    },
    Skipped {
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Skipped,
}

/// Everything a stage needs, resolved once before the first stage runs.
#[derive(Debug, Clone)]
pub struct RunContext {
    config: DeployConfig,
    config_path: PathBuf,
    working_dir: PathBuf,
    image_repository: String,
    commit: String,
    branch: String,
    primary_tag: String,
    commands: DeployCommands,
}

impl RunContext {
    pub fn new(
        config: DeployConfig,
        revision: Revision,
        config_path: PathBuf,
        working_dir: PathBuf,
    ) -> Self {
        let image_repository = config.image_repository();
        let primary_tag = config.image_tag(&revision.commit);
        let commands = DeployCommands::new(Some(working_dir.clone()));

        Self {
            config,
            config_path,
            working_dir,
            image_repository,
            commit: revision.commit,
            branch: revision.branch,
            primary_tag,
            commands,
        }
    }

    /// Loads and validates the config before asking version control for the
    /// revision, so a bad config never launches anything. `config_path` is
    /// kept as given; relative paths are read from `working_dir`.
    pub async fn build(
        config_path: &Path,
        working_dir: &Path,
        vcs: &dyn VersionControl,
    ) -> Result<Self> {
        let resolved = DeployConfig::resolve_path(config_path, working_dir);
        let config = DeployConfig::load_from_file(&resolved)?;
        let revision = vcs.revision(working_dir).await?;

        Ok(Self::new(
            config,
            revision,
            config_path.to_path_buf(),
            working_dir.to_path_buf(),
        ))
    }

    pub fn config(&self) -> &DeployConfig {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn image_repository(&self) -> &str {
        &self.image_repository
    }

    pub fn commit(&self) -> &str {
        &self.commit
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn primary_tag(&self) -> &str {
        &self.primary_tag
    }

    pub fn tag(&self, tag: &str) -> String {
        format!("{}:{}", self.image_repository, tag)
    }

    pub fn generate_steps_for_stage(&self, stage: Stage) -> Vec<DeployStep> {
        match stage {
            Stage::Push => self.generate_push_steps(),
            Stage::ConfigureCredentials => self.generate_credentials_steps(),
            Stage::Deploy => self.generate_deploy_steps(),
        }
    }

    /// Printed once a stage has finished successfully.
    pub fn completion_notice(&self, stage: Stage) -> Option<String> {
        match stage {
            Stage::Push => Some(format!("Finished uploading image {}", self.primary_tag)),
            Stage::ConfigureCredentials => None,
            Stage::Deploy => Some(
                "Finished deployment, you should manually verify your deployment \
                 because usually deployment failure conditions are configured improperly"
                    .to_string(),
            ),
        }
    }

    fn generate_push_steps(&self) -> Vec<DeployStep> {
        vec![
            self.commands.build_step(&self.primary_tag),
            self.commands.push_step(&self.primary_tag),
            self.commands
                .add_tag_step(&self.primary_tag, &self.tag("latest")),
            self.commands
                .add_tag_step(&self.primary_tag, &self.tag(&self.branch)),
        ]
    }

    fn generate_credentials_steps(&self) -> Vec<DeployStep> {
        vec![self.commands.get_credentials_step(
            &self.config_path.display().to_string(),
            &self.config.cluster_name,
            &self.config.cluster_zone,
            &self.config.project_id,
        )]
    }

    fn generate_deploy_steps(&self) -> Vec<DeployStep> {
        let deployment = &self.config.deployment_name;
        vec![
            self.commands.set_image_step(deployment, &self.primary_tag),
            self.commands.rollout_status_step(deployment),
        ]
    }
}
