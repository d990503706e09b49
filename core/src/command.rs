use std::fmt;
use std::path::PathBuf;

/// One external program invocation: what to run, with which arguments, and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            current_dir: None,
        }
    }

    pub fn in_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.current_dir = dir;
        self
    }

    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.argv().join(" "))
    }
}

#[derive(Debug, Clone)]
pub struct DeployStep {
    pub description: String,
    pub command: CommandSpec,
}

impl DeployStep {
    pub fn new(description: String, command: CommandSpec) -> Self {
        Self {
            description,
            command,
        }
    }
}

impl fmt::Display for DeployStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.description)?;
        writeln!(f, "  {}", self.command)
    }
}

/// Argument contracts for docker, gcloud and kubectl.
#[derive(Debug, Clone)]
pub struct DeployCommands {
    working_dir: Option<PathBuf>,
}

impl DeployCommands {
    pub fn new(working_dir: Option<PathBuf>) -> Self {
        Self { working_dir }
    }

    pub fn build_step(&self, tag: &str) -> DeployStep {
        DeployStep::new(format!("Build image {}", tag), self.docker_build(tag))
    }

    pub fn push_step(&self, tag: &str) -> DeployStep {
        DeployStep::new(format!("Pushing image {}", tag), self.docker_push(tag))
    }

    pub fn add_tag_step(&self, current_tag: &str, new_tag: &str) -> DeployStep {
        DeployStep::new(
            format!("Add tag {} to {}", new_tag, current_tag),
            self.add_tag(current_tag, new_tag),
        )
    }

    pub fn get_credentials_step(
        &self,
        config_label: &str,
        cluster: &str,
        zone: &str,
        project: &str,
    ) -> DeployStep {
        DeployStep::new(
            format!("Init kubeconfig using {} settings", config_label),
            self.get_credentials(cluster, zone, project),
        )
    }

    pub fn set_image_step(&self, deployment: &str, tag: &str) -> DeployStep {
        DeployStep::new(
            format!("Update deployment/{} with new image {}", deployment, tag),
            self.set_image(deployment, tag),
        )
    }

    pub fn rollout_status_step(&self, deployment: &str) -> DeployStep {
        DeployStep::new(
            "Watching deployment...".to_string(),
            self.rollout_status(deployment),
        )
    }

    fn command<I, S>(&self, program: &str, args: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandSpec::new(program, args).in_dir(self.working_dir.clone())
    }

    fn docker_build(&self, tag: &str) -> CommandSpec {
        self.command("docker", ["build", "-t", tag, "."])
    }

    fn docker_push(&self, tag: &str) -> CommandSpec {
        self.command("gcloud", ["docker", "--", "push", tag])
    }

    fn add_tag(&self, current_tag: &str, new_tag: &str) -> CommandSpec {
        self.command(
            "gcloud",
            ["beta", "container", "images", "add-tag", current_tag, new_tag, "-q"],
        )
    }

    fn get_credentials(&self, cluster: &str, zone: &str, project: &str) -> CommandSpec {
        self.command(
            "gcloud",
            [
                "container",
                "clusters",
                "get-credentials",
                cluster,
                "--zone",
                zone,
                "--project",
                project,
            ],
        )
    }

    fn set_image(&self, deployment: &str, tag: &str) -> CommandSpec {
        self.command(
            "kubectl",
            vec![
                "set".to_string(),
                "image".to_string(),
                format!("deployment/{}", deployment),
                format!("{}={}", deployment, tag),
            ],
        )
    }

    fn rollout_status(&self, deployment: &str) -> CommandSpec {
        let target = format!("deployment/{}", deployment);
        self.command("kubectl", ["rollout", "status", target.as_str()])
    }
}
