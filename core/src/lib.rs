pub mod classifier;
pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod executor;
pub mod logger;
pub mod stage;
pub mod stage_context;
pub mod stage_runner;
pub mod testing;
pub mod vcs;

pub use classifier::{classify, Channel, ClassifiedLine, Severity};
pub use cli::{Cli, Commands};
pub use command::{CommandSpec, DeployCommands, DeployStep};
pub use config::DeployConfig;
pub use error::{ConfigError, DeployError};
pub use executor::{CommandRunner, ExecutionResult, ProcessRunner, StepUpdate};
pub use logger::Logger;
pub use stage::{Operation, Stage};
pub use stage_context::{RunContext, StageResult, StageStatus};
pub use stage_runner::{PipelineReport, PipelineState, StageRunner};
pub use vcs::{GitCli, Revision, VersionControl};
