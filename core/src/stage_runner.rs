use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::{
    error::{DeployError, Result},
    executor::{CommandRunner, StepUpdate, UpdateSender},
    stage::{Operation, Stage},
    stage_context::{RunContext, StageResult, StageStatus},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Pending,
    Running(Stage),
    Completed,
    Failed(Stage),
}

#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub operation: Option<Operation>,
    pub state: PipelineState,
    pub stages: Vec<(Stage, StageResult)>,
    pub duration: f64,
}

impl PipelineReport {
    pub fn success(&self) -> bool {
        self.state == PipelineState::Completed
    }

    pub fn executed(&self) -> Vec<Stage> {
        self.stages
            .iter()
            .filter(|(_, result)| !matches!(result, StageResult::Skipped { .. }))
            .map(|(stage, _)| *stage)
            .collect()
    }
}

struct StageFailure {
    error: DeployError,
    duration: f64,
    steps_executed: usize,
}

/// Runs the stages in their fixed order, skipping the ones the operation
/// does not activate and stopping at the first failure.
pub struct StageRunner {
    runner: Arc<dyn CommandRunner>,
    state: PipelineState,
    operation: Option<Operation>,
    results: HashMap<Stage, StageResult>,
    statuses: HashMap<Stage, StageStatus>,
    duration: f64,
}

impl StageRunner {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            state: PipelineState::Pending,
            operation: None,
            results: HashMap::new(),
            statuses: HashMap::new(),
            duration: 0.0,
        }
    }

    pub async fn execute(
        &mut self,
        operation: Operation,
        context: &RunContext,
        updates: &UpdateSender,
    ) -> Result<PipelineReport> {
        self.clear();
        self.operation = Some(operation);
        let start = Instant::now();

        for stage in Stage::all() {
            self.statuses.insert(stage, StageStatus::Pending);
        }

        let stages = Stage::all();
        for (position, stage) in stages.iter().copied().enumerate() {
            if !stage.is_active(operation) {
                tracing::debug!(%stage, %operation, "stage not requested");
                self.record(
                    stage,
                    StageResult::Skipped {
                        reason: format!("Not part of {}", operation),
                    },
                    StageStatus::Skipped,
                );
                continue;
            }

            self.state = PipelineState::Running(stage);
            self.statuses.insert(stage, StageStatus::Running);
            tracing::info!(%stage, "stage started");

            match self.execute_stage(stage, context, updates).await {
                Ok(result) => {
                    self.record(stage, result, StageStatus::Completed);
                    if let Some(notice) = context.completion_notice(stage) {
                        let _ = updates.send(StepUpdate::Notice(notice));
                    }
                }
                Err(failure) => {
                    tracing::info!(%stage, error = %failure.error, "stage failed");
                    self.record(
                        stage,
                        StageResult::Failed {
                            error: failure.error.to_string(),
                            duration: failure.duration,
                            steps_executed: failure.steps_executed,
                        },
                        StageStatus::Failed,
                    );

                    for remaining in &stages[position + 1..] {
                        self.record(
                            *remaining,
                            StageResult::Skipped {
                                reason: "Previous stage failed".to_string(),
                            },
                            StageStatus::Skipped,
                        );
                    }

                    self.state = PipelineState::Failed(stage);
                    self.duration = start.elapsed().as_secs_f64();
                    return Err(failure.error);
                }
            }
        }

        self.state = PipelineState::Completed;
        self.duration = start.elapsed().as_secs_f64();

        Ok(self.report())
    }

    async fn execute_stage(
        &self,
        stage: Stage,
        context: &RunContext,
        updates: &UpdateSender,
    ) -> std::result::Result<StageResult, StageFailure> {
        let start = Instant::now();
        let mut steps_executed = 0;

        for step in context.generate_steps_for_stage(stage) {
            let _ = updates.send(StepUpdate::Started(step.description.clone()));
            steps_executed += 1;

            match self.runner.run(&step.command, updates).await {
                Ok(result) => {
                    let _ = updates.send(StepUpdate::Finished(result));
                }
                Err(error) => {
                    return Err(StageFailure {
                        error,
                        duration: start.elapsed().as_secs_f64(),
                        steps_executed,
                    });
                }
            }
        }

        Ok(StageResult::Success {
            duration: start.elapsed().as_secs_f64(),
            steps_executed,
        })
    }

    fn record(&mut self, stage: Stage, result: StageResult, status: StageStatus) {
        self.results.insert(stage, result);
        self.statuses.insert(stage, status);
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn get_status(&self, stage: Stage) -> Option<StageStatus> {
        self.statuses.get(&stage).copied()
    }

    pub fn get_result(&self, stage: Stage) -> Option<StageResult> {
        self.results.get(&stage).cloned()
    }

    /// Results in stage order.
    pub fn report(&self) -> PipelineReport {
        PipelineReport {
            operation: self.operation,
            state: self.state,
            stages: Stage::all()
                .into_iter()
                .filter_map(|stage| self.get_result(stage).map(|result| (stage, result)))
                .collect(),
            duration: self.duration,
        }
    }

    pub fn clear(&mut self) {
        self.state = PipelineState::Pending;
        self.operation = None;
        self.results.clear();
        self.statuses.clear();
        self.duration = 0.0;
    }
}
