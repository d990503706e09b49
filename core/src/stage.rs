use std::fmt;

/// What the operator asked for on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Kubeconfig,
    Push,
    Deploy,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Kubeconfig => "kubeconfig",
            Operation::Push => "push",
            Operation::Deploy => "deploy",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Push,
    ConfigureCredentials,
    Deploy,
}

impl Stage {
    /// Whether `operation` activates this stage. Depends on nothing else.
    pub fn is_active(&self, operation: Operation) -> bool {
        match self {
            Stage::Push => operation == Operation::Push,
            Stage::ConfigureCredentials => {
                matches!(operation, Operation::Kubeconfig | Operation::Deploy)
            }
            Stage::Deploy => operation == Operation::Deploy,
        }
    }

    /// Every stage in execution order.
    pub fn all() -> Vec<Stage> {
        vec![Stage::Push, Stage::ConfigureCredentials, Stage::Deploy]
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Push => "push",
            Stage::ConfigureCredentials => "configure-credentials",
            Stage::Deploy => "deploy",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order() {
        assert_eq!(
            Stage::all(),
            vec![Stage::Push, Stage::ConfigureCredentials, Stage::Deploy]
        );
    }

    fn active_for(operation: Operation) -> Vec<Stage> {
        Stage::all()
            .into_iter()
            .filter(|stage| stage.is_active(operation))
            .collect()
    }

    #[test]
    fn test_active_stages_per_operation() {
        assert_eq!(active_for(Operation::Push), vec![Stage::Push]);
        assert_eq!(active_for(Operation::Kubeconfig), vec![Stage::ConfigureCredentials]);
        assert_eq!(
            active_for(Operation::Deploy),
            vec![Stage::ConfigureCredentials, Stage::Deploy]
        );
    }

    #[test]
    fn test_push_is_independent_of_deploy() {
        assert!(!Stage::Push.is_active(Operation::Deploy));
        assert!(!Stage::Deploy.is_active(Operation::Push));
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(format!("{}", Stage::ConfigureCredentials), "configure-credentials");
        assert_eq!(format!("{}", Operation::Kubeconfig), "kubeconfig");
    }
}
