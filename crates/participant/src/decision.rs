//! Commit/cancel policies.
//!
//! The random policy stands in for real business logic. Only the protocol
//! shape matters here: the verdict is produced when the coordinator calls
//! back, never when the work is issued.

use std::str::FromStr;

use common::{CorrelationId, ExecutionId};

/// Decides whether a workflow commits.
pub trait DecisionPolicy: Send + Sync {
    fn decide(&self, correlation_id: &CorrelationId, execution_id: &ExecutionId) -> bool;
}

/// Fair coin flip per callback.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomDecision;

impl DecisionPolicy for RandomDecision {
    fn decide(&self, _: &CorrelationId, _: &ExecutionId) -> bool {
        rand::random::<bool>()
    }
}

/// Always returns the same verdict.
#[derive(Debug, Clone, Copy)]
pub struct FixedDecision(pub bool);

impl DecisionPolicy for FixedDecision {
    fn decide(&self, _: &CorrelationId, _: &ExecutionId) -> bool {
        self.0
    }
}

/// Policy selected by the `DECISION` setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecisionMode {
    #[default]
    Random,
    Commit,
    Cancel,
}

impl DecisionMode {
    pub fn policy(self) -> Box<dyn DecisionPolicy> {
        match self {
            DecisionMode::Random => Box::new(RandomDecision),
            DecisionMode::Commit => Box::new(FixedDecision(true)),
            DecisionMode::Cancel => Box::new(FixedDecision(false)),
        }
    }
}

impl FromStr for DecisionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "random" => Ok(DecisionMode::Random),
            "commit" => Ok(DecisionMode::Commit),
            "cancel" => Ok(DecisionMode::Cancel),
            other => Err(format!("unknown decision mode: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_policy() {
        let ids = (CorrelationId::from("C1"), ExecutionId::from("exec-1"));
        assert!(FixedDecision(true).decide(&ids.0, &ids.1));
        assert!(!DecisionMode::Cancel.policy().decide(&ids.0, &ids.1));
    }

    #[test]
    fn test_random_policy_produces_both_outcomes() {
        let ids = (CorrelationId::new(), ExecutionId::new());
        let outcomes: Vec<bool> = (0..200)
            .map(|_| RandomDecision.decide(&ids.0, &ids.1))
            .collect();
        assert!(outcomes.contains(&true));
        assert!(outcomes.contains(&false));
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("Commit".parse(), Ok(DecisionMode::Commit));
        assert_eq!("random".parse(), Ok(DecisionMode::Random));
        assert!("maybe".parse::<DecisionMode>().is_err());
    }
}
