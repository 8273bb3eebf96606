use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{basic::error::IslandDiagnostic, powerflow::SolverType};

/// Outcome of solving one island.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceReport {
    pub island: usize,
    /// Strategy whose result was kept.
    pub method: Option<SolverType>,
    /// Every strategy tried, in order.
    pub attempts: Vec<SolverType>,
    pub converged: bool,
    /// Final power mismatch in p.u.; infinite for islands without a slack bus.
    pub error: f64,
    /// Wall-clock time spent in the solvers.
    pub elapsed: Duration,
    /// Iterations summed over all attempts.
    pub iterations: usize,
    pub diagnostics: Vec<IslandDiagnostic>,
}

impl ConvergenceReport {
    pub fn has_diagnostic(&self, diagnostic: &IslandDiagnostic) -> bool {
        self.diagnostics.contains(diagnostic)
    }

    pub fn method_name(&self) -> String {
        self.attempts
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}
