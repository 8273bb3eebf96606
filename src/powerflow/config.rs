use serde::{Deserialize, Serialize};

use super::SolverType;
use crate::{
    basic::error::{PowerFlowError, Result},
    results::ViolationWeights,
};

/// Options for a power flow run. Missing fields take their defaults when
/// parsed from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerFlowConfig {
    /// Largest accepted power mismatch, p.u.
    pub tolerance: f64,
    /// Iteration cap of the Newton solver.
    pub max_iter: usize,
    /// Strategies tried in order until one converges.
    pub strategies: Vec<SolverType>,
    /// Iteration cap of the Gauss-Seidel solver, which needs many more sweeps.
    pub gauss_seidel_max_iter: usize,
    /// Solve islands on the rayon thread pool.
    pub parallel: bool,
    pub weights: ViolationWeights,
}

impl Default for PowerFlowConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            max_iter: 30,
            strategies: vec![SolverType::NewtonRaphson, SolverType::GaussSeidel],
            gauss_seidel_max_iter: 500,
            parallel: true,
            weights: ViolationWeights::default(),
        }
    }
}

impl PowerFlowConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.tolerance > 0.0 && self.tolerance.is_finite()) {
            return Err(PowerFlowError::InvalidConfig(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if self.strategies.is_empty() {
            return Err(PowerFlowError::InvalidConfig("no solving strategy given".into()));
        }
        let w = self.weights;
        if [w.overload, w.overvoltage, w.undervoltage].iter().any(|x| *x < 0.0) {
            return Err(PowerFlowError::InvalidConfig("violation weights must be non-negative".into()));
        }
        Ok(())
    }
}
