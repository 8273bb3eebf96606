use derive_more::derive::Display;
use serde::{Deserialize, Serialize};

use super::PowerFlowConfig;
use crate::basic::{
    dcpf::dc_pf,
    gauss_seidel::gauss_seidel_pf,
    newton_pf,
    solver::DefaultSolver,
    system::{IslandSystem, SolveOutcome},
};

/// Available solving strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum SolverType {
    #[display("Newton-Raphson")]
    NewtonRaphson,
    #[display("Gauss-Seidel")]
    GaussSeidel,
    #[display("Linear DC")]
    LinearDc,
}

impl SolverType {
    pub fn solver(&self) -> Box<dyn IslandSolver> {
        match self {
            SolverType::NewtonRaphson => Box::new(NewtonRaphson),
            SolverType::GaussSeidel => Box::new(GaussSeidel),
            SolverType::LinearDc => Box::new(DcLinear),
        }
    }
}

/// Numerical limits handed to every strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveOptions {
    pub tolerance: f64,
    pub max_iter: usize,
    pub gauss_seidel_max_iter: usize,
}

impl From<&PowerFlowConfig> for SolveOptions {
    fn from(config: &PowerFlowConfig) -> Self {
        Self {
            tolerance: config.tolerance,
            max_iter: config.max_iter,
            gauss_seidel_max_iter: config.gauss_seidel_max_iter,
        }
    }
}

/// A power flow method that can solve one island system.
///
/// Implementations always return the last iterate, never an error: failure
/// is reported through [`SolveOutcome::converged`] and its diagnostic.
pub trait IslandSolver: Send + Sync {
    fn kind(&self) -> SolverType;

    fn solve(&self, system: &IslandSystem, options: &SolveOptions) -> SolveOutcome;
}

pub struct NewtonRaphson;

impl IslandSolver for NewtonRaphson {
    fn kind(&self) -> SolverType {
        SolverType::NewtonRaphson
    }

    fn solve(&self, system: &IslandSystem, options: &SolveOptions) -> SolveOutcome {
        let mut solver = DefaultSolver::default();
        newton_pf(
            &system.ybus,
            &system.sbus,
            &system.v0,
            system.npv,
            system.npq,
            options.tolerance,
            options.max_iter,
            &mut solver,
        )
    }
}

pub struct GaussSeidel;

impl IslandSolver for GaussSeidel {
    fn kind(&self) -> SolverType {
        SolverType::GaussSeidel
    }

    fn solve(&self, system: &IslandSystem, options: &SolveOptions) -> SolveOutcome {
        gauss_seidel_pf(
            &system.ybus,
            &system.sbus,
            &system.v0,
            system.npv,
            system.npq,
            options.tolerance,
            options.gauss_seidel_max_iter,
        )
    }
}

pub struct DcLinear;

impl IslandSolver for DcLinear {
    fn kind(&self) -> SolverType {
        SolverType::LinearDc
    }

    fn solve(&self, system: &IslandSystem, _options: &SolveOptions) -> SolveOutcome {
        dc_pf(system, &mut DefaultSolver::default())
    }
}
