//! Island-by-island power flow: configuration, solving strategies, the
//! per-island adapter and the network driver.

mod adapter;
mod config;
mod driver;
mod strategy;

pub use adapter::solve_island;
pub use config::PowerFlowConfig;
pub use driver::{PowerFlowDriver, PowerFlowOutcome};
pub use strategy::{DcLinear, GaussSeidel, IslandSolver, NewtonRaphson, SolveOptions, SolverType};
