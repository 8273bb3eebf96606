mod basic;
pub mod powerflow;
pub mod results;
pub mod testcases;

pub mod prelude {
    use crate::basic;
    pub use basic::{
        dc_pf,
        elements::*,
        error::{IndexSpace, IslandDiagnostic, PowerFlowError},
        gauss_seidel_pf,
        island::{IndexMapping, Island, IslandIndices, decompose},
        network::{Adjacency, Incidence, Network, DEFAULT_SBASE},
        newton_pf,
        solver::{DefaultSolver, Solve},
        system::{IslandSystem, SolveOutcome},
    };

    pub use crate::powerflow::*;
    pub use crate::results::*;
}
