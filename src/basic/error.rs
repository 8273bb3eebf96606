//! Error types for network construction, island aggregation and configuration.
//!
//! Structural problems are returned as [`PowerFlowError`] and abort the
//! operation that found them. Numerical trouble inside one island never
//! becomes an error: it is recorded as an [`IslandDiagnostic`] on that
//! island's convergence report so every run still yields a full result set.

use derive_more::derive::Display;
use thiserror::Error;

use super::elements::BusId;

/// Result type alias using [`PowerFlowError`].
pub type Result<T> = std::result::Result<T, PowerFlowError>;

/// Index space an island map entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, serde::Serialize, serde::Deserialize)]
pub enum IndexSpace {
    #[display("bus")]
    Bus,
    #[display("branch")]
    Branch,
    #[display("transformer")]
    Transformer,
    #[display("hvdc")]
    Hvdc,
}

/// Fatal errors raised while building a network or merging island results.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PowerFlowError {
    /// A branch, HVDC link or injection names a bus that is not in the network.
    #[error("dangling reference: {element} refers to unknown bus {bus}")]
    DanglingReference { element: String, bus: BusId },

    /// Two buses were added with the same id.
    #[error("duplicate bus id {0}")]
    DuplicateBus(BusId),

    /// A bus cannot be removed while devices still point at it.
    #[error("bus {bus} is still referenced by {references} element(s)")]
    BusInUse { bus: BusId, references: usize },

    /// A branch with `r = x = 0` has no series admittance to model it with.
    #[error("branch {0} has zero series impedance")]
    ZeroImpedance(String),

    /// Lookup of an element by global index failed.
    #[error("no {kind} at index {index}")]
    UnknownElement { kind: &'static str, index: usize },

    /// An island map is malformed: out of range, duplicated, or a slot already
    /// owned by another island.
    #[error("island {island}: inconsistent {space} index {index}: {reason}")]
    IndexMapInconsistency {
        island: usize,
        space: IndexSpace,
        index: usize,
        reason: String,
    },

    /// Configuration rejected by validation or parsing.
    #[error("invalid power flow configuration: {0}")]
    InvalidConfig(String),
}

impl From<serde_json::Error> for PowerFlowError {
    fn from(err: serde_json::Error) -> Self {
        PowerFlowError::InvalidConfig(err.to_string())
    }
}

/// Soft, per-island problems carried as data on a convergence report.
#[derive(Error, Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum IslandDiagnostic {
    /// No active slack bus: the island was solved against a provisional
    /// angle reference and is reported as non-convergent.
    #[error("no slack bus in island")]
    NoSlackBus,

    /// Every strategy hit its iteration cap without meeting the tolerance.
    #[error("did not converge after {iterations} iterations")]
    NonConvergence { iterations: usize },

    /// The sparse linear solve failed (singular or ill-conditioned system).
    #[error("linear solve failed: {0}")]
    LinearSolve(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_space_names_appear_in_messages() {
        let err = PowerFlowError::IndexMapInconsistency {
            island: 2,
            space: IndexSpace::Transformer,
            index: 7,
            reason: "out of range".into(),
        };
        assert_eq!(err.to_string(), "island 2: inconsistent transformer index 7: out of range");
        assert_eq!(IndexSpace::Hvdc.to_string(), "hvdc");
    }
}
