//! Network-wide power flow results assembled from per-island solutions.

mod report;
mod res_display;
mod result_kind;
mod violations;

pub use report::ConvergenceReport;
pub use result_kind::{ResultKind, ResultSeries, SeriesValues};
pub use violations::{LimitViolations, ViolationWeights};

use std::collections::HashSet;

use num_complex::Complex64;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

use crate::basic::{
    elements::BusType,
    error::{IndexSpace, PowerFlowError, Result},
    island::IslandIndices,
    network::Network,
};

/// Solution of one island in its local numbering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IslandResult {
    /// Complex bus voltage, p.u.
    pub voltage: Vec<Complex64>,
    /// Computed bus injection, MVA.
    pub sbus: Vec<Complex64>,
    pub bus_types: Vec<BusType>,
    /// Power entering the branch at the from end, MVA.
    pub sf: Vec<Complex64>,
    /// Power entering the branch at the to end, MVA.
    pub st: Vec<Complex64>,
    /// From-end current, p.u.
    pub i_from: Vec<Complex64>,
    /// To-end current, p.u.
    pub i_to: Vec<Complex64>,
    /// `V_from - V_to`, p.u.
    pub vbranch: Vec<Complex64>,
    pub loading: Vec<f64>,
    /// MVA.
    pub losses: Vec<Complex64>,
    /// Sign of the from-end active power.
    pub flow_direction: Vec<f64>,
    pub tap_module: Vec<f64>,
    /// MW.
    pub hvdc_sent_power: Vec<f64>,
    /// MW.
    pub hvdc_losses: Vec<f64>,
    pub hvdc_loading: Vec<f64>,
    pub report: ConvergenceReport,
}

impl IslandResult {
    pub fn n_buses(&self) -> usize {
        self.voltage.len()
    }

    pub fn n_branches(&self) -> usize {
        self.sf.len()
    }

    /// First index space whose arrays disagree in length, if any.
    fn ragged_space(&self) -> Option<IndexSpace> {
        let (nb, nbr, ndc) = (self.n_buses(), self.n_branches(), self.hvdc_sent_power.len());
        if self.sbus.len() != nb || self.bus_types.len() != nb {
            return Some(IndexSpace::Bus);
        }
        let branch_lens = [
            self.st.len(),
            self.i_from.len(),
            self.i_to.len(),
            self.vbranch.len(),
            self.loading.len(),
            self.losses.len(),
            self.flow_direction.len(),
        ];
        if branch_lens.iter().any(|&l| l != nbr) {
            return Some(IndexSpace::Branch);
        }
        if self.hvdc_losses.len() != ndc || self.hvdc_loading.len() != ndc {
            return Some(IndexSpace::Hvdc);
        }
        None
    }
}

/// Global, fixed-size result arrays indexed like the undecomposed network.
///
/// Slots of inactive elements keep their zero defaults. Each slot records
/// the island that wrote it, so a second island writing the same slot is
/// caught as an index map inconsistency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub bus_names: Vec<String>,
    pub branch_names: Vec<String>,
    pub transformer_names: Vec<String>,
    pub hvdc_names: Vec<String>,

    pub voltage: Vec<Complex64>,
    pub sbus: Vec<Complex64>,
    pub bus_types: Vec<BusType>,
    pub sf: Vec<Complex64>,
    pub st: Vec<Complex64>,
    pub i_from: Vec<Complex64>,
    pub i_to: Vec<Complex64>,
    pub vbranch: Vec<Complex64>,
    pub loading: Vec<f64>,
    pub losses: Vec<Complex64>,
    pub flow_direction: Vec<f64>,
    pub tap_module: Vec<f64>,
    pub hvdc_sent_power: Vec<f64>,
    pub hvdc_losses: Vec<f64>,
    pub hvdc_loading: Vec<f64>,

    reports: Vec<ConvergenceReport>,
    bus_owner: Vec<Option<usize>>,
    branch_owner: Vec<Option<usize>>,
    transformer_owner: Vec<Option<usize>>,
    hvdc_owner: Vec<Option<usize>>,
}

impl ResultSet {
    /// Zero-filled result arrays sized to `network`.
    pub fn new(network: &Network) -> Self {
        Self::with_names(
            network.bus_names(),
            network.branch_names(),
            network.transformer_names(),
            network.hvdc_names(),
        )
    }

    pub fn with_names(
        bus_names: Vec<String>,
        branch_names: Vec<String>,
        transformer_names: Vec<String>,
        hvdc_names: Vec<String>,
    ) -> Self {
        let (nb, nbr, ntr, ndc) = (
            bus_names.len(),
            branch_names.len(),
            transformer_names.len(),
            hvdc_names.len(),
        );
        let zero = Complex64::zero();
        Self {
            bus_names,
            branch_names,
            transformer_names,
            hvdc_names,
            voltage: vec![zero; nb],
            sbus: vec![zero; nb],
            bus_types: vec![BusType::PQ; nb],
            sf: vec![zero; nbr],
            st: vec![zero; nbr],
            i_from: vec![zero; nbr],
            i_to: vec![zero; nbr],
            vbranch: vec![zero; nbr],
            loading: vec![0.0; nbr],
            losses: vec![zero; nbr],
            flow_direction: vec![0.0; nbr],
            tap_module: vec![0.0; ntr],
            hvdc_sent_power: vec![0.0; ndc],
            hvdc_losses: vec![0.0; ndc],
            hvdc_loading: vec![0.0; ndc],
            reports: Vec::new(),
            bus_owner: vec![None; nb],
            branch_owner: vec![None; nbr],
            transformer_owner: vec![None; ntr],
            hvdc_owner: vec![None; ndc],
        }
    }

    /// Sized with generated names, for callers that have no network at hand.
    pub fn with_dims(n_buses: usize, n_branches: usize, n_transformers: usize, n_hvdc: usize) -> Self {
        let names = |prefix: &str, n: usize| (0..n).map(|k| format!("{prefix}{k}")).collect();
        Self::with_names(
            names("bus", n_buses),
            names("branch", n_branches),
            names("transformer", n_transformers),
            names("hvdc", n_hvdc),
        )
    }

    pub fn n_buses(&self) -> usize {
        self.voltage.len()
    }

    pub fn n_branches(&self) -> usize {
        self.sf.len()
    }

    /// Scatters an island's local arrays into the global ones and records
    /// its convergence report.
    ///
    /// All maps are checked before anything is written. Applying the same
    /// island again overwrites its slots and replaces its report.
    pub fn apply_from_island(&mut self, result: &IslandResult, maps: IslandIndices<'_>) -> Result<()> {
        let island = maps.island;
        if let Some(space) = result.ragged_space() {
            return Err(PowerFlowError::IndexMapInconsistency {
                island,
                space,
                index: 0,
                reason: "island result arrays differ in length".into(),
            });
        }
        check_map(&self.bus_owner, maps.buses, result.n_buses(), island, IndexSpace::Bus)?;
        check_map(&self.branch_owner, maps.branches, result.n_branches(), island, IndexSpace::Branch)?;
        check_map(
            &self.transformer_owner,
            maps.transformers,
            result.tap_module.len(),
            island,
            IndexSpace::Transformer,
        )?;
        check_map(&self.hvdc_owner, maps.hvdc, result.hvdc_sent_power.len(), island, IndexSpace::Hvdc)?;

        scatter(&mut self.voltage, &result.voltage, maps.buses);
        scatter(&mut self.sbus, &result.sbus, maps.buses);
        scatter(&mut self.bus_types, &result.bus_types, maps.buses);
        claim(&mut self.bus_owner, maps.buses, island);

        scatter(&mut self.sf, &result.sf, maps.branches);
        scatter(&mut self.st, &result.st, maps.branches);
        scatter(&mut self.i_from, &result.i_from, maps.branches);
        scatter(&mut self.i_to, &result.i_to, maps.branches);
        scatter(&mut self.vbranch, &result.vbranch, maps.branches);
        scatter(&mut self.loading, &result.loading, maps.branches);
        scatter(&mut self.losses, &result.losses, maps.branches);
        scatter(&mut self.flow_direction, &result.flow_direction, maps.branches);
        claim(&mut self.branch_owner, maps.branches, island);

        scatter(&mut self.tap_module, &result.tap_module, maps.transformers);
        claim(&mut self.transformer_owner, maps.transformers, island);

        scatter(&mut self.hvdc_sent_power, &result.hvdc_sent_power, maps.hvdc);
        scatter(&mut self.hvdc_losses, &result.hvdc_losses, maps.hvdc);
        scatter(&mut self.hvdc_loading, &result.hvdc_loading, maps.hvdc);
        claim(&mut self.hvdc_owner, maps.hvdc, island);

        let report = ConvergenceReport {
            island,
            ..result.report.clone()
        };
        match self.reports.iter_mut().find(|r| r.island == island) {
            Some(slot) => *slot = report,
            None => self.reports.push(report),
        }
        Ok(())
    }

    /// Per-island reports in processing order.
    pub fn reports(&self) -> &[ConvergenceReport] {
        &self.reports
    }

    /// True when every island converged; vacuously true with no islands.
    pub fn converged(&self) -> bool {
        self.reports.iter().all(|r| r.converged)
    }

    /// Worst error over all islands; 0.0 with no islands. A non-finite
    /// island error counts as infinite.
    pub fn error(&self) -> f64 {
        self.reports
            .iter()
            .map(|r| if r.error.is_finite() { r.error } else { f64::INFINITY })
            .fold(0.0, f64::max)
    }

    /// Island that wrote each bus slot, `None` for buses outside every island.
    pub fn bus_owners(&self) -> &[Option<usize>] {
        &self.bus_owner
    }

    pub fn branch_owners(&self) -> &[Option<usize>] {
        &self.branch_owner
    }

    pub fn voltage_module(&self) -> Vec<f64> {
        self.voltage.iter().map(|v| v.norm()).collect()
    }

    /// Bus voltage angle in degrees.
    pub fn voltage_angle(&self) -> Vec<f64> {
        self.voltage.iter().map(|v| v.arg().to_degrees()).collect()
    }
}

fn check_map(
    owners: &[Option<usize>],
    map: &[usize],
    local_len: usize,
    island: usize,
    space: IndexSpace,
) -> Result<()> {
    let inconsistent = |index: usize, reason: String| PowerFlowError::IndexMapInconsistency {
        island,
        space,
        index,
        reason,
    };
    if map.len() != local_len {
        return Err(inconsistent(
            map.len(),
            format!("map has {} entries but the island result has {local_len}", map.len()),
        ));
    }
    let mut seen = HashSet::with_capacity(map.len());
    for &global in map {
        if global >= owners.len() {
            return Err(inconsistent(global, format!("out of range (size {})", owners.len())));
        }
        if !seen.insert(global) {
            return Err(inconsistent(global, "duplicate global index".into()));
        }
        if let Some(owner) = owners[global] {
            if owner != island {
                return Err(inconsistent(global, format!("slot already written by island {owner}")));
            }
        }
    }
    Ok(())
}

fn scatter<T: Clone>(dst: &mut [T], src: &[T], map: &[usize]) {
    for (local, &global) in map.iter().enumerate() {
        dst[global] = src[local].clone();
    }
}

fn claim(owners: &mut [Option<usize>], map: &[usize], island: usize) {
    for &global in map {
        owners[global] = Some(island);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use approx::assert_relative_eq;

    use super::*;
    use crate::powerflow::SolverType;

    fn island_result(nb: usize, nbr: usize, converged: bool, error: f64) -> IslandResult {
        let v = Complex64::new(1.0, 0.0);
        IslandResult {
            voltage: vec![v; nb],
            sbus: vec![v; nb],
            bus_types: vec![BusType::PQ; nb],
            sf: vec![v; nbr],
            st: vec![v; nbr],
            i_from: vec![v; nbr],
            i_to: vec![v; nbr],
            vbranch: vec![v; nbr],
            loading: vec![0.5; nbr],
            losses: vec![v; nbr],
            flow_direction: vec![1.0; nbr],
            report: ConvergenceReport {
                method: Some(SolverType::NewtonRaphson),
                attempts: vec![SolverType::NewtonRaphson],
                converged,
                error,
                elapsed: Duration::from_micros(10),
                iterations: 3,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn maps<'a>(island: usize, buses: &'a [usize], branches: &'a [usize]) -> IslandIndices<'a> {
        IslandIndices {
            island,
            buses,
            branches,
            transformers: &[],
            hvdc: &[],
        }
    }

    #[test]
    fn empty_set_is_vacuously_converged() {
        let rs = ResultSet::with_dims(0, 0, 0, 0);
        assert!(rs.converged());
        assert_eq!(rs.error(), 0.0);
        assert!(rs.reports().is_empty());
    }

    #[test]
    fn scatter_follows_the_maps() {
        let mut rs = ResultSet::with_dims(4, 2, 0, 0);
        let mut a = island_result(2, 1, true, 1e-9);
        a.voltage = vec![Complex64::new(0.9, 0.0), Complex64::new(0.8, 0.0)];
        rs.apply_from_island(&a, maps(0, &[3, 1], &[1])).unwrap();
        assert_relative_eq!(rs.voltage[3].re, 0.9);
        assert_relative_eq!(rs.voltage[1].re, 0.8);
        assert_eq!(rs.voltage[0], Complex64::new(0.0, 0.0));
        assert_eq!(rs.bus_owners(), &[None, Some(0), None, Some(0)]);
        assert_relative_eq!(rs.loading[1], 0.5);
        assert_eq!(rs.loading[0], 0.0);
    }

    #[test]
    fn nan_island_error_is_worst() {
        let mut rs = ResultSet::with_dims(4, 2, 0, 0);
        rs.apply_from_island(&island_result(2, 1, true, 1e-9), maps(0, &[0, 1], &[0]))
            .unwrap();
        rs.apply_from_island(&island_result(2, 1, false, f64::NAN), maps(1, &[2, 3], &[1]))
            .unwrap();
        assert_eq!(rs.error(), f64::INFINITY);
    }

    #[test]
    fn global_status_is_and_of_islands_and_max_error() {
        let mut rs = ResultSet::with_dims(4, 2, 0, 0);
        rs.apply_from_island(&island_result(2, 1, true, 1e-9), maps(0, &[0, 1], &[0]))
            .unwrap();
        assert!(rs.converged());
        rs.apply_from_island(&island_result(2, 1, false, 0.3), maps(1, &[2, 3], &[1]))
            .unwrap();
        assert!(!rs.converged());
        assert_relative_eq!(rs.error(), 0.3);
        assert_eq!(rs.reports().len(), 2);
        assert_eq!(rs.reports()[1].island, 1);
    }

    #[test]
    fn flipping_one_report_flips_the_network() {
        for flipped in 0..3 {
            let mut rs = ResultSet::with_dims(3, 0, 0, 0);
            for island in 0..3 {
                let r = island_result(1, 0, island != flipped, 0.0);
                rs.apply_from_island(&r, maps(island, &[island], &[])).unwrap();
            }
            assert!(!rs.converged());
        }
    }

    #[test]
    fn reapplying_an_island_replaces_its_report() {
        let mut rs = ResultSet::with_dims(2, 0, 0, 0);
        rs.apply_from_island(&island_result(2, 0, false, 1.0), maps(0, &[0, 1], &[]))
            .unwrap();
        rs.apply_from_island(&island_result(2, 0, true, 1e-9), maps(0, &[0, 1], &[]))
            .unwrap();
        assert_eq!(rs.reports().len(), 1);
        assert!(rs.converged());
    }

    #[test]
    fn overlapping_islands_are_rejected() {
        let mut rs = ResultSet::with_dims(3, 0, 0, 0);
        rs.apply_from_island(&island_result(2, 0, true, 0.0), maps(0, &[0, 1], &[]))
            .unwrap();
        let err = rs
            .apply_from_island(&island_result(2, 0, true, 0.0), maps(1, &[1, 2], &[]))
            .unwrap_err();
        assert!(matches!(
            err,
            PowerFlowError::IndexMapInconsistency { island: 1, space: IndexSpace::Bus, index: 1, .. }
        ));
        // nothing from the rejected island was written
        assert_eq!(rs.bus_owners()[2], None);
        assert_eq!(rs.reports().len(), 1);
    }

    #[test]
    fn malformed_maps_are_rejected() {
        let mut rs = ResultSet::with_dims(2, 1, 0, 0);
        let r = island_result(2, 0, true, 0.0);
        assert!(rs.apply_from_island(&r, maps(0, &[0, 0], &[])).is_err());
        assert!(rs.apply_from_island(&r, maps(0, &[0, 5], &[])).is_err());
        assert!(rs.apply_from_island(&r, maps(0, &[0], &[])).is_err());
        assert!(rs.reports().is_empty());
    }
}
