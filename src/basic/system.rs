//! Per-island numerical system: admittance matrices, specified injections
//! and bus classification, all in solve order.
//!
//! Solve order places PV buses first, then PQ buses, then the slack, which is
//! the layout the Newton and DC solvers slice their matrices by.

pub mod admittance;

use nalgebra::DVector;
use nalgebra_sparse::CscMatrix;
use num_complex::Complex64;
use tracing::debug;

use self::admittance::{AdmittanceMatrices, BranchAdmittance, PlacedBranch};
use super::{
    elements::BusType,
    error::{IslandDiagnostic, PowerFlowError, Result},
    island::Island,
    network::Network,
};

/// Final state of one solve attempt. `v` is in solve order.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOutcome {
    pub v: DVector<Complex64>,
    pub iterations: usize,
    /// Largest power mismatch in p.u. at the final iterate.
    pub error: f64,
    pub converged: bool,
    pub diagnostic: Option<IslandDiagnostic>,
}

impl SolveOutcome {
    pub fn converged(v: DVector<Complex64>, iterations: usize, error: f64) -> Self {
        Self {
            v,
            iterations,
            error,
            converged: true,
            diagnostic: None,
        }
    }

    pub fn failed(
        v: DVector<Complex64>,
        iterations: usize,
        error: f64,
        diagnostic: IslandDiagnostic,
    ) -> Self {
        Self {
            v,
            iterations,
            error,
            converged: false,
            diagnostic: Some(diagnostic),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IslandSystem {
    pub island: usize,
    pub sbase: f64,
    /// Solve position → local bus index.
    pub order: Vec<usize>,
    /// Local bus index → solve position.
    pub position: Vec<usize>,
    pub npv: usize,
    pub npq: usize,
    /// False when no bus is tagged slack and a provisional reference was
    /// chosen instead.
    pub has_slack: bool,
    /// Effective bus types in local order.
    pub bus_types: Vec<BusType>,
    pub ybus: CscMatrix<Complex64>,
    pub yf: CscMatrix<Complex64>,
    pub yt: CscMatrix<Complex64>,
    pub bbus: CscMatrix<f64>,
    /// Fixed active injections of the DC formulation: phase shifters and
    /// shunt conductance.
    pub p_shift: DVector<f64>,
    /// Specified injections in p.u.
    pub sbus: DVector<Complex64>,
    pub v0: DVector<Complex64>,
    /// Branch end positions in solve order.
    pub branch_from: Vec<usize>,
    pub branch_to: Vec<usize>,
}

impl IslandSystem {
    pub fn n_buses(&self) -> usize {
        self.order.len()
    }

    pub fn n_branches(&self) -> usize {
        self.branch_from.len()
    }

    /// Number of non-reference buses, i.e. the leading block of every solve
    /// order matrix.
    pub fn n_state_buses(&self) -> usize {
        self.npv + self.npq
    }

    /// Computed bus injections `V·conj(Ybus·V)` in p.u., solve order.
    pub fn power_injections(&self, v: &DVector<Complex64>) -> DVector<Complex64> {
        v.component_mul(&(&self.ybus * v).conjugate())
    }

    /// Reorders a solve order vector into local bus order.
    pub fn to_local_order<T: Copy + Default>(&self, x: &[T]) -> Vec<T> {
        let mut out = vec![T::default(); x.len()];
        for (k, &local) in self.order.iter().enumerate() {
            out[local] = x[k];
        }
        out
    }

    /// Builds the numerical system of one island.
    pub fn compile(network: &Network, island: &Island) -> Result<Self> {
        let n = island.n_buses();
        let sbase = network.sbase();
        let buses = network.buses();

        let mut bus_types: Vec<BusType> = island
            .buses
            .local_to_global()
            .iter()
            .map(|&g| buses[g].bus_type)
            .collect();
        let mut vset = vec![None; n];
        let mut s_spec = vec![Complex64::default(); n];
        let mut y_shunt = vec![Complex64::default(); n];

        for &inj in island.injections.local_to_global() {
            let injection = &network.injections()[inj];
            let global = network.bus_index(injection.bus).ok_or_else(|| {
                PowerFlowError::DanglingReference {
                    element: injection.name.clone(),
                    bus: injection.bus,
                }
            })?;
            let local = island.local_bus(global)?;
            s_spec[local] += injection.power_injection() / sbase;
            y_shunt[local] += injection.shunt_admittance() / sbase;
            if let Some(v) = injection.voltage_setpoint() {
                vset[local].get_or_insert(v);
                if bus_types[local] == BusType::PQ {
                    bus_types[local] = BusType::PV;
                }
            }
        }

        for (k, link) in network.hvdc_links().iter().enumerate() {
            if !link.active {
                continue;
            }
            let (f, t) = network.hvdc_buses(k)?;
            if !(buses[f].active && buses[t].active) {
                continue;
            }
            if let Some(local) = island.buses.to_local(f) {
                s_spec[local] -= Complex64::new(link.p_set / sbase, 0.0);
            }
            if let Some(local) = island.buses.to_local(t) {
                s_spec[local] += Complex64::new(link.received_power() / sbase, 0.0);
            }
        }

        let has_slack = bus_types.contains(&BusType::Slack);
        if !has_slack && n > 0 {
            let reference = bus_types.iter().position(|t| *t == BusType::PV).unwrap_or(0);
            bus_types[reference] = BusType::Slack;
            debug!(island = island.id, bus = reference, "provisional reference bus");
        }

        let mut order = Vec::with_capacity(n);
        for kind in [BusType::PV, BusType::PQ, BusType::Slack] {
            order.extend((0..n).filter(|&i| bus_types[i] == kind));
        }
        let npv = bus_types.iter().filter(|t| **t == BusType::PV).count();
        let npq = bus_types.iter().filter(|t| **t == BusType::PQ).count();
        let mut position = vec![0; n];
        for (k, &local) in order.iter().enumerate() {
            position[local] = k;
        }

        let mut placed = Vec::with_capacity(island.n_branches());
        let mut dc = Vec::with_capacity(island.n_branches());
        let mut p_shift = DVector::zeros(n);
        let mut branch_from = Vec::with_capacity(island.n_branches());
        let mut branch_to = Vec::with_capacity(island.n_branches());
        for &k in island.branches.local_to_global() {
            let branch = &network.branches()[k];
            let (gf, gt) = network.branch_buses(k)?;
            let (f, t) = (position[island.local_bus(gf)?], position[island.local_bus(gt)?]);
            placed.push(PlacedBranch {
                from: f,
                to: t,
                y: BranchAdmittance::from(branch),
            });
            if branch.x.abs() > 0.0 {
                let m = if branch.tap_module > 0.0 { branch.tap_module } else { 1.0 };
                let b = 1.0 / (branch.x * m);
                dc.push((f, t, b));
                let p = -b * branch.tap_angle;
                p_shift[f] -= p;
                p_shift[t] += p;
            }
            branch_from.push(f);
            branch_to.push(t);
        }

        let shunts: Vec<Complex64> = order.iter().map(|&l| y_shunt[l]).collect();
        let AdmittanceMatrices { ybus, yf, yt } = admittance::assemble(&placed, &shunts);
        let bbus = admittance::assemble_bbus(&dc, n);

        for (k, ysh) in shunts.iter().enumerate() {
            p_shift[k] -= ysh.re;
        }
        let sbus = DVector::from_iterator(n, order.iter().map(|&l| s_spec[l]));
        let v0 = DVector::from_iterator(
            n,
            order.iter().map(|&l| match bus_types[l] {
                BusType::PQ => Complex64::new(1.0, 0.0),
                _ => Complex64::new(vset[l].unwrap_or(1.0), 0.0),
            }),
        );

        Ok(Self {
            island: island.id,
            sbase,
            order,
            position,
            npv,
            npq,
            has_slack,
            bus_types,
            ybus,
            yf,
            yt,
            bbus,
            p_shift,
            sbus,
            v0,
            branch_from,
            branch_to,
        })
    }
}
