use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::ResultSet;
use crate::basic::error::IslandDiagnostic;

/// Penalty weights of the three violation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViolationWeights {
    pub overload: f64,
    pub overvoltage: f64,
    pub undervoltage: f64,
}

impl Default for ViolationWeights {
    fn default() -> Self {
        Self {
            overload: 1.0,
            overvoltage: 1.0,
            undervoltage: 1.0,
        }
    }
}

/// Overloads and voltage band violations of one result snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LimitViolations {
    /// Branches with loading above 1.0.
    pub overloads: Vec<usize>,
    /// `loading - 1` for each entry of `overloads`.
    pub overload_excess: Vec<f64>,
    pub overvoltage: Vec<usize>,
    /// `|V| - Vmax` for each entry of `overvoltage`.
    pub overvoltage_excess: Vec<f64>,
    pub undervoltage: Vec<usize>,
    /// `Vmin - |V|` for each entry of `undervoltage`.
    pub undervoltage_excess: Vec<f64>,
    /// Endpoints of overloaded branches plus every out-of-band bus; a hint for
    /// siting corrective storage.
    pub useful_for_storage: BTreeSet<usize>,
    /// Islands solved without a slack bus. Their voltages are relative to a
    /// provisional reference and should not be trusted for the checks above.
    pub no_slack_islands: Vec<usize>,
    pub penalty: f64,
}

impl LimitViolations {
    pub fn is_empty(&self) -> bool {
        self.overloads.is_empty() && self.overvoltage.is_empty() && self.undervoltage.is_empty()
    }
}

impl ResultSet {
    /// Scans the current results for overloads and voltage band violations.
    ///
    /// `branch_from`/`branch_to` give each branch's end buses in global
    /// numbering; `vmax`/`vmin` are per-bus limits in p.u. Buses that no
    /// island wrote (inactive ones) are not checked.
    pub fn check_limits(
        &self,
        branch_from: &[usize],
        branch_to: &[usize],
        vmax: &[f64],
        vmin: &[f64],
        weights: ViolationWeights,
    ) -> LimitViolations {
        let mut out = LimitViolations::default();

        for (k, loading) in self.loading.iter().enumerate() {
            let loading = loading.abs();
            if loading > 1.0 {
                out.overloads.push(k);
                out.overload_excess.push(loading - 1.0);
                if let (Some(&f), Some(&t)) = (branch_from.get(k), branch_to.get(k)) {
                    out.useful_for_storage.insert(f);
                    out.useful_for_storage.insert(t);
                }
            }
        }

        for (i, v) in self.voltage.iter().enumerate() {
            if self.bus_owners().get(i).copied().flatten().is_none() {
                continue;
            }
            let vm = v.norm();
            if let Some(&hi) = vmax.get(i) {
                if vm > hi {
                    out.overvoltage.push(i);
                    out.overvoltage_excess.push(vm - hi);
                    out.useful_for_storage.insert(i);
                }
            }
            if let Some(&lo) = vmin.get(i) {
                if vm < lo {
                    out.undervoltage.push(i);
                    out.undervoltage_excess.push(lo - vm);
                    out.useful_for_storage.insert(i);
                }
            }
        }

        out.no_slack_islands = self
            .reports()
            .iter()
            .filter(|r| r.has_diagnostic(&IslandDiagnostic::NoSlackBus))
            .map(|r| r.island)
            .collect();

        let sum = |v: &[f64]| v.iter().sum::<f64>();
        out.penalty = (weights.overload * sum(&out.overload_excess)
            + weights.overvoltage * sum(&out.overvoltage_excess)
            + weights.undervoltage * sum(&out.undervoltage_excess))
        .abs();
        out
    }
}
