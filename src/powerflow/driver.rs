#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{PowerFlowConfig, solve_island};
use crate::{
    basic::{
        error::Result,
        island::{Island, decompose},
        network::Network,
    },
    results::{IslandResult, LimitViolations, ResultSet},
};

/// Aggregated results plus the limit check run on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerFlowOutcome {
    pub results: ResultSet,
    pub violations: LimitViolations,
}

impl PowerFlowOutcome {
    pub fn converged(&self) -> bool {
        self.results.converged()
    }
}

/// Runs decomposition, per-island solves, aggregation and the limit check.
#[derive(Debug, Clone, Default)]
pub struct PowerFlowDriver {
    config: PowerFlowConfig,
}

impl PowerFlowDriver {
    pub fn new(config: PowerFlowConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PowerFlowConfig {
        &self.config
    }

    pub fn run(&self, network: &Network) -> Result<PowerFlowOutcome> {
        self.config.validate()?;
        network.validate()?;
        let islands = decompose(network)?;
        info!(
            network = %network.name,
            buses = network.n_buses(),
            branches = network.n_branches(),
            islands = islands.len(),
            "power flow started"
        );

        let solved = self.solve_islands(network, &islands)?;

        let mut results = ResultSet::new(network);
        for (island, result) in islands.iter().zip(&solved) {
            results.apply_from_island(result, island.indices())?;
        }

        let (from, to) = network.branch_endpoints()?;
        let (vmax, vmin) = network.voltage_limits();
        let violations = results.check_limits(&from, &to, &vmax, &vmin, self.config.weights);

        if !violations.no_slack_islands.is_empty() {
            warn!(islands = ?violations.no_slack_islands, "limit check includes islands without a slack bus");
        }
        info!(
            converged = results.converged(),
            error = results.error(),
            penalty = violations.penalty,
            "power flow finished"
        );
        Ok(PowerFlowOutcome { results, violations })
    }

    fn solve_islands(&self, network: &Network, islands: &[Island]) -> Result<Vec<IslandResult>> {
        #[cfg(feature = "parallel")]
        {
            if self.config.parallel {
                return islands
                    .par_iter()
                    .map(|island| solve_island(network, island, &self.config))
                    .collect();
            }
        }
        islands
            .iter()
            .map(|island| solve_island(network, island, &self.config))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::{
        basic::error::IslandDiagnostic,
        results::ViolationWeights,
        testcases,
    };

    fn sequential() -> PowerFlowDriver {
        PowerFlowDriver::new(PowerFlowConfig {
            parallel: false,
            ..Default::default()
        })
    }

    #[test]
    fn two_bus_network_converges_within_limits() {
        let net = testcases::two_bus().unwrap();
        let out = sequential().run(&net).unwrap();
        assert!(out.converged());
        assert_eq!(out.results.reports().len(), 1);
        let vm = out.results.voltage_module();
        assert!(vm[1] < 1.0);
        assert!(out.results.loading[0] > 0.0);
        assert_eq!(out.violations.penalty, 0.0);
        assert!(out.violations.no_slack_islands.is_empty());
    }

    #[test]
    fn disconnected_pairs_give_two_islands() {
        let net = testcases::two_pairs().unwrap();
        let out = sequential().run(&net).unwrap();
        assert_eq!(out.results.reports().len(), 2);
        assert!(out.results.voltage.iter().all(|v| v.norm() > 0.0));
        assert_eq!(out.results.voltage.len(), 4);
        assert!(out.converged());
    }

    #[test]
    fn island_without_slack_fails_alone() {
        let net = testcases::pair_and_no_slack_pair().unwrap();
        let out = sequential().run(&net).unwrap();
        let reports = out.results.reports();
        assert_eq!(reports.len(), 2);
        assert!(reports[0].converged);
        assert!(!reports[1].converged);
        assert!(reports[1].error.is_infinite());
        assert!(reports[1].has_diagnostic(&IslandDiagnostic::NoSlackBus));
        assert!(!out.converged());
        assert!(out.results.error().is_infinite());
        assert_eq!(out.violations.no_slack_islands, vec![reports[1].island]);
    }

    #[test]
    fn every_active_slot_is_written_once() {
        let net = testcases::five_bus().unwrap();
        let islands = decompose(&net).unwrap();
        let mut bus_writes = vec![0; net.n_buses()];
        let mut branch_writes = vec![0; net.n_branches()];
        for island in &islands {
            for &g in island.buses.local_to_global() {
                bus_writes[g] += 1;
            }
            for &g in island.branches.local_to_global() {
                branch_writes[g] += 1;
            }
        }
        for (k, bus) in net.buses().iter().enumerate() {
            assert_eq!(bus_writes[k], usize::from(bus.active), "bus {k}");
        }

        let out = sequential().run(&net).unwrap();
        for (k, owner) in out.results.bus_owners().iter().enumerate() {
            assert_eq!(owner.is_some(), bus_writes[k] == 1);
        }
        for (k, owner) in out.results.branch_owners().iter().enumerate() {
            assert_eq!(owner.is_some(), branch_writes[k] == 1);
        }
    }

    #[test]
    fn five_bus_network_balances_power() {
        let net = testcases::five_bus().unwrap();
        let out = sequential().run(&net).unwrap();
        assert!(out.converged(), "{}", out.results.convergence_table());
        let rs = &out.results;
        // bus injections equal the sum of branch end flows
        let mut flows = vec![num_complex::Complex64::default(); net.n_buses()];
        let (from, to) = net.branch_endpoints().unwrap();
        for k in 0..net.n_branches() {
            flows[from[k]] += rs.sf[k];
            flows[to[k]] += rs.st[k];
        }
        for (i, bus) in net.buses().iter().enumerate() {
            if !bus.active {
                continue;
            }
            // power absorbed by shunts is not a branch flow
            let shunt: num_complex::Complex64 = net
                .injections()
                .iter()
                .filter(|inj| inj.active && net.bus_index(inj.bus) == Some(i))
                .map(|inj| inj.shunt_admittance().conj() * rs.voltage[i].norm_sqr())
                .sum();
            let injected = rs.sbus[i] - shunt;
            assert_relative_eq!(injected.re, flows[i].re, epsilon = 1e-6);
            assert_relative_eq!(injected.im, flows[i].im, epsilon = 1e-6);
        }
        assert!(rs.tap_module.iter().any(|m| (*m - 1.0).abs() > 1e-9));
        assert!(rs.hvdc_sent_power[0] > 0.0);
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let net = testcases::two_pairs().unwrap();
        let seq = sequential().run(&net).unwrap();
        let par = PowerFlowDriver::default().run(&net).unwrap();
        assert_eq!(seq.results.voltage, par.results.voltage);
        assert_eq!(
            seq.results.reports().iter().map(|r| r.island).collect::<Vec<_>>(),
            par.results.reports().iter().map(|r| r.island).collect::<Vec<_>>()
        );
    }

    #[test]
    fn empty_network_is_vacuously_converged() {
        let out = sequential().run(&Network::default()).unwrap();
        assert!(out.converged());
        assert_eq!(out.results.error(), 0.0);
        assert!(out.results.reports().is_empty());
        assert_eq!(out.violations.penalty, 0.0);
    }

    #[test]
    fn overloaded_line_is_penalised() {
        let mut net = testcases::two_bus().unwrap();
        net.branch_mut(0).unwrap().rate = 50.0;
        let driver = PowerFlowDriver::new(PowerFlowConfig {
            parallel: false,
            weights: ViolationWeights {
                overload: 1.0,
                overvoltage: 0.0,
                undervoltage: 0.0,
            },
            ..Default::default()
        });
        let out = driver.run(&net).unwrap();
        assert_eq!(out.violations.overloads, vec![0]);
        assert_relative_eq!(out.violations.penalty, out.results.loading[0] - 1.0, epsilon = 1e-12);
        assert!(out.violations.useful_for_storage.contains(&1));
    }
}
