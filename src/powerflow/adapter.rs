use std::time::Instant;

use num_complex::Complex64;
use tracing::{debug, info, warn};

use super::{PowerFlowConfig, SolveOptions, SolverType};
use crate::{
    basic::{
        error::{IslandDiagnostic, PowerFlowError, Result},
        island::Island,
        network::Network,
        system::{IslandSystem, SolveOutcome},
    },
    results::{ConvergenceReport, IslandResult},
};

/// Solves one island with the configured strategies and derives its local
/// results.
///
/// Strategies run in order until one converges. When none does, the attempt
/// with the smallest mismatch is kept. Errors are structural only; numerical
/// failure is reported on the returned [`ConvergenceReport`].
pub fn solve_island(network: &Network, island: &Island, config: &PowerFlowConfig) -> Result<IslandResult> {
    let system = IslandSystem::compile(network, island)?;
    let options = SolveOptions::from(config);

    let mut attempts = Vec::with_capacity(config.strategies.len());
    let mut iterations = 0;
    let mut best: Option<(SolverType, SolveOutcome)> = None;

    let start = Instant::now();
    for &kind in &config.strategies {
        let outcome = kind.solver().solve(&system, &options);
        attempts.push(kind);
        iterations += outcome.iterations;
        debug!(
            island = island.id,
            method = %kind,
            converged = outcome.converged,
            iterations = outcome.iterations,
            error = outcome.error,
            "strategy finished"
        );
        let done = outcome.converged;
        let keep = match &best {
            None => true,
            Some((_, kept)) => done || outcome.error < kept.error,
        };
        if keep {
            best = Some((kind, outcome));
        }
        if done {
            break;
        }
    }
    let elapsed = start.elapsed();

    let Some((method, outcome)) = best else {
        return Err(PowerFlowError::InvalidConfig("no solving strategy given".into()));
    };

    let mut report = ConvergenceReport {
        island: island.id,
        method: Some(method),
        attempts,
        converged: outcome.converged,
        error: outcome.error,
        elapsed,
        iterations,
        diagnostics: outcome.diagnostic.iter().cloned().collect(),
    };
    if !system.has_slack {
        report.converged = false;
        report.error = f64::INFINITY;
        report.diagnostics.insert(0, IslandDiagnostic::NoSlackBus);
    }

    info!(
        island = island.id,
        method = %method,
        converged = report.converged,
        iterations = report.iterations,
        error = report.error,
        elapsed_ms = elapsed.as_secs_f64() * 1e3,
        "island solved"
    );
    for diagnostic in &report.diagnostics {
        warn!(island = island.id, %diagnostic, "island diagnostic");
    }

    island_result(network, island, &system, &outcome, report)
}

fn island_result(
    network: &Network,
    island: &Island,
    system: &IslandSystem,
    outcome: &SolveOutcome,
    report: ConvergenceReport,
) -> Result<IslandResult> {
    let sbase = system.sbase;
    let v = &outcome.v;
    let s_calc: Vec<Complex64> = system.power_injections(v).iter().map(|s| *s * sbase).collect();
    let i_from = &system.yf * v;
    let i_to = &system.yt * v;

    let nbr = island.n_branches();
    let mut result = IslandResult {
        voltage: system.to_local_order(v.as_slice()),
        sbus: system.to_local_order(&s_calc),
        bus_types: system.bus_types.clone(),
        sf: Vec::with_capacity(nbr),
        st: Vec::with_capacity(nbr),
        i_from: i_from.iter().copied().collect(),
        i_to: i_to.iter().copied().collect(),
        vbranch: Vec::with_capacity(nbr),
        loading: Vec::with_capacity(nbr),
        losses: Vec::with_capacity(nbr),
        flow_direction: Vec::with_capacity(nbr),
        report,
        ..Default::default()
    };

    for (k, &global) in island.branches.local_to_global().iter().enumerate() {
        let (f, t) = (system.branch_from[k], system.branch_to[k]);
        let sf = v[f] * i_from[k].conj() * sbase;
        let st = v[t] * i_to[k].conj() * sbase;
        let rate = network.branches()[global].rate;
        result.sf.push(sf);
        result.st.push(st);
        result.vbranch.push(v[f] - v[t]);
        result.losses.push(sf + st);
        result.loading.push(if rate > 0.0 { sf.norm().max(st.norm()) / rate } else { 0.0 });
        result.flow_direction.push(if sf.re == 0.0 { 0.0 } else { sf.re.signum() });
    }

    let transformer_branches = network.transformer_branches();
    result.tap_module = island
        .transformers
        .local_to_global()
        .iter()
        .map(|&tr| {
            transformer_branches
                .get(tr)
                .map(|&k| network.branches()[k].tap_module)
                .ok_or(PowerFlowError::UnknownElement {
                    kind: "transformer",
                    index: tr,
                })
        })
        .collect::<Result<_>>()?;

    for &k in island.hvdc.local_to_global() {
        let link = &network.hvdc_links()[k];
        result.hvdc_sent_power.push(link.p_set);
        result.hvdc_losses.push(link.losses());
        result.hvdc_loading.push(link.loading());
    }

    Ok(result)
}
