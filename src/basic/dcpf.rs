use nalgebra::DVector;
use num_complex::Complex64;

use super::{
    error::IslandDiagnostic,
    newtonpf::inf_norm,
    solver::Solve,
    sparse::leading_block,
    system::{IslandSystem, SolveOutcome},
};

/// Linear DC power flow: lossless branches, flat magnitudes, small angles.
///
/// Solves `B[s, s]·θ[s] = P[s] - B[s, ref]·θ[ref]` on the state buses `s`.
/// Voltage magnitudes are taken from the initial guess.
pub fn dc_pf<Solver: Solve>(system: &IslandSystem, solver: &mut Solver) -> SolveOutcome {
    let n = system.n_buses();
    let ns = system.n_state_buses();
    let theta_init = system.v0.map(|e| e.arg());

    let mut rhs = DVector::from_fn(ns, |k, _| system.sbus[k].re + system.p_shift[k]);
    for (r, c, b) in system.bbus.triplet_iter() {
        if r < ns && c >= ns {
            rhs[r] -= b * theta_init[c];
        }
    }
    let expected = rhs.clone();

    let b_ss = leading_block(&system.bbus, ns);
    let (mut ap, mut ai, mut ax) = b_ss.clone().disassemble();
    solver.reset();
    if let Err(e) = solver.solve(&mut ap, &mut ai, &mut ax, rhs.as_mut_slice(), ns) {
        return SolveOutcome::failed(system.v0.clone(), 1, f64::INFINITY, IslandDiagnostic::LinearSolve(e.into()));
    }

    let residual = inf_norm(&(&b_ss * &rhs - expected));
    let v = DVector::from_fn(n, |k, _| {
        let theta = if k < ns { rhs[k] } else { theta_init[k] };
        Complex64::from_polar(system.v0[k].norm(), theta)
    });
    SolveOutcome::converged(v, 1, residual)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::basic::{elements::*, island::decompose, network::Network, solver::DefaultSolver};

    #[test]
    fn angle_follows_susceptance() {
        let mut net = Network::default();
        net.add_bus(Bus::new(0, "slack", 10.0).with_type(BusType::Slack))
            .unwrap();
        net.add_bus(Bus::new(1, "load", 10.0)).unwrap();
        net.add_branch(Branch::line("l", 0, 1, 0.0, 0.1)).unwrap();
        net.add_injection(Injection::load("d", 1, 50.0, 0.0)).unwrap();
        let island = &decompose(&net).unwrap()[0];
        let sys = IslandSystem::compile(&net, island).unwrap();

        let out = dc_pf(&sys, &mut DefaultSolver::default());
        assert!(out.converged);
        // θ = -P·x = -0.5·0.1
        assert_relative_eq!(out.v[0].arg(), -0.05, epsilon = 1e-12);
        assert_relative_eq!(out.v[1].arg(), 0.0);
    }
}
