use nalgebra::DVector;
use nalgebra_sparse::{CooMatrix, CscMatrix};
use num_complex::Complex64;

use super::{
    dsbus_dv::dSbus_dV,
    error::IslandDiagnostic,
    solver::Solve,
    sparse::push_block,
    system::SolveOutcome,
};

/// Newton-Raphson power flow in polar coordinates.
///
/// Buses must be ordered `[pv, pq, ref]`: the first `npv` entries are PV
/// buses, the next `npq` PQ buses, the rest reference buses whose voltage is
/// held. The mismatch is measured with the infinity norm over
/// `[ΔP(pv, pq), ΔQ(pq)]`.
///
/// The last iterate is always returned, converged or not.
#[allow(non_snake_case)]
#[allow(clippy::too_many_arguments)]
pub fn newton_pf<Solver: Solve>(
    Ybus: &CscMatrix<Complex64>,
    Sbus: &DVector<Complex64>,
    v_init: &DVector<Complex64>,
    npv: usize,
    npq: usize,
    tolerance: f64,
    max_iter: usize,
    solver: &mut Solver,
) -> SolveOutcome {
    let mut v = v_init.clone();
    let mut v_m = v.map(|e| e.norm());
    let mut v_a = v.map(|e| e.arg());

    let n_bus = npv + npq;
    let num_state = n_bus + npq;

    let mut F = DVector::zeros(num_state);
    let mis = mismatch(Ybus, Sbus, &v);
    assemble_f(&mut F, &mis, n_bus, npv);
    let mut error = inf_norm(&F);
    if error < tolerance {
        return SolveOutcome::converged(v, 0, error);
    }

    solver.reset();
    for iteration in 1..=max_iter {
        let v_norm = v.map(|e| Complex64::from_polar(1.0, e.arg()));
        let (dS_dVm, dS_dVa) = dSbus_dV(Ybus, &v, &v_norm);
        let jacobian = build_jacobian(&dS_dVm, &dS_dVa, npv, n_bus);

        let n = jacobian.nrows();
        let (mut Ap, mut Ai, mut Ax) = jacobian.disassemble();
        if let Err(e) = solver.solve(&mut Ap, &mut Ai, &mut Ax, F.as_mut_slice(), n) {
            return SolveOutcome::failed(v, iteration, error, IslandDiagnostic::LinearSolve(e.into()));
        }

        update_v(&mut v, &mut v_a, &mut v_m, &F, npv, n_bus);

        let mis = mismatch(Ybus, Sbus, &v);
        assemble_f(&mut F, &mis, n_bus, npv);
        error = inf_norm(&F);
        if error < tolerance {
            return SolveOutcome::converged(v, iteration, error);
        }
        if !error.is_finite() {
            return SolveOutcome::failed(
                v,
                iteration,
                error,
                IslandDiagnostic::NonConvergence { iterations: iteration },
            );
        }
    }
    SolveOutcome::failed(
        v,
        max_iter,
        error,
        IslandDiagnostic::NonConvergence { iterations: max_iter },
    )
}

/// Infinity norm; any non-finite entry makes it infinite.
pub(crate) fn inf_norm(f: &DVector<f64>) -> f64 {
    f.iter()
        .try_fold(0.0_f64, |m, x| x.is_finite().then(|| m.max(x.abs())))
        .unwrap_or(f64::INFINITY)
}

pub(crate) fn mismatch(
    ybus: &CscMatrix<Complex64>,
    sbus: &DVector<Complex64>,
    v: &DVector<Complex64>,
) -> DVector<Complex64> {
    v.component_mul(&(ybus * v).conjugate()) - sbus
}

#[inline(always)]
pub(crate) fn assemble_f(f: &mut DVector<f64>, mis: &DVector<Complex64>, n_bus: usize, npv: usize) {
    for k in 0..n_bus {
        f[k] = mis[k].re;
    }
    for k in npv..n_bus {
        f[n_bus + k - npv] = mis[k].im;
    }
}

#[inline(always)]
fn update_v(
    v: &mut DVector<Complex64>,
    v_a: &mut DVector<f64>,
    v_m: &mut DVector<f64>,
    dx: &DVector<f64>,
    npv: usize,
    n_bus: usize,
) {
    for k in 0..n_bus {
        v_a[k] -= dx[k];
    }
    for k in npv..n_bus {
        v_m[k] -= dx[n_bus + k - npv];
    }
    v.zip_zip_apply(v_m, v_a, |e, vm, va| *e = Complex64::from_polar(vm, va));
}

/// ```text
/// J = | Re dS/dθ[all, all]   Re dS/d|V|[all, pq] |
///     | Im dS/dθ[pq, all]    Im dS/d|V|[pq, pq]  |
/// ```
/// where `all` is the `pv ∪ pq` block.
#[inline(always)]
fn build_jacobian(
    ds_dvm: &CscMatrix<Complex64>,
    ds_dva: &CscMatrix<Complex64>,
    npv: usize,
    n_bus: usize,
) -> CscMatrix<f64> {
    let npq = n_bus - npv;
    let n = n_bus + npq;
    let mut jac = CooMatrix::new(n, n);
    jac.reserve(ds_dva.nnz() + ds_dvm.nnz());
    push_block(&mut jac, ds_dva, 0..n_bus, 0..n_bus, (0, 0), |v| v.re);
    push_block(&mut jac, ds_dvm, 0..n_bus, npv..n_bus, (0, n_bus), |v| v.re);
    push_block(&mut jac, ds_dva, npv..n_bus, 0..n_bus, (n_bus, 0), |v| v.im);
    push_block(&mut jac, ds_dvm, npv..n_bus, npv..n_bus, (n_bus, n_bus), |v| v.im);
    CscMatrix::from(&jac)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::basic::solver::DefaultSolver;

    fn ybus_two_bus(r: f64, x: f64) -> CscMatrix<Complex64> {
        let y = Complex64::new(r, x).inv();
        let mut coo = CooMatrix::new(2, 2);
        coo.push(0, 0, y);
        coo.push(1, 1, y);
        coo.push(0, 1, -y);
        coo.push(1, 0, -y);
        CscMatrix::from(&coo)
    }

    #[test]
    fn two_bus_load_converges() {
        // [pq, slack]
        let ybus = ybus_two_bus(0.01, 0.1);
        let sbus = DVector::from_vec(vec![Complex64::new(-1.0, -0.5), Complex64::new(0.0, 0.0)]);
        let v0 = DVector::from_element(2, Complex64::new(1.0, 0.0));
        let mut solver = DefaultSolver::default();
        let out = newton_pf(&ybus, &sbus, &v0, 0, 1, 1e-8, 20, &mut solver);
        assert!(out.converged, "{out:?}");
        assert!(out.iterations > 0 && out.iterations < 10);
        assert!(out.v[0].norm() < 1.0);
        assert_relative_eq!(out.v[1].re, 1.0);

        let s = out.v.component_mul(&(&ybus * &out.v).conjugate());
        assert_relative_eq!(s[0].re, -1.0, epsilon = 1e-7);
        assert_relative_eq!(s[0].im, -0.5, epsilon = 1e-7);
    }

    #[test]
    fn pv_bus_holds_its_magnitude() {
        // [pv, slack]
        let ybus = ybus_two_bus(0.0, 0.2);
        let sbus = DVector::from_vec(vec![Complex64::new(0.5, 0.0), Complex64::new(0.0, 0.0)]);
        let v0 = DVector::from_vec(vec![Complex64::new(1.03, 0.0), Complex64::new(1.0, 0.0)]);
        let mut solver = DefaultSolver::default();
        let out = newton_pf(&ybus, &sbus, &v0, 1, 0, 1e-8, 20, &mut solver);
        assert!(out.converged);
        assert_relative_eq!(out.v[0].norm(), 1.03, epsilon = 1e-12);
        assert!(out.v[0].arg() > 0.0);
    }

    #[test]
    fn reference_only_system_is_trivially_converged() {
        let ybus = CscMatrix::from(&CooMatrix::<Complex64>::new(1, 1));
        let sbus = DVector::from_element(1, Complex64::new(0.0, 0.0));
        let v0 = DVector::from_element(1, Complex64::new(1.0, 0.0));
        let mut solver = DefaultSolver::default();
        let out = newton_pf(&ybus, &sbus, &v0, 0, 0, 1e-8, 20, &mut solver);
        assert!(out.converged);
        assert_eq!(out.iterations, 0);
        assert_eq!(out.error, 0.0);
    }

    #[test]
    fn iteration_cap_is_respected() {
        // heavy load a single iteration cannot resolve
        let ybus = ybus_two_bus(0.01, 0.1);
        let sbus = DVector::from_vec(vec![Complex64::new(-3.0, -1.5), Complex64::new(0.0, 0.0)]);
        let v0 = DVector::from_element(2, Complex64::new(1.0, 0.0));
        let mut solver = DefaultSolver::default();
        let out = newton_pf(&ybus, &sbus, &v0, 0, 1, 1e-12, 1, &mut solver);
        assert!(!out.converged);
        assert_eq!(out.iterations, 1);
        assert!(matches!(out.diagnostic, Some(IslandDiagnostic::NonConvergence { iterations: 1 })));
    }
}
