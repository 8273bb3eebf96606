use nalgebra::DVector;
use nalgebra_sparse::{CscMatrix, CsrMatrix};
use num_complex::Complex64;
use num_traits::Zero;

use super::{
    error::IslandDiagnostic,
    newtonpf::{assemble_f, inf_norm, mismatch},
    system::SolveOutcome,
};

/// Gauss-Seidel power flow, same bus ordering as [`newton_pf`].
///
/// Each sweep updates PV and PQ buses in order, using the freshest voltages.
/// PV buses have their reactive injection recomputed and their magnitude
/// restored after the update.
///
/// [`newton_pf`]: super::newton_pf
#[allow(non_snake_case)]
pub fn gauss_seidel_pf(
    Ybus: &CscMatrix<Complex64>,
    Sbus: &DVector<Complex64>,
    v_init: &DVector<Complex64>,
    npv: usize,
    npq: usize,
    tolerance: f64,
    max_iter: usize,
) -> SolveOutcome {
    let n_bus = npv + npq;
    let mut v = v_init.clone();
    let mut F = DVector::zeros(n_bus + npq);
    assemble_f(&mut F, &mismatch(Ybus, Sbus, &v), n_bus, npv);
    let mut error = inf_norm(&F);
    if error < tolerance {
        return SolveOutcome::converged(v, 0, error);
    }

    let ycsr = CsrMatrix::from(Ybus);
    for iteration in 1..=max_iter {
        for k in 0..n_bus {
            let row = ycsr.row(k);
            let mut ykk = Complex64::zero();
            let mut others = Complex64::zero();
            for (&j, y) in row.col_indices().iter().zip(row.values()) {
                if j == k {
                    ykk += *y;
                } else {
                    others += *y * v[j];
                }
            }
            if ykk.is_zero() {
                return SolveOutcome::failed(
                    v,
                    iteration,
                    error,
                    IslandDiagnostic::LinearSolve(format!("zero self admittance at position {k}")),
                );
            }

            let s = if k < npv {
                let q = (v[k] * (others + ykk * v[k]).conj()).im;
                Complex64::new(Sbus[k].re, q)
            } else {
                Sbus[k]
            };
            let vk = ((s / v[k]).conj() - others) / ykk;
            v[k] = if k < npv {
                Complex64::from_polar(v_init[k].norm(), vk.arg())
            } else {
                vk
            };
        }

        assemble_f(&mut F, &mismatch(Ybus, Sbus, &v), n_bus, npv);
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

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra_sparse::CooMatrix;

    use super::*;

    #[test]
    fn agrees_with_the_analytic_two_bus_solution() {
        let y = Complex64::new(0.01, 0.1).inv();
        let mut coo = CooMatrix::new(2, 2);
        coo.push(0, 0, y);
        coo.push(1, 1, y);
        coo.push(0, 1, -y);
        coo.push(1, 0, -y);
        let ybus = CscMatrix::from(&coo);
        let sbus = DVector::from_vec(vec![Complex64::new(-0.5, -0.2), Complex64::new(0.0, 0.0)]);
        let v0 = DVector::from_element(2, Complex64::new(1.0, 0.0));

        let out = gauss_seidel_pf(&ybus, &sbus, &v0, 0, 1, 1e-9, 200);
        assert!(out.converged, "{out:?}");
        let s = out.v.component_mul(&(&ybus * &out.v).conjugate());
        assert_relative_eq!(s[0].re, -0.5, epsilon = 1e-8);
        assert_relative_eq!(s[0].im, -0.2, epsilon = 1e-8);
    }
}
