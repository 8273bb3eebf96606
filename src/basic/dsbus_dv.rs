use nalgebra::DVector;
use nalgebra_sparse::CscMatrix;
use num_complex::Complex64;

use super::sparse::{Conjugate, diag};

/// Partial derivatives of the bus power injections `S = diag(V)·conj(Ybus·V)`
/// with respect to voltage magnitude and angle.
///
/// Returns `(dS_dVm, dS_dVa)`. `v_norm` is `V / |V|`.
///
/// From R. D. Zimmerman, "AC Power Flows, Generalized OPF Costs and their
/// Derivatives using Complex Matrix Notation", MATPOWER Technical Note 2, 2010.
#[allow(non_snake_case)]
pub fn dSbus_dV(
    Ybus: &CscMatrix<Complex64>,
    v: &DVector<Complex64>,
    v_norm: &DVector<Complex64>,
) -> (CscMatrix<Complex64>, CscMatrix<Complex64>) {
    let ibus = Ybus * v;
    let diagV = diag(v);
    let diagVnorm = diag(v_norm);
    let diagIbus = diag(&ibus);

    let dS_dVm = &diagV * (Ybus * &diagVnorm).conjugate() + diagIbus.conjugate() * &diagVnorm;
    let dS_dVa = &diagV * (diagIbus - Ybus * &diagV).conjugate() * Complex64::i();
    (dS_dVm, dS_dVa)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra_sparse::CooMatrix;

    use super::*;

    fn two_bus_ybus() -> CscMatrix<Complex64> {
        let y = Complex64::new(0.01, 0.1).inv();
        let mut coo = CooMatrix::new(2, 2);
        coo.push(0, 0, y);
        coo.push(1, 1, y);
        coo.push(0, 1, -y);
        coo.push(1, 0, -y);
        CscMatrix::from(&coo)
    }

    fn injections(ybus: &CscMatrix<Complex64>, v: &DVector<Complex64>) -> DVector<Complex64> {
        v.component_mul(&(ybus * v).conjugate())
    }

    #[test]
    fn angle_derivative_matches_finite_difference() {
        let ybus = two_bus_ybus();
        let v = DVector::from_vec(vec![
            Complex64::from_polar(1.0, 0.0),
            Complex64::from_polar(0.97, -0.05),
        ]);
        let v_norm = v.map(|e| e / e.norm());
        let (_, dva) = dSbus_dV(&ybus, &v, &v_norm);

        let h = 1e-7;
        let mut vp = v.clone();
        vp[1] = Complex64::from_polar(0.97, -0.05 + h);
        let fd = (injections(&ybus, &vp) - injections(&ybus, &v)) / Complex64::new(h, 0.0);

        let col: Vec<(usize, Complex64)> = dva
            .triplet_iter()
            .filter(|(_, c, _)| *c == 1)
            .map(|(r, _, v)| (r, *v))
            .collect();
        for (r, val) in col {
            assert_relative_eq!(val.re, fd[r].re, epsilon = 1e-4);
            assert_relative_eq!(val.im, fd[r].im, epsilon = 1e-4);
        }
    }
}
