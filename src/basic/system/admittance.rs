use nalgebra_sparse::{CooMatrix, CscMatrix};
use num_complex::Complex64;
use num_traits::Zero;

use crate::basic::elements::Branch;

/// Primitive two-port admittances of a pi-model branch with a complex tap on
/// the from side:
///
/// ```text
/// Yff = (ys + yc/2) / m²      Yft = -ys / conj(τ)
/// Ytf = -ys / τ               Ytt =  ys + yc/2
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BranchAdmittance {
    pub yff: Complex64,
    pub yft: Complex64,
    pub ytf: Complex64,
    pub ytt: Complex64,
}

impl From<&Branch> for BranchAdmittance {
    fn from(branch: &Branch) -> Self {
        let ys = branch.series_admittance();
        let yc = Complex64::new(branch.g, branch.b);
        let tap = branch.complex_tap();
        let ytt = ys + yc * 0.5;
        Self {
            yff: ytt / tap.norm_sqr(),
            yft: -ys / tap.conj(),
            ytf: -ys / tap,
            ytt,
        }
    }
}

/// Branch admittances placed between local bus indices.
#[derive(Debug, Clone, Copy)]
pub struct PlacedBranch {
    pub from: usize,
    pub to: usize,
    pub y: BranchAdmittance,
}

/// Nodal admittance matrix and the from/to branch admittance matrices
/// (`If = Yf·V`, `It = Yt·V`).
#[derive(Debug, Clone)]
pub struct AdmittanceMatrices {
    pub ybus: CscMatrix<Complex64>,
    pub yf: CscMatrix<Complex64>,
    pub yt: CscMatrix<Complex64>,
}

/// Assembles `Ybus = Cfᵀ·Yf + Ctᵀ·Yt + diag(ysh)` by triplets; duplicate
/// entries are summed by the COO → CSC conversion.
pub fn assemble(branches: &[PlacedBranch], shunts: &[Complex64]) -> AdmittanceMatrices {
    let n = shunts.len();
    let m = branches.len();
    let mut ybus = CooMatrix::new(n, n);
    let mut yf = CooMatrix::new(m, n);
    let mut yt = CooMatrix::new(m, n);
    ybus.reserve(4 * m + n);
    yf.reserve(2 * m);
    yt.reserve(2 * m);

    for (k, br) in branches.iter().enumerate() {
        let (f, t, y) = (br.from, br.to, br.y);
        ybus.push(f, f, y.yff);
        ybus.push(f, t, y.yft);
        ybus.push(t, f, y.ytf);
        ybus.push(t, t, y.ytt);
        yf.push(k, f, y.yff);
        yf.push(k, t, y.yft);
        yt.push(k, f, y.ytf);
        yt.push(k, t, y.ytt);
    }
    for (i, ysh) in shunts.iter().enumerate() {
        if !ysh.is_zero() {
            ybus.push(i, i, *ysh);
        }
    }

    AdmittanceMatrices {
        ybus: CscMatrix::from(&ybus),
        yf: CscMatrix::from(&yf),
        yt: CscMatrix::from(&yt),
    }
}

/// DC susceptance matrix from `1 / (x·m)` per branch.
pub fn assemble_bbus(branches: &[(usize, usize, f64)], n: usize) -> CscMatrix<f64> {
    let mut bbus = CooMatrix::new(n, n);
    bbus.reserve(4 * branches.len());
    for &(f, t, b) in branches {
        bbus.push(f, f, b);
        bbus.push(t, t, b);
        bbus.push(f, t, -b);
        bbus.push(t, f, -b);
    }
    CscMatrix::from(&bbus)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::DVector;

    use super::*;

    #[test]
    fn nominal_line_is_symmetric() {
        let br = Branch::line("l", 0, 1, 0.01, 0.1).with_charging(0.0, 0.02);
        let y = BranchAdmittance::from(&br);
        assert_relative_eq!(y.yff.re, y.ytt.re, epsilon = 1e-12);
        assert_relative_eq!(y.yff.im, y.ytt.im, epsilon = 1e-12);
        assert_relative_eq!(y.yft.re, y.ytf.re, epsilon = 1e-12);
        assert_relative_eq!(y.yft.im, y.ytf.im, epsilon = 1e-12);
    }

    #[test]
    fn ybus_rows_sum_to_shunt_without_charging() {
        let placed: Vec<_> = [(0, 1), (1, 2), (2, 0)]
            .iter()
            .map(|&(f, t)| PlacedBranch {
                from: f,
                to: t,
                y: BranchAdmittance::from(&Branch::line("l", 0, 0, 0.02, 0.2)),
            })
            .collect();
        let shunts = vec![Complex64::new(0.0, 0.0), Complex64::new(0.0, 0.5), Complex64::new(0.0, 0.0)];
        let mats = assemble(&placed, &shunts);
        let ones = DVector::from_element(3, Complex64::new(1.0, 0.0));
        let row_sums = &mats.ybus * &ones;
        assert_relative_eq!(row_sums[0].norm(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(row_sums[1].im, 0.5, epsilon = 1e-12);
        assert_eq!(mats.yf.nrows(), 3);
        assert_eq!(mats.yf.ncols(), 3);
    }

    #[test]
    fn tap_scales_from_side() {
        let br = Branch::transformer("t", 0, 1, 0.0, 0.1, 1.1);
        let y = BranchAdmittance::from(&br);
        assert_relative_eq!(y.yff.norm() * 1.21, y.ytt.norm(), epsilon = 1e-9);
    }
}
