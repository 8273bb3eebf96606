use std::ops::Range;

use nalgebra::DVector;
use nalgebra_sparse::{CooMatrix, CscMatrix};
use num_complex::Complex64;

/// Element-wise complex conjugate of a sparse matrix, keeping its pattern.
pub(crate) trait Conjugate {
    fn conjugate(&self) -> Self;
}

impl Conjugate for CscMatrix<Complex64> {
    fn conjugate(&self) -> Self {
        let mut out = self.clone();
        out.values_mut().iter_mut().for_each(|v| *v = v.conj());
        out
    }
}

/// Diagonal matrix with `d` on its main diagonal.
pub(crate) fn diag(d: &DVector<Complex64>) -> CscMatrix<Complex64> {
    let mut m = CscMatrix::identity(d.len());
    m.values_mut().copy_from_slice(d.as_slice());
    m
}

/// Pushes the entries of `src[rows, cols]` into `dst`, shifted so that
/// `(rows.start, cols.start)` lands on `at`, after mapping each value
/// through `part`.
pub(crate) fn push_block(
    dst: &mut CooMatrix<f64>,
    src: &CscMatrix<Complex64>,
    rows: Range<usize>,
    cols: Range<usize>,
    at: (usize, usize),
    part: impl Fn(&Complex64) -> f64,
) {
    for (r, c, v) in src.triplet_iter() {
        if rows.contains(&r) && cols.contains(&c) {
            dst.push(r - rows.start + at.0, c - cols.start + at.1, part(v));
        }
    }
}

/// Principal submatrix `m[0..n, 0..n]` of a real matrix.
pub(crate) fn leading_block(m: &CscMatrix<f64>, n: usize) -> CscMatrix<f64> {
    let mut out = CooMatrix::new(n, n);
    for (r, c, v) in m.triplet_iter() {
        if r < n && c < n {
            out.push(r, c, *v);
        }
    }
    CscMatrix::from(&out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_is_shifted() {
        let mut coo = CooMatrix::new(3, 3);
        coo.push(0, 0, Complex64::new(1.0, 2.0));
        coo.push(2, 1, Complex64::new(3.0, 4.0));
        coo.push(1, 2, Complex64::new(5.0, 6.0));
        let m = CscMatrix::from(&coo);

        let mut dst = CooMatrix::new(2, 2);
        push_block(&mut dst, &m, 1..3, 1..3, (0, 0), |v| v.im);
        let out = CscMatrix::from(&dst);
        let dense: Vec<(usize, usize, f64)> = out.triplet_iter().map(|(r, c, v)| (r, c, *v)).collect();
        assert_eq!(dense, vec![(1, 0, 4.0), (0, 1, 6.0)]);
    }

    #[test]
    fn conjugate_keeps_pattern() {
        let m = diag(&DVector::from_vec(vec![Complex64::new(1.0, 1.0), Complex64::new(0.0, -2.0)]));
        let c = m.conjugate();
        assert_eq!(c.pattern(), m.pattern());
        assert_eq!(c.values()[0], Complex64::new(1.0, -1.0));
        assert_eq!(c.values()[1], Complex64::new(0.0, 2.0));
    }
}
