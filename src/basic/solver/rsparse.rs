use rsparse::{
    data::{self, Numeric, Symb},
    lsolve, lu, sqr, usolve,
};

use super::Solve;

/// LU solver on top of `rsparse`. The symbolic analysis is computed on the
/// first call and reused until [`Solve::reset`].
#[derive(Default)]
pub struct RSparseSolver {
    work: Vec<f64>,
    symbolic: Option<Symb>,
}

#[allow(non_snake_case)]
impl Solve for RSparseSolver {
    fn solve(
        &mut self,
        Ap: &mut [usize],
        Ai: &mut [usize],
        Ax: &mut [f64],
        b: &mut [f64],
        n: usize,
    ) -> Result<(), &'static str> {
        if Ap.len() != n + 1 || b.len() != n {
            return Err("dimension mismatch");
        }
        if n == 0 {
            return Ok(());
        }
        let a = data::Sprs {
            m: n,
            n,
            i: Ai.to_vec(),
            p: Ap.iter().map(|&v| v as isize).collect(),
            x: Ax.to_vec(),
            nzmax: Ax.len(),
        };
        let symbolic = self.symbolic.get_or_insert_with(|| sqr(&a, 1, false));
        self.work.resize(n, 0.0);
        let x = &mut self.work;

        let num = lu(&a, symbolic, 1e-6).map_err(|_| "LU factorization failed")?;
        ipvec(&num.pinv, b, x); // x = P*b
        lsolve(&num.l, x); // x = L\x
        usolve(&num.u, x); // x = U\x
        ipvec(&symbolic.q, x, b); // b = Q*x

        if b.iter().any(|v| !v.is_finite()) {
            return Err("singular matrix");
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.symbolic = None;
    }
}

fn ipvec<T: Numeric<T>>(p: &Option<Vec<isize>>, b: &[T], x: &mut [T]) {
    match p {
        Some(p) => {
            for (k, v) in b.iter().enumerate() {
                x[p[k] as usize] = *v;
            }
        }
        None => x.copy_from_slice(b),
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra_sparse::{CooMatrix, CscMatrix};

    use super::*;

    #[test]
    fn solves_small_system() {
        // [4 1; 2 3] x = [1 2]
        let mut coo = CooMatrix::new(2, 2);
        coo.push(0, 0, 4.0);
        coo.push(0, 1, 1.0);
        coo.push(1, 0, 2.0);
        coo.push(1, 1, 3.0);
        let (mut ap, mut ai, mut ax) = CscMatrix::from(&coo).disassemble();
        let mut b = vec![1.0, 2.0];
        let mut solver = RSparseSolver::default();
        solver
            .solve(&mut ap, &mut ai, &mut ax, &mut b, 2)
            .unwrap();
        assert_relative_eq!(b[0], 0.1, epsilon = 1e-12);
        assert_relative_eq!(b[1], 0.6, epsilon = 1e-12);
    }
}
