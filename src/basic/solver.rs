#[cfg(feature = "rsparse")]
mod rsparse;
#[cfg(feature = "rsparse")]
pub use rsparse::*;

#[cfg(feature = "rsparse")]
pub type DefaultSolver = RSparseSolver;

#[cfg(not(feature = "rsparse"))]
compile_error!("a sparse LU backend is required: enable the `rsparse` feature");

/// Sparse LU backend for the Newton and DC solvers.
#[allow(non_snake_case)]
pub trait Solve {
    /// Solves `A·x = b` in place for a square CSC matrix of dimension `n`;
    /// `b` holds the solution on return.
    fn solve(
        &mut self,
        Ap: &mut [usize],
        Ai: &mut [usize],
        Ax: &mut [f64],
        b: &mut [f64],
        n: usize,
    ) -> Result<(), &'static str>;

    /// Drops any cached symbolic analysis. Call when the sparsity pattern
    /// changes.
    fn reset(&mut self) {}
}
