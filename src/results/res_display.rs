use std::fmt;

use tabled::{Table, Tabled, settings::Style};

use super::ResultSet;

/// A float printed with a fixed number of decimals.
#[derive(Clone, Copy, PartialEq, PartialOrd)]
pub(crate) struct FloatWrapper {
    pub(crate) value: f64,
    pub(crate) precision: usize,
}

impl FloatWrapper {
    pub fn new(value: f64, precision: usize) -> Self {
        FloatWrapper { value, precision }
    }
}

impl fmt::Display for FloatWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1$}", self.value, self.precision)
    }
}

impl fmt::Debug for FloatWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[derive(Debug, Tabled)]
struct ConvergenceRow {
    island: usize,
    method: String,
    converged: bool,
    error: String,
    elapsed_ms: FloatWrapper,
    iterations: usize,
    diagnostics: String,
}

#[derive(Debug, Tabled)]
struct BusRow {
    bus: String,
    #[tabled(rename = "type")]
    kind: String,
    vm_pu: FloatWrapper,
    va_degree: FloatWrapper,
    p_mw: FloatWrapper,
    q_mvar: FloatWrapper,
}

#[derive(Debug, Tabled)]
struct BranchRow {
    branch: String,
    p_from_mw: FloatWrapper,
    q_from_mvar: FloatWrapper,
    p_to_mw: FloatWrapper,
    q_to_mvar: FloatWrapper,
    pl_mw: FloatWrapper,
    ql_mvar: FloatWrapper,
    loading_percent: FloatWrapper,
}

impl ResultSet {
    /// One row per island: method(s), convergence, error, time, iterations.
    pub fn convergence_table(&self) -> String {
        let rows = self.reports().iter().map(|r| ConvergenceRow {
            island: r.island,
            method: r.method_name(),
            converged: r.converged,
            error: format!("{:.3e}", r.error),
            elapsed_ms: FloatWrapper::new(r.elapsed.as_secs_f64() * 1e3, 3),
            iterations: r.iterations,
            diagnostics: r
                .diagnostics
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; "),
        });
        Table::new(rows).with(Style::markdown()).to_string()
    }

    pub fn bus_table(&self) -> String {
        let rows = (0..self.n_buses()).map(|i| BusRow {
            bus: self.bus_names[i].clone(),
            kind: format!("{:?}", self.bus_types[i]),
            vm_pu: FloatWrapper::new(self.voltage[i].norm(), 5),
            va_degree: FloatWrapper::new(self.voltage[i].arg().to_degrees(), 4),
            p_mw: FloatWrapper::new(self.sbus[i].re, 3),
            q_mvar: FloatWrapper::new(self.sbus[i].im, 3),
        });
        Table::new(rows).with(Style::markdown()).to_string()
    }

    pub fn branch_table(&self) -> String {
        let rows = (0..self.n_branches()).map(|k| BranchRow {
            branch: self.branch_names[k].clone(),
            p_from_mw: FloatWrapper::new(self.sf[k].re, 3),
            q_from_mvar: FloatWrapper::new(self.sf[k].im, 3),
            p_to_mw: FloatWrapper::new(self.st[k].re, 3),
            q_to_mvar: FloatWrapper::new(self.st[k].im, 3),
            pl_mw: FloatWrapper::new(self.losses[k].re, 4),
            ql_mvar: FloatWrapper::new(self.losses[k].im, 4),
            loading_percent: FloatWrapper::new(self.loading[k] * 100.0, 2),
        });
        Table::new(rows).with(Style::markdown()).to_string()
    }
}
