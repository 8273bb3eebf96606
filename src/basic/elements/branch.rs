use num_complex::Complex64;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

use super::{bus::BusId, capability::Reliability};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BranchKind {
    #[default]
    Line,
    Transformer,
}

/// AC branch in the pi model. Impedances and shunt admittance are in p.u. on
/// the network base, the rating in MVA.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub name: String,
    pub kind: BranchKind,
    pub bus_from: BusId,
    pub bus_to: BusId,
    pub r: f64,
    pub x: f64,
    pub g: f64,
    pub b: f64,
    /// Off-nominal tap ratio on the from side.
    pub tap_module: f64,
    /// Phase shift in radians.
    pub tap_angle: f64,
    pub rate: f64,
    pub active: bool,
    #[serde(default)]
    pub reliability: Option<Reliability>,
}

impl Branch {
    pub fn line(
        name: impl Into<String>,
        bus_from: i64,
        bus_to: i64,
        r: f64,
        x: f64,
    ) -> Self {
        Self {
            name: name.into(),
            kind: BranchKind::Line,
            bus_from: BusId(bus_from),
            bus_to: BusId(bus_to),
            r,
            x,
            g: 0.0,
            b: 0.0,
            tap_module: 1.0,
            tap_angle: 0.0,
            rate: 9999.0,
            active: true,
            reliability: None,
        }
    }

    pub fn transformer(
        name: impl Into<String>,
        bus_from: i64,
        bus_to: i64,
        r: f64,
        x: f64,
        tap_module: f64,
    ) -> Self {
        Self {
            kind: BranchKind::Transformer,
            tap_module,
            ..Self::line(name, bus_from, bus_to, r, x)
        }
    }

    pub fn with_charging(mut self, g: f64, b: f64) -> Self {
        self.g = g;
        self.b = b;
        self
    }

    pub fn with_rate(mut self, rate: f64) -> Self {
        self.rate = rate;
        self
    }

    pub fn with_shift(mut self, tap_angle: f64) -> Self {
        self.tap_angle = tap_angle;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn is_transformer(&self) -> bool {
        self.kind == BranchKind::Transformer
    }

    /// Series admittance `1 / (r + jx)`.
    pub fn series_admittance(&self) -> Complex64 {
        let z = Complex64::new(self.r, self.x);
        if z.is_zero() { Complex64::zero() } else { z.inv() }
    }

    /// Complex tap `m·e^{jθ}`; a zero module is read as nominal.
    pub fn complex_tap(&self) -> Complex64 {
        let m = if self.tap_module > 0.0 { self.tap_module } else { 1.0 };
        Complex64::from_polar(m, self.tap_angle)
    }
}

/// Point-to-point HVDC link driven by an active power set point.
///
/// The link does not couple the AC voltages of its terminals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HvdcLink {
    pub name: String,
    pub bus_from: BusId,
    pub bus_to: BusId,
    /// Power leaving the sending end, MW.
    pub p_set: f64,
    /// Fraction of `p_set` lost in conversion and transmission.
    pub loss_factor: f64,
    /// Rating in MW.
    pub rate: f64,
    pub active: bool,
}

impl HvdcLink {
    pub fn new(
        name: impl Into<String>,
        bus_from: i64,
        bus_to: i64,
        p_set: f64,
        rate: f64,
    ) -> Self {
        Self {
            name: name.into(),
            bus_from: BusId(bus_from),
            bus_to: BusId(bus_to),
            p_set,
            loss_factor: 0.0,
            rate,
            active: true,
        }
    }

    pub fn with_loss_factor(mut self, loss_factor: f64) -> Self {
        self.loss_factor = loss_factor;
        self
    }

    pub fn losses(&self) -> f64 {
        self.p_set * self.loss_factor
    }

    pub fn received_power(&self) -> f64 {
        self.p_set - self.losses()
    }

    pub fn loading(&self) -> f64 {
        if self.rate > 0.0 { self.p_set / self.rate } else { 0.0 }
    }
}
