use derive_more::derive::Display;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use super::ResultSet;

/// Named result series available to plotting and export consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum ResultKind {
    #[display("Bus voltage module")]
    BusVoltageModule,
    #[display("Bus voltage angle")]
    BusVoltageAngle,
    #[display("Bus voltage (polar)")]
    BusVoltagePolar,
    #[display("Bus power")]
    BusPower,
    #[display("Branch power")]
    BranchPower,
    #[display("Branch active power")]
    BranchActivePower,
    #[display("Branch reactive power")]
    BranchReactivePower,
    #[display("Branch current")]
    BranchCurrent,
    #[display("Branch active current")]
    BranchActiveCurrent,
    #[display("Branch reactive current")]
    BranchReactiveCurrent,
    #[display("Branch loading")]
    BranchLoading,
    #[display("Branch losses")]
    BranchLosses,
    #[display("Branch active losses")]
    BranchActiveLosses,
    #[display("Branch reactive losses")]
    BranchReactiveLosses,
    #[display("Branch voltage drop")]
    BranchVoltage,
    #[display("Branch angle drop")]
    BranchAngle,
    #[display("Transformer tap module")]
    TransformerTapModule,
    #[display("HVDC losses")]
    HvdcLosses,
    #[display("HVDC sent power")]
    HvdcSentPower,
    #[display("HVDC loading")]
    HvdcLoading,
}

impl ResultKind {
    pub const ALL: [ResultKind; 20] = [
        ResultKind::BusVoltageModule,
        ResultKind::BusVoltageAngle,
        ResultKind::BusVoltagePolar,
        ResultKind::BusPower,
        ResultKind::BranchPower,
        ResultKind::BranchActivePower,
        ResultKind::BranchReactivePower,
        ResultKind::BranchCurrent,
        ResultKind::BranchActiveCurrent,
        ResultKind::BranchReactiveCurrent,
        ResultKind::BranchLoading,
        ResultKind::BranchLosses,
        ResultKind::BranchActiveLosses,
        ResultKind::BranchReactiveLosses,
        ResultKind::BranchVoltage,
        ResultKind::BranchAngle,
        ResultKind::TransformerTapModule,
        ResultKind::HvdcLosses,
        ResultKind::HvdcSentPower,
        ResultKind::HvdcLoading,
    ];

    pub fn unit(&self) -> &'static str {
        use ResultKind::*;
        match self {
            BusVoltageModule | BusVoltagePolar | BranchCurrent | BranchActiveCurrent
            | BranchReactiveCurrent | BranchVoltage | TransformerTapModule => "p.u.",
            BusVoltageAngle | BranchAngle => "deg",
            BusPower | BranchPower | BranchLosses => "MVA",
            BranchActivePower | BranchActiveLosses | HvdcLosses | HvdcSentPower => "MW",
            BranchReactivePower | BranchReactiveLosses => "MVAr",
            BranchLoading | HvdcLoading => "%",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SeriesValues {
    Real(Vec<f64>),
    Complex(Vec<Complex64>),
}

impl SeriesValues {
    pub fn len(&self) -> usize {
        match self {
            SeriesValues::Real(v) => v.len(),
            SeriesValues::Complex(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_real(&self) -> Option<&[f64]> {
        match self {
            SeriesValues::Real(v) => Some(v),
            SeriesValues::Complex(_) => None,
        }
    }
}

/// Labels, values and unit of one result kind.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSeries {
    pub kind: ResultKind,
    pub labels: Vec<String>,
    pub values: SeriesValues,
    pub unit: &'static str,
}

impl ResultSet {
    pub fn series(&self, kind: ResultKind) -> ResultSeries {
        use ResultKind::*;
        use SeriesValues::{Complex, Real};

        let re = |v: &[Complex64]| Real(v.iter().map(|c| c.re).collect());
        let im = |v: &[Complex64]| Real(v.iter().map(|c| c.im).collect());

        let (labels, values) = match kind {
            BusVoltageModule => (&self.bus_names, Real(self.voltage_module())),
            BusVoltageAngle => (&self.bus_names, Real(self.voltage_angle())),
            BusVoltagePolar => (&self.bus_names, Complex(self.voltage.clone())),
            BusPower => (&self.bus_names, Complex(self.sbus.clone())),
            BranchPower => (&self.branch_names, Complex(self.sf.clone())),
            BranchActivePower => (&self.branch_names, re(&self.sf)),
            BranchReactivePower => (&self.branch_names, im(&self.sf)),
            BranchCurrent => (&self.branch_names, Complex(self.i_from.clone())),
            BranchActiveCurrent => (&self.branch_names, re(&self.i_from)),
            BranchReactiveCurrent => (&self.branch_names, im(&self.i_from)),
            BranchLoading => (
                &self.branch_names,
                Real(self.loading.iter().map(|l| l * 100.0).collect()),
            ),
            BranchLosses => (&self.branch_names, Complex(self.losses.clone())),
            BranchActiveLosses => (&self.branch_names, re(&self.losses)),
            BranchReactiveLosses => (&self.branch_names, im(&self.losses)),
            BranchVoltage => (
                &self.branch_names,
                Real(self.vbranch.iter().map(|v| v.norm()).collect()),
            ),
            BranchAngle => (
                &self.branch_names,
                Real(self.vbranch.iter().map(|v| v.arg().to_degrees()).collect()),
            ),
            TransformerTapModule => (&self.transformer_names, Real(self.tap_module.clone())),
            HvdcLosses => (&self.hvdc_names, Real(self.hvdc_losses.clone())),
            HvdcSentPower => (&self.hvdc_names, Real(self.hvdc_sent_power.clone())),
            HvdcLoading => (
                &self.hvdc_names,
                Real(self.hvdc_loading.iter().map(|l| l * 100.0).collect()),
            ),
        };

        ResultSeries {
            kind,
            labels: labels.clone(),
            values,
            unit: kind.unit(),
        }
    }
}
