use derive_more::derive::{Display, From, Into};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// External identifier of a bus, as given by the import layer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Into, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BusId(pub i64);

/// Role of a bus in the power flow formulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BusType {
    /// Angle reference, absorbs the island power imbalance.
    Slack,
    /// Voltage-controlled bus with fixed active power.
    PV,
    /// Load bus with fixed active and reactive power.
    #[default]
    PQ,
}

/// Upper and lower voltage magnitude limits in p.u.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoltageLimits {
    pub vmin: f64,
    pub vmax: f64,
}

impl Default for VoltageLimits {
    fn default() -> Self {
        Self {
            vmin: 0.9,
            vmax: 1.1,
        }
    }
}

/// Location and grouping tags of a bus. Only carried through to consumers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusTags {
    pub area: Option<String>,
    pub zone: Option<String>,
    pub substation: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
}

/// A network node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bus {
    pub id: BusId,
    pub name: String,
    /// Nominal voltage in kV.
    pub vnom: f64,
    pub limits: VoltageLimits,
    /// Fault impedance in p.u.
    pub z_fault: Complex64,
    pub bus_type: BusType,
    #[serde(default)]
    pub tags: BusTags,
    pub active: bool,
}

impl Bus {
    /// Creates an active PQ bus with default limits.
    pub fn new(id: i64, name: impl Into<String>, vnom: f64) -> Self {
        Self {
            id: BusId(id),
            name: name.into(),
            vnom,
            limits: VoltageLimits::default(),
            z_fault: Complex64::default(),
            bus_type: BusType::PQ,
            tags: BusTags::default(),
            active: true,
        }
    }

    pub fn with_type(mut self, bus_type: BusType) -> Self {
        self.bus_type = bus_type;
        self
    }

    pub fn with_limits(mut self, vmin: f64, vmax: f64) -> Self {
        self.limits = VoltageLimits { vmin, vmax };
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn is_slack(&self) -> bool {
        self.bus_type == BusType::Slack
    }
}
