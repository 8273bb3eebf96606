use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use super::{
    bus::BusId,
    capability::{ProfileBinding, PropertyId, Reliability},
};

/// Device-specific electrical data of an injection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InjectionKind {
    /// Constant power consumption, MW / MVAr.
    Load { p: f64, q: f64 },
    /// Voltage-controlled generator when `controlled`, otherwise fixed P at
    /// unity power factor.
    Generator {
        p: f64,
        vset: f64,
        qmin: f64,
        qmax: f64,
        snom: f64,
        controlled: bool,
    },
    /// Fixed P/Q production.
    StaticGenerator { p: f64, q: f64 },
    /// Storage unit; behaves like a generator in power flow.
    Battery {
        p: f64,
        vset: f64,
        qmin: f64,
        qmax: f64,
        snom: f64,
        enom: f64,
        controlled: bool,
    },
    /// Constant admittance at 1 p.u.: `g` MW consumed, `b` MVAr produced
    /// (capacitive when positive).
    Shunt { g: f64, b: f64 },
}

/// A device attached to one bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Injection {
    pub name: String,
    pub bus: BusId,
    pub active: bool,
    pub kind: InjectionKind,
    #[serde(default)]
    pub reliability: Option<Reliability>,
    #[serde(default)]
    pub profiles: Option<ProfileBinding>,
}

impl Injection {
    fn with_kind(name: impl Into<String>, bus: i64, kind: InjectionKind) -> Self {
        Self {
            name: name.into(),
            bus: BusId(bus),
            active: true,
            kind,
            reliability: None,
            profiles: None,
        }
    }

    pub fn load(name: impl Into<String>, bus: i64, p: f64, q: f64) -> Self {
        Self::with_kind(name, bus, InjectionKind::Load { p, q })
    }

    pub fn generator(name: impl Into<String>, bus: i64, p: f64, vset: f64) -> Self {
        Self::with_kind(
            name,
            bus,
            InjectionKind::Generator {
                p,
                vset,
                qmin: -9999.0,
                qmax: 9999.0,
                snom: 9999.0,
                controlled: true,
            },
        )
    }

    pub fn static_generator(name: impl Into<String>, bus: i64, p: f64, q: f64) -> Self {
        Self::with_kind(name, bus, InjectionKind::StaticGenerator { p, q })
    }

    pub fn battery(
        name: impl Into<String>,
        bus: i64,
        p: f64,
        vset: f64,
        enom: f64,
    ) -> Self {
        Self::with_kind(
            name,
            bus,
            InjectionKind::Battery {
                p,
                vset,
                qmin: -9999.0,
                qmax: 9999.0,
                snom: 9999.0,
                enom,
                controlled: true,
            },
        )
    }

    pub fn shunt(name: impl Into<String>, bus: i64, g: f64, b: f64) -> Self {
        Self::with_kind(name, bus, InjectionKind::Shunt { g, b })
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn with_reliability(mut self, reliability: Reliability) -> Self {
        self.reliability = Some(reliability);
        self
    }

    /// Complex power injected into the bus in MVA (generation positive).
    /// Shunts contribute through the admittance matrix and return zero here.
    pub fn power_injection(&self) -> Complex64 {
        match self.kind {
            InjectionKind::Load { p, q } => Complex64::new(-p, -q),
            InjectionKind::Generator { p, .. } | InjectionKind::Battery { p, .. } => {
                Complex64::new(p, 0.0)
            }
            InjectionKind::StaticGenerator { p, q } => Complex64::new(p, q),
            InjectionKind::Shunt { .. } => Complex64::new(0.0, 0.0),
        }
    }

    /// Shunt admittance drawn at 1 p.u., in MVA; zero for non-shunt devices.
    pub fn shunt_admittance(&self) -> Complex64 {
        match self.kind {
            InjectionKind::Shunt { g, b } => Complex64::new(g, b),
            _ => Complex64::new(0.0, 0.0),
        }
    }

    /// Voltage setpoint when this device regulates its bus voltage.
    pub fn voltage_setpoint(&self) -> Option<f64> {
        match self.kind {
            InjectionKind::Generator {
                vset,
                controlled: true,
                ..
            }
            | InjectionKind::Battery {
                vset,
                controlled: true,
                ..
            } => Some(vset),
            _ => None,
        }
    }

    /// Properties this kind of device can bind to a profile.
    pub fn profile_properties(&self) -> &'static [PropertyId] {
        match self.kind {
            InjectionKind::Load { .. } | InjectionKind::StaticGenerator { .. } => {
                &[PropertyId::P, PropertyId::Q]
            }
            InjectionKind::Generator { .. } | InjectionKind::Battery { .. } => {
                &[PropertyId::P, PropertyId::VSet]
            }
            InjectionKind::Shunt { .. } => &[PropertyId::G, PropertyId::B],
        }
    }

    pub fn property(&self, property: PropertyId) -> Option<f64> {
        match (&self.kind, property) {
            (InjectionKind::Load { p, .. }, PropertyId::P)
            | (InjectionKind::StaticGenerator { p, .. }, PropertyId::P)
            | (InjectionKind::Generator { p, .. }, PropertyId::P)
            | (InjectionKind::Battery { p, .. }, PropertyId::P) => Some(*p),
            (InjectionKind::Load { q, .. }, PropertyId::Q)
            | (InjectionKind::StaticGenerator { q, .. }, PropertyId::Q) => Some(*q),
            (InjectionKind::Generator { vset, .. }, PropertyId::VSet)
            | (InjectionKind::Battery { vset, .. }, PropertyId::VSet) => Some(*vset),
            (InjectionKind::Shunt { g, .. }, PropertyId::G) => Some(*g),
            (InjectionKind::Shunt { b, .. }, PropertyId::B) => Some(*b),
            _ => None,
        }
    }

    /// Writes `value` into `property`. Returns false when the device has no
    /// such property.
    pub fn set_property(&mut self, property: PropertyId, value: f64) -> bool {
        let slot = match (&mut self.kind, property) {
            (InjectionKind::Load { p, .. }, PropertyId::P)
            | (InjectionKind::StaticGenerator { p, .. }, PropertyId::P)
            | (InjectionKind::Generator { p, .. }, PropertyId::P)
            | (InjectionKind::Battery { p, .. }, PropertyId::P) => p,
            (InjectionKind::Load { q, .. }, PropertyId::Q)
            | (InjectionKind::StaticGenerator { q, .. }, PropertyId::Q) => q,
            (InjectionKind::Generator { vset, .. }, PropertyId::VSet)
            | (InjectionKind::Battery { vset, .. }, PropertyId::VSet) => vset,
            (InjectionKind::Shunt { g, .. }, PropertyId::G) => g,
            (InjectionKind::Shunt { b, .. }, PropertyId::B) => b,
            _ => return false,
        };
        *slot = value;
        true
    }

    /// Creates constant profiles of `len` steps from the current values.
    pub fn create_profiles(&mut self, len: usize) {
        let mut binding = ProfileBinding::new(self.profile_properties().iter().copied());
        for &property in self.profile_properties() {
            if let Some(value) = self.property(property) {
                binding.set(property, vec![value; len]);
            }
        }
        self.profiles = Some(binding);
    }

    /// Recreates profiles that are missing or whose length differs from `len`.
    /// Returns true when anything was (re)created.
    pub fn ensure_profiles_exist(&mut self, len: usize) -> bool {
        let ok = self.profiles.as_ref().is_some_and(|b| b.covers(len));
        if !ok {
            self.create_profiles(len);
        }
        !ok
    }

    /// Loads step `t` of every bound profile into the setpoints.
    pub fn set_profile_values(&mut self, t: usize) {
        let Some(binding) = self.profiles.as_ref() else {
            return;
        };
        let values: Vec<_> = binding
            .properties
            .iter()
            .filter_map(|&p| binding.value_at(p, t).map(|v| (p, v)))
            .collect();
        for (property, value) in values {
            self.set_property(property, value);
        }
    }

    pub fn delete_profiles(&mut self) {
        self.profiles = None;
    }
}
