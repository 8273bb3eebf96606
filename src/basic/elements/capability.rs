//! Optional capability blocks attached to devices.
//!
//! A device either carries a block or it doesn't; callers test for presence
//! with `Option` instead of walking a type hierarchy.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Mean time to failure / repair, in hours.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Reliability {
    pub mttf: f64,
    pub mttr: f64,
}

impl Reliability {
    pub fn new(mttf: f64, mttr: f64) -> Self {
        Self { mttf, mttr }
    }

    /// Steady-state availability `mttf / (mttf + mttr)`; 1.0 when both are zero.
    pub fn availability(&self) -> f64 {
        let total = self.mttf + self.mttr;
        if total > 0.0 { self.mttf / total } else { 1.0 }
    }
}

/// Injection setpoints that may be driven by a time series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PropertyId {
    /// Active power, MW.
    P,
    /// Reactive power, MVAr.
    Q,
    /// Voltage setpoint, p.u.
    VSet,
    /// Shunt conductance, MW at 1 p.u.
    G,
    /// Shunt susceptance, MVAr at 1 p.u.
    B,
}

/// Property id → time series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileBinding {
    /// The properties this device exposes for profiling.
    pub properties: Vec<PropertyId>,
    pub table: BTreeMap<PropertyId, Vec<f64>>,
}

impl ProfileBinding {
    pub fn new(properties: impl IntoIterator<Item = PropertyId>) -> Self {
        Self {
            properties: properties.into_iter().collect(),
            table: BTreeMap::new(),
        }
    }

    pub fn set(&mut self, property: PropertyId, series: Vec<f64>) {
        if !self.properties.contains(&property) {
            self.properties.push(property);
        }
        self.table.insert(property, series);
    }

    pub fn get(&self, property: PropertyId) -> Option<&[f64]> {
        self.table.get(&property).map(Vec::as_slice)
    }

    /// Value of `property` at step `t`, if a profile exists and covers `t`.
    pub fn value_at(&self, property: PropertyId, t: usize) -> Option<f64> {
        self.table.get(&property).and_then(|s| s.get(t)).copied()
    }

    /// True when every exposed property has a series of exactly `len` steps.
    pub fn covers(&self, len: usize) -> bool {
        self.properties
            .iter()
            .all(|p| self.table.get(p).is_some_and(|s| s.len() == len))
    }

    pub fn clear(&mut self) {
        self.table.clear();
    }
}
