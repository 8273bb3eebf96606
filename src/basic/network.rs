use std::collections::HashMap;

use tracing::debug;

use super::elements::*;
use super::error::{PowerFlowError, Result};

/// Default system base power in MVA.
pub const DEFAULT_SBASE: f64 = 100.0;

/// One entry of a bus's incidence list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Incidence {
    /// Global branch index.
    pub branch: usize,
    /// Global index of the bus on the other end.
    pub neighbor: usize,
}

/// Bus → incident active branches, stored compressed (row offsets + entries).
///
/// Only branches that are active and whose two buses are active appear.
/// Entries of a bus are in ascending branch order.
#[derive(Debug, Clone, Default)]
pub struct Adjacency {
    offsets: Vec<usize>,
    entries: Vec<Incidence>,
}

impl Adjacency {
    pub fn n_buses(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    pub fn incident(&self, bus: usize) -> &[Incidence] {
        &self.entries[self.offsets[bus]..self.offsets[bus + 1]]
    }

    pub fn degree(&self, bus: usize) -> usize {
        self.offsets[bus + 1] - self.offsets[bus]
    }
}

/// The network graph model: buses, AC branches, HVDC links and injections.
///
/// Global indices are positions in the element vectors. They are stable as
/// long as the network is not edited; removals use `swap_remove`, so the last
/// element of a collection takes the removed slot.
#[derive(Debug, Clone)]
pub struct Network {
    pub name: String,
    sbase: f64,
    buses: Vec<Bus>,
    branches: Vec<Branch>,
    hvdc_links: Vec<HvdcLink>,
    injections: Vec<Injection>,
    bus_lookup: HashMap<BusId, usize>,
}

impl Default for Network {
    fn default() -> Self {
        Self::new("network", DEFAULT_SBASE)
    }
}

impl Network {
    pub fn new(name: impl Into<String>, sbase: f64) -> Self {
        Self {
            name: name.into(),
            sbase,
            buses: Vec::new(),
            branches: Vec::new(),
            hvdc_links: Vec::new(),
            injections: Vec::new(),
            bus_lookup: HashMap::new(),
        }
    }

    pub fn sbase(&self) -> f64 {
        self.sbase
    }

    pub fn set_sbase(&mut self, sbase: f64) {
        self.sbase = sbase;
    }

    pub fn buses(&self) -> &[Bus] {
        &self.buses
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    pub fn hvdc_links(&self) -> &[HvdcLink] {
        &self.hvdc_links
    }

    pub fn injections(&self) -> &[Injection] {
        &self.injections
    }

    pub fn n_buses(&self) -> usize {
        self.buses.len()
    }

    pub fn n_branches(&self) -> usize {
        self.branches.len()
    }

    pub fn n_hvdc(&self) -> usize {
        self.hvdc_links.len()
    }

    pub fn n_transformers(&self) -> usize {
        self.branches.iter().filter(|b| b.is_transformer()).count()
    }

    /// Global index of the bus with id `id`.
    pub fn bus_index(&self, id: BusId) -> Option<usize> {
        self.bus_lookup.get(&id).copied()
    }

    pub fn bus_mut(&mut self, index: usize) -> Result<&mut Bus> {
        self.buses.get_mut(index).ok_or(PowerFlowError::UnknownElement {
            kind: "bus",
            index,
        })
    }

    /// Mutable access to a branch. Endpoint and impedance edits are checked by
    /// [`Network::validate`].
    pub fn branch_mut(&mut self, index: usize) -> Result<&mut Branch> {
        self.branches.get_mut(index).ok_or(PowerFlowError::UnknownElement {
            kind: "branch",
            index,
        })
    }

    pub fn injection_mut(&mut self, index: usize) -> Result<&mut Injection> {
        self.injections
            .get_mut(index)
            .ok_or(PowerFlowError::UnknownElement {
                kind: "injection",
                index,
            })
    }

    pub fn hvdc_mut(&mut self, index: usize) -> Result<&mut HvdcLink> {
        self.hvdc_links
            .get_mut(index)
            .ok_or(PowerFlowError::UnknownElement { kind: "hvdc", index })
    }

    pub fn add_bus(&mut self, bus: Bus) -> Result<usize> {
        if self.bus_lookup.contains_key(&bus.id) {
            return Err(PowerFlowError::DuplicateBus(bus.id));
        }
        let index = self.buses.len();
        self.bus_lookup.insert(bus.id, index);
        self.buses.push(bus);
        Ok(index)
    }

    /// Adds a branch. Both buses must exist and the series impedance must be
    /// non-zero.
    pub fn add_branch(&mut self, branch: Branch) -> Result<usize> {
        self.check_branch(&branch)?;
        self.branches.push(branch);
        Ok(self.branches.len() - 1)
    }

    pub fn add_hvdc(&mut self, link: HvdcLink) -> Result<usize> {
        self.resolve(&link.name, link.bus_from)?;
        self.resolve(&link.name, link.bus_to)?;
        self.hvdc_links.push(link);
        Ok(self.hvdc_links.len() - 1)
    }

    pub fn add_injection(&mut self, injection: Injection) -> Result<usize> {
        self.resolve(&injection.name, injection.bus)?;
        self.injections.push(injection);
        Ok(self.injections.len() - 1)
    }

    /// Removes a bus that nothing refers to any more. References are counted
    /// from the current element endpoints, so edits made through the `*_mut`
    /// accessors are seen.
    pub fn remove_bus(&mut self, id: BusId) -> Result<Bus> {
        let index = self.bus_index(id).ok_or(PowerFlowError::DanglingReference {
            element: "remove_bus".into(),
            bus: id,
        })?;
        let references = self.references(id);
        if references > 0 {
            return Err(PowerFlowError::BusInUse { bus: id, references });
        }
        self.bus_lookup.remove(&id);
        let bus = self.buses.swap_remove(index);
        if let Some(moved) = self.buses.get(index) {
            self.bus_lookup.insert(moved.id, index);
        }
        Ok(bus)
    }

    pub fn remove_branch(&mut self, index: usize) -> Result<Branch> {
        if index >= self.branches.len() {
            return Err(PowerFlowError::UnknownElement {
                kind: "branch",
                index,
            });
        }
        Ok(self.branches.swap_remove(index))
    }

    pub fn remove_hvdc(&mut self, index: usize) -> Result<HvdcLink> {
        if index >= self.hvdc_links.len() {
            return Err(PowerFlowError::UnknownElement { kind: "hvdc", index });
        }
        Ok(self.hvdc_links.swap_remove(index))
    }

    pub fn remove_injection(&mut self, index: usize) -> Result<Injection> {
        if index >= self.injections.len() {
            return Err(PowerFlowError::UnknownElement {
                kind: "injection",
                index,
            });
        }
        Ok(self.injections.swap_remove(index))
    }

    fn resolve(&self, element: &str, bus: BusId) -> Result<usize> {
        self.bus_index(bus)
            .ok_or_else(|| PowerFlowError::DanglingReference {
                element: element.to_string(),
                bus,
            })
    }

    fn check_branch(&self, branch: &Branch) -> Result<()> {
        self.resolve(&branch.name, branch.bus_from)?;
        self.resolve(&branch.name, branch.bus_to)?;
        if branch.r == 0.0 && branch.x == 0.0 {
            return Err(PowerFlowError::ZeroImpedance(branch.name.clone()));
        }
        Ok(())
    }

    /// Number of branch ends, HVDC ends and injections attached to `bus`.
    fn references(&self, bus: BusId) -> usize {
        let ends = |a: BusId, b: BusId| usize::from(a == bus) + usize::from(b == bus);
        self.branches.iter().map(|b| ends(b.bus_from, b.bus_to)).sum::<usize>()
            + self.hvdc_links.iter().map(|l| ends(l.bus_from, l.bus_to)).sum::<usize>()
            + self.injections.iter().filter(|i| i.bus == bus).count()
    }

    /// Global indices of the two buses of branch `index`.
    pub fn branch_buses(&self, index: usize) -> Result<(usize, usize)> {
        let branch = self.branches.get(index).ok_or(PowerFlowError::UnknownElement {
            kind: "branch",
            index,
        })?;
        Ok((
            self.resolve(&branch.name, branch.bus_from)?,
            self.resolve(&branch.name, branch.bus_to)?,
        ))
    }

    /// Global indices of the two buses of HVDC link `index`.
    pub fn hvdc_buses(&self, index: usize) -> Result<(usize, usize)> {
        let link = self.hvdc_links.get(index).ok_or(PowerFlowError::UnknownElement {
            kind: "hvdc",
            index,
        })?;
        Ok((
            self.resolve(&link.name, link.bus_from)?,
            self.resolve(&link.name, link.bus_to)?,
        ))
    }

    /// Checks that every device still points at an existing bus and that no
    /// branch lost its impedance.
    pub fn validate(&self) -> Result<()> {
        for b in &self.branches {
            self.check_branch(b)?;
        }
        for l in &self.hvdc_links {
            self.resolve(&l.name, l.bus_from)?;
            self.resolve(&l.name, l.bus_to)?;
        }
        for i in &self.injections {
            self.resolve(&i.name, i.bus)?;
        }
        Ok(())
    }

    /// From/to bus global indices of every branch.
    pub fn branch_endpoints(&self) -> Result<(Vec<usize>, Vec<usize>)> {
        (0..self.branches.len())
            .map(|k| self.branch_buses(k))
            .collect::<Result<Vec<_>>>()
            .map(|pairs| pairs.into_iter().unzip())
    }

    /// Per-bus `(vmax, vmin)` arrays.
    pub fn voltage_limits(&self) -> (Vec<f64>, Vec<f64>) {
        self.buses
            .iter()
            .map(|b| (b.limits.vmax, b.limits.vmin))
            .unzip()
    }

    /// For each branch, its position in the transformer numbering.
    pub fn transformer_numbering(&self) -> Vec<Option<usize>> {
        let mut next = 0;
        self.branches
            .iter()
            .map(|b| {
                b.is_transformer().then(|| {
                    next += 1;
                    next - 1
                })
            })
            .collect()
    }

    /// Branch index of every transformer, in transformer order.
    pub fn transformer_branches(&self) -> Vec<usize> {
        self.branches
            .iter()
            .enumerate()
            .filter_map(|(k, b)| b.is_transformer().then_some(k))
            .collect()
    }

    /// Bus → indices of the injections attached to it.
    pub fn bus_injections(&self) -> Result<Vec<Vec<usize>>> {
        let mut table = vec![Vec::new(); self.buses.len()];
        for (k, inj) in self.injections.iter().enumerate() {
            table[self.resolve(&inj.name, inj.bus)?].push(k);
        }
        Ok(table)
    }

    /// Builds the active-branch adjacency in O(V + E).
    pub fn adjacency(&self) -> Result<Adjacency> {
        let n = self.buses.len();
        let mut edges = Vec::with_capacity(self.branches.len());
        for (k, branch) in self.branches.iter().enumerate() {
            let (f, t) = self.branch_buses(k)?;
            if branch.active && self.buses[f].active && self.buses[t].active {
                edges.push((k, f, t));
            }
        }

        let mut offsets = vec![0usize; n + 1];
        for &(_, f, t) in &edges {
            offsets[f + 1] += 1;
            if t != f {
                offsets[t + 1] += 1;
            }
        }
        for i in 0..n {
            offsets[i + 1] += offsets[i];
        }

        let mut fill = offsets.clone();
        let mut entries = vec![
            Incidence {
                branch: 0,
                neighbor: 0
            };
            offsets[n]
        ];
        for &(k, f, t) in &edges {
            entries[fill[f]] = Incidence {
                branch: k,
                neighbor: t,
            };
            fill[f] += 1;
            if t != f {
                entries[fill[t]] = Incidence {
                    branch: k,
                    neighbor: f,
                };
                fill[t] += 1;
            }
        }
        debug!(buses = n, edges = edges.len(), "built adjacency");
        Ok(Adjacency { offsets, entries })
    }

    /// Loads step `t` of every injection profile into the setpoints.
    pub fn set_time_step(&mut self, t: usize) {
        self.injections
            .iter_mut()
            .for_each(|inj| inj.set_profile_values(t));
    }

    /// Makes sure every injection has profiles of `len` steps.
    pub fn ensure_profiles_exist(&mut self, len: usize) {
        for inj in self.injections.iter_mut() {
            if inj.ensure_profiles_exist(len) {
                debug!(device = %inj.name, "created profiles");
            }
        }
    }

    pub fn bus_names(&self) -> Vec<String> {
        self.buses.iter().map(|b| b.name.clone()).collect()
    }

    pub fn branch_names(&self) -> Vec<String> {
        self.branches.iter().map(|b| b.name.clone()).collect()
    }

    pub fn transformer_names(&self) -> Vec<String> {
        self.branches
            .iter()
            .filter(|b| b.is_transformer())
            .map(|b| b.name.clone())
            .collect()
    }

    pub fn hvdc_names(&self) -> Vec<String> {
        self.hvdc_links.iter().map(|l| l.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring() -> Network {
        let mut net = Network::default();
        for i in 0..4 {
            net.add_bus(Bus::new(i, format!("b{i}"), 20.0)).unwrap();
        }
        net.add_branch(Branch::line("l01", 0, 1, 0.01, 0.1)).unwrap();
        net.add_branch(Branch::line("l12", 1, 2, 0.01, 0.1)).unwrap();
        net.add_branch(Branch::line("l23", 2, 3, 0.01, 0.1).inactive())
            .unwrap();
        net.add_branch(Branch::line("l30", 3, 0, 0.01, 0.1)).unwrap();
        net
    }

    #[test]
    fn dangling_branch_is_rejected() {
        let mut net = Network::default();
        net.add_bus(Bus::new(1, "a", 10.0)).unwrap();
        let err = net.add_branch(Branch::line("l", 1, 7, 0.0, 0.1)).unwrap_err();
        assert_eq!(
            err,
            PowerFlowError::DanglingReference {
                element: "l".into(),
                bus: BusId(7)
            }
        );
        assert_eq!(net.n_branches(), 0);
        assert!(net.add_injection(Injection::load("ld", 9, 1.0, 0.0)).is_err());
    }

    #[test]
    fn duplicate_bus_is_rejected() {
        let mut net = Network::default();
        net.add_bus(Bus::new(1, "a", 10.0)).unwrap();
        assert_eq!(
            net.add_bus(Bus::new(1, "b", 10.0)),
            Err(PowerFlowError::DuplicateBus(BusId(1)))
        );
    }

    #[test]
    fn adjacency_skips_inactive_branches() {
        let net = ring();
        let adj = net.adjacency().unwrap();
        assert_eq!(adj.n_buses(), 4);
        assert_eq!(adj.degree(0), 2);
        assert_eq!(adj.degree(2), 1);
        assert_eq!(
            adj.incident(0),
            &[
                Incidence {
                    branch: 0,
                    neighbor: 1
                },
                Incidence {
                    branch: 3,
                    neighbor: 3
                }
            ]
        );
    }

    #[test]
    fn remove_bus_requires_no_references() {
        let mut net = ring();
        assert!(matches!(
            net.remove_bus(BusId(2)),
            Err(PowerFlowError::BusInUse { references: 2, .. })
        ));
        net.remove_branch(2).unwrap();
        net.remove_branch(1).unwrap();
        let removed = net.remove_bus(BusId(2)).unwrap();
        assert_eq!(removed.name, "b2");
        // bus 3 was swapped into slot 2
        assert_eq!(net.bus_index(BusId(3)), Some(2));
        assert!(net.validate().is_ok());
    }

    #[test]
    fn edited_endpoints_move_the_reference() {
        let mut net = Network::default();
        for i in 1..=3 {
            net.add_bus(Bus::new(i, format!("b{i}"), 10.0)).unwrap();
        }
        net.add_branch(Branch::line("l12", 1, 2, 0.01, 0.1)).unwrap();
        net.branch_mut(0).unwrap().bus_to = BusId(3);

        assert!(matches!(
            net.remove_bus(BusId(3)),
            Err(PowerFlowError::BusInUse { references: 1, .. })
        ));
        assert!(net.remove_bus(BusId(2)).is_ok());
        assert!(net.validate().is_ok());

        net.add_injection(Injection::load("ld", 1, 1.0, 0.0)).unwrap();
        net.injection_mut(0).unwrap().bus = BusId(3);
        assert!(matches!(
            net.remove_bus(BusId(3)),
            Err(PowerFlowError::BusInUse { references: 2, .. })
        ));
        assert!(matches!(
            net.remove_bus(BusId(1)),
            Err(PowerFlowError::BusInUse { references: 1, .. })
        ));
    }

    #[test]
    fn zero_impedance_branch_is_rejected() {
        let mut net = Network::default();
        net.add_bus(Bus::new(1, "a", 10.0)).unwrap();
        net.add_bus(Bus::new(2, "b", 10.0)).unwrap();
        assert_eq!(
            net.add_branch(Branch::line("tie", 1, 2, 0.0, 0.0)),
            Err(PowerFlowError::ZeroImpedance("tie".into()))
        );
        assert_eq!(net.n_branches(), 0);

        net.add_branch(Branch::line("l", 1, 2, 0.0, 0.1)).unwrap();
        net.branch_mut(0).unwrap().x = 0.0;
        assert_eq!(net.validate(), Err(PowerFlowError::ZeroImpedance("l".into())));
    }

    #[test]
    fn time_step_loads_every_profile() {
        let mut net = Network::default();
        net.add_bus(Bus::new(1, "a", 10.0)).unwrap();
        net.add_injection(Injection::load("ld", 1, 10.0, 2.0)).unwrap();
        net.add_injection(Injection::shunt("cap", 1, 0.0, 5.0)).unwrap();

        net.ensure_profiles_exist(4);
        assert!(net.injections().iter().all(|inj| inj.profiles.is_some()));
        net.injection_mut(0)
            .unwrap()
            .profiles
            .as_mut()
            .unwrap()
            .set(PropertyId::P, vec![10.0, 12.0, 14.0, 16.0]);
        net.injection_mut(1)
            .unwrap()
            .profiles
            .as_mut()
            .unwrap()
            .set(PropertyId::B, vec![5.0, 0.0, 5.0, 0.0]);

        net.set_time_step(2);
        assert_eq!(net.injections()[0].property(PropertyId::P), Some(14.0));
        assert_eq!(net.injections()[0].property(PropertyId::Q), Some(2.0));
        assert_eq!(net.injections()[1].property(PropertyId::B), Some(5.0));
        net.set_time_step(3);
        assert_eq!(net.injections()[1].property(PropertyId::B), Some(0.0));

        // existing profiles of the right length are kept
        net.ensure_profiles_exist(4);
        net.set_time_step(1);
        assert_eq!(net.injections()[0].property(PropertyId::P), Some(12.0));
    }

    #[test]
    fn transformer_numbering_follows_branch_order() {
        let mut net = ring();
        net.add_branch(Branch::transformer("t", 0, 2, 0.0, 0.05, 1.0))
            .unwrap();
        assert_eq!(net.n_transformers(), 1);
        assert_eq!(
            net.transformer_numbering(),
            vec![None, None, None, None, Some(0)]
        );
        assert_eq!(net.transformer_branches(), vec![4]);
    }
}
