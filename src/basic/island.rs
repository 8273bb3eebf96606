//! Splits a network into electrically independent islands.
//!
//! Islands are the connected components of the active-branch graph, found by
//! breadth-first search. Start buses are taken in ascending global order and
//! neighbours in ascending branch order, so identical networks always produce
//! identical islands with identical local numbering.

use std::collections::{HashMap, VecDeque};

use tracing::{debug, info};

use super::error::{IndexSpace, PowerFlowError, Result};
use super::network::Network;

/// Bidirectional map between an island's local numbering and the global one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexMapping {
    local_to_global: Vec<usize>,
    global_to_local: HashMap<usize, usize>,
}

impl IndexMapping {
    /// Appends `global` as the next local index, unless it is already mapped.
    /// Returns the local index.
    pub fn push(&mut self, global: usize) -> usize {
        let next = self.local_to_global.len();
        let local = *self.global_to_local.entry(global).or_insert(next);
        if local == next {
            self.local_to_global.push(global);
        }
        local
    }

    pub fn len(&self) -> usize {
        self.local_to_global.len()
    }

    pub fn is_empty(&self) -> bool {
        self.local_to_global.is_empty()
    }

    pub fn to_global(&self, local: usize) -> Option<usize> {
        self.local_to_global.get(local).copied()
    }

    pub fn to_local(&self, global: usize) -> Option<usize> {
        self.global_to_local.get(&global).copied()
    }

    pub fn contains_global(&self, global: usize) -> bool {
        self.global_to_local.contains_key(&global)
    }

    pub fn local_to_global(&self) -> &[usize] {
        &self.local_to_global
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.local_to_global.iter().copied().enumerate()
    }
}

/// A maximal connected sub-network. Transient: built fresh for each solve.
#[derive(Debug, Clone, Default)]
pub struct Island {
    pub id: usize,
    pub buses: IndexMapping,
    pub branches: IndexMapping,
    /// Subset of `branches` that are transformers, in transformer numbering.
    pub transformers: IndexMapping,
    /// HVDC links whose sending bus lies in this island.
    pub hvdc: IndexMapping,
    /// Global indices of active injections on this island's buses, grouped by
    /// local bus order.
    pub injections: IndexMapping,
}

/// Borrowed view of an island's local → global maps, as consumed by the
/// result aggregator.
#[derive(Debug, Clone, Copy)]
pub struct IslandIndices<'a> {
    pub island: usize,
    pub buses: &'a [usize],
    pub branches: &'a [usize],
    pub transformers: &'a [usize],
    pub hvdc: &'a [usize],
}

impl Island {
    pub fn n_buses(&self) -> usize {
        self.buses.len()
    }

    pub fn n_branches(&self) -> usize {
        self.branches.len()
    }

    pub fn indices(&self) -> IslandIndices<'_> {
        IslandIndices {
            island: self.id,
            buses: self.buses.local_to_global(),
            branches: self.branches.local_to_global(),
            transformers: self.transformers.local_to_global(),
            hvdc: self.hvdc.local_to_global(),
        }
    }

    /// Local index of a global bus, as an error when the bus is elsewhere.
    pub fn local_bus(&self, global: usize) -> Result<usize> {
        self.buses
            .to_local(global)
            .ok_or_else(|| PowerFlowError::IndexMapInconsistency {
                island: self.id,
                space: IndexSpace::Bus,
                index: global,
                reason: "bus not in island".into(),
            })
    }
}

/// Partitions the active part of `network` into islands.
pub fn decompose(network: &Network) -> Result<Vec<Island>> {
    let adjacency = network.adjacency()?;
    let bus_injections = network.bus_injections()?;
    let transformer_numbering = network.transformer_numbering();

    let mut hvdc_by_bus = vec![Vec::new(); network.n_buses()];
    for (k, link) in network.hvdc_links().iter().enumerate() {
        let (f, t) = network.hvdc_buses(k)?;
        let buses = network.buses();
        if link.active && buses[f].active && buses[t].active {
            hvdc_by_bus[f].push(k);
        }
    }

    let mut visited = vec![false; network.n_buses()];
    let mut branch_seen = vec![false; network.n_branches()];
    let mut islands = Vec::new();

    for start in 0..network.n_buses() {
        if visited[start] || !network.buses()[start].active {
            continue;
        }
        let mut island = Island {
            id: islands.len(),
            ..Default::default()
        };
        let mut queue = VecDeque::new();
        visited[start] = true;
        queue.push_back(start);

        while let Some(bus) = queue.pop_front() {
            island.buses.push(bus);
            for inc in adjacency.incident(bus) {
                if !branch_seen[inc.branch] {
                    branch_seen[inc.branch] = true;
                    island.branches.push(inc.branch);
                    if let Some(tr) = transformer_numbering[inc.branch] {
                        island.transformers.push(tr);
                    }
                }
                if !visited[inc.neighbor] {
                    visited[inc.neighbor] = true;
                    queue.push_back(inc.neighbor);
                }
            }
        }

        let members = island.buses.local_to_global().to_vec();
        for bus in members {
            for &link in &hvdc_by_bus[bus] {
                island.hvdc.push(link);
            }
            for &inj in &bus_injections[bus] {
                if network.injections()[inj].active {
                    island.injections.push(inj);
                }
            }
        }

        debug!(
            island = island.id,
            buses = island.n_buses(),
            branches = island.n_branches(),
            "island found"
        );
        islands.push(island);
    }

    info!(islands = islands.len(), "network decomposed");
    Ok(islands)
}
