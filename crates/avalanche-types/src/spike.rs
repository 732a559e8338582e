//! Spike events and the timestamp-grouped rows they arrive in.

use serde::{Deserialize, Serialize};

use crate::ids::NodeId;

/// Simulation time step of a spike.
pub type Timestamp = u64;

/// A single firing of one neuron at one time step.
///
/// Spikes are immutable values. The same node may fire at many time steps,
/// and two spikes are equal when both their time and their node match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Spike {
    /// Time step at which the neuron fired.
    pub timestamp: Timestamp,
    /// The neuron that fired.
    pub node: NodeId,
}

impl Spike {
    /// Create a spike for `node` at `timestamp`.
    pub const fn new(timestamp: Timestamp, node: NodeId) -> Self {
        Self { timestamp, node }
    }
}

/// All spikes observed at one time step, in input order.
///
/// This is the unit the input stream is read in: one row per time step,
/// first the timestamp, then one or more node ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpikeRow {
    /// Time step shared by every spike in the row.
    pub timestamp: Timestamp,
    /// Nodes that fired at this time step.
    pub nodes: Vec<NodeId>,
}

impl SpikeRow {
    /// Create a row from a timestamp and its nodes.
    pub const fn new(timestamp: Timestamp, nodes: Vec<NodeId>) -> Self {
        Self { timestamp, nodes }
    }

    /// Iterate the row as individual spikes, preserving node order.
    pub fn spikes(&self) -> impl Iterator<Item = Spike> + '_ {
        self.nodes
            .iter()
            .map(move |&node| Spike::new(self.timestamp, node))
    }

    /// Number of spikes in the row.
    pub const fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the row carries no spikes.
    pub const fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
