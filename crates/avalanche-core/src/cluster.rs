//! A single avalanche in progress: a time-ordered, mergeable run of spikes.
//!
//! Spikes live in an arena (`Vec<Link>`) and are chained through `prev` /
//! `next` indices, giving a doubly linked list without shared ownership.
//! Appending at either end is O(1). Absorbing another cluster moves its
//! spikes into this arena one by one and consumes the source, so a spike is
//! never owned by two clusters.
//!
//! The list is kept sorted by non-decreasing timestamp at all times.

use avalanche_types::{ClusterId, Grid, GridError, Spike, Timestamp};
use serde::{Deserialize, Serialize};

use crate::window::MatchWindow;

/// Arena slot holding one spike and its neighbours in time order.
#[derive(Debug, Clone)]
struct Link {
    spike: Spike,
    prev: Option<usize>,
    next: Option<usize>,
}

/// An ordered, mergeable sequence of spikes.
///
/// A cluster is never empty: it is created from its first spike and only
/// ever grows until it is either absorbed into another cluster or dropped.
#[derive(Debug, Clone)]
pub struct Cluster {
    id: ClusterId,
    links: Vec<Link>,
    head: usize,
    tail: usize,
    /// Timestamp of the head spike.
    first: Timestamp,
    /// Timestamp of the tail spike.
    last: Timestamp,
}

/// Per-avalanche summary row: when it started, ended, and how big it got.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvalancheSummary {
    /// Creation id of the cluster.
    pub id: ClusterId,
    /// Earliest member timestamp.
    pub start: Timestamp,
    /// Latest member timestamp.
    pub end: Timestamp,
    /// Number of time steps covered, `end - start + 1`.
    pub width: u64,
    /// Number of member spikes.
    pub size: usize,
}

impl Cluster {
    /// Start a new cluster from its first spike.
    pub fn new(id: ClusterId, spike: Spike) -> Self {
        Self {
            id,
            links: vec![Link {
                spike,
                prev: None,
                next: None,
            }],
            head: 0,
            tail: 0,
            first: spike.timestamp,
            last: spike.timestamp,
        }
    }

    /// Creation id of this cluster.
    pub const fn id(&self) -> ClusterId {
        self.id
    }

    /// Number of spikes in the cluster.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Whether the cluster still holds only its founding spike.
    pub fn is_singleton(&self) -> bool {
        self.links.len() == 1
    }

    /// Timestamp of the earliest spike.
    pub const fn first_timestamp(&self) -> Timestamp {
        self.first
    }

    /// Timestamp of the latest spike.
    pub const fn last_timestamp(&self) -> Timestamp {
        self.last
    }

    /// Iterate spikes in ascending timestamp order.
    ///
    /// The iterator is lazy; call `iter` again to restart from the head.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            cluster: self,
            cursor: Some(self.head),
            remaining: self.links.len(),
        }
    }

    /// Append a spike at the tail.
    ///
    /// The caller guarantees `spike.timestamp >= self.last_timestamp()`;
    /// spikes are fed in stream order, so this holds for every append made
    /// while placing a spike.
    pub fn append(&mut self, spike: Spike) {
        self.push_back(spike);
    }

    /// Move every spike of `other` into this cluster, keeping time order.
    ///
    /// Each spike of `other`, taken head to tail, goes to the head if it is
    /// no later than the current head, to the tail if it is no earlier than
    /// the current tail, and otherwise directly in front of the first spike
    /// that is not earlier than it. `other` is consumed.
    pub fn absorb(&mut self, other: Self) {
        self.links.reserve(other.len());
        for spike in &other {
            if spike.timestamp <= self.first {
                self.push_front(spike);
            } else if spike.timestamp >= self.last {
                self.push_back(spike);
            } else {
                match self.last_before(spike.timestamp) {
                    Some(at) => self.insert_after(at, spike),
                    None => self.push_front(spike),
                }
            }
        }
    }

    /// Whether some recent member lies within the matching window of `spike`.
    ///
    /// Walks back from the tail while members are less than `tau` steps
    /// older than `spike` and stops at the first one closer than `radius`.
    ///
    /// # Errors
    ///
    /// Returns [`GridError`] if a node id is outside the grid.
    pub fn has_neighbor(
        &self,
        spike: Spike,
        window: &MatchWindow,
        grid: &Grid,
    ) -> Result<bool, GridError> {
        let mut cursor = Some(self.tail);
        while let Some(link) = cursor.and_then(|idx| self.links.get(idx)) {
            let elapsed = spike.timestamp.saturating_sub(link.spike.timestamp);
            if !window.within_tau(elapsed) {
                break;
            }
            if window.within_radius(grid.distance(link.spike.node, spike.node)?) {
                return Ok(true);
            }
            cursor = link.prev;
        }
        Ok(false)
    }

    /// Start, end, width, and size of this cluster.
    pub fn summary(&self) -> AvalancheSummary {
        AvalancheSummary {
            id: self.id,
            start: self.first,
            end: self.last,
            width: self.last.saturating_sub(self.first).saturating_add(1),
            size: self.len(),
        }
    }

    // -------------------------------------------------------------------
    // Arena plumbing
    // -------------------------------------------------------------------

    fn push_back(&mut self, spike: Spike) {
        let idx = self.links.len();
        let old_tail = self.tail;
        self.links.push(Link {
            spike,
            prev: Some(old_tail),
            next: None,
        });
        if let Some(link) = self.links.get_mut(old_tail) {
            link.next = Some(idx);
        }
        self.tail = idx;
        self.last = spike.timestamp;
    }

    fn push_front(&mut self, spike: Spike) {
        let idx = self.links.len();
        let old_head = self.head;
        self.links.push(Link {
            spike,
            prev: None,
            next: Some(old_head),
        });
        if let Some(link) = self.links.get_mut(old_head) {
            link.prev = Some(idx);
        }
        self.head = idx;
        self.first = spike.timestamp;
    }

    /// Splice `spike` directly after the link at `at`.
    fn insert_after(&mut self, at: usize, spike: Spike) {
        let idx = self.links.len();
        let Some(anchor) = self.links.get_mut(at) else {
            return;
        };
        let next = anchor.next;
        anchor.next = Some(idx);
        self.links.push(Link {
            spike,
            prev: Some(at),
            next,
        });
        match next.and_then(|n| self.links.get_mut(n)) {
            Some(successor) => successor.prev = Some(idx),
            None => {
                self.tail = idx;
                self.last = spike.timestamp;
            }
        }
    }

    /// Index of the latest spike strictly earlier than `timestamp`.
    fn last_before(&self, timestamp: Timestamp) -> Option<usize> {
        let mut cursor = Some(self.tail);
        while let Some(idx) = cursor {
            let link = self.links.get(idx)?;
            if link.spike.timestamp < timestamp {
                return Some(idx);
            }
            cursor = link.prev;
        }
        None
    }
}

/// Lazy head-to-tail iterator over a [`Cluster`].
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    cluster: &'a Cluster,
    cursor: Option<usize>,
    remaining: usize,
}

impl Iterator for Iter<'_> {
    type Item = Spike;

    fn next(&mut self) -> Option<Self::Item> {
        let link = self.cursor.and_then(|idx| self.cluster.links.get(idx))?;
        self.cursor = link.next;
        self.remaining = self.remaining.saturating_sub(1);
        Some(link.spike)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl<'a> IntoIterator for &'a Cluster {
    type Item = Spike;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
