//! Random node selection on the grid.

use avalanche_types::{Grid, GridCoord, NodeId};
use rand::Rng;

use crate::error::SynthError;

/// Attempts before a rejection sampler gives up.
const MAX_ATTEMPTS: u32 = 10_000;

/// Any node of the grid, uniformly.
pub(crate) fn any_node(grid: &Grid, rng: &mut impl Rng) -> NodeId {
    NodeId(rng.random_range(1..=grid.capacity()))
}

/// A node strictly closer than `radius` cells to `origin`.
///
/// Offsets are drawn from the bounding square and clamped to the grid
/// edge. Falls back to `origin` itself (distance zero) if sampling keeps
/// missing, which only happens for radii well below one cell.
pub(crate) fn node_near(
    grid: &Grid,
    origin: NodeId,
    radius: f64,
    rng: &mut impl Rng,
) -> Result<NodeId, SynthError> {
    let centre = grid.coordinate(origin)?;
    let reach = reach(radius, grid.side());
    for _ in 0..MAX_ATTEMPTS {
        let row = offset(centre.row, reach, grid.side(), rng);
        let col = offset(centre.col, reach, grid.side(), rng);
        let candidate = GridCoord::new(row, col);
        if centre.distance_to(candidate) < radius {
            return Ok(grid.node_at(candidate)?);
        }
    }
    Ok(origin)
}

/// A node at least `radius` cells away from every node in `avoid`.
///
/// # Errors
///
/// Returns [`SynthError::InvalidParams`] if no such node turns up, which
/// means the grid is too small for the radius.
pub(crate) fn node_far_from(
    grid: &Grid,
    avoid: &[NodeId],
    radius: f64,
    rng: &mut impl Rng,
) -> Result<NodeId, SynthError> {
    for _ in 0..MAX_ATTEMPTS {
        let candidate = any_node(grid, rng);
        let mut clear = true;
        for &other in avoid {
            if grid.distance(candidate, other)? < radius {
                clear = false;
                break;
            }
        }
        if clear {
            return Ok(candidate);
        }
    }
    Err(SynthError::invalid(format!(
        "grid of side {} has no room for spikes {radius} cells apart",
        grid.side()
    )))
}

/// Largest whole-cell offset that can still be inside `radius`, capped at
/// the grid side.
fn reach(radius: f64, side: u32) -> u32 {
    let mut reach: u32 = 0;
    while reach < side && f64::from(reach.saturating_add(1)) < radius {
        reach = reach.saturating_add(1);
    }
    reach
}

/// `value` moved by a random amount in `[-reach, reach]`, clamped to `1..=side`.
fn offset(value: u32, reach: u32, side: u32, rng: &mut impl Rng) -> u32 {
    let low = value.saturating_sub(reach).max(1);
    let high = value.saturating_add(reach).min(side);
    rng.random_range(low..=high)
}
