//! The four trace generators.
//!
//! All time gaps are derived from `tau`: steps inside an avalanche are
//! `0..tau` apart, quiet gaps between avalanches are strictly longer than
//! `tau`. Spatial steps inside an avalanche stay strictly inside `radius`.

use avalanche_types::{NodeId, SpikeRow, Timestamp};
use rand::Rng;
use tracing::debug;

use crate::error::SynthError;
use crate::placement::{any_node, node_far_from, node_near};
use crate::{SynthParams, SyntheticTrace};

/// Latest possible first timestamp of a trace.
const START_SPREAD: Timestamp = 600;

/// Probability that a growing avalanche closes its current time step.
const FLUSH_CHANCE: f64 = 0.7;

/// Extra quiet time allowed between basic avalanches and singles.
const BASIC_GAP_SPREAD: u64 = 1_350;

/// Extra quiet time allowed between merging avalanches.
const MERGING_GAP_SPREAD: u64 = 2_750;

/// Extra slack before a merging avalanche's root spike.
const MERGING_ROOT_SLACK: u64 = 1_000;

/// Extra quiet time allowed between spatial-noise spikes.
const SPATIAL_NOISE_GAP_SPREAD: u64 = 949;

/// Chained avalanches of random sizes with isolated spikes in between.
///
/// `spikes` is the total budget shared by `avalanches` avalanches (at least
/// two each). After each avalanche up to `singles` isolated spikes are
/// scattered, each separated from everything else by a quiet gap. Every
/// spike of an avalanche is within the window of the spike before it.
///
/// # Errors
///
/// Returns [`SynthError::InvalidParams`] if there are no avalanches or
/// fewer than two spikes per avalanche.
pub fn basic(
    params: &SynthParams,
    spikes: usize,
    avalanches: usize,
    singles: usize,
    rng: &mut impl Rng,
) -> Result<SyntheticTrace, SynthError> {
    params.validate()?;
    if avalanches == 0 {
        return Err(SynthError::invalid("at least one avalanche is required"));
    }
    if spikes < avalanches.saturating_mul(2) {
        return Err(SynthError::invalid(format!(
            "{spikes} spikes cannot fill {avalanches} avalanches of at least 2 spikes"
        )));
    }

    let mut trace = SyntheticTrace::default();
    let mut clock: Timestamp = rng.random_range(0..=START_SPREAD);
    let mut spikes_left = spikes;
    let mut singles_left = singles;

    for remaining in (1..=avalanches).rev() {
        // Leave two spikes for each avalanche still to come.
        let reserved = remaining.saturating_sub(1).saturating_mul(2);
        let size = rng.random_range(2..=spikes_left.saturating_sub(reserved).max(2));
        let end = chain(params, clock, size, &mut trace.rows, rng)?;
        trace.expected_sizes.push(size);
        spikes_left = spikes_left.saturating_sub(size);
        clock = end.saturating_add(quiet_gap(params.tau, BASIC_GAP_SPREAD, rng));

        if singles_left > 0 {
            let count = rng.random_range(1..=singles_left);
            for _ in 0..count {
                let node = any_node(&params.grid, rng);
                trace.rows.push(SpikeRow::new(clock, vec![node]));
                clock = clock.saturating_add(quiet_gap(params.tau, BASIC_GAP_SPREAD, rng));
            }
            singles_left = singles_left.saturating_sub(count);
        }
    }

    debug!(
        rows = trace.rows.len(),
        avalanches = trace.expected_sizes.len(),
        singles = singles.saturating_sub(singles_left),
        "generated basic trace"
    );
    Ok(trace)
}

/// Avalanches of `2 * length + 1` spikes built as two chains that meet.
///
/// Each avalanche has a root spike. Two chains of `length` steps grow
/// backwards in time from the root, one spike per chain per time step, so
/// read forwards they start apart and converge on the root. The detector
/// sees two clusters that merge into one.
///
/// # Errors
///
/// Returns [`SynthError::InvalidParams`] if `length` or `avalanches` is
/// zero.
pub fn merging(
    params: &SynthParams,
    length: usize,
    avalanches: usize,
    rng: &mut impl Rng,
) -> Result<SyntheticTrace, SynthError> {
    params.validate()?;
    if length == 0 || avalanches == 0 {
        return Err(SynthError::invalid(
            "merging traces need a positive length and avalanche count",
        ));
    }

    let steps = u64::try_from(length).unwrap_or(u64::MAX);
    let span = steps.saturating_mul(params.tau.saturating_sub(1));
    let size = length.saturating_mul(2).saturating_add(1);
    let mut trace = SyntheticTrace::default();
    let mut clock: Timestamp = rng.random_range(0..=START_SPREAD);

    for _ in 0..avalanches {
        // The chains reach back at most `span` steps, never before `clock`.
        let root_time =
            clock.saturating_add(rng.random_range(span..=span.saturating_add(MERGING_ROOT_SLACK)));
        let root = any_node(&params.grid, rng);

        let mut backwards = Vec::with_capacity(length.saturating_add(1));
        backwards.push(SpikeRow::new(root_time, vec![root]));
        let (mut left, mut right) = (root, root);
        let mut time = root_time;
        for _ in 0..length {
            left = node_near(&params.grid, left, params.radius, rng)?;
            right = node_near(&params.grid, right, params.radius, rng)?;
            time = time.saturating_sub(within_tau(params.tau, rng));
            backwards.push(SpikeRow::new(time, vec![left, right]));
        }
        trace.rows.extend(backwards.into_iter().rev());
        trace.expected_sizes.push(size);
        clock = root_time.saturating_add(quiet_gap(params.tau, MERGING_GAP_SPREAD, rng));
    }

    debug!(
        rows = trace.rows.len(),
        avalanches,
        size,
        "generated merging trace"
    );
    Ok(trace)
}

/// Spikes each close in space to the previous one but always separated by
/// more than `tau` steps. No avalanches.
///
/// # Errors
///
/// Returns [`SynthError::InvalidParams`] if `spikes` is zero.
pub fn spatial_noise(
    params: &SynthParams,
    spikes: usize,
    rng: &mut impl Rng,
) -> Result<SyntheticTrace, SynthError> {
    params.validate()?;
    if spikes == 0 {
        return Err(SynthError::invalid("at least one spike is required"));
    }

    let mut trace = SyntheticTrace::default();
    let mut clock: Timestamp = rng.random_range(0..=START_SPREAD);
    let mut current = any_node(&params.grid, rng);
    trace.rows.push(SpikeRow::new(clock, vec![current]));
    for _ in 1..spikes {
        clock = clock.saturating_add(quiet_gap(params.tau, SPATIAL_NOISE_GAP_SPREAD, rng));
        current = node_near(&params.grid, current, params.radius, rng)?;
        trace.rows.push(SpikeRow::new(clock, vec![current]));
    }

    debug!(rows = trace.rows.len(), "generated spatial noise trace");
    Ok(trace)
}

/// Spikes close in time but at least `radius` apart from every spike still
/// inside the window. No avalanches.
///
/// Consecutive rows are between `tau / 2 + 1` and `tau - 1` steps apart, so
/// only the previous row is ever inside the window. With `multiple` set a
/// row may carry several spikes, each far from the others.
///
/// # Errors
///
/// Returns [`SynthError::InvalidParams`] if `spikes` is zero, `tau` is
/// below 3, or the grid is too small to keep spikes apart.
pub fn temporal_noise(
    params: &SynthParams,
    spikes: usize,
    multiple: bool,
    rng: &mut impl Rng,
) -> Result<SyntheticTrace, SynthError> {
    params.validate()?;
    if spikes == 0 {
        return Err(SynthError::invalid("at least one spike is required"));
    }
    let min_gap = (params.tau / 2).saturating_add(1);
    let max_gap = params.tau.saturating_sub(1);
    if min_gap > max_gap {
        return Err(SynthError::invalid(format!(
            "tau {} leaves no room for crowded but non-overlapping rows",
            params.tau
        )));
    }

    let mut trace = SyntheticTrace::default();
    let mut clock: Timestamp = rng.random_range(0..=START_SPREAD);
    let first = any_node(&params.grid, rng);
    trace.rows.push(SpikeRow::new(clock, vec![first]));
    let mut previous: Vec<NodeId> = vec![first];
    let mut pending: Vec<NodeId> = Vec::new();
    clock = clock.saturating_add(rng.random_range(min_gap..=max_gap));

    for placed in 1..spikes {
        let avoid: Vec<NodeId> = previous.iter().chain(&pending).copied().collect();
        pending.push(node_far_from(&params.grid, &avoid, params.radius, rng)?);
        let last = placed.saturating_add(1) == spikes;
        if !multiple || last || rng.random_bool(FLUSH_CHANCE) {
            previous = std::mem::take(&mut pending);
            trace.rows.push(SpikeRow::new(clock, previous.clone()));
            clock = clock.saturating_add(rng.random_range(min_gap..=max_gap));
        }
    }

    debug!(rows = trace.rows.len(), multiple, "generated temporal noise trace");
    Ok(trace)
}

/// Append one chained avalanche of `size` spikes starting at `start`,
/// returning the timestamp of its last row.
fn chain(
    params: &SynthParams,
    start: Timestamp,
    size: usize,
    rows: &mut Vec<SpikeRow>,
    rng: &mut impl Rng,
) -> Result<Timestamp, SynthError> {
    let mut current = any_node(&params.grid, rng);
    rows.push(SpikeRow::new(start, vec![current]));
    let mut end = start;
    let mut time = start.saturating_add(within_tau(params.tau, rng));
    let mut pending = Vec::new();

    for placed in 1..size {
        current = node_near(&params.grid, current, params.radius, rng)?;
        pending.push(current);
        let last = placed.saturating_add(1) == size;
        if last || rng.random_bool(FLUSH_CHANCE) {
            rows.push(SpikeRow::new(time, std::mem::take(&mut pending)));
            end = time;
            time = time.saturating_add(within_tau(params.tau, rng));
        }
    }
    Ok(end)
}

/// A gap that keeps two spikes inside the window: `0..tau`.
fn within_tau(tau: u64, rng: &mut impl Rng) -> u64 {
    rng.random_range(0..tau.max(1))
}

/// A gap that separates two spikes: `tau + 1 ..= tau + 1 + spread`.
fn quiet_gap(tau: u64, spread: u64, rng: &mut impl Rng) -> u64 {
    let low = tau.saturating_add(1);
    rng.random_range(low..=low.saturating_add(spread))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn is_sorted(trace: &SyntheticTrace) -> bool {
        trace
            .rows
            .windows(2)
            .all(|pair| matches!(pair, [a, b] if a.timestamp <= b.timestamp))
    }

    fn in_grid(params: &SynthParams, trace: &SyntheticTrace) -> bool {
        trace
            .rows
            .iter()
            .all(|row| row.nodes.iter().all(|&n| params.grid.contains(n)))
    }

    #[test]
    fn basic_spends_the_spike_budget_on_avalanches() {
        let params = SynthParams::default();
        for seed in 0..20 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let trace = basic(&params, 40, 5, 10, &mut rng).unwrap();
            assert_eq!(trace.expected_sizes.len(), 5);
            assert!(trace.expected_sizes.iter().all(|&s| s >= 2));
            let in_avalanches: usize = trace.expected_sizes.iter().sum();
            assert!(in_avalanches <= 40);
            let singles = trace.spike_count().saturating_sub(in_avalanches);
            assert!((1..=10).contains(&singles), "seed {seed}: {singles} singles");
            assert!(is_sorted(&trace), "seed {seed}");
            assert!(in_grid(&params, &trace));
        }
    }

    #[test]
    fn basic_rejects_thin_budgets() {
        let params = SynthParams::default();
        let mut rng = SmallRng::seed_from_u64(1);
        assert!(basic(&params, 3, 2, 0, &mut rng).is_err());
        assert!(basic(&params, 10, 0, 0, &mut rng).is_err());
    }

    #[test]
    fn merging_rows_pair_up_around_a_root() {
        let params = SynthParams::default();
        let mut rng = SmallRng::seed_from_u64(5);
        let trace = merging(&params, 6, 3, &mut rng).unwrap();
        assert_eq!(trace.expected_sizes, vec![13, 13, 13]);
        assert_eq!(trace.rows.len(), 21);
        assert_eq!(trace.spike_count(), 39);
        assert!(is_sorted(&trace));
        assert!(in_grid(&params, &trace));
    }

    #[test]
    fn spatial_noise_rows_are_spaced_beyond_tau() {
        let params = SynthParams::default();
        let mut rng = SmallRng::seed_from_u64(9);
        let trace = spatial_noise(&params, 30, &mut rng).unwrap();
        assert!(trace.expected_sizes.is_empty());
        assert_eq!(trace.rows.len(), 30);
        assert!(trace.rows.windows(2).all(|pair| matches!(
            pair,
            [a, b] if b.timestamp.saturating_sub(a.timestamp) > params.tau
        )));
    }

    #[test]
    fn temporal_noise_keeps_overlapping_rows_apart() {
        let params = SynthParams::default();
        for multiple in [false, true] {
            let mut rng = SmallRng::seed_from_u64(13);
            let trace = temporal_noise(&params, 40, multiple, &mut rng).unwrap();
            assert!(trace.expected_sizes.is_empty());
            assert_eq!(trace.spike_count(), 40);
            assert!(is_sorted(&trace));
            if !multiple {
                assert_eq!(trace.rows.len(), 40);
            }
        }
    }

    #[test]
    fn temporal_noise_needs_room_in_tau() {
        let params = SynthParams {
            tau: 2,
            ..SynthParams::default()
        };
        let mut rng = SmallRng::seed_from_u64(2);
        assert!(temporal_noise(&params, 5, false, &mut rng).is_err());
    }

    #[test]
    fn same_seed_same_trace() {
        let params = SynthParams::default();
        let a = basic(&params, 30, 3, 5, &mut SmallRng::seed_from_u64(77)).unwrap();
        let b = basic(&params, 30, 3, 5, &mut SmallRng::seed_from_u64(77)).unwrap();
        assert_eq!(a, b);
    }
}
