//! Detector output against generated traces with known avalanches.
//!
//! Every generator in `avalanche-synth` records the avalanche sizes a
//! correct detector must report. These tests run many seeds of each
//! generator through the full driver and compare exactly.

#![allow(clippy::unwrap_used)]

use avalanche_core::{Cluster, ClusterSet, Clusterer, MatchWindow, StreamDriver, TemporalClusterer};
use avalanche_synth::{SynthParams, SyntheticTrace};
use avalanche_types::Grid;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn window(params: &SynthParams) -> MatchWindow {
    MatchWindow::new(params.tau, params.radius)
}

fn detected_sizes<C: Clusterer>(grid: Grid, clusterer: C, trace: &SyntheticTrace) -> Vec<usize> {
    let mut driver = StreamDriver::new(grid, clusterer);
    let report = driver.run(trace.rows.iter().cloned().map(Ok)).unwrap();
    let sizes: Vec<usize> = driver.clusterer().avalanches().map(Cluster::len).collect();
    assert_eq!(report.avalanches, u64::try_from(sizes.len()).unwrap());
    sizes
}

fn spatiotemporal(params: &SynthParams, trace: &SyntheticTrace) -> Vec<usize> {
    detected_sizes(params.grid, ClusterSet::new(params.grid, window(params)), trace)
}

#[test]
fn basic_traces_match_ground_truth() {
    let params = SynthParams::default();
    for seed in 0..40 {
        let mut rng = StdRng::seed_from_u64(seed);
        let trace = avalanche_synth::basic(&params, 120, 8, 30, &mut rng).unwrap();
        assert_eq!(
            spatiotemporal(&params, &trace),
            trace.expected_sizes,
            "seed {seed}"
        );
    }
}

#[test]
fn basic_traces_are_also_found_by_time_alone() {
    // Avalanches are separated by quiet gaps, so grouping by time agrees.
    let params = SynthParams::default();
    for seed in 0..20 {
        let mut rng = StdRng::seed_from_u64(500 + seed);
        let trace = avalanche_synth::basic(&params, 60, 4, 10, &mut rng).unwrap();
        let sizes = detected_sizes(params.grid, TemporalClusterer::new(params.tau), &trace);
        assert_eq!(sizes, trace.expected_sizes, "seed {seed}");
    }
}

#[test]
fn merging_traces_collapse_to_one_avalanche_each() {
    let params = SynthParams::default();
    for seed in 0..40 {
        let mut rng = StdRng::seed_from_u64(seed);
        let trace = avalanche_synth::merging(&params, 10, 5, &mut rng).unwrap();
        assert_eq!(spatiotemporal(&params, &trace), vec![21; 5], "seed {seed}");
    }
}

#[test]
fn spatial_noise_yields_no_avalanches() {
    let params = SynthParams::default();
    for seed in 0..20 {
        let mut rng = StdRng::seed_from_u64(seed);
        let trace = avalanche_synth::spatial_noise(&params, 200, &mut rng).unwrap();
        assert!(spatiotemporal(&params, &trace).is_empty(), "seed {seed}");
    }
}

#[test]
fn temporal_noise_yields_no_avalanches() {
    let params = SynthParams::default();
    for multiple in [false, true] {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let trace = avalanche_synth::temporal_noise(&params, 200, multiple, &mut rng).unwrap();
            assert!(
                spatiotemporal(&params, &trace).is_empty(),
                "seed {seed}, multiple {multiple}"
            );
        }
    }
}

#[test]
fn ground_truth_holds_for_other_thresholds() {
    let params = SynthParams {
        grid: Grid::new(40).unwrap(),
        tau: 12,
        radius: 3.5,
    };
    for seed in 0..20 {
        let mut rng = StdRng::seed_from_u64(900 + seed);
        let trace = avalanche_synth::basic(&params, 50, 5, 8, &mut rng).unwrap();
        assert_eq!(spatiotemporal(&params, &trace), trace.expected_sizes, "seed {seed}");

        let trace = avalanche_synth::merging(&params, 4, 3, &mut rng).unwrap();
        assert_eq!(spatiotemporal(&params, &trace), vec![9; 3], "seed {seed}");
    }
}
