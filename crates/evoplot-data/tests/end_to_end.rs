//! End-to-end workflow tests over synthetic experiment logs
//!
//! Generates run files from known distributions, drives the full
//! Dataset pipeline with caches enabled, and checks that cached reruns
//! reproduce the computed results exactly.

use evoplot_core::{generation, Config, TreatmentSpec};
use evoplot_data::Dataset;
use evoplot_stats::StatKind;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use std::path::{Path, PathBuf};

const RUNS: usize = 20;
const GENERATIONS: usize = 11;

/// One file per run, one line per generation, value in column 1
fn write_treatment(dir: &Path, name: &str, mean: f64, seed: u64) -> Vec<PathBuf> {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(mean, 1.0).unwrap();
    let mut files = Vec::new();
    for run in 0..RUNS {
        let file = dir.join(format!("{name}_{run:02}.dat"));
        let mut content = String::new();
        for _ in 0..GENERATIONS {
            content.push_str(&format!("0 {}\n", normal.sample(&mut rng)));
        }
        std::fs::write(&file, content).unwrap();
        files.push(file);
    }
    files
}

fn two_treatment_config(dir: &Path, low_mean: f64, high_mean: f64) -> Config {
    let low = write_treatment(dir, "low", low_mean, 11);
    let high = write_treatment(dir, "high", high_mean, 22);
    Config {
        treatments: vec![
            TreatmentSpec {
                paths: low,
                name: Some("low".to_string()),
                short_name: None,
            },
            TreatmentSpec {
                paths: high,
                name: Some("high".to_string()),
                short_name: None,
            },
        ],
        comparison_main: vec!["low".to_string()],
        output_directory: dir.to_path_buf(),
        bootstrap_seed: Some(7),
        ..Config::default()
    }
}

#[test]
fn separated_treatments_full_workflow() {
    let dir = tempfile::tempdir().unwrap();
    let config = two_treatment_config(dir.path(), 0.0, 5.0);
    let kind: StatKind = "median_and_bootstrap_percentile".parse().unwrap();

    let mut dataset = Dataset::new(config.clone()).unwrap();
    let low = dataset.resolve_treatment("low").unwrap();
    let high = dataset.resolve_treatment("high").unwrap();

    let low_series = dataset.get_stats(low, 1, kind).unwrap().clone();
    let high_series = dataset.get_stats(high, 1, kind).unwrap().clone();
    assert_eq!(low_series.len(), GENERATIONS);
    assert_eq!(high_series.len(), GENERATIONS);
    for (_, point) in low_series.iter() {
        assert!(point.low <= point.center && point.center <= point.high);
        assert!(point.center.abs() < 1.5);
    }
    for (_, point) in high_series.iter() {
        assert!(point.low <= point.center && point.center <= point.high);
        assert!((point.center - 5.0).abs() < 1.5);
    }

    // Five standard deviations apart: every generation is significant
    let significant = dataset.get_comparison(1, low, high).unwrap();
    assert_eq!(significant.len(), GENERATIONS);

    // Both cache layers were written
    let low_cache = dataset
        .treatment(low)
        .unwrap()
        .cache_file_name(1, &kind.to_string());
    assert!(low_cache.exists());
    assert!(dir.path().join("comparison.cache").exists());

    // A fresh dataset over the same configuration reproduces everything
    // from the caches
    let mut rerun = Dataset::new(config).unwrap();
    let cached = rerun.get_stats(low, 1, kind).unwrap();
    assert_eq!(cached.len(), low_series.len());
    for (gen, point) in low_series.iter() {
        let reread = cached.get(gen).unwrap();
        assert_eq!(reread.center, point.center);
        assert_eq!(reread.low, point.low);
        assert_eq!(reread.high, point.high);
    }
    assert_eq!(rerun.get_comparison(1, low, high).unwrap(), significant);
}

#[test]
fn comparison_is_symmetric_in_direction() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = two_treatment_config(dir.path(), 0.0, 0.7);
    config.comparison_main = vec!["low".to_string(), "high".to_string()];
    config.comparison_others = vec![vec!["high".to_string()], vec!["low".to_string()]];
    config.write_series_cache = false;
    config.write_comparison_cache = false;

    let mut dataset = Dataset::new(config).unwrap();
    let forward = dataset.get_comparison(1, 0, 1).unwrap();
    let backward = dataset.get_comparison(1, 1, 0).unwrap();
    assert_eq!(forward, backward);
}

#[test]
fn every_estimator_yields_bracketing_intervals() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = two_treatment_config(dir.path(), 2.0, 5.0);
    config.write_series_cache = false;
    config.write_comparison_cache = false;
    let mut dataset = Dataset::new(config).unwrap();

    for name in [
        "median_and_interquartile_range",
        "mean_and_std_error",
        "median_and_bootstrap_pivotal",
        "mean_and_bootstrap_bca",
    ] {
        let kind: StatKind = name.parse().unwrap();
        let series = dataset.get_stats(0, 1, kind).unwrap();
        assert_eq!(series.len(), GENERATIONS, "{name}");
        for (gen, point) in series.iter() {
            assert!(
                point.low <= point.center && point.center <= point.high,
                "{name} at {gen}: [{}, {}] around {}",
                point.low,
                point.high,
                point.center
            );
        }
    }
}

#[test]
fn x_values_follow_the_step_grid() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = two_treatment_config(dir.path(), 0.0, 1.0);
    config.step = 2;
    config.write_series_cache = false;
    config.write_comparison_cache = false;
    let mut dataset = Dataset::new(config).unwrap();

    let kind: StatKind = "mean_and_std_error".parse().unwrap();
    let xs = dataset.get_x_values(0, 1, kind).unwrap();
    assert_eq!(xs, vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
    let series = dataset.get_stats(0, 1, kind).unwrap();
    assert_eq!(series.len(), xs.len());
    assert!(series.get(generation(1.0)).is_none());
}
