//! Per-treatment statistics with a file-backed series cache
//!
//! A [`TreatmentData`] owns one treatment's raw observations and memoizes
//! every `(plot id, statistic)` series it is asked for. Each series is
//! persisted next to the treatment's files as
//! `ch_{prefix}_{statistic}_{plot_id}.cache`, one `center low high
//! generation` line per entry. A cache that does not match the current
//! run's generation grid is discarded and recomputed in full.

use crate::catalog::Treatment;
use crate::raw::{load_raw_data, RawData};
use evoplot_core::{generation, CenterAndInterval, Config, Error, Generation, Result, StatSeries};
use evoplot_stats::{estimate, EstimatorOptions, StatKind};
use std::collections::HashMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info, warn};

/// One treatment's raw data and memoized statistic series
#[derive(Debug)]
pub struct TreatmentData {
    treatment: Treatment,
    raw: Option<RawData>,
    stats: HashMap<(usize, StatKind), StatSeries>,
}

impl TreatmentData {
    pub fn new(treatment: Treatment) -> Self {
        Self {
            treatment,
            raw: None,
            stats: HashMap::new(),
        }
    }

    pub fn treatment(&self) -> &Treatment {
        &self.treatment
    }

    /// Raw observations, parsed at most once per process
    pub fn raw(&mut self, config: &Config) -> Result<&RawData> {
        if self.raw.is_none() {
            self.raw = Some(load_raw_data(&self.treatment, config)?);
        }
        Ok(self.raw.as_ref().expect("raw data populated above"))
    }

    /// Raw observations if a previous call already parsed them
    pub fn loaded_raw(&self) -> Option<&RawData> {
        self.raw.as_ref()
    }

    /// The statistic series for one plot id, computed (or read from cache)
    /// at most once per process
    pub fn stats(
        &mut self,
        plot_id: usize,
        kind: StatKind,
        config: &Config,
    ) -> Result<&StatSeries> {
        let key = (plot_id, kind);
        if !self.stats.contains_key(&key) {
            self.raw(config)?;
            let raw = self.raw.as_ref().expect("raw data populated above");
            let series = build_series(&self.treatment, raw, plot_id, kind, config)?;
            self.stats.insert(key, series);
        }
        Ok(self.stats.get(&key).expect("series populated above"))
    }

    /// Largest generation key the raw data holds for `plot_id`
    pub fn max_generation(&mut self, plot_id: usize, config: &Config) -> Result<Option<Generation>> {
        Ok(self.raw(config)?.max_generation(plot_id))
    }
}

/// The generation keys a series covers: the raw keys in ascending order,
/// clipped to the configured maximum and thinned by the configured step
fn selected_generations(raw: &RawData, plot_id: usize, config: &Config) -> Vec<Generation> {
    let mut gens = raw.generations(plot_id);
    if let Some(limit) = config.max_generation {
        let limit = limit as f64;
        if let Some(&last) = gens.last() {
            if last.0 + 1.0 < limit {
                warn!(
                    available = %last,
                    requested = limit,
                    "fewer generations available than requested, clipping"
                );
            }
        }
        gens.retain(|g| g.0 < limit);
    }
    gens.into_iter().step_by(config.step.max(1)).collect()
}

fn build_series(
    treatment: &Treatment,
    raw: &RawData,
    plot_id: usize,
    kind: StatKind,
    config: &Config,
) -> Result<StatSeries> {
    if !raw.contains(plot_id) {
        warn!(
            treatment = %treatment.name,
            plot_id,
            "no raw data for plot, producing an empty series"
        );
        return Ok(StatSeries::new());
    }
    let selected = selected_generations(raw, plot_id, config);
    let path = treatment.cache_file_name(plot_id, &kind.to_string());

    if config.series_cache_readable() && path.exists() {
        match read_series_cache(&path, &selected, config.x_from_file()) {
            Ok(series) => {
                debug!(cache = %path.display(), "series cache hit");
                return Ok(series);
            }
            Err(err) => {
                warn!(cache = %path.display(), %err, "ignoring stale series cache")
            }
        }
    }

    info!(
        treatment = %treatment.name,
        plot_id,
        statistic = %kind,
        generations = selected.len(),
        "computing statistics"
    );
    let options = EstimatorOptions::from(config);
    let mut series = StatSeries::new();
    for gen in selected {
        let sample = raw
            .sample(plot_id, gen)
            .expect("selected generations come from the raw keys");
        let point = estimate(kind, sample, &options)?;
        series.insert(gen, point, sample.len());
    }

    if config.series_cache_writable() {
        write_series_cache(&path, &series)?;
        debug!(cache = %path.display(), "series cache written");
    }
    Ok(series)
}

/// Read a cached series, validating every entry against the expected
/// generation grid. When the x axis comes from the files themselves the
/// cached generation keys are authoritative and only the entry count is
/// checked. Lines beyond the expected grid are ignored.
fn read_series_cache(
    path: &Path,
    expected: &[Generation],
    x_from_file: bool,
) -> Result<StatSeries> {
    let content = fs::read_to_string(path)?;
    let mut lines = content.lines();
    let mut series = StatSeries::new();
    for &expected_gen in expected {
        let line = lines.next().ok_or_else(|| {
            Error::Cache(format!(
                "{}: ends before covering all {} generations",
                path.display(),
                expected.len()
            ))
        })?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 4 {
            return Err(Error::short_cache_entry(4, fields.len()));
        }
        let mut values = [0.0f64; 4];
        for (slot, token) in values.iter_mut().zip(&fields) {
            *slot = token.parse().map_err(|_| {
                Error::Cache(format!("{}: unreadable entry {token:?}", path.display()))
            })?;
        }
        let [center, low, high, gen] = values;
        if !x_from_file && generation(gen) != expected_gen {
            return Err(Error::Cache(format!(
                "{}: entry for generation {gen} where {expected_gen} was expected",
                path.display()
            )));
        }
        series.insert_cached(generation(gen), CenterAndInterval::new(center, low, high));
    }
    Ok(series)
}

/// Persist a series as `center low high generation` lines, ascending
fn write_series_cache(path: &Path, series: &StatSeries) -> Result<()> {
    let mut out = BufWriter::new(fs::File::create(path)?);
    for (gen, point) in series.iter() {
        writeln!(out, "{} {} {} {}", point.center, point.low, point.high, gen)?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use evoplot_core::TreatmentSpec;

    fn fixture(dir: &Path, content: &str) -> Treatment {
        let file = dir.join("fitness.dat");
        std::fs::write(&file, content).unwrap();
        let spec = TreatmentSpec::named(&file, "fixture");
        Treatment::resolve(&spec, &Config::default()).unwrap()
    }

    fn three_generations(dir: &Path) -> Treatment {
        fixture(dir, "0 1.0\n0 2.0\n0 3.0\n")
    }

    #[test]
    fn test_series_computation() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            write_series_cache: false,
            ..Config::default()
        };
        let mut data = TreatmentData::new(three_generations(dir.path()));
        let kind: StatKind = "median_and_interquartile_range".parse().unwrap();
        let series = data.stats(1, kind, &config).unwrap();
        assert_eq!(series.len(), 3);
        // One observation per generation: center equals the observation
        assert_eq!(series.get(generation(1.0)).unwrap().center, 2.0);
        assert_eq!(series.count(generation(1.0)), 1);
    }

    #[test]
    fn test_cache_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        let kind: StatKind = "median_and_interquartile_range".parse().unwrap();

        let treatment = three_generations(dir.path());
        let cache_path = treatment.cache_file_name(1, &kind.to_string());
        let mut writer = TreatmentData::new(treatment.clone());
        let computed = writer.stats(1, kind, &config).unwrap().clone();
        assert!(cache_path.exists());

        let mut reader = TreatmentData::new(treatment);
        let cached = reader.stats(1, kind, &config).unwrap();
        assert_eq!(cached.len(), computed.len());
        for (gen, point) in computed.iter() {
            assert_eq!(cached.get(gen).unwrap().center, point.center);
            assert_eq!(cached.get(gen).unwrap().low, point.low);
            assert_eq!(cached.get(gen).unwrap().high, point.high);
        }
    }

    #[test]
    fn test_step_change_invalidates_cache() {
        let dir = tempfile::tempdir().unwrap();
        let kind: StatKind = "median_and_interquartile_range".parse().unwrap();
        let treatment = fixture(dir.path(), "0 1.0\n0 2.0\n0 3.0\n0 4.0\n");

        let dense = Config::default();
        let mut data = TreatmentData::new(treatment.clone());
        data.stats(1, kind, &dense).unwrap();

        // With step 2 the cached grid 0,1,2,3 no longer matches 0,2
        let sparse = Config {
            step: 2,
            ..Config::default()
        };
        let mut data = TreatmentData::new(treatment);
        let series = data.stats(1, kind, &sparse).unwrap();
        assert_eq!(series.len(), 2);
        assert!(series.get(generation(2.0)).is_some());
        assert!(series.get(generation(1.0)).is_none());
    }

    #[test]
    fn test_corrupt_cache_recomputed() {
        let dir = tempfile::tempdir().unwrap();
        let kind: StatKind = "mean_and_std_error".parse().unwrap();
        let treatment = three_generations(dir.path());
        let cache_path = treatment.cache_file_name(1, &kind.to_string());
        std::fs::write(&cache_path, "1.0 0.5\nnot numbers at all\n").unwrap();

        let config = Config::default();
        let mut data = TreatmentData::new(treatment);
        let series = data.stats(1, kind, &config).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.get(generation(0.0)).unwrap().center, 1.0);
    }

    #[test]
    fn test_missing_plot_yields_empty_series() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            plot_ids: vec![1, 7],
            write_series_cache: false,
            ..Config::default()
        };
        let mut data = TreatmentData::new(three_generations(dir.path()));
        let kind: StatKind = "mean_and_std_error".parse().unwrap();
        let series = data.stats(7, kind, &config).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn test_max_generation_clips_series() {
        let dir = tempfile::tempdir().unwrap();
        let kind: StatKind = "mean_and_std_error".parse().unwrap();
        let treatment = fixture(dir.path(), "0 1.0\n0 2.0\n0 3.0\n0 4.0\n0 5.0\n");
        let config = Config {
            max_generation: Some(3),
            write_series_cache: false,
            ..Config::default()
        };
        let mut data = TreatmentData::new(treatment);
        let series = data.stats(1, kind, &config).unwrap();
        assert_eq!(series.len(), 3);
        assert!(series.get(generation(3.0)).is_none());
    }

    #[test]
    fn test_cached_generation_keys_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let kind: StatKind = "mean_and_std_error".parse().unwrap();
        let treatment = fixture(dir.path(), "100 1.0\n200 2.0\n");
        let config = Config {
            x_policy: evoplot_core::XPolicy::FromColumn(0),
            ..Config::default()
        };
        let mut data = TreatmentData::new(treatment.clone());
        data.stats(1, kind, &config).unwrap();

        let mut reader = TreatmentData::new(treatment);
        let series = reader.stats(1, kind, &config).unwrap();
        assert!(series.get(generation(100.0)).is_some());
        assert!(series.get(generation(200.0)).is_some());
    }
}
