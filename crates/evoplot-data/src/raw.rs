//! Raw per-run series
//!
//! For each treatment, a mapping plot id -> generation -> observed values,
//! built by parsing the treatment's resolved files under the configured
//! generation-assignment policy.

use crate::catalog::Treatment;
use crate::parse::{parse_value, read_data_lines, split_line};
use evoplot_core::{generation, Config, Error, Generation, Result, XPolicy};
use std::collections::HashMap;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Raw observations for one treatment, keyed by plot id and generation
#[derive(Debug, Default, Clone)]
pub struct RawData {
    series: HashMap<usize, BTreeMap<Generation, Vec<f64>>>,
}

impl RawData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, plot_id: usize, gen: Generation, value: f64) {
        self.series
            .entry(plot_id)
            .or_default()
            .entry(gen)
            .or_default()
            .push(value);
    }

    pub fn contains(&self, plot_id: usize) -> bool {
        self.series.contains_key(&plot_id)
    }

    /// The generation map for a plot id, if any observation exists
    pub fn plot(&self, plot_id: usize) -> Option<&BTreeMap<Generation, Vec<f64>>> {
        self.series.get(&plot_id)
    }

    /// Observations at one generation
    pub fn sample(&self, plot_id: usize, gen: Generation) -> Option<&[f64]> {
        self.series
            .get(&plot_id)
            .and_then(|plot| plot.get(&gen))
            .map(Vec::as_slice)
    }

    /// Generation keys for a plot id, ascending
    pub fn generations(&self, plot_id: usize) -> Vec<Generation> {
        self.series
            .get(&plot_id)
            .map(|plot| plot.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Number of distinct generations recorded for a plot id
    pub fn generation_count(&self, plot_id: usize) -> usize {
        self.series.get(&plot_id).map_or(0, BTreeMap::len)
    }

    pub fn max_generation(&self, plot_id: usize) -> Option<Generation> {
        self.series
            .get(&plot_id)
            .and_then(|plot| plot.keys().next_back().copied())
    }

    /// Maximum generation key across all plot ids
    pub fn max_generation_overall(&self) -> Option<Generation> {
        self.series
            .values()
            .filter_map(|plot| plot.keys().next_back().copied())
            .max()
    }
}

/// Parse all of a treatment's files into a [`RawData`] store
pub fn load_raw_data(treatment: &Treatment, config: &Config) -> Result<RawData> {
    let mut raw = RawData::new();
    if treatment.files.is_empty() {
        warn!(treatment = %treatment.name, "treatment has no files associated with it");
        return Ok(raw);
    }

    match &config.x_policy {
        XPolicy::PooledMax => load_pooled(treatment, config, &mut raw)?,
        XPolicy::OnePerPart => load_one_per_part(treatment, config, &mut raw)?,
        _ => {
            for file in &treatment.files {
                info!(file = %file.display(), "reading raw data");
                let data = read_data_lines(file)?;
                for (line_index, (line_nr, line)) in data.iter().enumerate() {
                    let tokens = split_line(line, config.separator);
                    if tokens.is_empty() {
                        continue;
                    }
                    let gen = line_generation(
                        &config.x_policy,
                        &tokens,
                        line_index,
                        file,
                        line_nr,
                    )?;
                    add_line(&mut raw, &tokens, gen, config, treatment, file, line_nr)?;
                }
            }
        }
    }
    Ok(raw)
}

/// Generation key for one line under the non-pooled policies
fn line_generation(
    policy: &XPolicy,
    tokens: &[&str],
    line_index: usize,
    file: &Path,
    line_nr: usize,
) -> Result<Generation> {
    let value = match policy {
        XPolicy::FromColumn(column) if tokens.len() > 1 => {
            let token = tokens.get(*column).ok_or_else(|| Error::Parse {
                file: file.to_path_buf(),
                line: line_nr,
                message: format!(
                    "no x value in column {column} (line has {} fields)",
                    tokens.len()
                ),
            })?;
            parse_value(token, file, line_nr)?
        }
        XPolicy::Explicit(values) if line_index < values.len() => values[line_index],
        _ => line_index as f64,
    };
    Ok(generation(value))
}

/// Add every requested column of a line at the given generation.
/// A requested column absent from the line is a warning; the line is
/// skipped for that plot id only.
fn add_line(
    raw: &mut RawData,
    tokens: &[&str],
    gen: Generation,
    config: &Config,
    treatment: &Treatment,
    file: &Path,
    line_nr: usize,
) -> Result<()> {
    for &plot_id in &config.plot_ids {
        match tokens.get(plot_id) {
            Some(token) => {
                let value = parse_value(token, file, line_nr)?;
                raw.add(plot_id, gen, value);
            }
            None => warn!(
                treatment = %treatment.name,
                plot_id,
                line = line_nr,
                fields = tokens.len(),
                "no data for requested column, skipping line for this plot"
            ),
        }
    }
    Ok(())
}

/// One generation per part: every file of part `i` contributes
/// observations at generation `i`
fn load_one_per_part(treatment: &Treatment, config: &Config, raw: &mut RawData) -> Result<()> {
    for (part_index, part) in treatment.parts.iter().enumerate() {
        debug!(part = part_index, files = part.len(), "reading part");
        for file in part {
            info!(file = %file.display(), value = part_index, "reading raw data for value");
            let data = read_data_lines(file)?;
            for (line_nr, line) in data.iter() {
                let tokens = split_line(line, config.separator);
                if tokens.is_empty() {
                    continue;
                }
                add_line(
                    raw,
                    &tokens,
                    generation(part_index as f64),
                    config,
                    treatment,
                    file,
                    line_nr,
                )?;
            }
        }
    }
    Ok(())
}

/// Pooled-maximum policy: within each pool directory, merge files by
/// taking the element-wise maximum at every line position, then append
/// the merged rows to the series. Positional merging requires every file
/// of a pool group to report the same number of ordered values.
fn load_pooled(treatment: &Treatment, config: &Config, raw: &mut RawData) -> Result<()> {
    for (pool_dir, files) in treatment
        .pool_dirs
        .iter()
        .zip(treatment.files_per_pool.iter())
    {
        info!(pool = %pool_dir.display(), files = files.len(), "pooling directory");
        let mut rows: Vec<Vec<f64>> = Vec::new();
        for (file_index, file) in files.iter().enumerate() {
            info!(file = %file.display(), "reading raw data");
            let data = read_data_lines(file)?;
            let mut parsed: Vec<Vec<f64>> = Vec::with_capacity(data.len());
            for (line_nr, line) in data.iter() {
                let tokens = split_line(line, config.separator);
                if tokens.is_empty() {
                    continue;
                }
                parsed.push(pool_row(&tokens, config, file, line_nr)?);
            }
            if file_index == 0 {
                rows = parsed;
                continue;
            }
            if parsed.len() != rows.len() {
                return Err(Error::Config(format!(
                    "pooled files in {} disagree on length: {} has {} rows, expected {}",
                    pool_dir.display(),
                    file.display(),
                    parsed.len(),
                    rows.len()
                )));
            }
            for (row_index, row) in parsed.iter().enumerate() {
                if row.len() != rows[row_index].len() {
                    return Err(Error::Config(format!(
                        "pooled files in {} disagree on value count at row {}",
                        pool_dir.display(),
                        row_index
                    )));
                }
                for (slot, &value) in rows[row_index].iter_mut().zip(row.iter()) {
                    if value > *slot {
                        *slot = value;
                    }
                }
            }
        }
        for (gen_index, row) in rows.iter().enumerate() {
            for (&plot_id, &value) in config.plot_ids.iter().zip(row.iter()) {
                raw.add(plot_id, generation(gen_index as f64), value);
            }
        }
    }
    Ok(())
}

/// The requested columns of one pooled line, in `plot_ids` order.
/// Rows are merged positionally across files, so a missing column would
/// shift every later value onto the wrong plot id; it is fatal here.
fn pool_row(
    tokens: &[&str],
    config: &Config,
    file: &Path,
    line_nr: usize,
) -> Result<Vec<f64>> {
    let mut row = Vec::with_capacity(config.plot_ids.len());
    for &plot_id in &config.plot_ids {
        let token = tokens.get(plot_id).ok_or_else(|| Error::Parse {
            file: file.to_path_buf(),
            line: line_nr,
            message: format!(
                "no data for column {plot_id} in pooled line ({} fields)",
                tokens.len()
            ),
        })?;
        row.push(parse_value(token, file, line_nr)?);
    }
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use evoplot_core::TreatmentSpec;
    use std::path::PathBuf;

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn treatment_for(files: Vec<PathBuf>) -> Treatment {
        let spec = TreatmentSpec {
            paths: files.clone(),
            name: Some("test".to_string()),
            short_name: None,
        };
        let config = Config::default();
        let mut treatment = Treatment::resolve(&spec, &config).unwrap();
        treatment.files = files.clone();
        treatment.parts = files.into_iter().map(|f| vec![f]).collect();
        treatment
    }

    #[test]
    fn test_sequential_load() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_file(dir.path(), "a.dat", "10 1.0\n20 2.0\n30 3.0\n");
        let config = Config::default();
        let raw = load_raw_data(&treatment_for(vec![file]), &config).unwrap();
        assert_eq!(
            raw.sample(1, generation(0.0)).unwrap(),
            &[1.0]
        );
        assert_eq!(raw.generation_count(1), 3);
        assert_eq!(raw.max_generation(1), Some(generation(2.0)));
    }

    #[test]
    fn test_multiple_files_pool_observations_per_generation() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_file(dir.path(), "a.dat", "0 1.0\n0 2.0\n");
        let b = write_file(dir.path(), "b.dat", "0 3.0\n0 4.0\n");
        let config = Config::default();
        let raw = load_raw_data(&treatment_for(vec![a, b]), &config).unwrap();
        // Line index is per file, so both files contribute at generations 0 and 1
        assert_eq!(raw.sample(1, generation(0.0)).unwrap(), &[1.0, 3.0]);
        assert_eq!(raw.sample(1, generation(1.0)).unwrap(), &[2.0, 4.0]);
    }

    #[test]
    fn test_x_from_column() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_file(dir.path(), "a.dat", "100 1.0\n200 2.0\n");
        let config = Config {
            x_policy: XPolicy::FromColumn(0),
            ..Config::default()
        };
        let raw = load_raw_data(&treatment_for(vec![file]), &config).unwrap();
        assert_eq!(raw.sample(1, generation(100.0)).unwrap(), &[1.0]);
        assert_eq!(raw.max_generation(1), Some(generation(200.0)));
    }

    #[test]
    fn test_explicit_x_values() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_file(dir.path(), "a.dat", "0 1.0\n0 2.0\n0 3.0\n");
        let config = Config {
            x_policy: XPolicy::Explicit(vec![5.0, 10.0]),
            ..Config::default()
        };
        let raw = load_raw_data(&treatment_for(vec![file]), &config).unwrap();
        assert!(raw.sample(1, generation(5.0)).is_some());
        assert!(raw.sample(1, generation(10.0)).is_some());
        // Lines past the explicit list fall back to the line index
        assert!(raw.sample(1, generation(2.0)).is_some());
    }

    #[test]
    fn test_header_skipped_and_parse_error_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_file(dir.path(), "a.dat", "gen value\n0 1.0\n0 bad\n");
        let config = Config::default();
        let err = load_raw_data(&treatment_for(vec![file]), &config).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
        assert!(err.to_string().contains("a.dat"));
    }

    #[test]
    fn test_missing_column_skips_line_for_that_plot() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_file(dir.path(), "a.dat", "0 1.0\n0\n0 3.0\n");
        let config = Config::default();
        let raw = load_raw_data(&treatment_for(vec![file]), &config).unwrap();
        // The short middle line contributes nothing at generation 1
        assert_eq!(raw.sample(1, generation(0.0)).unwrap(), &[1.0]);
        assert!(raw.sample(1, generation(1.0)).is_none());
        assert_eq!(raw.sample(1, generation(2.0)).unwrap(), &[3.0]);
    }

    #[test]
    fn test_one_per_part() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_file(dir.path(), "a.dat", "0 1.0\n0 2.0\n");
        let b = write_file(dir.path(), "b.dat", "0 3.0\n");
        let config = Config {
            x_policy: XPolicy::OnePerPart,
            ..Config::default()
        };
        let raw = load_raw_data(&treatment_for(vec![a, b]), &config).unwrap();
        // Part index is the generation
        assert_eq!(raw.sample(1, generation(0.0)).unwrap(), &[1.0, 2.0]);
        assert_eq!(raw.sample(1, generation(1.0)).unwrap(), &[3.0]);
    }

    fn pooling_treatment(pools: Vec<(PathBuf, Vec<PathBuf>)>) -> Treatment {
        let mut treatment = treatment_for(vec![]);
        for (dir, files) in pools {
            treatment.files.extend(files.iter().cloned());
            treatment.pool_dirs.push(dir);
            treatment.files_per_pool.push(files);
        }
        treatment
    }

    #[test]
    fn test_pooled_maximum() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_file(dir.path(), "a.dat", "0 1.0\n0 5.0\n");
        let b = write_file(dir.path(), "b.dat", "0 2.0\n0 4.0\n");
        let config = Config {
            x_policy: XPolicy::PooledMax,
            ..Config::default()
        };
        let treatment = pooling_treatment(vec![(dir.path().to_path_buf(), vec![a, b])]);
        let raw = load_raw_data(&treatment, &config).unwrap();
        assert_eq!(raw.sample(1, generation(0.0)).unwrap(), &[2.0]);
        assert_eq!(raw.sample(1, generation(1.0)).unwrap(), &[5.0]);
    }

    #[test]
    fn test_pool_of_one_matches_plain_load() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_file(dir.path(), "a.dat", "0 1.5\n0 2.5\n0 3.5\n");

        let pooled_config = Config {
            x_policy: XPolicy::PooledMax,
            ..Config::default()
        };
        let pooled = pooling_treatment(vec![(dir.path().to_path_buf(), vec![file.clone()])]);
        let pooled_raw = load_raw_data(&pooled, &pooled_config).unwrap();

        let plain_config = Config::default();
        let plain_raw = load_raw_data(&treatment_for(vec![file]), &plain_config).unwrap();

        for gen in 0..3 {
            assert_eq!(
                pooled_raw.sample(1, generation(gen as f64)),
                plain_raw.sample(1, generation(gen as f64))
            );
        }
    }

    #[test]
    fn test_pooled_short_line_is_parse_error() {
        // Pooled rows are merged by position, so a short line must fail
        // instead of shifting later columns onto the wrong plot id
        let dir = tempfile::tempdir().unwrap();
        let file = write_file(dir.path(), "a.dat", "0 1.0 2.0\n0\n");
        let config = Config {
            plot_ids: vec![1, 2],
            x_policy: XPolicy::PooledMax,
            ..Config::default()
        };
        let treatment = pooling_treatment(vec![(dir.path().to_path_buf(), vec![file])]);
        let err = load_raw_data(&treatment, &config).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }));
    }

    #[test]
    fn test_pooled_length_mismatch_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_file(dir.path(), "a.dat", "0 1.0\n0 2.0\n");
        let b = write_file(dir.path(), "b.dat", "0 3.0\n");
        let config = Config {
            x_policy: XPolicy::PooledMax,
            ..Config::default()
        };
        let treatment = pooling_treatment(vec![(dir.path().to_path_buf(), vec![a, b])]);
        let err = load_raw_data(&treatment, &config).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
