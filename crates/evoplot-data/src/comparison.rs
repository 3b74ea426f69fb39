//! Significance comparisons between treatments
//!
//! For every configured (plot id, main treatment, other treatment) triple,
//! the engine runs a Mann-Whitney U test at each shared generation and
//! records the generations where the treatments differ significantly. The
//! full result set is persisted in a single `comparison.cache` file; a
//! cache that was produced with a different test step, or that does not
//! cover every comparison the current run implies, is discarded whole and
//! everything is recomputed.

use crate::catalog::TreatmentList;
use crate::raw::RawData;
use crate::series::TreatmentData;
use evoplot_core::{generation, Config, Error, Generation, Result};
use evoplot_stats::mann_whitney_u;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info, warn};

/// `(plot id, main treatment id, other treatment id)`
pub type ComparisonKey = (usize, usize, usize);

/// The generations at which each compared pair differs significantly
#[derive(Debug, Default, Clone)]
pub struct Comparisons {
    entries: BTreeMap<ComparisonKey, Vec<Generation>>,
}

impl Comparisons {
    /// Significant generations for one comparison, if it was performed
    pub fn get(&self, plot_id: usize, main_id: usize, other_id: usize) -> Option<&[Generation]> {
        self.entries
            .get(&(plot_id, main_id, other_id))
            .map(Vec::as_slice)
    }

    pub fn is_significant(
        &self,
        plot_id: usize,
        main_id: usize,
        other_id: usize,
        gen: Generation,
    ) -> bool {
        self.get(plot_id, main_id, other_id)
            .is_some_and(|gens| gens.contains(&gen))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ComparisonKey, &[Generation])> {
        self.entries.iter().map(|(&key, gens)| (key, gens.as_slice()))
    }
}

/// The comparisons the configuration asks for. Every main treatment is
/// compared against its configured others, or against every other
/// treatment (highest id first) when none are named.
pub fn implied_pairs(config: &Config, list: &TreatmentList) -> Result<Vec<ComparisonKey>> {
    let mut pairs = Vec::new();
    for &plot_id in &config.plot_ids {
        for (index, main_ref) in config.comparison_main.iter().enumerate() {
            let main = resolve(list, main_ref)?;
            let others = config.comparison_others_for(index);
            if others.is_empty() {
                for other in (0..list.len()).rev() {
                    if other != main {
                        pairs.push((plot_id, main, other));
                    }
                }
            } else {
                for other_ref in others {
                    let other = resolve(list, other_ref)?;
                    if other != main {
                        pairs.push((plot_id, main, other));
                    }
                }
            }
        }
    }
    Ok(pairs)
}

fn resolve(list: &TreatmentList, reference: &str) -> Result<usize> {
    list.resolve_id(reference).ok_or_else(|| {
        Error::Config(format!(
            "unknown treatment {reference:?} in comparison settings"
        ))
    })
}

/// Load the comparison set from its cache, or compute and persist it
pub fn load_or_compute(
    config: &Config,
    list: &TreatmentList,
    data: &mut [TreatmentData],
) -> Result<Comparisons> {
    let pairs = implied_pairs(config, list)?;
    let path = config.comparison_cache_path();

    if config.comparison_cache_readable() && path.exists() {
        match read_comparison_cache(&path, config.stat_test_step, &pairs) {
            Ok(comparisons) => {
                debug!(cache = %path.display(), entries = comparisons.len(), "comparison cache hit");
                return Ok(comparisons);
            }
            Err(err) => warn!(cache = %path.display(), %err, "ignoring comparison cache"),
        }
    }

    let comparisons = compute_all(config, &pairs, data)?;
    if config.comparison_cache_writable() {
        write_comparison_cache(&path, config.stat_test_step, &comparisons)?;
        debug!(cache = %path.display(), "comparison cache written");
    }
    Ok(comparisons)
}

fn compute_all(
    config: &Config,
    pairs: &[ComparisonKey],
    data: &mut [TreatmentData],
) -> Result<Comparisons> {
    let involved: BTreeSet<usize> = pairs
        .iter()
        .flat_map(|&(_, main, other)| [main, other])
        .collect();
    for &id in &involved {
        data[id].raw(config)?;
    }

    let mut comparisons = Comparisons::default();
    for &(plot_id, main, other) in pairs {
        let main_raw = data[main].loaded_raw().expect("raw data loaded above");
        let other_raw = data[other].loaded_raw().expect("raw data loaded above");
        let dataset_max = dataset_max_generation(config, data, &involved, plot_id);
        info!(
            plot_id,
            main = %data[main].treatment().name,
            other = %data[other].treatment().name,
            "comparing treatments"
        );
        if let Some(gens) = compare(
            main_raw,
            other_raw,
            &data[main].treatment().name,
            &data[other].treatment().name,
            plot_id,
            dataset_max,
            config,
        ) {
            comparisons.entries.insert((plot_id, main, other), gens);
        }
    }
    Ok(comparisons)
}

/// Largest generation to measure the pair against: the configured
/// maximum when set, otherwise the largest key any compared treatment
/// reaches for this plot id
fn dataset_max_generation(
    config: &Config,
    data: &[TreatmentData],
    involved: &BTreeSet<usize>,
    plot_id: usize,
) -> Option<Generation> {
    if let Some(limit) = config.max_generation {
        return Some(generation(limit as f64));
    }
    involved
        .iter()
        .filter_map(|&id| data[id].loaded_raw().and_then(|raw| raw.max_generation(plot_id)))
        .max()
}

/// Run the rank test at every shared generation of one pair. Returns
/// `None`, and records nothing, when either side has no data for the
/// plot id at all.
fn compare(
    main: &RawData,
    other: &RawData,
    main_name: &str,
    other_name: &str,
    plot_id: usize,
    dataset_max: Option<Generation>,
    config: &Config,
) -> Option<Vec<Generation>> {
    if !main.contains(plot_id) {
        warn!(treatment = %main_name, plot_id, "no data to compare, skipping");
        return None;
    }
    if !other.contains(plot_id) {
        warn!(treatment = %other_name, plot_id, "no data to compare, skipping");
        return None;
    }
    let pair_max = main
        .max_generation(plot_id)
        .min(other.max_generation(plot_id));
    if let (Some(pair_max), Some(dataset_max)) = (pair_max, dataset_max) {
        if pair_max < dataset_max {
            warn!(
                main = %main_name,
                other = %other_name,
                plot_id,
                pair_max = %pair_max,
                dataset_max = %dataset_max,
                "comparison stops short of the dataset maximum generation"
            );
        }
    }

    let main_gens: BTreeSet<Generation> = main.generations(plot_id).into_iter().collect();
    let other_gens: BTreeSet<Generation> = other.generations(plot_id).into_iter().collect();
    let shared: Vec<Generation> = main_gens.intersection(&other_gens).copied().collect();

    let mut significant = Vec::new();
    for gen in shared.into_iter().step_by(config.stat_test_step.max(1)) {
        let a = main.sample(plot_id, gen).expect("generation is shared");
        let b = other.sample(plot_id, gen).expect("generation is shared");
        let p = mann_whitney_u(a, b);
        if p < config.p_threshold {
            significant.push(gen);
        }
    }
    Some(significant)
}

/// Parse the cache, rejecting it whole on any malformed entry, on a test
/// step mismatch, or when any implied comparison is missing
fn read_comparison_cache(
    path: &Path,
    expected_step: usize,
    implied: &[ComparisonKey],
) -> Result<Comparisons> {
    let content = fs::read_to_string(path)?;
    let mut comparisons = Comparisons::default();
    for line in content.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() < 4 {
            return Err(Error::short_cache_entry(4, fields.len()));
        }
        let plot_id = parse_cache_id(path, fields[0])?;
        let main = parse_cache_id(path, fields[1])?;
        let other = parse_cache_id(path, fields[2])?;
        let step = parse_cache_id(path, fields[3])?;
        if step != expected_step {
            return Err(Error::Cache(format!(
                "{}: computed with stat test step {step}, this run uses {expected_step}",
                path.display()
            )));
        }
        let gens = fields[4..]
            .iter()
            .map(|token| {
                token.parse::<f64>().map(generation).map_err(|_| {
                    Error::Cache(format!(
                        "{}: unreadable generation {token:?}",
                        path.display()
                    ))
                })
            })
            .collect::<Result<Vec<Generation>>>()?;
        comparisons.entries.insert((plot_id, main, other), gens);
    }

    for &(plot_id, main, other) in implied {
        if !comparisons.entries.contains_key(&(plot_id, main, other)) {
            return Err(Error::Cache(format!(
                "{}: no entry for plot {plot_id}, treatments {main} and {other}",
                path.display()
            )));
        }
    }
    Ok(comparisons)
}

fn parse_cache_id(path: &Path, token: &str) -> Result<usize> {
    token.parse().map_err(|_| {
        Error::Cache(format!(
            "{}: unreadable cache field {token:?}",
            path.display()
        ))
    })
}

/// Persist every entry as `plot_id main_id other_id step gen...`
fn write_comparison_cache(path: &Path, step: usize, comparisons: &Comparisons) -> Result<()> {
    let mut out = BufWriter::new(fs::File::create(path)?);
    for ((plot_id, main, other), gens) in comparisons.iter() {
        write!(out, "{plot_id} {main} {other} {step}")?;
        for gen in gens {
            write!(out, " {gen}")?;
        }
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}
