//! The top-level query surface
//!
//! A [`Dataset`] resolves the configured treatments once and then answers
//! plotting queries: statistic series, x values, pooled maxima, and
//! significance comparisons. Everything is computed lazily and at most
//! once per process; repeated queries return the memoized result.

use crate::catalog::{Treatment, TreatmentList};
use crate::comparison::{load_or_compute, Comparisons};
use crate::series::TreatmentData;
use evoplot_core::{Config, Error, Generation, Result, StatSeries};
use evoplot_stats::StatKind;
use tracing::warn;

pub struct Dataset {
    config: Config,
    list: TreatmentList,
    data: Vec<TreatmentData>,
    comparisons: Option<Comparisons>,
}

impl Dataset {
    /// Resolve every configured treatment. Raw data is not parsed yet;
    /// that happens on first query.
    pub fn new(config: Config) -> Result<Self> {
        let list = TreatmentList::from_config(&config)?;
        let data = list.iter().cloned().map(TreatmentData::new).collect();
        Ok(Self {
            config,
            list,
            data,
            comparisons: None,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn treatments(&self) -> &TreatmentList {
        &self.list
    }

    pub fn treatment(&self, id: usize) -> Option<&Treatment> {
        self.list.get(id)
    }

    /// Resolve a treatment reference (numeric id, name, or short name)
    pub fn resolve_treatment(&self, reference: &str) -> Option<usize> {
        self.list.resolve_id(reference)
    }

    /// The statistic series of one treatment and plot id
    pub fn get_stats(
        &mut self,
        treatment: usize,
        plot_id: usize,
        kind: StatKind,
    ) -> Result<&StatSeries> {
        let config = &self.config;
        let data = self
            .data
            .get_mut(treatment)
            .ok_or_else(|| Error::Config(format!("no treatment with id {treatment}")))?;
        data.stats(plot_id, kind, config)
    }

    /// The x axis for one series: the generation keys themselves when they
    /// come from the files or are derived from the data, otherwise the
    /// regular `0, step, 2*step, ...` grid up to the configured maximum
    pub fn get_x_values(
        &mut self,
        treatment: usize,
        plot_id: usize,
        kind: StatKind,
    ) -> Result<Vec<f64>> {
        let from_keys = self.config.x_from_file() || self.config.max_generation.is_none();
        let step = self.config.step.max(1);
        let series = self.get_stats(treatment, plot_id, kind)?;
        if from_keys {
            Ok(series.generations().map(|g| g.0).collect())
        } else {
            Ok((0..series.len() * step)
                .step_by(step)
                .map(|g| g as f64)
                .collect())
        }
    }

    /// Largest generation to consider for a plot id: the configured
    /// maximum when set, otherwise the largest key any treatment reaches
    pub fn max_generation(&mut self, plot_id: usize) -> Result<Option<Generation>> {
        if let Some(limit) = self.config.max_generation {
            return Ok(Some(evoplot_core::generation(limit as f64)));
        }
        let mut max = None;
        for data in &mut self.data {
            max = max.max(data.max_generation(plot_id, &self.config)?);
        }
        Ok(max)
    }

    /// The full comparison set, computed (or read from cache) on first use
    pub fn comparisons(&mut self) -> Result<&Comparisons> {
        self.ensure_comparisons()?;
        Ok(self
            .comparisons
            .as_ref()
            .expect("comparisons populated above"))
    }

    /// Significant generations for one comparison. A comparison the
    /// configuration never implied, or that was skipped for missing data,
    /// yields an empty list.
    pub fn get_comparison(
        &mut self,
        plot_id: usize,
        main: usize,
        other: usize,
    ) -> Result<Vec<Generation>> {
        self.ensure_comparisons()?;
        let comparisons = self
            .comparisons
            .as_ref()
            .expect("comparisons populated above");
        match comparisons.get(plot_id, main, other) {
            Some(gens) => Ok(gens.to_vec()),
            None => {
                warn!(
                    plot_id,
                    main, other, "no comparison available for this pair"
                );
                Ok(Vec::new())
            }
        }
    }

    fn ensure_comparisons(&mut self) -> Result<()> {
        if self.comparisons.is_none() {
            let comparisons = load_or_compute(&self.config, &self.list, &mut self.data)?;
            self.comparisons = Some(comparisons);
        }
        Ok(())
    }
}
