//! Typed engine configuration
//!
//! All tunables are resolved into this struct once at startup; the engine
//! never performs name-based option lookup at run time. Multi-valued
//! options that allow per-plot or per-treatment overrides of a shared
//! default are held in a [`PerIndex`] list, whose accessor implements the
//! documented "use the value at this index, or fall back to the first
//! value" semantics.

use std::path::PathBuf;

/// A list of values with index-or-first fallback semantics
///
/// An empty list yields `None` for every index; a single-element list acts
/// as a shared default for all indices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerIndex<T> {
    values: Vec<T>,
}

impl<T> PerIndex<T> {
    pub fn new(values: Vec<T>) -> Self {
        Self { values }
    }

    /// A single shared value for all indices
    pub fn shared(value: T) -> Self {
        Self {
            values: vec![value],
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The value at `index`, or the first value when the index is not set
    pub fn get_or_first(&self, index: usize) -> Option<&T> {
        self.values.get(index).or_else(|| self.values.first())
    }

    /// The value at `index` only; no fallback
    pub fn get(&self, index: usize) -> Option<&T> {
        self.values.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.values.iter()
    }
}

impl<T> From<Vec<T>> for PerIndex<T> {
    fn from(values: Vec<T>) -> Self {
        Self::new(values)
    }
}

/// How a generation key is assigned to each parsed value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum XPolicy {
    /// Generation = line index within the file, starting at zero
    #[default]
    Sequential,
    /// Generation read from the given column of each line
    FromColumn(usize),
    /// Generation taken from this list, indexed by line number
    Explicit(Vec<f64>),
    /// Files grouped per pool directory; values merged by element-wise
    /// maximum at each line position before entering the series
    PooledMax,
    /// Every part of a treatment holds observations for a single
    /// generation, assigned in part order
    OnePerPart,
}

/// One treatment specification: the files or directories its data comes from
#[derive(Debug, Clone, Default)]
pub struct TreatmentSpec {
    pub paths: Vec<PathBuf>,
    pub name: Option<String>,
    pub short_name: Option<String>,
}

impl TreatmentSpec {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            paths: vec![path.into()],
            ..Default::default()
        }
    }

    pub fn named(path: impl Into<PathBuf>, name: &str) -> Self {
        Self {
            paths: vec![path.into()],
            name: Some(name.to_string()),
            short_name: None,
        }
    }
}

/// Engine configuration, fully resolved at startup
#[derive(Debug, Clone)]
pub struct Config {
    /// Column separator for input files; `None` splits on any whitespace
    pub separator: Option<char>,
    /// Step-size with which series are computed and plotted
    pub step: usize,
    /// Step-size at which statistical comparisons are performed
    pub stat_test_step: usize,
    /// Maximum generation to consider; `None` derives it from the data
    pub max_generation: Option<u64>,
    /// Column indices to aggregate (plot ids)
    pub plot_ids: Vec<usize>,
    /// Generation-assignment policy
    pub x_policy: XPolicy,

    /// Treatment sources
    pub treatments: Vec<TreatmentSpec>,
    /// All treatment paths are taken relative to this directory
    pub treatment_root: PathBuf,
    /// Directory/file templates used to resolve treatment directories
    pub templates: Vec<String>,
    /// Templates selecting sibling pool directories; non-empty enables
    /// the pooled-maximum policy
    pub pool_templates: Vec<String>,

    /// Confidence level for interval estimation
    pub confidence_level: f64,
    /// Resamples for the hand-rolled bootstrap methods
    pub bootstrap_samples: usize,
    /// Resamples for the BCa-family methods
    pub library_bootstrap_samples: usize,
    /// Base seed for bootstrap resampling; `None` draws one per run
    pub bootstrap_seed: Option<u64>,
    /// Rejection threshold for the rank-sum test
    pub p_threshold: f64,

    /// Master cache toggles
    pub read_cache: bool,
    pub write_cache: bool,
    /// Per-tier cache toggles
    pub read_series_cache: bool,
    pub write_series_cache: bool,
    pub read_comparison_cache: bool,
    pub write_comparison_cache: bool,

    /// Output directory; the default comparison cache lives here
    pub output_directory: PathBuf,
    /// Explicit comparison-cache path, overriding the default
    pub comparison_cache: Option<PathBuf>,

    /// Main treatment of each comparison bar, as an index or (short) name
    pub comparison_main: Vec<String>,
    /// Treatments each main is compared against; an empty entry means
    /// every other treatment
    pub comparison_others: Vec<Vec<String>>,

    /// Per-treatment plotting affordances, resolved by the catalog and
    /// consumed only by the rendering layer
    pub treatment_names: PerIndex<String>,
    pub treatment_names_short: PerIndex<String>,
    pub colors: PerIndex<String>,
    pub background_colors: PerIndex<String>,
    pub markers: PerIndex<String>,
    pub linestyles: PerIndex<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            separator: Some(' '),
            step: 1,
            stat_test_step: 1,
            max_generation: None,
            plot_ids: vec![1],
            x_policy: XPolicy::Sequential,
            treatments: Vec::new(),
            treatment_root: PathBuf::new(),
            templates: vec![".*".to_string()],
            pool_templates: Vec::new(),
            confidence_level: 0.95,
            bootstrap_samples: 10_000,
            library_bootstrap_samples: 2_000,
            bootstrap_seed: None,
            p_threshold: 0.05,
            read_cache: true,
            write_cache: true,
            read_series_cache: true,
            write_series_cache: true,
            read_comparison_cache: true,
            write_comparison_cache: true,
            output_directory: PathBuf::from("."),
            comparison_cache: None,
            comparison_main: vec!["0".to_string()],
            comparison_others: Vec::new(),
            treatment_names: PerIndex::default(),
            treatment_names_short: PerIndex::default(),
            colors: PerIndex::new(
                ["#000082", "#008200", "#820000", "#008282", "#828200", "#820082"]
                    .map(String::from)
                    .to_vec(),
            ),
            background_colors: PerIndex::default(),
            markers: PerIndex::new(["o", "^", "v", "<", ">", "*"].map(String::from).to_vec()),
            linestyles: PerIndex::shared("-".to_string()),
        }
    }
}

impl Config {
    /// Whether the series cache may be read
    pub fn series_cache_readable(&self) -> bool {
        self.read_cache && self.read_series_cache
    }

    /// Whether a freshly computed series should be written back
    pub fn series_cache_writable(&self) -> bool {
        self.write_cache && self.write_series_cache
    }

    pub fn comparison_cache_readable(&self) -> bool {
        self.read_cache && self.read_comparison_cache
    }

    pub fn comparison_cache_writable(&self) -> bool {
        self.write_cache && self.write_comparison_cache
    }

    /// The comparison-cache path: explicit if configured, otherwise
    /// `comparison.cache` in the output directory
    pub fn comparison_cache_path(&self) -> PathBuf {
        self.comparison_cache
            .clone()
            .unwrap_or_else(|| self.output_directory.join("comparison.cache"))
    }

    /// Other-treatment ids configured for comparison bar `index`
    pub fn comparison_others_for(&self, index: usize) -> &[String] {
        self.comparison_others
            .get(index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether the pooled-maximum policy is in effect
    pub fn pooling(&self) -> bool {
        !self.pool_templates.is_empty()
    }

    /// Whether generations come from the data rather than line numbering,
    /// which disables the positional cache shape check
    pub fn x_from_file(&self) -> bool {
        matches!(self.x_policy, XPolicy::FromColumn(_))
    }
}

/// Lighten a `#rrggbb` color by adding 128 to each channel, saturating.
/// Used to derive the default shaded-region color for a treatment.
pub fn lighten_color(color: &str) -> String {
    let mut out = String::from("#");
    let hex = color.trim_start_matches('#');
    for chunk in hex.as_bytes().chunks(2) {
        if chunk.len() < 2 {
            break;
        }
        let text = std::str::from_utf8(chunk).unwrap_or("00");
        let byte = u8::from_str_radix(text, 16).unwrap_or(0);
        out.push_str(&format!("{:x}", byte.saturating_add(128)));
    }
    out
}
