//! Treatment catalog
//!
//! Resolves a treatment specification (explicit files, directories, or
//! pooled sibling directories) into a concrete file list, a stable root
//! directory and a collision-resistant cache-file-name prefix.

use evoplot_core::{lighten_color, Config, Error, Result, TreatmentSpec};
use regex::Regex;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// One experimental condition with its resolved input files
#[derive(Debug, Clone)]
pub struct Treatment {
    /// Assignment order within the catalog
    pub id: usize,
    /// Display name, used for legends and warnings
    pub name: String,
    /// Short name, used where the full name does not fit
    pub short_name: String,
    /// All resolved input files
    pub files: Vec<PathBuf>,
    /// Files grouped by the provided path they were resolved from
    pub parts: Vec<Vec<PathBuf>>,
    /// Matched pool directories, parallel to `files_per_pool`
    pub pool_dirs: Vec<PathBuf>,
    /// Files grouped per pool directory, for the pooled-maximum policy
    pub files_per_pool: Vec<Vec<PathBuf>>,
    /// Longest common ancestor of the resolved files; cache files live here
    pub root_directory: PathBuf,
    /// `ch_{prefix}_` component of this treatment's cache file names
    cache_prefix: String,

    // Plotting affordances, consumed only by the rendering layer
    pub color: String,
    pub background_color: String,
    pub marker: String,
    pub linestyle: String,
}

impl Treatment {
    /// Resolve a specification against the catalog configuration.
    /// The id is assigned when the treatment is added to a list.
    pub fn resolve(spec: &TreatmentSpec, config: &Config) -> Result<Self> {
        let mut files = Vec::new();
        let mut parts = Vec::new();
        let mut pool_dirs = Vec::new();
        let mut files_per_pool = Vec::new();

        if config.pooling() {
            for path in &spec.paths {
                let root = config.treatment_root.join(path);
                for pool_dir in find_dirs(&config.pool_templates, &root)? {
                    let pooled = find_files(&config.templates, &pool_dir)?;
                    debug!(pool_dir = %pool_dir.display(), n = pooled.len(), "resolved pool directory");
                    files.extend(pooled.iter().cloned());
                    files_per_pool.push(pooled);
                    pool_dirs.push(pool_dir);
                }
            }
        } else {
            for path in &spec.paths {
                let path = config.treatment_root.join(path);
                if path.is_file() {
                    debug!(file = %path.display(), "retrieving file");
                    files.push(path.clone());
                    parts.push(vec![path]);
                } else {
                    debug!(directory = %path.display(), templates = ?config.templates,
                           "retrieving files from directory");
                    let found = find_files(&config.templates, &path)?;
                    files.extend(found.iter().cloned());
                    parts.push(found);
                }
            }
        }

        let (root_directory, prefix) = if files.is_empty() {
            warn!(treatment = spec.name.as_deref().unwrap_or("<unnamed>"),
                  "treatment has no files associated with it");
            (PathBuf::new(), String::new())
        } else {
            let root = common_ancestor(&files);
            let prefix = create_prefix(&root, &files);
            (root, prefix)
        };

        Ok(Self {
            id: 0,
            name: spec.name.clone().unwrap_or_default(),
            short_name: spec.short_name.clone().unwrap_or_default(),
            files,
            parts,
            pool_dirs,
            files_per_pool,
            root_directory,
            cache_prefix: format!("ch_{prefix}_"),
            color: String::new(),
            background_color: String::new(),
            marker: String::new(),
            linestyle: String::new(),
        })
    }

    /// Path of the series cache file for a plot id and statistic kind
    pub fn cache_file_name(&self, plot_id: usize, stat_kind: &str) -> PathBuf {
        self.root_directory
            .join(format!("{}{stat_kind}_{plot_id}.cache", self.cache_prefix))
    }
}

/// Ordered collection of treatments; ids follow insertion order
#[derive(Debug, Default)]
pub struct TreatmentList {
    treatments: Vec<Treatment>,
    unnamed_count: usize,
}

impl TreatmentList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the catalog from the configured treatment specifications
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut list = Self::new();
        for (index, spec) in config.treatments.iter().enumerate() {
            let mut spec = spec.clone();
            if spec.name.is_none() {
                spec.name = config.treatment_names.get(index).cloned();
            }
            if spec.short_name.is_none() {
                spec.short_name = config.treatment_names_short.get(index).cloned();
            }
            let mut treatment = Treatment::resolve(&spec, config)?;
            let color = config
                .colors
                .get_or_first(index)
                .cloned()
                .unwrap_or_else(|| "#505050".to_string());
            treatment.background_color = config
                .background_colors
                .get(index)
                .cloned()
                .unwrap_or_else(|| lighten_color(&color));
            treatment.color = color;
            treatment.marker = config
                .markers
                .get_or_first(index)
                .cloned()
                .unwrap_or_else(|| "*".to_string());
            treatment.linestyle = config
                .linestyles
                .get_or_first(index)
                .cloned()
                .unwrap_or_else(|| "-".to_string());
            list.add(treatment);
        }
        Ok(list)
    }

    /// Add a treatment, assigning its id and a fallback name
    pub fn add(&mut self, mut treatment: Treatment) {
        treatment.id = self.treatments.len();
        if treatment.name.is_empty() {
            self.unnamed_count += 1;
            treatment.name = format!("Unnamed {}", self.unnamed_count);
        }
        if treatment.short_name.is_empty() {
            treatment.short_name = treatment.name.clone();
        }
        self.treatments.push(treatment);
    }

    pub fn len(&self) -> usize {
        self.treatments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.treatments.is_empty()
    }

    pub fn get(&self, id: usize) -> Option<&Treatment> {
        self.treatments.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Treatment> {
        self.treatments.iter()
    }

    /// Resolve a treatment reference: a numeric id, a name, or a short name.
    /// A numeric reference outside the catalog resolves to `None` like any
    /// other unknown reference.
    pub fn resolve_id(&self, reference: &str) -> Option<usize> {
        if let Ok(id) = reference.parse::<usize>() {
            return (id < self.treatments.len()).then_some(id);
        }
        self.treatments
            .iter()
            .find(|t| t.name == reference || t.short_name == reference)
            .map(|t| t.id)
    }
}

/// Walk `templates` from `start`, one level per template. Every level must
/// match directory names; the last level matches file names. Matches are
/// anchored at the start of the name.
pub fn find_files(templates: &[String], start: &Path) -> Result<Vec<PathBuf>> {
    let mut current = vec![start.to_path_buf()];
    let mut files = Vec::new();
    for (level, template) in templates.iter().enumerate() {
        let regex = compile_template(template, true)?;
        let last = level + 1 == templates.len();
        let mut next = Vec::new();
        for directory in &current {
            for entry in sorted_entries(directory)? {
                let name = entry.file_name().and_then(|n| n.to_str()).unwrap_or("");
                if !regex.is_match(name) {
                    continue;
                }
                if entry.is_dir() {
                    next.push(entry.clone());
                }
                if last && entry.is_file() {
                    files.push(entry);
                }
            }
        }
        current = next;
    }
    debug!(?templates, n = files.len(), "template walk finished");
    Ok(files)
}

/// Find directories matching the template chain, contains-style matching.
/// Used to locate sibling pool directories.
pub fn find_dirs(templates: &[String], start: &Path) -> Result<Vec<PathBuf>> {
    let mut current = vec![start.to_path_buf()];
    for template in templates {
        let regex = compile_template(template, false)?;
        let mut next = Vec::new();
        for directory in &current {
            for entry in sorted_entries(directory)? {
                let name = entry.file_name().and_then(|n| n.to_str()).unwrap_or("");
                if entry.is_dir() && regex.is_match(name) {
                    next.push(entry);
                }
            }
        }
        current = next;
    }
    Ok(current)
}

fn compile_template(template: &str, anchored: bool) -> Result<Regex> {
    let pattern = if anchored {
        format!("^(?:{template})")
    } else {
        template.to_string()
    };
    Regex::new(&pattern)
        .map_err(|e| Error::Config(format!("invalid template {template:?}: {e}")))
}

/// Directory entries in name order, for deterministic resolution
fn sorted_entries(directory: &Path) -> Result<Vec<PathBuf>> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(directory)?
        .collect::<std::io::Result<Vec<_>>>()?
        .into_iter()
        .map(|e| e.path())
        .collect();
    entries.sort();
    Ok(entries)
}

/// Longest common ancestor directory of a non-empty file list
fn common_ancestor(files: &[PathBuf]) -> PathBuf {
    let mut common: Vec<Component> = files[0].components().collect();
    for file in &files[1..] {
        let components: Vec<Component> = file.components().collect();
        let shared = common
            .iter()
            .zip(components.iter())
            .take_while(|(a, b)| a == b)
            .count();
        common.truncate(shared);
    }
    let ancestor: PathBuf = common.iter().collect();
    if ancestor.is_file() {
        ancestor.parent().map(Path::to_path_buf).unwrap_or_default()
    } else {
        ancestor
    }
}

/// Build the cache-file-name prefix for a resolved file set.
///
/// Path segments (relative to the root) that agree across all files stay
/// human readable; any level where the files disagree contributes all of
/// its segment names to a single hashed component, so that different file
/// sets get different prefixes with hash-collision-level probability.
pub fn create_prefix(root: &Path, files: &[PathBuf]) -> String {
    let mut levels: Vec<Vec<String>> = Vec::new();
    for file in files {
        let relative = file.strip_prefix(root).unwrap_or(file);
        for (depth, component) in relative.components().enumerate() {
            if levels.len() <= depth {
                levels.resize(depth + 1, Vec::new());
            }
            levels[depth].push(component.as_os_str().to_string_lossy().into_owned());
        }
    }

    let mut readable = String::new();
    let mut hashed = Vec::new();
    for names in &levels {
        if names.iter().all(|name| name == &names[0]) {
            if !readable.is_empty() {
                readable.push('_');
            }
            readable.push_str(&names[0]);
        } else {
            hashed.extend(names.iter().cloned());
        }
    }

    if hashed.is_empty() {
        return readable;
    }
    let mut hasher = blake3::Hasher::new();
    for name in &hashed {
        hasher.update(&(name.len() as u32).to_le_bytes());
        hasher.update(name.as_bytes());
    }
    let digest = hasher.finalize().to_hex();
    let mut prefix = digest[..16].to_string();
    if !readable.is_empty() {
        prefix.push('_');
        prefix.push_str(&readable);
    }
    prefix
}
