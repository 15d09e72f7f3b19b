//! `.classplit.toml` loading.
//!
//! Every key is optional; anything not set falls back to the defaults below,
//! which describe the original services split.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{Result, SplitError};
use crate::types::ExtractionRequest;

/// Config file name looked up in the project root.
pub const CONFIG_FILE: &str = ".classplit.toml";

/// Known keys in `.classplit.toml` for config validation.
const KNOWN_CONFIG_KEYS: &[&str] = &[
    "source",
    "base_class",
    "output_dir",
    "anchor_marker",
    "include_banner",
    "emit_headers",
    "raw_string_files",
    "classes",
];

pub const DEFAULT_SOURCE: &str = "emshop_native_impl_oop.cpp";
pub const DEFAULT_BASE_CLASS: &str = "BaseService";
pub const DEFAULT_OUTPUT_DIR: &str = "services";
pub const DEFAULT_ANCHOR_MARKER: &str =
    "std::unordered_map<std::string, bool>> BaseService::column_exists_cache_";
pub const DEFAULT_INCLUDE_BANNER: &str = "Service module include section";

/// Built-in request list: `(class, start, end)` as 1-based editor lines.
/// OrderService's hint refers to where it sits once the others are gone.
const DEFAULT_CLASSES: &[(&str, usize, usize)] = &[
    ("UserService", 1160, 1730),
    ("ProductService", 1731, 2439),
    ("CartService", 2440, 2736),
    ("AddressService", 2737, 3180),
    ("CouponService", 4153, 4505),
    ("ReviewService", 4507, 4755),
    ("OrderService", 1190, 2400),
];

/// Runtime configuration for a split run. Loaded from `.classplit.toml` or defaults.
#[derive(Debug, Clone)]
pub struct SplitConfig {
    pub root: PathBuf,
    /// Monolithic source, relative to `root` unless absolute.
    pub source: PathBuf,
    pub base_class: String,
    /// Output directory for units, relative to the source file's directory.
    /// Also used as the include path prefix.
    pub output_dir: String,
    pub anchor_marker: String,
    pub include_banner: String,
    pub emit_headers: bool,
    pub raw_string_files: Vec<PathBuf>,
    /// Extraction requests with 0-based hints, in declared order.
    pub classes: Vec<ExtractionRequest>,
}

impl SplitConfig {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            source: PathBuf::from(DEFAULT_SOURCE),
            base_class: DEFAULT_BASE_CLASS.to_string(),
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
            anchor_marker: DEFAULT_ANCHOR_MARKER.to_string(),
            include_banner: DEFAULT_INCLUDE_BANNER.to_string(),
            emit_headers: false,
            raw_string_files: Vec::new(),
            classes: DEFAULT_CLASSES
                .iter()
                .map(|&(name, start, end)| request_from_editor_lines(name, start, end))
                .collect(),
        }
    }

    /// Absolute path of the monolithic source.
    pub fn source_path(&self) -> PathBuf {
        self.root.join(&self.source)
    }

    /// Directory the units (and optional headers) are written to.
    pub fn output_path(&self) -> PathBuf {
        let source = self.source_path();
        let base = source.parent().map(Path::to_path_buf).unwrap_or_else(|| self.root.clone());
        base.join(&self.output_dir)
    }
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("."))
    }
}

/// 1-based editor lines to a 0-based request.
fn request_from_editor_lines(name: &str, start: usize, end: usize) -> ExtractionRequest {
    ExtractionRequest::new(name, start.saturating_sub(1), end.saturating_sub(1))
}

/// Simple Levenshtein edit distance for typo suggestions.
fn edit_distance(a: &str, b: &str) -> usize {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

fn warn_unknown_keys(table: &toml::Table) {
    for key in table.keys() {
        if KNOWN_CONFIG_KEYS.contains(&key.as_str()) {
            continue;
        }
        let suggestion = KNOWN_CONFIG_KEYS.iter().min_by_key(|k| edit_distance(key, k));
        match suggestion {
            Some(s) if edit_distance(key, s) <= 3 => {
                warn!(key = key.as_str(), suggestion = *s, "Unknown key in {CONFIG_FILE}, did you mean '{s}'?");
            }
            _ => {
                warn!(
                    key = key.as_str(),
                    "Unknown key in {CONFIG_FILE} (known keys: {})",
                    KNOWN_CONFIG_KEYS.join(", ")
                );
            }
        }
    }
}

fn string_key(table: &toml::Table, key: &str, path: &Path) -> Result<Option<String>> {
    match table.get(key) {
        None => Ok(None),
        Some(v) => v.as_str().map(|s| Some(s.to_string())).ok_or_else(|| SplitError::Config {
            path: path.to_path_buf(),
            message: format!("'{key}' must be a string"),
        }),
    }
}

fn path_list(value: &toml::Value, key: &str, path: &Path) -> Result<Vec<PathBuf>> {
    let invalid = || SplitError::Config {
        path: path.to_path_buf(),
        message: format!("'{key}' must be an array of strings"),
    };
    value
        .as_array()
        .ok_or_else(invalid)?
        .iter()
        .map(|v| v.as_str().map(PathBuf::from).ok_or_else(invalid))
        .collect()
}

fn parse_classes(value: &toml::Value, path: &Path) -> Result<Vec<ExtractionRequest>> {
    let invalid = |message: String| SplitError::Config { path: path.to_path_buf(), message };
    let entries =
        value.as_array().ok_or_else(|| invalid("'classes' must be an array of tables".into()))?;

    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let name = entry
                .get("name")
                .and_then(|v| v.as_str())
                .ok_or_else(|| invalid(format!("classes[{i}] is missing 'name'")))?;
            let line = |field: &str| -> Result<usize> {
                entry
                    .get(field)
                    .and_then(|v| v.as_integer())
                    .and_then(|n| usize::try_from(n).ok())
                    .ok_or_else(|| invalid(format!("classes[{i}] '{field}' must be a non-negative integer")))
            };
            let start = line("start")?;
            let end = match entry.get("end") {
                None => start,
                Some(_) => line("end")?,
            };
            Ok(request_from_editor_lines(name, start, end))
        })
        .collect()
}

/// Parse config text. `path` is only used in error messages.
pub fn parse_config(root: &Path, content: &str, path: &Path) -> Result<SplitConfig> {
    let mut config = SplitConfig::new(root.to_path_buf());
    let table = content.parse::<toml::Table>().map_err(|e| SplitError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    warn_unknown_keys(&table);

    if let Some(source) = string_key(&table, "source", path)? {
        config.source = PathBuf::from(source);
    }
    if let Some(base) = string_key(&table, "base_class", path)? {
        config.base_class = base;
    }
    if let Some(dir) = string_key(&table, "output_dir", path)? {
        config.output_dir = dir;
    }
    if let Some(marker) = string_key(&table, "anchor_marker", path)? {
        config.anchor_marker = marker;
    }
    if let Some(banner) = string_key(&table, "include_banner", path)? {
        config.include_banner = banner;
    }
    if let Some(v) = table.get("emit_headers") {
        config.emit_headers = v.as_bool().ok_or_else(|| SplitError::Config {
            path: path.to_path_buf(),
            message: "'emit_headers' must be a boolean".into(),
        })?;
    }
    if let Some(files) = table.get("raw_string_files") {
        config.raw_string_files = path_list(files, "raw_string_files", path)?;
    }
    if let Some(classes) = table.get("classes") {
        config.classes = parse_classes(classes, path)?;
    }

    Ok(config)
}

/// Load configuration from `.classplit.toml` in the given project root.
///
/// A missing file yields the defaults. A file that exists but cannot be read
/// or parsed is an error: running with silently different settings would
/// rewrite the wrong file.
pub fn load_config(project_root: &Path) -> Result<SplitConfig> {
    let config_path = project_root.join(CONFIG_FILE);
    if !config_path.exists() {
        debug!(root = %project_root.display(), "No {CONFIG_FILE}, using defaults");
        return Ok(SplitConfig::new(project_root.to_path_buf()));
    }

    debug!("Loading {CONFIG_FILE}");
    let content =
        std::fs::read_to_string(&config_path).map_err(|e| SplitError::io(&config_path, e))?;
    parse_config(project_root, &content, &config_path)
}
