//! Raw string literal conversion.
//!
//! Rewrites every `R"( ... )"` literal into plain quoted literals, one per
//! non-blank content line, for toolchains that mishandle raw strings.

use regex::{Captures, Regex};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{info, warn};

use crate::error::{Result, SplitError};

/// Continuation indent placed before each literal of a multi-line result.
pub const CONTINUATION_INDENT: &str = "\n        ";

fn raw_string_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?s)R"\((.*?)\)""#).unwrap())
}

fn quote(line: &str) -> String {
    format!("\"{}\"", line.replace('\\', "\\\\").replace('"', "\\\""))
}

fn convert_literal(content: &str) -> String {
    let quoted: Vec<String> =
        content.lines().map(str::trim).filter(|l| !l.is_empty()).map(quote).collect();
    match quoted.len() {
        0 => "\"\"".to_string(),
        1 => quoted[0].clone(),
        _ => format!("{CONTINUATION_INDENT}{}", quoted.join(CONTINUATION_INDENT)),
    }
}

/// Convert every raw string literal in `text`.
pub fn convert_raw_strings(text: &str) -> String {
    raw_string_re().replace_all(text, |caps: &Captures| convert_literal(&caps[1])).into_owned()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileConversion {
    Converted,
    NoConversionNeeded,
    Missing,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RawStringSummary {
    pub files: Vec<(PathBuf, FileConversion)>,
}

impl RawStringSummary {
    pub fn converted_count(&self) -> usize {
        self.files.iter().filter(|(_, c)| *c == FileConversion::Converted).count()
    }
}

/// Convert one file in place. Unchanged files are not rewritten.
pub fn convert_file(path: &Path) -> Result<FileConversion> {
    let content = std::fs::read_to_string(path).map_err(|e| SplitError::io(path, e))?;
    let converted = convert_raw_strings(&content);
    if converted == content {
        info!(path = %path.display(), "No conversion needed");
        return Ok(FileConversion::NoConversionNeeded);
    }
    std::fs::write(path, converted).map_err(|e| SplitError::io(path, e))?;
    info!(path = %path.display(), "Converted raw string literals");
    Ok(FileConversion::Converted)
}

/// Convert each file in turn; missing files are reported and skipped.
pub fn convert_files<P: AsRef<Path>>(paths: &[P]) -> Result<RawStringSummary> {
    let mut summary = RawStringSummary::default();
    for path in paths {
        let path = path.as_ref();
        let status = if path.exists() {
            convert_file(path)?
        } else {
            warn!(path = %path.display(), "File does not exist");
            FileConversion::Missing
        };
        summary.files.push((path.to_path_buf(), status));
    }
    info!(converted = summary.converted_count(), files = summary.files.len(), "Raw string conversion finished");
    Ok(summary)
}
