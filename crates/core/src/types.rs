//! Core types shared across classplit: the mutable source buffer, extraction
//! requests and ranges, extracted bodies, rewritten units, include blocks,
//! and the per-run report.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::{Result, SplitError};

// ---------------------------------------------------------------------------
// Source buffer
// ---------------------------------------------------------------------------

/// One file's contents as an ordered list of lines.
///
/// Every line keeps its own terminator (`\n`, `\r\n`, or none for a final
/// unterminated line), so [`SourceBuffer::text`] reproduces the file exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceBuffer {
    lines: Vec<String>,
}

impl SourceBuffer {
    pub fn from_text(text: &str) -> Self {
        Self { lines: text.split_inclusive('\n').map(str::to_string).collect() }
    }

    /// Build a buffer from bare lines, terminating each with `\n`.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self { lines: lines.into_iter().map(|l| format!("{}\n", l.as_ref())).collect() }
    }

    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| SplitError::io(path, e))?;
        Ok(Self::from_text(&text))
    }

    /// Write to a sibling temp file, then rename over `path`.
    pub fn write_atomic(&self, path: &Path) -> Result<()> {
        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("source");
        let tmp = path.with_file_name(format!(".{file_name}.classplit.tmp"));
        std::fs::write(&tmp, self.text()).map_err(|e| SplitError::io(&tmp, e))?;
        std::fs::rename(&tmp, path).map_err(|e| SplitError::io(path, e))
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Raw line, terminator included.
    pub fn line(&self, idx: usize) -> Option<&str> {
        self.lines.get(idx).map(String::as_str)
    }

    /// Line content with surrounding whitespace (and the terminator) removed.
    pub fn trimmed(&self, idx: usize) -> Option<&str> {
        self.line(idx).map(str::trim)
    }

    pub fn text(&self) -> String {
        self.lines.concat()
    }

    /// The terminator the file predominantly uses.
    pub fn line_ending(&self) -> &'static str {
        let crlf = self.lines.iter().filter(|l| l.ends_with("\r\n")).count();
        if crlf * 2 > self.lines.len() {
            "\r\n"
        } else {
            "\n"
        }
    }

    /// Remove `[start, end]` inclusive and return the removed lines.
    pub(crate) fn remove_range(&mut self, start: usize, end: usize) -> Vec<String> {
        self.lines.drain(start..=end).collect()
    }

    /// Insert already-terminated lines so the first lands at index `at`.
    pub(crate) fn insert_lines(&mut self, at: usize, new_lines: Vec<String>) {
        let at = at.min(self.lines.len());
        if at > 0 {
            let ending = self.line_ending();
            let prev = &mut self.lines[at - 1];
            if !prev.ends_with('\n') {
                prev.push_str(ending);
            }
        }
        self.lines.splice(at..at, new_lines);
    }

    /// Put lines back at `at`; the inverse of [`SourceBuffer::remove_range`].
    #[cfg(test)]
    pub(crate) fn restore_lines(&mut self, at: usize, old_lines: Vec<String>) {
        let at = at.min(self.lines.len());
        self.lines.splice(at..at, old_lines);
    }
}

// ---------------------------------------------------------------------------
// Extraction requests and ranges
// ---------------------------------------------------------------------------

/// Where to look for one class. Line indices are 0-based and approximate;
/// they only bound the search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionRequest {
    pub class_name: String,
    pub hint_start: usize,
    pub hint_end: usize,
}

impl ExtractionRequest {
    pub fn new(class_name: impl Into<String>, hint_start: usize, hint_end: usize) -> Self {
        Self { class_name: class_name.into(), hint_start, hint_end }
    }
}

/// Exact inclusive line range of one class, from its `class X : public Base`
/// line through its own closing `};`. Only valid until the buffer changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExtractionRange {
    pub start: usize,
    pub end: usize,
}

impl ExtractionRange {
    pub fn line_count(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn contains(&self, idx: usize) -> bool {
        idx >= self.start && idx <= self.end
    }
}

// ---------------------------------------------------------------------------
// Extracted bodies and rewritten units
// ---------------------------------------------------------------------------

/// Lines removed for one class. `body` excludes the declaration line and the
/// closing `};`, which are kept separately so the removal stays lossless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedBody {
    pub class_name: String,
    pub range: ExtractionRange,
    pub declaration: String,
    pub body: Vec<String>,
    pub closing: String,
}

impl ExtractedBody {
    /// Every removed line, in original order.
    pub fn original_lines(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.declaration.as_str())
            .chain(self.body.iter().map(String::as_str))
            .chain(std::iter::once(self.closing.as_str()))
    }

    pub fn line_count(&self) -> usize {
        self.body.len() + 2
    }
}

/// Per-class output of the qualifier rewriter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenUnit {
    pub class_name: String,
    pub lines: Vec<String>,
    /// Signatures that received a `ClassName::` qualifier.
    pub qualified: usize,
    /// Lines removed (access labels, synchronization members).
    pub dropped: usize,
}

impl RewrittenUnit {
    pub fn body_text(&self) -> String {
        self.lines.concat()
    }

    /// Full artifact text: fixed header block followed by the rewritten body.
    pub fn to_source(&self) -> String {
        let name = &self.class_name;
        let mut out = String::with_capacity(self.lines.iter().map(String::len).sum::<usize>() + 128);
        out.push_str("/**\n");
        out.push_str(&format!(" * @file {name}.cpp\n"));
        out.push_str(&format!(" * @brief {name} implementation\n"));
        out.push_str(" */\n");
        out.push('\n');
        out.push_str(&format!("#include \"{name}.h\"\n"));
        out.push('\n');
        out.push_str(&self.body_text());
        out
    }
}

// ---------------------------------------------------------------------------
// Include block
// ---------------------------------------------------------------------------

/// Include directives inserted once per run after the anchor line. Lines are
/// stored without terminators; the splicer adds the buffer's own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeBlock {
    pub lines: Vec<String>,
}

impl IncludeBlock {
    /// Banner plus a `.h`/`.cpp` include pair per class, in the given order.
    pub fn for_classes<S: AsRef<str>>(banner: &str, include_dir: &str, classes: &[S]) -> Self {
        let rule = format!("// {}", "=".repeat(68));
        let mut lines = vec![
            String::new(),
            rule.clone(),
            format!("// {banner}"),
            "// Service classes are included only after their base class is complete".to_string(),
            rule,
        ];
        let dir = include_dir.trim_end_matches('/');
        for class in classes {
            let class = class.as_ref();
            if dir.is_empty() {
                lines.push(format!("#include \"{class}.h\""));
                lines.push(format!("#include \"{class}.cpp\""));
            } else {
                lines.push(format!("#include \"{dir}/{class}.h\""));
                lines.push(format!("#include \"{dir}/{class}.cpp\""));
            }
        }
        Self { lines }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub(crate) fn terminated(&self, ending: &str) -> Vec<String> {
        self.lines.iter().map(|l| format!("{l}{ending}")).collect()
    }
}

// ---------------------------------------------------------------------------
// Run report
// ---------------------------------------------------------------------------

/// What happened to one requested class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClassOutcome {
    Extracted { lines: usize },
    BoundaryNotFound,
    EndNotFound,
}

impl ClassOutcome {
    pub fn is_extracted(&self) -> bool {
        matches!(self, ClassOutcome::Extracted { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassReport {
    pub name: String,
    pub outcome: ClassOutcome,
    /// 1-based range the class occupied when it was removed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines: Option<(usize, usize)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub source: PathBuf,
    pub dry_run: bool,
    pub original_lines: usize,
    pub final_lines: usize,
    /// Net lines removed from the source (negative if the file grew).
    pub reduction: i64,
    /// 1-based line where the include block starts, if one was inserted.
    pub include_line: Option<usize>,
    pub classes: Vec<ClassReport>,
    pub headers_written: Vec<PathBuf>,
}

impl RunReport {
    pub fn extracted_count(&self) -> usize {
        self.classes.iter().filter(|c| c.outcome.is_extracted()).count()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
