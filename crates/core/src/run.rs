//! Orchestration of one split run.
//!
//! [`split_buffer`] does all structural work in memory: locate, extract and
//! rewrite each requested class bottom-up, then splice the include block once.
//! [`run`] wraps it with file I/O. Units are written first and the source
//! last, so a failed unit write never leaves the source missing classes.

use std::path::PathBuf;
use tracing::{info, warn};

use crate::config::SplitConfig;
use crate::error::{Result, SplitError};
use crate::extract::{extract, shift_after_removal};
use crate::header::write_header;
use crate::locate::{locate, LocateError};
use crate::qualify::rewrite_extracted;
use crate::splice::{find_anchor, splice_at};
use crate::types::*;

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Do everything in memory; write nothing.
    pub dry_run: bool,
    /// Also write `<Class>.h` declarations (never over existing files).
    pub emit_headers: bool,
}

/// In-memory result of splitting one buffer.
#[derive(Debug, Clone)]
pub struct SplitBatch {
    /// One entry per request, in request order.
    pub classes: Vec<ClassReport>,
    /// Extracted classes with their rewritten units, in request order.
    pub units: Vec<(ExtractedBody, RewrittenUnit)>,
    /// Index of the include block's first line, if one was inserted.
    pub include_at: Option<usize>,
}

impl From<LocateError> for ClassOutcome {
    fn from(err: LocateError) -> Self {
        match err {
            LocateError::BoundaryNotFound => ClassOutcome::BoundaryNotFound,
            LocateError::EndNotFound => ClassOutcome::EndNotFound,
        }
    }
}

/// Requests in processing order: descending `hint_start`, ties in request order.
pub fn processing_order(requests: &[ExtractionRequest]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..requests.len()).collect();
    order.sort_by(|&a, &b| requests[b].hint_start.cmp(&requests[a].hint_start));
    order
}

/// Split every requested class out of `buffer` and splice the include block.
///
/// Fails only if the anchor line is missing, which is checked before the
/// buffer is touched. Classes that cannot be located are reported and skipped.
pub fn split_buffer(buffer: &mut SourceBuffer, config: &SplitConfig) -> Result<SplitBatch> {
    let anchor = find_anchor(buffer, &config.anchor_marker)
        .ok_or_else(|| SplitError::AnchorNotFound { marker: config.anchor_marker.clone() })?;
    let mut insert_at = anchor + 1;

    let requests = &config.classes;
    let mut outcomes: Vec<Option<ClassReport>> = vec![None; requests.len()];
    let mut extracted: Vec<Option<(ExtractedBody, RewrittenUnit)>> = vec![None; requests.len()];

    for idx in processing_order(requests) {
        let request = &requests[idx];
        let class = request.class_name.as_str();

        let report = match locate(buffer, request, &config.base_class) {
            Err(err) => {
                warn!(class, hint = request.hint_start + 1, reason = %err, "Skipping class");
                ClassReport { name: class.to_string(), outcome: err.into(), lines: None, unit: None }
            }
            Ok(range) => {
                if range.contains(insert_at) && insert_at != range.start {
                    warn!(class, anchor = insert_at + 1, "Include anchor falls inside an extracted class");
                }
                let body = extract(buffer, class, range);
                insert_at = shift_after_removal(insert_at, range);
                let unit = rewrite_extracted(&body);
                extracted[idx] = Some((body, unit));
                ClassReport {
                    name: class.to_string(),
                    outcome: ClassOutcome::Extracted { lines: range.line_count() },
                    lines: Some((range.start + 1, range.end + 1)),
                    unit: Some(PathBuf::from(&config.output_dir).join(format!("{class}.cpp"))),
                }
            }
        };
        outcomes[idx] = Some(report);
    }

    let units: Vec<(ExtractedBody, RewrittenUnit)> = extracted.into_iter().flatten().collect();
    let include_at = if units.is_empty() {
        info!("Nothing extracted, include block not inserted");
        None
    } else {
        let names: Vec<&str> = units.iter().map(|(b, _)| b.class_name.as_str()).collect();
        let block = IncludeBlock::for_classes(&config.include_banner, &config.output_dir, &names);
        Some(splice_at(buffer, insert_at, &block))
    };

    Ok(SplitBatch { classes: outcomes.into_iter().flatten().collect(), units, include_at })
}

/// Run a full split against the configured source file.
pub fn run(config: &SplitConfig, options: RunOptions) -> Result<RunReport> {
    let source = config.source_path();
    let mut buffer = SourceBuffer::read(&source)?;
    let original_lines = buffer.len();
    info!(source = %source.display(), lines = original_lines, requests = config.classes.len(), "Starting split");

    let batch = split_buffer(&mut buffer, config)?;

    let out_dir = config.output_path();
    let mut headers_written = Vec::new();
    if !options.dry_run && !batch.units.is_empty() {
        std::fs::create_dir_all(&out_dir).map_err(|e| SplitError::io(&out_dir, e))?;
        for (body, unit) in &batch.units {
            let path = out_dir.join(format!("{}.cpp", unit.class_name));
            std::fs::write(&path, unit.to_source()).map_err(|e| SplitError::io(&path, e))?;
            info!(
                class = unit.class_name.as_str(),
                path = %path.display(),
                qualified = unit.qualified,
                dropped = unit.dropped,
                "Wrote unit"
            );
            if options.emit_headers {
                headers_written.extend(write_header(&out_dir, body)?);
            }
        }
        buffer.write_atomic(&source)?;
    }

    let final_lines = buffer.len();
    let report = RunReport {
        source,
        dry_run: options.dry_run,
        original_lines,
        final_lines,
        reduction: original_lines as i64 - final_lines as i64,
        include_line: batch.include_at.map(|i| i + 1),
        classes: batch.classes,
        headers_written,
    };

    info!(
        extracted = report.extracted_count(),
        skipped = report.classes.len() - report.extracted_count(),
        original = original_lines,
        new = final_lines,
        reduction = report.reduction,
        dry_run = options.dry_run,
        "Split complete"
    );
    Ok(report)
}
