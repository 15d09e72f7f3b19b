//! Include block insertion.
//!
//! The block goes right after the anchor line. Splicing twice leaves two
//! adjacent copies: removing them is [`crate::dedupe`]'s job.

use tracing::{info, warn};

use crate::error::{Result, SplitError};
use crate::types::{IncludeBlock, SourceBuffer};

/// Index of the anchor line: the first line containing `marker`.
///
/// Later matches are reported and ignored.
pub fn find_anchor(buffer: &SourceBuffer, marker: &str) -> Option<usize> {
    let mut hits = buffer.lines().iter().enumerate().filter(|(_, l)| l.contains(marker)).map(|(i, _)| i);
    let first = hits.next()?;
    let extra = hits.count();
    if extra > 0 {
        warn!(marker, line = first + 1, extra, "Anchor marker is not unique, using the first match");
    }
    Some(first)
}

/// Insert `block` so its first line lands at index `at`. Returns `at`.
pub fn splice_at(buffer: &mut SourceBuffer, at: usize, block: &IncludeBlock) -> usize {
    let ending = buffer.line_ending();
    buffer.insert_lines(at, block.terminated(ending));
    info!(line = at + 1, lines = block.len(), "Inserted include block");
    at
}

/// Insert `block` immediately after the line containing `anchor_marker`.
/// Returns the index of the block's first line.
pub fn splice(buffer: &mut SourceBuffer, anchor_marker: &str, block: &IncludeBlock) -> Result<usize> {
    let anchor = find_anchor(buffer, anchor_marker)
        .ok_or_else(|| SplitError::AnchorNotFound { marker: anchor_marker.to_string() })?;
    Ok(splice_at(buffer, anchor + 1, block))
}
