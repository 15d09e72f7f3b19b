//! Class body extraction.
//!
//! Removes a located range from the buffer in place. Offsets computed before
//! the removal go stale for everything below `range.start`, so callers apply
//! removals bottom-up and shift any offsets they still hold with
//! [`shift_after_removal`].

use tracing::info;

use crate::types::{ExtractedBody, ExtractionRange, SourceBuffer};

/// Delete `range` from `buffer` and return what was removed.
///
/// `range` must come from [`crate::locate::locate`] on this same buffer
/// state; it always spans at least two lines.
pub fn extract(buffer: &mut SourceBuffer, class_name: &str, range: ExtractionRange) -> ExtractedBody {
    let mut removed = buffer.remove_range(range.start, range.end);
    let closing = removed.pop().unwrap_or_default();
    let declaration = if removed.is_empty() { String::new() } else { removed.remove(0) };

    info!(
        class = class_name,
        start = range.start + 1,
        end = range.end + 1,
        lines = range.line_count(),
        "Extracted class"
    );

    ExtractedBody { class_name: class_name.to_string(), range, declaration, body: removed, closing }
}

/// Where an offset recorded before removing `range` points afterwards.
///
/// Offsets above the range are unchanged. Offsets below it move up by the
/// removed line count. An offset inside the range collapses onto
/// `range.start`, the line that now follows the gap.
pub fn shift_after_removal(offset: usize, range: ExtractionRange) -> usize {
    if offset <= range.start {
        offset
    } else if offset > range.end {
        offset - range.line_count()
    } else {
        range.start
    }
}
