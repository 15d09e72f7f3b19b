//! Duplicate include block removal.
//!
//! Splicing the include block on a file that already has one leaves two
//! copies. This removes the second, found by its banner line. The span is the
//! block itself and nothing past it, whatever the number of classes it lists.

use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

use crate::error::{Result, SplitError};
use crate::types::SourceBuffer;

/// Spans longer than this are left alone. A marker that far from the end of
/// its include run is not sitting in a generated block.
pub const MAX_BLOCK_LINES: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DedupeOutcome {
    /// Fewer than two occurrences of the marker.
    NoDuplicate,
    /// 0-based inclusive span that was deleted.
    Removed { start: usize, end: usize },
}

fn is_comment(line: &str) -> bool {
    line.trim_start().starts_with("//")
}

fn is_include(line: &str) -> bool {
    line.trim_start().starts_with("#include")
}

/// Span of the duplicate block, if there is one.
///
/// Backwards from the second marker line the span takes the banner's comment
/// lines and one blank line before them. Forwards it takes comment lines up to
/// the first `#include`, then the run of `#include` lines. The first line that
/// fits neither ends it, so code right after the block is never touched.
pub fn find_duplicate_span(buffer: &SourceBuffer, marker: &str) -> Option<(usize, usize)> {
    let lines = buffer.lines();
    let second = lines.iter().enumerate().filter(|(_, l)| l.contains(marker)).nth(1)?.0;

    let mut start = second;
    while start > 0 && is_comment(&lines[start - 1]) {
        start -= 1;
    }
    if start > 0 && lines[start - 1].trim().is_empty() {
        start -= 1;
    }
    if start == 0 {
        return None;
    }

    let mut end = second;
    let mut in_includes = false;
    for (i, line) in lines.iter().enumerate().skip(second + 1) {
        if is_include(line) {
            in_includes = true;
        } else if in_includes || !is_comment(line) {
            break;
        }
        end = i;
    }

    let span = end - start + 1;
    if span > MAX_BLOCK_LINES {
        warn!(marker, line = second + 1, span, "Duplicate block is implausibly long, leaving it");
        return None;
    }
    Some((start, end))
}

/// Remove the second marked block from `buffer` in place.
pub fn dedupe_buffer(buffer: &mut SourceBuffer, marker: &str) -> DedupeOutcome {
    match find_duplicate_span(buffer, marker) {
        Some((start, end)) => {
            buffer.remove_range(start, end);
            DedupeOutcome::Removed { start, end }
        }
        None => DedupeOutcome::NoDuplicate,
    }
}

/// Remove the duplicate block from the file at `path`. The file is only
/// rewritten when something was removed.
pub fn dedupe_file(path: &Path, marker: &str) -> Result<DedupeOutcome> {
    if !path.exists() {
        return Err(SplitError::io(path, std::io::Error::from(std::io::ErrorKind::NotFound)));
    }
    let mut buffer = SourceBuffer::read(path)?;
    let before = buffer.len();
    let outcome = dedupe_buffer(&mut buffer, marker);
    match outcome {
        DedupeOutcome::Removed { start, end } => {
            buffer.write_atomic(path)?;
            info!(
                path = %path.display(),
                start = start + 1,
                end = end + 1,
                removed = before - buffer.len(),
                "Removed duplicate block"
            );
        }
        DedupeOutcome::NoDuplicate => info!(path = %path.display(), "No duplicate block found"),
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::splice::splice;
    use crate::types::IncludeBlock;

    const BANNER: &str = "Service module include section";

    fn with_blocks(copies: usize) -> SourceBuffer {
        let classes = ["UserService", "ProductService", "CartService", "AddressService", "CouponService", "ReviewService", "OrderService"];
        let block = IncludeBlock::for_classes(BANNER, "services", &classes);
        let mut lines = vec!["#include <mutex>".to_string(), "anchor;".to_string()];
        for _ in 0..copies {
            lines.extend(block.lines.iter().cloned());
        }
        lines.push(String::new());
        lines.push("class EmshopServiceManager {".to_string());
        lines.push("};".to_string());
        SourceBuffer::from_lines(lines)
    }

    #[test]
    fn test_second_copy_is_removed() {
        let mut buf = with_blocks(2);
        let expected = with_blocks(1);
        let outcome = dedupe_buffer(&mut buf, BANNER);
        assert!(matches!(outcome, DedupeOutcome::Removed { .. }), "got {outcome:?}");
        assert_eq!(buf.text(), expected.text());
    }

    #[test]
    fn test_dedupe_twice_is_noop() {
        let mut buf = with_blocks(2);
        dedupe_buffer(&mut buf, BANNER);
        let once = buf.clone();
        assert_eq!(dedupe_buffer(&mut buf, BANNER), DedupeOutcome::NoDuplicate);
        assert_eq!(buf, once);
    }

    #[test]
    fn test_single_copy_is_untouched() {
        let mut buf = with_blocks(1);
        let before = buf.clone();
        assert_eq!(dedupe_buffer(&mut buf, BANNER), DedupeOutcome::NoDuplicate);
        assert_eq!(buf, before);
    }

    /// `int keep_N;` code lines straight after the anchor, no blank between.
    fn code_after_anchor() -> SourceBuffer {
        let mut lines = vec!["#include <mutex>".to_string(), "anchor;".to_string()];
        lines.extend((0..30).map(|i| format!("int keep_{i};")));
        SourceBuffer::from_lines(lines)
    }

    #[test]
    fn test_short_blocks_spliced_twice_dedupe_to_one() {
        for classes in [&["UserService"][..], &["UserService", "CartService"][..]] {
            let block = IncludeBlock::for_classes(BANNER, "services", classes);
            let mut once = code_after_anchor();
            splice(&mut once, "anchor;", &block).unwrap();
            let mut twice = once.clone();
            splice(&mut twice, "anchor;", &block).unwrap();

            let outcome = dedupe_buffer(&mut twice, BANNER);
            assert!(matches!(outcome, DedupeOutcome::Removed { .. }), "got {outcome:?}");
            assert_eq!(twice.text(), once.text(), "{} class block", classes.len());
            assert!(twice.lines().iter().any(|l| l.contains("int keep_29;")));
        }
    }

    #[test]
    fn test_comment_after_block_is_kept() {
        let block = IncludeBlock::for_classes(BANNER, "services", &["UserService"]);
        let mut lines = vec!["anchor;".to_string()];
        lines.extend(block.lines.iter().cloned());
        lines.extend(block.lines.iter().cloned());
        lines.push("// Manager".to_string());
        lines.push("class EmshopServiceManager {".to_string());
        let mut buf = SourceBuffer::from_lines(lines);
        dedupe_buffer(&mut buf, BANNER);
        assert_eq!(buf.len(), 1 + block.len() + 2);
        assert_eq!(buf.trimmed(buf.len() - 2), Some("// Manager"));
    }

    #[test]
    fn test_overlong_span_is_left_alone() {
        let classes: Vec<String> = (0..40).map(|i| format!("Service{i}")).collect();
        let block = IncludeBlock::for_classes(BANNER, "services", &classes);
        let mut lines = vec!["anchor;".to_string()];
        lines.extend(block.lines.iter().cloned());
        lines.extend(block.lines.iter().cloned());
        let mut buf = SourceBuffer::from_lines(lines);
        let before = buf.clone();
        assert_eq!(dedupe_buffer(&mut buf, BANNER), DedupeOutcome::NoDuplicate);
        assert_eq!(buf, before);
    }
}
