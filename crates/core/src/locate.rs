//! Class boundary location.
//!
//! Finds the exact line range of `class <Name> : public <Base> { ... };` from an
//! approximate hint. There is no parser behind this: the start is a literal
//! match inside a window around the hint, and the end is the first `};` whose
//! surroundings look like the end of a top-level class. Each rule is its own
//! predicate so the "skip rather than guess" policy can be tested and tuned
//! on its own.

use tracing::{debug, warn};

use crate::braces::depth_at;
use crate::types::{ExtractionRange, ExtractionRequest, SourceBuffer};

/// Lines searched on either side of `hint_start` for the declaration.
pub const SEARCH_WINDOW: usize = 50;

/// Lines past `hint_end` still searched for the closing `};`.
pub const END_LOOKAHEAD: usize = 100;

/// A closing candidate must sit more than this many lines below the
/// declaration. Rules out small nested structs and enums near the top.
pub const MIN_CLASS_SPAN: usize = 10;

/// Why a class could not be located. Neither case is fatal to a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LocateError {
    #[error("class declaration not found near the hinted line")]
    BoundaryNotFound,
    #[error("no acceptable closing '}};' found for the class")]
    EndNotFound,
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// `class <name> : public <base>` appears literally on the line.
pub fn is_class_declaration(line: &str, class_name: &str, base_class: &str) -> bool {
    line.contains(&format!("class {class_name} : public {base_class}"))
}

/// The trimmed line is exactly `};`.
pub fn is_closing_candidate(line: &str) -> bool {
    line.trim() == "};"
}

/// The candidate is far enough below the declaration to be the class end.
pub fn clears_minimum_span(declaration: usize, candidate: usize) -> bool {
    candidate > declaration + MIN_CLASS_SPAN
}

/// The next non-blank line after a class end: a comment, another class, or a
/// `=====` section separator.
pub fn is_class_terminator_context(next_line: &str) -> bool {
    let t = next_line.trim();
    t.starts_with("//") || t.starts_with("/*") || t.starts_with("class ") || t.contains("=====")
}

/// Index of the first non-blank line after `idx`, if any.
pub fn next_non_blank(buffer: &SourceBuffer, idx: usize) -> Option<usize> {
    (idx + 1..buffer.len()).find(|&i| buffer.trimmed(i).is_some_and(|t| !t.is_empty()))
}

// ---------------------------------------------------------------------------
// Locator
// ---------------------------------------------------------------------------

/// Find the declaration line within [`SEARCH_WINDOW`] of the hint.
pub fn find_declaration(
    buffer: &SourceBuffer,
    class_name: &str,
    base_class: &str,
    hint_start: usize,
) -> Option<usize> {
    let from = hint_start.saturating_sub(SEARCH_WINDOW);
    let to = buffer.len().min(hint_start.saturating_add(SEARCH_WINDOW));
    (from..to).find(|&i| {
        buffer.line(i).is_some_and(|l| is_class_declaration(l, class_name, base_class))
    })
}

/// Find the class's own closing `};`, scanning from the declaration up to
/// `hint_end + END_LOOKAHEAD`.
pub fn find_end(buffer: &SourceBuffer, declaration: usize, hint_end: usize) -> Option<usize> {
    let limit = buffer.len().min(hint_end.saturating_add(END_LOOKAHEAD));
    (declaration..limit).find(|&i| {
        let Some(line) = buffer.line(i) else {
            return false;
        };
        if !is_closing_candidate(line) || !clears_minimum_span(declaration, i) {
            return false;
        }
        // A `};` at end of file has no context to confirm it.
        match next_non_blank(buffer, i).and_then(|n| buffer.line(n)) {
            Some(next) => is_class_terminator_context(next),
            None => false,
        }
    })
}

/// Locate one class. The range runs from the declaration line through the
/// class's closing `};`, both inclusive.
pub fn locate(
    buffer: &SourceBuffer,
    request: &ExtractionRequest,
    base_class: &str,
) -> Result<ExtractionRange, LocateError> {
    let class = request.class_name.as_str();

    let start = find_declaration(buffer, class, base_class, request.hint_start)
        .ok_or(LocateError::BoundaryNotFound)?;
    let end = find_end(buffer, start, request.hint_end).ok_or(LocateError::EndNotFound)?;

    let depth = depth_at(buffer.lines(), start, end);
    if depth != 0 {
        // Accepted anyway: braces in literals and comments skew the count.
        warn!(class, start = start + 1, end = end + 1, depth, "Brace depth not balanced at located boundary");
    }
    debug!(class, start = start + 1, end = end + 1, "Located class");

    Ok(ExtractionRange { start, end })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// A class whose `};` lands on `close_at`, followed by a blank line and
    /// `after`.
    fn class_fixture(name: &str, decl_at: usize, close_at: usize, after: &str) -> SourceBuffer {
        let mut lines: Vec<String> = Vec::new();
        for i in 0..decl_at {
            lines.push(format!("// filler {i}"));
        }
        lines.push(format!("class {name} : public BaseService {{"));
        lines.push("public:".to_string());
        while lines.len() < close_at {
            let n = lines.len();
            lines.push(format!("    json call{n}() {{ return json(); }}"));
        }
        lines.push("};".to_string());
        lines.push(String::new());
        lines.push(after.to_string());
        SourceBuffer::from_lines(lines)
    }

    #[test]
    fn test_locate_simple_class() {
        let buf = class_fixture("Foo", 10, 40, "// Bar service");
        let range = locate(&buf, &ExtractionRequest::new("Foo", 10, 40), "BaseService").unwrap();
        assert_eq!(range, ExtractionRange { start: 10, end: 40 });
    }

    #[test]
    fn test_locate_tolerates_inexact_hint() {
        let buf = class_fixture("Foo", 30, 60, "class Next : public BaseService {");
        let range = locate(&buf, &ExtractionRequest::new("Foo", 5, 20), "BaseService").unwrap();
        assert_eq!(range, ExtractionRange { start: 30, end: 60 });
    }

    #[test]
    fn test_declaration_outside_window_is_not_found() {
        let buf = class_fixture("Foo", 120, 150, "// end");
        let err = locate(&buf, &ExtractionRequest::new("Foo", 10, 150), "BaseService").unwrap_err();
        assert_eq!(err, LocateError::BoundaryNotFound);
    }

    #[test]
    fn test_wrong_base_class_is_not_found() {
        let buf = class_fixture("Foo", 10, 40, "// end");
        let err = locate(&buf, &ExtractionRequest::new("Foo", 10, 40), "Widget").unwrap_err();
        assert_eq!(err, LocateError::BoundaryNotFound);
    }

    #[test]
    fn test_nested_struct_end_followed_by_members_is_rejected() {
        let mut lines = vec!["class Foo : public BaseService {".to_string(), "public:".to_string()];
        for i in 0..12 {
            lines.push(format!("    int field{i};"));
        }
        lines.push("    struct Row {".to_string());
        lines.push("        int id;".to_string());
        lines.push("    };".to_string());
        lines.push(String::new());
        lines.push("    json list() {".to_string());
        lines.push("        return json();".to_string());
        lines.push("    }".to_string());
        lines.push("};".to_string());
        lines.push(String::new());
        lines.push("// next".to_string());
        let buf = SourceBuffer::from_lines(&lines);

        let nested_close = 16;
        assert!(is_closing_candidate(buf.line(nested_close).unwrap()));
        let range = locate(&buf, &ExtractionRequest::new("Foo", 0, 10), "BaseService").unwrap();
        assert_eq!(range.start, 0);
        assert_eq!(range.end, lines.len() - 3, "picked {range:?}");
    }

    #[test]
    fn test_close_too_near_declaration_is_skipped() {
        let mut lines = vec!["class Tiny : public BaseService {".to_string()];
        lines.push("    int x;".to_string());
        lines.push("};".to_string());
        lines.push("// end".to_string());
        let buf = SourceBuffer::from_lines(&lines);
        let err = locate(&buf, &ExtractionRequest::new("Tiny", 0, 3), "BaseService").unwrap_err();
        assert_eq!(err, LocateError::EndNotFound);
    }

    #[test]
    fn test_end_beyond_lookahead_is_not_found() {
        let buf = class_fixture("Foo", 0, 300, "// end");
        let err = locate(&buf, &ExtractionRequest::new("Foo", 0, 20), "BaseService").unwrap_err();
        assert_eq!(err, LocateError::EndNotFound);
    }

    #[test]
    fn test_close_at_end_of_file_is_unconfirmed() {
        let mut lines = vec!["class Foo : public BaseService {".to_string()];
        for i in 0..15 {
            lines.push(format!("    int f{i};"));
        }
        lines.push("};".to_string());
        let buf = SourceBuffer::from_lines(&lines);
        let err = locate(&buf, &ExtractionRequest::new("Foo", 0, 16), "BaseService").unwrap_err();
        assert_eq!(err, LocateError::EndNotFound);
    }

    #[test]
    fn test_terminator_context_predicate() {
        assert!(is_class_terminator_context("// Cart service"));
        assert!(is_class_terminator_context("/* block */"));
        assert!(is_class_terminator_context("class Next : public BaseService {"));
        assert!(is_class_terminator_context("// ======================"));
        assert!(!is_class_terminator_context("json list() {"));
        assert!(!is_class_terminator_context("int x;"));
    }
}
