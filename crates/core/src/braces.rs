//! Brace-depth scanning.
//!
//! Counts `{` and `}` with no lexical awareness: braces inside string
//! literals and comments count too. Callers treat a negative result as a sign
//! of malformed structure.

/// Net brace change on a single line (`+1` per `{`, `-1` per `}`).
pub fn brace_delta(line: &str) -> i32 {
    line.chars().fold(0, |depth, ch| match ch {
        '{' => depth + 1,
        '}' => depth - 1,
        _ => depth,
    })
}

/// Net depth change over lines `[from, to]` inclusive.
///
/// Indices past the end of `lines` are ignored, and `from > to` yields 0.
pub fn depth_at<S: AsRef<str>>(lines: &[S], from: usize, to: usize) -> i32 {
    if from > to {
        return 0;
    }
    lines.iter().skip(from).take(to - from + 1).map(|l| brace_delta(l.as_ref())).sum()
}

/// Running brace depth, fed one line at a time.
#[derive(Debug, Default, Clone, Copy)]
pub struct DepthTracker {
    depth: i32,
}

impl DepthTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Depth before the next line is fed.
    pub fn depth(&self) -> i32 {
        self.depth
    }

    pub fn at_top_level(&self) -> bool {
        self.depth == 0
    }

    pub fn feed(&mut self, line: &str) {
        self.depth += brace_delta(line);
    }
}
