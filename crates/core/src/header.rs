//! Declaration header synthesis.
//!
//! Builds `<Class>.h` from an extracted class by collapsing each top-level
//! member function body to a `;` declaration. Fields, access labels, nested
//! types and comments are kept as they are. The unit written alongside holds
//! the definitions.

use std::path::{Path, PathBuf};
use tracing::info;

use crate::braces::{brace_delta, DepthTracker};
use crate::error::{Result, SplitError};
use crate::qualify::{is_constructor, is_method_signature};
use crate::types::ExtractedBody;

/// Strip the body (and a constructor's initializer list) from a signature
/// that may span several joined lines.
pub fn declaration_from(signature: &str) -> String {
    let before_brace = match signature.find('{') {
        Some(pos) => &signature[..pos],
        None => signature,
    };
    let Some(open) = before_brace.find('(') else {
        return format!("{};", before_brace.trim_end());
    };

    let mut depth = 0i32;
    let mut close = None;
    for (i, ch) in before_brace[open..].char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    close = Some(open + i);
                    break;
                }
            }
            _ => {}
        }
    }
    let Some(close) = close else {
        return format!("{};", before_brace.trim_end());
    };

    let head = &before_brace[..=close];
    let tail = before_brace[close + 1..].trim();
    if tail.is_empty() || tail.starts_with(':') {
        format!("{head};")
    } else {
        format!("{head} {tail};")
    }
}

fn terminator(line: &str) -> &str {
    if line.ends_with("\r\n") {
        "\r\n"
    } else if line.ends_with('\n') {
        "\n"
    } else {
        ""
    }
}

/// Class declaration with member function bodies collapsed.
pub fn declare_class(extracted: &ExtractedBody) -> Vec<String> {
    let class = extracted.class_name.as_str();
    let mut out = vec![extracted.declaration.clone()];
    let mut depth = DepthTracker::new();
    let initial = brace_delta(&extracted.declaration) - 1;
    if initial < 0 {
        depth.feed(&"}".repeat(initial.unsigned_abs() as usize));
    }

    let mut pending: Option<(String, String)> = None;
    let mut skipping = false;

    for line in &extracted.body {
        if skipping {
            depth.feed(line);
            if depth.at_top_level() {
                skipping = false;
            }
            continue;
        }

        let starts_signature =
            depth.at_top_level() && (is_constructor(line, class) || is_method_signature(line, class));
        if pending.is_none() && !starts_signature {
            out.push(line.clone());
            depth.feed(line);
            continue;
        }

        let (indent, mut sig) = pending.take().unwrap_or_else(|| {
            let indent = line.len() - line.trim_start().len();
            (line[..indent].to_string(), String::new())
        });
        if !sig.is_empty() {
            sig.push(' ');
        }
        sig.push_str(line.trim());

        if sig.contains('{') {
            out.push(format!("{indent}{}{}", declaration_from(&sig), terminator(line)));
            depth.feed(line);
            skipping = !depth.at_top_level();
        } else if sig.ends_with(';') {
            out.push(format!("{indent}{sig}{}", terminator(line)));
        } else {
            pending = Some((indent, sig));
        }
    }

    if let Some((indent, sig)) = pending {
        out.push(format!("{indent}{sig}\n"));
    }
    out.push(extracted.closing.clone());
    out
}

/// Full header text for one extracted class.
pub fn header_source(extracted: &ExtractedBody) -> String {
    let name = &extracted.class_name;
    let mut out = String::new();
    out.push_str("/**\n");
    out.push_str(&format!(" * @file {name}.h\n"));
    out.push_str(&format!(" * @brief {name} declaration\n"));
    out.push_str(" */\n");
    out.push('\n');
    out.push_str("#pragma once\n");
    out.push('\n');
    out.push_str(&declare_class(extracted).concat());
    out
}

/// Write `<dir>/<Class>.h` unless it already exists. Returns the path when a
/// file was written.
pub fn write_header(dir: &Path, extracted: &ExtractedBody) -> Result<Option<PathBuf>> {
    let path = dir.join(format!("{}.h", extracted.class_name));
    if path.exists() {
        info!(class = extracted.class_name.as_str(), path = %path.display(), "Header exists, leaving it alone");
        return Ok(None);
    }
    std::fs::write(&path, header_source(extracted)).map_err(|e| SplitError::io(&path, e))?;
    info!(class = extracted.class_name.as_str(), path = %path.display(), "Wrote header");
    Ok(Some(path))
}
