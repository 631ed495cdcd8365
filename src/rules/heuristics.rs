//! Named predicates behind the content checks.
//!
//! Each false-positive exclusion lives here as a small function so it can be
//! tested on its own. The checks only combine them.

use globset::GlobSet;
use regex::Regex;

// ============================================================================
// Path helpers
// ============================================================================

/// Final path component.
#[must_use]
pub fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Basename up to its first dot: `home_controller.g.dart` -> `home_controller`.
#[must_use]
pub fn stem(path: &str) -> &str {
    let name = basename(path);
    name.split('.').next().unwrap_or(name)
}

/// Directory components of a path, excluding the file name.
pub fn dir_segments(path: &str) -> impl Iterator<Item = &str> {
    let mut parts: Vec<&str> = path.split('/').collect();
    parts.pop();
    parts.into_iter().filter(|s| !s.is_empty())
}

/// Whether the basename carries one of the given extensions (without dot).
#[must_use]
pub fn has_extension(path: &str, extensions: &[String]) -> bool {
    let name = basename(path);
    match name.rsplit_once('.') {
        Some((head, ext)) if !head.is_empty() => extensions.iter().any(|e| e == ext),
        _ => false,
    }
}

/// Whether the path matches the generated-file globs.
#[must_use]
pub fn is_generated_file(path: &str, generated: &GlobSet) -> bool {
    generated.is_match(path)
}

/// Whether the path matches the test-file globs.
#[must_use]
pub fn is_test_file(path: &str, tests: &GlobSet) -> bool {
    tests.is_match(path)
}

/// Whether a path belongs to the UI layer: a UI folder segment or a UI file
/// suffix such as `_page` or `_widget`.
#[must_use]
pub fn is_ui_file(path: &str, segments: &[String], suffixes: &[String]) -> bool {
    let name = stem(path);
    dir_segments(path).any(|seg| segments.iter().any(|s| s == seg))
        || suffixes.iter().any(|s| name.ends_with(s.as_str()))
}

// ============================================================================
// Line helpers
// ============================================================================

/// Whether the line is entirely a comment.
#[must_use]
pub fn is_comment_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("//") || trimmed.starts_with("/*") || trimmed.starts_with('*')
}

/// Whether byte offset `idx` of `line` falls inside a string literal.
///
/// Quote-parity over the text before `idx`, tracking which quote opened the
/// literal and skipping backslash escapes. Multi-line and raw strings are not
/// modelled.
#[must_use]
pub fn inside_string_literal(line: &str, idx: usize) -> bool {
    let mut open: Option<char> = None;
    let mut escaped = false;

    for (pos, ch) in line.char_indices() {
        if pos >= idx {
            break;
        }
        if escaped {
            escaped = false;
            continue;
        }
        match (open, ch) {
            (Some(_), '\\') => escaped = true,
            (Some(q), c) if c == q => open = None,
            (None, '\'' | '"') => open = Some(ch),
            _ => {}
        }
    }

    open.is_some()
}

/// Byte offset of the first `//` that starts a trailing comment.
#[must_use]
pub fn line_comment_start(line: &str) -> Option<usize> {
    line.match_indices("//")
        .map(|(i, _)| i)
        .find(|&i| !inside_string_literal(line, i))
}

/// Whether `idx` sits after a trailing `//` comment on the line.
#[must_use]
pub fn in_trailing_comment(line: &str, idx: usize) -> bool {
    line_comment_start(line).is_some_and(|start| start < idx)
}

/// Whether `line` declares a compile-time or immutable binding.
#[must_use]
pub fn is_constant_declaration(line: &str) -> bool {
    let trimmed = line.trim_start();
    ["const ", "static ", "final "]
        .iter()
        .any(|kw| trimmed.starts_with(kw))
}

/// Name of the innermost call whose argument list is still open at the end
/// of `text`: `Text('x', style: TextStyle(fontSize: 14.sp, ` -> `TextStyle`.
///
/// Parentheses inside string literals are not modelled.
#[must_use]
pub fn enclosing_call(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    for (pos, ch) in text.char_indices().rev() {
        match ch {
            ')' => depth += 1,
            '(' if depth == 0 => {
                let head = &text[..pos];
                let start = head
                    .char_indices()
                    .rev()
                    .take_while(|(_, c)| c.is_alphanumeric() || *c == '_')
                    .last()
                    .map(|(i, _)| i)?;
                return Some(&head[start..]);
            }
            '(' => depth -= 1,
            _ => {}
        }
    }
    None
}

/// Shorten a source line for display.
#[must_use]
pub fn excerpt(line: &str, max_chars: usize) -> String {
    let trimmed = line.trim();
    if trimmed.chars().count() <= max_chars {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

// ============================================================================
// Value helpers
// ============================================================================

/// Whether a string literal value uses `$name` / `${expr}` interpolation.
#[must_use]
pub fn has_interpolation(value: &str) -> bool {
    value.contains('$')
}

/// Whether a literal is empty or only escape sequences and whitespace.
#[must_use]
pub fn is_escape_only(value: &str) -> bool {
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            chars.next();
        } else if !c.is_whitespace() {
            return false;
        }
    }
    true
}

/// Whether an intentionally-dynamic marker comment sits on the line at
/// `idx`, the next line, or the previous line.
#[must_use]
pub fn has_dynamic_marker(lines: &[&str], idx: usize, markers: &[Regex]) -> bool {
    let candidates = [Some(idx), idx.checked_add(1), idx.checked_sub(1)];
    candidates
        .into_iter()
        .flatten()
        .filter_map(|i| lines.get(i))
        .any(|line| markers.iter().any(|m| m.is_match(line)))
}

/// Whether a numeric literal is zero (`0`, `0.0`, `00`).
#[must_use]
pub fn is_zero_literal(value: &str) -> bool {
    value.parse::<f64>().is_ok_and(|v| v == 0.0)
}

/// Whether a commit title or message marks work in progress.
#[must_use]
pub fn is_wip(text: &str, prefixes: &[String]) -> bool {
    let lowered = text.trim_start().to_lowercase();
    prefixes.iter().any(|p| lowered.starts_with(p.as_str()))
}

/// Whether the text after `TODO` starts with a ticket reference.
#[must_use]
pub fn has_ticket_reference(rest: &str, ticket: &Regex) -> bool {
    ticket.is_match(rest)
}

/// Whether a secret candidate is a known placeholder.
#[must_use]
pub fn is_placeholder_value(value: &str, placeholders: &[String]) -> bool {
    let lowered = value.to_lowercase();
    let mut chars = lowered.chars();
    let repeated = match chars.next() {
        Some(first) => chars.all(|c| c == first),
        None => true,
    };
    repeated || placeholders.iter().any(|p| lowered.contains(p.as_str()))
}

/// Whether an identifier names something that holds no secret
/// (`passwordHint`, `token_key`, `apiKeyHeader`, ...).
#[must_use]
pub fn is_safe_identifier(name: &str, safe_suffixes: &[String]) -> bool {
    let normalized: String = name
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .collect::<String>()
        .to_lowercase();
    safe_suffixes.iter().any(|s| normalized.ends_with(s.as_str()))
}
