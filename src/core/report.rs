// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// Shared reporting helpers used by diagnostics rendering.

use serde_json::json;

use crate::core::error::Diagnostic;

/// Highlight columns `column..=col_end` (1-based) of `line`.
pub fn highlight_span(
    line: &str,
    column: Option<usize>,
    col_end: Option<usize>,
    use_color: bool,
) -> String {
    match column {
        Some(col) if col > 0 && use_color => {
            let chars: Vec<char> = line.chars().collect();
            let start = col - 1;
            if start >= chars.len() {
                return format!("{line}\x1b[31m^\x1b[0m");
            }
            let end = col_end.unwrap_or(col).max(col).min(chars.len());
            let head: String = chars[..start].iter().collect();
            let mid: String = chars[start..end].iter().collect();
            let rest: String = chars[end..].iter().collect();
            format!("{head}\x1b[31m{mid}\x1b[0m{rest}")
        }
        _ => line.to_string(),
    }
}

/// One diagnostic as a JSON object.
pub fn diagnostic_json(diag: &Diagnostic) -> serde_json::Value {
    json!({
        "code": diag.code(),
        "severity": diag.severity().as_str(),
        "message": diag.message(),
        "file": diag.file(),
        "line": diag.line(),
        "col_start": diag.column(),
        "col_end": diag.col_end(),
        "notes": diag.notes(),
        "help": diag.help(),
    })
}
