//! Helpers for sanitizing data before it enters tracing span attributes.
//!
//! Spans may be shared for debugging, so recipient numbers and spool paths
//! are reduced before they are recorded.

use std::path::Path;

/// Returns only the filename component of a path (no directory).
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Masks all but the last three digits of a fax number.
///
/// `4923311234` → `*******234`. Numbers of three digits or fewer are fully
/// masked.
pub fn redact_number(number: &str) -> String {
    let len = number.chars().count();
    if len <= 3 {
        return "*".repeat(len);
    }
    let visible: String = number.chars().skip(len - 3).collect();
    format!("{}{}", "*".repeat(len - 3), visible)
}
