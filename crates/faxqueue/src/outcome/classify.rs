//! Read-side interpretation of terminal records written by the worker.
//!
//! Worker output is loosely typed: numbers may arrive as strings, fields
//! move between `result` and the top level, and an abort is signalled in
//! several overlapping ways. Every function here is pure over a
//! `serde_json::Value` and never fails; absent or malformed data yields the
//! neutral answer.

use std::fmt;

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone};
use serde::Serialize;
use serde_json::Value;

use crate::job::record::{value_as_string, value_as_u64};

/// Worker status code for a transmission stopped on request.
pub const ABORT_STATUS_CODE: u64 = 345;

const ABORT_MARKER: &str = "abort";
const SUCCESS_MARKER: &str = "ok";
const FAILED_TEXT: &str = "FAILED";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Aborted,
    Failed,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Aborted => "aborted",
            Outcome::Failed => "failed",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn text_at(record: &Value, pointer: &str) -> Option<String> {
    record.pointer(pointer).and_then(value_as_string)
}

fn contains_marker(record: &Value, pointer: &str, marker: &str) -> bool {
    text_at(record, pointer)
        .map(|s| s.to_lowercase().contains(marker))
        .unwrap_or(false)
}

fn cancel_requested(record: &Value) -> bool {
    matches!(record.pointer("/cancel/requested"), Some(Value::Bool(true)))
}

/// `status` contains `ok`, case-insensitively.
pub fn is_success(record: &Value) -> bool {
    contains_marker(record, "/status", SUCCESS_MARKER)
}

pub fn is_aborted(record: &Value) -> bool {
    let requested = cancel_requested(record);
    if requested && text_at(record, "/cancel/handled_at").is_some_and(|s| !s.trim().is_empty()) {
        return true;
    }

    let marked = ["/result/reason", "/result/status_text", "/status", "/reason"]
        .iter()
        .any(|p| contains_marker(record, p, ABORT_MARKER));
    if marked {
        return true;
    }

    let code = record
        .pointer("/result/statuscode")
        .or_else(|| record.get("statuscode"))
        .and_then(value_as_u64);
    requested && code == Some(ABORT_STATUS_CODE)
}

/// Success is checked first, then abort, and anything else is a failure.
pub fn classify(record: &Value) -> Outcome {
    if is_success(record) {
        Outcome::Success
    } else if is_aborted(record) {
        Outcome::Aborted
    } else {
        Outcome::Failed
    }
}

/// Page information of a terminal record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCount {
    Pages(String),
    Fraction { sent: u64, total: u64 },
    Unknown,
}

impl fmt::Display for PageCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageCount::Pages(pages) => f.write_str(pages),
            PageCount::Fraction { sent, total } => write!(f, "{}/{}", sent, total),
            PageCount::Unknown => f.write_str("—"),
        }
    }
}

impl Serialize for PageCount {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PageCount::Unknown => serializer.serialize_none(),
            other => serializer.collect_str(other),
        }
    }
}

pub fn page_count(record: &Value) -> PageCount {
    if let Some(pages) = text_at(record, "/result/pages") {
        return PageCount::Pages(pages);
    }
    let sent = record.pointer("/result/npages").and_then(value_as_u64);
    let total = record.pointer("/result/totpages").and_then(value_as_u64);
    if let (Some(sent), Some(total)) = (sent, total) {
        return PageCount::Fraction { sent, total };
    }
    match text_at(record, "/pages") {
        Some(pages) => PageCount::Pages(pages),
        None => PageCount::Unknown,
    }
}

/// Human-readable failure reason, `FAILED` when the record carries none.
pub fn error_text(record: &Value) -> String {
    ["/result/error_message", "/result/stderr", "/error", "/error_message"]
        .iter()
        .find_map(|p| text_at(record, p).filter(|s| !s.trim().is_empty()))
        .unwrap_or_else(|| FAILED_TEXT.to_string())
}

pub fn finished_at(record: &Value) -> Option<String> {
    ["/end_time", "/completed_at", "/updated_at", "/created_at"]
        .iter()
        .find_map(|p| text_at(record, p))
}

pub fn started_at(record: &Value) -> Option<String> {
    text_at(record, "/started_at")
}

/// Parses an RFC 3339 timestamp; a timestamp without offset is read as
/// local time.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw.replace(' ', "T")) {
        return Some(ts);
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .and_then(|naive| Local.from_local_datetime(&naive).single())
        .map(DateTime::<FixedOffset>::from)
}

/// Whole seconds between `started_at` and the finish time, if both parse
/// and are in order.
pub fn duration_secs(record: &Value) -> Option<i64> {
    let start = parse_timestamp(&started_at(record)?)?;
    let end = parse_timestamp(&finished_at(record)?)?;
    let secs = (end - start).num_seconds();
    (secs >= 0).then_some(secs)
}

/// `42 s` below a minute, `3 min 5 s` otherwise.
pub fn format_duration(secs: i64) -> String {
    let minutes = secs / 60;
    let seconds = secs % 60;
    if minutes <= 0 {
        format!("{} s", seconds)
    } else {
        format!("{} min {} s", minutes, seconds)
    }
}

pub fn duration(record: &Value) -> Option<String> {
    duration_secs(record).map(format_duration)
}
