//! The `job.json` document shared with the transmission worker.
//!
//! The producer writes `job_id`, `created_at`, `source`, `recipient`,
//! `options` and the initial `status`, and later may set `cancel`. The
//! worker owns `status`, `live`, `result`, the timestamps it adds, and
//! `cancel.handled_at`. Fields this crate does not model are kept in
//! `extra`, so a read-modify-write never drops worker data.

use chrono::{Local, SecondsFormat};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::job::id::JobId;

/// Initial `status` value written at creation time.
pub const STATUS_QUEUED: &str = "queued";

/// Current local time in RFC 3339 with seconds precision.
pub fn now_iso() -> String {
    Local::now().to_rfc3339_opts(SecondsFormat::Secs, false)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: JobId,
    pub created_at: String,
    pub source: JobSource,
    pub recipient: Recipient,
    pub options: JobOptions,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel: Option<CancelRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live: Option<LiveProgress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl JobRecord {
    pub fn new(
        job_id: JobId,
        source: JobSource,
        recipient: Recipient,
        options: JobOptions,
    ) -> Self {
        Self {
            job_id,
            created_at: now_iso(),
            source,
            recipient,
            options,
            status: STATUS_QUEUED.to_string(),
            cancel: None,
            live: None,
            started_at: None,
            submitted_at: None,
            result: None,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSource {
    /// Source bucket name.
    pub src: String,
    pub filename_original: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub name: String,
    /// Digits only, international form without a `00` prefix.
    pub number: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    #[default]
    Fine,
    Standard,
}

impl Resolution {
    /// Parses a resolution; anything unrecognized falls back to `Fine`.
    pub fn parse_or_default(raw: &str) -> Self {
        match raw.trim() {
            "standard" => Resolution::Standard,
            _ => Resolution::Fine,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Fine => "fine",
            Resolution::Standard => "standard",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JobOptions {
    /// Error correction mode.
    pub ecm: bool,
    pub resolution: Resolution,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelRequest {
    #[serde(default)]
    pub requested: bool,
    #[serde(default)]
    pub requested_at: Option<String>,
    /// Written by the worker once it acted on the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handled_at: Option<String>,
}

impl CancelRequest {
    pub fn now() -> Self {
        Self {
            requested: true,
            requested_at: Some(now_iso()),
            handled_at: None,
        }
    }
}

/// Progress counters published by the worker while a job is processing.
///
/// Every field is optional and parsed leniently; a malformed counter reads
/// as absent rather than failing the whole record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveProgress {
    #[serde(default, deserialize_with = "lenient::string")]
    pub updated_at: Option<String>,
    #[serde(default, deserialize_with = "lenient::counter")]
    pub progress: Option<Counter>,
    #[serde(default, deserialize_with = "lenient::counter")]
    pub dials: Option<Counter>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub faxstat_status: Option<String>,
}

/// A `done / max` style pair, e.g. pages sent or dial attempts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    #[serde(default, alias = "done", skip_serializing_if = "Option::is_none")]
    pub sent: Option<u64>,
    #[serde(default, alias = "max", skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

mod lenient {
    use super::*;

    pub fn as_u64(value: &Value) -> Option<u64> {
        match value {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_string(value: &Value) -> Option<String> {
        match value {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        let value = Value::deserialize(d)?;
        Ok(as_string(&value))
    }

    pub fn counter<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Counter>, D::Error> {
        let value = Value::deserialize(d)?;
        let Value::Object(map) = value else {
            return Ok(None);
        };
        let pick = |keys: &[&str]| keys.iter().find_map(|k| map.get(*k).and_then(as_u64));
        Ok(Some(Counter {
            sent: pick(&["sent", "done"]),
            total: pick(&["total", "max"]),
            raw: map.get("raw").and_then(as_string),
        }))
    }
}

pub use lenient::{as_string as value_as_string, as_u64 as value_as_u64};

/// Normalizes a user-entered fax number to the digits-only international
/// form the worker dials.
///
/// Non-digits are dropped, a leading `00` is stripped, and a remaining
/// single leading trunk `0` is replaced by `country_code`.
pub fn normalize_fax_number(input: &str, country_code: &str) -> String {
    let digits: String = input.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return digits;
    }
    if let Some(rest) = digits.strip_prefix("00") {
        return rest.to_string();
    }
    if let Some(rest) = digits.strip_prefix('0') {
        return format!("{}{}", country_code, rest);
    }
    digits
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_record() -> JobRecord {
        JobRecord::new(
            JobId::parse("JOB-20260213-101500-a1b2c3").unwrap(),
            JobSource {
                src: "fax1".to_string(),
                filename_original: "scan.pdf".to_string(),
            },
            Recipient {
                name: "Clinic A".to_string(),
                number: "4912345".to_string(),
            },
            JobOptions {
                ecm: true,
                resolution: Resolution::Standard,
            },
        )
    }

    #[test]
    fn test_normalize_international_prefix() {
        assert_eq!(normalize_fax_number("004912345", "49"), "4912345");
        assert_eq!(normalize_fax_number("0049 2331 1234", "49"), "4923311234");
        assert_eq!(normalize_fax_number("+49 2331 12-34", "49"), "4923311234");
    }

    #[test]
    fn test_normalize_trunk_prefix() {
        assert_eq!(normalize_fax_number("02331 123456", "49"), "492331123456");
        assert_eq!(normalize_fax_number("0123", "43"), "43123");
    }

    #[test]
    fn test_normalize_plain_and_empty() {
        assert_eq!(normalize_fax_number("4912345", "49"), "4912345");
        assert_eq!(normalize_fax_number("", "49"), "");
        assert_eq!(normalize_fax_number("fax: n/a", "49"), "");
    }

    #[test]
    fn test_new_record_serializes_producer_fields() {
        let value = serde_json::to_value(sample_record()).unwrap();
        assert_eq!(value["job_id"], "JOB-20260213-101500-a1b2c3");
        assert_eq!(value["source"]["src"], "fax1");
        assert_eq!(value["source"]["filename_original"], "scan.pdf");
        assert_eq!(value["recipient"]["number"], "4912345");
        assert_eq!(value["options"]["ecm"], true);
        assert_eq!(value["options"]["resolution"], "standard");
        assert_eq!(value["status"], "queued");
        assert!(value.get("cancel").is_none());
        assert!(value.get("live").is_none());
    }

    #[test]
    fn test_unknown_worker_fields_survive_round_trip() {
        let mut value = serde_json::to_value(sample_record()).unwrap();
        value["hylafax"] = json!({"jid": 42});
        value["claimed_at"] = json!("2026-02-13T10:16:00+01:00");

        let record: JobRecord = serde_json::from_value(value).unwrap();
        let back = serde_json::to_value(&record).unwrap();

        assert_eq!(back["hylafax"]["jid"], 42);
        assert_eq!(back["claimed_at"], "2026-02-13T10:16:00+01:00");
    }

    #[test]
    fn test_live_progress_is_lenient() {
        let live: LiveProgress = serde_json::from_value(json!({
            "updated_at": "2026-02-13T10:17:00+01:00",
            "progress": {"sent": "2", "total": 5, "raw": "2/5"},
            "dials": {"done": 1, "max": "x"},
            "state": "SENDING",
            "faxstat_status": 17
        }))
        .unwrap();

        let progress = live.progress.unwrap();
        assert_eq!(progress.sent, Some(2));
        assert_eq!(progress.total, Some(5));
        assert_eq!(progress.raw.as_deref(), Some("2/5"));
        let dials = live.dials.unwrap();
        assert_eq!(dials.sent, Some(1));
        assert_eq!(dials.total, None);
        assert_eq!(live.state.as_deref(), Some("SENDING"));
        assert_eq!(live.faxstat_status.as_deref(), Some("17"));
    }

    #[test]
    fn test_live_progress_non_object_counter_reads_as_absent() {
        let live: LiveProgress = serde_json::from_value(json!({"progress": "half"})).unwrap();
        assert!(live.progress.is_none());
    }

    #[test]
    fn test_cancel_request_serializes_without_handled_at() {
        let cancel = serde_json::to_value(CancelRequest::now()).unwrap();
        assert_eq!(cancel["requested"], true);
        assert!(cancel["requested_at"].is_string());
        assert!(cancel.get("handled_at").is_none());
    }

    #[test]
    fn test_resolution_fallback() {
        assert_eq!(Resolution::parse_or_default("standard"), Resolution::Standard);
        assert_eq!(Resolution::parse_or_default("fine"), Resolution::Fine);
        assert_eq!(Resolution::parse_or_default("ultra"), Resolution::Fine);
    }
}
