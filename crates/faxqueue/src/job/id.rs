//! Job identifiers: `JOB-<YYYYMMDD>-<HHMMSS>-<suffix>`.
//!
//! Identifiers sort lexically by creation time. The six-character suffix is
//! drawn from a lower-case alphanumeric alphabet using OS randomness, so two
//! jobs created in the same second collide with probability 1 / 36^6.
//! Any id supplied by a caller must pass [`JobId::parse`] before it is used
//! to build a path.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, Local, TimeZone};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::QueueError;

pub const JOB_ID_PREFIX: &str = "JOB";
pub const SUFFIX_LEN: usize = 6;
const SUFFIX_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

fn job_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^JOB-[0-9]{8}-[0-9]{6}-[a-z0-9]{6}$").expect("job id pattern is valid")
    })
}

/// Random token of `len` characters from the job id suffix alphabet.
pub fn random_token(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    if getrandom::fill(&mut bytes).is_err() {
        // Fall back to clock entropy; uniqueness is still checked by the
        // exclusive directory creation.
        let nanos = Local::now().timestamp_subsec_nanos();
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = (nanos >> ((i % 4) * 8)) as u8 ^ (i as u8).wrapping_mul(31);
        }
    }
    bytes
        .iter()
        .map(|b| SUFFIX_ALPHABET[*b as usize % SUFFIX_ALPHABET.len()] as char)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(String);

impl JobId {
    /// Creates a fresh identifier stamped with the current local time.
    pub fn generate() -> Self {
        Self::generate_at(&Local::now())
    }

    pub fn generate_at<Tz: TimeZone>(at: &DateTime<Tz>) -> Self
    where
        Tz::Offset: fmt::Display,
    {
        Self(format!(
            "{}-{}-{}",
            JOB_ID_PREFIX,
            at.format("%Y%m%d-%H%M%S"),
            random_token(SUFFIX_LEN)
        ))
    }

    /// Validates a caller-supplied identifier against the fixed grammar.
    pub fn parse(raw: &str) -> Result<Self, QueueError> {
        if job_id_pattern().is_match(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(QueueError::InvalidJobId(raw.to_string()))
        }
    }

    pub fn is_valid(raw: &str) -> bool {
        job_id_pattern().is_match(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for JobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for JobId {
    type Err = QueueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for JobId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for JobId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
