use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::TimestampError;

/// Wall-clock timestamp as rendered to the user. Offset-bearing values are
/// converted to local time on parse.
pub type Timestamp = NaiveDateTime;

/// Envelope returned by list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListEnvelope<T> {
    pub data: Vec<T>,
    pub data_total: u64,
}

/// Envelope returned by single-item endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemEnvelope<T> {
    pub data: T,
}

/// Query string of a paginated list request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageQuery {
    pub limit: u32,
    pub offset: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl PageQuery {
    pub fn new(limit: u32, offset: u64, search: &str) -> Self {
        Self {
            limit,
            offset,
            search: (!search.is_empty()).then(|| search.to_string()),
        }
    }

    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("limit".to_string(), self.limit.to_string()),
            ("offset".to_string(), self.offset.to_string()),
        ];
        if let Some(search) = &self.search {
            pairs.push(("search".to_string(), search.clone()));
        }
        pairs
    }
}

/// State of a named backend lock (e.g. the seedbox sync job).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockStatus {
    pub locked: bool,
    #[serde(default, with = "optional_timestamp")]
    pub locked_at: Option<Timestamp>,
    #[serde(default, with = "optional_timestamp")]
    pub unlocked_at: Option<Timestamp>,
}

pub fn parse_timestamp(raw: &str) -> Result<Timestamp, TimestampError> {
    let raw = raw.trim();
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Ok(with_offset.with_timezone(&Local).naive_local());
    }
    raw.parse::<NaiveDateTime>()
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .map_err(|_| TimestampError(raw.to_string()))
}

/// Serde adapter for backend timestamps. `null`, `""` and the integer `0`
/// all mean "not set".
pub mod optional_timestamp {
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    use super::{parse_timestamp, Timestamp};

    const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

    pub fn serialize<S>(value: &Option<Timestamp>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_str(&ts.format(WIRE_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Timestamp>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(None),
            Value::Number(n) if n.as_i64() == Some(0) => Ok(None),
            Value::String(s) if s.trim().is_empty() => Ok(None),
            Value::String(s) => parse_timestamp(&s).map(Some).map_err(D::Error::custom),
            other => Err(D::Error::custom(format!(
                "expected timestamp string, got {other}"
            ))),
        }
    }
}
