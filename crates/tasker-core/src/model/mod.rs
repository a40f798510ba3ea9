//! Domain records shared by the stores, the query engine and the façade.

pub mod project;
pub mod task;

pub use project::{Project, ProjectUpdate};
pub use task::{NewTask, Priority, Status, Tag, Task, TaskUpdate};

use std::fmt;

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

fn normalize(input: &str) -> String {
    input.trim().to_ascii_lowercase()
}

/// RFC 3339 UTC timestamps with microsecond precision, as stored and serialized.
pub mod timestamp {
    use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    /// Current time truncated to microseconds.
    #[must_use]
    pub fn now() -> DateTime<Utc> {
        Utc::now().trunc_subsecs(6)
    }

    #[must_use]
    pub fn format(at: &DateTime<Utc>) -> String {
        at.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    /// # Errors
    ///
    /// Returns an error if `raw` is not an RFC 3339 timestamp.
    pub fn parse(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
        DateTime::parse_from_rfc3339(raw).map(|at| at.with_timezone(&Utc))
    }

    /// # Errors
    ///
    /// Propagates the serializer's error.
    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(at))
    }

    /// # Errors
    ///
    /// Returns an error if the value is not an RFC 3339 timestamp string.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Calendar dates as stored in the `due_date` column.
pub mod date {
    use chrono::NaiveDate;

    pub const FORMAT: &str = "%Y-%m-%d";

    #[must_use]
    pub fn format(date: NaiveDate) -> String {
        date.format(FORMAT).to_string()
    }

    /// Parse a strict `YYYY-MM-DD` date.
    ///
    /// # Errors
    ///
    /// Returns an error if `raw` is not a valid calendar date in that form.
    pub fn parse(raw: &str) -> Result<NaiveDate, chrono::ParseError> {
        NaiveDate::parse_from_str(raw.trim(), FORMAT)
    }
}
