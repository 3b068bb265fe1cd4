use std::fmt;

use chrono::{FixedOffset, Local, TimeZone};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Name recorded when no identity has been configured.
pub const UNKNOWN_IDENTITY: &str = "unknown";

/// A point in time as recorded in a reflog entry.
///
/// Seconds since the UNIX epoch plus the UTC offset of the machine that wrote
/// the entry. Timestamps are not required to be monotonic across machines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTimestamp")]
pub struct Timestamp {
    /// Seconds since the UNIX epoch.
    pub seconds: i64,
    /// Offset from UTC in minutes (e.g. `-300` for UTC-05:00).
    pub offset_minutes: i32,
}

impl Timestamp {
    /// Create a timestamp, rejecting offsets of a day or more.
    pub fn new(seconds: i64, offset_minutes: i32) -> Result<Self, TypeError> {
        if offset_minutes.unsigned_abs() >= 24 * 60 {
            return Err(TypeError::InvalidOffset(offset_minutes));
        }
        Ok(Self {
            seconds,
            offset_minutes,
        })
    }

    /// The current wall-clock time in the local timezone.
    pub fn now() -> Self {
        let now = Local::now();
        Self {
            seconds: now.timestamp(),
            offset_minutes: now.offset().local_minus_utc() / 60,
        }
    }

    /// Render as an RFC 3339 string in the recorded offset.
    pub fn to_rfc3339(&self) -> Option<String> {
        let offset = FixedOffset::east_opt(self.offset_minutes * 60)?;
        offset
            .timestamp_opt(self.seconds, 0)
            .single()
            .map(|dt| dt.to_rfc3339())
    }
}

/// Unchecked wire form; stored timestamps go through [`Timestamp::new`].
#[derive(Deserialize)]
struct RawTimestamp {
    seconds: i64,
    offset_minutes: i32,
}

impl TryFrom<RawTimestamp> for Timestamp {
    type Error = TypeError;

    fn try_from(raw: RawTimestamp) -> Result<Self, Self::Error> {
        Self::new(raw.seconds, raw.offset_minutes)
    }
}

impl fmt::Display for Timestamp {
    /// git's raw form: `1700000000 +0130`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.offset_minutes < 0 { '-' } else { '+' };
        let abs = self.offset_minutes.unsigned_abs();
        write!(f, "{} {}{:02}{:02}", self.seconds, sign, abs / 60, abs % 60)
    }
}

/// The identity and time attached to a reference transition.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    pub email: String,
    pub when: Timestamp,
}

impl Signature {
    /// Build a signature, validating that name and email can be written into
    /// a reflog line.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        when: Timestamp,
    ) -> Result<Self, TypeError> {
        let name = name.into();
        let email = email.into();
        check_field("name", &name)?;
        check_field("email", &email)?;
        Ok(Self { name, email, when })
    }

    /// A signature stamped with the current time.
    pub fn now(name: impl Into<String>, email: impl Into<String>) -> Result<Self, TypeError> {
        Self::new(name, email, Timestamp::now())
    }

    /// The fallback identity used when nothing is configured.
    pub fn unknown() -> Self {
        Self {
            name: UNKNOWN_IDENTITY.to_string(),
            email: UNKNOWN_IDENTITY.to_string(),
            when: Timestamp::now(),
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}> {}", self.name, self.email, self.when)
    }
}

fn check_field(field: &'static str, value: &str) -> Result<(), TypeError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(TypeError::InvalidSignature {
            field,
            reason: "must not be empty".into(),
        });
    }
    if let Some(ch) = value.chars().find(|c| matches!(c, '<' | '>' | '\n' | '\0')) {
        return Err(TypeError::InvalidSignature {
            field,
            reason: format!("contains forbidden character {ch:?}"),
        });
    }
    Ok(())
}
