//! Timestamp wire formats.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::ReadWriteError;

/// How a timestamp is represented on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimestampFormat {
    /// Seconds since the Unix epoch, with optional fractional part.
    EpochSeconds,
    /// RFC 3339 date-time, e.g. `1985-04-12T23:20:50.520Z`.
    #[default]
    DateTime,
    /// IMF-fixdate, e.g. `Tue, 29 Apr 2014 18:30:38 GMT`.
    HttpDate,
}

impl TimestampFormat {
    /// Render `value` in this format.
    #[must_use]
    pub fn format(self, value: &DateTime<Utc>) -> String {
        match self {
            Self::EpochSeconds => {
                let millis = value.timestamp_subsec_millis();
                if millis == 0 {
                    value.timestamp().to_string()
                } else {
                    format!("{}.{millis:03}", value.timestamp())
                }
            }
            Self::DateTime => {
                if value.timestamp_subsec_millis() == 0 {
                    value.to_rfc3339_opts(SecondsFormat::Secs, true)
                } else {
                    value.to_rfc3339_opts(SecondsFormat::Millis, true)
                }
            }
            Self::HttpDate => value.format("%a, %d %b %Y %H:%M:%S GMT").to_string(),
        }
    }

    /// Parse `text` in this format.
    pub fn parse(self, text: &str) -> Result<DateTime<Utc>, ReadWriteError> {
        let text = text.trim();
        let invalid = || ReadWriteError::invalid(text, format!("{self:?} timestamp"));
        match self {
            Self::EpochSeconds => {
                let (secs, frac) = text.split_once('.').unwrap_or((text, ""));
                let secs: i64 = secs.parse().map_err(|_| invalid())?;
                let nanos = if frac.is_empty() {
                    0
                } else {
                    if !frac.bytes().all(|b| b.is_ascii_digit()) {
                        return Err(invalid());
                    }
                    let padded: String = frac.chars().chain(std::iter::repeat('0')).take(9).collect();
                    padded.parse::<u32>().map_err(|_| invalid())?
                };
                DateTime::from_timestamp(secs, nanos).ok_or_else(invalid)
            }
            Self::DateTime => DateTime::parse_from_rfc3339(text)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| invalid()),
            Self::HttpDate => DateTime::parse_from_rfc2822(text)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| invalid()),
        }
    }
}
