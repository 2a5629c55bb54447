// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Timestamp formatting helpers.

use chrono::{
    DateTime, Datelike, Local, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc,
};
use thiserror::Error;

/// Pattern used when the caller has no preference.
pub const DEFAULT_PATTERN: &str = "YYYY-MM-DD HH:mm";

const MINUTE_MS: i64 = 60_000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeError {
    #[error("unrecognized timestamp '{0}'")]
    Unrecognized(String),

    #[error("timestamp out of range: {0} ms")]
    OutOfRange(i64),

    #[error("'{0}' does not exist in the local time zone")]
    NonexistentLocal(String),
}

/// Format `date` by substituting `YYYY`, `MM`, `DD`, `HH` and `mm`.
///
/// Each token is replaced once (first occurrence), in that order, with the
/// zero-padded component in the date's own offset. Everything else in the
/// pattern is copied through.
pub fn format<Tz: TimeZone>(date: &DateTime<Tz>, pattern: &str) -> String {
    pattern
        .replacen("YYYY", &format!("{:04}", date.year()), 1)
        .replacen("MM", &format!("{:02}", date.month()), 1)
        .replacen("DD", &format!("{:02}", date.day()), 1)
        .replacen("HH", &format!("{:02}", date.hour()), 1)
        .replacen("mm", &format!("{:02}", date.minute()), 1)
}

/// Format with [`DEFAULT_PATTERN`].
pub fn format_default<Tz: TimeZone>(date: &DateTime<Tz>) -> String {
    format(date, DEFAULT_PATTERN)
}

/// Coarse Korean relative time from `date` to now.
pub fn relative<Tz: TimeZone>(date: &DateTime<Tz>) -> String {
    relative_to(date, &Utc::now())
}

/// Coarse Korean relative time from `date` to `now`.
///
/// Buckets use floor division: under a minute is "방금 전", then whole
/// minutes, hours and days. Timestamps after `now` also read as "방금 전".
pub fn relative_to<Tz: TimeZone, Tz2: TimeZone>(date: &DateTime<Tz>, now: &DateTime<Tz2>) -> String {
    let elapsed = now.with_timezone(&Utc) - date.with_timezone(&Utc);
    let ms = elapsed.num_milliseconds();

    if ms < MINUTE_MS {
        "방금 전".to_string()
    } else if ms < HOUR_MS {
        format!("{}분 전", ms / MINUTE_MS)
    } else if ms < DAY_MS {
        format!("{}시간 전", ms / HOUR_MS)
    } else {
        format!("{}일 전", ms / DAY_MS)
    }
}

/// Parse a loosely formatted timestamp into local time.
///
/// Accepts epoch milliseconds, RFC 3339, `YYYY-MM-DD HH:MM[:SS]` (with a
/// space or `T`, read as local wall time) and a bare `YYYY-MM-DD`, which is
/// read as UTC midnight.
pub fn parse(text: &str) -> Result<DateTime<Local>, TimeError> {
    let text = text.trim();

    if let Ok(ms) = text.parse::<i64>() {
        return Local
            .timestamp_millis_opt(ms)
            .single()
            .ok_or(TimeError::OutOfRange(ms));
    }

    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return Ok(date.with_timezone(&Local));
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Local
                .from_local_datetime(&naive)
                .earliest()
                .ok_or_else(|| TimeError::NonexistentLocal(text.to_string()));
        }
    }

    if let Some(midnight) = NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(Utc.from_utc_datetime(&midnight).with_timezone(&Local));
    }

    Err(TimeError::Unrecognized(text.to_string()))
}
