use serde::{Deserialize, Serialize};

use crate::error::{DraftError, Result};

pub const SECOND: i64 = 1_000_000;
pub const MINUTE: i64 = 60 * SECOND;
pub const HOUR: i64 = 60 * MINUTE;

/// Half-open interval `[start, start + duration)` in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timerange {
    pub start: i64,
    pub duration: i64,
}

impl Timerange {
    pub fn new(start: i64, duration: i64) -> Self {
        Self { start, duration }
    }

    pub fn end(&self) -> i64 {
        self.start + self.duration
    }

    pub fn overlaps(&self, other: &Timerange) -> bool {
        self.start < other.end() && other.start < self.end()
    }
}

impl std::fmt::Display for Timerange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end())
    }
}

/// Normalize a time value into microseconds.
///
/// Accepts either a raw microsecond integer (`"1500000"`) or a human duration
/// string built from `h`/`m`/`s` components (`"1.5s"`, `"2m"`, `"1h3m12s"`),
/// with an optional leading sign.
pub fn tim(value: &str) -> Result<i64> {
    let trimmed = value.trim();
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    if body.is_empty() {
        return Err(DraftError::TimeFormat(value.to_string()));
    }

    // Bare digits are already microseconds.
    if body.bytes().all(|b| b.is_ascii_digit()) {
        let micros: i64 = body
            .parse()
            .map_err(|_| DraftError::TimeFormat(value.to_string()))?;
        return Ok(if negative { -micros } else { micros });
    }

    let mut total_seconds = 0.0f64;
    let mut number = String::new();
    for ch in body.chars() {
        if ch.is_ascii_digit() || ch == '.' {
            number.push(ch);
            continue;
        }
        let unit = match ch {
            'h' => 3600.0,
            'm' => 60.0,
            's' => 1.0,
            _ => return Err(DraftError::TimeFormat(value.to_string())),
        };
        let amount: f64 = number
            .parse()
            .map_err(|_| DraftError::TimeFormat(value.to_string()))?;
        total_seconds += amount * unit;
        number.clear();
    }
    // A trailing number without a unit is malformed ("1h30").
    if !number.is_empty() {
        return Err(DraftError::TimeFormat(value.to_string()));
    }

    let micros = (total_seconds * SECOND as f64).round() as i64;
    Ok(if negative { -micros } else { micros })
}

/// Parse an SRT timestamp (`HH:MM:SS,mmm`) into microseconds.
///
/// Pure integer arithmetic so millisecond values survive exactly. A period is
/// accepted in place of the comma, as some files in the wild use it.
pub fn srt_timestamp(value: &str) -> Result<i64> {
    let malformed = || DraftError::TimeFormat(value.to_string());

    let parts: Vec<&str> = value.trim().split(':').collect();
    if parts.len() != 3 {
        return Err(malformed());
    }
    let hours: i64 = parts[0].parse().map_err(|_| malformed())?;
    let minutes: i64 = parts[1].parse().map_err(|_| malformed())?;

    let seconds_part = parts[2].replace(',', ".");
    let (secs_str, millis_str) = match seconds_part.split_once('.') {
        Some((s, m)) => (s, m),
        None => (seconds_part.as_str(), "0"),
    };
    if millis_str.is_empty() || millis_str.len() > 3 {
        return Err(malformed());
    }
    let seconds: i64 = secs_str.parse().map_err(|_| malformed())?;
    let raw: i64 = millis_str.parse().map_err(|_| malformed())?;
    // Normalize short fraction fields: "5" means 500ms, "50" means 500ms too.
    let millis = raw * 10i64.pow(3 - millis_str.len() as u32);

    Ok(hours * HOUR + minutes * MINUTE + seconds * SECOND + millis * 1_000)
}
