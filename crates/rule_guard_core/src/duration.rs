//! Prometheus-style duration strings.
//!
//! Rule files and validator parameters express durations the way Prometheus
//! does: a sequence of `<number><unit>` components, for example `30s`, `5m`,
//! or `1h30m`. Units must appear in descending order and at most once each.

use std::time::Duration;

use crate::errors::InvalidDuration;

#[cfg(test)]
#[path = "duration_tests.rs"]
mod tests;

/// Units in descending order, with their length in milliseconds.
const UNITS: &[(&str, u64)] = &[
    ("y", 365 * 24 * 60 * 60 * 1000),
    ("w", 7 * 24 * 60 * 60 * 1000),
    ("d", 24 * 60 * 60 * 1000),
    ("h", 60 * 60 * 1000),
    ("m", 60 * 1000),
    ("s", 1000),
    ("ms", 1),
];

/// Parses a Prometheus duration string.
///
/// The bare string `0` is accepted as the zero duration, matching the
/// Prometheus parser. An empty string is rejected.
pub fn parse_duration(input: &str) -> Result<Duration, InvalidDuration> {
    let invalid = || InvalidDuration(input.to_string());

    if input == "0" {
        return Ok(Duration::ZERO);
    }
    if input.is_empty() {
        return Err(invalid());
    }

    let mut rest = input;
    let mut total_ms: u64 = 0;
    let mut last_unit_index: Option<usize> = None;

    while !rest.is_empty() {
        let digits_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(invalid)?;
        if digits_end == 0 {
            return Err(invalid());
        }
        let value: u64 = rest[..digits_end].parse().map_err(|_| invalid())?;
        rest = &rest[digits_end..];

        // `m` is a prefix of `ms`, so match the longest unit first.
        let (unit_index, unit_len) = if rest.starts_with("ms") {
            (UNITS.len() - 1, 2)
        } else {
            let index = UNITS
                .iter()
                .position(|(unit, _)| rest.starts_with(unit) && *unit != "ms")
                .ok_or_else(invalid)?;
            (index, 1)
        };

        // Units must be descending and unique: `1h30m` is valid, `30m1h`
        // and `1h1h` are not.
        if let Some(last) = last_unit_index {
            if unit_index <= last {
                return Err(invalid());
            }
        }
        last_unit_index = Some(unit_index);

        total_ms = total_ms
            .checked_add(value.checked_mul(UNITS[unit_index].1).ok_or_else(invalid)?)
            .ok_or_else(invalid)?;
        rest = &rest[unit_len..];
    }

    Ok(Duration::from_millis(total_ms))
}

/// Formats a duration the way Prometheus prints them (`1h30m`, `45s`).
pub fn format_duration(duration: Duration) -> String {
    let mut remaining_ms = duration.as_millis() as u64;
    if remaining_ms == 0 {
        return "0s".to_string();
    }

    let mut out = String::new();
    for (unit, unit_ms) in UNITS {
        let count = remaining_ms / unit_ms;
        if count > 0 {
            out.push_str(&format!("{count}{unit}"));
            remaining_ms -= count * unit_ms;
        }
    }
    out
}
