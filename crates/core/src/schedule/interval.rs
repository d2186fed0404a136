// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed-interval schedule with jitter and an allowed-hours window
//! (`spec.md` §4.B "Interval"), ported from
//! `original_source/shine/helpers/interval.py`.

use super::ScheduleError;
use crate::task::{Schedule, TaskRecord};
use chrono::{DateTime, TimeZone, Timelike, Utc};
use rand::Rng;

const TEN_YEARS_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// Parse a duration spec: a bare integer (seconds) or `<N>{s|m|h|d|w}`.
fn parse_duration(spec: &str) -> Result<i64, ScheduleError> {
    if let Ok(secs) = spec.parse::<i64>() {
        return validate_range(secs);
    }
    let unit = spec
        .chars()
        .last()
        .ok_or_else(|| ScheduleError::InvalidInterval(spec.to_string()))?;
    let multiplier = match unit {
        's' => 1,
        'm' => 60,
        'h' => 60 * 60,
        'd' => 24 * 60 * 60,
        'w' => 7 * 24 * 60 * 60,
        _ => return Err(ScheduleError::BadIntervalUnit(spec.to_string())),
    };
    let number: i64 = spec[..spec.len() - 1]
        .parse()
        .map_err(|_| ScheduleError::InvalidInterval(spec.to_string()))?;
    validate_range(number * multiplier)
}

fn validate_range(secs: i64) -> Result<i64, ScheduleError> {
    if !(0..TEN_YEARS_SECS).contains(&secs) {
        return Err(ScheduleError::IntervalOutOfRange(secs));
    }
    Ok(secs)
}

/// Parse `"0-5,22-23"` style ranges (wrap-around allowed: `end < start` means
/// the range crosses midnight) into a 24-element availability map.
fn parse_avail_hours(spec: &str) -> Result<[bool; 24], ScheduleError> {
    let mut hour_map = [false; 24];
    for part in spec.split(',') {
        let part = part.trim();
        if part.is_empty() {
            return Err(ScheduleError::BadAvailHours(spec.to_string()));
        }
        if let Some((start, end)) = part.split_once('-') {
            let start: i64 = start
                .trim()
                .parse()
                .map_err(|_| ScheduleError::BadAvailHours(spec.to_string()))?;
            let end: i64 = end
                .trim()
                .parse()
                .map_err(|_| ScheduleError::BadAvailHours(spec.to_string()))?;
            let start = start.rem_euclid(24);
            let mut end = end.rem_euclid(24);
            if end < start {
                end += 24;
            }
            for hour in start..=end {
                hour_map[(hour % 24) as usize] = true;
            }
        } else {
            let hour: i64 = part
                .parse()
                .map_err(|_| ScheduleError::BadAvailHours(spec.to_string()))?;
            hour_map[hour.rem_euclid(24) as usize] = true;
        }
    }
    if hour_map.iter().all(|&on| !on) {
        return Err(ScheduleError::NoAvailableHour);
    }
    Ok(hour_map)
}

/// `spec.md` §4.B "Interval": fires `interval ± randomize` seconds after
/// `now`, crediting elapsed time only during hours in `avail_hours`.
pub struct Interval {
    interval_secs: i64,
    randomize_secs: i64,
    hour_map: [bool; 24],
}

impl Interval {
    pub fn new(interval: &str, randomize: &str, avail_hours: &str) -> Result<Self, ScheduleError> {
        let hour_map = parse_avail_hours(avail_hours)?;
        let interval_secs = parse_duration(interval)?;
        let randomize_secs = parse_duration(randomize)?;
        Ok(Self { interval_secs, randomize_secs, hour_map })
    }

    fn jittered_secs(&self) -> i64 {
        if self.randomize_secs == 0 {
            return self.interval_secs.max(0);
        }
        let delta = rand::rng().random_range(-self.randomize_secs..=self.randomize_secs);
        (self.interval_secs + delta).max(0)
    }

    fn advance(&self, start: DateTime<Utc>, mut remain_secs: i64) -> DateTime<Utc> {
        if self.hour_map.iter().all(|&on| on) {
            return start + chrono::Duration::seconds(remain_secs);
        }
        let mut x = start;
        while remain_secs > 0 {
            let next_hour = next_hour_boundary(x);
            let hour = x.hour() as usize;
            if !self.hour_map[hour] {
                x = next_hour;
                continue;
            }
            let gap = (next_hour - x).num_seconds();
            if gap < remain_secs {
                remain_secs -= gap;
                x = next_hour;
            } else {
                x += chrono::Duration::seconds(remain_secs);
                remain_secs = 0;
            }
        }
        x
    }
}

fn next_hour_boundary(dt: DateTime<Utc>) -> DateTime<Utc> {
    let truncated = dt
        .with_minute(0)
        .and_then(|d| d.with_second(0))
        .and_then(|d| d.with_nanosecond(0))
        .unwrap_or(dt);
    truncated + chrono::Duration::hours(1)
}

impl Schedule for Interval {
    fn next(&self, now: i64, _record: &TaskRecord) -> i64 {
        let start = Utc.timestamp_opt(now, 0).single().unwrap_or_else(Utc::now);
        let secs = self.jittered_secs();
        self.advance(start, secs).timestamp()
    }
}

#[cfg(test)]
#[path = "interval_tests.rs"]
mod tests;
