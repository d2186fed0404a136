// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! POSIX crontab(5)-syntax schedule (`spec.md` §4.B "Cron"), ported from
//! `original_source/shine/helpers/cron.py`.

use super::ScheduleError;
use crate::task::{Schedule, TaskRecord};
use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};
use std::collections::HashSet;

/// `spec.md` §4.B "Cron": five-field crontab syntax with POSIX day-OR
/// semantics — when both day-of-month and day-of-week are restricted
/// (neither is its full range), a match on *either* field is sufficient;
/// otherwise the single restricted field (or neither) governs.
pub struct Cron {
    minute: HashSet<u32>,
    hour: HashSet<u32>,
    day: HashSet<u32>,
    month: HashSet<u32>,
    weekday: HashSet<u32>,
    day_both_restricted: bool,
}

impl Cron {
    pub fn new(spec: &str) -> Result<Self, ScheduleError> {
        let fields: Vec<&str> = spec.split_whitespace().collect();
        let [m_spec, h_spec, d_spec, mo_spec, w_spec]: [&str; 5] = fields
            .try_into()
            .map_err(|_| ScheduleError::BadCronArity(spec.to_string()))?;

        let minute = spec_to_set(m_spec, 0, 59)?;
        let hour = spec_to_set(h_spec, 0, 23)?;
        let day = spec_to_set(d_spec, 1, 31)?;
        let month = spec_to_set(mo_spec, 1, 12)?;
        let mut weekday = spec_to_set(w_spec, 0, 7)?;

        // 0 and 7 both mean Sunday.
        if weekday.remove(&0) {
            weekday.insert(7);
        }

        let day_both_restricted = day.len() != 31 && weekday.len() != 7;

        if !day_both_restricted {
            let only_30_day_months = month.iter().all(|m| [2, 4, 6, 9, 11].contains(m));
            let day_is_31_only = day == HashSet::from([31]);
            let only_feb = month.iter().all(|m| *m == 2);
            let day_is_30_or_31 = day.is_subset(&HashSet::from([30, 31]));
            if (only_30_day_months && day_is_31_only) || (only_feb && day_is_30_or_31) {
                return Err(ScheduleError::ImpossibleCronDay(spec.to_string()));
            }
        }

        Ok(Self { minute, hour, day, month, weekday, day_both_restricted })
    }

    fn day_matches(&self, dt: DateTime<Utc>) -> bool {
        let dom_match = self.day.contains(&dt.day());
        let dow_match = self.weekday.contains(&dt.weekday().number_from_monday());
        if self.day_both_restricted {
            dom_match || dow_match
        } else {
            dom_match && dow_match
        }
    }
}

impl Schedule for Cron {
    fn next(&self, now: i64, _record: &TaskRecord) -> i64 {
        let start = Utc.timestamp_opt(now, 0).single().unwrap_or_else(Utc::now);
        let mut x = (start + chrono::Duration::minutes(1))
            .with_second(0)
            .and_then(|d| d.with_nanosecond(0))
            .unwrap_or(start);
        loop {
            if !self.month.contains(&x.month()) {
                x = if x.month() == 12 {
                    Utc.with_ymd_and_hms(x.year() + 1, 1, 1, 0, 0, 0).single()
                } else {
                    Utc.with_ymd_and_hms(x.year(), x.month() + 1, 1, 0, 0, 0).single()
                }
                .unwrap_or(x);
            } else if !self.day_matches(x) {
                x = truncate_to_day(x) + chrono::Duration::days(1);
            } else if !self.hour.contains(&x.hour()) {
                x = truncate_to_hour(x) + chrono::Duration::hours(1);
            } else if !self.minute.contains(&x.minute()) {
                x += chrono::Duration::minutes(1);
            } else {
                return x.timestamp();
            }
        }
    }
}

fn truncate_to_day(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_hour(0)
        .and_then(|d| d.with_minute(0))
        .and_then(|d| d.with_second(0))
        .unwrap_or(dt)
}

fn truncate_to_hour(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_minute(0).and_then(|d| d.with_second(0)).unwrap_or(dt)
}

/// Convert crontab list/range/step notation (`*`, `1,2`, `1-5`, `*/2`,
/// `1-10/3`) to the set of values it denotes.
fn spec_to_set(spec: &str, lower: u32, upper: u32) -> Result<HashSet<u32>, ScheduleError> {
    let spec = spec.replace('*', &format!("{lower}-{upper}"));
    let mut result = HashSet::new();
    for range_spec in spec.split(',') {
        let (range_part, step) = match range_spec.split_once('/') {
            Some((r, s)) => (
                r,
                s.parse::<i64>()
                    .map_err(|_| ScheduleError::BadCronField(range_spec.to_string()))?,
            ),
            None => (range_spec, 1),
        };
        if step <= 0 {
            return Err(ScheduleError::BadCronStep(range_spec.to_string()));
        }
        let (from, to) = match range_part.split_once('-') {
            Some((a, b)) => (
                a.parse::<i64>()
                    .map_err(|_| ScheduleError::BadCronField(range_spec.to_string()))?,
                b.parse::<i64>()
                    .map_err(|_| ScheduleError::BadCronField(range_spec.to_string()))?,
            ),
            None => {
                let v = range_part
                    .parse::<i64>()
                    .map_err(|_| ScheduleError::BadCronField(range_spec.to_string()))?;
                (v, v)
            }
        };
        if !(i64::from(lower) <= from && from <= to && to <= i64::from(upper)) {
            return Err(ScheduleError::CronRangeOutOfBounds {
                from,
                to,
                lower: lower.into(),
                upper: upper.into(),
            });
        }
        let mut v = from;
        while v <= to {
            result.insert(v as u32);
            v += step;
        }
    }
    Ok(result)
}

#[cfg(test)]
#[path = "cron_tests.rs"]
mod tests;
