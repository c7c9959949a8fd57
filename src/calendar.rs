//! Working-hours calendar: weekly attendances expanded across a query
//! window, minus exception spans, with optional per-resource overrides.
//! Attendances live in a local timezone; everything leaving this module
//! is UTC milliseconds.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Days, LocalResult, NaiveDate, NaiveTime, TimeZone, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::engine::EngineError;
use crate::limits::MINUTES_PER_DAY;
use crate::model::{Ms, Span};

/// One weekly attendance window, minutes from local midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendance {
    pub weekday: Weekday,
    pub start_min: u32,
    pub end_min: u32,
}

impl Attendance {
    pub fn new(weekday: Weekday, start_min: u32, end_min: u32) -> Self {
        Self { weekday, start_min, end_min }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.start_min >= self.end_min || self.end_min > MINUTES_PER_DAY {
            return Err(EngineError::InvalidRequest(
                "attendance minutes must satisfy start < end <= 1440",
            ));
        }
        Ok(())
    }
}

/// Weekly attendances plus UTC exception spans (leaves, holidays) that are
/// removed from the expansion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingHoursSpec {
    pub attendances: Vec<Attendance>,
    #[serde(default)]
    pub exceptions: Vec<Span>,
}

impl WorkingHoursSpec {
    /// The same window on every day of the week.
    pub fn every_day(start_min: u32, end_min: u32) -> Self {
        let attendances = [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ]
        .into_iter()
        .map(|weekday| Attendance::new(weekday, start_min, end_min))
        .collect();
        Self { attendances, exceptions: Vec::new() }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        for att in &self.attendances {
            att.validate()?;
        }
        for exc in &self.exceptions {
            if exc.start >= exc.end {
                return Err(EngineError::InvalidRequest("exception span is empty"));
            }
        }
        Ok(())
    }
}

/// The calendar: a default spec, per-resource overrides, and the timezone
/// the attendances are written in.
#[derive(Debug, Clone)]
pub struct CalendarModel {
    tz: Tz,
    default_spec: WorkingHoursSpec,
    overrides: HashMap<Ulid, WorkingHoursSpec>,
}

impl CalendarModel {
    pub fn new(tz: Tz, default_spec: WorkingHoursSpec) -> Self {
        Self { tz, default_spec, overrides: HashMap::new() }
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    pub fn set_default(&mut self, spec: WorkingHoursSpec) {
        self.default_spec = spec;
    }

    pub fn set_tz(&mut self, tz: Tz) {
        self.tz = tz;
    }

    pub fn set_override(&mut self, resource_id: Ulid, spec: WorkingHoursSpec) {
        self.overrides.insert(resource_id, spec);
    }

    pub fn clear_override(&mut self, resource_id: &Ulid) {
        self.overrides.remove(resource_id);
    }

    fn spec_for(&self, resource: Option<Ulid>) -> &WorkingHoursSpec {
        resource
            .and_then(|id| self.overrides.get(&id))
            .unwrap_or(&self.default_spec)
    }

    /// Ordered disjoint UTC spans during which the resource (or the venue,
    /// when `resource` is None) is working inside `window`, expanded in `tz`.
    pub fn working_intervals(
        &self,
        resource: Option<Ulid>,
        window: &Span,
        tz: Tz,
    ) -> Result<Vec<Span>, EngineError> {
        if window.start >= window.end {
            return Err(EngineError::InvalidWindow(*window));
        }
        let spec = self.spec_for(resource);

        let mut working: Vec<Span> = Vec::new();
        for date in day_range(tz, window) {
            for att in &spec.attendances {
                if att.weekday != date.weekday() {
                    continue;
                }
                // A DST gap swallowing either endpoint drops the occurrence.
                if let (Some(start), Some(end)) = (
                    local_instant(tz, date, att.start_min),
                    local_instant(tz, date, att.end_min),
                ) && start < end
                    && let Some(clamped) = Span::new(start, end).clamp_to(window)
                {
                    working.push(clamped);
                }
            }
        }
        working.sort_by_key(|s| s.start);
        let mut working = merge_overlapping(&working);

        let mut removed: Vec<Span> = spec
            .exceptions
            .iter()
            .filter_map(|e| e.clamp_to(window))
            .collect();
        if !removed.is_empty() {
            removed.sort_by_key(|s| s.start);
            let removed = merge_overlapping(&removed);
            working = subtract_intervals(&working, &removed);
        }

        Ok(working)
    }

    /// True when `span` lies fully inside working hours.
    pub fn covers(&self, resource: Option<Ulid>, span: &Span, tz: Tz) -> Result<bool, EngineError> {
        let working = self.working_intervals(resource, span, tz)?;
        Ok(subtract_intervals(&[*span], &working).is_empty())
    }
}

// ── Local-time expansion helpers ─────────────────────────────────

/// Local dates whose attendances can intersect `window`, padded one day on
/// each side so timezone offsets never clip an occurrence.
pub(crate) fn day_range(tz: Tz, window: &Span) -> Vec<NaiveDate> {
    let first = to_local_date(tz, window.start).checked_sub_days(Days::new(1));
    let last = to_local_date(tz, window.end).checked_add_days(Days::new(1));
    let (Some(first), Some(last)) = (first, last) else {
        return Vec::new();
    };
    let mut days = Vec::new();
    let mut d = first;
    while d <= last {
        days.push(d);
        match d.succ_opt() {
            Some(next) => d = next,
            None => break,
        }
    }
    days
}

fn to_local_date(tz: Tz, ms: Ms) -> NaiveDate {
    DateTime::from_timestamp_millis(ms)
        .unwrap_or_default()
        .with_timezone(&tz)
        .date_naive()
}

/// UTC instant of `minute` minutes past local midnight on `date`.
/// Minute 1440 is the following midnight. None inside a DST gap; the
/// earlier instant when the local time is ambiguous.
pub(crate) fn local_instant(tz: Tz, date: NaiveDate, minute: u32) -> Option<Ms> {
    let (date, minute) = if minute >= MINUTES_PER_DAY {
        (date.succ_opt()?, minute - MINUTES_PER_DAY)
    } else {
        (date, minute)
    };
    let time = NaiveTime::from_num_seconds_from_midnight_opt(minute * 60, 0)?;
    match tz.from_local_datetime(&date.and_time(time)) {
        LocalResult::Single(dt) => Some(dt.timestamp_millis()),
        LocalResult::Ambiguous(earlier, _) => Some(earlier.timestamp_millis()),
        LocalResult::None => None,
    }
}

// ── Interval algebra ─────────────────────────────────────────────

/// Merge sorted overlapping/adjacent intervals into disjoint intervals.
pub fn merge_overlapping(sorted: &[Span]) -> Vec<Span> {
    let mut merged: Vec<Span> = Vec::new();
    for &span in sorted {
        if let Some(last) = merged.last_mut()
            && span.start <= last.end
        {
            last.end = last.end.max(span.end);
            continue;
        }
        merged.push(span);
    }
    merged
}

/// Subtract sorted disjoint `to_remove` from sorted disjoint `base`.
pub fn subtract_intervals(base: &[Span], to_remove: &[Span]) -> Vec<Span> {
    let mut result = Vec::new();
    let mut ri = 0;

    for &b in base {
        let mut current_start = b.start;
        let current_end = b.end;

        while ri < to_remove.len() && to_remove[ri].end <= current_start {
            ri += 1;
        }

        let mut j = ri;
        while j < to_remove.len() && to_remove[j].start < current_end {
            let r = &to_remove[j];
            if r.start > current_start {
                result.push(Span::new(current_start, r.start));
            }
            current_start = current_start.max(r.end);
            j += 1;
        }

        if current_start < current_end {
            result.push(Span::new(current_start, current_end));
        }
    }

    result
}
