// Schedule compilation and matching
//
// A schedule expression is five fields (`min hour day month day-of-week`)
// at minute granularity or six (`sec min hour day month day-of-week`) at
// second granularity. Each field expands to the set of values it allows;
// a tick matches when every gating set contains the tick's component,
// with day-of-month and day-of-week gating as a union.

use crate::clock::Snapshot;
use crate::errors::ScheduleError;
use crate::field::FieldSet;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::Duration;

lazy_static::lazy_static! {
    static ref SPACES_REGEX: Regex = Regex::new(r"\s+").expect("Invalid regex pattern");
}

/// Tick resolution of a registry. Fixes both the timer period and the
/// number of fields a schedule expression must have.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Minute,
    Second,
}

impl Granularity {
    /// Length of one tick.
    pub fn period(self) -> Duration {
        match self {
            Granularity::Minute => Duration::from_secs(60),
            Granularity::Second => Duration::from_secs(1),
        }
    }

    /// Number of fields a schedule expression must have.
    pub fn field_count(self) -> usize {
        match self {
            Granularity::Minute => 5,
            Granularity::Second => 6,
        }
    }
}

/// A compiled schedule expression: one value set per field, with the
/// day/day-of-week union adjustment already applied.
#[derive(Debug, Clone)]
pub struct Schedule {
    seconds: Option<FieldSet>,
    minutes: FieldSet,
    hours: FieldSet,
    days: FieldSet,
    months: FieldSet,
    weekdays: FieldSet,
}

impl Schedule {
    /// Compile a schedule expression for the given granularity.
    ///
    /// Runs of whitespace collapse to single separators before splitting,
    /// then the field count must equal the granularity's exactly. The
    /// first field-level error aborts compilation.
    pub fn compile(schedule: &str, granularity: Granularity) -> Result<Schedule, ScheduleError> {
        let normalized = SPACES_REGEX.replace_all(schedule, " ");
        let fields: Vec<&str> = normalized.split(' ').collect();
        let expected = granularity.field_count();
        if fields.len() != expected {
            return Err(ScheduleError::FieldCount {
                schedule: schedule.to_string(),
                expected,
                found: fields.len(),
            });
        }

        let (seconds, rest) = match granularity {
            Granularity::Second => (Some(FieldSet::parse(fields[0], 0, 59)?), &fields[1..]),
            Granularity::Minute => (None, &fields[..]),
        };
        let minutes = FieldSet::parse(rest[0], 0, 59)?;
        let hours = FieldSet::parse(rest[1], 0, 23)?;
        let mut days = FieldSet::parse(rest[2], 1, 31)?;
        let months = FieldSet::parse(rest[3], 1, 12)?;
        let mut weekdays = FieldSet::parse(rest[4], 0, 6)?;

        // Day and day-of-week gate as a union. When only one of them is
        // restricted, the unrestricted one is cleared so it cannot match
        // on its own. Full cardinality counts as unrestricted, so `0-6`
        // in the day-of-week field clears the same way `*` does.
        if days.len() < 31 && weekdays.len() == 7 {
            weekdays = FieldSet::empty();
        } else if weekdays.len() < 7 && days.len() == 31 {
            days = FieldSet::empty();
        }

        Ok(Schedule {
            seconds,
            minutes,
            hours,
            days,
            months,
            weekdays,
        })
    }

    /// True when the snapshot's components are allowed by this schedule.
    pub fn matches(&self, snapshot: &Snapshot) -> bool {
        let due = self.minutes.contains(snapshot.minute)
            && self.hours.contains(snapshot.hour)
            && self.months.contains(snapshot.month)
            && (self.days.contains(snapshot.day) || self.weekdays.contains(snapshot.weekday));
        match &self.seconds {
            Some(seconds) => due && seconds.contains(snapshot.second),
            None => due,
        }
    }

    /// The second field's set. `None` at minute granularity.
    pub fn seconds(&self) -> Option<&FieldSet> {
        self.seconds.as_ref()
    }

    pub fn minutes(&self) -> &FieldSet {
        &self.minutes
    }

    pub fn hours(&self) -> &FieldSet {
        &self.hours
    }

    pub fn days(&self) -> &FieldSet {
        &self.days
    }

    pub fn months(&self) -> &FieldSet {
        &self.months
    }

    pub fn weekdays(&self) -> &FieldSet {
        &self.weekdays
    }
}
