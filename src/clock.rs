// Wall-clock capture for tick evaluation

use chrono::{DateTime, Datelike, Local, Timelike};

/// The time components one tick is evaluated against.
///
/// Captured once per tick from the local wall clock and shared read-only
/// by every job evaluated in that tick. Weekday numbering follows cron:
/// 0 is Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub second: u32,
    pub minute: u32,
    pub hour: u32,
    pub day: u32,
    pub month: u32,
    pub weekday: u32,
}

impl Snapshot {
    /// Capture the current local wall-clock time.
    pub fn now() -> Snapshot {
        Local::now().into()
    }
}

impl From<DateTime<Local>> for Snapshot {
    fn from(t: DateTime<Local>) -> Snapshot {
        Snapshot {
            second: t.second(),
            minute: t.minute(),
            hour: t.hour(),
            day: t.day(),
            month: t.month(),
            weekday: t.weekday().num_days_from_sunday(),
        }
    }
}
