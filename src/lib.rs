// In-process crontab: cron expression compilation and tick-driven job
// dispatch at minute or second granularity.

pub mod clock;
pub mod crontab;
pub mod errors;
pub mod field;
mod job;
pub mod schedule;

pub use clock::Snapshot;
pub use crontab::Crontab;
pub use errors::{CrontabError, ScheduleError};
pub use field::FieldSet;
pub use schedule::{Granularity, Schedule};
