// Error types for schedule compilation and job registration

use thiserror::Error;

/// Schedule compilation errors
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Invalid schedule '{schedule}': expected {expected} fields, found {found}")]
    FieldCount {
        schedule: String,
        expected: usize,
        found: usize,
    },

    #[error("Value {value} in '{field}' is out of range: must be within {min}-{max}")]
    OutOfRange {
        value: i64,
        field: String,
        min: u32,
        max: u32,
    },

    #[error("Unable to parse '{token}' in '{field}'")]
    Unparsable { token: String, field: String },

    #[error("Step in '{field}' must be greater than zero")]
    ZeroStep { field: String },

    #[error("Field '{field}' matches no values")]
    EmptyField { field: String },
}

/// Job registration errors
#[derive(Error, Debug)]
pub enum CrontabError {
    #[error("Invalid schedule: {0}")]
    Schedule(ScheduleError),

    #[error("A job named '{0}' is already registered")]
    DuplicateName(String),
}

impl From<ScheduleError> for CrontabError {
    fn from(err: ScheduleError) -> Self {
        CrontabError::Schedule(err)
    }
}
