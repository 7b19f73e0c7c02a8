pub mod hebrew;
pub mod schedule;

use thiserror::Error;
use uuid::Uuid;

pub use hebrew::{to_gregorian, to_hebrew, HebrewDate};
pub use schedule::{
    due_reminders, group_by_bucket, group_by_month, next_occurrence, upcoming, Bucket, BucketGroup, MonthGroup,
    Occurrence,
};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CalendarError {
    #[error("Yahrzeit {0} has neither a date of death nor a Hebrew date")]
    NoDate(Uuid),

    #[error("Hebrew year {year} has no month {month}")]
    InvalidMonth { year: i32, month: u8 },

    #[error("Hebrew month {month} of {year} has no day {day}")]
    InvalidDay { year: i32, month: u8, day: u8 },

    #[error("Date out of supported range: {0}")]
    OutOfRange(i64),
}
