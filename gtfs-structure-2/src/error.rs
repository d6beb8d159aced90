use chrono::NaiveDate;
use thiserror::Error;

/// A calendar record that cannot describe a service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("service {service_id}: start date {start_date} is after end date {end_date}")]
    InvalidWindow {
        service_id: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
    },
    #[error("service {service_id} on {date}: exception_type {code} is neither 1 (added) nor 2 (removed)")]
    InvalidExceptionType {
        service_id: String,
        date: NaiveDate,
        code: i32,
    },
    #[error("a calendar record has an empty service_id")]
    EmptyServiceId,
}

/// The window of a schedule is longer than the configured maximum
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("service {service_id}: window {start_date}..={end_date} spans {days} days, the maximum is {max_days}")]
pub struct WindowOverflowError {
    pub service_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: i64,
    pub max_days: u32,
}

/// A removal exception could not be applied to the working set.
///
/// Not fatal: the expansion skips it and reports it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("could not remove service {service_id} on {date}: {reason}")]
pub struct RemovalConflictError {
    pub service_id: String,
    pub date: NaiveDate,
    pub reason: String,
}

/// Errors stopping a load or an expansion before anything is written to the working set
#[derive(Error, Debug)]
pub enum Error {
    #[error("could not read the calendar files")]
    Feed(#[from] gtfs_structures::Error),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    WindowOverflow(#[from] WindowOverflowError),
}
