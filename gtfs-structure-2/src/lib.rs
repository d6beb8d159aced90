//! Service days of a transit feed.
//!
//! A feed describes when each service runs with weekly patterns valid between two dates
//! ([RecurringSchedule]) and single-date overrides ([DateException]). [ScheduleExpander]
//! turns both into the explicit set of (service, date) pairs the service operates on.

pub mod calendar;
pub mod error;
pub mod gtfs_wrapper;
pub mod service_days;
pub mod window;

pub use calendar::{
    DateException, ExceptionType, RecurringSchedule, ScheduleDates, ServiceDateFact, Weekdays,
};
pub use error::{Error, RemovalConflictError, ValidationError, WindowOverflowError};
pub use gtfs_wrapper::{CalendarRecords, LibraryGTFS};
pub use service_days::{Expansion, ExpansionReport, FactSet, ScheduleExpander, WorkingSet};
pub use window::{WindowBound, WindowLimit, WindowPolicy, DEFAULT_MAX_WINDOW_DAYS};
