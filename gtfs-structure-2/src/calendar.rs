use std::fmt;
use std::iter::FusedIterator;

use chrono::{Datelike, NaiveDate, Weekday};

use crate::error::ValidationError;

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Set of weekdays, bit 0 is monday
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Weekdays(u8);

impl Weekdays {
    pub const NONE: Weekdays = Weekdays(0);
    pub const ALL: Weekdays = Weekdays(0b111_1111);

    /// From the seven weekday columns of `calendar.txt`, monday first
    pub fn from_flags(flags: [bool; 7]) -> Self {
        flags
            .iter()
            .enumerate()
            .filter(|(_, set)| **set)
            .fold(Weekdays::NONE, |acc, (i, _)| Weekdays(acc.0 | 1 << i))
    }

    pub fn with(self, day: Weekday) -> Self {
        Weekdays(self.0 | 1 << day.num_days_from_monday())
    }

    #[inline]
    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_monday()) != 0
    }

    /// Indices of the days in the set, 0 is monday and 6 is sunday
    pub fn iter(&self) -> impl Iterator<Item = u32> {
        let bits = self.0;
        (0..7).filter(move |i| bits & (1 << i) != 0)
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl FromIterator<Weekday> for Weekdays {
    fn from_iter<T: IntoIterator<Item = Weekday>>(iter: T) -> Self {
        iter.into_iter().fold(Weekdays::NONE, Weekdays::with)
    }
}

impl fmt::Debug for Weekdays {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_set()
            .entries(self.iter().map(|i| WEEK[i as usize]))
            .finish()
    }
}

/// Service `service_id` operates on `date`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceDateFact {
    pub service_id: String,
    pub date: NaiveDate,
}

impl ServiceDateFact {
    pub fn new(service_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            service_id: service_id.into(),
            date,
        }
    }
}

impl fmt::Display for ServiceDateFact {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}@{}", self.service_id, self.date)
    }
}

/// A service running on a fixed set of weekdays between two dates, both included
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurringSchedule {
    service_id: String,
    weekdays: Weekdays,
    start_date: NaiveDate,
    end_date: NaiveDate,
    label: Option<String>,
}

impl RecurringSchedule {
    pub fn new(
        service_id: impl Into<String>,
        weekdays: Weekdays,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Self, ValidationError> {
        let service_id = service_id.into();
        if service_id.is_empty() {
            return Err(ValidationError::EmptyServiceId);
        }
        if start_date > end_date {
            return Err(ValidationError::InvalidWindow {
                service_id,
                start_date,
                end_date,
            });
        }
        Ok(Self {
            service_id,
            weekdays,
            start_date,
            end_date,
            label: None,
        })
    }

    /// Human readable name of the service
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    pub fn weekdays(&self) -> Weekdays {
        self.weekdays
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Number of days in the window, both ends included
    pub fn window_days(&self) -> i64 {
        self.end_date
            .signed_duration_since(self.start_date)
            .num_days()
            + 1
    }

    /// Only looks at the weekday, not at the window
    #[inline]
    pub fn runs_on_weekday(&self, date: NaiveDate) -> bool {
        self.weekdays.contains(date.weekday())
    }

    /// Every date of the window falling on one of the weekdays
    pub fn expand(&self) -> ScheduleDates<'_> {
        self.expand_until(self.end_date)
    }

    /// Same as [RecurringSchedule::expand], stopping after `last` if it comes before the end date
    pub fn expand_until(&self, last: NaiveDate) -> ScheduleDates<'_> {
        let next = if self.weekdays.is_empty() {
            None
        } else {
            Some(self.start_date)
        };
        ScheduleDates {
            schedule: self,
            next,
            last: last.min(self.end_date),
        }
    }
}

/// Lazy sequence of the dates of a [RecurringSchedule]. Clone it to restart from the same point.
#[derive(Debug, Clone)]
pub struct ScheduleDates<'a> {
    schedule: &'a RecurringSchedule,
    next: Option<NaiveDate>,
    last: NaiveDate,
}

impl<'a> Iterator for ScheduleDates<'a> {
    type Item = ServiceDateFact;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let date = self.next.filter(|d| *d <= self.last)?;
            // succ_opt is None on NaiveDate::MAX, which ends the sequence
            self.next = date.succ_opt();
            if self.schedule.runs_on_weekday(date) {
                return Some(ServiceDateFact::new(self.schedule.service_id(), date));
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.next.filter(|d| *d <= self.last) {
            Some(next) => {
                let days = self.last.signed_duration_since(next).num_days() + 1;
                (0, usize::try_from(days).ok())
            }
            None => (0, Some(0)),
        }
    }
}

impl<'a> FusedIterator for ScheduleDates<'a> {}

/// Is a service added or removed on a date. The values are the codes of `calendar_dates.txt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExceptionType {
    Addition = 1,
    Removal = 2,
}

impl ExceptionType {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(ExceptionType::Addition),
            2 => Some(ExceptionType::Removal),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        self as i32
    }
}

/// A single date on which a service is added or removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateException {
    service_id: String,
    date: NaiveDate,
    exception_type: ExceptionType,
}

impl DateException {
    /// `code` is the `exception_type` column, anything but 1 or 2 is rejected
    pub fn new(
        service_id: impl Into<String>,
        date: NaiveDate,
        code: i32,
    ) -> Result<Self, ValidationError> {
        let service_id = service_id.into();
        if service_id.is_empty() {
            return Err(ValidationError::EmptyServiceId);
        }
        let exception_type =
            ExceptionType::from_code(code).ok_or_else(|| ValidationError::InvalidExceptionType {
                service_id: service_id.clone(),
                date,
                code,
            })?;
        Ok(Self {
            service_id,
            date,
            exception_type,
        })
    }

    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn exception_type(&self) -> ExceptionType {
        self.exception_type
    }

    pub fn is_addition(&self) -> bool {
        self.exception_type == ExceptionType::Addition
    }

    pub fn is_removal(&self) -> bool {
        self.exception_type == ExceptionType::Removal
    }

    pub fn fact(&self) -> ServiceDateFact {
        ServiceDateFact::new(self.service_id.as_str(), self.date)
    }
}
