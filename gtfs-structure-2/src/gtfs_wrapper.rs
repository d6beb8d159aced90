use log::info;

use crate::calendar::{DateException, RecurringSchedule, Weekdays};
use crate::error::{Error, ValidationError};

pub type LibraryGTFS = gtfs_structures::RawGtfs;

impl TryFrom<gtfs_structures::Calendar> for RecurringSchedule {
    type Error = ValidationError;

    fn try_from(f: gtfs_structures::Calendar) -> Result<Self, Self::Error> {
        let weekdays = Weekdays::from_flags(f.weekday_flags());
        let schedule = RecurringSchedule::new(f.id, weekdays, f.start_date, f.end_date)?;
        Ok(match f.service_name {
            Some(name) if !name.is_empty() => schedule.with_label(name),
            _ => schedule,
        })
    }
}

impl TryFrom<gtfs_structures::CalendarDate> for DateException {
    type Error = ValidationError;

    fn try_from(f: gtfs_structures::CalendarDate) -> Result<Self, Self::Error> {
        DateException::new(f.service_id, f.date, f.exception_type.code())
    }
}

/// Validated calendar records of a feed, in file order
#[derive(Debug, Default)]
pub struct CalendarRecords {
    pub schedules: Vec<RecurringSchedule>,
    pub exceptions: Vec<DateException>,
}

impl TryFrom<LibraryGTFS> for CalendarRecords {
    type Error = Error;

    /// Stops at the first record that does not read or validate
    fn try_from(mut raw: LibraryGTFS) -> Result<Self, Self::Error> {
        let schedules = raw
            .take_calendar()?
            .into_iter()
            .map(RecurringSchedule::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let exceptions = raw
            .take_calendar_dates()?
            .into_iter()
            .map(DateException::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        info!(
            "{} weekly schedules and {} date exceptions loaded in {} ms",
            schedules.len(),
            exceptions.len(),
            raw.read_duration
        );
        Ok(Self {
            schedules,
            exceptions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Weekday};
    use gtfs_structures::Exception;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn calendar(id: &str, start_date: NaiveDate, end_date: NaiveDate) -> gtfs_structures::Calendar {
        gtfs_structures::Calendar {
            id: id.to_owned(),
            monday: true,
            tuesday: false,
            wednesday: false,
            thursday: false,
            friday: true,
            saturday: false,
            sunday: false,
            start_date,
            end_date,
            service_name: None,
        }
    }

    #[test]
    fn calendar_to_schedule() {
        let mut raw = calendar("A", date(2024, 1, 1), date(2024, 1, 31));
        raw.service_name = Some("Weekdays".to_owned());
        let schedule = RecurringSchedule::try_from(raw).unwrap();
        assert_eq!("A", schedule.service_id());
        assert_eq!(Some("Weekdays"), schedule.label());
        assert!(schedule.weekdays().contains(Weekday::Mon));
        assert!(schedule.weekdays().contains(Weekday::Fri));
        assert_eq!(2, schedule.weekdays().len());
    }

    #[test]
    fn calendar_with_reversed_window() {
        let raw = calendar("A", date(2024, 1, 31), date(2024, 1, 1));
        assert!(matches!(
            RecurringSchedule::try_from(raw),
            Err(ValidationError::InvalidWindow { .. })
        ));
    }

    #[test]
    fn calendar_date_to_exception() {
        let raw = gtfs_structures::CalendarDate {
            service_id: "A".to_owned(),
            date: date(2024, 1, 8),
            exception_type: Exception::Deleted,
        };
        assert!(DateException::try_from(raw).unwrap().is_removal());

        let raw = gtfs_structures::CalendarDate {
            service_id: "A".to_owned(),
            date: date(2024, 1, 8),
            exception_type: Exception::Unknown(5),
        };
        assert!(matches!(
            DateException::try_from(raw),
            Err(ValidationError::InvalidExceptionType { code: 5, .. })
        ));
    }

    #[test]
    fn records_from_feed() {
        let raw = LibraryGTFS::from_path("../gtfs-structure/fixtures/basic").unwrap();
        let records = CalendarRecords::try_from(raw).unwrap();
        assert_eq!(2, records.schedules.len());
        assert_eq!(3, records.exceptions.len());
        assert_eq!(Some("Weekend"), records.schedules[0].label());
        assert_eq!(None, records.schedules[1].label());
    }

    #[test]
    fn records_from_feed_with_invalid_exception() {
        let raw = LibraryGTFS::from_path("../gtfs-structure/fixtures/invalid_exception").unwrap();
        assert!(matches!(
            CalendarRecords::try_from(raw),
            Err(Error::Validation(ValidationError::InvalidExceptionType { code: 5, .. }))
        ));
    }

    #[test]
    fn records_without_calendar() {
        let raw = LibraryGTFS::from_path("../gtfs-structure/fixtures/only_calendar_dates").unwrap();
        let records = CalendarRecords::try_from(raw).unwrap();
        assert!(records.schedules.is_empty());
        assert_eq!(2, records.exceptions.len());
    }
}
