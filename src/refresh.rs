use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use gtfs_structure_2::{
    CalendarRecords, DateException, ExpansionReport, LibraryGTFS, RecurringSchedule,
    ScheduleExpander,
};
use log::{debug, info};

use crate::configuration::Configuration;
use crate::fact_store::FactStore;

#[derive(Debug)]
pub struct RefreshSummary {
    pub report: ExpansionReport,
    /// Facts in the store after the commit
    pub committed: usize,
    pub elapsed: Duration,
}

/// Reads and validates the calendar files of a feed
pub fn load_records(path: &Path) -> Result<CalendarRecords> {
    let path_name = path.display();
    info!("Loading calendar for {path_name}");
    let raw = LibraryGTFS::from_path(path).with_context(|| format!("Read feed {path_name}"))?;
    if let Some(sha256) = &raw.sha256 {
        debug!("Feed {path_name} sha256 {sha256}");
    }
    CalendarRecords::try_from(raw).with_context(|| format!("Load calendar of {path_name}"))
}

/// Recomputes every service day and replaces what the store held.
///
/// Nothing is committed if the expansion fails. Refreshes of the same store must not run
/// concurrently.
pub fn refresh(
    store: &mut dyn FactStore,
    schedules: &[RecurringSchedule],
    exceptions: &[DateException],
    config: &Configuration,
) -> Result<RefreshSummary> {
    let start_time = Instant::now();
    let expansion = ScheduleExpander::new(config.window_limit())
        .expand(schedules, exceptions)
        .context("Expand service days")?;
    let committed = store
        .replace_all(&expansion.facts)
        .context("Commit service days")?;
    let elapsed = start_time.elapsed();
    info!(
        "{committed} service days committed ({:.3} seconds)",
        elapsed.as_secs_f64()
    );
    Ok(RefreshSummary {
        report: expansion.report,
        committed,
        elapsed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fact_store::{MemoryFactStore, SqliteFactStore};
    use chrono::NaiveDate;
    use gtfs_structure_2::{WindowOverflowError, WindowPolicy};

    const FIXTURES: &str = "gtfs-structure/fixtures";

    fn fixture(name: &str) -> std::path::PathBuf {
        Path::new(FIXTURES).join(name)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn in_memory_config() -> Configuration {
        Configuration {
            database_path: ":memory:".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn refresh_from_zip_feed() {
        let records = load_records(&fixture("zips/gtfs.zip")).unwrap();
        let config = in_memory_config();
        let mut store = SqliteFactStore::open(&config.database_path).unwrap();
        let summary = refresh(
            &mut store,
            &records.schedules,
            &records.exceptions,
            &config,
        )
        .unwrap();

        // mondays 2024-01-01..=2024-01-15, minus the 8th, plus wednesday the 3rd
        assert_eq!(3, summary.committed);
        assert_eq!(0, summary.report.conflict_count());
        assert_eq!(
            vec![date(2024, 1, 1), date(2024, 1, 3), date(2024, 1, 15)],
            store.dates_for("A").unwrap()
        );
    }

    #[test]
    fn refresh_from_directory_feed() {
        let records = load_records(&fixture("basic")).unwrap();
        let mut store = MemoryFactStore::new();
        refresh(
            &mut store,
            &records.schedules,
            &records.exceptions,
            &in_memory_config(),
        )
        .unwrap();

        // saturday 2024-01-06 removed from the weekend service
        assert!(!store.runs_on("service1", date(2024, 1, 6)).unwrap());
        assert!(store.runs_on("service1", date(2024, 1, 7)).unwrap());
        // weekday service: saturday 27th added, monday 15th removed
        assert!(store.runs_on("service2", date(2024, 1, 27)).unwrap());
        assert!(!store.runs_on("service2", date(2024, 1, 15)).unwrap());
        assert_eq!(23, store.dates_for("service2").unwrap().len());
    }

    #[test]
    fn invalid_feed_is_not_loaded() {
        let result = load_records(&fixture("invalid_exception"));
        assert!(result.is_err());
    }

    #[test]
    fn empty_calendar_dates_file() {
        let records = load_records(&fixture("empty_calendar_dates")).unwrap();
        assert!(records.exceptions.is_empty());
        let mut store = MemoryFactStore::new();
        let summary = refresh(
            &mut store,
            &records.schedules,
            &records.exceptions,
            &in_memory_config(),
        )
        .unwrap();
        assert_eq!(3, summary.committed);
    }

    #[test]
    fn overflow_keeps_previous_commit() {
        let mut store = MemoryFactStore::new();
        let config = in_memory_config();
        let first = RecurringSchedule::new(
            "A",
            gtfs_structure_2::Weekdays::ALL,
            date(2024, 1, 1),
            date(2024, 1, 7),
        )
        .unwrap();
        refresh(&mut store, &[first], &[], &config).unwrap();
        assert_eq!(7, store.len().unwrap());

        let forever = RecurringSchedule::new(
            "A",
            gtfs_structure_2::Weekdays::ALL,
            date(1900, 1, 1),
            date(9999, 12, 31),
        )
        .unwrap();
        let err = refresh(&mut store, &[forever.clone()], &[], &config).unwrap_err();
        assert!(err.chain().any(|cause| matches!(
            cause.downcast_ref::<gtfs_structure_2::Error>(),
            Some(gtfs_structure_2::Error::WindowOverflow(WindowOverflowError { days, .. })) if *days > 14
        )));
        assert_eq!(7, store.len().unwrap());

        let truncating = Configuration {
            max_window_days: 14,
            window_policy: WindowPolicy::Truncate,
            ..config
        };
        let summary = refresh(&mut store, &[forever], &[], &truncating).unwrap();
        assert_eq!(14, summary.committed);
        assert_eq!(1, summary.report.truncated_schedules);
    }
}
