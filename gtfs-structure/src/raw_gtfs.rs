use crate::objects::*;
use crate::Error;
use crate::GtfsReader;
use std::path::Path;

/// Data structure that map the GTFS calendar csv files with little intelligence
///
/// This is used to analyze the calendar of a feed and detect anomalies before
/// the service days are computed from it
#[derive(Debug)]
pub struct RawGtfs {
    /// Time needed to read and parse the archive in milliseconds
    pub read_duration: i64,
    /// All Calendar, None if the file was absent as it is not mandatory
    pub calendar: Option<Result<Vec<Calendar>, Error>>,
    /// All Calendar dates, None if the file was absent as it is not mandatory
    pub calendar_dates: Option<Result<Vec<CalendarDate>, Error>>,
    /// All files that are present in the feed
    pub files: Vec<String>,
    /// sha256 sum of the feed
    pub sha256: Option<String>,
}

impl RawGtfs {
    /// Prints on stdout some basic statistics about the calendar files (numbers of elements for each object). Mostly to be sure that everything was read
    pub fn print_stats(&self) {
        println!("GTFS calendar data:");
        println!("  Read in {} ms", self.read_duration);
        println!("  Calendar: {}", optional_file_summary(&self.calendar));
        println!(
            "  Calendar dates: {}",
            optional_file_summary(&self.calendar_dates)
        );
    }

    /// Reads from a local path (either a directory or zipped file)
    pub fn new(gtfs: &str) -> Result<Self, Error> {
        GtfsReader::default().raw().read(gtfs)
    }

    /// Reads the raw GTFS from a local zip archive or local directory
    pub fn from_path<P>(path: P) -> Result<Self, Error>
    where
        P: AsRef<Path>,
    {
        GtfsReader::default().raw().read_from_path(path)
    }

    /// Reads for any object implementing [std::io::Read] and [std::io::Seek]
    ///
    /// Mostly an internal function that abstracts reading from a zip file
    pub fn from_reader<T: std::io::Read + std::io::Seek>(reader: T) -> Result<Self, Error> {
        GtfsReader::default().raw().read_from_reader(reader)
    }

    /// Takes the calendars out of the feed, an absent file being an empty list
    pub fn take_calendar(&mut self) -> Result<Vec<Calendar>, Error> {
        self.calendar.take().unwrap_or_else(|| Ok(Vec::new()))
    }

    /// Takes the calendar dates out of the feed, an absent file being an empty list
    pub fn take_calendar_dates(&mut self) -> Result<Vec<CalendarDate>, Error> {
        self.calendar_dates.take().unwrap_or_else(|| Ok(Vec::new()))
    }
}

fn mandatory_file_summary<T>(objs: &Result<Vec<T>, Error>) -> String {
    match objs {
        Ok(vec) => format!("{} objects", vec.len()),
        Err(e) => format!("Could not read {}", e),
    }
}

fn optional_file_summary<T>(objs: &Option<Result<Vec<T>, Error>>) -> String {
    match objs {
        Some(objs) => mandatory_file_summary(objs),
        None => "File not present".to_string(),
    }
}
