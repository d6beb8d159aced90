/*! Raw calendar records of a [General Transit Feed Specification](https://gtfs.org/) (GTFS) feed.

This crate brings [serde](https://serde.rs) structures for the two files that describe
when a service runs, and helpers to read them from a feed directory or zip archive.

To get started, see [RawGtfs] and [GtfsReader].

## What is read

* `calendar.txt` as [Calendar]: a weekly pattern valid between two dates
* `calendar_dates.txt` as [CalendarDate]: a service added or removed on one date

Both files are optional in GTFS, so each is read as `Option<Result<Vec<_>, Error>>`.

## Design decisions

The objects are kept as close as possible to their CSV representation. Nothing is validated
beyond what is needed to parse a line: an `exception_type` that is neither `1` nor `2` is kept
as [Exception::Unknown] and a calendar whose start is after its end is read as is. Deciding
what to do with them is left to the consumer.

We kept the GTFS names even if they can be confusing (a [Calendar] is referenced by `service_id`).
*/
#![warn(missing_docs)]

#[macro_use]
extern crate derivative;
#[macro_use]
extern crate serde_derive;

mod enums;
pub mod error;
mod gtfs_reader;
pub(crate) mod objects;
mod raw_gtfs;
mod serde_helpers;


pub use error::Error;
pub use gtfs_reader::{GtfsReader, RawGtfsReader};
pub use objects::*;
pub use raw_gtfs::RawGtfs;
