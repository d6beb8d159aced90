use gtfs_structures::RawGtfs;

fn main() {
    /* RawGtfs::new accepts a feed directory or a local zip file.
       You can also use RawGtfs::from_path or RawGtfs::from_reader
    */
    let raw_gtfs = RawGtfs::new("fixtures/basic").expect("impossible to read gtfs");

    raw_gtfs.print_stats();

    for calendar in raw_gtfs
        .calendar
        .expect("no calendar.txt")
        .expect("impossible to read calendar.txt")
    {
        println!("calendar {}: {}", calendar.id, calendar);
    }
}
