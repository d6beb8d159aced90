use std::path::{Path, PathBuf};

use anyhow::Context;
use service_days::{load_records, refresh, Configuration, SqliteFactStore};

const USAGE: &str = "usage: service-days <feed-path> [config.json]";

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let feed_arg = args.next();
    let config = match args.next() {
        Some(path) => Configuration::from_file(Path::new(&path))?,
        None => Configuration::default(),
    }
    .with_env_overrides()?;

    let feed_path = feed_arg
        .map(PathBuf::from)
        .or_else(|| config.feed_path.clone())
        .context(USAGE)?;

    let records = load_records(&feed_path)?;
    let mut store = SqliteFactStore::open(&config.database_path)?;
    let summary = refresh(
        &mut store,
        &records.schedules,
        &records.exceptions,
        &config,
    )?;

    println!(
        "{}: {} service days committed to {} in {:.3}s",
        feed_path.display(),
        summary.committed,
        config.database_path,
        summary.elapsed.as_secs_f32()
    );
    println!("  {}", summary.report);
    if summary.report.conflict_count() > 0 {
        eprintln!(
            "{} removal exceptions could not be applied, see the log for details",
            summary.report.conflict_count()
        );
    }
    Ok(())
}
