use anyhow::{Context, Result};
use chrono::NaiveDate;
use gtfs_structure_2::FactSet;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Where committed service days are published.
///
/// A commit replaces everything the store held before.
pub trait FactStore {
    /// Returns the number of facts now in the store
    fn replace_all(&mut self, facts: &FactSet) -> Result<usize>;

    fn runs_on(&self, service_id: &str, date: NaiveDate) -> Result<bool>;

    fn dates_for(&self, service_id: &str) -> Result<Vec<NaiveDate>>;

    fn len(&self) -> Result<usize>;
}

#[derive(Debug, Default)]
pub struct MemoryFactStore {
    facts: FactSet,
}

impl MemoryFactStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FactStore for MemoryFactStore {
    fn replace_all(&mut self, facts: &FactSet) -> Result<usize> {
        self.facts = facts.clone();
        Ok(self.facts.len())
    }

    fn runs_on(&self, service_id: &str, date: NaiveDate) -> Result<bool> {
        Ok(self.facts.contains(service_id, date))
    }

    fn dates_for(&self, service_id: &str) -> Result<Vec<NaiveDate>> {
        Ok(self.facts.dates_for(service_id))
    }

    fn len(&self) -> Result<usize> {
        Ok(self.facts.len())
    }
}

/// Keeps the service days in the `universal_calendar` table
pub struct SqliteFactStore {
    conn: Connection,
}

impl SqliteFactStore {
    pub fn open(path: &str) -> Result<Self> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(path)
        }
        .with_context(|| format!("Connect to db {path}"))?;
        Self::with_connection(conn)
    }

    pub fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS universal_calendar (
                service_id TEXT NOT NULL,
                date TEXT NOT NULL,
                PRIMARY KEY (service_id, date)
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_universal_calendar_on_date ON universal_calendar (date);",
            [],
        )?;
        Ok(Self { conn })
    }
}

impl FactStore for SqliteFactStore {
    fn replace_all(&mut self, facts: &FactSet) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let deleted = tx.execute("DELETE FROM universal_calendar", [])?;
        {
            let mut stmt_insert =
                tx.prepare("INSERT INTO universal_calendar (service_id, date) VALUES (?, ?)")?;
            for (service_id, date) in facts.iter() {
                stmt_insert
                    .execute(params![service_id, date.format(DATE_FORMAT).to_string()])
                    .with_context(|| format!("Insert {service_id} on {date}"))?;
            }
        }
        tx.commit()?;
        debug!(
            "universal_calendar: {} rows replaced by {}",
            deleted,
            facts.len()
        );
        Ok(facts.len())
    }

    fn runs_on(&self, service_id: &str, date: NaiveDate) -> Result<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM universal_calendar WHERE service_id = ? AND date = ?",
                params![service_id, date.format(DATE_FORMAT).to_string()],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn dates_for(&self, service_id: &str) -> Result<Vec<NaiveDate>> {
        let mut stmt = self
            .conn
            .prepare("SELECT date FROM universal_calendar WHERE service_id = ? ORDER BY date")?;
        let rows = stmt.query_map([service_id], |row| row.get::<_, String>(0))?;
        let mut dates = Vec::new();
        for row in rows {
            let text = row?;
            let date = NaiveDate::parse_from_str(&text, DATE_FORMAT)
                .with_context(|| format!("Bad date {text} for {service_id}"))?;
            dates.push(date);
        }
        Ok(dates)
    }

    fn len(&self) -> Result<usize> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM universal_calendar", [], |row| {
                    row.get(0)
                })?;
        Ok(usize::try_from(count)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gtfs_structure_2::ServiceDateFact;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn facts(list: &[(&str, NaiveDate)]) -> FactSet {
        list.iter()
            .map(|(service_id, date)| ServiceDateFact::new(*service_id, *date))
            .collect()
    }

    fn check_replace(store: &mut dyn FactStore) {
        let first = facts(&[
            ("A", date(2024, 1, 8)),
            ("A", date(2024, 1, 1)),
            ("B", date(2024, 1, 1)),
        ]);
        assert_eq!(3, store.replace_all(&first).unwrap());
        assert_eq!(3, store.len().unwrap());
        assert!(store.runs_on("A", date(2024, 1, 8)).unwrap());
        assert_eq!(
            vec![date(2024, 1, 1), date(2024, 1, 8)],
            store.dates_for("A").unwrap()
        );

        let second = facts(&[("A", date(2024, 1, 15))]);
        assert_eq!(1, store.replace_all(&second).unwrap());
        assert_eq!(1, store.len().unwrap());
        assert!(!store.runs_on("A", date(2024, 1, 8)).unwrap());
        assert!(!store.runs_on("B", date(2024, 1, 1)).unwrap());
        assert!(store.dates_for("B").unwrap().is_empty());
    }

    #[test]
    fn memory_store_replaces() {
        check_replace(&mut MemoryFactStore::new());
    }

    #[test]
    fn sqlite_store_replaces() {
        check_replace(&mut SqliteFactStore::open(":memory:").unwrap());
    }

    #[test]
    fn sqlite_store_replace_with_empty_set() {
        let mut store = SqliteFactStore::open(":memory:").unwrap();
        store
            .replace_all(&facts(&[("A", date(2024, 1, 1))]))
            .unwrap();
        assert_eq!(0, store.replace_all(&FactSet::new()).unwrap());
        assert_eq!(0, store.len().unwrap());
    }

    #[test]
    fn sqlite_store_reopens_existing_table() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE universal_calendar (service_id TEXT NOT NULL, date TEXT NOT NULL, PRIMARY KEY (service_id, date))",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO universal_calendar VALUES ('old', '2023-12-31')",
            [],
        )
        .unwrap();
        let mut store = SqliteFactStore::with_connection(conn).unwrap();
        assert!(store.runs_on("old", date(2023, 12, 31)).unwrap());
        store
            .replace_all(&facts(&[("A", date(2024, 1, 1))]))
            .unwrap();
        assert!(!store.runs_on("old", date(2023, 12, 31)).unwrap());
    }
}
