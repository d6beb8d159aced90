use std::collections::BTreeSet;
use std::fmt;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use log::{debug, info, warn};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::calendar::{DateException, ExceptionType, RecurringSchedule, ServiceDateFact};
use crate::error::{Error, RemovalConflictError};
use crate::window::{WindowBound, WindowLimit};

/// Where the expansion writes the facts while it runs.
///
/// [FactSet] is the in-memory implementation and never fails to remove. Sets backed by a
/// storage engine report failed deletes as [RemovalConflictError].
pub trait WorkingSet {
    /// Inserting an existing fact is a no-op
    fn insert(&mut self, fact: ServiceDateFact);

    /// `Ok(false)` when the fact was absent
    fn remove(&mut self, fact: &ServiceDateFact) -> Result<bool, RemovalConflictError>;
}

/// Set of (service, date) pairs on which a service operates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FactSet {
    // Services without any date are never kept, so that two equal sets compare equal
    dates: FxHashMap<String, BTreeSet<NaiveDate>>,
    len: usize,
}

impl FactSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, service_id: &str, date: NaiveDate) -> bool {
        self.dates
            .get(service_id)
            .map(|dates| dates.contains(&date))
            .unwrap_or(false)
    }

    /// Returns true if the fact was not already present
    pub fn insert(&mut self, fact: ServiceDateFact) -> bool {
        let added = self
            .dates
            .entry(fact.service_id)
            .or_default()
            .insert(fact.date);
        if added {
            self.len += 1;
        }
        added
    }

    /// Returns true if the fact was present
    pub fn remove(&mut self, service_id: &str, date: NaiveDate) -> bool {
        let Some(dates) = self.dates.get_mut(service_id) else {
            return false;
        };
        let removed = dates.remove(&date);
        if dates.is_empty() {
            self.dates.remove(service_id);
        }
        if removed {
            self.len -= 1;
        }
        removed
    }

    /// Sorted dates of a service, empty if the service never runs
    pub fn dates_for(&self, service_id: &str) -> Vec<NaiveDate> {
        self.dates
            .get(service_id)
            .map(|dates| dates.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn service_ids(&self) -> impl Iterator<Item = &str> {
        self.dates.keys().map(String::as_str)
    }

    /// Every fact, in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (&str, NaiveDate)> {
        self.dates.iter().flat_map(|(service_id, dates)| {
            dates.iter().map(move |date| (service_id.as_str(), *date))
        })
    }

    /// Every fact, sorted by service then date
    pub fn to_sorted_vec(&self) -> Vec<ServiceDateFact> {
        let mut facts: Vec<_> = self
            .iter()
            .map(|(service_id, date)| ServiceDateFact::new(service_id, date))
            .collect();
        facts.sort();
        facts
    }
}

impl WorkingSet for FactSet {
    fn insert(&mut self, fact: ServiceDateFact) {
        FactSet::insert(self, fact);
    }

    fn remove(&mut self, fact: &ServiceDateFact) -> Result<bool, RemovalConflictError> {
        Ok(FactSet::remove(self, &fact.service_id, fact.date))
    }
}

impl Extend<ServiceDateFact> for FactSet {
    fn extend<T: IntoIterator<Item = ServiceDateFact>>(&mut self, iter: T) {
        for fact in iter {
            FactSet::insert(self, fact);
        }
    }
}

impl FromIterator<ServiceDateFact> for FactSet {
    fn from_iter<T: IntoIterator<Item = ServiceDateFact>>(iter: T) -> Self {
        let mut set = FactSet::new();
        set.extend(iter);
        set
    }
}

/// What an expansion did
#[derive(Debug, Clone, Default)]
pub struct ExpansionReport {
    pub schedules: usize,
    pub exceptions: usize,
    /// Dates produced by the weekly patterns, before any exception
    pub recurring_dates: usize,
    pub truncated_schedules: usize,
    /// Schedules whose `service_id` was already seen, their dates are merged with the earlier ones
    pub duplicate_schedules: usize,
    pub additions: usize,
    /// Removal exceptions that deleted a fact
    pub removals: usize,
    /// Removal exceptions for a fact that was not there
    pub absent_removals: usize,
    /// Removal exceptions that could not be applied, in the order they were met
    pub removal_conflicts: Vec<RemovalConflictError>,
    pub elapsed: Duration,
}

impl ExpansionReport {
    pub fn conflict_count(&self) -> usize {
        self.removal_conflicts.len()
    }
}

impl fmt::Display for ExpansionReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} schedules ({} truncated), {} exceptions: {} recurring dates, {} added, {} removed, {} removals of absent dates, {} removal conflicts in {:.3}s",
            self.schedules,
            self.truncated_schedules,
            self.exceptions,
            self.recurring_dates,
            self.additions,
            self.removals,
            self.absent_removals,
            self.conflict_count(),
            self.elapsed.as_secs_f64()
        )
    }
}

/// Result of [ScheduleExpander::expand]
#[derive(Debug, Clone)]
pub struct Expansion {
    pub facts: FactSet,
    pub report: ExpansionReport,
}

/// Computes the days each service operates on from the weekly schedules and the date exceptions
#[derive(Debug, Clone, Copy, Default)]
pub struct ScheduleExpander {
    limit: WindowLimit,
}

impl ScheduleExpander {
    pub fn new(limit: WindowLimit) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> WindowLimit {
        self.limit
    }

    /// Builds a new [FactSet]. Running it twice on the same input gives equal sets.
    pub fn expand(
        &self,
        schedules: &[RecurringSchedule],
        exceptions: &[DateException],
    ) -> Result<Expansion, Error> {
        let mut facts = FactSet::new();
        let report = self.expand_into(schedules, exceptions, &mut facts)?;
        Ok(Expansion { facts, report })
    }

    /// Writes the weekly dates of every schedule, then applies the exceptions in the given
    /// order: additions insert, removals delete.
    ///
    /// Every window is checked before the first write, so on error `working` is left untouched.
    /// A removal that the working set cannot apply is logged, kept in the report and skipped.
    pub fn expand_into<W: WorkingSet>(
        &self,
        schedules: &[RecurringSchedule],
        exceptions: &[DateException],
        working: &mut W,
    ) -> Result<ExpansionReport, Error> {
        let start_time = Instant::now();

        let bounds = schedules
            .iter()
            .map(|schedule| self.limit.bound(schedule))
            .collect::<Result<Vec<_>, _>>()?;

        let mut report = ExpansionReport {
            schedules: schedules.len(),
            exceptions: exceptions.len(),
            ..Default::default()
        };

        let mut seen = FxHashSet::default();
        for (schedule, bound) in schedules.iter().zip(bounds) {
            if !seen.insert(schedule.service_id()) {
                warn!(
                    "service {} has several weekly schedules, their dates are merged",
                    schedule.service_id()
                );
                report.duplicate_schedules += 1;
            }
            let dates = match bound {
                WindowBound::Full => schedule.expand(),
                WindowBound::Truncated(last) => {
                    warn!(
                        "service {}: window {}..={} spans {} days, only expanded until {}",
                        schedule.service_id(),
                        schedule.start_date(),
                        schedule.end_date(),
                        schedule.window_days(),
                        last
                    );
                    report.truncated_schedules += 1;
                    schedule.expand_until(last)
                }
            };
            for fact in dates {
                working.insert(fact);
                report.recurring_dates += 1;
            }
        }

        for exception in exceptions {
            let fact = exception.fact();
            match exception.exception_type() {
                ExceptionType::Addition => {
                    working.insert(fact);
                    report.additions += 1;
                }
                ExceptionType::Removal => match working.remove(&fact) {
                    Ok(true) => report.removals += 1,
                    Ok(false) => report.absent_removals += 1,
                    Err(conflict) => {
                        warn!("{conflict}");
                        report.removal_conflicts.push(conflict);
                    }
                },
            }
        }

        report.elapsed = start_time.elapsed();
        if report.removal_conflicts.is_empty() {
            info!("service days expanded: {report}");
        } else {
            warn!(
                "service days expanded with {} removal conflicts: {report}",
                report.conflict_count()
            );
        }
        debug!(
            "ScheduleExpander.expand_into ({:.3} seconds)",
            report.elapsed.as_secs_f64()
        );
        Ok(report)
    }
}
