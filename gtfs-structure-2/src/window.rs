use std::str::FromStr;

use chrono::{Days, NaiveDate};

use crate::calendar::RecurringSchedule;
use crate::error::WindowOverflowError;

/// Ten years, leap days included
pub const DEFAULT_MAX_WINDOW_DAYS: u32 = 3660;

/// What to do with a schedule whose window is longer than [WindowLimit::max_days]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowPolicy {
    /// Fail the whole expansion
    #[default]
    Reject,
    /// Keep the first `max_days` days of the window and log a warning
    Truncate,
}

impl FromStr for WindowPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reject" => Ok(WindowPolicy::Reject),
            "truncate" => Ok(WindowPolicy::Truncate),
            _ => {
                log::error!("{s} is not a window policy");
                Err(format!("{s} not a window policy, expected reject or truncate"))
            }
        }
    }
}

/// Bound on the number of days a single schedule may expand to.
///
/// Feeds sometimes use far away dates (1900, 9999) to mean "forever"; expanding those day by
/// day would take millions of iterations per service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowLimit {
    pub max_days: u32,
    pub policy: WindowPolicy,
}

impl Default for WindowLimit {
    fn default() -> Self {
        Self {
            max_days: DEFAULT_MAX_WINDOW_DAYS,
            policy: WindowPolicy::default(),
        }
    }
}

/// Where the expansion of a schedule stops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowBound {
    Full,
    /// Last date to expand, before the end date of the schedule
    Truncated(NaiveDate),
}

impl WindowLimit {
    pub fn new(max_days: u32, policy: WindowPolicy) -> Self {
        Self { max_days, policy }
    }

    pub fn bound(&self, schedule: &RecurringSchedule) -> Result<WindowBound, WindowOverflowError> {
        let days = schedule.window_days();
        if days <= i64::from(self.max_days) {
            return Ok(WindowBound::Full);
        }
        match self.policy {
            WindowPolicy::Reject => Err(WindowOverflowError {
                service_id: schedule.service_id().to_owned(),
                start_date: schedule.start_date(),
                end_date: schedule.end_date(),
                days,
                max_days: self.max_days,
            }),
            WindowPolicy::Truncate => {
                let last = match self.max_days.checked_sub(1) {
                    Some(offset) => schedule
                        .start_date()
                        .checked_add_days(Days::new(u64::from(offset)))
                        .unwrap_or_else(|| schedule.end_date()),
                    // nothing is kept, the day before the start ends the sequence right away
                    None => schedule
                        .start_date()
                        .pred_opt()
                        .unwrap_or_else(|| schedule.start_date()),
                };
                Ok(WindowBound::Truncated(last))
            }
        }
    }
}
