use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::status::ReportRecord;

pub const DEFAULT_CYCLE_DAYS: u32 = 21;

/// Calendar anchor for a reporting cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleCalendar {
    pub start: NaiveDate,
    pub total_days: u32,
}

impl CycleCalendar {
    pub fn new(start: NaiveDate, total_days: u32) -> Self {
        Self { start, total_days }
    }

    /// 1-based cycle day for `date`; 0 before the cycle starts, capped at the
    /// last day afterwards.
    pub fn day_on(&self, date: NaiveDate) -> u32 {
        let elapsed = (date - self.start).num_days();
        if elapsed < 0 {
            return 0;
        }
        let day = u32::try_from(elapsed + 1).unwrap_or(u32::MAX);
        day.min(self.total_days)
    }

    pub fn today(&self) -> u32 {
        self.day_on(Local::now().date_naive())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleSettings {
    pub default_total_days: u32,
    /// Consulted only when a report lacks its own cycle day.
    pub calendar: Option<CycleCalendar>,
}

impl Default for CycleSettings {
    fn default() -> Self {
        Self {
            default_total_days: DEFAULT_CYCLE_DAYS,
            calendar: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleStatus {
    pub current_day: u32,
    pub total_days: u32,
    pub days_until_end: u32,
}

impl CycleSettings {
    pub fn resolve(&self, report: Option<&ReportRecord>) -> CycleStatus {
        self.resolve_with(report, || self.calendar.map(|c| c.today()))
    }

    fn resolve_with(
        &self,
        report: Option<&ReportRecord>,
        calendar_day: impl FnOnce() -> Option<u32>,
    ) -> CycleStatus {
        let total_days = report
            .and_then(|r| r.total_cycle_days)
            .filter(|days| *days > 0)
            .or_else(|| self.calendar.map(|c| c.total_days).filter(|days| *days > 0))
            .unwrap_or(self.default_total_days);
        let current_day = match report.and_then(|r| r.current_cycle_day) {
            Some(day) => day,
            None => calendar_day().unwrap_or(0),
        };
        CycleStatus {
            current_day,
            total_days,
            days_until_end: total_days.saturating_sub(current_day),
        }
    }
}
