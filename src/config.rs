use std::env;
use std::time::Duration;

use chrono::NaiveDate;

use crate::cycle::{CycleCalendar, CycleSettings, DEFAULT_CYCLE_DAYS};

pub const MAX_CSV_FETCH_TIMEOUT_SECS: u64 = 10;
pub const MAX_CSV_BYTES: usize = 1024 * 1024;

/// Runtime knobs, read from the environment by binaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub default_cycle_days: u32,
    pub cycle_start: Option<NaiveDate>,
    pub csv_fetch_timeout: Duration,
    pub csv_max_bytes: usize,
    pub batch_parallelism: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_cycle_days: DEFAULT_CYCLE_DAYS,
            cycle_start: None,
            csv_fetch_timeout: Duration::from_secs(MAX_CSV_FETCH_TIMEOUT_SECS),
            csv_max_bytes: MAX_CSV_BYTES,
            batch_parallelism: 4,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let default_cycle_days = env::var("CYCLE_DEFAULT_DAYS")
            .ok()
            .and_then(|val| val.trim().parse::<u32>().ok())
            .unwrap_or(DEFAULT_CYCLE_DAYS)
            .clamp(1, 62);
        let cycle_start = env::var("CYCLE_START_DATE").ok().and_then(|val| {
            let trimmed = val.trim();
            if trimmed.is_empty() {
                return None;
            }
            match NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
                Ok(date) => Some(date),
                Err(err) => {
                    log::warn!("ignoring CYCLE_START_DATE={trimmed}: {err}");
                    None
                }
            }
        });
        let csv_fetch_timeout = Duration::from_secs(
            env::var("CSV_FETCH_TIMEOUT_SECS")
                .ok()
                .and_then(|val| val.trim().parse::<u64>().ok())
                .unwrap_or(MAX_CSV_FETCH_TIMEOUT_SECS)
                .clamp(1, MAX_CSV_FETCH_TIMEOUT_SECS),
        );
        let csv_max_bytes = env::var("CSV_MAX_BYTES")
            .ok()
            .and_then(|val| val.trim().parse::<usize>().ok())
            .unwrap_or(MAX_CSV_BYTES)
            .clamp(1024, MAX_CSV_BYTES);
        let batch_parallelism = env::var("BATCH_PARALLELISM")
            .ok()
            .and_then(|val| val.trim().parse::<usize>().ok())
            .unwrap_or(4)
            .clamp(1, 32);
        Self {
            default_cycle_days,
            cycle_start,
            csv_fetch_timeout,
            csv_max_bytes,
            batch_parallelism,
        }
    }

    pub fn cycle_settings(&self) -> CycleSettings {
        CycleSettings {
            default_total_days: self.default_cycle_days,
            calendar: self
                .cycle_start
                .map(|start| CycleCalendar::new(start, self.default_cycle_days)),
        }
    }
}
