use rayon::prelude::*;
use serde::Deserialize;

use crate::factory::{AutoProcessResult, TeamProcessorFactory};
use crate::status::{PlayerStatusSnapshot, ReportRecord};

/// One player's inputs for batch processing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerInput {
    pub status: PlayerStatusSnapshot,
    #[serde(default)]
    pub report: Option<ReportRecord>,
}

/// Auto-process many players on a bounded pool. Output order matches input.
pub fn process_batch(
    factory: &TeamProcessorFactory,
    inputs: &[PlayerInput],
    parallelism: usize,
) -> Vec<AutoProcessResult> {
    with_pool(parallelism, || {
        inputs
            .par_iter()
            .map(|input| factory.process_player_data_auto(&input.status, input.report.as_ref()))
            .collect()
    })
}

fn with_pool<T>(threads: usize, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    match rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .build()
    {
        Ok(pool) => pool.install(action),
        Err(err) => {
            log::warn!("falling back to the global pool: {err}");
            action()
        }
    }
}
