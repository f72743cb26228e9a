pub mod batch;
pub mod challenge_map;
pub mod config;
pub mod csv_fetch;
pub mod csv_goals;
pub mod cycle;
pub mod extract;
pub mod factory;
pub mod http_client;
pub mod metric;
pub mod metrics;
pub mod processor;
pub mod progress_bar;
pub mod status;
pub mod team;

pub use batch::{PlayerInput, process_batch};
pub use challenge_map::{ChallengeMapping, MappingError};
pub use config::EngineConfig;
pub use csv_goals::{CsvGoalData, GoalTriple, parse_goal_csv, validate_csv_structure, validate_new_metrics};
pub use factory::{AutoProcessResult, TeamProcessorError, TeamProcessorFactory};
pub use metric::MetricKey;
pub use metrics::{GoalMetric, PercentageSource, PlayerMetrics};
pub use processor::{TeamProcessor, TeamProfile};
pub use progress_bar::{ProgressBar, ProgressZone, compute_progress_bar};
pub use status::{PlayerStatusSnapshot, ReportRecord, parse_player_status_json, parse_report_record_json};
pub use team::TeamType;
