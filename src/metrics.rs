use serde::{Deserialize, Serialize};

use crate::metric::MetricKey;
use crate::progress_bar::{ProgressBar, compute_progress_bar};
use crate::team::TeamType;

/// Which tier produced a goal's percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PercentageSource {
    Challenge,
    Report,
    Default,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalDetails {
    /// Challenge ids consulted for this goal.
    pub challenge_ids: Vec<String>,
    /// Catalog item backing the boost; secondary goals only.
    pub boost_item_id: Option<String>,
    pub is_main_goal: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalMetric {
    pub name: String,
    pub metric: MetricKey,
    /// Finite, non-negative, unclamped.
    pub percentage: f64,
    pub boost_active: bool,
    pub source: PercentageSource,
    pub progress: ProgressBar,
    pub details: GoalDetails,
}

impl GoalMetric {
    pub(crate) fn new(
        metric: MetricKey,
        percentage: f64,
        source: PercentageSource,
        details: GoalDetails,
    ) -> Self {
        Self {
            name: metric.display_name().to_string(),
            metric,
            percentage,
            boost_active: false,
            source,
            progress: compute_progress_bar(percentage),
            details,
        }
    }
}

/// UI-ready goal summary for one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerMetrics {
    pub player_name: String,
    pub team: TeamType,
    pub points: f64,
    pub points_locked: bool,
    pub current_cycle_day: u32,
    pub total_cycle_days: u32,
    pub days_until_cycle_end: u32,
    pub primary_goal: GoalMetric,
    pub secondary_goal1: GoalMetric,
    pub secondary_goal2: GoalMetric,
    /// Operator-facing annotations; never blocking.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl PlayerMetrics {
    pub fn goals(&self) -> [&GoalMetric; 3] {
        [
            &self.primary_goal,
            &self.secondary_goal1,
            &self.secondary_goal2,
        ]
    }

    pub fn active_boosts(&self) -> usize {
        self.goals().iter().filter(|g| g.boost_active).count()
    }
}
