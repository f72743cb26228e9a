use std::sync::Arc;

use serde::Serialize;

use crate::challenge_map::ChallengeMapping;
use crate::cycle::CycleSettings;
use crate::extract::{extract_challenge_percentage, sanitize_percentage};
use crate::metric::MetricKey;
use crate::metrics::{GoalDetails, GoalMetric, PercentageSource, PlayerMetrics};
use crate::status::{MetricReading, PlayerStatusSnapshot, ReportRecord};
use crate::team::TeamType;

/// Catalog item whose ownership unlocks the player's points.
pub const UNLOCK_POINTS_ITEM: &str = "E6F0O5f";
pub const SECONDARY1_BOOST_ITEM: &str = "E6F0WGc";
pub const SECONDARY2_BOOST_ITEM: &str = "E6K79Mt";

pub const LOCAL_BOOST_WARNING: &str =
    "Carteira II boosts are computed locally and are not synchronized with the platform";

// Local points math (Carteira II).
const LOCAL_UNLOCK_THRESHOLD: f64 = 100.0;
const LOCAL_BOOST_THRESHOLD: f64 = 100.0;
const LOCAL_PRIMARY_POINTS: f64 = 500.0;
const LOCAL_SECONDARY_POINTS: f64 = 250.0;
const LOCAL_BOOST_BONUS: f64 = 100.0;
const LOCAL_PCT_CAP: f64 = 150.0;

/// Where points, lock state and boosts come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PointsMode {
    /// Trust the platform's total and catalog items.
    Platform,
    /// Derive everything from report targets; the platform is not consulted.
    Local,
}

/// Order in which percentage sources are tried for each goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SourcePriority {
    ChallengeFirst,
    ReportFirst,
}

/// Everything that distinguishes one team's processing from another's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TeamProfile {
    pub team: TeamType,
    pub display_name: &'static str,
    pub primary: MetricKey,
    pub secondary1: MetricKey,
    pub secondary2: MetricKey,
    pub secondary1_boost_item: &'static str,
    pub secondary2_boost_item: &'static str,
    pub points_mode: PointsMode,
    pub source_priority: SourcePriority,
}

impl TeamProfile {
    pub fn for_team(team: TeamType) -> Self {
        match team {
            TeamType::Carteira0 => Self::platform(
                team,
                MetricKey::Conversoes,
                MetricKey::ReaisPorAtivo,
                MetricKey::Faturamento,
            ),
            TeamType::CarteiraI => Self::platform(
                team,
                MetricKey::Atividade,
                MetricKey::ReaisPorAtivo,
                MetricKey::Faturamento,
            ),
            TeamType::CarteiraII => Self {
                points_mode: PointsMode::Local,
                source_priority: SourcePriority::ReportFirst,
                ..Self::platform(
                    team,
                    MetricKey::ReaisPorAtivo,
                    MetricKey::Atividade,
                    MetricKey::MultimarcasPorAtivo,
                )
            },
            TeamType::CarteiraIII | TeamType::CarteiraIV => Self::carteira_iii_iv(team),
            TeamType::Er => Self::platform(
                team,
                MetricKey::Faturamento,
                MetricKey::ReaisPorAtivo,
                MetricKey::Upa,
            ),
        }
    }

    /// Carteira III and IV differ only in identity.
    fn carteira_iii_iv(team: TeamType) -> Self {
        Self::platform(
            team,
            MetricKey::Faturamento,
            MetricKey::ReaisPorAtivo,
            MetricKey::MultimarcasPorAtivo,
        )
    }

    fn platform(
        team: TeamType,
        primary: MetricKey,
        secondary1: MetricKey,
        secondary2: MetricKey,
    ) -> Self {
        Self {
            team,
            display_name: team.label(),
            primary,
            secondary1,
            secondary2,
            secondary1_boost_item: SECONDARY1_BOOST_ITEM,
            secondary2_boost_item: SECONDARY2_BOOST_ITEM,
            points_mode: PointsMode::Platform,
            source_priority: SourcePriority::ChallengeFirst,
        }
    }

    pub fn metrics(&self) -> [MetricKey; 3] {
        [self.primary, self.secondary1, self.secondary2]
    }
}

/// Turns a status snapshot plus optional report into `PlayerMetrics` for one
/// team. Immutable and cheap to share across threads.
#[derive(Debug, Clone)]
pub struct TeamProcessor {
    profile: TeamProfile,
    mapping: Arc<ChallengeMapping>,
    cycle: CycleSettings,
}

impl TeamProcessor {
    pub fn new(profile: TeamProfile, mapping: Arc<ChallengeMapping>) -> Self {
        Self {
            profile,
            mapping,
            cycle: CycleSettings::default(),
        }
    }

    pub fn with_cycle_settings(mut self, cycle: CycleSettings) -> Self {
        self.cycle = cycle;
        self
    }

    pub fn team(&self) -> TeamType {
        self.profile.team
    }

    pub fn process_player_data(
        &self,
        status: &PlayerStatusSnapshot,
        report: Option<&ReportRecord>,
    ) -> PlayerMetrics {
        if let Some(report) = report {
            self.note_team_mismatch(report);
        }
        let cycle = self.cycle.resolve(report);
        let profile = &self.profile;

        let primary = self.build_goal(profile.primary, None, status, report);
        let mut secondary1 = self.build_goal(
            profile.secondary1,
            Some(profile.secondary1_boost_item),
            status,
            report,
        );
        let mut secondary2 = self.build_goal(
            profile.secondary2,
            Some(profile.secondary2_boost_item),
            status,
            report,
        );

        let mut warnings = Vec::new();
        let (points, points_locked) = match profile.points_mode {
            PointsMode::Platform => {
                secondary1.boost_active = boost_owned(status, profile.secondary1_boost_item);
                secondary2.boost_active = boost_owned(status, profile.secondary2_boost_item);
                (platform_points(status), platform_points_locked(status))
            }
            PointsMode::Local => {
                warnings.push(LOCAL_BOOST_WARNING.to_string());
                let local = local_points(report, profile);
                [secondary1.boost_active, secondary2.boost_active] = local.boosts;
                (local.points, local.locked)
            }
        };

        PlayerMetrics {
            player_name: status.display_name().to_string(),
            team: profile.team,
            points,
            points_locked,
            current_cycle_day: cycle.current_day,
            total_cycle_days: cycle.total_days,
            days_until_cycle_end: cycle.days_until_end,
            primary_goal: primary,
            secondary_goal1: secondary1,
            secondary_goal2: secondary2,
            warnings,
        }
    }

    fn build_goal(
        &self,
        metric: MetricKey,
        boost_item: Option<&str>,
        status: &PlayerStatusSnapshot,
        report: Option<&ReportRecord>,
    ) -> GoalMetric {
        let ids = self.mapping.ids(self.profile.team, metric);
        let from_challenge = || {
            let raw = extract_challenge_percentage(&status.challenge_progress, ids)?;
            let clean = sanitize_percentage(raw);
            if clean.is_none() {
                log::warn!(
                    "player {}: discarding invalid challenge value {raw} for {metric}",
                    status.player_id
                );
            }
            clean.map(|pct| (pct, PercentageSource::Challenge))
        };
        let from_report = || {
            report
                .and_then(|r| r.reading(metric))
                .and_then(MetricReading::effective_percentage)
                .and_then(sanitize_percentage)
                .map(|pct| (pct, PercentageSource::Report))
        };

        let resolved = match self.profile.source_priority {
            SourcePriority::ChallengeFirst => from_challenge().or_else(from_report),
            SourcePriority::ReportFirst => from_report().or_else(from_challenge),
        };
        let (percentage, source) = resolved.unwrap_or((0.0, PercentageSource::Default));
        log::debug!(
            "player {} team {}: {metric} = {percentage} ({source:?})",
            status.player_id,
            self.profile.team
        );

        let details = GoalDetails {
            challenge_ids: ids.to_vec(),
            boost_item_id: boost_item.map(str::to_string),
            is_main_goal: boost_item.is_none(),
        };
        GoalMetric::new(metric, percentage, source, details)
    }

    fn note_team_mismatch(&self, report: &ReportRecord) {
        let Some(declared) = report.team.as_deref() else {
            return;
        };
        match report.team_type() {
            Some(team) if team == self.profile.team => {}
            Some(team) => log::warn!(
                "report for player {} belongs to {team}, processing as {}",
                report.player_id,
                self.profile.team
            ),
            None => log::warn!(
                "report for player {} declares unknown team {declared:?}, processing as {}",
                report.player_id,
                self.profile.team
            ),
        }
    }
}

fn platform_points(status: &PlayerStatusSnapshot) -> f64 {
    if status.total_points.is_finite() && status.total_points > 0.0 {
        status.total_points
    } else {
        0.0
    }
}

/// Locked unless the unlock item is owned; a missing catalog map is locked.
fn platform_points_locked(status: &PlayerStatusSnapshot) -> bool {
    !status
        .catalog_count(UNLOCK_POINTS_ITEM)
        .is_some_and(|count| count > 0.0)
}

fn boost_owned(status: &PlayerStatusSnapshot, item: &str) -> bool {
    status.catalog_count(item).is_some_and(|count| count > 0.0)
}

struct LocalPoints {
    points: f64,
    locked: bool,
    boosts: [bool; 2],
}

/// Report-side percentage for the local points math. Challenge data never
/// feeds it; a metric missing from the report counts as 0.
fn report_percentage(report: &ReportRecord, metric: MetricKey) -> f64 {
    report
        .reading(metric)
        .and_then(MetricReading::effective_percentage)
        .and_then(sanitize_percentage)
        .unwrap_or(0.0)
}

fn local_points(report: Option<&ReportRecord>, profile: &TeamProfile) -> LocalPoints {
    let Some(report) = report else {
        return LocalPoints {
            points: 0.0,
            locked: true,
            boosts: [false; 2],
        };
    };
    let [primary, secondary1, secondary2] = profile.metrics().map(|m| report_percentage(report, m));
    let boosts = [secondary1, secondary2].map(|pct| pct >= LOCAL_BOOST_THRESHOLD);
    let earned = |pct: f64, base: f64| (pct.min(LOCAL_PCT_CAP) / 100.0 * base).floor();
    let active = boosts.iter().filter(|on| **on).count() as f64;
    let points = earned(primary, LOCAL_PRIMARY_POINTS)
        + earned(secondary1, LOCAL_SECONDARY_POINTS)
        + earned(secondary2, LOCAL_SECONDARY_POINTS)
        + active * LOCAL_BOOST_BONUS;
    LocalPoints {
        points,
        locked: primary < LOCAL_UNLOCK_THRESHOLD,
        boosts,
    }
}
