use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::Serialize;
use thiserror::Error;

use crate::challenge_map::{ChallengeMapping, MappingError};
use crate::cycle::CycleSettings;
use crate::metrics::PlayerMetrics;
use crate::processor::{TeamProcessor, TeamProfile};
use crate::status::{PlayerStatusSnapshot, ReportRecord};
use crate::team::{ADMIN_TEAM_ID, ALL_TEAMS, TeamType};

static GLOBAL: OnceCell<TeamProcessorFactory> = OnceCell::new();

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TeamProcessorError {
    #[error("unsupported team type: {0:?}")]
    UnsupportedTeamType(String),
    #[error("invalid challenge mapping: {0}")]
    InvalidMapping(#[from] MappingError),
}

/// Outcome of auto-dispatch. Exactly one of `metrics` / `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutoProcessResult {
    pub team_type: Option<TeamType>,
    pub metrics: Option<PlayerMetrics>,
    pub error: Option<String>,
}

impl AutoProcessResult {
    fn failed(team_type: Option<TeamType>, error: impl ToString) -> Self {
        Self {
            team_type,
            metrics: None,
            error: Some(error.to_string()),
        }
    }
}

/// Registry of the six team processors over one validated mapping.
#[derive(Debug, Clone)]
pub struct TeamProcessorFactory {
    processors: HashMap<TeamType, TeamProcessor>,
}

impl TeamProcessorFactory {
    /// Validates the mapping against every team profile up front, so lookups
    /// never fail per call.
    pub fn new(mapping: ChallengeMapping) -> Result<Self, TeamProcessorError> {
        Self::with_cycle_settings(mapping, CycleSettings::default())
    }

    pub fn with_cycle_settings(
        mapping: ChallengeMapping,
        cycle: CycleSettings,
    ) -> Result<Self, TeamProcessorError> {
        let profiles = ALL_TEAMS.map(TeamProfile::for_team);
        let required = profiles.map(|p| (p.team, p.metrics()));
        mapping.validate(required.iter().map(|(team, metrics)| (*team, &metrics[..])))?;

        let mapping = Arc::new(mapping);
        let processors = profiles
            .into_iter()
            .map(|profile| {
                let processor =
                    TeamProcessor::new(profile, Arc::clone(&mapping)).with_cycle_settings(cycle);
                (profile.team, processor)
            })
            .collect();
        Ok(Self { processors })
    }

    /// Process-wide factory over the built-in mapping.
    pub fn global() -> Result<&'static Self, TeamProcessorError> {
        GLOBAL.get_or_try_init(|| Self::new(ChallengeMapping::builtin()))
    }

    /// Look up a processor by registry key or label (`CARTEIRA_II`,
    /// `Carteira II`, ...).
    pub fn get_processor(&self, team_type: &str) -> Result<&TeamProcessor, TeamProcessorError> {
        TeamType::from_label(team_type)
            .and_then(|team| self.processors.get(&team))
            .ok_or_else(|| TeamProcessorError::UnsupportedTeamType(team_type.to_string()))
    }

    pub fn processor(&self, team: TeamType) -> Option<&TeamProcessor> {
        self.processors.get(&team)
    }

    /// Resolve the player's team from memberships, then from the player id.
    /// `None` means ambiguous or unknown; it is never a default team.
    pub fn determine_team_type(status: &PlayerStatusSnapshot) -> Option<TeamType> {
        status
            .teams
            .iter()
            .find_map(|id| TeamType::from_platform_id(id))
            .or_else(|| TeamType::from_player_id(&status.player_id))
    }

    /// Every team the player may view. Admins see all teams; several entries
    /// mean the caller has to let the user choose.
    pub fn available_teams_for_user(status: &PlayerStatusSnapshot) -> Vec<TeamType> {
        if status.teams.iter().any(|id| id.trim() == ADMIN_TEAM_ID) {
            return ALL_TEAMS.to_vec();
        }
        let mut teams: Vec<TeamType> = Vec::new();
        for team in status.teams.iter().filter_map(|id| TeamType::from_platform_id(id)) {
            if !teams.contains(&team) {
                teams.push(team);
            }
        }
        if teams.is_empty() {
            teams.extend(TeamType::from_player_id(&status.player_id));
        }
        teams
    }

    /// Resolve the team (report's declared team first) and process. Never
    /// fails; problems land in `error`.
    pub fn process_player_data_auto(
        &self,
        status: &PlayerStatusSnapshot,
        report: Option<&ReportRecord>,
    ) -> AutoProcessResult {
        let declared = report.and_then(|r| r.team.as_deref());
        let team_type = match declared.and_then(TeamType::from_label) {
            Some(team) => Some(team),
            None => {
                if let Some(label) = declared {
                    log::warn!(
                        "player {}: report declares unknown team {label:?}, resolving from status",
                        status.player_id
                    );
                }
                Self::determine_team_type(status)
            }
        };

        let Some(team) = team_type else {
            let err = match declared {
                Some(label) => TeamProcessorError::UnsupportedTeamType(label.to_string()).to_string(),
                None => format!("unable to determine team type for player {:?}", status.player_id),
            };
            return AutoProcessResult::failed(None, err);
        };

        match self.get_processor(team.key()) {
            Ok(processor) => AutoProcessResult {
                team_type: Some(team),
                metrics: Some(processor.process_player_data(status, report)),
                error: None,
            },
            Err(err) => AutoProcessResult::failed(Some(team), err),
        }
    }
}
