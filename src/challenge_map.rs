use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::metric::MetricKey;
use crate::team::TeamType;

/// Accepted challenge ids per team and metric. Ids are aliased across teams
/// and a metric usually accepts the pre-goal, at-goal and post-goal variants.
const BUILTIN_MAPPING: &[(TeamType, MetricKey, &[&str])] = &[
    (TeamType::Carteira0, MetricKey::Conversoes, &["E82R5cQ", "E82RakF"]),
    (TeamType::Carteira0, MetricKey::ReaisPorAtivo, &["E6Gahd4", "E6GglPq"]),
    (TeamType::Carteira0, MetricKey::Faturamento, &["E6Gm8RI", "E6GkSHQ"]),
    (TeamType::CarteiraI, MetricKey::Atividade, &["E6FQIjs", "E6GkLjR"]),
    (
        TeamType::CarteiraI,
        MetricKey::ReaisPorAtivo,
        &["E6Gahd4", "E6GglPq", "E6Gv58l"],
    ),
    (
        TeamType::CarteiraI,
        MetricKey::Faturamento,
        &["E6Gm8RI", "E6GkSHQ", "E6GlpuL"],
    ),
    (TeamType::CarteiraII, MetricKey::ReaisPorAtivo, &["E6MTIIK", "E6Gahd4"]),
    (TeamType::CarteiraII, MetricKey::Atividade, &["E6Gv58l", "E6FQIjs"]),
    (
        TeamType::CarteiraII,
        MetricKey::MultimarcasPorAtivo,
        &["E6MWJKs", "E6MWYj3"],
    ),
    (
        TeamType::CarteiraIII,
        MetricKey::Faturamento,
        &["E6F8HMK", "E6Gm8RI", "E6GkSHQ"],
    ),
    (TeamType::CarteiraIII, MetricKey::ReaisPorAtivo, &["E6Gahd4", "E6GglPq"]),
    (
        TeamType::CarteiraIII,
        MetricKey::MultimarcasPorAtivo,
        &["E6MMH5v", "E6MWJKs"],
    ),
    (
        TeamType::CarteiraIV,
        MetricKey::Faturamento,
        &["E6F8HMK", "E6Gm8RI", "E6GkSHQ"],
    ),
    (TeamType::CarteiraIV, MetricKey::ReaisPorAtivo, &["E6Gahd4", "E6GglPq"]),
    (
        TeamType::CarteiraIV,
        MetricKey::MultimarcasPorAtivo,
        &["E6MMH5v", "E6MWJKs"],
    ),
    (TeamType::Er, MetricKey::Faturamento, &["E6Gm8RI", "E6GkSHQ"]),
    (TeamType::Er, MetricKey::ReaisPorAtivo, &["E6Gahd4", "E6MTIIK"]),
    (TeamType::Er, MetricKey::Upa, &["E62x2PW", "E62xJFQ"]),
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("no challenge mapping for team {0}")]
    MissingTeam(TeamType),
    #[error("no challenge mapping for {metric} on team {team}")]
    MissingMetric { team: TeamType, metric: MetricKey },
    #[error("empty challenge id list for {metric} on team {team}")]
    EmptyIdentifiers { team: TeamType, metric: MetricKey },
}

/// Read-only `(team, metric) -> challenge ids` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChallengeMapping {
    teams: HashMap<TeamType, HashMap<MetricKey, Vec<String>>>,
}

impl ChallengeMapping {
    pub fn builtin() -> Self {
        let mut mapping = Self::default();
        for (team, metric, ids) in BUILTIN_MAPPING {
            mapping.insert(*team, *metric, ids.iter().map(|id| id.to_string()).collect());
        }
        mapping
    }

    pub fn insert(&mut self, team: TeamType, metric: MetricKey, ids: Vec<String>) {
        self.teams.entry(team).or_default().insert(metric, ids);
    }

    /// Accepted ids in preference order. Empty when the pair is unmapped,
    /// which `validate` rules out at startup.
    pub fn ids(&self, team: TeamType, metric: MetricKey) -> &[String] {
        self.teams
            .get(&team)
            .and_then(|metrics| metrics.get(&metric))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Startup check that every `(team, metric)` pair a processor will ask
    /// for resolves to at least one id.
    pub fn validate<'a>(
        &self,
        required: impl IntoIterator<Item = (TeamType, &'a [MetricKey])>,
    ) -> Result<(), MappingError> {
        for (team, metrics) in required {
            let Some(by_metric) = self.teams.get(&team) else {
                return Err(MappingError::MissingTeam(team));
            };
            for metric in metrics {
                match by_metric.get(metric) {
                    None => {
                        return Err(MappingError::MissingMetric {
                            team,
                            metric: *metric,
                        });
                    }
                    Some(ids) if ids.iter().all(|id| id.trim().is_empty()) => {
                        return Err(MappingError::EmptyIdentifiers {
                            team,
                            metric: *metric,
                        });
                    }
                    Some(_) => {}
                }
            }
        }
        Ok(())
    }
}
