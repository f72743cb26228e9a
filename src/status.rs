use std::collections::{BTreeMap, HashMap};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::metric::MetricKey;
use crate::team::TeamType;

/// One player's status document as served by the gamification platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStatusSnapshot {
    #[serde(rename = "_id", alias = "id", default, deserialize_with = "string_or_default")]
    pub player_id: String,
    #[serde(default, deserialize_with = "string_or_default")]
    pub name: String,
    #[serde(default, deserialize_with = "float_or_zero")]
    pub total_points: f64,
    /// `None` when the platform omitted the map entirely.
    #[serde(default, deserialize_with = "catalog_or_none")]
    pub catalog_items: Option<HashMap<String, f64>>,
    #[serde(default, deserialize_with = "vec_or_default")]
    pub challenge_progress: Vec<ChallengeProgressEntry>,
    #[serde(default, deserialize_with = "team_ids")]
    pub teams: Vec<String>,
}

impl PlayerStatusSnapshot {
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.player_id
        } else {
            &self.name
        }
    }

    pub fn catalog_count(&self, item_id: &str) -> Option<f64> {
        self.catalog_items.as_ref()?.get(item_id).copied()
    }
}

/// Loosely shaped challenge progress row. The identifier and the value each
/// show up under one of three field names depending on the platform endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChallengeProgressEntry {
    #[serde(default, deserialize_with = "string_or_none", skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,
    #[serde(
        rename = "challengeId",
        default,
        deserialize_with = "string_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub challenge_id: Option<String>,
    #[serde(default, deserialize_with = "string_or_none", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "float_or_none", skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
    #[serde(default, deserialize_with = "float_or_none", skip_serializing_if = "Option::is_none")]
    pub percent_completed: Option<f64>,
    #[serde(default, deserialize_with = "float_or_none", skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
}

impl ChallengeProgressEntry {
    /// `{challengeId, percentage}` shaped entry.
    pub fn new(challenge_id: impl Into<String>, percentage: f64) -> Self {
        Self {
            challenge_id: Some(challenge_id.into()),
            percentage: Some(percentage),
            ..Self::default()
        }
    }
}

/// Target/current/percentage reading for one metric in a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricReading {
    pub target: Option<f64>,
    pub current: Option<f64>,
    pub percentage: Option<f64>,
}

impl MetricReading {
    pub fn from_percentage(percentage: f64) -> Self {
        Self {
            percentage: Some(percentage),
            ..Self::default()
        }
    }

    pub fn from_triple(target: f64, current: f64, percentage: f64) -> Self {
        Self {
            target: Some(target),
            current: Some(current),
            percentage: Some(percentage),
        }
    }

    /// Explicit percentage, else `current / target * 100` when a positive
    /// target is known. Unsanitized.
    pub fn effective_percentage(&self) -> Option<f64> {
        if let Some(pct) = self.percentage {
            return Some(pct);
        }
        match (self.target, self.current) {
            (Some(target), Some(current)) if target > 0.0 => Some(current / target * 100.0),
            _ => None,
        }
    }
}

/// Per-player, per-cycle report from storage or a CSV upload.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "RawReportRecord")]
pub struct ReportRecord {
    pub player_id: String,
    /// Team the record was produced for, as stored (label, key or platform id).
    pub team: Option<String>,
    pub current_cycle_day: Option<u32>,
    pub total_cycle_days: Option<u32>,
    pub metrics: BTreeMap<MetricKey, MetricReading>,
}

impl ReportRecord {
    pub fn new(player_id: impl Into<String>) -> Self {
        Self {
            player_id: player_id.into(),
            ..Self::default()
        }
    }

    pub fn with_team(mut self, team: TeamType) -> Self {
        self.team = Some(team.key().to_string());
        self
    }

    pub fn with_cycle(mut self, current_day: u32, total_days: u32) -> Self {
        self.current_cycle_day = Some(current_day);
        self.total_cycle_days = Some(total_days);
        self
    }

    pub fn with_percentage(self, metric: MetricKey, percentage: f64) -> Self {
        self.with_reading(metric, MetricReading::from_percentage(percentage))
    }

    pub fn with_reading(mut self, metric: MetricKey, reading: MetricReading) -> Self {
        self.metrics.insert(metric, reading);
        self
    }

    pub fn reading(&self, metric: MetricKey) -> Option<&MetricReading> {
        self.metrics.get(&metric)
    }

    /// The declared team, if it names one of the known teams.
    pub fn team_type(&self) -> Option<TeamType> {
        self.team.as_deref().and_then(TeamType::from_label)
    }
}

/// Parse the platform's player-status document. A literal `null` yields an
/// empty snapshot.
pub fn parse_player_status_json(raw: &str) -> Result<PlayerStatusSnapshot> {
    let parsed = serde_json::from_str::<Option<PlayerStatusSnapshot>>(raw)
        .context("invalid player status json")?;
    Ok(parsed.unwrap_or_default())
}

/// Parse a stored report record. `null` means no report for this player.
pub fn parse_report_record_json(raw: &str) -> Result<Option<ReportRecord>> {
    serde_json::from_str::<Option<ReportRecord>>(raw).context("invalid report record json")
}

#[derive(Debug, Deserialize)]
struct RawReportRecord {
    #[serde(alias = "playerId", alias = "_id", default, deserialize_with = "string_or_default")]
    player_id: String,
    #[serde(default, deserialize_with = "string_or_none")]
    team: Option<String>,
    #[serde(
        alias = "currentCycleDay",
        alias = "cycle_day",
        default,
        deserialize_with = "float_or_none"
    )]
    current_cycle_day: Option<f64>,
    #[serde(alias = "totalCycleDays", default, deserialize_with = "float_or_none")]
    total_cycle_days: Option<f64>,
    #[serde(default)]
    atividade: Option<RawReading>,
    #[serde(alias = "reaisPorAtivo", default)]
    reais_por_ativo: Option<RawReading>,
    #[serde(default)]
    faturamento: Option<RawReading>,
    #[serde(alias = "multimarcasPorAtivo", default)]
    multimarcas_por_ativo: Option<RawReading>,
    #[serde(default)]
    conversoes: Option<RawReading>,
    #[serde(default)]
    upa: Option<RawReading>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawReading {
    Triple {
        #[serde(alias = "meta", default, deserialize_with = "float_or_none")]
        target: Option<f64>,
        #[serde(alias = "atual", default, deserialize_with = "float_or_none")]
        current: Option<f64>,
        #[serde(default, deserialize_with = "float_or_none")]
        percentage: Option<f64>,
    },
    Bare(serde_json::Value),
}

impl RawReading {
    fn into_reading(self) -> Option<MetricReading> {
        match self {
            RawReading::Triple {
                target,
                current,
                percentage,
            } => Some(MetricReading {
                target,
                current,
                percentage,
            }),
            RawReading::Bare(value) => value_to_f64(&value).map(MetricReading::from_percentage),
        }
    }
}

impl From<RawReportRecord> for ReportRecord {
    fn from(raw: RawReportRecord) -> Self {
        let mut metrics = BTreeMap::new();
        let fields = [
            (MetricKey::Atividade, raw.atividade),
            (MetricKey::ReaisPorAtivo, raw.reais_por_ativo),
            (MetricKey::Faturamento, raw.faturamento),
            (MetricKey::MultimarcasPorAtivo, raw.multimarcas_por_ativo),
            (MetricKey::Conversoes, raw.conversoes),
            (MetricKey::Upa, raw.upa),
        ];
        for (metric, reading) in fields {
            if let Some(reading) = reading.and_then(RawReading::into_reading) {
                metrics.insert(metric, reading);
            }
        }
        ReportRecord {
            player_id: raw.player_id,
            team: raw.team.filter(|t| !t.trim().is_empty()),
            current_cycle_day: raw.current_cycle_day.and_then(day_from_f64),
            total_cycle_days: raw.total_cycle_days.and_then(day_from_f64),
            metrics,
        }
    }
}

fn day_from_f64(value: f64) -> Option<u32> {
    if value.is_finite() && value >= 0.0 && value <= f64::from(u32::MAX) {
        Some(value.round() as u32)
    } else {
        None
    }
}

fn value_to_f64(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn vec_or_default<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::Deserialize<'de>,
{
    let value = Option::<Vec<T>>::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

fn string_or_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let rendered = match value {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => return Ok(None),
    };
    Ok(Some(rendered).filter(|s| !s.is_empty()))
}

fn string_or_default<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(string_or_none(deserializer)?.unwrap_or_default())
}

fn float_or_none<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value_to_f64(&value))
}

fn float_or_zero<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(float_or_none(deserializer)?.unwrap_or(0.0))
}

fn catalog_or_none<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<HashMap<String, f64>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let serde_json::Value::Object(map) = value else {
        return Ok(None);
    };
    let items = map
        .into_iter()
        .filter_map(|(id, count)| value_to_f64(&count).map(|count| (id, count)))
        .collect();
    Ok(Some(items))
}

/// Team memberships arrive as plain ids or as `{ "_id": ... }` objects.
fn team_ids<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let serde_json::Value::Array(items) = value else {
        return Ok(Vec::new());
    };
    let ids = items
        .into_iter()
        .filter_map(|item| match item {
            serde_json::Value::String(s) => Some(s.trim().to_string()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            serde_json::Value::Object(obj) => obj
                .get("_id")
                .or_else(|| obj.get("id"))
                .and_then(|v| v.as_str())
                .map(|s| s.trim().to_string()),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .collect();
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_null_is_empty() {
        let status = parse_player_status_json("null").expect("null should parse");
        assert!(status.challenge_progress.is_empty());
        assert!(status.catalog_items.is_none());
        assert!(status.teams.is_empty());
    }

    #[test]
    fn status_tolerates_loose_shapes() {
        let raw = r#"{
            "_id": 4242,
            "name": "Maria",
            "total_points": "1500.5",
            "catalog_items": {"E6F0O5f": 1, "E6F0WGc": "2", "junk": null},
            "challenge_progress": null,
            "teams": ["E6F4sCh", {"_id": "E6U1B1p"}, 7, null, ""]
        }"#;
        let status = parse_player_status_json(raw).expect("should parse");
        assert_eq!(status.player_id, "4242");
        assert_eq!(status.total_points, 1500.5);
        assert_eq!(status.catalog_count("E6F0WGc"), Some(2.0));
        assert_eq!(status.catalog_count("junk"), None);
        assert!(status.challenge_progress.is_empty());
        assert_eq!(status.teams, vec!["E6F4sCh", "E6U1B1p", "7"]);
    }

    #[test]
    fn catalog_null_means_absent_map() {
        let status = parse_player_status_json(r#"{"catalog_items": null}"#).expect("parse");
        assert!(status.catalog_items.is_none());
        let status = parse_player_status_json(r#"{"catalog_items": {}}"#).expect("parse");
        assert_eq!(status.catalog_items.map(|m| m.len()), Some(0));
    }

    #[test]
    fn display_name_falls_back_to_id() {
        let status = PlayerStatusSnapshot {
            player_id: "p-1".into(),
            ..PlayerStatusSnapshot::default()
        };
        assert_eq!(status.display_name(), "p-1");
    }

    #[test]
    fn report_accepts_bare_numbers_and_triples() {
        let raw = r#"{
            "playerId": "123",
            "team": "CARTEIRA_II",
            "currentCycleDay": 12,
            "totalCycleDays": "21",
            "conversoes": 90,
            "faturamento": {"target": 400000, "current": 200000},
            "upa": {"meta": 2, "atual": 1.3, "percentage": 65},
            "atividade": "88%",
            "multimarcas_por_ativo": null
        }"#;
        let report = parse_report_record_json(raw)
            .expect("should parse")
            .expect("record present");
        assert_eq!(report.team_type(), Some(TeamType::CarteiraII));
        assert_eq!(report.current_cycle_day, Some(12));
        assert_eq!(report.total_cycle_days, Some(21));
        let pct = |m: MetricKey| report.reading(m).and_then(|r| r.effective_percentage());
        assert_eq!(pct(MetricKey::Conversoes), Some(90.0));
        assert_eq!(pct(MetricKey::Faturamento), Some(50.0));
        assert_eq!(pct(MetricKey::Upa), Some(65.0));
        assert_eq!(pct(MetricKey::Atividade), Some(88.0));
        assert!(report.reading(MetricKey::MultimarcasPorAtivo).is_none());
    }

    #[test]
    fn report_null_is_none() {
        assert!(parse_report_record_json("null").expect("parse").is_none());
    }

    #[test]
    fn reading_without_positive_target_has_no_percentage() {
        let reading = MetricReading {
            target: Some(0.0),
            current: Some(10.0),
            percentage: None,
        };
        assert_eq!(reading.effective_percentage(), None);
    }
}
