//! Goal-data CSV uploads: one header line plus one data line per player.
//!
//! Parsing is permissive: a structurally valid file always yields data, bad
//! numeric cells become `0.0` with a logged warning, and business-rule
//! problems are reported by [`validate_new_metrics`] without rejecting the row.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::metric::MetricKey;
use crate::status::{MetricReading, ReportRecord};
use crate::team::TeamType;

const PLAYER_ID_HEADER: &str = "Player ID";
const CYCLE_DAY_HEADER: &str = "Dia do Ciclo";
const TOTAL_DAYS_HEADER: &str = "Total Dias Ciclo";
const RECONCILE_TOLERANCE_PCT: f64 = 1.0;

struct MetricColumns {
    metric: MetricKey,
    target: &'static str,
    current: &'static str,
    percentage: &'static str,
}

impl MetricColumns {
    fn headers(&self) -> [&'static str; 3] {
        [self.target, self.current, self.percentage]
    }
}

const CORE_COLUMNS: [MetricColumns; 4] = [
    MetricColumns {
        metric: MetricKey::Faturamento,
        target: "Faturamento Meta",
        current: "Faturamento Atual",
        percentage: "Faturamento %",
    },
    MetricColumns {
        metric: MetricKey::ReaisPorAtivo,
        target: "Reais por Ativo Meta",
        current: "Reais por Ativo Atual",
        percentage: "Reais por Ativo %",
    },
    MetricColumns {
        metric: MetricKey::Atividade,
        target: "Atividade Meta",
        current: "Atividade Atual",
        percentage: "Atividade %",
    },
    MetricColumns {
        metric: MetricKey::MultimarcasPorAtivo,
        target: "Multimarcas por Ativo Meta",
        current: "Multimarcas por Ativo Atual",
        percentage: "Multimarcas por Ativo %",
    },
];

const OPTIONAL_COLUMNS: [MetricColumns; 2] = [
    MetricColumns {
        metric: MetricKey::Conversoes,
        target: "Conversões Meta",
        current: "Conversões Atual",
        percentage: "Conversões %",
    },
    MetricColumns {
        metric: MetricKey::Upa,
        target: "UPA Meta",
        current: "UPA Atual",
        percentage: "UPA %",
    },
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GoalTriple {
    pub target: f64,
    pub current: f64,
    pub percentage: f64,
}

impl From<GoalTriple> for MetricReading {
    fn from(triple: GoalTriple) -> Self {
        MetricReading::from_triple(triple.target, triple.current, triple.percentage)
    }
}

/// One player's cycle snapshot as uploaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvGoalData {
    pub player_id: String,
    pub cycle_day: u32,
    pub total_cycle_days: u32,
    pub faturamento: GoalTriple,
    pub reais_por_ativo: GoalTriple,
    pub atividade: GoalTriple,
    pub multimarcas_por_ativo: GoalTriple,
    pub conversoes: Option<GoalTriple>,
    pub upa: Option<GoalTriple>,
}

impl CsvGoalData {
    pub fn triple(&self, metric: MetricKey) -> Option<GoalTriple> {
        match metric {
            MetricKey::Faturamento => Some(self.faturamento),
            MetricKey::ReaisPorAtivo => Some(self.reais_por_ativo),
            MetricKey::Atividade => Some(self.atividade),
            MetricKey::MultimarcasPorAtivo => Some(self.multimarcas_por_ativo),
            MetricKey::Conversoes => self.conversoes,
            MetricKey::Upa => self.upa,
        }
    }

    /// Feed the upload into the processors as a report record.
    pub fn to_report_record(&self, team: Option<TeamType>) -> ReportRecord {
        let mut record = ReportRecord::new(self.player_id.clone())
            .with_cycle(self.cycle_day, self.total_cycle_days);
        record.team = team.map(|t| t.key().to_string());
        for metric in crate::metric::ALL_METRICS {
            if let Some(triple) = self.triple(metric) {
                record = record.with_reading(metric, triple.into());
            }
        }
        record
    }
}

/// Header names present, keyed by their normalized form.
struct HeaderIndex {
    columns: HashMap<String, usize>,
}

impl HeaderIndex {
    fn new(header: &csv::StringRecord) -> Self {
        let columns = header
            .iter()
            .enumerate()
            .map(|(idx, name)| (normalize_header(name), idx))
            .collect();
        Self { columns }
    }

    fn position(&self, header: &str) -> Option<usize> {
        self.columns.get(&normalize_header(header)).copied()
    }

    fn has(&self, header: &str) -> bool {
        self.position(header).is_some()
    }

    fn missing_required(&self) -> Vec<&'static str> {
        [PLAYER_ID_HEADER, CYCLE_DAY_HEADER, TOTAL_DAYS_HEADER]
            .into_iter()
            .chain(CORE_COLUMNS.iter().flat_map(MetricColumns::headers))
            .filter(|h| !self.has(h))
            .collect()
    }

    /// Optional groups with some, but not all, of their three columns.
    fn partial_optional_groups(&self) -> Vec<MetricKey> {
        OPTIONAL_COLUMNS
            .iter()
            .filter(|group| {
                let present = group.headers().iter().filter(|h| self.has(h)).count();
                present != 0 && present != 3
            })
            .map(|group| group.metric)
            .collect()
    }

    fn is_valid(&self) -> bool {
        let missing = self.missing_required();
        if !missing.is_empty() {
            log::warn!("goal csv is missing required columns: {}", missing.join(", "));
            return false;
        }
        let partial = self.partial_optional_groups();
        if !partial.is_empty() {
            let names: Vec<&str> = partial.iter().map(|m| m.display_name()).collect();
            log::warn!(
                "goal csv has incomplete optional column groups: {}",
                names.join(", ")
            );
            return false;
        }
        true
    }
}

/// Required headers present and every optional group complete or absent.
pub fn validate_csv_structure(content: &str) -> bool {
    let Some(rows) = read_rows(content) else {
        return false;
    };
    let Some(header) = rows.first() else {
        return false;
    };
    HeaderIndex::new(header).is_valid()
}

/// Parse a header + data line upload. `None` on any structural defect.
pub fn parse_goal_csv(content: &str) -> Option<CsvGoalData> {
    let rows = read_rows(content)?;
    if rows.len() < 2 {
        log::warn!("goal csv needs a header and a data line, got {} line(s)", rows.len());
        return None;
    }
    if rows.len() > 2 {
        log::warn!(
            "goal csv has {} data lines; only the first is used",
            rows.len() - 1
        );
    }
    let index = HeaderIndex::new(&rows[0]);
    if !index.is_valid() {
        return None;
    }
    let row = RowReader {
        index: &index,
        record: &rows[1],
    };

    let player_id = row.text(PLAYER_ID_HEADER);
    if player_id.is_empty() {
        log::warn!("goal csv data line has no player id");
        return None;
    }

    let [faturamento, reais_por_ativo, atividade, multimarcas_por_ativo] =
        CORE_COLUMNS.each_ref().map(|group| row.triple(group));
    let [conversoes, upa] = OPTIONAL_COLUMNS
        .each_ref()
        .map(|group| row.optional_triple(group));

    Some(CsvGoalData {
        player_id: player_id.to_string(),
        cycle_day: row.day(CYCLE_DAY_HEADER),
        total_cycle_days: row.day(TOTAL_DAYS_HEADER),
        faturamento,
        reais_por_ativo,
        atividade,
        multimarcas_por_ativo,
        conversoes,
        upa,
    })
}

/// Business-rule checks on the optional metrics. Returned strings are
/// warnings; they never invalidate the parsed data.
pub fn validate_new_metrics(data: &CsvGoalData) -> Vec<String> {
    let mut warnings = Vec::new();
    let groups = [
        (MetricKey::Conversoes, data.conversoes),
        (MetricKey::Upa, data.upa),
    ];
    for (metric, triple) in groups {
        let Some(triple) = triple else {
            continue;
        };
        let label = metric.display_name();
        if triple.target < 0.0 {
            warnings.push(format!("{label}: target must not be negative ({})", triple.target));
        }
        if triple.current < 0.0 {
            warnings.push(format!(
                "{label}: current value must not be negative ({})",
                triple.current
            ));
        }
        if !(0.0..=100.0).contains(&triple.percentage) {
            warnings.push(format!(
                "{label}: percentage {} is outside 0-100",
                triple.percentage
            ));
        }
        if triple.target > 0.0 {
            let expected = triple.current / triple.target * 100.0;
            if (expected - triple.percentage).abs() > RECONCILE_TOLERANCE_PCT {
                warnings.push(format!(
                    "{label}: percentage {} does not match current/target ({expected:.2})",
                    triple.percentage
                ));
            }
        }
    }
    warnings
}

struct RowReader<'a> {
    index: &'a HeaderIndex,
    record: &'a csv::StringRecord,
}

impl RowReader<'_> {
    fn text(&self, header: &str) -> &str {
        self.index
            .position(header)
            .and_then(|idx| self.record.get(idx))
            .map(str::trim)
            .unwrap_or("")
    }

    fn number(&self, header: &str) -> f64 {
        let raw = self.text(header);
        match parse_number(raw) {
            Some(value) => value,
            None => {
                log::warn!("goal csv: column {header:?} has unparsable value {raw:?}, using 0");
                0.0
            }
        }
    }

    fn day(&self, header: &str) -> u32 {
        let value = self.number(header);
        if value.is_finite() && value >= 0.0 && value <= f64::from(u32::MAX) {
            value.round() as u32
        } else {
            log::warn!("goal csv: column {header:?} has out-of-range day {value}, using 0");
            0
        }
    }

    fn triple(&self, group: &MetricColumns) -> GoalTriple {
        GoalTriple {
            target: self.number(group.target),
            current: self.number(group.current),
            percentage: self.number(group.percentage),
        }
    }

    fn optional_triple(&self, group: &MetricColumns) -> Option<GoalTriple> {
        if !group.headers().iter().all(|h| self.index.has(h)) {
            return None;
        }
        if group.headers().iter().all(|h| self.text(h).is_empty()) {
            return None;
        }
        Some(self.triple(group))
    }
}

fn read_rows(content: &str) -> Option<Vec<csv::StringRecord>> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());
    let mut rows = Vec::new();
    for record in reader.records() {
        match record {
            Ok(record) if record.iter().all(|cell| cell.is_empty()) => {}
            Ok(record) => rows.push(record),
            Err(err) => {
                log::warn!("goal csv is malformed: {err}");
                return None;
            }
        }
    }
    Some(rows)
}

/// Accepts `1.3`, `1,3`, `65%` and surrounding whitespace.
fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim().trim_end_matches('%').trim();
    if trimmed.is_empty() {
        return None;
    }
    let normalized = if trimmed.contains(',') && !trimmed.contains('.') {
        trimmed.replacen(',', ".", 1)
    } else {
        trimmed.to_string()
    };
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn normalize_header(raw: &str) -> String {
    raw.trim()
        .trim_matches('"')
        .trim()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'Á' | 'À' | 'Â' | 'Ã' => 'a',
            'é' | 'ê' | 'É' | 'Ê' => 'e',
            'í' | 'Í' => 'i',
            'ó' | 'ô' | 'õ' | 'Ó' | 'Ô' | 'Õ' => 'o',
            'ú' | 'Ú' => 'u',
            'ç' | 'Ç' => 'c',
            other => other.to_ascii_lowercase(),
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
